use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, DEFAULT_LOG_FILTER};
use crate::pdf::page_numbers::{NumberFormat, NumberPosition};
use crate::pdf::watermark::{WatermarkPosition, DEFAULT_COLOR, DEFAULT_TEXT};
use crate::selection::PageSelection;

#[derive(Parser)]
#[command(name = "pdfpages")]
#[command(about = "Page-level PDF editing with MCP server support")]
#[command(version)]
pub struct Cli {
    /// Log filter directive, e.g. "pdfpages=debug"
    #[arg(
        long,
        global = true,
        env = "PDFPAGES_LOG",
        default_value = DEFAULT_LOG_FILTER
    )]
    pub log: String,

    /// Replace output files that already exist
    #[arg(long, global = true, env = "PDFPAGES_OVERWRITE")]
    pub force: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn config(&self) -> Config {
        Config {
            log_filter: self.log.clone(),
            overwrite: self.force,
        }
    }
}

const PAGE_FLAGS: &str = "--pages, --all, --even, --odd, --every, --current, --first, --last";

/// Which pages an operation applies to. With no option, every page.
#[derive(Args, Debug, Default)]
pub struct PageArgs {
    /// Pages and ranges, e.g. "1-3,7,10-end", or one of all/even/odd
    #[arg(short, long)]
    pub pages: Option<String>,

    /// Every page
    #[arg(long)]
    pub all: bool,

    /// Even pages
    #[arg(long)]
    pub even: bool,

    /// Odd pages
    #[arg(long)]
    pub odd: bool,

    /// Every Nth page
    #[arg(long, value_name = "N")]
    pub every: Option<u32>,

    /// First page picked by --every (default: N)
    #[arg(long, value_name = "PAGE", requires = "every")]
    pub start_from: Option<u32>,

    /// A single page
    #[arg(long, value_name = "PAGE")]
    pub current: Option<u32>,

    /// The first page
    #[arg(long)]
    pub first: bool,

    /// The last page
    #[arg(long)]
    pub last: bool,
}

impl PageArgs {
    pub fn selection(&self) -> Result<PageSelection> {
        let mut chosen = Vec::new();
        if let Some(pages) = &self.pages {
            chosen.push(PageSelection::Custom {
                pages: pages.clone(),
            });
        }
        if self.all {
            chosen.push(PageSelection::All);
        }
        if self.even {
            chosen.push(PageSelection::Even);
        }
        if self.odd {
            chosen.push(PageSelection::Odd);
        }
        if let Some(n) = self.every {
            chosen.push(PageSelection::EveryNth {
                n,
                start_from: self.start_from,
            });
        }
        if let Some(page) = self.current {
            chosen.push(PageSelection::Current { page });
        }
        if self.first {
            chosen.push(PageSelection::First);
        }
        if self.last {
            chosen.push(PageSelection::Last);
        }

        match chosen.len() {
            0 => Ok(PageSelection::All),
            1 => Ok(chosen.remove(0)),
            _ => bail!("Choose only one of {}", PAGE_FLAGS),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server (primary mode)
    Mcp,

    /// Display PDF metadata
    Info {
        /// PDF file to inspect
        path: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show which pages a selection picks
    Resolve {
        /// PDF file to resolve against
        #[arg(required_unless_present = "total")]
        path: Option<PathBuf>,

        /// Resolve against a page count instead of a file
        #[arg(long, conflicts_with = "path")]
        total: Option<u32>,

        #[command(flatten)]
        pages: PageArgs,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Copy selected pages to a new PDF
    #[command(alias = "cat")]
    Extract {
        /// PDF file to extract from
        path: PathBuf,

        #[command(flatten)]
        pages: PageArgs,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write a copy of the PDF without the selected pages
    Remove {
        /// PDF file to remove pages from
        path: PathBuf,

        #[command(flatten)]
        pages: PageArgs,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Split a PDF into several files (one per page by default)
    #[command(alias = "burst")]
    Split {
        /// PDF file to split
        path: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output_dir: PathBuf,

        /// One file per range, e.g. "1-3,4-end"
        #[arg(long, conflicts_with_all = ["at", "chunk"])]
        ranges: Option<String>,

        /// Cut after these pages, e.g. "3,7"
        #[arg(long, conflicts_with = "chunk")]
        at: Option<String>,

        /// Files of N consecutive pages
        #[arg(long, value_name = "N")]
        chunk: Option<u32>,
    },

    /// Trim the visible area of selected pages
    Crop {
        /// PDF file to crop
        path: PathBuf,

        #[command(flatten)]
        pages: PageArgs,

        /// Points trimmed from the left edge
        #[arg(long, default_value = "0")]
        left: f32,

        /// Points trimmed from the right edge
        #[arg(long, default_value = "0")]
        right: f32,

        /// Points trimmed from the top edge
        #[arg(long, default_value = "0")]
        top: f32,

        /// Points trimmed from the bottom edge
        #[arg(long, default_value = "0")]
        bottom: f32,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print page numbers on selected pages
    Number {
        /// PDF file to number
        path: PathBuf,

        #[command(flatten)]
        pages: PageArgs,

        #[arg(long, value_enum, default_value_t)]
        position: NumberPosition,

        #[arg(long, value_enum, default_value_t)]
        format: NumberFormat,

        #[arg(long, default_value = "12")]
        font_size: f32,

        /// Number printed on the first selected page
        #[arg(long, default_value = "1")]
        start: u32,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Draw a text watermark on selected pages
    Watermark {
        /// PDF file to watermark
        path: PathBuf,

        #[command(flatten)]
        pages: PageArgs,

        #[arg(long, default_value = DEFAULT_TEXT)]
        text: String,

        #[arg(long, value_enum, default_value_t)]
        position: WatermarkPosition,

        /// Degrees, counter-clockwise
        #[arg(long, default_value = "45", allow_negative_numbers = true)]
        rotation: f32,

        /// Percent, 0 to 100
        #[arg(
            long,
            default_value = "60",
            value_parser = clap::value_parser!(u8).range(0..=100)
        )]
        opacity: u8,

        #[arg(long, default_value = "36")]
        font_size: f32,

        /// Colour as #RRGGBB
        #[arg(long, default_value = DEFAULT_COLOR)]
        color: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show or edit document metadata; an empty value clears a field
    Metadata {
        /// PDF file to edit
        path: PathBuf,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        author: Option<String>,

        #[arg(long)]
        subject: Option<String>,

        #[arg(long)]
        keywords: Option<String>,

        #[arg(long)]
        creator: Option<String>,

        #[arg(long)]
        producer: Option<String>,

        /// Output file; required when changing fields
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Turn selected pages by a multiple of 90 degrees
    Rotate {
        /// PDF file to rotate
        path: PathBuf,

        #[command(flatten)]
        pages: PageArgs,

        /// Degrees clockwise; negative values turn counter-clockwise
        #[arg(long, allow_negative_numbers = true)]
        degrees: i64,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Save the JPEG and JPEG 2000 images embedded in selected pages
    ExtractImages {
        /// PDF file to read images from
        path: PathBuf,

        #[command(flatten)]
        pages: PageArgs,

        /// Directory the images are written to
        #[arg(short, long)]
        output_dir: PathBuf,
    },

    /// Combine multiple PDFs into one
    Merge {
        /// PDF files or directories of PDFs to merge
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn try_parse(args: &str) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("pdfpages").chain(args.split_whitespace()))
    }

    fn parse(args: &str) -> Cli {
        try_parse(args).unwrap()
    }

    fn selection_of(cli: Cli) -> Result<PageSelection> {
        match cli.command {
            Commands::Extract { pages, .. } => pages.selection(),
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn test_page_flags_map_to_selection() {
        let cli = parse("extract a.pdf -o b.pdf --pages 1-3");
        assert_eq!(
            selection_of(cli).unwrap(),
            PageSelection::Custom {
                pages: "1-3".to_string()
            }
        );

        let cli = parse("cat a.pdf -o b.pdf --every 3 --start-from 2");
        assert_eq!(
            selection_of(cli).unwrap(),
            PageSelection::EveryNth {
                n: 3,
                start_from: Some(2)
            }
        );

        let cli = parse("extract a.pdf -o b.pdf");
        assert_eq!(selection_of(cli).unwrap(), PageSelection::All);
    }

    #[test]
    fn test_conflicting_page_flags() {
        let cli = parse("extract a.pdf -o b.pdf --even --last");
        let err = selection_of(cli).unwrap_err();
        assert!(err.to_string().contains(PAGE_FLAGS), "{}", err);
    }

    #[test]
    fn test_start_from_needs_every() {
        assert!(try_parse("extract a.pdf -o b.pdf --start-from 2").is_err());
    }

    #[test]
    fn test_global_options() {
        let cli = parse("info a.pdf --force --log pdfpages=debug");
        let config = cli.config();
        assert!(config.overwrite);
        assert_eq!(config.log_filter, "pdfpages=debug");
    }

    #[test]
    fn test_value_enums() {
        let cli = parse("number a -o b --position top-right --format roman-lower");
        match cli.command {
            Commands::Number {
                position, format, ..
            } => {
                assert_eq!(position, NumberPosition::TopRight);
                assert_eq!(format, NumberFormat::RomanLower);
            }
            _ => panic!("expected number"),
        }
    }

    #[test]
    fn test_rotate_accepts_negative_degrees() {
        let cli = parse("rotate a.pdf --odd --degrees -90 -o b.pdf");
        match cli.command {
            Commands::Rotate { pages, degrees, .. } => {
                assert_eq!(degrees, -90);
                assert_eq!(pages.selection().unwrap(), PageSelection::Odd);
            }
            _ => panic!("expected rotate"),
        }
        assert!(try_parse("rotate a.pdf -o b.pdf").is_err());
    }

    #[test]
    fn test_extract_images_subcommand() {
        let cli = parse("extract-images a.pdf --pages 2-end -o imgs");
        match cli.command {
            Commands::ExtractImages { output_dir, .. } => {
                assert_eq!(output_dir, PathBuf::from("imgs"));
            }
            _ => panic!("expected extract-images"),
        }
    }
}
