use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::path::Path;

use super::select;
use crate::config::Config;
use crate::pdf::watermark::{add_watermark, WatermarkOptions};
use crate::pdf::PdfDocument;
use crate::selection::PageSelection;

#[derive(Debug, Serialize)]
pub struct WatermarkOutcome {
    pub output_path: String,
    pub watermarked: usize,
    pub pages: String,
}

impl fmt::Display for WatermarkOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Watermarked {} page(s) ({}) into {}",
            self.watermarked, self.pages, self.output_path
        )
    }
}

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    config: &Config,
    input: P,
    selection: &PageSelection,
    options: &WatermarkOptions,
    output: Q,
) -> Result<WatermarkOutcome> {
    let output = output.as_ref();
    config.check_output(&input, output)?;

    let mut doc = PdfDocument::open(&input)?;
    let pages = select(&doc, selection)?;
    let watermarked = add_watermark(&mut doc.doc, &pages, options)?;
    PdfDocument::save(&mut doc.doc, output)?;

    tracing::info!(
        pages = %pages,
        text = %options.text,
        output = %output.display(),
        "added watermark"
    );
    Ok(WatermarkOutcome {
        output_path: output.display().to_string(),
        watermarked,
        pages: pages.to_string(),
    })
}
