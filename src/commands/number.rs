use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::path::Path;

use super::select;
use crate::config::Config;
use crate::pdf::page_numbers::{add_page_numbers, PageNumberOptions};
use crate::pdf::PdfDocument;
use crate::selection::PageSelection;

#[derive(Debug, Serialize)]
pub struct NumberOutcome {
    pub output_path: String,
    pub numbered: usize,
    pub pages: String,
}

impl fmt::Display for NumberOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Numbered {} page(s) ({}) into {}",
            self.numbered, self.pages, self.output_path
        )
    }
}

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    config: &Config,
    input: P,
    selection: &PageSelection,
    options: &PageNumberOptions,
    output: Q,
) -> Result<NumberOutcome> {
    let output = output.as_ref();
    config.check_output(&input, output)?;

    let mut doc = PdfDocument::open(&input)?;
    let pages = select(&doc, selection)?;
    let numbered = add_page_numbers(&mut doc.doc, &pages, options)?;
    PdfDocument::save(&mut doc.doc, output)?;

    tracing::info!(pages = %pages, output = %output.display(), "added page numbers");
    Ok(NumberOutcome {
        output_path: output.display().to_string(),
        numbered,
        pages: pages.to_string(),
    })
}
