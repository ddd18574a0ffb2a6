use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::path::Path;

use super::select;
use crate::config::Config;
use crate::pdf::PdfDocument;
use crate::selection::PageSelection;

#[derive(Debug, Serialize)]
pub struct ExtractOutcome {
    pub output_path: String,
    pub page_count: usize,
    pub pages: String,
}

impl fmt::Display for ExtractOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Extracted {} page(s) ({}) to {}",
            self.page_count, self.pages, self.output_path
        )
    }
}

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    config: &Config,
    input: P,
    selection: &PageSelection,
    output: Q,
) -> Result<ExtractOutcome> {
    let output = output.as_ref();
    config.check_output(&input, output)?;

    let doc = PdfDocument::open(&input)?;
    let pages = select(&doc, selection)?;

    let mut new_doc = doc.extract_pages(&pages)?;
    PdfDocument::save(&mut new_doc, output)?;

    tracing::info!(pages = %pages, output = %output.display(), "extracted pages");
    Ok(ExtractOutcome {
        output_path: output.display().to_string(),
        page_count: pages.count(),
        pages: pages.to_string(),
    })
}
