use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::path::Path;

use super::select;
use crate::config::Config;
use crate::pdf::PdfDocument;
use crate::selection::PageSelection;

#[derive(Debug, Serialize)]
pub struct RemoveOutcome {
    pub output_path: String,
    pub removed: String,
    pub removed_count: usize,
    pub remaining_count: u32,
}

impl fmt::Display for RemoveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Removed {} page(s) ({}); {} page(s) left in {}",
            self.removed_count, self.removed, self.remaining_count, self.output_path
        )
    }
}

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    config: &Config,
    input: P,
    selection: &PageSelection,
    output: Q,
) -> Result<RemoveOutcome> {
    let output = output.as_ref();
    config.check_output(&input, output)?;

    let doc = PdfDocument::open(&input)?;
    let pages = select(&doc, selection)?;

    let mut new_doc = doc.remove_pages(&pages)?;
    PdfDocument::save(&mut new_doc, output)?;

    tracing::info!(pages = %pages, output = %output.display(), "removed pages");
    Ok(RemoveOutcome {
        output_path: output.display().to_string(),
        removed: pages.to_string(),
        removed_count: pages.count(),
        remaining_count: doc.page_count() - pages.count() as u32,
    })
}
