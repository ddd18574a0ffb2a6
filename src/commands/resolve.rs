use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::page_range::DocumentContext;
use crate::pdf::PdfDocument;
use crate::selection::PageSelection;

#[derive(Debug, Serialize)]
pub struct ResolveOutcome {
    pub total_pages: u32,
    pub count: usize,
    /// Compact form, e.g. "1-3,7"
    pub summary: String,
    pub pages: Vec<u32>,
}

impl fmt::Display for ResolveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} page(s): {}",
            self.count, self.total_pages, self.summary
        )
    }
}

/// Resolve against a document of `total_pages` pages without opening a file.
pub fn run(total_pages: u32, selection: &PageSelection) -> Result<ResolveOutcome> {
    let ctx = DocumentContext::new(total_pages)?;
    let pages = selection.resolve(ctx)?;
    Ok(ResolveOutcome {
        total_pages,
        count: pages.count(),
        summary: pages.to_string(),
        pages: pages.into_vec(),
    })
}

pub fn run_for_file<P: AsRef<Path>>(path: P, selection: &PageSelection) -> Result<ResolveOutcome> {
    let doc = PdfDocument::open(&path)?;
    run(doc.page_count(), selection)
}
