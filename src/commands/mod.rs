pub mod crop;
pub mod extract;
pub mod images;
pub mod info;
pub mod merge;
pub mod metadata;
pub mod number;
pub mod remove;
pub mod resolve;
pub mod rotate;
pub mod split;
pub mod watermark;

use anyhow::Result;

use crate::page_range::ResolvedPageSet;
use crate::pdf::PdfDocument;
use crate::selection::PageSelection;

/// Resolve `selection` against an open document.
fn select(doc: &PdfDocument, selection: &PageSelection) -> Result<ResolvedPageSet> {
    let pages = selection.resolve(doc.context()?)?;
    tracing::debug!(path = %doc.path, pages = %pages, "pages selected");
    Ok(pages)
}
