use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::path::Path;

use super::select;
use crate::config::Config;
use crate::pdf::rotate::{rotate_pages, PageRotation};
use crate::pdf::PdfDocument;
use crate::selection::PageSelection;

#[derive(Debug, Serialize)]
pub struct RotateOutcome {
    pub output_path: String,
    pub degrees: i64,
    pub pages: String,
    pub rotations: Vec<PageRotation>,
}

impl fmt::Display for RotateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rotated {} page(s) ({}) by {} degrees into {}",
            self.rotations.len(),
            self.pages,
            self.degrees,
            self.output_path
        )
    }
}

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    config: &Config,
    input: P,
    selection: &PageSelection,
    degrees: i64,
    output: Q,
) -> Result<RotateOutcome> {
    let output = output.as_ref();
    config.check_output(&input, output)?;

    let mut doc = PdfDocument::open(&input)?;
    let pages = select(&doc, selection)?;
    let rotations = rotate_pages(&mut doc.doc, &pages, degrees)?;
    PdfDocument::save(&mut doc.doc, output)?;

    tracing::info!(pages = %pages, degrees, output = %output.display(), "rotated pages");
    Ok(RotateOutcome {
        output_path: output.display().to_string(),
        degrees,
        pages: pages.to_string(),
        rotations,
    })
}
