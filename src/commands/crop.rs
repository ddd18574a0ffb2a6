use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::path::Path;

use super::select;
use crate::config::Config;
use crate::pdf::crop::{crop_pages, Margins};
use crate::pdf::PdfDocument;
use crate::selection::PageSelection;

#[derive(Debug, Serialize)]
pub struct CropOutcome {
    pub output_path: String,
    pub cropped: usize,
    pub skipped: Vec<u32>,
}

impl fmt::Display for CropOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cropped {} page(s) into {}",
            self.cropped, self.output_path
        )?;
        if !self.skipped.is_empty() {
            let skipped: Vec<String> = self.skipped.iter().map(u32::to_string).collect();
            write!(f, " (skipped {})", skipped.join(", "))?;
        }
        Ok(())
    }
}

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    config: &Config,
    input: P,
    selection: &PageSelection,
    margins: &Margins,
    output: Q,
) -> Result<CropOutcome> {
    let output = output.as_ref();
    config.check_output(&input, output)?;

    let mut doc = PdfDocument::open(&input)?;
    let pages = select(&doc, selection)?;
    let report = crop_pages(&mut doc.doc, &pages, margins)?;
    PdfDocument::save(&mut doc.doc, output)?;

    tracing::info!(
        pages = %pages,
        cropped = report.cropped,
        skipped = report.skipped.len(),
        output = %output.display(),
        "cropped pages"
    );
    Ok(CropOutcome {
        output_path: output.display().to_string(),
        cropped: report.cropped,
        skipped: report.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixture;
    use lopdf::Object;

    #[test]
    fn test_crop_current_page_only() {
        let dir = tempfile::tempdir().unwrap();
        let input = fixture::write_pdf(dir.path(), "in.pdf", 3);
        let output = dir.path().join("out.pdf");
        let margins = Margins {
            left: 50.0,
            ..Margins::default()
        };

        let outcome = run(
            &Config::default(),
            &input,
            &PageSelection::Current { page: 2 },
            &margins,
            &output,
        )
        .unwrap();
        assert_eq!(outcome.cropped, 1);
        assert!(outcome.skipped.is_empty());

        let written = PdfDocument::open(&output).unwrap();
        let pages = written.doc.get_pages();
        let has_crop = |page: u32| {
            written
                .doc
                .get_dictionary(pages[&page])
                .map(|d| matches!(d.get(b"CropBox"), Ok(Object::Array(_))))
                .unwrap()
        };
        assert!(!has_crop(1));
        assert!(has_crop(2));
        assert!(!has_crop(3));
    }
}
