use anyhow::{bail, Result};
use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::config::Config;
use crate::pdf::metadata::{apply_metadata, MetadataUpdate};
use crate::pdf::PdfDocument;

#[derive(Debug, Serialize)]
pub struct MetadataOutcome {
    pub output_path: String,
    pub changed: usize,
}

impl fmt::Display for MetadataOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Updated {} metadata field(s) in {}",
            self.changed, self.output_path
        )
    }
}

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    config: &Config,
    input: P,
    update: &MetadataUpdate,
    output: Q,
) -> Result<MetadataOutcome> {
    if update.is_empty() {
        bail!("No metadata fields to change");
    }
    let output = output.as_ref();
    config.check_output(&input, output)?;

    let mut doc = PdfDocument::open(&input)?;
    let changed = apply_metadata(&mut doc.doc, update, chrono::Utc::now())?;
    PdfDocument::save(&mut doc.doc, output)?;

    tracing::info!(changed, output = %output.display(), "updated metadata");
    Ok(MetadataOutcome {
        output_path: output.display().to_string(),
        changed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixture;

    #[test]
    fn test_metadata_round_trip_through_info() {
        let dir = tempfile::tempdir().unwrap();
        let input = fixture::write_pdf(dir.path(), "in.pdf", 1);
        let output = dir.path().join("out.pdf");
        let update = MetadataUpdate {
            title: Some("Minutes".to_string()),
            ..MetadataUpdate::default()
        };

        let outcome = run(&Config::default(), &input, &update, &output).unwrap();
        assert_eq!(outcome.changed, 1);

        let info = crate::commands::info::run(&output).unwrap();
        assert_eq!(info.title.as_deref(), Some("Minutes"));
        assert!(info.mod_date.is_some_and(|d| d.starts_with("D:")));
    }

    #[test]
    fn test_empty_update_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = fixture::write_pdf(dir.path(), "in.pdf", 1);
        let output = dir.path().join("out.pdf");
        let config = Config::default();
        assert!(run(&config, &input, &MetadataUpdate::default(), &output).is_err());
    }
}
