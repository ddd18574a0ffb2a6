use anyhow::{bail, Result};
use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::config::Config;
use crate::pdf::merge::{collect_inputs, merge_documents};
use crate::pdf::PdfDocument;

#[derive(Debug, Serialize)]
pub struct MergeOutcome {
    pub output_path: String,
    pub files: Vec<String>,
    pub page_count: u32,
}

impl fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Merged {} file(s) ({} pages) into {}",
            self.files.len(),
            self.page_count,
            self.output_path
        )
    }
}

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    config: &Config,
    inputs: &[P],
    output: Q,
) -> Result<MergeOutcome> {
    let output = output.as_ref();
    let files = collect_inputs(inputs)?;
    for file in &files {
        config.check_output(file, output)?;
    }
    if files.len() == 1 {
        tracing::warn!(input = %files[0].display(), "merging a single file");
    }

    let mut documents = Vec::with_capacity(files.len());
    for file in &files {
        let pdf = PdfDocument::open(file)?;
        if pdf.page_count() == 0 {
            bail!("{} has no pages", pdf.path);
        }
        documents.push(pdf.doc);
    }

    let mut merged = merge_documents(documents)?;
    let page_count = merged.get_pages().len() as u32;
    PdfDocument::save(&mut merged, output)?;

    tracing::info!(
        files = files.len(),
        pages = page_count,
        output = %output.display(),
        "merged documents"
    );
    Ok(MergeOutcome {
        output_path: output.display().to_string(),
        files: files.iter().map(|f| f.display().to_string()).collect(),
        page_count,
    })
}
