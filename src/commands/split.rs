use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::config::Config;
use crate::page_range::{parse_specifier_text, PageRangeError, PageSpan, PageSpecifier, ParseMode};
use crate::pdf::PdfDocument;
use crate::split::{plan_split, SplitMethod};

/// Ranges such as "1-3, 4-end" for [`SplitMethod::ByRanges`].
pub fn parse_ranges(text: &str) -> Result<Vec<PageSpan>, PageRangeError> {
    match parse_specifier_text(text, ParseMode::Ranges)? {
        PageSpecifier::RangeList(spans) => Ok(spans),
        _ => Ok(Vec::new()),
    }
}

/// Split points such as "3, 7" for [`SplitMethod::AtPages`].
pub fn parse_points(text: &str) -> Result<Vec<u32>, PageRangeError> {
    match parse_specifier_text(text, ParseMode::Explicit)? {
        PageSpecifier::Explicit(pages) => Ok(pages),
        _ => Ok(Vec::new()),
    }
}

#[derive(Debug, Serialize)]
pub struct SplitOutput {
    pub path: String,
    pub pages: String,
    pub page_count: usize,
}

#[derive(Debug, Serialize)]
pub struct SplitOutcome {
    pub output_dir: String,
    pub parts: Vec<SplitOutput>,
}

impl fmt::Display for SplitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Split into {} file(s) in {}",
            self.parts.len(),
            self.output_dir
        )?;
        for part in &self.parts {
            write!(f, "\n  {} ({})", part.path, part.pages)?;
        }
        Ok(())
    }
}

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    config: &Config,
    input: P,
    method: &SplitMethod,
    output_dir: Q,
) -> Result<SplitOutcome> {
    let input = input.as_ref();
    let output_dir = output_dir.as_ref();

    let doc = PdfDocument::open(input)?;
    let parts = plan_split(method, doc.context()?)?;

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");

    // Every target is checked before the first file is written.
    let targets: Vec<_> = parts
        .iter()
        .map(|part| output_dir.join(part.file_name(stem)))
        .collect();
    for target in &targets {
        config.check_output(input, target)?;
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    let mut outputs = Vec::with_capacity(parts.len());
    for (part, target) in parts.iter().zip(&targets) {
        let mut new_doc = doc.extract_pages(&part.pages)?;
        PdfDocument::save(&mut new_doc, target)?;
        tracing::debug!(pages = %part.pages, output = %target.display(), "wrote split part");
        outputs.push(SplitOutput {
            path: target.display().to_string(),
            pages: part.pages.to_string(),
            page_count: part.pages.count(),
        });
    }

    tracing::info!(
        parts = outputs.len(),
        output = %output_dir.display(),
        "split document"
    );
    Ok(SplitOutcome {
        output_dir: output_dir.display().to_string(),
        parts: outputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_range::OPEN_END;
    use crate::pdf::fixture;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_split_arguments() {
        assert_eq!(
            parse_ranges("1-3, 4-end, 9").unwrap(),
            vec![
                PageSpan::new(1, 3),
                PageSpan::new(4, OPEN_END),
                PageSpan::new(9, 9),
            ]
        );
        assert_eq!(parse_points("3, 7").unwrap(), vec![3, 7]);
        assert!(parse_points("3-4").is_err());
    }

    #[test]
    fn test_split_writes_named_parts() {
        let dir = tempfile::tempdir().unwrap();
        let input = fixture::write_pdf(dir.path(), "report.pdf", 5);
        let out_dir = dir.path().join("parts");

        let config = Config::default();
        let outcome = run(&config, &input, &SplitMethod::AtPages(vec![2]), &out_dir).unwrap();
        assert_eq!(outcome.parts.len(), 2);

        let second = PdfDocument::open(out_dir.join("report_part2_pages3-5.pdf")).unwrap();
        assert_eq!(
            fixture::page_labels(&second.doc),
            vec!["Page 3", "Page 4", "Page 5"]
        );
        assert!(out_dir.join("report_part1_pages1-2.pdf").exists());
    }

    #[test]
    fn test_split_all_pages() {
        let dir = tempfile::tempdir().unwrap();
        let input = fixture::write_pdf(dir.path(), "doc.pdf", 3);

        let config = Config::default();
        let outcome = run(&config, &input, &SplitMethod::AllPages, dir.path()).unwrap();
        let names: Vec<_> = outcome
            .parts
            .iter()
            .map(|p| {
                Path::new(&p.path)
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(
            names,
            vec!["doc_page1.pdf", "doc_page2.pdf", "doc_page3.pdf"]
        );
    }

    #[test]
    fn test_existing_part_blocks_whole_split() {
        let dir = tempfile::tempdir().unwrap();
        let input = fixture::write_pdf(dir.path(), "doc.pdf", 2);
        std::fs::write(dir.path().join("doc_page2.pdf"), b"%PDF").unwrap();

        let config = Config::default();
        assert!(run(&config, &input, &SplitMethod::AllPages, dir.path()).is_err());
        assert!(!dir.path().join("doc_page1.pdf").exists());
    }
}
