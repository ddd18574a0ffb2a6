use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::path::Path;

use super::select;
use crate::config::Config;
use crate::pdf::images::{image_data, scan_images, PageImage};
use crate::pdf::PdfDocument;
use crate::selection::PageSelection;

#[derive(Debug, Serialize)]
pub struct SavedImage {
    pub page: u32,
    pub name: String,
    pub filter: String,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct SkippedImage {
    pub page: u32,
    pub name: String,
    pub filter: Option<String>,
}

impl From<PageImage> for SkippedImage {
    fn from(image: PageImage) -> Self {
        SkippedImage {
            page: image.page,
            name: image.name,
            filter: image.filter,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImagesOutcome {
    pub output_dir: String,
    pub pages: String,
    pub images: Vec<SavedImage>,
    pub skipped: Vec<SkippedImage>,
}

impl fmt::Display for ImagesOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Saved {} image(s) from pages {} in {}",
            self.images.len(),
            self.pages,
            self.output_dir
        )?;
        for image in &self.images {
            write!(f, "\n  {} (page {})", image.path, image.page)?;
        }
        for image in &self.skipped {
            let filter = image.filter.as_deref().unwrap_or("no filter");
            write!(
                f,
                "\n  skipped {} on page {} ({})",
                image.name, image.page, filter
            )?;
        }
        Ok(())
    }
}

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    config: &Config,
    input: P,
    selection: &PageSelection,
    output_dir: Q,
) -> Result<ImagesOutcome> {
    let input = input.as_ref();
    let output_dir = output_dir.as_ref();

    let doc = PdfDocument::open(input)?;
    let pages = select(&doc, selection)?;
    let scan = scan_images(&doc.doc, &pages)?;

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");

    let mut targets = Vec::with_capacity(scan.saveable.len());
    for image in &scan.saveable {
        let name = image
            .file_name(stem)
            .with_context(|| format!("Image {} has no file format", image.name))?;
        let target = output_dir.join(name);
        config.check_output(input, &target)?;
        targets.push(target);
    }

    if !targets.is_empty() {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;
    }

    let mut images = Vec::with_capacity(targets.len());
    for (image, target) in scan.saveable.iter().zip(&targets) {
        std::fs::write(target, image_data(&doc.doc, image)?)
            .with_context(|| format!("Failed to write image: {}", target.display()))?;
        tracing::debug!(page = image.page, output = %target.display(), "wrote image");
        images.push(SavedImage {
            page: image.page,
            name: image.name.clone(),
            filter: image.filter.clone().unwrap_or_default(),
            path: target.display().to_string(),
        });
    }

    tracing::info!(
        pages = %pages,
        saved = images.len(),
        skipped = scan.skipped.len(),
        output = %output_dir.display(),
        "extracted images"
    );
    Ok(ImagesOutcome {
        output_dir: output_dir.display().to_string(),
        pages: pages.to_string(),
        images,
        skipped: scan.skipped.into_iter().map(SkippedImage::from).collect(),
    })
}
