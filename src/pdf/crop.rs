use anyhow::{bail, Result};
use lopdf::{Document, Object};

use super::document::{media_box, page_object_id};
use crate::page_range::ResolvedPageSet;

/// Amount trimmed from each edge of the MediaBox, in points.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Margins {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Margins {
    fn validate(&self) -> Result<()> {
        for (edge, value) in [
            ("left", self.left),
            ("right", self.right),
            ("top", self.top),
            ("bottom", self.bottom),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!(
                    "Crop margin {} must be a non-negative number, got {}",
                    edge,
                    value
                );
            }
        }
        Ok(())
    }

    /// `rect` shrunk by the margins, or `None` when nothing would be left.
    fn inset(&self, rect: [f32; 4]) -> Option<[f32; 4]> {
        let [llx, lly, urx, ury] = rect;
        let cropped = [
            llx + self.left,
            lly + self.bottom,
            urx - self.right,
            ury - self.top,
        ];
        (cropped[2] > cropped[0] && cropped[3] > cropped[1]).then_some(cropped)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CropReport {
    pub cropped: usize,
    /// Pages the margins would have cropped to nothing
    pub skipped: Vec<u32>,
}

pub fn crop_pages(
    doc: &mut Document,
    pages: &ResolvedPageSet,
    margins: &Margins,
) -> Result<CropReport> {
    margins.validate()?;

    let mut report = CropReport::default();
    for page in pages.iter() {
        let page_id = page_object_id(doc, page)?;
        match margins.inset(media_box(doc, page_id)) {
            Some(rect) => {
                let crop_box: Vec<Object> = rect.iter().map(|v| Object::Real(*v)).collect();
                doc.get_dictionary_mut(page_id)?.set("CropBox", crop_box);
                report.cropped += 1;
            }
            None => {
                tracing::warn!(page, "crop margins leave no visible area, page skipped");
                report.skipped.push(page);
            }
        }
    }
    Ok(report)
}
