use anyhow::{bail, Result};
use lopdf::{Document, Object, ObjectId};
use serde::Serialize;

use super::document::{inherited_attribute, page_object_id};
use crate::page_range::ResolvedPageSet;

/// A page's `/Rotate` after rotating, in degrees clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRotation {
    pub page: u32,
    pub rotate: i64,
}

/// `degrees` as one of 0, 90, 180 or 270.
pub fn normalize_rotation(degrees: i64) -> Result<i64> {
    if degrees % 90 != 0 {
        bail!("Rotation must be a multiple of 90 degrees, got {}", degrees);
    }
    Ok(degrees.rem_euclid(360))
}

/// The rotation a viewer applies to the page, including one set on an
/// ancestor in the page tree.
pub fn page_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    let value = match inherited_attribute(doc, page_id, b"Rotate") {
        Some(Object::Reference(id)) => doc.get_object(*id).ok(),
        other => other,
    };
    value
        .and_then(|obj| obj.as_float().ok())
        .map_or(0, |degrees| degrees.round() as i64)
        .rem_euclid(360)
}

/// Turn each selected page by `degrees` on top of its current rotation.
pub fn rotate_pages(
    doc: &mut Document,
    pages: &ResolvedPageSet,
    degrees: i64,
) -> Result<Vec<PageRotation>> {
    let delta = normalize_rotation(degrees)?;

    let mut rotations = Vec::with_capacity(pages.count());
    for page in pages.iter() {
        let page_id = page_object_id(doc, page)?;
        let rotate = (page_rotation(doc, page_id) + delta).rem_euclid(360);
        doc.get_dictionary_mut(page_id)?.set("Rotate", rotate);
        rotations.push(PageRotation { page, rotate });
    }

    tracing::debug!(pages = %pages, degrees, "pages rotated");
    Ok(rotations)
}
