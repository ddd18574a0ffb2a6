//! Embedded images that are already stored in a standalone file format.
//!
//! JPEG (`DCTDecode`) and JPEG 2000 (`JPXDecode`) stream data is a complete
//! image file, so it can be copied out without decoding anything. Images
//! using any other filter are reported and left alone.

use anyhow::{Context, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};

use super::document::{inherited_attribute, page_object_id};
use crate::page_range::ResolvedPageSet;

/// An image XObject in a page's resources.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    pub page: u32,
    /// Resource name, without the leading `/`
    pub name: String,
    /// Stream filters joined with `+`, or `None` for raw samples
    pub filter: Option<String>,
    pub id: ObjectId,
}

impl PageImage {
    /// File extension for image data that is a file as stored.
    pub fn extension(&self) -> Option<&'static str> {
        match self.filter.as_deref() {
            Some("DCTDecode") => Some("jpg"),
            Some("JPXDecode") => Some("jp2"),
            _ => None,
        }
    }

    /// `{stem}_page{n}_{name}.{ext}`, keeping only `[A-Za-z0-9_-]` of the name.
    pub fn file_name(&self, stem: &str) -> Option<String> {
        let ext = self.extension()?;
        let name: String = self
            .name
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' => c,
                _ => '_',
            })
            .collect();
        Some(format!("{}_page{}_{}.{}", stem, self.page, name, ext))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageScan {
    pub saveable: Vec<PageImage>,
    pub skipped: Vec<PageImage>,
}

/// Find the image XObjects of the selected pages, in page order.
pub fn scan_images(doc: &Document, pages: &ResolvedPageSet) -> Result<ImageScan> {
    let mut scan = ImageScan::default();
    for page in pages.iter() {
        let page_id = page_object_id(doc, page)?;
        let Some(xobjects) = page_xobjects(doc, page_id) else {
            continue;
        };

        for (name, value) in xobjects.iter() {
            let Object::Reference(id) = value else {
                continue;
            };
            let Ok(stream) = doc.get_object(*id).and_then(Object::as_stream) else {
                continue;
            };
            if !is_image(&stream.dict) {
                continue;
            }

            let image = PageImage {
                page,
                name: String::from_utf8_lossy(name).into_owned(),
                filter: filter_name(&stream.dict),
                id: *id,
            };
            if image.extension().is_some() {
                scan.saveable.push(image);
            } else {
                tracing::warn!(
                    page,
                    name = %image.name,
                    filter = image.filter.as_deref().unwrap_or("none"),
                    "image is not stored as a standalone file, skipped"
                );
                scan.skipped.push(image);
            }
        }
    }
    Ok(scan)
}

/// The stored bytes of `image`.
pub fn image_data<'a>(doc: &'a Document, image: &PageImage) -> Result<&'a [u8]> {
    let stream = doc
        .get_object(image.id)
        .and_then(Object::as_stream)
        .with_context(|| format!("Image {} on page {} is missing", image.name, image.page))?;
    Ok(&stream.content)
}

fn page_xobjects(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let resources = resolve_dict(doc, inherited_attribute(doc, page_id, b"Resources")?)?;
    resolve_dict(doc, resources.get(b"XObject").ok()?)
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn is_image(dict: &Dictionary) -> bool {
    matches!(dict.get(b"Subtype"), Ok(Object::Name(subtype)) if subtype == b"Image")
}

fn filter_name(dict: &Dictionary) -> Option<String> {
    let names: Vec<String> = match dict.get(b"Filter").ok()? {
        Object::Name(name) => vec![String::from_utf8_lossy(name).into_owned()],
        Object::Array(filters) => filters
            .iter()
            .filter_map(|f| f.as_name().ok())
            .map(|name| String::from_utf8_lossy(name).into_owned())
            .collect(),
        _ => Vec::new(),
    };
    (!names.is_empty()).then(|| names.join("+"))
}
