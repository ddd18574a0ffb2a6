use anyhow::{bail, Context, Result};
use lopdf::{Document, Object, ObjectId};
use std::path::Path;

use crate::page_range::{DocumentContext, ResolvedPageSet};

/// US Letter, used when a page tree carries no MediaBox at all.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Maximum `Parent` hops when looking up inherited page attributes.
const MAX_INHERIT_DEPTH: usize = 32;

pub struct PdfDocument {
    pub doc: Document,
    pub path: String,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().display().to_string();
        let bytes =
            std::fs::read(&path).with_context(|| format!("Failed to read file: {}", path_str))?;
        let doc = Document::load_mem(&bytes)
            .with_context(|| format!("Failed to open PDF: {}", path_str))?;
        Ok(PdfDocument {
            doc,
            path: path_str,
        })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Page facts for the page-selection resolver.
    pub fn context(&self) -> Result<DocumentContext> {
        DocumentContext::new(self.page_count())
            .with_context(|| format!("Cannot select pages in {}", self.path))
    }

    /// Get metadata from the document info dictionary
    pub fn get_info(&self) -> PdfInfo {
        let mut info = PdfInfo::default();

        if let Some(dict) = self.info_dict() {
            info.title = get_string_from_dict(dict, b"Title");
            info.author = get_string_from_dict(dict, b"Author");
            info.creator = get_string_from_dict(dict, b"Creator");
            info.producer = get_string_from_dict(dict, b"Producer");
            info.creation_date = get_string_from_dict(dict, b"CreationDate");
            info.mod_date = get_string_from_dict(dict, b"ModDate");
            info.subject = get_string_from_dict(dict, b"Subject");
            info.keywords = get_string_from_dict(dict, b"Keywords");
        }

        info.page_count = self.page_count();
        info
    }

    fn info_dict(&self) -> Option<&lopdf::Dictionary> {
        match self.doc.trailer.get(b"Info").ok()? {
            Object::Reference(info_ref) => self.doc.get_dictionary(*info_ref).ok(),
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    /// Copy of the document containing only `pages`.
    pub fn extract_pages(&self, pages: &ResolvedPageSet) -> Result<Document> {
        let ctx = self.context()?;
        let mut new_doc = self.doc.clone();

        let pages_to_delete = pages.complement(ctx);
        if !pages_to_delete.is_empty() {
            new_doc.delete_pages(&pages_to_delete);
            new_doc.prune_objects();
        }

        Ok(new_doc)
    }

    /// Copy of the document without `pages`. At least one page must remain.
    pub fn remove_pages(&self, pages: &ResolvedPageSet) -> Result<Document> {
        let total = self.page_count();
        if pages.count() as u32 >= total {
            bail!("Cannot remove all {} pages from {}", total, self.path);
        }

        let mut new_doc = self.doc.clone();
        new_doc.delete_pages(pages.as_slice());
        new_doc.prune_objects();
        Ok(new_doc)
    }

    /// Save to a file
    pub fn save<P: AsRef<Path>>(doc: &mut Document, path: P) -> Result<()> {
        doc.save(&path)
            .with_context(|| format!("Failed to save PDF: {}", path.as_ref().display()))?;
        Ok(())
    }
}

/// Object ID of 1-based page `page`.
pub fn page_object_id(doc: &Document, page: u32) -> Result<ObjectId> {
    doc.get_pages()
        .get(&page)
        .copied()
        .with_context(|| format!("Page {} not found in page tree", page))
}

/// The page's MediaBox as `[llx, lly, urx, ury]`, following inheritance
/// through the page tree.
pub fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    inherited_attribute(doc, page_id, b"MediaBox")
        .and_then(|obj| rect_from_object(doc, obj))
        .unwrap_or(DEFAULT_MEDIA_BOX)
}

/// The region a viewer shows: the CropBox when there is one, else the MediaBox.
pub fn visible_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    inherited_attribute(doc, page_id, b"CropBox")
        .and_then(|obj| rect_from_object(doc, obj))
        .unwrap_or_else(|| media_box(doc, page_id))
}

/// Look up a page attribute on the page itself or its nearest ancestor.
pub fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = Some(page_id);
    for _ in 0..MAX_INHERIT_DEPTH {
        let dict = doc.get_dictionary(current?).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

fn rect_from_object(doc: &Document, obj: &Object) -> Option<[f32; 4]> {
    let resolved = match obj {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let arr = resolved.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let mut rect = [0.0; 4];
    for (slot, value) in rect.iter_mut().zip(arr) {
        *slot = value.as_float().ok()?;
    }
    Some(rect)
}

#[derive(Debug, Default, Clone)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub page_count: u32,
}

fn get_string_from_dict(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|obj| match obj {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        _ => None,
    })
}

fn decode_pdf_string(bytes: &[u8]) -> Option<String> {
    // Check for UTF-16 BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let u16_chars: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        String::from_utf16(&u16_chars).ok()
    } else {
        // Latin-1 / PDFDocEncoding (simplified)
        Some(bytes.iter().map(|&b| b as char).collect())
    }
}
