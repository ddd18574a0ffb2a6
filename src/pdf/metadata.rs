use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

/// Changes to the document information dictionary.
///
/// `None` leaves a field alone; an empty (or blank) string removes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
}

impl MetadataUpdate {
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, value)| value.is_none())
    }

    fn fields(&self) -> [(&'static str, &Option<String>); 6] {
        [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Subject", &self.subject),
            ("Keywords", &self.keywords),
            ("Creator", &self.creator),
            ("Producer", &self.producer),
        ]
    }
}

/// Apply `update` and stamp `ModDate` with `now`. Returns the number of
/// fields set or cleared.
pub fn apply_metadata(
    doc: &mut Document,
    update: &MetadataUpdate,
    now: DateTime<Utc>,
) -> Result<usize> {
    let info_id = info_dict_id(doc)?;
    let info = doc
        .get_object_mut(info_id)
        .and_then(Object::as_dict_mut)
        .context("Document info entry is not a dictionary")?;

    let mut changed = 0;
    for (key, value) in update.fields() {
        let Some(value) = value else { continue };
        let value = value.trim();
        if value.is_empty() {
            info.remove(key.as_bytes());
        } else {
            info.set(key, encode_text_string(value));
        }
        changed += 1;
    }
    info.set("ModDate", Object::string_literal(pdf_date(now)));

    Ok(changed)
}

/// The info dictionary as an indirect object, creating it or moving an
/// inline dictionary out of the trailer as needed.
fn info_dict_id(doc: &mut Document) -> Result<ObjectId> {
    let existing = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => return Ok(*id),
        Ok(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    let id = doc.add_object(existing);
    doc.trailer.set("Info", id);
    Ok(id)
}

/// Printable ASCII stays a literal string; anything else is written as
/// UTF-16BE with a byte order mark.
fn encode_text_string(text: &str) -> Object {
    if text.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn pdf_date(now: DateTime<Utc>) -> String {
    format!("D:{}Z", now.format("%Y%m%d%H%M%S"))
}
