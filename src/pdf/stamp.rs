//! Drawing text on top of existing page content.
//!
//! Overlays are appended as extra content streams. The page's own content is
//! wrapped in `q`/`Q` first so whatever graphics state it leaves behind does
//! not leak into the overlay.

use anyhow::{bail, Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use regex::Regex;

use super::document::inherited_attribute;

const FONT_RESOURCE: &str = "PPStampF1";
const STATE_RESOURCE: &str = "PPStampGS1";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    /// Parse `#RRGGBB` (the leading `#` is optional).
    pub fn parse_hex(s: &str) -> Result<Self> {
        let re = Regex::new(r"^#?([0-9A-Fa-f]{2})([0-9A-Fa-f]{2})([0-9A-Fa-f]{2})$")?;
        let caps = re
            .captures(s.trim())
            .with_context(|| format!("Invalid colour {:?}, expected #RRGGBB", s))?;
        let channel = |i: usize| -> Result<f32> {
            Ok(u8::from_str_radix(&caps[i], 16)? as f32 / 255.0)
        };
        Ok(Rgb {
            r: channel(1)?,
            g: channel(2)?,
            b: channel(3)?,
        })
    }
}

/// One run of text to draw.
///
/// The coordinate system is moved to `origin` and rotated by `rotation`
/// degrees before the text is placed at `offset`.
#[derive(Debug, Clone)]
pub struct TextStamp {
    pub text: String,
    pub origin: (f32, f32),
    pub offset: (f32, f32),
    pub rotation: f32,
    pub font_size: f32,
    pub color: Rgb,
}

/// Fail unless `font_size` is a usable text size in points.
pub fn check_font_size(font_size: f32) -> Result<()> {
    if !font_size.is_finite() || font_size <= 0.0 {
        bail!("Font size must be a positive number, got {}", font_size);
    }
    Ok(())
}

/// Approximate Helvetica advance width of `text` in points.
pub fn text_width(text: &str, font_size: f32) -> f32 {
    let units: f32 = text
        .chars()
        .map(|c| match c {
            '0'..='9' => 556.0,
            ' ' | '.' | ',' | ':' | ';' | '!' | 'I' | 'f' | 't' => 278.0,
            'i' | 'j' | 'l' => 222.0,
            '-' | 'r' | '(' | ')' => 333.0,
            'm' | 'M' => 833.0,
            'w' => 722.0,
            'W' => 944.0,
            'a'..='z' => 556.0,
            'A'..='Z' => 667.0,
            _ => 556.0,
        })
        .sum();
    units * font_size / 1000.0
}

/// Shared objects for stamping many pages of one document.
pub struct Stamper {
    font_id: ObjectId,
    state_id: Option<ObjectId>,
}

impl Stamper {
    /// `opacity` is a fraction in `0.0..=1.0`; `None` draws fully opaque.
    pub fn new(doc: &mut Document, opacity: Option<f32>) -> Self {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let state_id = opacity.map(|alpha| {
            let alpha = alpha.clamp(0.0, 1.0);
            doc.add_object(dictionary! {
                "Type" => "ExtGState",
                "ca" => alpha,
                "CA" => alpha,
            })
        });
        Stamper { font_id, state_id }
    }

    pub fn stamp(&self, doc: &mut Document, page_id: ObjectId, stamps: &[TextStamp]) -> Result<()> {
        add_resource(doc, page_id, b"Font", FONT_RESOURCE, self.font_id.into())?;
        if let Some(state_id) = self.state_id {
            add_resource(doc, page_id, b"ExtGState", STATE_RESOURCE, state_id.into())?;
        }

        let mut operations = Vec::new();
        for stamp in stamps {
            self.push_operations(&mut operations, stamp);
        }
        let overlay = Content { operations }
            .encode()
            .context("Failed to encode overlay content")?;

        append_overlay(doc, page_id, overlay)
    }

    fn push_operations(&self, ops: &mut Vec<Operation>, stamp: &TextStamp) {
        ops.push(Operation::new("q", vec![]));
        if self.state_id.is_some() {
            ops.push(Operation::new("gs", vec![Object::Name(STATE_RESOURCE.into())]));
        }
        ops.push(Operation::new(
            "rg",
            vec![
                stamp.color.r.into(),
                stamp.color.g.into(),
                stamp.color.b.into(),
            ],
        ));
        ops.push(Operation::new(
            "cm",
            vec![
                Object::Integer(1),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(1),
                stamp.origin.0.into(),
                stamp.origin.1.into(),
            ],
        ));
        if stamp.rotation != 0.0 {
            let (sin, cos) = stamp.rotation.to_radians().sin_cos();
            ops.push(Operation::new(
                "cm",
                vec![
                    cos.into(),
                    sin.into(),
                    (-sin).into(),
                    cos.into(),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ));
        }
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(FONT_RESOURCE.into()), stamp.font_size.into()],
        ));
        ops.push(Operation::new("Td", vec![stamp.offset.0.into(), stamp.offset.1.into()]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(
                encode_win_ansi(&stamp.text),
                StringFormat::Literal,
            )],
        ));
        ops.push(Operation::new("ET", vec![]));
        ops.push(Operation::new("Q", vec![]));
    }
}

/// Latin-1 subset of WinAnsiEncoding; anything else becomes `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Wrap the existing content in `q`/`Q` and append `overlay` after it.
fn append_overlay(doc: &mut Document, page_id: ObjectId, overlay: Vec<u8>) -> Result<()> {
    let existing = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(arr)) => arr.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(arr)) => arr.clone(),
        _ => Vec::new(),
    };

    let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let mut closing = b"Q\n".to_vec();
    closing.extend(overlay);
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), closing));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(overlay_id));

    doc.get_dictionary_mut(page_id)?.set("Contents", contents);
    Ok(())
}

/// The page's own resource dictionary. Inherited resources are copied onto
/// the page first so additions do not change what the page can see.
fn page_resources_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary> {
    if !doc.get_dictionary(page_id)?.has(b"Resources") {
        let inherited = inherited_attribute(doc, page_id, b"Resources")
            .cloned()
            .unwrap_or_else(|| Object::Dictionary(Dictionary::new()));
        doc.get_dictionary_mut(page_id)?.set("Resources", inherited);
    }

    let resources_ref = match doc.get_dictionary(page_id)?.get(b"Resources")? {
        Object::Reference(id) => Some(*id),
        _ => None,
    };

    match resources_ref {
        Some(id) => Ok(doc.get_dictionary_mut(id)?),
        None => Ok(doc
            .get_dictionary_mut(page_id)?
            .get_mut(b"Resources")?
            .as_dict_mut()?),
    }
}

/// Register `value` as `/category/name` in the page resources.
fn add_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &[u8],
    name: &str,
    value: Object,
) -> Result<()> {
    let category_ref = match page_resources_mut(doc, page_id)?.get(category) {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };

    let target = match category_ref {
        Some(id) => doc.get_dictionary_mut(id)?,
        None => {
            let resources = page_resources_mut(doc, page_id)?;
            if !matches!(resources.get(category), Ok(Object::Dictionary(_))) {
                resources.set(category.to_vec(), Dictionary::new());
            }
            resources.get_mut(category)?.as_dict_mut()?
        }
    };
    target.set(name.as_bytes().to_vec(), value);
    Ok(())
}
