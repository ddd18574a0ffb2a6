//! In-memory PDFs for tests.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::path::{Path, PathBuf};

/// A document whose page N shows the text "Page N". MediaBox and font
/// resources live on the page tree root so pages inherit them.
pub fn sample_document(pages: u32) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for i in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
                ),
                Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("Page {}", i).into_bytes(),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// The page tree node every page of [`sample_document`] hangs from.
pub fn page_tree_id(doc: &Document) -> ObjectId {
    let first = doc.get_dictionary(doc.get_pages()[&1]).unwrap();
    first.get(b"Parent").and_then(Object::as_reference).unwrap()
}

/// Give `page` its own resources holding a 1x1 image XObject `name`.
pub fn add_image(doc: &mut Document, page: u32, name: &str, filter: &str, data: &[u8]) {
    let image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(1),
            "Height" => Object::Integer(1),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => Object::Integer(8),
            "Filter" => Object::Name(filter.as_bytes().to_vec()),
        },
        data.to_vec(),
    );
    let image_id = doc.add_object(image);
    let xobjects = dictionary! { name => image_id };

    let page_id = doc.get_pages()[&page];
    let page_dict = doc.get_dictionary_mut(page_id).unwrap();
    page_dict.set("Resources", dictionary! { "XObject" => xobjects });
}

pub fn write_pdf(dir: &Path, name: &str, pages: u32) -> PathBuf {
    let path = dir.join(name);
    sample_document(pages).save(&path).unwrap();
    path
}

/// Every string shown with `Tj` on a page, in content order.
pub fn page_strings(doc: &Document, page: u32) -> Vec<String> {
    let page_id = doc.get_pages()[&page];
    let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
    content
        .operations
        .iter()
        .filter(|op| op.operator == "Tj")
        .filter_map(|op| match op.operands.first() {
            Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        })
        .collect()
}

/// The original "Page N" label of each page, in page order.
pub fn page_labels(doc: &Document) -> Vec<String> {
    (1..=doc.get_pages().len() as u32)
        .map(|page| page_strings(doc, page).remove(0))
        .collect()
}
