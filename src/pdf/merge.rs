use anyhow::{bail, Context, Result};
use lopdf::{Document, Object, ObjectId};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::document::inherited_attribute;

/// Attributes a page may pick up from its page tree ancestors.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Expand directories to the PDF files beneath them, sorted by path. Plain
/// file arguments are kept as given and in order.
pub fn collect_inputs<P: AsRef<Path>>(inputs: &[P]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if input.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(input).follow_links(true) {
                let entry = entry.with_context(|| {
                    format!("Failed to read directory: {}", input.display())
                })?;
                let is_pdf = entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
                if entry.file_type().is_file() && is_pdf {
                    found.push(entry.into_path());
                }
            }
            found.sort();
            tracing::debug!(
                dir = %input.display(),
                files = found.len(),
                "expanded merge directory"
            );
            files.extend(found);
        } else {
            files.push(input.to_path_buf());
        }
    }

    if files.is_empty() {
        bail!("No input PDF files specified");
    }
    Ok(files)
}

/// Append every page of `documents` to the first one, in order.
pub fn merge_documents(documents: Vec<Document>) -> Result<Document> {
    let mut documents = documents.into_iter();
    let Some(mut merged) = documents.next() else {
        bail!("Nothing to merge");
    };
    let root_id = pages_root(&merged)?;

    for mut doc in documents {
        doc.renumber_objects_with(merged.max_id + 1);
        let page_ids: Vec<ObjectId> = doc.page_iter().collect();
        for page_id in &page_ids {
            pin_inherited_attributes(&mut doc, *page_id)?;
        }

        merged.max_id = merged.max_id.max(doc.max_id);
        merged.objects.extend(doc.objects);

        for page_id in &page_ids {
            merged
                .get_dictionary_mut(*page_id)?
                .set("Parent", Object::Reference(root_id));
        }

        let root = merged.get_dictionary_mut(root_id)?;
        let kids = root
            .get_mut(b"Kids")
            .and_then(Object::as_array_mut)
            .context("Page tree root has no Kids array")?;
        kids.extend(page_ids.iter().map(|id| Object::Reference(*id)));
        let count = root.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
        root.set("Count", count + page_ids.len() as i64);
    }

    // The appended documents' catalogs and page trees are now unreachable.
    merged.prune_objects();
    Ok(merged)
}

fn pages_root(doc: &Document) -> Result<ObjectId> {
    doc.catalog()
        .context("Document has no catalog")?
        .get(b"Pages")
        .and_then(Object::as_reference)
        .context("Catalog has no page tree")
}

/// Copy inherited attributes onto the page itself so it keeps them once it
/// moves to another page tree.
fn pin_inherited_attributes(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    for key in INHERITABLE {
        if doc.get_dictionary(page_id)?.has(key) {
            continue;
        }
        if let Some(value) = inherited_attribute(doc, page_id, key).cloned() {
            doc.get_dictionary_mut(page_id)?.set(key.to_vec(), value);
        }
    }
    Ok(())
}
