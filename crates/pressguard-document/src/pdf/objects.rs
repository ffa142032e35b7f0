// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// lopdf object-graph helpers shared by the merger and the watermarker.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use pressguard_core::error::{PressguardError, Result};
use tracing::warn;

/// Page attributes a page may inherit from its ancestors in the page tree.
pub(crate) const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"Resources", b"CropBox", b"Rotate"];

/// Guard against cyclic or absurdly deep page trees.
const MAX_TREE_DEPTH: usize = 64;

/// Copies objects from one document into another, following references.
///
/// Each source object is copied at most once per importer, so shared
/// resources (fonts, images) stay shared and reference cycles terminate.
/// `/Parent` entries are dropped; callers re-link pages themselves.
pub(crate) struct ObjectImporter<'a> {
    source: &'a Document,
    memo: BTreeMap<ObjectId, ObjectId>,
}

impl<'a> ObjectImporter<'a> {
    pub(crate) fn new(source: &'a Document) -> Self {
        Self {
            source,
            memo: BTreeMap::new(),
        }
    }

    /// Copy a page dictionary, with its inherited attributes made explicit,
    /// and return its id in `target`. The caller sets `/Parent`.
    pub(crate) fn import_page(&mut self, target: &mut Document, page_id: ObjectId) -> Result<ObjectId> {
        let page = materialized_page(self.source, page_id)?;
        // Reserve the id first so annotations pointing back at the page resolve to it.
        let new_id = target.new_object_id();
        self.memo.insert(page_id, new_id);
        let copied = self.import_dictionary(target, &page);
        target.objects.insert(new_id, Object::Dictionary(copied));
        Ok(new_id)
    }

    /// Deep-copy a direct object into `target`.
    pub(crate) fn import_object(&mut self, target: &mut Document, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.import_reference(target, *id),
            Object::Dictionary(dict) => Object::Dictionary(self.import_dictionary(target, dict)),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.import_object(target, item))
                    .collect(),
            ),
            Object::Stream(stream) => {
                let dict = self.import_dictionary(target, &stream.dict);
                let mut copy = Stream::new(dict, stream.content.clone());
                copy.allows_compression = stream.allows_compression;
                Object::Stream(copy)
            }
            other => other.clone(),
        }
    }

    fn import_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            if key == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.import_object(target, value));
        }
        copy
    }

    fn import_reference(&mut self, target: &mut Document, id: ObjectId) -> Object {
        if let Some(&new_id) = self.memo.get(&id) {
            return Object::Reference(new_id);
        }
        match self.source.get_object(id) {
            Ok(object) => {
                let new_id = target.new_object_id();
                self.memo.insert(id, new_id);
                let copied = self.import_object(target, object);
                target.objects.insert(new_id, copied);
                Object::Reference(new_id)
            }
            Err(err) => {
                warn!(?id, %err, "Cannot resolve reference, using Null");
                Object::Null
            }
        }
    }
}

/// Look up `key` on the page or, failing that, on its nearest ancestor.
pub(crate) fn inherited_attribute<'d>(
    doc: &'d Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'d Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Clone of the page dictionary with every inheritable attribute set on it.
pub(crate) fn materialized_page(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut page = doc
        .get_dictionary(page_id)
        .map_err(|err| {
            PressguardError::PdfError(format!("cannot read page object {:?}: {}", page_id, err))
        })?
        .clone();

    for key in INHERITABLE_KEYS {
        if !page.has(key)
            && let Some(value) = inherited_attribute(doc, page_id, key)
        {
            page.set(key.to_vec(), value.clone());
        }
    }
    Ok(page)
}

/// Follow a reference (if any) to a dictionary.
pub(crate) fn resolve_dictionary<'d>(doc: &'d Document, object: &'d Object) -> Option<&'d Dictionary> {
    match object {
        Object::Dictionary(dict) => Some(dict),
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        _ => None,
    }
}

/// Page box as `[llx, lly, urx, ury]`, resolving inheritance and references.
pub(crate) fn page_box(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<[f32; 4]> {
    let value = inherited_attribute(doc, page_id, key)?;
    let array = match value {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_array().ok()?,
        other => other.as_array().ok()?,
    };
    if array.len() != 4 {
        return None;
    }
    let mut rect = [0.0; 4];
    for (slot, number) in rect.iter_mut().zip(array) {
        *slot = number.as_float().ok()?;
    }
    Some(rect)
}

/// Fresh document with an empty page tree. Returns the document and the id
/// reserved for its `/Pages` node, which `finish_page_tree` fills in.
pub(crate) fn empty_document() -> (Document, ObjectId) {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    (doc, pages_id)
}

/// Write the `/Pages` node and catalog for `kids`.
pub(crate) fn finish_page_tree(doc: &mut Document, pages_id: ObjectId, kids: Vec<ObjectId>) {
    let count = kids.len() as i64;
    let kids: Vec<Object> = kids.into_iter().map(Object::Reference).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
}

/// Compress and write a document, surfacing I/O errors with the path.
pub(crate) fn save_document(doc: &mut Document, path: &Path) -> Result<()> {
    doc.compress();
    let mut output = Vec::new();
    doc.save_to(&mut output).map_err(|err| {
        PressguardError::PdfError(format!("failed to serialise {}: {}", path.display(), err))
    })?;
    fs::write(path, &output).map_err(|err| PressguardError::io_at(path, err))
}

/// Load a document from disk, mapping errors the way every stage reports them.
pub(crate) fn load_document(path: &Path) -> Result<Document> {
    if !path.is_file() {
        return Err(PressguardError::io_at(
            path,
            std::io::Error::from(std::io::ErrorKind::NotFound),
        ));
    }
    Document::load(path).map_err(|err| {
        PressguardError::PdfError(format!("failed to open {}: {}", path.display(), err))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};

    /// Two pages whose MediaBox and Resources live on the /Pages node.
    fn inherited_tree() -> (Document, Vec<ObjectId>) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let mut kids = Vec::new();
        for _ in 0..2 {
            let content = Content {
                operations: vec![Operation::new("BT", vec![]), Operation::new("ET", vec![])],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            kids.push(doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            }));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
                "Count" => 2,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        (doc, kids)
    }

    #[test]
    fn inherited_media_box_is_found() {
        let (doc, kids) = inherited_tree();
        assert_eq!(page_box(&doc, kids[0], b"MediaBox"), Some([0.0, 0.0, 595.0, 842.0]));
        assert!(inherited_attribute(&doc, kids[0], b"CropBox").is_none());
    }

    #[test]
    fn materialized_page_carries_resources() {
        let (doc, kids) = inherited_tree();
        let page = materialized_page(&doc, kids[1]).unwrap();
        assert!(page.has(b"MediaBox"));
        assert!(page.has(b"Resources"));
        assert!(!page.has(b"Rotate"));
    }

    #[test]
    fn shared_objects_are_imported_once() {
        let (source, kids) = inherited_tree();
        let (mut target, pages_id) = empty_document();
        let mut importer = ObjectImporter::new(&source);
        let first = importer.import_page(&mut target, kids[0]).unwrap();
        let second = importer.import_page(&mut target, kids[1]).unwrap();
        finish_page_tree(&mut target, pages_id, vec![first, second]);

        let fonts: Vec<_> = target
            .objects
            .values()
            .filter(|object| {
                object
                    .as_dict()
                    .and_then(|dict| dict.get(b"Type"))
                    .and_then(Object::as_name)
                    .is_ok_and(|name| name == b"Font")
            })
            .collect();
        assert_eq!(fonts.len(), 1);
        assert_eq!(target.get_pages().len(), 2);
        assert!(!target.get_dictionary(first).unwrap().has(b"Parent"));
    }
}
