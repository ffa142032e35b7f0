// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Watermark compositor — stamp the first page of a watermark PDF over every
// page of a document as a form XObject.

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use pressguard_core::Stage;
use pressguard_core::error::{PressguardError, Result};
use tracing::{debug, info, instrument};

use super::objects::{
    ObjectImporter, load_document, materialized_page, page_box, resolve_dictionary, save_document,
};

/// Prefix for the resource name the watermark form is registered under.
const FORM_NAME_PREFIX: &str = "PgWm";

/// A watermark page ready to be stamped onto other documents.
///
/// The page is kept in its own document; each target gets a fresh copy of the
/// form and of the resources it needs.
pub struct Watermarker {
    source: Document,
    /// Decoded content stream of the watermark page.
    content: Vec<u8>,
    /// Page resources, inherited ones included.
    resources: Object,
    bbox: [f32; 4],
    source_path: PathBuf,
}

impl Watermarker {
    // -- Construction ---------------------------------------------------------

    /// Load page 1 of `path` as the watermark template.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = load_document(path)?;

        let page_id = *source.get_pages().get(&1).ok_or_else(|| {
            PressguardError::Watermark(format!("{} has no pages", path.display()))
        })?;

        let content = source.get_page_content(page_id).map_err(|err| {
            PressguardError::Watermark(format!(
                "cannot read watermark content in {}: {}",
                path.display(),
                err
            ))
        })?;
        let page = materialized_page(&source, page_id)?;
        let resources = page
            .get(b"Resources")
            .cloned()
            .unwrap_or_else(|_| Object::Dictionary(Dictionary::new()));
        let bbox = page_box(&source, page_id, b"MediaBox").ok_or_else(|| {
            PressguardError::Watermark(format!("watermark page in {} has no MediaBox", path.display()))
        })?;

        info!(content_bytes = content.len(), ?bbox, "Watermark loaded");
        Ok(Self {
            source,
            content,
            resources,
            bbox,
            source_path: path.to_path_buf(),
        })
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    // -- Application ----------------------------------------------------------

    /// Stamp every page of `doc`. Returns the number of pages stamped.
    ///
    /// Existing page content is wrapped in `q … Q` so its graphics state
    /// cannot leak into the watermark; page boxes and order are untouched.
    pub fn apply(&self, doc: &mut Document) -> Result<usize> {
        let form_id = self.import_form(doc);
        let save_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));

        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        for &page_id in &pages {
            let name = self.register_form(doc, page_id, form_id)?;
            let stamp = format!("Q\nq /{name} Do Q\n").into_bytes();
            let stamp_id = doc.add_object(Stream::new(dictionary! {}, stamp));
            wrap_contents(doc, page_id, save_id, stamp_id)?;
            debug!(?page_id, %name, "Page watermarked");
        }
        Ok(pages.len())
    }

    /// Watermark `input` into `output_dir/<stem>_watermarked.pdf`.
    #[instrument(skip_all, fields(input = %input.display()))]
    pub fn apply_file(
        &self,
        input: &Path,
        output_dir: &Path,
        remove_input: bool,
    ) -> Result<PathBuf> {
        let mut doc = load_document(input)?;
        let stamped = self.apply(&mut doc)?;

        let output = Stage::Watermarked.output_path(input, output_dir)?;
        save_document(&mut doc, &output)?;
        if remove_input {
            fs::remove_file(input).map_err(|err| PressguardError::io_at(input, err))?;
        }

        info!(pages = stamped, output = %output.display(), "Watermark applied");
        Ok(output)
    }

    // -- Helpers --------------------------------------------------------------

    /// Copy the watermark page into `doc` as a form XObject.
    fn import_form(&self, doc: &mut Document) -> ObjectId {
        let mut importer = ObjectImporter::new(&self.source);
        let resources = importer.import_object(doc, &self.resources);
        let bbox: Vec<Object> = self.bbox.iter().map(|v| Object::Real(*v)).collect();
        let form = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "FormType" => 1,
                "BBox" => bbox,
                "Resources" => resources,
            },
            self.content.clone(),
        );
        doc.add_object(form)
    }

    /// Add the form to the page's `/XObject` resources under an unused name.
    ///
    /// The page gets its own copy of the resource dictionaries, so pages that
    /// shared resources never see each other's names.
    fn register_form(
        &self,
        doc: &mut Document,
        page_id: ObjectId,
        form_id: ObjectId,
    ) -> Result<String> {
        let mut resources = materialized_page(doc, page_id)?
            .get(b"Resources")
            .ok()
            .and_then(|object| resolve_dictionary(doc, object))
            .cloned()
            .unwrap_or_default();
        let mut xobjects = resources
            .get(b"XObject")
            .ok()
            .and_then(|object| resolve_dictionary(doc, object))
            .cloned()
            .unwrap_or_default();

        let name = (1..)
            .map(|n| format!("{FORM_NAME_PREFIX}{n}"))
            .find(|candidate| !xobjects.has(candidate.as_bytes()))
            .unwrap_or_else(|| FORM_NAME_PREFIX.to_string());
        xobjects.set(name.clone(), form_id);
        resources.set("XObject", xobjects);

        let page = page_dictionary_mut(doc, page_id)?;
        page.set("Resources", resources);
        Ok(name)
    }
}

/// Replace `/Contents` with `[save, ...original..., stamp]`.
fn wrap_contents(
    doc: &mut Document,
    page_id: ObjectId,
    save_id: ObjectId,
    stamp_id: ObjectId,
) -> Result<()> {
    let existing = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Contents").ok());
    let original: Vec<Object> = match existing {
        Some(Object::Reference(id)) => match doc.get_object(*id) {
            // An indirect array of streams.
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Some(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    let mut contents = Vec::with_capacity(original.len() + 2);
    contents.push(Object::Reference(save_id));
    contents.extend(original);
    contents.push(Object::Reference(stamp_id));

    page_dictionary_mut(doc, page_id)?.set("Contents", contents);
    Ok(())
}

fn page_dictionary_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary> {
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|err| {
            PressguardError::Watermark(format!("page {:?} is not a dictionary: {}", page_id, err))
        })
}
