// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open and inspect existing PDF documents, and concatenate page
// documents into one file, using the `lopdf` crate.

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::{Document, Object};
use pressguard_core::error::{PressguardError, Result};
use pressguard_core::has_pdf_extension;
use tracing::{debug, info, instrument};

use super::objects::{
    ObjectImporter, empty_document, finish_page_tree, load_document, page_box, save_document,
};

/// Reads existing PDF files and merges page documents.
///
/// Wraps `lopdf::Document` for inspection; merging works on paths so callers
/// never hold more than one source document in memory at a time.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let document = load_document(path_ref)?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.display().to_string()),
        })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            PressguardError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// Borrow the underlying document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Width and height in points of a page (1-indexed), from its MediaBox.
    pub fn page_size_pt(&self, page_number: u32) -> Result<(f32, f32)> {
        let pages = self.document.get_pages();
        let page_id = *pages.get(&page_number).ok_or_else(|| {
            PressguardError::PdfError(format!(
                "page {} not found (document has {} pages)",
                page_number,
                pages.len()
            ))
        })?;
        let [llx, lly, urx, ury] = page_box(&self.document, page_id, b"MediaBox")
            .ok_or_else(|| PressguardError::PdfError(format!("page {page_number} has no MediaBox")))?;
        Ok(((urx - llx).abs(), (ury - lly).abs()))
    }

    // -- Merging --------------------------------------------------------------

    /// Concatenate every page of `inputs`, in the given order, into `output`.
    ///
    /// Inherited page attributes are made explicit on each copied page, so
    /// pages look the same outside their original page tree.
    #[instrument(skip_all, fields(inputs = inputs.len(), output = %output.display()))]
    pub fn merge_files(inputs: &[PathBuf], output: &Path) -> Result<usize> {
        let Some(first) = inputs.first() else {
            let folder = output
                .parent()
                .map(|dir| dir.display().to_string())
                .unwrap_or_default();
            return Err(PressguardError::EmptyMerge(folder));
        };
        debug!(first = %first.display(), "Merging page documents");

        let (mut merged, pages_id) = empty_document();
        let mut kids = Vec::new();

        for input in inputs {
            let source = load_document(input)?;
            let mut importer = ObjectImporter::new(&source);
            for (_, page_id) in source.get_pages() {
                let new_id = importer.import_page(&mut merged, page_id)?;
                if let Ok(page) = merged.get_object_mut(new_id).and_then(Object::as_dict_mut) {
                    page.set("Parent", pages_id);
                }
                kids.push(new_id);
            }
        }

        let page_count = kids.len();
        finish_page_tree(&mut merged, pages_id, kids);
        save_document(&mut merged, output)?;

        info!(pages = page_count, "Merge complete");
        Ok(page_count)
    }

    /// Merge every `*.pdf` in `folder`, in file name order, into `output`.
    ///
    /// The inputs are deleted only after `output` has been written.
    #[instrument(skip_all, fields(folder = %folder.display()))]
    pub fn merge_folder(folder: &Path, output: &Path, remove_inputs: bool) -> Result<usize> {
        let inputs = list_pdfs(folder)?;
        if inputs.is_empty() {
            return Err(PressguardError::EmptyMerge(folder.display().to_string()));
        }

        let pages = Self::merge_files(&inputs, output)?;

        if remove_inputs {
            for input in &inputs {
                fs::remove_file(input).map_err(|err| PressguardError::io_at(input, err))?;
            }
            debug!(removed = inputs.len(), "Consumed page documents removed");
        }
        Ok(pages)
    }
}

/// `*.pdf` files directly inside `folder`, sorted by file name.
pub fn list_pdfs(folder: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(folder).map_err(|err| PressguardError::io_at(folder, err))?;
    let mut pdfs = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| PressguardError::io_at(folder, err))?.path();
        if path.is_file() && has_pdf_extension(&path) {
            pdfs.push(path);
        }
    }
    pdfs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(pdfs)
}
