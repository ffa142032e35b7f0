// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Final stage: write metadata, encrypt with the revision-6 handler, and save
// `<stem>_final.pdf`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use lopdf::{Document, Object, StringFormat, dictionary};
use pressguard_core::Stage;
use pressguard_core::config::{EncryptionConfig, MetadataRecord};
use pressguard_core::error::{PressguardError, Result};
use ring::rand::SystemRandom;
use tracing::{debug, info, instrument};

use crate::integrity::hash_bytes;
use crate::metadata::apply_metadata;
use crate::permissions::Permissions;
use crate::random::random_array;
use crate::standard::{StandardSecurity, authenticate_owner, authenticate_user, decode_permissions};

/// Result of sealing one document.
#[derive(Debug, Clone)]
pub struct SealedDocument {
    pub path: PathBuf,
    pub page_count: usize,
    pub permissions: Permissions,
    /// SHA-256 of the file as written, lowercase hex.
    pub sha256: String,
}

/// Applies the metadata record and the permission-restricted encryption.
pub struct Sealer {
    record: MetadataRecord,
    user_password: String,
    owner_password: String,
    permissions: Permissions,
}

impl Sealer {
    /// Fails with a configuration error when the owner password is empty.
    pub fn new(record: MetadataRecord, encryption: &EncryptionConfig) -> Result<Self> {
        if encryption.owner_password.is_empty() {
            return Err(PressguardError::Config(
                "an owner password is required to seal documents".into(),
            ));
        }
        Ok(Self {
            record,
            user_password: encryption.user_password.clone(),
            owner_password: encryption.owner_password.clone(),
            permissions: Permissions::print_only(),
        })
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    // -- Sealing --------------------------------------------------------------

    /// Seal `doc` in memory. Nothing may touch the document's streams after
    /// this returns, except serialising it.
    pub fn seal_document(&self, doc: &mut Document) -> Result<Permissions> {
        apply_metadata(doc, &self.record, Utc::now())?;
        ensure_file_id(doc)?;
        declare_aes256_extension(doc)?;
        // Streams are compressed first; ciphertext does not compress.
        doc.compress();

        let security = StandardSecurity::new(&self.user_password, &self.owner_password, self.permissions)?;
        let mut encrypted = 0usize;
        for object in doc.objects.values_mut() {
            if is_xref_stream(object) {
                continue;
            }
            encrypt_object(object, &security)?;
            encrypted += 1;
        }

        let encrypt_dict = security.encrypt_dictionary();
        self.verify(&encrypt_dict, security.file_key())?;
        let encrypt_id = doc.add_object(encrypt_dict);
        doc.trailer.set("Encrypt", encrypt_id);

        debug!(objects = encrypted, ?encrypt_id, "Objects encrypted");
        Ok(security.permissions())
    }

    /// Seal `input` into `output_dir/<stem>_final.pdf`.
    #[instrument(skip_all, fields(input = %input.display()))]
    pub fn seal_file(&self, input: &Path, output_dir: &Path, remove_input: bool) -> Result<SealedDocument> {
        if !input.is_file() {
            return Err(PressguardError::io_at(input, io::Error::from(io::ErrorKind::NotFound)));
        }
        let mut doc = Document::load(input).map_err(|err| {
            PressguardError::PdfError(format!("failed to load {}: {}", input.display(), err))
        })?;
        let page_count = doc.get_pages().len();

        let permissions = self.seal_document(&mut doc)?;

        let output = Stage::Final.output_path(input, output_dir)?;
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).map_err(|err| {
            PressguardError::PdfError(format!("failed to serialise {}: {}", output.display(), err))
        })?;
        fs::write(&output, &bytes).map_err(|err| PressguardError::io_at(&output, err))?;
        let sha256 = hash_bytes(&bytes);

        if remove_input {
            fs::remove_file(input).map_err(|err| PressguardError::io_at(input, err))?;
        }

        info!(
            output = %output.display(),
            pages = page_count,
            permissions = ?permissions.granted_names(),
            %sha256,
            "Document sealed"
        );
        Ok(SealedDocument {
            path: output,
            page_count,
            permissions,
            sha256,
        })
    }

    // -- Helpers --------------------------------------------------------------

    /// Both passwords must open the dictionary just produced, and `/Perms`
    /// must agree with `/P`.
    fn verify(&self, encrypt_dict: &lopdf::Dictionary, file_key: &[u8; 32]) -> Result<()> {
        let user_key = authenticate_user(encrypt_dict, &self.user_password)?;
        let owner_key = authenticate_owner(encrypt_dict, &self.owner_password)?;
        if user_key.as_ref() != Some(file_key) || owner_key.as_ref() != Some(file_key) {
            return Err(PressguardError::Encryption(
                "generated password entries do not unlock the file key".into(),
            ));
        }
        let decoded = decode_permissions(encrypt_dict, file_key)?;
        if decoded != self.permissions {
            return Err(PressguardError::Encryption(format!(
                "/Perms decodes to {:?}, expected {:?}",
                decoded, self.permissions
            )));
        }
        Ok(())
    }
}

/// Encrypt every string and stream body reachable inside `object`.
fn encrypt_object(object: &mut Object, security: &StandardSecurity) -> Result<()> {
    match object {
        Object::String(bytes, _) => {
            let encrypted = security.encrypt_bytes(bytes)?;
            *object = Object::String(encrypted, StringFormat::Hexadecimal);
        }
        Object::Array(items) => {
            for item in items {
                encrypt_object(item, security)?;
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                encrypt_object(value, security)?;
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                encrypt_object(value, security)?;
            }
            let encrypted = security.encrypt_bytes(&stream.content)?;
            stream.set_content(encrypted);
            stream.allows_compression = false;
        }
        _ => {}
    }
    Ok(())
}

fn is_xref_stream(object: &Object) -> bool {
    matches!(
        object,
        Object::Stream(stream)
            if stream.dict.get(b"Type").and_then(Object::as_name).is_ok_and(|name| name == b"XRef")
    )
}

/// Set a trailer `/ID` when the document has none.
fn ensure_file_id(doc: &mut Document) -> Result<()> {
    if doc.trailer.has(b"ID") {
        return Ok(());
    }
    let id: [u8; 16] = random_array(&SystemRandom::new())?;
    doc.trailer.set(
        "ID",
        vec![
            Object::String(id.to_vec(), StringFormat::Hexadecimal),
            Object::String(id.to_vec(), StringFormat::Hexadecimal),
        ],
    );
    Ok(())
}

/// AES-256 is declared as Adobe extension level 8 on PDF 1.7.
fn declare_aes256_extension(doc: &mut Document) -> Result<()> {
    doc.version = "1.7".to_string();
    doc.catalog_mut()
        .map_err(|err| PressguardError::Encryption(format!("document has no catalog: {err}")))?
        .set(
            "Extensions",
            dictionary! {
                "ADBE" => dictionary! {
                    "BaseVersion" => "1.7",
                    "ExtensionLevel" => 8,
                },
            },
        );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity::hash_file;
    use lopdf::Stream;
    use lopdf::content::{Content, Operation};

    fn encryption(user: &str, owner: &str) -> EncryptionConfig {
        EncryptionConfig {
            user_password: user.into(),
            owner_password: owner.into(),
        }
    }

    /// Document with `pages` pages, each showing "Page N" in Courier.
    fn text_pdf(path: &Path, pages: usize) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let mut kids = Vec::new();
        for n in 1..=pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(format!("Page {n}"))]),
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
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|window| window == needle)
    }

    #[test]
    fn sealed_file_declares_aes256_and_print_only() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("lecture1_blurred_watermarked_im2pdf.pdf");
        text_pdf(&input, 2);

        let sealer = Sealer::new(MetadataRecord::default(), &encryption("", "owner-secret")).unwrap();
        let sealed = sealer.seal_file(&input, dir.path(), true).unwrap();

        assert_eq!(
            sealed.path,
            dir.path().join("lecture1_blurred_watermarked_im2pdf_final.pdf")
        );
        assert_eq!(sealed.page_count, 2);
        assert_eq!(sealed.permissions, Permissions::print_only());
        assert_eq!(sealed.sha256, hash_file(&sealed.path).unwrap());
        assert!(!input.exists());

        let bytes = fs::read(&sealed.path).unwrap();
        assert!(contains(&bytes, b"/AESV3"));
        assert!(contains(&bytes, b"-1852"));
        assert!(contains(&bytes, b"/Encrypt"));
        // Neither page text nor the XMP packet survives in the clear.
        assert!(!contains(&bytes, b"Page 1"));
        assert!(!contains(&bytes, b"xmpRights"));
    }

    #[test]
    fn seal_document_keeps_pages_and_adds_encrypt_entry() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.pdf");
        text_pdf(&input, 3);
        let mut doc = Document::load(&input).unwrap();

        let sealer = Sealer::new(MetadataRecord::default(), &encryption("reader", "owner")).unwrap();
        let permissions = sealer.seal_document(&mut doc).unwrap();

        assert!(!permissions.contains(Permissions::EXTRACT));
        assert_eq!(doc.get_pages().len(), 3);
        assert_eq!(doc.version, "1.7");
        assert!(doc.trailer.has(b"ID"));

        let encrypt_id = doc.trailer.get(b"Encrypt").and_then(Object::as_reference).unwrap();
        let encrypt = doc.get_dictionary(encrypt_id).unwrap();
        assert!(authenticate_user(encrypt, "reader").unwrap().is_some());
        assert!(authenticate_owner(encrypt, "owner").unwrap().is_some());
        assert!(authenticate_owner(encrypt, "reader").unwrap().is_none());
    }

    #[test]
    fn empty_owner_password_is_a_configuration_error() {
        assert!(matches!(
            Sealer::new(MetadataRecord::default(), &encryption("user", "")),
            Err(PressguardError::Config(_))
        ));
    }

    #[test]
    fn missing_input_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let sealer = Sealer::new(MetadataRecord::default(), &encryption("", "owner")).unwrap();
        let err = sealer
            .seal_file(&dir.path().join("absent.pdf"), dir.path(), false)
            .unwrap_err();
        assert!(err.as_io().is_some());
    }
}
