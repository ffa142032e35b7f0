// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pressguard.

use std::path::Path;

use thiserror::Error;

/// Top-level error type for all Pressguard operations.
///
/// Every variant is fatal for the document being processed; the pipeline
/// never retries.
#[derive(Debug, Error)]
pub enum PressguardError {
    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("rasterization failed: {0}")]
    Rasterization(String),

    #[error("watermarking failed: {0}")]
    Watermark(String),

    #[error("nothing to merge: no page documents found in {0}")]
    EmptyMerge(String),

    // -- Security errors --
    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("metadata could not be written: {0}")]
    Metadata(String),

    // -- Filesystem lifecycle --
    #[error("cannot archive {document}: {attempts} candidate names in {folder} are already taken")]
    ArchiveCollision {
        document: String,
        folder: String,
        attempts: u32,
    },

    #[error("{path}: {source}")]
    IoPath {
        path: String,
        source: std::io::Error,
    },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PressguardError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io_at(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::IoPath {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Underlying I/O error, whether or not it carries a path.
    pub fn as_io(&self) -> Option<&std::io::Error> {
        match self {
            Self::Io(err) | Self::IoPath { source: err, .. } => Some(err),
            _ => None,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PressguardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_at_keeps_path_and_kind() {
        let err = PressguardError::io_at(
            "sample_input/lecture1.pdf",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err.to_string().starts_with("sample_input/lecture1.pdf"));
        assert_eq!(
            err.as_io().map(std::io::Error::kind),
            Some(std::io::ErrorKind::NotFound)
        );
    }

    #[test]
    fn archive_collision_message_names_folder() {
        let err = PressguardError::ArchiveCollision {
            document: "lecture1.pdf".into(),
            folder: "processed".into(),
            attempts: 3,
        };
        let text = err.to_string();
        assert!(text.contains("lecture1.pdf"));
        assert!(text.contains("processed"));
        assert!(text.contains('3'));
    }
}
