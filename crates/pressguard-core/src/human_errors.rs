// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-language error messages for the command line.
//
// Every technical error is mapped to a short headline and an actionable
// suggestion. The severity decides the exit code and how loudly it is shown.

use std::io::ErrorKind;

use crate::error::PressguardError;

/// Severity of an error from the operator's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fix the settings or command line and run again.
    Configuration,
    /// Something in the environment needs attention (missing file, full disk).
    ActionRequired,
    /// The input itself cannot be processed.
    Permanent,
}

/// A human-readable error with a plain message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    pub message: String,
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `PressguardError` into something an instructor can act on.
pub fn humanize_error(err: &PressguardError) -> HumanError {
    match err {
        // -- Document errors --
        PressguardError::PdfError(_) => HumanError {
            message: "One of the PDF files could not be read or written.".into(),
            suggestion: "The file may be damaged or already encrypted. Open it in a PDF viewer to check it, or re-export it.".into(),
            severity: Severity::Permanent,
        },

        PressguardError::ImageError(_) => HumanError {
            message: "A page image could not be processed.".into(),
            suggestion: "Check that the scratch folder is writable and has free space, then run again.".into(),
            severity: Severity::ActionRequired,
        },

        PressguardError::Rasterization(detail) => humanize_raster_error(detail),

        PressguardError::Watermark(_) => HumanError {
            message: "The watermark could not be applied.".into(),
            suggestion: "Make sure the watermark file is a one-page PDF matching the chosen orientation.".into(),
            severity: Severity::Permanent,
        },

        PressguardError::EmptyMerge(folder) => HumanError {
            message: "There were no pages to put back together.".into(),
            suggestion: format!("The document produced no page images in {folder}. Check that it has at least one page."),
            severity: Severity::Permanent,
        },

        // -- Security errors --
        PressguardError::Encryption(_) => HumanError {
            message: "The document could not be encrypted.".into(),
            suggestion: "Check the passwords in your settings and try again. Passwords longer than 127 bytes are cut short.".into(),
            severity: Severity::Permanent,
        },

        PressguardError::Metadata(_) => HumanError {
            message: "The document details (title, author, rights) could not be written.".into(),
            suggestion: "Check the metadata section of your configuration for unusual characters.".into(),
            severity: Severity::Permanent,
        },

        // -- Filesystem lifecycle --
        PressguardError::ArchiveCollision { document, folder, .. } => HumanError {
            message: format!("{document} was sealed but could not be moved to {folder}."),
            suggestion: "The processed folder already holds too many copies with the same name. Tidy it up, then move the original by hand.".into(),
            severity: Severity::ActionRequired,
        },

        PressguardError::Io(io_err) | PressguardError::IoPath { source: io_err, .. } => {
            humanize_io_error(io_err)
        }

        // -- Configuration --
        PressguardError::Config(detail) => HumanError {
            message: "The settings are not valid.".into(),
            suggestion: format!("{detail}. Fix the configuration file or command line and run again."),
            severity: Severity::Configuration,
        },

        PressguardError::Serialization(_) => HumanError {
            message: "A settings or report file is not valid JSON.".into(),
            suggestion: "Check the file with a JSON validator, or print the defaults with --print-config and start from those.".into(),
            severity: Severity::Configuration,
        },
    }
}

fn humanize_io_error(io_err: &std::io::Error) -> HumanError {
    match io_err.kind() {
        ErrorKind::NotFound => HumanError {
            message: "A file or folder couldn't be found.".into(),
            suggestion: "Check the input, output, and watermark paths in your settings.".into(),
            severity: Severity::ActionRequired,
        },
        ErrorKind::PermissionDenied => HumanError {
            message: "Pressguard isn't allowed to read or write one of the folders.".into(),
            suggestion: "Check the permissions of the input, output, tmp, and processed folders.".into(),
            severity: Severity::ActionRequired,
        },
        _ => HumanError {
            message: "There was a problem reading or writing a file.".into(),
            suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
            severity: Severity::ActionRequired,
        },
    }
}

/// Rasterizer failures are mostly about a missing engine.
fn humanize_raster_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("pdfium") && (lower.contains("load") || lower.contains("bind")) {
        HumanError {
            message: "The PDFium library could not be loaded.".into(),
            suggestion: "Download libpdfium for your platform and point --pdfium-path at its folder, or use --rasterizer poppler.".into(),
            severity: Severity::Configuration,
        }
    } else if lower.contains("pdftoppm") && lower.contains("not found") {
        HumanError {
            message: "The pdftoppm program is not installed.".into(),
            suggestion: "Install poppler-utils, or use --rasterizer pdfium.".into(),
            severity: Severity::Configuration,
        }
    } else {
        HumanError {
            message: "A page could not be turned into an image.".into(),
            suggestion: format!("The PDF may use features the renderer cannot draw. (Detail: {detail})"),
            severity: Severity::Permanent,
        }
    }
}
