// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pressguard pipeline.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PressguardError, Result};

/// ISO A4 short and long edge in millimetres.
pub const A4_MM: (f32, f32) = (210.0, 297.0);

/// Page orientation of the recomposed A4 pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// A4 dimensions in millimetres (width, height).
    pub fn page_size_mm(&self) -> (f32, f32) {
        match self {
            Self::Portrait => A4_MM,
            Self::Landscape => (A4_MM.1, A4_MM.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
        }
    }

    /// Conventional watermark file name, e.g. `landscape_A4.pdf`.
    pub fn watermark_file_name(&self) -> String {
        format!("{}_A4.pdf", self.as_str())
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = PressguardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "portrait" => Ok(Self::Portrait),
            "landscape" => Ok(Self::Landscape),
            other => Err(PressguardError::Config(format!(
                "unknown orientation '{other}' (expected portrait or landscape)"
            ))),
        }
    }
}

/// Gaussian kernel size in pixels. Both sides must be odd and positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelSize {
    pub width: u32,
    pub height: u32,
}

impl KernelSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    pub fn validate(&self) -> Result<()> {
        for (axis, side) in [("width", self.width), ("height", self.height)] {
            if side == 0 || side % 2 == 0 {
                return Err(PressguardError::Config(format!(
                    "kernel {axis} must be odd and positive, got {side}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for KernelSize {
    fn default() -> Self {
        Self::square(5)
    }
}

impl fmt::Display for KernelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Accepts `5`, `5x5` or `5,3`.
impl FromStr for KernelSize {
    type Err = PressguardError;

    fn from_str(s: &str) -> Result<Self> {
        let parse = |part: &str| {
            part.trim().parse::<u32>().map_err(|err| {
                PressguardError::Config(format!("invalid kernel size '{s}': {err}"))
            })
        };
        let kernel = match s.split_once(['x', 'X', ',']) {
            Some((w, h)) => Self::new(parse(w)?, parse(h)?),
            None => Self::square(parse(s)?),
        };
        kernel.validate()?;
        Ok(kernel)
    }
}

/// Rasterization engine used for both raster passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterBackend {
    /// In-process rendering through libpdfium.
    #[default]
    Pdfium,
    /// `pdftoppm` from poppler-utils, one subprocess per page.
    Poppler,
}

impl fmt::Display for RasterBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pdfium => "pdfium",
            Self::Poppler => "poppler",
        })
    }
}

impl FromStr for RasterBackend {
    type Err = PressguardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pdfium" => Ok(Self::Pdfium),
            "poppler" | "pdftoppm" => Ok(Self::Poppler),
            other => Err(PressguardError::Config(format!(
                "unknown rasterizer '{other}' (expected pdfium or poppler)"
            ))),
        }
    }
}

/// Pipeline stage whose output carries a file name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Blurred,
    Watermarked,
    Im2Pdf,
    Final,
}

impl Stage {
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Blurred => "_blurred",
            Self::Watermarked => "_watermarked",
            Self::Im2Pdf => "_im2pdf",
            Self::Final => "_final",
        }
    }

    /// `<output_dir>/<stem of input><suffix>.pdf`
    pub fn output_path(&self, input: &Path, output_dir: &Path) -> Result<PathBuf> {
        let stem = document_stem(input)?;
        Ok(output_dir.join(format!("{stem}{}.pdf", self.suffix())))
    }
}

/// File stem of a document path, i.e. the name minus its final extension.
pub fn document_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| {
            PressguardError::Config(format!(
                "cannot derive a document name from {}",
                path.display()
            ))
        })
}

/// Whether `path` names a PDF by extension (case-insensitive).
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Zero-padded page file name so lexicographic order equals page order.
pub fn page_file_name(index: usize, extension: &str) -> String {
    format!("page_{index:05}.{extension}")
}

/// A rasterized page on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// Zero-based page index within the source document.
    pub index: usize,
    pub path: PathBuf,
}

/// A single-page PDF produced from a [`PageImage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePdf {
    pub index: usize,
    pub path: PathBuf,
}
