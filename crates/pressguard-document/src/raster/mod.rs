// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rasterization — turn every page of a PDF into a PNG in a scratch folder.
//
// Two engines sit behind the `Rasterizer` trait: libpdfium in-process and
// poppler's `pdftoppm` as a subprocess. The pipeline only sees the trait.

#[cfg(feature = "pdfium")]
pub mod pdfium;
pub mod poppler;

use std::fs;
use std::path::Path;

use lopdf::Document;
use pressguard_core::config::RasterizerConfig;
use pressguard_core::error::{PressguardError, Result};
use pressguard_core::{PageImage, RasterBackend};

/// Renders PDF pages to raster images on disk.
pub trait Rasterizer {
    /// Short engine name for logs and reports.
    fn name(&self) -> &str;

    /// Write one RGB PNG per page of `pdf` into `output_dir`, named
    /// `page_{index:05}.png`, and return them in page order.
    fn rasterize(&self, pdf: &Path, dpi: u32, output_dir: &Path) -> Result<Vec<PageImage>>;
}

impl<R: Rasterizer + ?Sized> Rasterizer for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn rasterize(&self, pdf: &Path, dpi: u32, output_dir: &Path) -> Result<Vec<PageImage>> {
        (**self).rasterize(pdf, dpi, output_dir)
    }
}

/// Construct the engine selected in the configuration.
pub fn build_rasterizer(config: &RasterizerConfig) -> Result<Box<dyn Rasterizer>> {
    match config.backend {
        #[cfg(feature = "pdfium")]
        RasterBackend::Pdfium => Ok(Box::new(pdfium::PdfiumRasterizer::bind(
            config.pdfium_path.as_deref(),
        )?)),
        #[cfg(not(feature = "pdfium"))]
        RasterBackend::Pdfium => Err(PressguardError::Config(
            "this build has no PDFium support; use the poppler rasterizer".into(),
        )),
        RasterBackend::Poppler => Ok(Box::new(match &config.pdftoppm {
            Some(program) => poppler::PopplerRasterizer::with_program(program),
            None => poppler::PopplerRasterizer::new(),
        })),
    }
}

/// Shared argument checks for every engine.
pub(crate) fn prepare_output(pdf: &Path, dpi: u32, output_dir: &Path) -> Result<()> {
    if dpi == 0 {
        return Err(PressguardError::Config("dpi must be greater than zero".into()));
    }
    if !pdf.is_file() {
        return Err(PressguardError::io_at(
            pdf,
            std::io::Error::from(std::io::ErrorKind::NotFound),
        ));
    }
    fs::create_dir_all(output_dir).map_err(|err| PressguardError::io_at(output_dir, err))
}

/// Page count as seen by lopdf.
pub(crate) fn page_count(pdf: &Path) -> Result<usize> {
    let document = Document::load(pdf).map_err(|err| {
        PressguardError::PdfError(format!("failed to open {}: {}", pdf.display(), err))
    })?;
    Ok(document.get_pages().len())
}
