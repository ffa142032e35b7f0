// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDFium rasterizer — in-process rendering through a dynamically loaded
// libpdfium.

use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbaImage};
use pdfium_render::prelude::*;
use pressguard_core::error::{PressguardError, Result};
use pressguard_core::{PageImage, page_file_name};
use tracing::{debug, info, instrument};

use super::{Rasterizer, prepare_output};

/// Renders pages with PDFium at `dpi / 72` scale.
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
}

impl PdfiumRasterizer {
    /// Bind libpdfium from `library_dir`, then the working directory, then the
    /// system library path.
    #[instrument(skip_all, fields(library_dir = ?library_dir))]
    pub fn bind(library_dir: Option<&Path>) -> Result<Self> {
        let configured = library_dir
            .map(|dir| Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)));
        let bindings = match configured {
            Some(Ok(bindings)) => Ok(bindings),
            _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./")),
        };
        let bindings = bindings
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|err| {
                PressguardError::Rasterization(format!("failed to bind PDFium library: {err:?}"))
            })?;

        info!("PDFium library loaded");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn name(&self) -> &str {
        "pdfium"
    }

    #[instrument(skip_all, fields(pdf = %pdf.display(), dpi))]
    fn rasterize(&self, pdf: &Path, dpi: u32, output_dir: &Path) -> Result<Vec<PageImage>> {
        prepare_output(pdf, dpi, output_dir)?;

        let document = self.pdfium.load_pdf_from_file(pdf, None).map_err(|err| {
            PressguardError::Rasterization(format!("PDFium cannot open {}: {err:?}", pdf.display()))
        })?;

        let scale = dpi as f32 / 72.0;
        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
        info!(pages = document.pages().len(), scale, "Rasterizing with PDFium");

        let mut images = Vec::new();
        for (index, page) in document.pages().iter().enumerate() {
            let bitmap = page.render_with_config(&render_config).map_err(|err| {
                PressguardError::Rasterization(format!("page {index} failed to render: {err:?}"))
            })?;

            let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
            let rgba = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes()).ok_or_else(|| {
                PressguardError::Rasterization(format!(
                    "page {index} bitmap does not match its {width}x{height} size"
                ))
            })?;
            let rgb = DynamicImage::ImageRgba8(rgba).into_rgb8();

            let path = output_dir.join(page_file_name(index, "png"));
            rgb.save_with_format(&path, ImageFormat::Png).map_err(|err| {
                PressguardError::ImageError(format!("failed to write {}: {}", path.display(), err))
            })?;

            debug!(index, width, height, "Page rendered");
            images.push(PageImage { index, path });
        }

        Ok(images)
    }
}
