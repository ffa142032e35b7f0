// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pressguard-document — Page-level document transforms for Pressguard.
//
// Provides rasterization (PDFium or poppler), the noise/blur filter applied to
// page images, recomposition of images onto A4 pages, merging of page PDFs,
// and watermark overlay.

pub mod image;
pub mod pdf;
pub mod raster;

// Re-export the primary structs so callers can use `pressguard_document::PdfReader` etc.
pub use image::filter::NoiseBlurFilter;
pub use pdf::reader::PdfReader;
pub use pdf::watermark::Watermarker;
pub use pdf::writer::PdfWriter;
#[cfg(feature = "pdfium")]
pub use raster::pdfium::PdfiumRasterizer;
pub use raster::poppler::PopplerRasterizer;
pub use raster::{Rasterizer, build_rasterizer};
