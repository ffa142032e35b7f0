// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — draw a page raster onto a blank A4 page using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::fs;
use std::path::Path;

use image::RgbImage;
use pressguard_core::error::{PressguardError, Result};
use pressguard_core::{Orientation, PageImage, PagePdf, page_file_name};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

/// At 72 dpi one image pixel is one PDF point, which keeps the scale maths
/// independent of the raster resolution.
const UNIT_DPI: f32 = 72.0;

/// Recomposes page rasters into single-page A4 PDFs.
pub struct PdfWriter {
    orientation: Orientation,
}

impl PdfWriter {
    pub fn new(orientation: Orientation) -> Self {
        Self { orientation }
    }

    /// A4 page size in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.orientation.page_size_mm();
        (Mm(w_mm), Mm(h_mm))
    }

    // -- Image to page --------------------------------------------------------

    /// Create a one-page PDF with `image` stretched over the whole page.
    ///
    /// Aspect ratio is not preserved: the raster always fills the A4 page
    /// edge to edge.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn compose_page(&self, image: &RgbImage) -> Result<Vec<u8>> {
        let (img_width, img_height) = image.dimensions();
        if img_width == 0 || img_height == 0 {
            return Err(PressguardError::ImageError("cannot place an empty raster".into()));
        }

        let (page_w, page_h) = self.page_dimensions();
        let raw = RawImage {
            pixels: RawImageData::U8(image.as_raw().clone()),
            width: img_width as usize,
            height: img_height as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };

        let mut doc = PdfDocument::new("Pressguard page");
        let xobject_id = doc.add_image(&raw);

        let scale_x = page_w.into_pt().0 / img_width as f32;
        let scale_y = page_h.into_pt().0 / img_height as f32;

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: Some(scale_x),
                scale_y: Some(scale_y),
                dpi: Some(UNIT_DPI),
                rotate: None,
            },
        }];

        doc.with_pages(vec![PdfPage::new(page_w, page_h, ops)]);
        debug!(scale_x, scale_y, orientation = %self.orientation, "Raster placed on page");

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        Ok(doc.save(&PdfSaveOptions::default(), &mut warnings))
    }

    // -- File output convenience ----------------------------------------------

    /// Compose `page` into `output_dir/page_{index:05}.pdf`, optionally
    /// deleting the consumed PNG once the PDF is written.
    pub fn compose_page_file(
        &self,
        page: &PageImage,
        output_dir: &Path,
        remove_image: bool,
    ) -> Result<PagePdf> {
        let image = image::open(&page.path)
            .map_err(|err| {
                PressguardError::ImageError(format!(
                    "failed to open page image {}: {}",
                    page.path.display(),
                    err
                ))
            })?
            .to_rgb8();

        let bytes = self.compose_page(&image)?;
        let path = output_dir.join(page_file_name(page.index, "pdf"));
        fs::write(&path, &bytes).map_err(|err| PressguardError::io_at(&path, err))?;

        if remove_image {
            fs::remove_file(&page.path).map_err(|err| PressguardError::io_at(&page.path, err))?;
        }
        debug!(index = page.index, path = %path.display(), "Page composed");

        Ok(PagePdf {
            index: page.index,
            path,
        })
    }

    /// Compose every page image, preserving order.
    #[instrument(skip_all, fields(pages = pages.len(), output_dir = %output_dir.display()))]
    pub fn compose_pages(
        &self,
        pages: &[PageImage],
        output_dir: &Path,
        remove_images: bool,
    ) -> Result<Vec<PagePdf>> {
        fs::create_dir_all(output_dir).map_err(|err| PressguardError::io_at(output_dir, err))?;
        let composed = pages
            .iter()
            .map(|page| self.compose_page_file(page, output_dir, remove_images))
            .collect::<Result<Vec<_>>>()?;
        info!(pages = composed.len(), orientation = %self.orientation, "Pages recomposed on A4");
        Ok(composed)
    }
}
