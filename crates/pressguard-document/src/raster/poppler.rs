// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Poppler rasterizer — one `pdftoppm` subprocess per page.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use pressguard_core::error::{PressguardError, Result};
use pressguard_core::{PageImage, page_file_name};
use tracing::{debug, info, instrument};

use super::{Rasterizer, page_count, prepare_output};

/// Renders pages with poppler's `pdftoppm`.
///
/// Each page is rendered on its own (`-f n -l n -singlefile`) so the output
/// name is fully under our control instead of poppler's variable-width
/// numbering.
#[derive(Debug, Clone)]
pub struct PopplerRasterizer {
    program: PathBuf,
}

impl PopplerRasterizer {
    /// Use `pdftoppm` from `PATH`.
    pub fn new() -> Self {
        Self::with_program("pdftoppm")
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn render_page(&self, pdf: &Path, dpi: u32, page_number: usize, prefix: &Path) -> Result<()> {
        let page = page_number.to_string();
        let output = Command::new(&self.program)
            .arg("-png")
            .args(["-r", &dpi.to_string()])
            .args(["-f", &page, "-l", &page])
            .arg("-singlefile")
            .arg(pdf)
            .arg(prefix)
            .output()
            .map_err(|err| {
                if err.kind() == ErrorKind::NotFound {
                    PressguardError::Rasterization(format!(
                        "{} not found; install poppler-utils",
                        self.program.display()
                    ))
                } else {
                    PressguardError::Rasterization(format!(
                        "failed to run {}: {}",
                        self.program.display(),
                        err
                    ))
                }
            })?;

        if !output.status.success() {
            return Err(PressguardError::Rasterization(format!(
                "pdftoppm exited with {} on page {} of {}: {}",
                output.status,
                page_number,
                pdf.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl Default for PopplerRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for PopplerRasterizer {
    fn name(&self) -> &str {
        "poppler"
    }

    #[instrument(skip_all, fields(pdf = %pdf.display(), dpi))]
    fn rasterize(&self, pdf: &Path, dpi: u32, output_dir: &Path) -> Result<Vec<PageImage>> {
        prepare_output(pdf, dpi, output_dir)?;
        let pages = page_count(pdf)?;
        info!(pages, "Rasterizing with pdftoppm");

        let mut images = Vec::with_capacity(pages);
        for index in 0..pages {
            let path = output_dir.join(page_file_name(index, "png"));
            // pdftoppm appends the extension itself.
            let prefix = path.with_extension("");
            self.render_page(pdf, dpi, index + 1, &prefix)?;

            if !path.is_file() {
                return Err(PressguardError::Rasterization(format!(
                    "pdftoppm reported success but {} is missing",
                    path.display()
                )));
            }
            debug!(index, path = %path.display(), "Page rendered");
            images.push(PageImage { index, path });
        }

        Ok(images)
    }
}
