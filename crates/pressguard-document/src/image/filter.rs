// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Noise/blur filter — additive Gaussian noise followed by a separable Gaussian
// blur, applied to rasterized pages to frustrate text extraction and OCR.

use image::{ImageFormat, RgbImage};
use imageproc::filter::separable_filter;
use imageproc::noise::gaussian_noise;
use pressguard_core::error::{PressguardError, Result};
use pressguard_core::{KernelSize, PageImage};
use ring::rand::SystemRandom;
use tracing::{debug, info, instrument};

/// Perturbs page rasters with Gaussian noise and Gaussian blur.
///
/// The same sigma drives both steps. With `sigma == 0` the noise step is
/// skipped and each blur axis derives its own sigma from the kernel size.
#[derive(Debug, Clone)]
pub struct NoiseBlurFilter {
    kernel: KernelSize,
    sigma: f64,
    /// Base noise seed; page `i` uses `seed + i`. Drawn at random when unset.
    seed: Option<u64>,
}

impl NoiseBlurFilter {
    // -- Construction ---------------------------------------------------------

    /// Create a filter, rejecting even/zero kernels and negative sigma.
    pub fn new(kernel: KernelSize, sigma: f64, seed: Option<u64>) -> Result<Self> {
        kernel.validate()?;
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(PressguardError::Config(format!(
                "sigma must be a finite non-negative number, got {sigma}"
            )));
        }
        Ok(Self {
            kernel,
            sigma,
            seed,
        })
    }

    pub fn kernel(&self) -> KernelSize {
        self.kernel
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    // -- Pixel transform ------------------------------------------------------

    /// Blur sigma for one kernel axis.
    pub fn axis_sigma(&self, kernel_side: u32) -> f64 {
        if self.sigma > 0.0 {
            self.sigma
        } else {
            0.3 * ((f64::from(kernel_side) - 1.0) * 0.5 - 1.0) + 0.8
        }
    }

    /// Apply noise then blur to one raster. Pure; `seed` fixes the noise.
    pub fn apply(&self, image: &RgbImage, seed: u64) -> RgbImage {
        let noisy;
        let source = if self.sigma > 0.0 {
            noisy = gaussian_noise(image, 0.0, self.sigma, seed);
            &noisy
        } else {
            image
        };

        let (width, height) = (self.kernel.width, self.kernel.height);
        let horizontal = gaussian_kernel(width, self.axis_sigma(width));
        let vertical = gaussian_kernel(height, self.axis_sigma(height));
        separable_filter(source, &horizontal, &vertical)
    }

    // -- File convenience -----------------------------------------------------

    /// Filter every page image in place. Returns the base seed that was used.
    #[instrument(skip_all, fields(pages = pages.len(), kernel = %self.kernel, sigma = self.sigma))]
    pub fn apply_pages(&self, pages: &[PageImage]) -> Result<u64> {
        let base_seed = match self.seed {
            Some(seed) => seed,
            None => random_seed()?,
        };
        info!(base_seed, "Adding noise and blur");

        for page in pages {
            let image = image::open(&page.path)
                .map_err(|err| {
                    PressguardError::ImageError(format!(
                        "failed to open page image {}: {}",
                        page.path.display(),
                        err
                    ))
                })?
                .to_rgb8();

            let seed = base_seed.wrapping_add(page.index as u64);
            let filtered = self.apply(&image, seed);
            filtered
                .save_with_format(&page.path, ImageFormat::Png)
                .map_err(|err| {
                    PressguardError::ImageError(format!(
                        "failed to write page image {}: {}",
                        page.path.display(),
                        err
                    ))
                })?;

            debug!(
                index = page.index,
                width = filtered.width(),
                height = filtered.height(),
                "Page filtered"
            );
        }

        Ok(base_seed)
    }
}

/// Normalised 1-D Gaussian weights of odd length `size`, centred.
pub fn gaussian_kernel(size: u32, sigma: f64) -> Vec<f32> {
    let centre = f64::from(size / 2);
    let two_sigma_sq = 2.0 * sigma * sigma;
    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let offset = f64::from(i) - centre;
            (-(offset * offset) / two_sigma_sq).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    weights.iter().map(|w| (w / total) as f32).collect()
}

fn random_seed() -> Result<u64> {
    let rng = SystemRandom::new();
    let bytes: [u8; 8] = ring::rand::generate(&rng)
        .map_err(|_| PressguardError::ImageError("system random source unavailable".into()))?
        .expose();
    Ok(u64::from_le_bytes(bytes))
}
