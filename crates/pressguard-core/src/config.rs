// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PressguardError, Result};
use crate::types::{KernelSize, Orientation, RasterBackend};

/// Settings for one batch run. Every field has a default, so a JSON file only
/// needs the keys it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Folder scanned for `*.pdf` sources.
    pub input_dir: PathBuf,
    /// Folder receiving every stage artifact and the sealed result.
    pub output_dir: PathBuf,
    /// Root of the per-document scratch arenas.
    pub tmp_dir: PathBuf,
    /// Originals are moved here once sealed.
    pub processed_dir: PathBuf,
    /// Explicit watermark page; defaults to `watermarks/<orientation>_A4.pdf`.
    pub watermark: Option<PathBuf>,
    pub orientation: Orientation,
    /// Resolution of both raster passes.
    pub dpi: u32,
    pub kernel: KernelSize,
    /// Standard deviation shared by the noise and the blur.
    pub sigma: f64,
    /// Fixed noise seed; a fresh random seed is drawn per document when absent.
    pub seed: Option<u64>,
    pub rasterizer: RasterizerConfig,
    pub encryption: EncryptionConfig,
    pub cleanup: CleanupConfig,
    pub metadata: MetadataRecord,
    /// Upper bound on `_exists_<n>` candidates when archiving.
    pub max_archive_attempts: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("sample_input"),
            output_dir: PathBuf::from("sample_output"),
            tmp_dir: PathBuf::from("tmp"),
            processed_dir: PathBuf::from("processed"),
            watermark: None,
            orientation: Orientation::Landscape,
            dpi: 100,
            kernel: KernelSize::square(5),
            sigma: 0.5,
            seed: None,
            rasterizer: RasterizerConfig::default(),
            encryption: EncryptionConfig::default(),
            cleanup: CleanupConfig::default(),
            metadata: MetadataRecord::default(),
            max_archive_attempts: 1000,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| PressguardError::io_at(path, err))?;
        serde_json::from_str(&text).map_err(|err| {
            PressguardError::Config(format!("{}: {}", path.display(), err))
        })
    }

    /// Watermark page used for this run.
    pub fn watermark_path(&self) -> PathBuf {
        self.watermark.clone().unwrap_or_else(|| {
            Path::new("watermarks").join(self.orientation.watermark_file_name())
        })
    }

    /// Reject settings that would fail halfway through a document.
    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 {
            return Err(PressguardError::Config("dpi must be greater than zero".into()));
        }
        self.kernel.validate()?;
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(PressguardError::Config(format!(
                "sigma must be a finite non-negative number, got {}",
                self.sigma
            )));
        }
        if self.encryption.owner_password.is_empty() {
            return Err(PressguardError::Config(
                "an owner password is required to seal documents".into(),
            ));
        }
        if self.max_archive_attempts == 0 {
            return Err(PressguardError::Config(
                "max_archive_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterizerConfig {
    pub backend: RasterBackend,
    /// Directory holding the libpdfium shared library.
    pub pdfium_path: Option<PathBuf>,
    /// `pdftoppm` executable; resolved through `PATH` when unset.
    pub pdftoppm: Option<PathBuf>,
}

/// Passwords for the standard security handler.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptionConfig {
    /// Empty means the document opens without a prompt.
    pub user_password: String,
    pub owner_password: String,
}

impl std::fmt::Debug for EncryptionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionConfig")
            .field("user_password", &redact(&self.user_password))
            .field("owner_password", &redact(&self.owner_password))
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<empty>" } else { "<redacted>" }
}

/// Which consumed artifacts are deleted as the pipeline advances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Page images and page PDFs of the blur pass.
    pub blur_artifacts: bool,
    /// `_blurred` once watermarked.
    pub watermark_input: bool,
    /// `_watermarked` once re-rasterized.
    pub flatten_input: bool,
    /// Page images and page PDFs of the flatten pass.
    pub flatten_artifacts: bool,
    /// `_im2pdf` once sealed.
    pub seal_input: bool,
    /// The per-document scratch directory itself.
    pub scratch_arena: bool,
}

impl CleanupConfig {
    pub fn keep_everything() -> Self {
        Self {
            blur_artifacts: false,
            watermark_input: false,
            flatten_input: false,
            flatten_artifacts: false,
            seal_input: false,
            scratch_arena: false,
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            blur_artifacts: true,
            watermark_input: true,
            flatten_input: true,
            flatten_artifacts: true,
            seal_input: true,
            scratch_arena: true,
        }
    }
}

/// Descriptive metadata written into every sealed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataRecord {
    pub title: String,
    pub creators: Vec<String>,
    pub description: String,
    pub subject: Vec<String>,
    pub rights: String,
    pub creator_tool: String,
    pub web_statement: Option<String>,
}

impl Default for MetadataRecord {
    fn default() -> Self {
        Self {
            title: "Lecture Notes".into(),
            creators: Vec::new(),
            description: "Lecture notes distributed for reading and printing only".into(),
            subject: Vec::new(),
            rights: "All rights reserved".into(),
            creator_tool: concat!("Pressguard ", env!("CARGO_PKG_VERSION")).into(),
            web_statement: None,
        }
    }
}
