// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command line arguments and how they override the configuration file.

use std::path::PathBuf;

use clap::Parser;
use pressguard_core::config::{CleanupConfig, EncryptionConfig};
use pressguard_core::error::Result;
use pressguard_core::{KernelSize, Orientation, PipelineConfig, RasterBackend};

/// Blur, watermark, flatten, and seal every PDF in a folder so it can be
/// read and printed but not easily copied.
#[derive(Debug, Parser)]
#[command(name = "pressguard", version, about)]
pub struct Cli {
    /// JSON configuration file; flags below override its values
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Folder scanned for *.pdf sources
    #[arg(long, value_name = "DIR")]
    pub input: Option<PathBuf>,

    /// Folder receiving stage outputs and sealed documents
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Root of the per-document scratch folders
    #[arg(long, value_name = "DIR")]
    pub tmp: Option<PathBuf>,

    /// Folder the originals are moved to once sealed
    #[arg(long, value_name = "DIR")]
    pub processed: Option<PathBuf>,

    /// Watermark PDF (page 1 is used)
    #[arg(long, value_name = "FILE")]
    pub watermark: Option<PathBuf>,

    /// portrait or landscape
    #[arg(long)]
    pub orientation: Option<Orientation>,

    /// Resolution of both raster passes
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Gaussian kernel, e.g. 5 or 5x3 (odd sides)
    #[arg(long, value_name = "WxH")]
    pub kernel: Option<KernelSize>,

    /// Standard deviation of the noise and the blur
    #[arg(long)]
    pub sigma: Option<f64>,

    /// Fixed noise seed, for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Password that unlocks every permission
    #[arg(long, env = "PRESSGUARD_OWNER_PASSWORD", hide_env_values = true)]
    pub owner_password: Option<String>,

    /// Password needed to open the document (empty: none)
    #[arg(long, env = "PRESSGUARD_USER_PASSWORD", hide_env_values = true)]
    pub user_password: Option<String>,

    /// pdfium or poppler
    #[arg(long)]
    pub rasterizer: Option<RasterBackend>,

    /// Folder containing the libpdfium shared library
    #[arg(long, value_name = "DIR")]
    pub pdfium_path: Option<PathBuf>,

    /// pdftoppm executable for the poppler rasterizer
    #[arg(long, value_name = "FILE")]
    pub pdftoppm: Option<PathBuf>,

    /// Keep every intermediate file and scratch folder
    #[arg(long)]
    pub keep_artifacts: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,

    /// Write a JSON run report here
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Configuration file (or defaults) with the flags applied on top.
    pub fn resolve_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };

        // -- Folders --
        override_with(&mut config.input_dir, &self.input);
        override_with(&mut config.output_dir, &self.output);
        override_with(&mut config.tmp_dir, &self.tmp);
        override_with(&mut config.processed_dir, &self.processed);
        if let Some(watermark) = &self.watermark {
            config.watermark = Some(watermark.clone());
        }

        // -- Transform --
        override_with(&mut config.orientation, &self.orientation);
        override_with(&mut config.dpi, &self.dpi);
        override_with(&mut config.kernel, &self.kernel);
        override_with(&mut config.sigma, &self.sigma);
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        // -- Engines and secrets --
        override_with(&mut config.rasterizer.backend, &self.rasterizer);
        if let Some(path) = &self.pdfium_path {
            config.rasterizer.pdfium_path = Some(path.clone());
        }
        if let Some(path) = &self.pdftoppm {
            config.rasterizer.pdftoppm = Some(path.clone());
        }
        override_with(&mut config.encryption.owner_password, &self.owner_password);
        override_with(&mut config.encryption.user_password, &self.user_password);

        if self.keep_artifacts {
            config.cleanup = CleanupConfig::keep_everything();
        }
        Ok(config)
    }
}

fn override_with<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *slot = value.clone();
    }
}

/// JSON for `--print-config`, without the passwords.
pub fn printable_config(config: &PipelineConfig) -> Result<String> {
    let mut printable = config.clone();
    printable.encryption = EncryptionConfig::default();
    Ok(serde_json::to_string_pretty(&printable)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pressguard").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&[
            "--input", "in",
            "--dpi", "150",
            "--kernel", "7x3",
            "--sigma", "0",
            "--orientation", "portrait",
            "--rasterizer", "pdftoppm",
            "--owner-password", "secret",
            "--keep-artifacts",
        ]);
        let config = cli.resolve_config().unwrap();

        assert_eq!(config.input_dir, PathBuf::from("in"));
        assert_eq!(config.output_dir, PathBuf::from("sample_output"));
        assert_eq!(config.dpi, 150);
        assert_eq!(config.kernel, KernelSize::new(7, 3));
        assert_eq!(config.sigma, 0.0);
        assert_eq!(config.orientation, Orientation::Portrait);
        assert_eq!(config.rasterizer.backend, RasterBackend::Poppler);
        assert_eq!(config.encryption.owner_password, "secret");
        assert!(!config.cleanup.scratch_arena);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn even_kernel_is_rejected_at_parse_time() {
        let result = Cli::try_parse_from(["pressguard", "--kernel", "4"]);
        assert!(result.is_err());
    }

    #[test]
    fn file_values_survive_when_no_flag_is_given() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pressguard.json");
        std::fs::write(
            &path,
            r#"{ "dpi": 200, "orientation": "portrait", "encryption": { "owner_password": "from-file" } }"#,
        )
        .unwrap();

        let config = parse(&["--config", path.to_str().unwrap(), "--sigma", "1.5"])
            .resolve_config()
            .unwrap();
        assert_eq!(config.dpi, 200);
        assert_eq!(config.orientation, Orientation::Portrait);
        assert_eq!(config.sigma, 1.5);
        assert_eq!(config.kernel, KernelSize::square(5));
    }

    #[test]
    fn printed_config_hides_passwords() {
        let mut config = PipelineConfig::default();
        config.encryption.owner_password = "do-not-print".into();
        let json = printable_config(&config).unwrap();
        assert!(!json.contains("do-not-print"));
        assert!(json.contains("\"dpi\": 100"));
    }
}
