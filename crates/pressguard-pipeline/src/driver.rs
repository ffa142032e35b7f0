// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline driver — chains the document stages for every input PDF.
//
// Documents are processed one at a time, each to completion. The first
// failure stops the batch; artifacts already written stay where they are.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use pressguard_core::error::{PressguardError, Result};
use pressguard_core::{PageImage, PipelineConfig, Stage, document_stem};
use pressguard_document::pdf::reader::list_pdfs;
use pressguard_document::{NoiseBlurFilter, PdfReader, PdfWriter, Rasterizer, Watermarker};
use pressguard_security::Sealer;
use tracing::{debug, error, info, instrument};

use crate::arena::ScratchArena;
use crate::archive::archive_original;
use crate::report::{BatchReport, DocumentReport};

/// Everything needed to seal a batch, set up once per run.
pub struct Pipeline<R> {
    config: PipelineConfig,
    rasterizer: R,
    filter: NoiseBlurFilter,
    writer: PdfWriter,
    watermarker: Watermarker,
    sealer: Sealer,
}

impl<R: Rasterizer> Pipeline<R> {
    /// Validate `config` and load the watermark page.
    pub fn new(config: PipelineConfig, rasterizer: R) -> Result<Self> {
        config.validate()?;
        let filter = NoiseBlurFilter::new(config.kernel, config.sigma, config.seed)?;
        let writer = PdfWriter::new(config.orientation);
        let watermarker = Watermarker::open(config.watermark_path())?;
        let sealer = Sealer::new(config.metadata.clone(), &config.encryption)?;

        info!(
            rasterizer = rasterizer.name(),
            dpi = config.dpi,
            kernel = %config.kernel,
            sigma = config.sigma,
            orientation = %config.orientation,
            watermark = %watermarker.source_path().display(),
            "Pipeline ready"
        );
        Ok(Self {
            config,
            rasterizer,
            filter,
            writer,
            watermarker,
            sealer,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    // -- Batch ----------------------------------------------------------------

    /// Process every `*.pdf` in the input folder, in name order.
    #[instrument(skip_all, fields(input = %self.config.input_dir.display()))]
    pub fn run(&self) -> Result<BatchReport> {
        let started_at = Utc::now();
        for dir in [
            &self.config.output_dir,
            &self.config.tmp_dir,
            &self.config.processed_dir,
        ] {
            fs::create_dir_all(dir).map_err(|err| PressguardError::io_at(dir, err))?;
        }

        let sources = list_pdfs(&self.config.input_dir)?;
        info!(documents = sources.len(), "Batch started");

        let mut documents = Vec::with_capacity(sources.len());
        for source in &sources {
            let report = self.process_document(source).inspect_err(|err| {
                error!(document = %source.display(), %err, "Document failed; stopping batch");
            })?;
            documents.push(report);
        }

        let report = BatchReport {
            started_at,
            finished_at: Utc::now(),
            documents,
        };
        info!(
            documents = report.documents.len(),
            pages = report.total_pages(),
            "Batch complete"
        );
        Ok(report)
    }

    // -- Single document ------------------------------------------------------

    /// Take one source document through every stage and archive it.
    #[instrument(skip_all, fields(document = %source.display()))]
    pub fn process_document(&self, source: &Path) -> Result<DocumentReport> {
        let started = Instant::now();
        let stem = document_stem(source)?;
        let config = &self.config;
        let cleanup = &config.cleanup;
        let output_dir = config.output_dir.as_path();
        let arena = ScratchArena::create(&config.tmp_dir, &stem)?;

        // Noise and blur.
        let pages = self.rasterizer.rasterize(source, config.dpi, arena.blur_dir())?;
        info!(pages = pages.len(), "Source rasterized");
        let noise_seed = self.filter.apply_pages(&pages)?;
        let blurred = self.recompose(
            &pages,
            arena.blur_dir(),
            source,
            Stage::Blurred,
            cleanup.blur_artifacts,
        )?;

        // Watermark.
        let watermarked = self
            .watermarker
            .apply_file(&blurred, output_dir, cleanup.watermark_input)?;

        // Flatten the watermark into the page pixels.
        let flat_pages = self
            .rasterizer
            .rasterize(&watermarked, config.dpi, arena.flatten_dir())?;
        check_page_count(pages.len(), flat_pages.len(), &watermarked)?;
        let im2pdf = self.recompose(
            &flat_pages,
            arena.flatten_dir(),
            &watermarked,
            Stage::Im2Pdf,
            cleanup.flatten_artifacts,
        )?;
        if cleanup.flatten_input {
            fs::remove_file(&watermarked).map_err(|err| PressguardError::io_at(&watermarked, err))?;
        }

        // Seal, tidy up, archive.
        let sealed = self.sealer.seal_file(&im2pdf, output_dir, cleanup.seal_input)?;
        check_page_count(pages.len(), sealed.page_count, &sealed.path)?;
        if cleanup.scratch_arena {
            arena.remove()?;
        } else {
            debug!(arena = %arena.root().display(), "Scratch arena kept");
        }
        let archived_to = archive_original(source, &config.processed_dir, config.max_archive_attempts)?;

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            sealed = %sealed.path.display(),
            pages = sealed.page_count,
            elapsed_ms,
            "Document complete"
        );
        Ok(DocumentReport {
            source: source.to_path_buf(),
            sealed: sealed.path,
            archived_to,
            pages: sealed.page_count,
            noise_seed,
            permissions: sealed.permissions.granted_names(),
            sha256: sealed.sha256,
            elapsed_ms,
        })
    }

    /// Compose page images onto A4 and merge them into the stage output
    /// named after `stage_input`.
    fn recompose(
        &self,
        pages: &[PageImage],
        pass_dir: &Path,
        stage_input: &Path,
        stage: Stage,
        remove_artifacts: bool,
    ) -> Result<PathBuf> {
        self.writer.compose_pages(pages, pass_dir, remove_artifacts)?;
        let output = stage.output_path(stage_input, &self.config.output_dir)?;
        let merged = PdfReader::merge_folder(pass_dir, &output, remove_artifacts)?;
        check_page_count(pages.len(), merged, &output)?;
        Ok(output)
    }
}

fn check_page_count(expected: usize, actual: usize, path: &Path) -> Result<()> {
    if expected == actual {
        return Ok(());
    }
    Err(PressguardError::PdfError(format!(
        "{} has {actual} pages, expected {expected}",
        path.display()
    )))
}
