// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pressguard — batch blur, watermark, flatten, and seal PDFs.
//
// Entry point. Initialises logging, resolves the configuration, runs the
// batch, and maps the outcome to an exit code.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use pressguard_core::PressguardError;
use pressguard_core::human_errors::{Severity, humanize_error};
use pressguard_document::build_rasterizer;
use pressguard_pipeline::{BatchReport, Pipeline};
use tracing_subscriber::EnvFilter;

use cli::{Cli, printable_config};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let human = humanize_error(&err);
            tracing::error!(error = %err, "Pressguard stopped");
            eprintln!("{}\n  {}", human.message, human.suggestion);
            match human.severity {
                Severity::Configuration => ExitCode::from(2),
                Severity::ActionRequired | Severity::Permanent => ExitCode::from(1),
            }
        }
    }
}

fn run(cli: &Cli) -> Result<(), PressguardError> {
    let config = cli.resolve_config()?;
    if cli.print_config {
        println!("{}", printable_config(&config)?);
        return Ok(());
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Pressguard starting");
    let rasterizer = build_rasterizer(&config.rasterizer)?;
    let pipeline = Pipeline::new(config, rasterizer)?;
    let report = pipeline.run()?;

    if let Some(path) = &cli.report {
        report.write_json(path)?;
        tracing::info!(path = %path.display(), "Report written");
    }
    print_summary(&report);
    Ok(())
}

fn print_summary(report: &BatchReport) {
    if report.documents.is_empty() {
        println!("No PDF files found.");
        return;
    }
    for document in &report.documents {
        println!(
            "{}  {} pages  sha256 {}",
            document.sealed.display(),
            document.pages,
            document.sha256
        );
    }
    println!(
        "Sealed {} document(s), {} page(s).",
        report.documents.len(),
        report.total_pages()
    );
}
