// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pressguard-pipeline — Batch driver for Pressguard.
//
// Walks the input folder and takes each document through
// rasterize → blur → recompose → merge → watermark → rasterize → recompose →
// merge → seal, then moves the original into the processed folder.

pub mod arena;
pub mod archive;
pub mod driver;
pub mod report;

pub use arena::ScratchArena;
pub use archive::archive_original;
pub use driver::Pipeline;
pub use report::{BatchReport, DocumentReport};
