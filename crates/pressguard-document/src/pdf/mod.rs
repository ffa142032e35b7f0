// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — composing image pages, merging page documents, and overlaying
// the watermark.

pub(crate) mod objects;
pub mod reader;
pub mod watermark;
pub mod writer;

pub use reader::PdfReader;
pub use watermark::Watermarker;
pub use writer::PdfWriter;
