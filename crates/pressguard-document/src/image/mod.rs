// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — pixel-level perturbation of rasterized pages.

pub mod filter;

pub use filter::NoiseBlurFilter;
