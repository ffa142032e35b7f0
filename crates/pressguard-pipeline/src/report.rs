// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run reports, serialisable to JSON.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use pressguard_core::error::{PressguardError, Result};
use serde::{Deserialize, Serialize};

/// Outcome of one source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub source: PathBuf,
    pub sealed: PathBuf,
    pub archived_to: PathBuf,
    pub pages: usize,
    /// Base seed of the noise pass; page `i` used `seed + i`.
    pub noise_seed: u64,
    pub permissions: Vec<String>,
    pub sha256: String,
    pub elapsed_ms: u64,
}

/// Outcome of a whole batch. Only produced when every document succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub documents: Vec<DocumentReport>,
}

impl BatchReport {
    pub fn total_pages(&self) -> usize {
        self.documents.iter().map(|doc| doc.pages).sum()
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|err| PressguardError::io_at(path, err))
    }
}
