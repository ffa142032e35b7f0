// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-document scratch space.

use std::fs;
use std::path::{Path, PathBuf};

use pressguard_core::error::{PressguardError, Result};
use tracing::{debug, warn};

/// `<tmp>/<stem>/` with one sub-directory per raster pass.
#[derive(Debug)]
pub struct ScratchArena {
    root: PathBuf,
    blur: PathBuf,
    flatten: PathBuf,
}

impl ScratchArena {
    /// Create a fresh arena for `stem`, clearing whatever a crashed run left.
    pub fn create(tmp_dir: &Path, stem: &str) -> Result<Self> {
        let root = tmp_dir.join(stem);
        if root.exists() {
            warn!(path = %root.display(), "Clearing leftover scratch arena");
            fs::remove_dir_all(&root).map_err(|err| PressguardError::io_at(&root, err))?;
        }

        let arena = Self {
            blur: root.join("blur"),
            flatten: root.join("flatten"),
            root,
        };
        for dir in [&arena.blur, &arena.flatten] {
            fs::create_dir_all(dir).map_err(|err| PressguardError::io_at(dir, err))?;
        }
        debug!(path = %arena.root.display(), "Scratch arena ready");
        Ok(arena)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Page images and page PDFs of the noise/blur pass.
    pub fn blur_dir(&self) -> &Path {
        &self.blur
    }

    /// Page images and page PDFs of the flattening pass.
    pub fn flatten_dir(&self) -> &Path {
        &self.flatten
    }

    pub fn remove(self) -> Result<()> {
        fs::remove_dir_all(&self.root).map_err(|err| PressguardError::io_at(&self.root, err))
    }
}
