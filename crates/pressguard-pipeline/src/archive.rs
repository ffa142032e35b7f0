// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Moving sealed originals into the processed folder without overwriting.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use pressguard_core::document_stem;
use pressguard_core::error::{PressguardError, Result};
use tracing::{debug, info, instrument};

/// Candidate names in order: `<stem>.pdf`, then `<stem>_exists_<n>.pdf`.
fn candidates(stem: &str, max_attempts: u32) -> impl Iterator<Item = String> + '_ {
    std::iter::once(format!("{stem}.pdf"))
        .chain((1..=max_attempts).map(move |n| format!("{stem}_exists_{n}.pdf")))
}

/// Move `source` into `processed_dir` under the first free candidate name.
///
/// Fails with `ArchiveCollision` once `max_attempts` numbered names are all
/// taken. Existing files are never replaced.
#[instrument(skip_all, fields(source = %source.display()))]
pub fn archive_original(source: &Path, processed_dir: &Path, max_attempts: u32) -> Result<PathBuf> {
    let stem = document_stem(source)?;
    fs::create_dir_all(processed_dir).map_err(|err| PressguardError::io_at(processed_dir, err))?;

    for name in candidates(&stem, max_attempts) {
        let target = processed_dir.join(&name);
        if target.exists() {
            debug!(taken = %target.display(), "Archive name in use");
            continue;
        }
        move_file(source, &target)?;
        info!(target = %target.display(), "Original archived");
        return Ok(target);
    }

    Err(PressguardError::ArchiveCollision {
        document: source.display().to_string(),
        folder: processed_dir.display().to_string(),
        attempts: max_attempts,
    })
}

/// Rename, or copy into a newly created file and remove the source when the
/// rename is refused (e.g. across filesystems).
fn move_file(source: &Path, target: &Path) -> Result<()> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            debug!(%rename_err, "Rename failed, copying instead");
            let mut reader = File::open(source).map_err(|err| PressguardError::io_at(source, err))?;
            let mut writer = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(target)
                .map_err(|err| PressguardError::io_at(target, err))?;
            io::copy(&mut reader, &mut writer).map_err(|err| PressguardError::io_at(target, err))?;
            writer.sync_all().map_err(|err| PressguardError::io_at(target, err))?;
            fs::remove_file(source).map_err(|err| PressguardError::io_at(source, err))
        }
    }
}
