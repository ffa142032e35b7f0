// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pressguard-security — Sealing of finished documents.
//
// Writes the descriptive metadata (XMP packet and Info dictionary), encrypts
// every string and stream with AES-256 under the PDF standard security
// handler (revision 6), and fingerprints the sealed file with SHA-256.

mod crypt;
pub mod integrity;
pub mod metadata;
pub mod permissions;
mod random;
pub mod seal;
pub mod standard;

pub use integrity::{hash_bytes, hash_file};
pub use permissions::Permissions;
pub use seal::{SealedDocument, Sealer};
pub use standard::StandardSecurity;
