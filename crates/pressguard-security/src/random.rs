// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Randomness for keys, salts, IVs, and file identifiers.

use pressguard_core::error::{PressguardError, Result};
use ring::rand::{SecureRandom, SystemRandom};

/// Fill a fixed-size array from the operating system's CSPRNG.
pub(crate) fn random_array<const N: usize>(rng: &SystemRandom) -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    rng.fill(&mut bytes)
        .map_err(|_| PressguardError::Encryption("system random source unavailable".into()))?;
    Ok(bytes)
}
