// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// User access permissions — the `/P` entry of the encryption dictionary.

use bitflags::bitflags;

bitflags! {
    /// Operations a user (non-owner) may perform on a sealed document.
    ///
    /// Bit positions follow the standard security handler's `/P` layout
    /// (bit 1 is the least significant).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u32 {
        /// Bit 3: print (at low resolution unless PRINT_HIGH_RES is also set)
        const PRINT = 1 << 2;
        /// Bit 4: modify contents by operations other than those below
        const MODIFY_OTHER = 1 << 3;
        /// Bit 5: copy or extract text and graphics
        const EXTRACT = 1 << 4;
        /// Bit 6: add or modify annotations, fill form fields
        const ANNOTATE = 1 << 5;
        /// Bit 9: fill existing form fields
        const FILL_FORMS = 1 << 8;
        /// Bit 10: extract text and graphics for accessibility
        const EXTRACT_ACCESSIBILITY = 1 << 9;
        /// Bit 11: insert, rotate, delete pages, create bookmarks
        const ASSEMBLE = 1 << 10;
        /// Bit 12: print at full resolution
        const PRINT_HIGH_RES = 1 << 11;
    }
}

/// Bits 7–8 and 13–32 must be set in `/P`.
const RESERVED_BITS: u32 = 0xFFFF_F0C0;

impl Permissions {
    /// Print at any resolution, nothing else.
    pub const fn print_only() -> Self {
        Self::PRINT.union(Self::PRINT_HIGH_RES)
    }

    /// Signed `/P` value with the reserved bits set.
    pub fn p_value(self) -> i32 {
        (self.bits() | RESERVED_BITS) as i32
    }

    /// Permissions granted by a `/P` value; reserved bits are ignored.
    pub fn from_p_value(p: i32) -> Self {
        Self::from_bits_truncate(p as u32)
    }

    /// Names of the granted permissions, for reports.
    pub fn granted_names(self) -> Vec<String> {
        self.iter_names().map(|(name, _)| name.to_ascii_lowercase()).collect()
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::print_only()
    }
}
