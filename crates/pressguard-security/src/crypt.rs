// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// AES in CBC mode, as used by the revision-6 security handler.
//
// Object data uses AES-256 with PKCS#7 padding and a random IV prepended to
// the ciphertext. Key wrapping (UE, OE, Perms) and the password hash rounds
// use unpadded CBC on whole blocks.

use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes256};
use cbc::{Decryptor, Encryptor};
use pressguard_core::error::{PressguardError, Result};

type Aes128CbcEnc = Encryptor<Aes128>;
type Aes256CbcEnc = Encryptor<Aes256>;
type Aes256CbcDec = Decryptor<Aes256>;

pub(crate) const BLOCK: usize = 16;

/// AES-256-CBC with PKCS#7 padding; returns `iv || ciphertext`.
pub(crate) fn aes256_encrypt_padded(key: &[u8; 32], iv: &[u8; BLOCK], data: &[u8]) -> Result<Vec<u8>> {
    let mut padded = data.to_vec();
    let padding_len = BLOCK - (data.len() % BLOCK);
    padded.extend(std::iter::repeat_n(padding_len as u8, padding_len));

    let len = padded.len();
    Aes256CbcEnc::new(key.into(), iv.into())
        .encrypt_padded_mut::<NoPadding>(&mut padded, len)
        .map_err(|_| PressguardError::Encryption("AES-256 encryption failed".into()))?;

    let mut output = Vec::with_capacity(BLOCK + len);
    output.extend_from_slice(iv);
    output.extend(padded);
    Ok(output)
}

/// Inverse of [`aes256_encrypt_padded`]: expects `iv || ciphertext`.
pub(crate) fn aes256_decrypt_padded(key: &[u8; 32], data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 2 * BLOCK || data.len() % BLOCK != 0 {
        return Err(PressguardError::Encryption(format!(
            "ciphertext of {} bytes is not IV plus whole blocks",
            data.len()
        )));
    }
    let (iv, body) = data.split_at(BLOCK);
    let mut buffer = body.to_vec();
    let decrypted = Aes256CbcDec::new(key.into(), iv.into())
        .decrypt_padded_mut::<NoPadding>(&mut buffer)
        .map_err(|_| PressguardError::Encryption("AES-256 decryption failed".into()))?;

    let padding_len = usize::from(decrypted[decrypted.len() - 1]);
    if padding_len == 0
        || padding_len > BLOCK
        || !decrypted[decrypted.len() - padding_len..]
            .iter()
            .all(|&b| usize::from(b) == padding_len)
    {
        return Err(PressguardError::Encryption("invalid PKCS#7 padding".into()));
    }
    Ok(decrypted[..decrypted.len() - padding_len].to_vec())
}

/// AES-256-CBC over whole blocks, zero IV, no padding.
pub(crate) fn aes256_wrap(key: &[u8; 32], data: &[u8]) -> Result<Vec<u8>> {
    let mut buffer = data.to_vec();
    let len = buffer.len();
    Aes256CbcEnc::new(key.into(), &[0u8; BLOCK].into())
        .encrypt_padded_mut::<NoPadding>(&mut buffer, len)
        .map_err(|_| PressguardError::Encryption("key wrapping needs whole AES blocks".into()))?;
    Ok(buffer)
}

/// Inverse of [`aes256_wrap`].
pub(crate) fn aes256_unwrap(key: &[u8; 32], data: &[u8]) -> Result<Vec<u8>> {
    let mut buffer = data.to_vec();
    let plain = Aes256CbcDec::new(key.into(), &[0u8; BLOCK].into())
        .decrypt_padded_mut::<NoPadding>(&mut buffer)
        .map_err(|_| PressguardError::Encryption("key unwrapping needs whole AES blocks".into()))?;
    Ok(plain.to_vec())
}

/// AES-128-CBC over whole blocks, no padding (password hash rounds).
pub(crate) fn aes128_cbc(key: &[u8], iv: &[u8], data: &mut [u8]) -> Result<()> {
    let len = data.len();
    Aes128CbcEnc::new_from_slices(key, iv)
        .map_err(|_| PressguardError::Encryption("AES-128 key or IV has the wrong length".into()))?
        .encrypt_padded_mut::<NoPadding>(data, len)
        .map_err(|_| PressguardError::Encryption("AES-128 input is not whole blocks".into()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [7u8; 32];
    const IV: [u8; 16] = [3u8; 16];

    #[test]
    fn padded_ciphertext_carries_iv_and_whole_blocks() {
        let sealed = aes256_encrypt_padded(&KEY, &IV, b"lecture notes").unwrap();
        assert_eq!(&sealed[..16], &IV);
        assert_eq!(sealed.len(), 32);
        assert_eq!(aes256_decrypt_padded(&KEY, &sealed).unwrap(), b"lecture notes");
    }

    #[test]
    fn block_aligned_input_gets_a_full_padding_block() {
        let sealed = aes256_encrypt_padded(&KEY, &IV, &[0u8; 16]).unwrap();
        assert_eq!(sealed.len(), 16 + 32);
    }

    #[test]
    fn wrong_key_fails_padding_check() {
        let sealed = aes256_encrypt_padded(&KEY, &IV, b"short").unwrap();
        // A wrong key decrypts to noise; the padding check catches it in all
        // but a vanishing fraction of cases, and never returns the plaintext.
        let result = aes256_decrypt_padded(&[8u8; 32], &sealed);
        assert!(result.map(|plain| plain != b"short").unwrap_or(true));
    }

    #[test]
    fn wrap_is_length_preserving_and_reversible() {
        let wrapped = aes256_wrap(&KEY, &[0x42u8; 32]).unwrap();
        assert_eq!(wrapped.len(), 32);
        assert_ne!(wrapped, [0x42u8; 32]);
        assert_eq!(aes256_unwrap(&KEY, &wrapped).unwrap(), [0x42u8; 32]);
    }

    #[test]
    fn wrap_rejects_partial_blocks() {
        assert!(aes256_wrap(&KEY, &[0u8; 20]).is_err());
    }
}
