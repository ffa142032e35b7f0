// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Standard security handler, revision 6 (AES-256, `/V 5 /R 6`).
//
// A random 256-bit file key encrypts the document. The key is stored twice,
// wrapped under a key derived from the user password (`/UE`) and under one
// derived from the owner password (`/OE`). `/U` and `/O` hold password
// verifiers with their salts, and `/Perms` binds the permission bits to the
// file key.

use lopdf::{Dictionary, Object, StringFormat, dictionary};
use pressguard_core::error::{PressguardError, Result};
use ring::rand::SystemRandom;
use sha2::{Digest, Sha256, Sha384, Sha512};
use tracing::debug;

use crate::crypt::{aes128_cbc, aes256_encrypt_padded, aes256_unwrap, aes256_wrap};
use crate::permissions::Permissions;
use crate::random::random_array;

/// Passwords longer than this many UTF-8 bytes are truncated.
pub const MAX_PASSWORD_BYTES: usize = 127;

/// Name of the single crypt filter used for strings and streams.
const CRYPT_FILTER: &str = "StdCF";

/// Key material and dictionary values for one sealed document.
pub struct StandardSecurity {
    file_key: [u8; 32],
    u: [u8; 48],
    ue: [u8; 32],
    o: [u8; 48],
    oe: [u8; 32],
    perms: [u8; 16],
    permissions: Permissions,
    rng: SystemRandom,
}

impl StandardSecurity {
    // -- Construction ---------------------------------------------------------

    /// Derive a fresh file key and the password entries for it.
    ///
    /// An empty `user_password` lets anyone open the document with the
    /// granted permissions; `owner_password` must not be empty.
    pub fn new(user_password: &str, owner_password: &str, permissions: Permissions) -> Result<Self> {
        if owner_password.is_empty() {
            return Err(PressguardError::Config(
                "an owner password is required to seal documents".into(),
            ));
        }
        let rng = SystemRandom::new();
        let file_key: [u8; 32] = random_array(&rng)?;
        let user = prepare_password(user_password);
        let owner = prepare_password(owner_password);

        // User entries.
        let salts: [u8; 16] = random_array(&rng)?;
        let (validation_salt, key_salt) = salts.split_at(8);
        let mut u = [0u8; 48];
        u[..32].copy_from_slice(&hash_r6(&user, validation_salt, &[])?);
        u[32..40].copy_from_slice(validation_salt);
        u[40..].copy_from_slice(key_salt);
        let ue = to_32(&aes256_wrap(&hash_r6(&user, key_salt, &[])?, &file_key)?)?;

        // Owner entries are bound to the complete /U value.
        let salts: [u8; 16] = random_array(&rng)?;
        let (validation_salt, key_salt) = salts.split_at(8);
        let mut o = [0u8; 48];
        o[..32].copy_from_slice(&hash_r6(&owner, validation_salt, &u)?);
        o[32..40].copy_from_slice(validation_salt);
        o[40..].copy_from_slice(key_salt);
        let oe = to_32(&aes256_wrap(&hash_r6(&owner, key_salt, &u)?, &file_key)?)?;

        let mut block = [0u8; 16];
        block[..4].copy_from_slice(&permissions.p_value().to_le_bytes());
        block[4..8].copy_from_slice(&[0xFF; 4]);
        block[8] = b'T';
        block[9..12].copy_from_slice(b"adb");
        block[12..].copy_from_slice(&random_array::<4>(&rng)?);
        let perms = to_16(&aes256_wrap(&file_key, &block)?)?;

        debug!(p = permissions.p_value(), "Revision 6 keys derived");
        Ok(Self {
            file_key,
            u,
            ue,
            o,
            oe,
            perms,
            permissions,
            rng,
        })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn file_key(&self) -> &[u8; 32] {
        &self.file_key
    }

    /// The `/Encrypt` dictionary for this key.
    pub fn encrypt_dictionary(&self) -> Dictionary {
        let hex = |bytes: &[u8]| Object::String(bytes.to_vec(), StringFormat::Hexadecimal);
        dictionary! {
            "Filter" => "Standard",
            "V" => 5,
            "R" => 6,
            "Length" => 256,
            "CF" => dictionary! {
                CRYPT_FILTER => dictionary! {
                    "Type" => "CryptFilter",
                    "AuthEvent" => "DocOpen",
                    "CFM" => "AESV3",
                    "Length" => 32,
                },
            },
            "StmF" => CRYPT_FILTER,
            "StrF" => CRYPT_FILTER,
            "U" => hex(&self.u),
            "UE" => hex(&self.ue),
            "O" => hex(&self.o),
            "OE" => hex(&self.oe),
            "Perms" => hex(&self.perms),
            "P" => self.permissions.p_value(),
            "EncryptMetadata" => true,
        }
    }

    // -- Object encryption ----------------------------------------------------

    /// Encrypt one string or stream body under the file key with a fresh IV.
    pub fn encrypt_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        let iv: [u8; 16] = random_array(&self.rng)?;
        aes256_encrypt_padded(&self.file_key, &iv, data)
    }
}

// -- Verification ---------------------------------------------------------------

/// Check `password` against `/U`; on success return the file key.
pub fn authenticate_user(encrypt: &Dictionary, password: &str) -> Result<Option<[u8; 32]>> {
    let password = prepare_password(password);
    let u = string_entry(encrypt, b"U", 48)?;
    let ue = string_entry(encrypt, b"UE", 32)?;

    if hash_r6(&password, &u[32..40], &[])? != u[..32] {
        return Ok(None);
    }
    let key = hash_r6(&password, &u[40..48], &[])?;
    Ok(Some(to_32(&aes256_unwrap(&key, ue)?)?))
}

/// Check `password` against `/O`; on success return the file key.
pub fn authenticate_owner(encrypt: &Dictionary, password: &str) -> Result<Option<[u8; 32]>> {
    let password = prepare_password(password);
    let u = string_entry(encrypt, b"U", 48)?;
    let o = string_entry(encrypt, b"O", 48)?;
    let oe = string_entry(encrypt, b"OE", 32)?;

    if hash_r6(&password, &o[32..40], &u[..48])? != o[..32] {
        return Ok(None);
    }
    let key = hash_r6(&password, &o[40..48], &u[..48])?;
    Ok(Some(to_32(&aes256_unwrap(&key, oe)?)?))
}

/// Decrypt `/Perms` with the file key and check it agrees with `/P`.
pub fn decode_permissions(encrypt: &Dictionary, file_key: &[u8; 32]) -> Result<Permissions> {
    let perms = string_entry(encrypt, b"Perms", 16)?;
    let block = aes256_unwrap(file_key, &perms[..16])?;
    if &block[9..12] != b"adb" {
        return Err(PressguardError::Encryption(
            "/Perms does not decrypt under this file key".into(),
        ));
    }

    let sealed_p = i32::from_le_bytes([block[0], block[1], block[2], block[3]]);
    let p = encrypt
        .get(b"P")
        .and_then(Object::as_i64)
        .map_err(|err| PressguardError::Encryption(format!("missing /P: {err}")))?;
    if i64::from(sealed_p) != p {
        return Err(PressguardError::Encryption(format!(
            "/P ({p}) disagrees with /Perms ({sealed_p})"
        )));
    }
    Ok(Permissions::from_p_value(sealed_p))
}

// -- Key derivation -------------------------------------------------------------

/// UTF-8 password bytes, truncated on a character boundary.
pub fn prepare_password(password: &str) -> Vec<u8> {
    if password.len() <= MAX_PASSWORD_BYTES {
        return password.as_bytes().to_vec();
    }
    let mut end = MAX_PASSWORD_BYTES;
    while !password.is_char_boundary(end) {
        end -= 1;
    }
    password.as_bytes()[..end].to_vec()
}

/// Revision-6 password hash: SHA-256 seeded, then at least 64 rounds of
/// AES-128 expansion and SHA-2 chosen by the round output.
pub fn hash_r6(password: &[u8], salt: &[u8], user_key: &[u8]) -> Result<[u8; 32]> {
    let mut hasher = Sha256::new();
    hasher.update(password);
    hasher.update(salt);
    hasher.update(user_key);
    let mut k: Vec<u8> = hasher.finalize().to_vec();

    let mut round: u32 = 0;
    loop {
        let mut unit = Vec::with_capacity(password.len() + k.len() + user_key.len());
        unit.extend_from_slice(password);
        unit.extend_from_slice(&k);
        unit.extend_from_slice(user_key);
        let mut e = unit.repeat(64);

        aes128_cbc(&k[..16], &k[16..32], &mut e)?;

        let selector: u32 = e[..16].iter().map(|&b| u32::from(b)).sum::<u32>() % 3;
        k = match selector {
            0 => Sha256::digest(&e).to_vec(),
            1 => Sha384::digest(&e).to_vec(),
            _ => Sha512::digest(&e).to_vec(),
        };

        round += 1;
        let last = u32::from(e[e.len() - 1]);
        if round >= 64 && last + 32 <= round {
            break;
        }
    }
    to_32(&k[..32])
}

// -- Helpers --------------------------------------------------------------------

fn string_entry<'a>(dict: &'a Dictionary, key: &[u8], min_len: usize) -> Result<&'a [u8]> {
    let bytes = dict
        .get(key)
        .and_then(Object::as_str)
        .map_err(|err| {
            PressguardError::Encryption(format!(
                "encryption dictionary lacks /{}: {err}",
                String::from_utf8_lossy(key)
            ))
        })?;
    if bytes.len() < min_len {
        return Err(PressguardError::Encryption(format!(
            "/{} is {} bytes, expected {min_len}",
            String::from_utf8_lossy(key),
            bytes.len()
        )));
    }
    Ok(bytes)
}

fn to_32(bytes: &[u8]) -> Result<[u8; 32]> {
    bytes
        .get(..32)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| PressguardError::Encryption("expected 32 bytes of key material".into()))
}

fn to_16(bytes: &[u8]) -> Result<[u8; 16]> {
    bytes
        .get(..16)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| PressguardError::Encryption("expected one AES block".into()))
}
