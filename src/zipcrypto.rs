//! Implementation of the ZipCrypto algorithm
//!
//! The PKWARE traditional encryption is a byte-oriented stream cipher whose key state is a pure
//! function of the password and the plaintext seen so far. The encrypted stream starts with a
//! 12-byte header ("salt") whose last byte doubles as a password check.
//!
//! This cipher is broken and should only be used to interoperate with archives that require it.

use std::io;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crc32::update_byte;
use crate::result::{ZipError, ZipResult};

/// Length of the encryption header that precedes the encrypted data.
pub const HEADER_LENGTH: usize = 12;

/// The three-word key state.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub(crate) struct ZipCryptoKeys {
    key_0: u32,
    key_1: u32,
    key_2: u32,
}

impl std::fmt::Debug for ZipCryptoKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("ZipCryptoKeys").finish_non_exhaustive()
    }
}

impl ZipCryptoKeys {
    const fn new() -> ZipCryptoKeys {
        ZipCryptoKeys {
            key_0: 0x12345678,
            key_1: 0x23456789,
            key_2: 0x34567890,
        }
    }

    /// Key state after absorbing every byte of `password`.
    pub(crate) fn derive(password: &[u8]) -> ZipCryptoKeys {
        let mut keys = ZipCryptoKeys::new();
        for &byte in password {
            keys.update(byte);
        }
        keys
    }

    fn update(&mut self, input: u8) {
        self.key_0 = update_byte(self.key_0, input);
        self.key_1 = self
            .key_1
            .wrapping_add(self.key_0 & 0xff)
            .wrapping_mul(134775813)
            .wrapping_add(1);
        self.key_2 = update_byte(self.key_2, (self.key_1 >> 24) as u8);
    }

    fn stream_byte(&self) -> u8 {
        let temp = (self.key_2 as u16) | 2;
        (temp.wrapping_mul(temp ^ 1) >> 8) as u8
    }

    fn decrypt_byte(&mut self, cipher_byte: u8) -> u8 {
        let plain_byte = self.stream_byte() ^ cipher_byte;
        self.update(plain_byte);
        plain_byte
    }

    fn encrypt_byte(&mut self, plain_byte: u8) -> u8 {
        let cipher_byte = self.stream_byte() ^ plain_byte;
        self.update(plain_byte);
        cipher_byte
    }
}

/// Source of the expected value of the last decrypted header byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ZipCryptoValidator {
    /// Top byte of the entry's CRC-32 (PKZIP).
    PkzipCrc32(u32),
    /// High byte of the local header's DOS time, used by Info-ZIP when the CRC is only known
    /// from a trailing data descriptor.
    InfoZipMsdosTime(u16),
}

impl ZipCryptoValidator {
    pub const fn check_byte(self) -> u8 {
        match self {
            ZipCryptoValidator::PkzipCrc32(crc32) => (crc32 >> 24) as u8,
            ZipCryptoValidator::InfoZipMsdosTime(last_mod_time) => (last_mod_time >> 8) as u8,
        }
    }
}

/// Decrypt `ciphertext` (header included) with `password`.
///
/// Input shorter than the 12-byte header yields an empty result. A header whose check byte does
/// not match `validator` is reported as [`ZipError::WrongPassword`] for entry `name`.
pub fn decrypt(
    name: &str,
    ciphertext: &[u8],
    validator: ZipCryptoValidator,
    password: &[u8],
) -> ZipResult<Vec<u8>> {
    if ciphertext.len() < HEADER_LENGTH {
        return Ok(Vec::new());
    }
    let (header, body) = ciphertext.split_at(HEADER_LENGTH);
    let mut keys = ZipCryptoKeys::derive(password);

    let mut last = 0;
    for &byte in header {
        last = keys.decrypt_byte(byte);
    }
    if last != validator.check_byte() {
        return Err(ZipError::WrongPassword(name.into()));
    }

    Ok(body.iter().map(|&byte| keys.decrypt_byte(byte)).collect())
}

/// Encrypt `data` with `password`, prefixing a random 12-byte header.
///
/// The last header byte carries the top byte of `crc32` so that readers can check the
/// password. With `legacy_two_byte_check` the byte before it carries the next CRC byte, as
/// expected by PKZIP versions older than 2.04g.
pub fn encrypt(
    data: &[u8],
    crc32: u32,
    password: &[u8],
    legacy_two_byte_check: bool,
) -> ZipResult<Vec<u8>> {
    let mut salt = [0u8; HEADER_LENGTH];
    getrandom::fill(&mut salt).map_err(|e| ZipError::Io(io::Error::other(e.to_string())))?;
    Ok(encrypt_with_salt(
        data,
        crc32,
        password,
        legacy_two_byte_check,
        salt,
    ))
}

/// [`encrypt`] with a caller-provided header, for reproducible output.
pub fn encrypt_with_salt(
    data: &[u8],
    crc32: u32,
    password: &[u8],
    legacy_two_byte_check: bool,
    mut salt: [u8; HEADER_LENGTH],
) -> Vec<u8> {
    salt[HEADER_LENGTH - 1] = (crc32 >> 24) as u8;
    if legacy_two_byte_check {
        salt[HEADER_LENGTH - 2] = (crc32 >> 16) as u8;
    }

    let mut keys = ZipCryptoKeys::derive(password);
    let mut out = Vec::with_capacity(HEADER_LENGTH + data.len());
    out.extend(salt.iter().map(|&byte| keys.encrypt_byte(byte)));
    out.extend(data.iter().map(|&byte| keys.encrypt_byte(byte)));
    salt.zeroize();
    out
}
