//! PKWARE-style stream cipher for IPF element payloads.
//!
//! This is the traditional ZIP "ZipCrypto" key schedule with two changes
//! made by the archive format: the password is a fixed 20-byte constant
//! compiled into the game client, and only bytes at even stream offsets are
//! transformed. Odd offsets pass through untouched.
//!
//! ## Security Warning
//!
//! This is store-level obfuscation, not cryptography. The password is public
//! and the cipher itself has been broken for decades. It exists only so that
//! archives can be read and written byte-for-byte compatible with the game.
//!
//! ## Usage
//!
//! ```rust
//! use tos_crypto::pkware::{IPF_PASSWORD, PkwareCipher};
//!
//! let mut cipher = PkwareCipher::new(&IPF_PASSWORD);
//! let ciphertext = cipher.encrypt(b"Hello, World!");
//!
//! // Decryption needs a fresh cipher at stream offset 0
//! let mut cipher = PkwareCipher::new(&IPF_PASSWORD);
//! assert_eq!(cipher.decrypt(&ciphertext), b"Hello, World!");
//! ```

use crate::crc32::update_byte;

/// Password used by every encrypted IPF archive.
pub const IPF_PASSWORD: [u8; 20] = [
    0x6F, 0x66, 0x4F, 0x31, 0x61, 0x30, 0x75, 0x65, 0x58, 0x41, 0x3F, 0x20, 0x5B, 0xFF, 0x73, 0x20,
    0x68, 0x20, 0x25, 0x3F,
];

/// Key words before the password is folded in.
pub const INITIAL_KEYS: [u32; 3] = [0x1234_5678, 0x2345_6789, 0x3456_7890];

/// The three-word key state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PkwareKeys {
    /// First key word, a CRC over the plaintext
    pub k0: u32,
    /// Second key word, a linear congruential mix of `k0`
    pub k1: u32,
    /// Third key word, a CRC over the high byte of `k1`
    pub k2: u32,
}

impl PkwareKeys {
    /// Key state after folding every password byte, in order.
    pub fn new(password: &[u8]) -> Self {
        let [k0, k1, k2] = INITIAL_KEYS;
        let mut keys = Self { k0, k1, k2 };
        for &byte in password {
            keys.update(byte);
        }
        keys
    }

    /// Advance the key state with one plaintext byte.
    #[inline]
    pub fn update(&mut self, plain: u8) {
        self.k0 = update_byte(self.k0, plain);
        self.k1 = self
            .k1
            .wrapping_add(self.k0 & 0xFF)
            .wrapping_mul(0x0808_8405)
            .wrapping_add(1);
        self.k2 = update_byte(self.k2, (self.k1 >> 24) as u8);
    }

    /// Mask byte for the next transformed position.
    #[inline]
    pub fn mask(&self) -> u8 {
        let magic = (self.k2 & 0xFFFF) | 2;
        (magic.wrapping_mul(magic ^ 1) >> 8) as u8
    }
}

/// Stateful cipher positioned somewhere in a stream.
///
/// Keys always advance on the plaintext byte, so encryption and decryption
/// share the key schedule but differ in which side of the XOR feeds it.
/// Splitting a buffer across several calls gives the same bytes as a single
/// call, because the stream offset is carried along with the keys.
#[derive(Debug, Clone)]
pub struct PkwareCipher {
    keys: PkwareKeys,
    offset: u64,
}

impl PkwareCipher {
    /// Create a cipher at stream offset 0.
    pub fn new(password: &[u8]) -> Self {
        Self {
            keys: PkwareKeys::new(password),
            offset: 0,
        }
    }

    /// Current key state.
    pub const fn keys(&self) -> PkwareKeys {
        self.keys
    }

    /// Number of bytes processed so far.
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Encrypt one byte at the current offset.
    #[inline]
    pub fn encrypt_byte(&mut self, plain: u8) -> u8 {
        let even = self.offset % 2 == 0;
        self.offset += 1;
        if !even {
            return plain;
        }
        let cipher = plain ^ self.keys.mask();
        self.keys.update(plain);
        cipher
    }

    /// Decrypt one byte at the current offset.
    #[inline]
    pub fn decrypt_byte(&mut self, cipher: u8) -> u8 {
        let even = self.offset % 2 == 0;
        self.offset += 1;
        if !even {
            return cipher;
        }
        let plain = cipher ^ self.keys.mask();
        self.keys.update(plain);
        plain
    }

    /// Encrypt a slice in place.
    pub fn encrypt_in_place(&mut self, data: &mut [u8]) {
        for byte in data {
            *byte = self.encrypt_byte(*byte);
        }
    }

    /// Decrypt a slice in place.
    pub fn decrypt_in_place(&mut self, data: &mut [u8]) {
        for byte in data {
            *byte = self.decrypt_byte(*byte);
        }
    }

    /// Encrypt data into a new buffer.
    pub fn encrypt(&mut self, data: &[u8]) -> Vec<u8> {
        data.iter().map(|&byte| self.encrypt_byte(byte)).collect()
    }

    /// Decrypt data into a new buffer.
    pub fn decrypt(&mut self, data: &[u8]) -> Vec<u8> {
        data.iter().map(|&byte| self.decrypt_byte(byte)).collect()
    }
}

/// Encrypt a whole buffer with [`IPF_PASSWORD`].
pub fn encrypt(data: &[u8]) -> Vec<u8> {
    PkwareCipher::new(&IPF_PASSWORD).encrypt(data)
}

/// Decrypt a whole buffer with [`IPF_PASSWORD`].
pub fn decrypt(data: &[u8]) -> Vec<u8> {
    PkwareCipher::new(&IPF_PASSWORD).decrypt(data)
}
