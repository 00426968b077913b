//! Checksum and obfuscation primitives for Tree of Savior game data
//!
//! This crate provides the two byte-level algorithms needed by the IPF
//! archive format:
//!
//! - **CRC32**: table-driven, reflected polynomial `0xEDB88320`. The
//!   single-byte update function is shared with the cipher key schedule.
//! - **PKWARE cipher**: the traditional three-key ZIP stream cipher, keyed
//!   with a fixed password and applied to even stream offsets only.
//!
//! # Examples
//!
//! ```
//! use tos_crypto::{crc32, pkware};
//!
//! assert_eq!(crc32::checksum(b"123456789"), 0xCBF4_3926);
//!
//! let stored = pkware::encrypt(b"hello world");
//! assert_eq!(pkware::decrypt(&stored), b"hello world");
//! ```

#![warn(missing_docs)]

pub mod crc32;
pub mod pkware;

pub use crc32::{POLYNOMIAL, checksum, update_byte};
pub use pkware::{IPF_PASSWORD, PkwareCipher, PkwareKeys, decrypt, encrypt};
