//! Readers and writers for Tree of Savior data files
//!
//! This crate provides symmetric (parser and builder) implementations for
//! the two container formats the game client ships its data in.
//!
//! # Supported Formats
//!
//! - **IES**: class tables with typed columns and bit-flipped strings
//! - **IPF**: trailer-indexed archives with DEFLATE and PKWARE-obfuscated
//!   payloads, built and extracted on a bounded worker pool
//!
//! # Design Principles
//!
//! - **Symmetric Operations**: Both parsing and building supported
//! - **Derived Headers**: Counts and sizes are recomputed on every write
//! - **Round-Trip Guarantee**: parse(build(data)) == data
//! - **Structured Concurrency**: parallel batches join before returning

#![warn(missing_docs)]

pub mod cursor;
pub mod ies;
pub mod ipf;

#[cfg(test)]
pub(crate) mod test_utils;

pub use ies::{IesError, IesTable};
pub use ipf::{IpfArchive, IpfBuilder, IpfError};

/// Common trait for binary formats with a byte-exact encoding
pub trait TosFormat: Sized {
    /// Parse from bytes
    fn parse(data: &[u8]) -> Result<Self, Box<dyn std::error::Error>>;

    /// Build to bytes
    fn build(&self) -> Result<Vec<u8>, Box<dyn std::error::Error>>;

    /// Verify that parsing and rebuilding reproduces `data` exactly
    fn verify_round_trip(data: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
        let parsed = Self::parse(data)?;
        let rebuilt = parsed.build()?;
        if let Some(offset) = data.iter().zip(&rebuilt).position(|(a, b)| a != b) {
            return Err(format!("Round-trip verification failed: first difference at byte {offset}").into());
        }
        if data.len() != rebuilt.len() {
            return Err(format!(
                "Round-trip verification failed: rebuilt {} bytes, original {}",
                rebuilt.len(),
                data.len()
            )
            .into());
        }
        Ok(())
    }
}
