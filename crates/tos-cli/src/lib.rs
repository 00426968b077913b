//! Command-line front end for `tos-formats`
//!
//! The `tos` binary is a thin wrapper around this library:
//!
//! - `tos ipf list|unpack|pack` for IPF archives
//! - `tos ies info|check` for IES tables
//!
//! Commands are plain functions so they can be driven from tests without
//! spawning a process.

#![warn(missing_docs)]

pub mod commands;
pub mod config;
pub mod error;
pub mod metadata;

pub use config::Cli;
pub use error::ConfigError;
pub use metadata::ArchiveMetadata;
