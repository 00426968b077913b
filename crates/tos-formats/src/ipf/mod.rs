//! IPF archive format
//!
//! IPF archives bundle game files into one payload. The index sits at the
//! end of the file instead of the start:
//!
//! ```text
//! +-----------------------------+
//! | element payloads            |  stored bytes, back to back
//! +-----------------------------+  <- file_table_offset
//! | file table                  |  one entry per element
//! +-----------------------------+
//! | footer (24 bytes)           |  count, table offset, versions
//! +-----------------------------+
//! ```
//!
//! Each payload is raw DEFLATE (unless its stored and original sizes are
//! equal) and, for versions at or above [`ENCODED_START_VERSION`] and for
//! version `0`, obfuscated with the PKWARE cipher from `tos-crypto`.
//!
//! # Concurrency
//!
//! [`IpfArchive::extract_all`] and [`IpfBuilder::add_files`] fan out over a
//! [`WorkerPool`] and return only after every task finished. Failures are
//! collected into [`IpfError::Batch`] rather than aborting the batch.
//!
//! # Examples
//!
//! ```rust
//! use tos_formats::ipf::{self, IpfBuildOptions, WorkerPool};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let files = vec![
//!     ("a.txt".to_string(), b"hello world".to_vec()),
//!     ("xml/b.xml".to_string(), b"<b/>".to_vec()),
//! ];
//! let bytes = ipf::build_archive(&files, &IpfBuildOptions::default(), &WorkerPool::new(2))?;
//!
//! let archive = ipf::read_archive_index(bytes)?;
//! for element in archive.elements() {
//!     let content = ipf::extract_element(&archive, element)?;
//!     println!("{}: {} bytes", element.path, content.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod builder;
pub mod codec;
pub mod entry;
pub mod error;
pub mod footer;
pub mod pool;

pub use archive::IpfArchive;
pub use builder::{DEFAULT_COMPRESSION_LEVEL, IpfBuildOptions, IpfBuilder};
pub use codec::{MAX_COMPRESSION_LEVEL, NO_COMPRESSION_EXTENSIONS};
pub use entry::{IpfElement, IpfEntryRecord};
pub use error::{BatchFailure, IpfError, IpfResult, ItemFailure};
pub use footer::{ENCODED_START_VERSION, IpfFooter, ZIP_END_MAGIC, is_encrypted_version};
pub use pool::{Progress, WorkerPool};

/// Parse the index of an archive held in memory.
pub fn read_archive_index(data: Vec<u8>) -> IpfResult<IpfArchive> {
    IpfArchive::parse(data)
}

/// Decode one element of an archive.
pub fn extract_element(archive: &IpfArchive, element: &IpfElement) -> IpfResult<Vec<u8>> {
    archive.extract(element)
}

/// Build an archive from in-memory `(path, content)` pairs on the pool.
///
/// Elements appear in completion order; all of them are encoded before the
/// file table is written.
pub fn build_archive(
    files: &[(String, Vec<u8>)],
    options: &IpfBuildOptions,
    pool: &WorkerPool,
) -> IpfResult<Vec<u8>> {
    let builder = IpfBuilder::new(options.clone())?;
    pool.run(
        files,
        |(path, _)| path.clone(),
        |(path, content)| builder.add_bytes(path, content),
    )?;
    builder.finish()
}
