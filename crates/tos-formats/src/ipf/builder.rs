//! IPF archive builder

use super::codec::{MAX_COMPRESSION_LEVEL, encode_payload};
use super::entry::{IpfElement, IpfEntryRecord};
use super::error::{IpfError, IpfResult};
use super::footer::{IpfFooter, is_encrypted_version};
use super::pool::{Progress, WorkerPool};
use binrw::BinWrite;
use binrw::io::Cursor;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tos_crypto::crc32;
use tracing::{debug, info};

/// Default DEFLATE level for new archives
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 8;

/// Settings shared by every element of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpfBuildOptions {
    /// Archive name recorded on each element, e.g. `xml.ipf`
    pub archive_name: String,
    /// Patch subversion
    pub subversion: u32,
    /// Patch version; also decides whether elements are encrypted
    pub version: u32,
    /// DEFLATE level, `0` stores raw
    pub compression_level: u32,
}

impl Default for IpfBuildOptions {
    fn default() -> Self {
        Self {
            archive_name: String::new(),
            subversion: 0,
            version: 0,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

#[derive(Debug, Default)]
struct PayloadState {
    payload: Vec<u8>,
    elements: Vec<IpfElement>,
}

/// Accumulates elements and writes the finished archive.
///
/// `add_*` take `&self` and may run on many threads at once: encoding runs
/// in the caller's thread and only the offset assignment and append are
/// serialized. [`finish`](Self::finish) consumes the builder, so every add
/// has returned before the file table and footer are written.
///
/// # Examples
///
/// ```rust
/// use tos_formats::ipf::{IpfArchive, IpfBuildOptions, IpfBuilder};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let builder = IpfBuilder::new(IpfBuildOptions {
///     archive_name: "xml.ipf".to_string(),
///     ..IpfBuildOptions::default()
/// })?;
/// builder.add_bytes("xml/item.xml", b"<items/>")?;
///
/// let archive = IpfArchive::parse(builder.finish()?)?;
/// let element = &archive.elements()[0];
/// assert_eq!(archive.extract(element)?, b"<items/>");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct IpfBuilder {
    options: IpfBuildOptions,
    state: Mutex<PayloadState>,
}

impl IpfBuilder {
    /// Create a builder, validating the compression level.
    pub fn new(options: IpfBuildOptions) -> IpfResult<Self> {
        if options.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(IpfError::InvalidFormat(format!(
                "compression level {} is outside 0..={MAX_COMPRESSION_LEVEL}",
                options.compression_level
            )));
        }
        Ok(Self {
            options,
            state: Mutex::new(PayloadState::default()),
        })
    }

    /// Options the builder was created with.
    pub const fn options(&self) -> &IpfBuildOptions {
        &self.options
    }

    /// Elements added so far.
    pub fn len(&self) -> usize {
        self.state.lock().elements.len()
    }

    /// Whether no element has been added.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add in-memory content under the default archive name.
    pub fn add_bytes(&self, path: &str, data: &[u8]) -> IpfResult<IpfElement> {
        self.add_bytes_with_archive_name(path, &self.options.archive_name, data)
    }

    /// Add in-memory content under a specific archive name.
    ///
    /// Backslashes in `path` are treated as separators.
    pub fn add_bytes_with_archive_name(
        &self,
        path: &str,
        archive_name: &str,
        data: &[u8],
    ) -> IpfResult<IpfElement> {
        let path = path.replace('\\', "/");
        let stored = encode_payload(
            &path,
            data,
            self.options.compression_level,
            is_encrypted_version(self.options.version),
        )?;
        let crc32 = crc32::checksum(&stored);
        let original_size = size_field(data.len(), &path)?;
        let stored_size = size_field(stored.len(), &path)?;

        let element = {
            let mut state = self.state.lock();
            let payload_offset = u32::try_from(state.payload.len())
                .ok()
                .filter(|offset| offset.checked_add(stored_size).is_some())
                .ok_or_else(|| {
                    IpfError::InvalidFormat(format!(
                        "adding '{path}' would grow the payload past 4 GiB"
                    ))
                })?;
            state.payload.extend_from_slice(&stored);

            let element = IpfElement {
                path,
                archive_name: archive_name.to_string(),
                crc32,
                stored_size,
                original_size,
                payload_offset,
            };
            state.elements.push(element.clone());
            element
        };

        debug!(
            path = %element.path,
            original = element.original_size,
            stored = element.stored_size,
            offset = element.payload_offset,
            "added element"
        );
        Ok(element)
    }

    /// Read `file` and add it under its path relative to `root`.
    pub fn add_file(&self, root: &Path, file: &Path) -> IpfResult<IpfElement> {
        let path = element_path(root, file)?;
        let data = std::fs::read(file)?;
        self.add_bytes(&path, &data)
    }

    /// Add many files on the worker pool.
    ///
    /// Every file is attempted; failures are reported together as
    /// [`IpfError::Batch`]. Element order follows completion order.
    pub fn add_files(
        &self,
        root: &Path,
        files: &[PathBuf],
        pool: &WorkerPool,
        progress: &Progress,
    ) -> IpfResult<usize> {
        let added = pool.run(
            files,
            |file| file.display().to_string(),
            |file| {
                let element = self.add_file(root, file)?;
                progress.record(u64::from(element.original_size));
                Ok(())
            },
        )?;
        Ok(added.len())
    }

    /// Write payload, file table and footer.
    pub fn finish(self) -> IpfResult<Vec<u8>> {
        let PayloadState { payload, elements } = self.state.into_inner();

        let element_count = u16::try_from(elements.len()).map_err(|_| {
            IpfError::InvalidFormat(format!(
                "{} elements exceed the limit of {}",
                elements.len(),
                u16::MAX
            ))
        })?;
        let file_table_offset = offset_field(payload.len())?;

        let mut cursor = Cursor::new(payload);
        cursor.set_position(u64::from(file_table_offset));
        for element in &elements {
            IpfEntryRecord::try_from(element)?.write(&mut cursor)?;
        }
        let file_table_end = offset_field(cursor.get_ref().len())?;

        IpfFooter::new(
            element_count,
            file_table_offset,
            file_table_end,
            self.options.subversion,
            self.options.version,
        )
        .write(&mut cursor)?;

        let archive = cursor.into_inner();
        info!(
            archive = %self.options.archive_name,
            elements = elements.len(),
            size = archive.len(),
            "built archive"
        );
        Ok(archive)
    }

    /// Finish and write the archive to `path`.
    pub fn write_to(self, path: impl AsRef<Path>) -> IpfResult<()> {
        let archive = self.finish()?;
        std::fs::write(path, archive)?;
        Ok(())
    }
}

fn size_field(len: usize, path: &str) -> IpfResult<u32> {
    u32::try_from(len)
        .map_err(|_| IpfError::InvalidFormat(format!("'{path}' is larger than 4 GiB")))
}

fn offset_field(offset: usize) -> IpfResult<u32> {
    u32::try_from(offset)
        .map_err(|_| IpfError::InvalidFormat(format!("archive offset {offset} exceeds 4 GiB")))
}

/// Forward-slash path of `file` relative to `root`.
fn element_path(root: &Path, file: &Path) -> IpfResult<String> {
    let relative = file.strip_prefix(root).map_err(|_| {
        IpfError::InvalidFormat(format!(
            "'{}' is not inside '{}'",
            file.display(),
            root.display()
        ))
    })?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    if parts.is_empty() {
        return Err(IpfError::InvalidFormat(format!(
            "'{}' has no path below '{}'",
            file.display(),
            root.display()
        )));
    }
    Ok(parts.join("/"))
}
