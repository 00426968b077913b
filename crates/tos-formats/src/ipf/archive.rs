//! IPF archive reader and extractor

use super::codec::decode_payload;
use super::entry::{IpfElement, IpfEntryRecord};
use super::error::{IpfError, IpfResult};
use super::footer::IpfFooter;
use super::pool::{Progress, WorkerPool};
use binrw::BinRead;
use binrw::io::Cursor;
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::ops::Deref;
use std::path::{Component, Path, PathBuf};
use tos_crypto::crc32;
use tracing::{debug, info};

/// Backing bytes of an open archive.
#[derive(Debug)]
enum ArchiveData {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Deref for ArchiveData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Owned(bytes) => bytes,
            Self::Mapped(map) => map,
        }
    }
}

/// An archive with its parsed index.
///
/// The archive owns its bytes for its whole lifetime. Elements are decoded
/// on demand, and since decoding only reads, one archive can be shared by
/// any number of extraction threads.
#[derive(Debug)]
pub struct IpfArchive {
    data: ArchiveData,
    footer: IpfFooter,
    elements: Vec<IpfElement>,
}

impl IpfArchive {
    /// Parse the index of an archive held in memory.
    pub fn parse(data: Vec<u8>) -> IpfResult<Self> {
        Self::from_data(ArchiveData::Owned(data))
    }

    /// Memory-map an archive file and parse its index.
    pub fn open(path: impl AsRef<Path>) -> IpfResult<Self> {
        let file = File::open(path.as_ref())?;
        if file.metadata()?.len() == 0 {
            return Self::parse(Vec::new());
        }

        #[allow(unsafe_code)]
        // SAFETY: the map is read-only; archives are not modified while open
        let map = unsafe { MmapOptions::new().map(&file)? };

        let archive = Self::from_data(ArchiveData::Mapped(map))?;
        info!(
            path = %path.as_ref().display(),
            elements = archive.elements.len(),
            version = archive.footer.version,
            "opened archive"
        );
        Ok(archive)
    }

    fn from_data(data: ArchiveData) -> IpfResult<Self> {
        let footer = IpfFooter::from_archive(&data)?;
        let table_end = data.len() - IpfFooter::SIZE;
        let table_start = footer.file_table_offset as usize;
        if table_start > table_end {
            return Err(IpfError::InvalidFormat(format!(
                "file table offset {table_start} is past the footer at {table_end}"
            )));
        }

        let mut cursor = Cursor::new(&data[table_start..table_end]);
        let mut elements = Vec::with_capacity(usize::from(footer.element_count));
        for index in 0..footer.element_count {
            let record = IpfEntryRecord::read(&mut cursor).map_err(|e| {
                IpfError::InvalidFormat(format!("file table entry {index}: {e}"))
            })?;
            elements.push(IpfElement::from(record));
        }

        debug!(
            elements = elements.len(),
            version = footer.version,
            subversion = footer.subversion,
            "parsed archive index"
        );

        Ok(Self {
            data,
            footer,
            elements,
        })
    }

    /// Footer fields.
    pub const fn footer(&self) -> &IpfFooter {
        &self.footer
    }

    /// Elements in file table order.
    pub fn elements(&self) -> &[IpfElement] {
        &self.elements
    }

    /// Element by forward-slash path.
    pub fn element(&self, path: &str) -> Option<&IpfElement> {
        self.elements.iter().find(|e| e.path == path)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the archive has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Patch version.
    pub const fn version(&self) -> u32 {
        self.footer.version
    }

    /// Patch subversion.
    pub const fn subversion(&self) -> u32 {
        self.footer.subversion
    }

    /// Whether elements are encrypted.
    pub const fn is_encrypted(&self) -> bool {
        self.footer.is_encrypted()
    }

    /// Archive name recorded on the first element.
    pub fn archive_name(&self) -> Option<&str> {
        self.elements.first().map(|e| e.archive_name.as_str())
    }

    /// Stored bytes of an element, still encrypted and compressed.
    pub fn raw_bytes(&self, element: &IpfElement) -> IpfResult<&[u8]> {
        let range = element.payload_range();
        self.data.get(range.clone()).ok_or_else(|| {
            IpfError::InvalidFormat(format!(
                "payload of '{}' ({}..{}) lies outside the {} byte archive",
                element.path,
                range.start,
                range.end,
                self.data.len()
            ))
        })
    }

    /// Whether the stored bytes match the recorded CRC32.
    pub fn verify_checksum(&self, element: &IpfElement) -> IpfResult<bool> {
        Ok(crc32::checksum(self.raw_bytes(element)?) == element.crc32)
    }

    /// Decode one element.
    pub fn extract(&self, element: &IpfElement) -> IpfResult<Vec<u8>> {
        let content = decode_payload(element, self.raw_bytes(element)?, self.is_encrypted())?;
        debug!(path = %element.path, size = content.len(), "decoded element");
        Ok(content)
    }

    /// Decode one element into `root`, creating parent directories.
    ///
    /// Returns the written path.
    pub fn extract_to(&self, element: &IpfElement, root: &Path) -> IpfResult<PathBuf> {
        let target = output_path(root, &element.path)?;
        let content = self.extract(element)?;
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, content)?;
        Ok(target)
    }

    /// Decode every element into `root` on the worker pool.
    ///
    /// A failing element does not stop the others. Returns the number of
    /// elements written, or [`IpfError::Batch`] listing every failure.
    pub fn extract_all(
        &self,
        root: &Path,
        pool: &WorkerPool,
        progress: &Progress,
    ) -> IpfResult<usize> {
        let written = pool.run(
            &self.elements,
            |element| element.path.clone(),
            |element| {
                self.extract_to(element, root)?;
                progress.record(u64::from(element.original_size));
                Ok(())
            },
        )?;

        info!(
            root = %root.display(),
            elements = written.len(),
            bytes = progress.bytes(),
            "extracted archive"
        );
        Ok(written.len())
    }
}

/// Resolve an element path below `root`, refusing anything that escapes it.
fn output_path(root: &Path, element_path: &str) -> IpfResult<PathBuf> {
    let relative = Path::new(element_path);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if element_path.is_empty() || escapes {
        return Err(IpfError::InvalidFormat(format!(
            "element path '{element_path}' is not a relative path"
        )));
    }
    Ok(root.join(relative))
}
