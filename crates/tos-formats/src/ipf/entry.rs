//! IPF file table entries

use super::error::{IpfError, IpfResult};
use binrw::{BinRead, BinWrite};
use std::ops::Range;

/// On-disk file table entry.
///
/// The path length precedes the checksum while the path bytes come last,
/// after the archive name.
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[bw(little)]
pub struct IpfEntryRecord {
    /// Length of `path`
    pub path_length: u16,
    /// CRC32 of the stored bytes
    pub crc32: u32,
    /// Length of the stored bytes
    pub stored_size: u32,
    /// Length after decoding
    pub original_size: u32,
    /// Offset of the stored bytes
    pub payload_offset: u32,
    /// Length of `archive_name`
    pub archive_name_length: u16,
    /// Archive the element belongs to, e.g. `xml.ipf`
    #[br(count = archive_name_length)]
    pub archive_name: Vec<u8>,
    /// Backslash-separated element path
    #[br(count = path_length)]
    pub path: Vec<u8>,
}

/// One file stored in an archive.
///
/// Elements only describe where their bytes are; decoding goes through
/// [`IpfArchive::extract`](super::IpfArchive::extract).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpfElement {
    /// Forward-slash separated path
    pub path: String,
    /// Archive the element belongs to
    pub archive_name: String,
    /// CRC32 of the stored bytes
    pub crc32: u32,
    /// Length of the stored bytes
    pub stored_size: u32,
    /// Length after decoding
    pub original_size: u32,
    /// Offset of the stored bytes in the archive
    pub payload_offset: u32,
}

impl IpfElement {
    /// Whether the stored bytes are deflated.
    pub const fn is_compressed(&self) -> bool {
        self.stored_size != self.original_size
    }

    /// Byte range of the stored payload.
    pub fn payload_range(&self) -> Range<usize> {
        let start = self.payload_offset as usize;
        start..start + self.stored_size as usize
    }

    /// Last path component.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

impl From<IpfEntryRecord> for IpfElement {
    fn from(record: IpfEntryRecord) -> Self {
        Self {
            path: String::from_utf8_lossy(&record.path).replace('\\', "/"),
            archive_name: String::from_utf8_lossy(&record.archive_name).into_owned(),
            crc32: record.crc32,
            stored_size: record.stored_size,
            original_size: record.original_size,
            payload_offset: record.payload_offset,
        }
    }
}

impl TryFrom<&IpfElement> for IpfEntryRecord {
    type Error = IpfError;

    fn try_from(element: &IpfElement) -> IpfResult<Self> {
        let path = element.path.replace('/', "\\").into_bytes();
        let archive_name = element.archive_name.as_bytes().to_vec();
        let length = |bytes: &[u8], what: &str| {
            u16::try_from(bytes.len()).map_err(|_| {
                IpfError::InvalidFormat(format!(
                    "{what} of '{}' is {} bytes, limit is {}",
                    element.path,
                    bytes.len(),
                    u16::MAX
                ))
            })
        };

        Ok(Self {
            path_length: length(&path, "path")?,
            crc32: element.crc32,
            stored_size: element.stored_size,
            original_size: element.original_size,
            payload_offset: element.payload_offset,
            archive_name_length: length(&archive_name, "archive name")?,
            archive_name,
            path,
        })
    }
}
