//! IPF archive footer

use super::error::{IpfError, IpfResult};
use crate::TosFormat;
use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};

/// First archive version whose elements are encrypted
pub const ENCODED_START_VERSION: u32 = 11035;

/// Zip end-of-central-directory signature, written into every footer
pub const ZIP_END_MAGIC: [u8; 4] = *b"PK\x05\x06";

/// Whether archives with this version store encrypted elements.
///
/// Version `0` marks a freshly packed patch and is treated as encrypted.
pub const fn is_encrypted_version(version: u32) -> bool {
    version >= ENCODED_START_VERSION || version == 0
}

/// The 24 bytes at the end of an archive.
///
/// The index lives at the end of the file: the footer says where the file
/// table starts and how many entries it holds.
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[bw(little)]
pub struct IpfFooter {
    /// Number of file table entries
    pub element_count: u16,
    /// Offset of the first file table entry
    pub file_table_offset: u32,
    /// Reserved, written as zero
    pub reserved: u16,
    /// Written as the offset just past the file table; not read back
    pub file_table_end: u32,
    /// Written as [`ZIP_END_MAGIC`]; not validated
    pub magic: [u8; 4],
    /// Patch subversion
    pub subversion: u32,
    /// Patch version, decides whether elements are encrypted
    pub version: u32,
}

impl IpfFooter {
    /// Encoded size of the footer
    pub const SIZE: usize = 24;

    /// Footer with the reserved fields filled the way the game writes them.
    pub fn new(
        element_count: u16,
        file_table_offset: u32,
        file_table_end: u32,
        subversion: u32,
        version: u32,
    ) -> Self {
        Self {
            element_count,
            file_table_offset,
            reserved: 0,
            file_table_end,
            magic: ZIP_END_MAGIC,
            subversion,
            version,
        }
    }

    /// Whether elements of this archive are encrypted.
    pub const fn is_encrypted(&self) -> bool {
        is_encrypted_version(self.version)
    }

    /// Read the footer from the last 24 bytes of a whole archive.
    pub fn from_archive(data: &[u8]) -> IpfResult<Self> {
        let start = data.len().checked_sub(Self::SIZE).ok_or_else(|| {
            IpfError::InvalidFormat(format!(
                "{} bytes is too short for an archive footer",
                data.len()
            ))
        })?;
        Ok(Self::read(&mut Cursor::new(&data[start..]))?)
    }

    /// Encode the footer.
    pub fn to_bytes(&self) -> IpfResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(Self::SIZE));
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

impl TosFormat for IpfFooter {
    fn parse(data: &[u8]) -> Result<Self, Box<dyn std::error::Error>> {
        if data.len() != Self::SIZE {
            return Err(format!("footer must be {} bytes, got {}", Self::SIZE, data.len()).into());
        }
        Ok(Self::from_archive(data)?)
    }

    fn build(&self) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        Ok(self.to_bytes()?)
    }
}
