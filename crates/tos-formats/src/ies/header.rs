//! IES table header

use super::error::{IesError, IesResult};
use crate::cursor::{ByteReader, ByteWriter};

/// Width of the header name field
pub const NAME_LENGTH: usize = 128;

/// IES header, 156 bytes at offset 0.
///
/// Counts and section sizes describe the body and are recomputed from the
/// column and row lists on every write; see
/// [`IesTable::computed_header`](super::IesTable::computed_header).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IesHeader {
    /// Table name, at most 128 bytes, not obfuscated
    pub name: String,
    /// Opaque flag, `1` in every known file
    pub flag1: i32,
    /// Bytes taken by the column records
    pub column_section_size: u32,
    /// Bytes taken by the row records
    pub row_section_size: u32,
    /// Length of the whole table
    pub total_file_size: u32,
    /// Opaque flag
    pub flag2: i16,
    /// Number of rows
    pub row_count: u16,
    /// Number of columns
    pub column_count: u16,
    /// Number of number-typed columns
    pub number_column_count: u16,
    /// Number of string-typed columns
    pub string_column_count: u16,
    /// Reserved, zero in every known file
    pub reserved: u16,
}

impl Default for IesHeader {
    fn default() -> Self {
        Self {
            name: String::new(),
            flag1: 1,
            column_section_size: 0,
            row_section_size: 0,
            total_file_size: Self::SIZE as u32,
            flag2: 0,
            row_count: 0,
            column_count: 0,
            number_column_count: 0,
            string_column_count: 0,
            reserved: 0,
        }
    }
}

impl IesHeader {
    /// Encoded size of the header
    pub const SIZE: usize = NAME_LENGTH + 4 * 4 + 2 * 6;

    /// Offset of the first column record, derived from the section sizes.
    pub fn columns_offset(&self) -> IesResult<usize> {
        let body = u64::from(self.column_section_size) + u64::from(self.row_section_size);
        let offset = u64::from(self.total_file_size)
            .checked_sub(body)
            .ok_or_else(|| {
                IesError::InconsistentHeader(format!(
                    "sections ({body} bytes) exceed total size {}",
                    self.total_file_size
                ))
            })?;
        let offset = usize::try_from(offset).map_err(|_| IesError::Overflow {
            what: "column offset",
            value: usize::MAX,
        })?;
        if offset < Self::SIZE {
            return Err(IesError::InconsistentHeader(format!(
                "column section starts at {offset}, inside the header"
            )));
        }
        Ok(offset)
    }

    /// Offset of the first row record.
    pub fn rows_offset(&self) -> IesResult<usize> {
        Ok(self.columns_offset()? + self.column_section_size as usize)
    }

    pub(crate) fn read(reader: &mut ByteReader<'_>) -> IesResult<Self> {
        let header = Self {
            name: reader.read_fixed_string(NAME_LENGTH)?,
            flag1: reader.read_i32()?,
            column_section_size: reader.read_u32()?,
            row_section_size: reader.read_u32()?,
            total_file_size: reader.read_u32()?,
            flag2: reader.read_i16()?,
            row_count: reader.read_u16()?,
            column_count: reader.read_u16()?,
            number_column_count: reader.read_u16()?,
            string_column_count: reader.read_u16()?,
            reserved: reader.read_u16()?,
        };

        let typed = u32::from(header.number_column_count) + u32::from(header.string_column_count);
        if typed != u32::from(header.column_count) {
            return Err(IesError::InconsistentHeader(format!(
                "{} number + {} string columns != {} columns",
                header.number_column_count, header.string_column_count, header.column_count
            )));
        }

        Ok(header)
    }

    pub(crate) fn write(&self, writer: &mut ByteWriter) -> IesResult<()> {
        writer.write_fixed_string(&self.name, NAME_LENGTH)?;
        writer.write_i32(self.flag1);
        writer.write_u32(self.column_section_size);
        writer.write_u32(self.row_section_size);
        writer.write_u32(self.total_file_size);
        writer.write_i16(self.flag2);
        writer.write_u16(self.row_count);
        writer.write_u16(self.column_count);
        writer.write_u16(self.number_column_count);
        writer.write_u16(self.string_column_count);
        writer.write_u16(self.reserved);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> IesHeader {
        IesHeader {
            name: "ItemTable".to_string(),
            flag1: 1,
            column_section_size: 272,
            row_section_size: 20,
            total_file_size: 156 + 272 + 20,
            flag2: 0,
            row_count: 1,
            column_count: 2,
            number_column_count: 1,
            string_column_count: 1,
            reserved: 0,
        }
    }

    #[test]
    fn test_header_size() {
        assert_eq!(IesHeader::SIZE, 156);

        let mut writer = ByteWriter::new();
        sample().write(&mut writer).unwrap();
        assert_eq!(writer.len(), IesHeader::SIZE);
    }

    #[test]
    fn test_header_round_trip() {
        let mut writer = ByteWriter::new();
        sample().write(&mut writer).unwrap();
        let data = writer.into_inner();

        let header = IesHeader::read(&mut ByteReader::new(&data)).unwrap();
        assert_eq!(header, sample());
        assert_eq!(header.columns_offset().unwrap(), 156);
        assert_eq!(header.rows_offset().unwrap(), 156 + 272);
    }

    #[test]
    fn test_header_type_counts_must_add_up() {
        let mut header = sample();
        header.string_column_count = 2;
        let mut writer = ByteWriter::new();
        header.write(&mut writer).unwrap();

        let err = IesHeader::read(&mut ByteReader::new(&writer.into_inner())).unwrap_err();
        assert!(matches!(err, IesError::InconsistentHeader(_)));
    }

    #[test]
    fn test_sections_larger_than_file() {
        let mut header = sample();
        header.total_file_size = 100;
        assert!(matches!(
            header.columns_offset(),
            Err(IesError::InconsistentHeader(_))
        ));

        header.total_file_size = 300;
        assert!(header.columns_offset().is_err());
    }

    #[test]
    fn test_name_too_long() {
        let mut header = sample();
        header.name = "n".repeat(NAME_LENGTH + 1);
        let mut writer = ByteWriter::new();
        assert!(matches!(
            header.write(&mut writer),
            Err(IesError::Cursor(_))
        ));
    }
}
