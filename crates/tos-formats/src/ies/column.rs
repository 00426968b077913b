//! IES column descriptors

use super::error::{IesError, IesResult};
use crate::cursor::{ByteReader, ByteWriter};

/// Width of the column name and key fields
pub const COLUMN_FIELD_LENGTH: usize = 64;

/// Declared type of a column.
///
/// The two string kinds share one layout; the game uses the second for
/// text that is evaluated as script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IesColumnType {
    /// 32-bit float
    Number,
    /// Plain or localized text
    LocalizedString,
    /// Script or calculated text
    CalculatedString,
}

impl IesColumnType {
    /// Map an on-disk type id.
    pub fn from_id(id: i16) -> IesResult<Self> {
        match id {
            0 => Ok(Self::Number),
            1 => Ok(Self::LocalizedString),
            2 => Ok(Self::CalculatedString),
            other => Err(IesError::UnknownColumnType(other)),
        }
    }

    /// On-disk type id.
    pub const fn id(self) -> i16 {
        match self {
            Self::Number => 0,
            Self::LocalizedString => 1,
            Self::CalculatedString => 2,
        }
    }

    /// Whether cells of this type are stored in the string group.
    pub const fn is_string(self) -> bool {
        !matches!(self, Self::Number)
    }
}

/// One 136-byte column record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IesColumn {
    /// Display name, at most 64 bytes
    pub name: String,
    /// Key, unique within the table, at most 64 bytes
    pub key: String,
    /// Declared type
    pub column_type: IesColumnType,
    /// Opaque annotation
    pub unk1: i16,
    /// Opaque annotation
    pub unk2: i16,
    /// Declared logical position
    pub position: i16,
}

impl IesColumn {
    /// Encoded size of a column record
    pub const SIZE: usize = COLUMN_FIELD_LENGTH * 2 + 2 * 4;

    /// Column with zeroed annotations.
    pub fn new(
        name: impl Into<String>,
        key: impl Into<String>,
        column_type: IesColumnType,
        position: i16,
    ) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            column_type,
            unk1: 0,
            unk2: 0,
            position,
        }
    }

    pub(crate) fn read(reader: &mut ByteReader<'_>) -> IesResult<Self> {
        Ok(Self {
            name: reader.read_flipped_fixed_string(COLUMN_FIELD_LENGTH)?,
            key: reader.read_flipped_fixed_string(COLUMN_FIELD_LENGTH)?,
            column_type: IesColumnType::from_id(reader.read_i16()?)?,
            unk1: reader.read_i16()?,
            unk2: reader.read_i16()?,
            position: reader.read_i16()?,
        })
    }

    pub(crate) fn write(&self, writer: &mut ByteWriter) -> IesResult<()> {
        writer.write_flipped_fixed_string(&self.name, COLUMN_FIELD_LENGTH)?;
        writer.write_flipped_fixed_string(&self.key, COLUMN_FIELD_LENGTH)?;
        writer.write_i16(self.column_type.id());
        writer.write_i16(self.unk1);
        writer.write_i16(self.unk2);
        writer.write_i16(self.position);
        Ok(())
    }
}
