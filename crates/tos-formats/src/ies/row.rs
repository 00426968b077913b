//! IES rows and cell values
//!
//! Rows are stored grouped by type, not in column order:
//!
//! ```text
//! id: i32
//! key: u16 length + bit-flipped bytes
//! number cells: f32 each, in column order among number columns
//! string cells: u16 length + bit-flipped bytes, in column order among string columns
//! flags: u8 per string cell, same order as the string cells
//! ```
//!
//! Decoding puts every cell back at its column index so that
//! [`IesRow::values`] always follows the table's column order.

use super::column::{IesColumn, IesColumnType};
use super::error::{IesError, IesResult};
use crate::cursor::{ByteReader, ByteWriter};

/// A typed cell.
///
/// String cells carry the trailing flag byte as read from disk. Its meaning
/// is not known; it is written back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum IesValue {
    /// Value of a [`IesColumnType::Number`] column
    Number(f32),
    /// Value of a [`IesColumnType::LocalizedString`] column
    LocalizedString {
        /// Text
        value: String,
        /// Opaque trailing flag
        flag: u8,
    },
    /// Value of a [`IesColumnType::CalculatedString`] column
    CalculatedString {
        /// Text
        value: String,
        /// Opaque trailing flag
        flag: u8,
    },
}

impl IesValue {
    /// String cell of the given kind.
    ///
    /// `column_type` must be a string kind. Passing
    /// [`IesColumnType::Number`] is a caller bug: debug builds panic, release
    /// builds return `Number(0.0)`, which [`IesRow::check_shape`] then
    /// rejects against any string column.
    pub fn string(column_type: IesColumnType, value: impl Into<String>, flag: u8) -> Self {
        debug_assert!(
            column_type.is_string(),
            "IesValue::string called with a number column type"
        );
        match column_type {
            IesColumnType::Number => Self::Number(0.0),
            IesColumnType::LocalizedString => Self::LocalizedString {
                value: value.into(),
                flag,
            },
            IesColumnType::CalculatedString => Self::CalculatedString {
                value: value.into(),
                flag,
            },
        }
    }

    /// Column type this value belongs to.
    pub const fn column_type(&self) -> IesColumnType {
        match self {
            Self::Number(_) => IesColumnType::Number,
            Self::LocalizedString { .. } => IesColumnType::LocalizedString,
            Self::CalculatedString { .. } => IesColumnType::CalculatedString,
        }
    }

    /// Numeric value, if any.
    pub const fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::LocalizedString { value, .. } | Self::CalculatedString { value, .. } => {
                Some(value)
            }
        }
    }

    /// Trailing flag of a string cell.
    pub const fn flag(&self) -> Option<u8> {
        match self {
            Self::Number(_) => None,
            Self::LocalizedString { flag, .. } | Self::CalculatedString { flag, .. } => Some(*flag),
        }
    }

    fn set_flag(&mut self, new_flag: u8) {
        match self {
            Self::Number(_) => {}
            Self::LocalizedString { flag, .. } | Self::CalculatedString { flag, .. } => {
                *flag = new_flag;
            }
        }
    }

    fn encoded_len(&self) -> usize {
        match self {
            Self::Number(_) => 4,
            Self::LocalizedString { value, .. } | Self::CalculatedString { value, .. } => {
                2 + value.len()
            }
        }
    }
}

/// One row: id, key and one value per column in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct IesRow {
    /// Class id
    pub id: i32,
    /// Class name
    pub key: String,
    /// Cells, indexed like the table's columns
    pub values: Vec<IesValue>,
}

impl IesRow {
    /// Create a row.
    pub fn new(id: i32, key: impl Into<String>, values: Vec<IesValue>) -> Self {
        Self {
            id,
            key: key.into(),
            values,
        }
    }

    /// Encoded size of the row, including one flag byte per string cell.
    pub fn encoded_len(&self) -> usize {
        let strings = self
            .values
            .iter()
            .filter(|value| value.column_type().is_string())
            .count();
        4 + 2 + self.key.len() + self.values.iter().map(IesValue::encoded_len).sum::<usize>() + strings
    }

    /// Check the row against the table's columns.
    pub fn check_shape(&self, columns: &[IesColumn]) -> IesResult<()> {
        if self.values.len() != columns.len() {
            return Err(IesError::RowShape {
                row_id: self.id,
                expected: columns.len(),
                actual: self.values.len(),
            });
        }
        for (value, column) in self.values.iter().zip(columns) {
            if value.column_type() != column.column_type {
                return Err(IesError::TypeMismatch {
                    row_id: self.id,
                    column: column.key.clone(),
                    expected: column.column_type,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn read(
        reader: &mut ByteReader<'_>,
        columns: &[IesColumn],
        number_count: usize,
        string_count: usize,
    ) -> IesResult<Self> {
        let id = reader.read_i32()?;
        let key = reader.read_flipped_string()?;

        let mut slots: Vec<Option<IesValue>> = vec![None; columns.len()];

        for _ in 0..number_count {
            let index = first_empty_slot(&slots, columns, id, |t| !t.is_string())?;
            slots[index] = Some(IesValue::Number(reader.read_f32()?));
        }

        for _ in 0..string_count {
            let index = first_empty_slot(&slots, columns, id, IesColumnType::is_string)?;
            let value = reader.read_flipped_string()?;
            slots[index] = Some(IesValue::string(columns[index].column_type, value, 0));
        }

        for (slot, column) in slots.iter_mut().zip(columns) {
            if let Some(value) = slot.as_mut().filter(|_| column.column_type.is_string()) {
                value.set_flag(reader.read_u8()?);
            }
        }

        let filled = slots.iter().filter(|slot| slot.is_some()).count();
        let values: Option<Vec<IesValue>> = slots.into_iter().collect();
        let values = values.ok_or(IesError::RowShape {
            row_id: id,
            expected: columns.len(),
            actual: filled,
        })?;

        Ok(Self { id, key, values })
    }

    pub(crate) fn write(&self, writer: &mut ByteWriter, columns: &[IesColumn]) -> IesResult<()> {
        self.check_shape(columns)?;

        writer.write_i32(self.id);
        writer.write_flipped_string(&self.key)?;

        for value in &self.values {
            if let IesValue::Number(n) = value {
                writer.write_f32(*n);
            }
        }
        for value in &self.values {
            if let Some(text) = value.as_str() {
                writer.write_flipped_string(text)?;
            }
        }
        for value in &self.values {
            if let Some(flag) = value.flag() {
                writer.write_u8(flag);
            }
        }
        Ok(())
    }
}

/// Index of the first unfilled slot whose column type matches.
fn first_empty_slot(
    slots: &[Option<IesValue>],
    columns: &[IesColumn],
    row_id: i32,
    matches: impl Fn(IesColumnType) -> bool,
) -> IesResult<usize> {
    slots
        .iter()
        .zip(columns)
        .position(|(slot, column)| slot.is_none() && matches(column.column_type))
        .ok_or_else(|| {
            IesError::InconsistentHeader(format!(
                "row {row_id} has more cells of a type than the table has columns"
            ))
        })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn columns() -> Vec<IesColumn> {
        vec![
            IesColumn::new("Name", "Name", IesColumnType::LocalizedString, 0),
            IesColumn::new("Level", "Level", IesColumnType::Number, 1),
            IesColumn::new("Script", "Script", IesColumnType::CalculatedString, 2),
            IesColumn::new("Weight", "Weight", IesColumnType::Number, 3),
        ]
    }

    fn row() -> IesRow {
        IesRow::new(
            42,
            "Sword",
            vec![
                IesValue::string(IesColumnType::LocalizedString, "Short Sword", 1),
                IesValue::Number(5.0),
                IesValue::string(IesColumnType::CalculatedString, "SCR_X", 0),
                IesValue::Number(1.5),
            ],
        )
    }

    #[test]
    fn test_physical_order_groups_numbers_first() {
        let mut writer = ByteWriter::new();
        row().write(&mut writer, &columns()).unwrap();
        let data = writer.into_inner();

        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_i32().unwrap(), 42);
        assert_eq!(reader.read_flipped_string().unwrap(), "Sword");
        assert_eq!(reader.read_f32().unwrap(), 5.0);
        assert_eq!(reader.read_f32().unwrap(), 1.5);
        assert_eq!(reader.read_flipped_string().unwrap(), "Short Sword");
        assert_eq!(reader.read_flipped_string().unwrap(), "SCR_X");
        assert_eq!(reader.read_u8().unwrap(), 1);
        assert_eq!(reader.read_u8().unwrap(), 0);
        assert_eq!(reader.remaining(), 0);

        assert_eq!(data.len(), row().encoded_len());
    }

    #[test]
    fn test_read_restores_column_order() {
        let mut writer = ByteWriter::new();
        row().write(&mut writer, &columns()).unwrap();
        let data = writer.into_inner();

        let parsed = IesRow::read(&mut ByteReader::new(&data), &columns(), 2, 2).unwrap();
        assert_eq!(parsed, row());
    }

    #[test]
    fn test_flag_count_equals_string_cells() {
        let mut writer = ByteWriter::new();
        row().write(&mut writer, &columns()).unwrap();
        let data = writer.into_inner();

        // id + key + two numbers + two strings
        let body = 4 + (2 + 5) + 4 * 2 + (2 + 11) + (2 + 5);
        assert_eq!(data.len() - body, 2);
    }

    #[test]
    fn test_write_rejects_wrong_shape() {
        let mut short = row();
        short.values.pop();
        assert!(matches!(
            short.write(&mut ByteWriter::new(), &columns()),
            Err(IesError::RowShape {
                row_id: 42,
                expected: 4,
                actual: 3
            })
        ));

        let mut swapped = row();
        swapped.values.swap(0, 1);
        assert!(matches!(
            swapped.write(&mut ByteWriter::new(), &columns()),
            Err(IesError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_read_with_too_many_numbers() {
        let mut writer = ByteWriter::new();
        row().write(&mut writer, &columns()).unwrap();
        let data = writer.into_inner();

        assert!(IesRow::read(&mut ByteReader::new(&data), &columns(), 3, 1).is_err());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "number column type")]
    fn test_string_constructor_rejects_number_type() {
        let _ = IesValue::string(IesColumnType::Number, "lost", 0);
    }

    #[test]
    fn test_value_accessors() {
        let value = IesValue::string(IesColumnType::CalculatedString, "x", 7);
        assert_eq!(value.as_str(), Some("x"));
        assert_eq!(value.flag(), Some(7));
        assert_eq!(value.as_number(), None);
        assert_eq!(IesValue::Number(2.0).as_number(), Some(2.0));
        assert_eq!(IesValue::Number(2.0).flag(), None);
    }
}
