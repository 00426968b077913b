//! IES table format
//!
//! IES files hold the game's class tables: a fixed header, one record per
//! column, then one variable-length record per row.
//!
//! # Layout
//!
//! All integers are little-endian.
//!
//! - **Header** (156 bytes): name, flags, section sizes, row and column
//!   counts. Section offsets are not stored; the column section starts at
//!   `total_size - (column_size + row_size)`.
//! - **Columns** (136 bytes each): name and key in 64-byte bit-flipped
//!   fields, type id, two opaque words, position.
//! - **Rows**: id, key, then all number cells, all string cells and one
//!   flag byte per string cell. See [`row`] for details.
//!
//! Column names, keys, row keys and string cells are stored with every byte
//! XORed with `0x01` ([`bit_flip`](crate::cursor::bit_flip)).
//!
//! # Examples
//!
//! ```rust
//! use tos_formats::ies::{IesColumn, IesColumnType, IesRow, IesTable, IesValue};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut table = IesTable::new("Item");
//! table.add_column(IesColumn::new("Weight", "Weight", IesColumnType::Number, 0))?;
//! table.add_column(IesColumn::new("Name", "Name", IesColumnType::LocalizedString, 1))?;
//! table.add_row(IesRow::new(
//!     1,
//!     "Sword",
//!     vec![
//!         IesValue::Number(3.5),
//!         IesValue::string(IesColumnType::LocalizedString, "Short Sword", 0),
//!     ],
//! ))?;
//!
//! let bytes = tos_formats::ies::write_table(&table)?;
//! let parsed = tos_formats::ies::read_table(&bytes)?;
//! assert_eq!(parsed.rows, table.rows);
//! assert_eq!(parsed.header.number_column_count, 1);
//! # Ok(())
//! # }
//! ```

pub mod column;
pub mod error;
pub mod header;
pub mod row;
pub mod table;

pub use column::{COLUMN_FIELD_LENGTH, IesColumn, IesColumnType};
pub use error::{IesError, IesResult};
pub use header::{IesHeader, NAME_LENGTH};
pub use row::{IesRow, IesValue};
pub use table::IesTable;

use std::path::Path;

/// Parse a table from bytes.
pub fn read_table(data: &[u8]) -> IesResult<IesTable> {
    IesTable::parse(data)
}

/// Serialize a table.
pub fn write_table(table: &IesTable) -> IesResult<Vec<u8>> {
    table.build()
}

/// Read and parse a table file.
pub fn read_table_file(path: impl AsRef<Path>) -> IesResult<IesTable> {
    let data = std::fs::read(path)?;
    IesTable::parse(&data)
}

/// Serialize a table to a file.
pub fn write_table_file(table: &IesTable, path: impl AsRef<Path>) -> IesResult<()> {
    std::fs::write(path, table.build()?)?;
    Ok(())
}
