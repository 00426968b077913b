//! IES table model, reader and writer

use super::column::{IesColumn, IesColumnType};
use super::error::{IesError, IesResult};
use super::header::IesHeader;
use super::row::{IesRow, IesValue};
use crate::TosFormat;
use crate::cursor::{ByteReader, ByteWriter};
use std::collections::HashSet;
use tracing::debug;

/// A complete IES table.
///
/// `header` keeps the opaque fields (`name`, flags, `reserved`) as read. Its
/// counts and sizes are informational: [`IesTable::build`] derives them from
/// `columns` and `rows` every time.
#[derive(Debug, Clone, PartialEq)]
pub struct IesTable {
    /// Header as read, or as last refreshed
    pub header: IesHeader,
    /// Columns in table order
    pub columns: Vec<IesColumn>,
    /// Rows in file order
    pub rows: Vec<IesRow>,
}

impl IesTable {
    /// Empty table with a default header.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            header: IesHeader {
                name: name.into(),
                ..IesHeader::default()
            },
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Append a column, rejecting a key that is already present.
    ///
    /// Existing rows are not extended.
    pub fn add_column(&mut self, column: IesColumn) -> IesResult<()> {
        if self.column(&column.key).is_some() {
            return Err(IesError::DuplicateColumnKey(column.key));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Append a row after checking it against the columns.
    pub fn add_row(&mut self, row: IesRow) -> IesResult<()> {
        row.check_shape(&self.columns)?;
        self.rows.push(row);
        Ok(())
    }

    /// Column by key.
    pub fn column(&self, key: &str) -> Option<&IesColumn> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Index of a column by key.
    pub fn column_index(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.key == key)
    }

    /// Row by id.
    pub fn row(&self, id: i32) -> Option<&IesRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    /// Value of a row in the column with the given key.
    pub fn value<'a>(&self, row: &'a IesRow, key: &str) -> Option<&'a IesValue> {
        self.column_index(key).and_then(|index| row.values.get(index))
    }

    /// Number-typed columns in table order.
    pub fn number_columns(&self) -> impl Iterator<Item = &IesColumn> {
        self.columns
            .iter()
            .filter(|c| c.column_type == IesColumnType::Number)
    }

    /// String-typed columns in table order.
    pub fn string_columns(&self) -> impl Iterator<Item = &IesColumn> {
        self.columns.iter().filter(|c| c.column_type.is_string())
    }

    /// Check key uniqueness and every row's shape.
    pub fn validate(&self) -> IesResult<()> {
        check_unique_keys(&self.columns)?;
        for row in &self.rows {
            row.check_shape(&self.columns)?;
        }
        Ok(())
    }

    /// Header with counts and sizes derived from the current body.
    pub fn computed_header(&self) -> IesResult<IesHeader> {
        let count = |what, value: usize| {
            u16::try_from(value).map_err(|_| IesError::Overflow { what, value })
        };
        let size = |what, value: usize| {
            u32::try_from(value).map_err(|_| IesError::Overflow { what, value })
        };

        let column_bytes = self.columns.len() * IesColumn::SIZE;
        let row_bytes: usize = self.rows.iter().map(IesRow::encoded_len).sum();

        Ok(IesHeader {
            column_section_size: size("column section size", column_bytes)?,
            row_section_size: size("row section size", row_bytes)?,
            total_file_size: size("total size", IesHeader::SIZE + column_bytes + row_bytes)?,
            row_count: count("row count", self.rows.len())?,
            column_count: count("column count", self.columns.len())?,
            number_column_count: count("number column count", self.number_columns().count())?,
            string_column_count: count("string column count", self.string_columns().count())?,
            ..self.header.clone()
        })
    }

    /// Replace the stored header aggregates with the computed ones.
    pub fn refresh_header(&mut self) -> IesResult<()> {
        self.header = self.computed_header()?;
        Ok(())
    }

    /// Parse a table from its bytes.
    pub fn parse(data: &[u8]) -> IesResult<Self> {
        let mut reader = ByteReader::new(data);
        let header = IesHeader::read(&mut reader)?;

        if header.total_file_size as usize > data.len() {
            return Err(IesError::InconsistentHeader(format!(
                "total size {} exceeds the {} bytes available",
                header.total_file_size,
                data.len()
            )));
        }
        let expected_columns = usize::from(header.column_count) * IesColumn::SIZE;
        if header.column_section_size as usize != expected_columns {
            return Err(IesError::InconsistentHeader(format!(
                "column section is {} bytes, {} columns need {expected_columns}",
                header.column_section_size, header.column_count
            )));
        }

        reader.seek(header.columns_offset()?)?;
        let mut columns = Vec::with_capacity(usize::from(header.column_count));
        for _ in 0..header.column_count {
            columns.push(IesColumn::read(&mut reader)?);
        }
        check_unique_keys(&columns)?;

        let numbers = columns
            .iter()
            .filter(|c| c.column_type == IesColumnType::Number)
            .count();
        if numbers != usize::from(header.number_column_count) {
            return Err(IesError::InconsistentHeader(format!(
                "header declares {} number columns, column list has {numbers}",
                header.number_column_count
            )));
        }

        reader.seek(header.rows_offset()?)?;
        let mut rows = Vec::with_capacity(usize::from(header.row_count));
        for _ in 0..header.row_count {
            rows.push(IesRow::read(
                &mut reader,
                &columns,
                usize::from(header.number_column_count),
                usize::from(header.string_column_count),
            )?);
        }

        if reader.position() != header.total_file_size as usize {
            return Err(IesError::InconsistentHeader(format!(
                "rows end at {}, header declares {} bytes",
                reader.position(),
                header.total_file_size
            )));
        }

        debug!(
            name = %header.name,
            columns = columns.len(),
            rows = rows.len(),
            "parsed IES table"
        );

        Ok(Self {
            header,
            columns,
            rows,
        })
    }

    /// Serialize the table, recomputing every header aggregate.
    pub fn build(&self) -> IesResult<Vec<u8>> {
        self.validate()?;
        let header = self.computed_header()?;

        let mut writer = ByteWriter::with_capacity(header.total_file_size as usize);
        header.write(&mut writer)?;
        for column in &self.columns {
            column.write(&mut writer)?;
        }
        for row in &self.rows {
            row.write(&mut writer, &self.columns)?;
        }

        debug_assert_eq!(writer.len(), header.total_file_size as usize);
        Ok(writer.into_inner())
    }
}

impl TosFormat for IesTable {
    fn parse(data: &[u8]) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::parse(data)?)
    }

    fn build(&self) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        Ok(self.build()?)
    }
}

fn check_unique_keys(columns: &[IesColumn]) -> IesResult<()> {
    let mut seen = HashSet::with_capacity(columns.len());
    for column in columns {
        if !seen.insert(column.key.as_str()) {
            return Err(IesError::DuplicateColumnKey(column.key.clone()));
        }
    }
    Ok(())
}
