#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tos_formats::TosFormat;
use tos_formats::cursor::ByteReader;
use tos_formats::ies::{
    IesColumn, IesColumnType, IesError, IesHeader, IesRow, IesTable, IesValue, read_table,
    write_table,
};

fn column_type() -> impl Strategy<Value = IesColumnType> {
    prop_oneof![
        Just(IesColumnType::Number),
        Just(IesColumnType::LocalizedString),
        Just(IesColumnType::CalculatedString),
    ]
}

fn value_for(column_type: IesColumnType) -> BoxedStrategy<IesValue> {
    match column_type {
        IesColumnType::Number => prop::num::f32::NORMAL
            .prop_map(IesValue::Number)
            .boxed(),
        string_type => ("[a-zA-Z0-9_ ]{0,24}", any::<u8>())
            .prop_map(move |(text, flag)| IesValue::string(string_type, text, flag))
            .boxed(),
    }
}

fn arb_table() -> impl Strategy<Value = IesTable> {
    prop::collection::vec(column_type(), 0..8)
        .prop_flat_map(|types| {
            let rows = prop::collection::vec(
                (
                    any::<i32>(),
                    "[A-Za-z_]{0,16}",
                    types.iter().map(|t| value_for(*t)).collect::<Vec<_>>(),
                ),
                0..6,
            );
            (Just(types), rows, any::<i16>(), any::<i16>())
        })
        .prop_map(|(types, rows, unk1, flag2)| {
            let mut table = IesTable::new("Generated");
            table.header.flag2 = flag2;
            for (index, column_type) in types.into_iter().enumerate() {
                let mut column = IesColumn::new(
                    format!("Column{index}"),
                    format!("Key{index}"),
                    column_type,
                    index as i16,
                );
                column.unk1 = unk1;
                table.add_column(column).unwrap();
            }
            for (id, key, values) in rows {
                table.add_row(IesRow::new(id, key, values)).unwrap();
            }
            table.refresh_header().unwrap();
            table
        })
}

proptest! {
    #[test]
    fn table_round_trip(table in arb_table()) {
        let bytes = write_table(&table).unwrap();
        let parsed = read_table(&bytes).unwrap();
        prop_assert_eq!(&parsed, &table);
        prop_assert_eq!(parsed.header.total_file_size as usize, bytes.len());
        IesTable::verify_round_trip(&bytes).unwrap();
    }

    #[test]
    fn flag_bytes_match_string_cells(table in arb_table()) {
        let bytes = write_table(&table).unwrap();
        let strings = table.string_columns().count();
        let numbers = table.number_columns().count();
        prop_assert_eq!(strings + numbers, table.columns.len());

        // Walk each physical row and count what follows the string cells
        let mut reader = ByteReader::new(&bytes);
        reader.seek(table.header.rows_offset().unwrap()).unwrap();
        for row in &table.rows {
            let start = reader.position();
            reader.read_i32().unwrap();
            reader.read_flipped_string().unwrap();
            for _ in 0..numbers {
                reader.read_f32().unwrap();
            }
            for _ in 0..strings {
                reader.read_flipped_string().unwrap();
            }
            let flags = row.encoded_len() - (reader.position() - start);
            prop_assert_eq!(flags, strings);
            reader.read_bytes(flags).unwrap();
        }
        prop_assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn regrouping_is_idempotent(table in arb_table()) {
        let once = write_table(&table).unwrap();
        let twice = write_table(&read_table(&once).unwrap()).unwrap();
        prop_assert_eq!(once, twice);
    }
}

#[test]
fn interleaved_columns_scenario() {
    let mut table = IesTable::new("Interleaved");
    let types = [
        IesColumnType::CalculatedString,
        IesColumnType::Number,
        IesColumnType::LocalizedString,
        IesColumnType::Number,
        IesColumnType::Number,
    ];
    for (index, column_type) in types.iter().enumerate() {
        table
            .add_column(IesColumn::new(
                format!("c{index}"),
                format!("c{index}"),
                *column_type,
                index as i16,
            ))
            .unwrap();
    }
    let values = vec![
        IesValue::string(IesColumnType::CalculatedString, "script", 1),
        IesValue::Number(1.0),
        IesValue::string(IesColumnType::LocalizedString, "text", 0),
        IesValue::Number(2.0),
        IesValue::Number(3.0),
    ];
    table.add_row(IesRow::new(1, "row", values.clone())).unwrap();

    let bytes = table.build().unwrap();
    let parsed = IesTable::parse(&bytes).unwrap();
    assert_eq!(parsed.rows[0].values, values);
    assert_eq!(parsed.header.number_column_count, 3);
    assert_eq!(parsed.header.string_column_count, 2);

    // Numbers first in column order, then strings, then flags
    let row_start = IesHeader::SIZE + 5 * IesColumn::SIZE;
    let mut reader = ByteReader::new(&bytes[row_start..]);
    assert_eq!(reader.read_i32().unwrap(), 1);
    assert_eq!(reader.read_flipped_string().unwrap(), "row");
    assert_eq!(reader.read_f32().unwrap(), 1.0);
    assert_eq!(reader.read_f32().unwrap(), 2.0);
    assert_eq!(reader.read_f32().unwrap(), 3.0);
    assert_eq!(reader.read_flipped_string().unwrap(), "script");
    assert_eq!(reader.read_flipped_string().unwrap(), "text");
    assert_eq!(reader.read_u8().unwrap(), 1);
    assert_eq!(reader.read_u8().unwrap(), 0);
    assert_eq!(reader.remaining(), 0);
}

#[test]
fn string_cells_are_bit_flipped_on_disk() {
    let mut table = IesTable::new("Flip");
    table
        .add_column(IesColumn::new("Name", "Name", IesColumnType::LocalizedString, 0))
        .unwrap();
    table
        .add_row(IesRow::new(
            1,
            "key",
            vec![IesValue::string(IesColumnType::LocalizedString, "abc", 0)],
        ))
        .unwrap();
    let bytes = table.build().unwrap();

    let flipped: Vec<u8> = b"abc".iter().map(|b| b ^ 1).collect();
    assert!(bytes.windows(3).any(|w| w == flipped.as_slice()));
    assert!(!bytes.windows(3).any(|w| w == b"abc"));
}

#[test]
fn unknown_column_type_is_a_format_error() {
    let mut table = IesTable::new("Bad");
    table
        .add_column(IesColumn::new("A", "A", IesColumnType::Number, 0))
        .unwrap();
    let mut bytes = table.build().unwrap();
    let type_offset = IesHeader::SIZE + 128;
    bytes[type_offset..type_offset + 2].copy_from_slice(&7i16.to_le_bytes());

    let err = read_table(&bytes).unwrap_err();
    assert!(matches!(err, IesError::UnknownColumnType(7)));
    assert!(err.is_format_error());
}

#[test]
fn table_file_helpers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.ies");

    let mut table = IesTable::new("OnDisk");
    table
        .add_column(IesColumn::new("N", "N", IesColumnType::Number, 0))
        .unwrap();
    table
        .add_row(IesRow::new(5, "five", vec![IesValue::Number(5.0)]))
        .unwrap();
    table.refresh_header().unwrap();

    tos_formats::ies::write_table_file(&table, &path).unwrap();
    let loaded = tos_formats::ies::read_table_file(&path).unwrap();
    assert_eq!(loaded, table);

    let missing = tos_formats::ies::read_table_file(dir.path().join("missing.ies")).unwrap_err();
    assert!(!missing.is_format_error());
}
