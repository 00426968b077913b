#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tos_formats::ipf::{
    self, IpfArchive, IpfBuildOptions, IpfBuilder, IpfError, IpfFooter, Progress, WorkerPool,
};

fn options(version: u32, level: u32) -> IpfBuildOptions {
    IpfBuildOptions {
        archive_name: "test.ipf".to_string(),
        subversion: 2,
        version,
        compression_level: level,
    }
}

fn file_set() -> impl Strategy<Value = BTreeMap<String, Vec<u8>>> {
    prop::collection::btree_map(
        "[a-z]{1,8}(/[a-z]{1,8}){0,2}\\.(txt|xml|png|lua)",
        prop_oneof![
            prop::collection::vec(any::<u8>(), 0..600),
            (any::<u8>(), 0..2000usize).prop_map(|(byte, len)| vec![byte; len]),
        ],
        0..12,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn archive_round_trip(
        files in file_set(),
        level in 0u32..=9,
        version in prop_oneof![Just(0u32), Just(1), Just(11034), Just(11035), Just(150_000)],
    ) {
        let input: Vec<(String, Vec<u8>)> = files.clone().into_iter().collect();
        let bytes = ipf::build_archive(&input, &options(version, level), &WorkerPool::new(4)).unwrap();

        let archive = ipf::read_archive_index(bytes).unwrap();
        prop_assert_eq!(archive.len(), files.len());
        prop_assert_eq!(archive.version(), version);
        for element in archive.elements() {
            let expected = &files[&element.path];
            prop_assert_eq!(element.original_size as usize, expected.len());
            prop_assert!(archive.verify_checksum(element).unwrap());
            prop_assert_eq!(&ipf::extract_element(&archive, element).unwrap(), expected);
        }
    }
}

#[test]
fn hello_world_on_disk() {
    let source = tempfile::tempdir().unwrap();
    std::fs::write(source.path().join("a.txt"), "hello world").unwrap();

    let builder = IpfBuilder::new(options(0, 6)).unwrap();
    let progress = Progress::new();
    let added = builder
        .add_files(
            source.path(),
            &[source.path().join("a.txt")],
            &WorkerPool::new(2),
            &progress,
        )
        .unwrap();
    assert_eq!(added, 1);
    assert_eq!(progress.bytes(), 11);

    let out = tempfile::tempdir().unwrap();
    let archive_path = out.path().join("test.ipf");
    builder.write_to(&archive_path).unwrap();

    let archive = IpfArchive::open(&archive_path).unwrap();
    assert!(archive.is_encrypted());
    let element = archive.element("a.txt").unwrap();
    assert_eq!(element.original_size, 11);
    assert_eq!(archive.extract(element).unwrap(), b"hello world");
}

#[test]
fn directory_round_trip_with_nested_paths() {
    let source = tempfile::tempdir().unwrap();
    let mut expected = BTreeMap::new();
    for index in 0..40 {
        let relative = format!("dir{}/sub{}/file{index}.xml", index % 3, index % 5);
        let content = format!("<entry id=\"{index}\">{}</entry>", "x".repeat(index * 7)).into_bytes();
        let path = source.path().join(&relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, &content).unwrap();
        expected.insert(relative, content);
    }
    let files: Vec<PathBuf> = expected.keys().map(|p| source.path().join(p)).collect();

    let builder = IpfBuilder::new(options(11035, 8)).unwrap();
    builder
        .add_files(source.path(), &files, &WorkerPool::new(8), &Progress::new())
        .unwrap();
    let archive = IpfArchive::parse(builder.finish().unwrap()).unwrap();

    let out = tempfile::tempdir().unwrap();
    let progress = Progress::new();
    let written = archive
        .extract_all(out.path(), &WorkerPool::new(8), &progress)
        .unwrap();
    assert_eq!(written, expected.len());
    assert_eq!(progress.files(), expected.len());

    for (relative, content) in &expected {
        assert_eq!(&std::fs::read(out.path().join(relative)).unwrap(), content);
    }
}

#[test]
fn concurrent_adds_never_overlap() {
    let builder = IpfBuilder::new(options(1, 1)).unwrap();
    let pool = WorkerPool::new(8);
    let items: Vec<usize> = (0..300).collect();
    pool.run(
        &items,
        usize::to_string,
        |&index| builder.add_bytes(&format!("f{index}.bin"), &vec![index as u8; index % 97]),
    )
    .unwrap();

    let archive = IpfArchive::parse(builder.finish().unwrap()).unwrap();
    let mut ranges: Vec<_> = archive.elements().iter().map(|e| e.payload_range()).collect();
    ranges.sort_by_key(|r| r.start);

    // Payloads tile the area before the file table with no gaps
    let mut next = 0;
    for range in ranges {
        assert_eq!(range.start, next);
        next = range.end;
    }
    assert_eq!(next, archive.footer().file_table_offset as usize);
    assert_eq!(archive.len(), 300);
}

#[test]
fn corrupt_element_fails_alone() {
    let builder = IpfBuilder::new(options(1, 6)).unwrap();
    builder.add_bytes("good1.txt", &[b'a'; 500]).unwrap();
    let bad = builder.add_bytes("bad.txt", &[b'b'; 500]).unwrap();
    builder.add_bytes("good2.txt", &[b'c'; 500]).unwrap();
    let mut data = builder.finish().unwrap();

    // Break the DEFLATE block header of one element
    data[bad.payload_offset as usize] = 0xFF;

    let archive = IpfArchive::parse(data).unwrap();
    let out = tempfile::tempdir().unwrap();
    let err = archive
        .extract_all(out.path(), &WorkerPool::new(3), &Progress::new())
        .unwrap_err();

    let IpfError::Batch(batch) = err else {
        panic!("expected a batch failure, got {err}");
    };
    assert_eq!(batch.total, 3);
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].item, "bad.txt");
    assert!(batch.failures[0].error.is_corrupt());

    assert_eq!(std::fs::read(out.path().join("good1.txt")).unwrap(), vec![b'a'; 500]);
    assert_eq!(std::fs::read(out.path().join("good2.txt")).unwrap(), vec![b'c'; 500]);
    assert!(!out.path().join("bad.txt").exists());
}

#[test]
fn missing_source_file_is_reported() {
    let source = tempfile::tempdir().unwrap();
    std::fs::write(source.path().join("present.txt"), "here").unwrap();
    let files = vec![
        source.path().join("present.txt"),
        source.path().join("absent.txt"),
    ];

    let builder = IpfBuilder::new(options(1, 6)).unwrap();
    let err = builder
        .add_files(source.path(), &files, &WorkerPool::new(2), &Progress::new())
        .unwrap_err();
    let IpfError::Batch(batch) = err else {
        panic!("expected a batch failure");
    };
    assert_eq!(batch.failures.len(), 1);
    assert!(batch.failures[0].item.ends_with("absent.txt"));
    assert!(batch.failures[0].error.is_io());

    // The file that could be read is still in the archive
    assert_eq!(builder.len(), 1);
}

#[test]
fn footer_is_last_24_bytes() {
    let builder = IpfBuilder::new(options(7, 6)).unwrap();
    builder.add_bytes("x", b"x").unwrap();
    let data = builder.finish().unwrap();

    let tail = &data[data.len() - IpfFooter::SIZE..];
    assert_eq!(&tail[12..16], b"PK\x05\x06");
    assert_eq!(&tail[16..20], &2u32.to_le_bytes());
    assert_eq!(&tail[20..24], &7u32.to_le_bytes());
}

#[test]
fn open_empty_file_is_a_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.ipf");
    std::fs::write(&path, []).unwrap();
    assert!(IpfArchive::open(&path).unwrap_err().is_format_error());
}
