//! Command implementations.
//!
//! Each command resolves paths and options, then calls into `tos-formats`.
//! Human-readable output goes to the writer passed in; logs go through
//! `tracing`.

use crate::config::{Cli, Command, IesCommand, IpfCommand, PackArgs};
use crate::error::ConfigError;
use crate::metadata::{ArchiveMetadata, METADATA_FILE};
use anyhow::{Context, Result, bail};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tos_formats::TosFormat;
use tos_formats::ies::{self, IesTable};
use tos_formats::ipf::{IpfArchive, IpfBuildOptions, IpfBuilder, IpfError, Progress, WorkerPool};
use tracing::{error, info, warn};
use walkdir::WalkDir;

/// Run the parsed command line.
pub fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    let pool = cli.worker_pool()?;
    match &cli.command {
        Command::Ipf(IpfCommand::List { input }) => ipf_list(input, out),
        Command::Ipf(IpfCommand::Unpack { input, output }) => {
            ipf_unpack(input, output, &pool).map(|_| ())
        }
        Command::Ipf(IpfCommand::Pack(args)) => ipf_pack(args, &pool).map(|_| ()),
        Command::Ies(IesCommand::Info { input }) => ies_info(input, out),
        Command::Ies(IesCommand::Check { inputs }) => ies_check(inputs, out),
    }
}

/// Log every failure of a batch and turn the error into a summary.
fn report_batch(err: IpfError) -> anyhow::Error {
    if let IpfError::Batch(batch) = &err {
        for failure in &batch.failures {
            error!(item = %failure.item, "{}", failure.error);
        }
    }
    anyhow::Error::new(err)
}

/// Print footer values and one line per element.
pub fn ipf_list(input: &Path, out: &mut impl Write) -> Result<()> {
    let archive = IpfArchive::open(input)
        .with_context(|| format!("failed to open {}", input.display()))?;

    writeln!(
        out,
        "version {} subversion {} ({} elements{})",
        archive.version(),
        archive.subversion(),
        archive.len(),
        if archive.is_encrypted() { ", encrypted" } else { "" }
    )?;
    for element in archive.elements() {
        writeln!(
            out,
            "{}\t{}\t{}\t{:08x}",
            element.path, element.original_size, element.stored_size, element.crc32
        )?;
    }
    Ok(())
}

/// Extract an archive into `<output>/<archive name>/` and write the sidecar.
///
/// Returns the directory the elements were written to.
pub fn ipf_unpack(input: &Path, output: &Path, pool: &WorkerPool) -> Result<PathBuf> {
    let archive = IpfArchive::open(input)
        .with_context(|| format!("failed to open {}", input.display()))?;

    let recorded = archive.archive_name().unwrap_or_default();
    let name = if is_directory_name(recorded) {
        recorded.to_string()
    } else {
        let fallback = input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .context("cannot determine an archive name")?;
        if !recorded.is_empty() {
            warn!(recorded, fallback = %fallback, "archive name is not a plain file name");
        }
        fallback
    };
    let directory = output.join(&name);
    std::fs::create_dir_all(&directory)
        .with_context(|| format!("failed to create {}", directory.display()))?;

    ArchiveMetadata {
        name,
        subversion: archive.subversion(),
        version: archive.version(),
    }
    .save(&directory)?;

    let progress = Progress::new();
    archive
        .extract_all(&directory, pool, &progress)
        .map_err(report_batch)
        .with_context(|| format!("failed to unpack {}", input.display()))?;

    info!(
        files = progress.files(),
        bytes = progress.bytes(),
        output = %directory.display(),
        "unpacked"
    );
    Ok(directory)
}

/// Whether `name` is a single plain path component.
fn is_directory_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    !name.contains(['/', '\\'])
        && matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none()
}

/// Pack a directory into an archive. Returns the number of elements.
pub fn ipf_pack(args: &PackArgs, pool: &WorkerPool) -> Result<usize> {
    args.validate()?;
    let metadata = ArchiveMetadata::load(&args.input)?;

    let name = args
        .name
        .clone()
        .or_else(|| metadata.as_ref().map(|m| m.name.clone()))
        .or_else(|| {
            args.input
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .ok_or_else(|| ConfigError::MissingRequired("archive name (--name)".to_string()))?;
    let version = args
        .version
        .or_else(|| metadata.as_ref().map(|m| m.version))
        .ok_or_else(|| ConfigError::MissingRequired(format!("--version (no {METADATA_FILE} found)")))?;
    let subversion = args
        .subversion
        .or_else(|| metadata.as_ref().map(|m| m.subversion))
        .ok_or_else(|| {
            ConfigError::MissingRequired(format!("--subversion (no {METADATA_FILE} found)"))
        })?;

    let files = collect_files(&args.input)?;
    let builder = IpfBuilder::new(IpfBuildOptions {
        archive_name: name,
        subversion,
        version,
        compression_level: args.level,
    })?;

    let progress = Progress::new();
    builder
        .add_files(&args.input, &files, pool, &progress)
        .map_err(report_batch)
        .with_context(|| format!("failed to pack {}", args.input.display()))?;

    let count = builder.len();
    builder
        .write_to(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    info!(
        files = count,
        bytes = progress.bytes(),
        output = %args.output.display(),
        "packed"
    );
    Ok(count)
}

/// Regular files below `root`, minus the metadata sidecar.
fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    let sidecar = root.join(METADATA_FILE);
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && entry.path() != sidecar.as_path() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Print a table's header fields and columns.
pub fn ies_info(input: &Path, out: &mut impl Write) -> Result<()> {
    let table = ies::read_table_file(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let header = &table.header;

    writeln!(out, "name: {}", header.name)?;
    writeln!(out, "flags: {} {}", header.flag1, header.flag2)?;
    writeln!(
        out,
        "rows: {}, columns: {} ({} number, {} string)",
        header.row_count, header.column_count, header.number_column_count, header.string_column_count
    )?;
    for column in &table.columns {
        writeln!(
            out,
            "{:>4}  {:<32} {:<32} {:?}",
            column.position, column.key, column.name, column.column_type
        )?;
    }
    Ok(())
}

/// Rebuild every table and report the ones that change or fail to parse.
///
/// Unreadable files and directory entries are reported like broken tables
/// and the remaining files are still checked. Cells are decoded lossily, so
/// a table with invalid UTF-8 text shows up as a rebuild mismatch.
pub fn ies_check(inputs: &[PathBuf], out: &mut impl Write) -> Result<()> {
    let mut checked = 0usize;
    let mut failed = 0usize;
    let mut fail = |out: &mut dyn Write, path: &Path, reason: &dyn std::fmt::Display| {
        failed += 1;
        writeln!(out, "FAIL {}: {reason}", path.display())
    };

    for input in inputs {
        let mut files = Vec::new();
        if input.is_dir() {
            for entry in WalkDir::new(input).sort_by_file_name() {
                match entry {
                    Ok(entry) => {
                        let is_table = entry
                            .path()
                            .extension()
                            .is_some_and(|ext| ext.eq_ignore_ascii_case("ies"));
                        if entry.file_type().is_file() && is_table {
                            files.push(entry.into_path());
                        }
                    }
                    Err(e) => {
                        checked += 1;
                        let path = e.path().unwrap_or(input.as_path()).to_path_buf();
                        fail(out, &path, &e)?;
                    }
                }
            }
        } else {
            files.push(input.clone());
        }

        for file in &files {
            checked += 1;
            let result = std::fs::read(file)
                .map_err(Box::<dyn std::error::Error>::from)
                .and_then(|data| IesTable::verify_round_trip(&data));
            if let Err(e) = result {
                fail(out, file, &e)?;
            }
        }
    }

    writeln!(out, "checked {checked} tables, {failed} failed")?;
    if failed > 0 {
        bail!("{failed} of {checked} tables did not rebuild identically");
    }
    Ok(())
}
