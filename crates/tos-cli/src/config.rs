//! Command-line configuration.
//!
//! Options come from CLI arguments, with environment variable fallbacks for
//! the settings that are usually fixed per machine:
//!
//! - `TOS_THREADS`: worker pool size for pack and unpack
//! - `TOS_COMPRESSION_LEVEL`: DEFLATE level for pack
//!
//! Logging is controlled by `RUST_LOG`, or by `-v`/`-q`.

use crate::error::ConfigError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tos_formats::ipf::{DEFAULT_COMPRESSION_LEVEL, MAX_COMPRESSION_LEVEL, WorkerPool};

/// Top-level command line.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tos",
    about = "Pack and unpack Tree of Savior IPF archives and IES tables",
    version
)]
pub struct Cli {
    /// Worker threads for parallel work (default: half the cores)
    #[arg(short, long, global = true, env = "TOS_THREADS")]
    pub threads: Option<usize>,

    /// Log debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub const fn default_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    /// Worker pool from `--threads`, clamped to the hardware.
    pub fn worker_pool(&self) -> Result<WorkerPool, ConfigError> {
        match self.threads {
            Some(0) => Err(ConfigError::InvalidValue {
                name: "threads",
                reason: "must be at least 1".to_string(),
            }),
            Some(threads) => Ok(WorkerPool::new(threads)),
            None => Ok(WorkerPool::default()),
        }
    }
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// IPF archive commands
    #[command(subcommand)]
    Ipf(IpfCommand),

    /// IES table commands
    #[command(subcommand)]
    Ies(IesCommand),
}

/// IPF archive commands.
#[derive(Debug, Clone, Subcommand)]
pub enum IpfCommand {
    /// List the elements of an archive
    List {
        /// Archive file
        input: PathBuf,
    },

    /// Extract an archive into a directory
    Unpack {
        /// Archive file
        input: PathBuf,

        /// Output directory; elements go to `<output>/<archive name>/`
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Build an archive from a directory
    Pack(PackArgs),
}

/// Options of `ipf pack`.
#[derive(Debug, Clone, Args)]
pub struct PackArgs {
    /// Directory to pack
    pub input: PathBuf,

    /// Archive file to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Archive name recorded on each element (default: from `.ipf_data`)
    #[arg(long)]
    pub name: Option<String>,

    /// Patch version (default: from `.ipf_data`)
    #[arg(long)]
    pub version: Option<u32>,

    /// Patch subversion (default: from `.ipf_data`)
    #[arg(long)]
    pub subversion: Option<u32>,

    /// DEFLATE level, 0 stores raw
    #[arg(
        short = 'l',
        long,
        env = "TOS_COMPRESSION_LEVEL",
        default_value_t = DEFAULT_COMPRESSION_LEVEL
    )]
    pub level: u32,
}

impl PackArgs {
    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - the compression level is above 9
    /// - the input is not a directory
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.level > MAX_COMPRESSION_LEVEL {
            return Err(ConfigError::InvalidValue {
                name: "level",
                reason: format!("{} is outside 0..={MAX_COMPRESSION_LEVEL}", self.level),
            });
        }
        if !self.input.is_dir() {
            return Err(ConfigError::InvalidValue {
                name: "input",
                reason: format!("{} is not a directory", self.input.display()),
            });
        }
        Ok(())
    }
}

/// IES table commands.
#[derive(Debug, Clone, Subcommand)]
pub enum IesCommand {
    /// Print the header and columns of a table
    Info {
        /// Table file
        input: PathBuf,
    },

    /// Check that tables rebuild to identical bytes
    ///
    /// Text is decoded lossily, so cells with invalid UTF-8 are reported as
    /// rebuild mismatches.
    Check {
        /// Table files or directories to search for `.ies` files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}
