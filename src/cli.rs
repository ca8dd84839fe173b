//! Command-line interface of the driver binary.

use std::path::PathBuf;

use clap::Parser;

use crate::logging::LogLevel;

/// Chord-style ring DHT simulator.
#[derive(Parser, Debug)]
#[command(about, version)]
pub struct Cli {
    /// Verbosity of the stderr log.
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// TOML configuration file; the flags below override it.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Identifier-space width in bits (1-31).
    #[arg(long, short = 'b')]
    pub bits: Option<u8>,

    /// B-tree order of the per-machine file indexes (3-100).
    #[arg(long, short = 'o')]
    pub order: Option<usize>,

    /// Comma-separated initial machine ids.
    #[arg(long, short = 'm', value_delimiter = ',')]
    pub machines: Vec<u32>,
}
