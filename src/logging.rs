//! Log setup for the driver binary.

use clap::ValueEnum;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;

/// Verbosity levels selectable on the command line.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum LogLevel {
    /// No log output.
    Off,
    /// Errors only.
    Error,
    /// Errors and warnings.
    Warn,
    /// Membership changes and stored files.
    Info,
    /// Routing decisions.
    Debug,
    /// Everything, including finger rebuilds.
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(val: LogLevel) -> Self {
        match val {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Install a stderr subscriber at the given level.
pub fn init_logging(level: LevelFilter) {
    let subscriber = Registry::default().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(level),
    );

    // Ignore errors returned by set_global_default.
    let _ = tracing::subscriber::set_global_default(subscriber);
}
