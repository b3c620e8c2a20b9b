use crate::errors::Result;
use log::LevelFilter;
use perro::MapToError;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::OpenOptions;
use std::sync::Once;

static INIT_LOGGER_ONCE: Once = Once::new();

fn init_logger(min_level: LevelFilter, log_file_path: &str) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .map_to_invalid_input("Invalid log file path")?;
    let config = ConfigBuilder::new()
        .add_filter_ignore_str("rusqlite_migration")
        .build();
    WriteLogger::init(min_level, config, log_file)
        .map_to_permanent_failure("Failed to set the global logger")
}

/// Call the function once before instantiating the library to get logs.
/// Subsequent calls will have no effect.
pub fn init_logger_once(min_level: LevelFilter, log_file_path: &str) -> Result<()> {
    let mut result = Ok(());
    INIT_LOGGER_ONCE.call_once(|| result = init_logger(min_level, log_file_path));
    result
}
