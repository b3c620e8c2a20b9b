use bitcoin::Network;
use log::LevelFilter;

const DB_FILENAME: &str = "operations.db3";
const LOG_FILENAME: &str = "logs.txt";

#[derive(Debug, Clone)]
pub struct Config {
    pub network: Network,
    /// Directory where the database and the log file are kept. Must exist.
    pub local_persistence_path: String,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn db_path(&self) -> String {
        format!("{}/{DB_FILENAME}", self.local_persistence_path)
    }

    pub fn log_file_path(&self) -> String {
        format!("{}/{LOG_FILENAME}", self.local_persistence_path)
    }
}
