use chrono::{DateTime, Utc};
use log::{log, Level};
use std::time::SystemTime;

pub(crate) fn to_db_time(time: SystemTime) -> DateTime<Utc> {
    time.into()
}

pub(crate) fn from_db_time(time: DateTime<Utc>) -> SystemTime {
    SystemTime::from(time)
}

pub(crate) trait LogIgnoreError {
    fn log_ignore_error(self, level: Level, message: &str);
}

impl<T, E: std::fmt::Display> LogIgnoreError for Result<T, E> {
    fn log_ignore_error(self, level: Level, message: &str) {
        if let Err(e) = self {
            log!(level, "{message}: {e}")
        }
    }
}
