use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "LabIS";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Overrides the data directory (counter database location).
pub const DATA_DIR_ENV: &str = "LIS_DATA_DIR";

/// Overrides the SQLite busy timeout, in milliseconds.
pub const BUSY_TIMEOUT_ENV: &str = "LIS_BUSY_TIMEOUT_MS";

/// Default time a writer waits on a locked counter database.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// File name of the counter database inside the data directory.
pub const COUNTER_DB_FILE: &str = "counters.db";

/// Get the application data directory.
///
/// `$LIS_DATA_DIR` when set, otherwise `~/LabIS/`. Falls back to the
/// working directory when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the SQLite database holding the counter records.
pub fn counter_db_path() -> PathBuf {
    app_data_dir().join(COUNTER_DB_FILE)
}

/// Busy timeout applied to every counter store connection.
pub fn busy_timeout() -> Duration {
    let ms = std::env::var(BUSY_TIMEOUT_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_BUSY_TIMEOUT_MS);
    Duration::from_millis(ms)
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "lis_ids=info,warn"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_db_under_app_data() {
        let db = counter_db_path();
        let app = app_data_dir();
        assert!(db.starts_with(app));
        assert!(db.ends_with(COUNTER_DB_FILE));
    }

    #[test]
    fn app_name_is_labis() {
        assert_eq!(APP_NAME, "LabIS");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }

    #[test]
    fn default_busy_timeout_is_five_seconds() {
        if std::env::var_os(BUSY_TIMEOUT_ENV).is_none() {
            assert_eq!(busy_timeout(), Duration::from_millis(5_000));
        }
    }

    #[test]
    fn default_filter_targets_crate() {
        assert!(default_log_filter().starts_with("lis_ids="));
    }
}
