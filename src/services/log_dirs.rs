//! Log file locations.

use std::path::PathBuf;

/// Directory for application data, created on demand.
fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("vantage")
}

/// Default diagnostics log path. Falls back to the temp dir when the data
/// directory cannot be created.
pub fn default_log_path() -> PathBuf {
    let logs = data_dir().join("logs");
    if std::fs::create_dir_all(&logs).is_err() {
        return std::env::temp_dir().join("vantage.log");
    }
    logs.join("vantage.log")
}
