mod config;
pub mod database;

pub use config::{Config, FeedbackConfig, TaskTiming, VerifyConfig};
pub use database::Database;

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns the data directory, creating it if needed.
///
/// `COGASSESS_DATA_DIR` wins when set. Otherwise `~/.config/cogassess[-dev]/`
/// depending on `COGASSESS_ENV` (set it to `dev` for a development copy).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("COGASSESS_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("COGASSESS_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("cogassess-dev")
            } else {
                base_dir.join("cogassess")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(StorageError::DataDir)?;
    Ok(dir)
}
