//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Request handlers never read environment variables; they receive
//! an `Arc<CoreConfig>` instead.

use crate::constants::UPLOADS_RELATIVE_DIR;
use crate::db;
use crate::error::{CoreError, CoreResult};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    database_path: PathBuf,
    public_dir: PathBuf,
    password_hash_iterations: u32,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if `password_hash_iterations` is zero.
    pub fn new(
        database_path: PathBuf,
        public_dir: PathBuf,
        password_hash_iterations: u32,
    ) -> CoreResult<Self> {
        if password_hash_iterations == 0 {
            return Err(CoreError::validation(
                "password_hash_iterations must be greater than zero",
            ));
        }

        Ok(Self {
            database_path,
            public_dir,
            password_hash_iterations,
        })
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    /// Directory that receives uploaded images.
    pub fn uploads_dir(&self) -> PathBuf {
        self.public_dir.join(UPLOADS_RELATIVE_DIR)
    }

    pub fn password_hash_iterations(&self) -> u32 {
        self.password_hash_iterations
    }

    /// Opens a fresh store connection with migrations applied.
    pub fn open_db(&self) -> CoreResult<Connection> {
        db::open_database(&self.database_path)
    }
}

/// Parse the password hash cost from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns `default`.
pub fn iterations_from_env_value(value: Option<String>, default: u32) -> CoreResult<u32> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(default),
        Some(v) => v.parse::<u32>().map_err(|_| {
            CoreError::validation(format!(
                "SKINHUB_PASSWORD_HASH_ITERATIONS must be a positive integer, got {v:?}"
            ))
        }),
    }
}

/// Parse a boolean flag such as `SKINHUB_EXPOSE_ERROR_DETAILS`.
///
/// `1`, `true`, `yes` and `on` (any case) are true; anything else, including absence, is false.
pub fn flag_from_env_value(value: Option<String>) -> bool {
    value
        .map(|v| {
            matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_iterations() {
        let err = CoreConfig::new("db".into(), "public".into(), 0).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn uploads_dir_is_under_public_root() {
        let cfg = CoreConfig::new("db".into(), "/srv/public".into(), 10).unwrap();
        assert_eq!(cfg.uploads_dir(), PathBuf::from("/srv/public/uploads/images"));
    }

    #[test]
    fn iterations_default_when_blank() {
        assert_eq!(iterations_from_env_value(None, 42).unwrap(), 42);
        assert_eq!(iterations_from_env_value(Some("  ".into()), 42).unwrap(), 42);
        assert_eq!(iterations_from_env_value(Some("1000".into()), 42).unwrap(), 1000);
        assert!(iterations_from_env_value(Some("lots".into()), 42).is_err());
    }

    #[test]
    fn flag_parsing() {
        assert!(flag_from_env_value(Some("true".into())));
        assert!(flag_from_env_value(Some(" YES ".into())));
        assert!(flag_from_env_value(Some("1".into())));
        assert!(!flag_from_env_value(Some("0".into())));
        assert!(!flag_from_env_value(None));
    }
}
