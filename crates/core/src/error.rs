use rusqlite::ffi;

/// Errors raised by core services.
///
/// The first four variants carry a client-facing message; the API layer maps them to status codes
/// without rewording.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A required field is missing or a value is malformed.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    NotFound(String),
    /// A unique key is already taken.
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Store(#[source] rusqlite::Error),
    #[error("migration v{version} failed: {reason}")]
    Migration { version: i64, reason: String },
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to read seed file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

impl From<rusqlite::Error> for CoreError {
    /// Constraint failures become client errors; everything else is a store failure.
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(inner, _) = &err {
            if inner.code == rusqlite::ErrorCode::ConstraintViolation {
                match inner.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        return Self::Conflict("Record already exists.".into());
                    }
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                        return Self::Validation("Referenced record does not exist.".into());
                    }
                    ffi::SQLITE_CONSTRAINT_CHECK | ffi::SQLITE_CONSTRAINT_NOTNULL => {
                        return Self::Validation("Value out of range.".into());
                    }
                    _ => {}
                }
            }
        }
        Self::Store(err)
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
