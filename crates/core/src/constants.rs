//! Shared constants for SkinHub core.

/// Default SQLite database file, relative to the working directory.
pub const DEFAULT_DATABASE_PATH: &str = "skinhub.db";

/// Default public static root.
pub const DEFAULT_PUBLIC_DIR: &str = "public";

/// Image uploads live under this path inside the public root. Stored prediction paths are
/// relative to the public root and therefore start with this prefix.
pub const UPLOADS_RELATIVE_DIR: &str = "uploads/images";

/// PBKDF2-SHA256 iteration count used when none is configured.
pub const DEFAULT_PASSWORD_HASH_ITERATIONS: u32 = 600_000;

/// Disease used when a heatmap request names none.
pub const DEFAULT_HEATMAP_DISEASE: &str = "Acne";

pub const INCOMPLETE_DATA: &str = "Incomplete data.";
