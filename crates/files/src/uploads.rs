//! Upload validation and storage.
//!
//! Checks run in a fixed order so the caller always gets the most fundamental complaint first:
//! content sniffing, then size, then the client-supplied extension. Stored files are named after
//! the sniffed type.

use crate::constants::{ALLOWED_EXTENSIONS, ALLOWED_MEDIA_TYPES, MAX_UPLOAD_BYTES};
use crate::FilesError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// An accepted upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Path relative to the public root, e.g. `uploads/images/<name>.png`.
    pub relative_path: String,
    /// Absolute location on disk.
    pub absolute_path: PathBuf,
    /// MIME type reported by content sniffing.
    pub media_type: &'static str,
    pub size_bytes: usize,
}

/// Stores validated images in a single uploads directory.
#[derive(Debug, Clone)]
pub struct UploadsService {
    uploads_dir: PathBuf,
    relative_prefix: String,
}

impl UploadsService {
    /// Creates a service writing into `uploads_dir`.
    ///
    /// `relative_prefix` is how that directory is addressed from the public root; it prefixes
    /// every returned `relative_path`. The directory itself is created on first store.
    pub fn new(uploads_dir: &Path, relative_prefix: &str) -> Self {
        Self {
            uploads_dir: uploads_dir.to_path_buf(),
            relative_prefix: relative_prefix.trim_end_matches('/').to_owned(),
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Validates `bytes` as an image upload and stores it under a fresh name.
    ///
    /// # Errors
    ///
    /// - `FilesError::NotAnImage` if the content is not a recognised image
    /// - `FilesError::TooLarge` if it exceeds [`MAX_UPLOAD_BYTES`]
    /// - `FilesError::DisallowedExtension` if the client name or sniffed type is outside the
    ///   JPEG/PNG/GIF whitelist
    /// - `FilesError::Io` if the directory or file cannot be written
    pub fn store(&self, original_filename: &str, bytes: &[u8]) -> Result<StoredImage, FilesError> {
        let kind = check_image(original_filename, bytes)?;
        let media_type = kind.mime_type();
        let extension = stored_extension(kind);

        fs::create_dir_all(&self.uploads_dir).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create uploads directory {}: {}",
                    self.uploads_dir.display(),
                    e
                ),
            ))
        })?;

        let file_name = format!("{}.{}", uuid::Uuid::new_v4().simple(), extension);
        let absolute_path = self.uploads_dir.join(&file_name);

        // create_new: a name collision must fail rather than overwrite another upload.
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&absolute_path)?;
        file.write_all(bytes).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write file to {}: {}", absolute_path.display(), e),
            ))
        })?;

        tracing::info!(file = %file_name, size_bytes = bytes.len(), "image stored");

        Ok(StoredImage {
            relative_path: format!("{}/{}", self.relative_prefix, file_name),
            absolute_path,
            media_type,
            size_bytes: bytes.len(),
        })
    }
}

/// Runs the upload checks without storing anything and returns the sniffed MIME type.
///
/// Used for images that are forwarded elsewhere instead of kept.
pub fn validate_image(
    original_filename: &str,
    bytes: &[u8],
) -> Result<&'static str, FilesError> {
    check_image(original_filename, bytes).map(|kind| kind.mime_type())
}

fn check_image(original_filename: &str, bytes: &[u8]) -> Result<infer::Type, FilesError> {
    let kind = infer::get(bytes)
        .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
        .ok_or(FilesError::NotAnImage)?;

    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(FilesError::TooLarge);
    }

    match extension_of(original_filename) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => return Err(FilesError::DisallowedExtension),
    }

    if !ALLOWED_MEDIA_TYPES.contains(&kind.mime_type()) {
        return Err(FilesError::DisallowedExtension);
    }

    Ok(kind)
}

/// Extension for the stored file, taken from the sniffed content rather than the client name.
fn stored_extension(kind: infer::Type) -> &'static str {
    match kind.extension() {
        "jpeg" => "jpg",
        ext => ext,
    }
}

/// Lower-cased extension of the final path component, if any.
fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_ascii_lowercase)
}
