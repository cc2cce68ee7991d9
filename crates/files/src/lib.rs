//! SkinHub image uploads
//!
//! This crate validates uploaded skin images and stores them under the public static root so
//! they can be served back and referenced from stored predictions.
//!
//! ## Storage Layout
//!
//! ```text
//! <public_root>/
//! └── uploads/
//!     └── images/
//!         └── 3f2a…c9.png    # server-generated name, client extension kept
//! ```
//!
//! Stored paths are returned relative to the public root (`uploads/images/<name>`), which is
//! also the URL path they are served under.
//!
//! ## Example Usage
//!
//! ```no_run
//! use skinhub_files::UploadsService;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let uploads = UploadsService::new(Path::new("public/uploads/images"), "uploads/images");
//! let stored = uploads.store("lesion.png", &std::fs::read("lesion.png")?)?;
//! println!("{}", stored.relative_path);
//! # Ok(())
//! # }
//! ```

mod constants;
mod uploads;

pub use constants::{ALLOWED_EXTENSIONS, MAX_UPLOAD_BYTES};
pub use uploads::{validate_image, StoredImage, UploadsService};

/// Errors that can occur while accepting an upload.
///
/// The display text of the client-side variants is the message returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    #[error("No file uploaded")]
    NoFile,

    /// Content is not a recognised image format
    #[error("File is not an image.")]
    NotAnImage,

    #[error("Sorry, your file is too large.")]
    TooLarge,

    #[error("Sorry, only JPG, JPEG, PNG & GIF files are allowed.")]
    DisallowedExtension,

    /// I/O error occurred while writing or reading
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FilesError {
    /// Whether the error is the caller's fault rather than the server's.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, FilesError::Io(_))
    }
}
