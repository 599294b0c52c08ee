//! Image I/O backend trait and shared error type.
//!
//! The [`ImageBackend`] trait is the seam between the face pipeline and the
//! on-disk image codecs. The catalog only ever calls [`ImageBackend::load`];
//! the CLI calls [`ImageBackend::save`] to write the finished portrait.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use a mock that serves layers from memory.

use super::blend::CompositeImage;
use crate::types::PartImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Loads layer images and writes composites.
///
/// `Sync` so one backend can serve parallel catalog builds.
pub trait ImageBackend: Sync {
    /// Decode the file at `path` into a layer. `name` is the canonical asset
    /// name recorded on the returned [`PartImage`].
    fn load(&self, path: &Path, name: &str) -> Result<PartImage, BackendError>;

    /// Encode a composite to `path`, format chosen from the extension.
    fn save(&self, image: &CompositeImage, path: &Path) -> Result<(), BackendError>;
}
