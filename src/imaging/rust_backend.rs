//! `image`-crate backend for loading layers and writing composites.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, TIFF, WebP) | `image::ImageReader` with content sniffing |
//! | Normalize | `DynamicImage::to_rgba32f` |
//! | Encode → PNG | `DynamicImage::to_rgba8` + `save_with_format` |
//!
//! Layers are decoded by content, not extension, so an export tool that
//! appends its own suffixes (`head1.png.ase_layer_tex`) still loads.

use super::backend::{BackendError, ImageBackend};
use super::blend::CompositeImage;
use crate::types::PartImage;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;

/// Output formats the composite can be written as, by extension.
const OUTPUT_FORMATS: &[(&str, ImageFormat)] = &[("png", ImageFormat::Png)];

/// Returns the set of extensions a composite can be saved as.
pub fn supported_output_extensions() -> Vec<&'static str> {
    OUTPUT_FORMATS.iter().map(|(ext, _)| *ext).collect()
}

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

fn output_format(path: &Path) -> Result<ImageFormat, BackendError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    OUTPUT_FORMATS
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, format)| *format)
        .ok_or_else(|| {
            BackendError::ProcessingFailed(format!("Unsupported output format: {}", ext))
        })
}

impl ImageBackend for RustBackend {
    fn load(&self, path: &Path, name: &str) -> Result<PartImage, BackendError> {
        let img = decode(path)?;
        Ok(PartImage::from_dynamic(name, &img))
    }

    fn save(&self, image: &CompositeImage, path: &Path) -> Result<(), BackendError> {
        let format = output_format(path)?;
        image
            .to_rgba8()
            .save_with_format(path, format)
            .map_err(|e| BackendError::ProcessingFailed(format!("Encode failed: {}", e)))
    }
}
