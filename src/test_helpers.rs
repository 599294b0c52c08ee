//! Shared test utilities for the face-builder test suite.
//!
//! Provides fixture writers for layer directories and lookup helpers for
//! catalogs and stacks.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_layers(&[("face_head1.png", RED), ("face_eyes1.png", BLUE)]);
//! let catalog = PartCatalog::build(tmp.path(), &CatalogOptions::default()).unwrap();
//!
//! assert_eq!(category_keys(&catalog), vec!["eyes", "head"]);
//! assert_eq!(image_names(&catalog, "head"), vec!["face_head1.png"]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::catalog::PartCatalog;
use crate::types::PartImage;

pub const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
pub const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
pub const HALF_BLUE: [f32; 4] = [0.0, 0.0, 1.0, 0.5];

/// Side length of fixture layers written by [`setup_layers`].
pub const FIXTURE_SIZE: u32 = 4;

// =========================================================================
// Fixture setup
// =========================================================================

/// Write solid-color PNG layers into a fresh temp directory.
pub fn setup_layers(layers: &[(&str, [f32; 4])]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (file_name, rgba) in layers {
        write_layer(tmp.path(), file_name, FIXTURE_SIZE, FIXTURE_SIZE, *rgba);
    }
    tmp
}

/// Write a solid-color PNG layer.
pub fn write_layer(dir: &Path, file_name: &str, width: u32, height: u32, rgba: [f32; 4]) {
    let px = rgba.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    image::RgbaImage::from_pixel(width, height, image::Rgba(px))
        .save_with_format(dir.join(file_name), image::ImageFormat::Png)
        .unwrap();
}

/// Create an empty file. Only useful with a mock backend.
pub fn touch(dir: &Path, file_name: &str) {
    std::fs::write(dir.join(file_name), b"").unwrap();
}

/// Solid-color in-memory layer.
pub fn solid(name: &str, width: u32, height: u32, rgba: [f32; 4]) -> PartImage {
    PartImage::filled(name, width, height, rgba)
}

// =========================================================================
// Catalog and stack lookups
// =========================================================================

/// All category keys in catalog order.
pub fn category_keys(catalog: &PartCatalog) -> Vec<&str> {
    catalog.categories().collect()
}

/// Canonical names of a category's images. Panics if the category is missing.
pub fn image_names<'a>(catalog: &'a PartCatalog, category: &str) -> Vec<&'a str> {
    catalog
        .images(category)
        .unwrap_or_else(|| {
            let keys = category_keys(catalog);
            panic!("category '{category}' not found. Available: {keys:?}")
        })
        .iter()
        .map(|i| i.name())
        .collect()
}

/// Canonical names of a composition stack, bottom to top.
pub fn stack_names<'a>(stack: &[&'a PartImage]) -> Vec<&'a str> {
    stack.iter().map(|i| i.name()).collect()
}
