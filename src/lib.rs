//! # Face Builder
//!
//! Procedural character portraits from layered part images. Every layer in a
//! directory is one variant of one part category (head, eyes, hair, ...). A
//! face takes one variant per category and paints them bottom to top with
//! source-over alpha blending.
//!
//! # Architecture: Scan, Select, Blend
//!
//! ```text
//! 1. Scan     layers/  →  PartCatalog   (files → categorized images)
//! 2. Select   catalog  →  layer stack   (random or explicit indices, in stacking order)
//! 3. Blend    stack    →  CompositeImage
//! ```
//!
//! Scanning happens once; selection and blending are pure functions over the
//! read-only catalog, so they can run concurrently and be tested without
//! touching the filesystem. [`FaceBuilder`] ties the three together.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`builder`] | [`FaceBuilder`] entry point: scan once, build random or explicit faces |
//! | [`catalog`] | Directory scan, sidecar filtering, texture-marker dedup, classification |
//! | [`compose`] | Stacking order and per-category selection |
//! | [`definition`] | Optional JSON stacking-order file |
//! | [`naming`] | `prefix_category<N>` file name convention |
//! | [`imaging`] | Image load/save backend and the source-over blender |
//! | [`config`] | `face-builder.toml` loading, merging, and validation |
//! | [`types`] | Shared `PartImage` and `Selection` |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## File Names Are the Schema
//!
//! A layer's category comes from a token of its file name
//! (`face_eyes2.png` → `eyes`). Adding a variant is dropping a file in the
//! directory; there is no manifest to keep in sync. A file that decodes as an
//! image but has no category token is an export mistake and fails the scan.
//!
//! ## Optional Stacking Order
//!
//! The definition file only lists categories bottom to top. Without it random
//! faces still work, stacking categories in the order the sorted scan first
//! met them. Explicit selections need a real order and come out empty.
//!
//! ## Straight-Alpha `f32` Blending
//!
//! Layers are decoded to normalized `f32` RGBA and blended with the standard
//! straight-alpha source-over operator. Keeping full precision through the
//! stack means a face of many semi-transparent layers is quantized once, on
//! save, instead of once per layer.

pub mod builder;
pub mod catalog;
pub mod compose;
pub mod config;
pub mod definition;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use builder::{BuildError, FaceBuilder};
pub use catalog::{CatalogError, CatalogOptions, PartCatalog};
pub use compose::{FaceComposer, RandomFace};
pub use definition::OrderSpec;
pub use imaging::{BlendError, CompositeImage};
pub use types::{PartImage, Selection};
