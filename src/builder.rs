//! The face-building entry point.
//!
//! [`FaceBuilder`] owns a scanned [`PartCatalog`] and the optional stacking
//! order, and turns selections into composited portraits:
//!
//! ```no_run
//! use face_builder::FaceBuilder;
//! use rand::SeedableRng;
//!
//! let mut builder = FaceBuilder::new("layers", "layers/face_definition.json", 1)?;
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//!
//! if let Some(face) = builder.build_random_face(&mut rng)? {
//!     println!("{}x{} from {:?}", face.width(), face.height(), builder.current_selection());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The catalog is scanned once in the constructor; build a new `FaceBuilder`
//! to pick up changed files. The last random selection is kept so callers can
//! read it back. For concurrent random builds, share [`FaceBuilder::composer`]
//! instead, which returns each selection by value.

use crate::catalog::{CatalogError, CatalogOptions, PartCatalog};
use crate::compose::FaceComposer;
use crate::config::{ConfigError, FaceConfig};
use crate::definition::{self, OrderSpec};
use crate::imaging::{BlendError, CompositeImage, ImageBackend, RustBackend, composite};
use crate::types::Selection;
use rand::Rng;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

pub struct FaceBuilder {
    catalog: PartCatalog,
    order: Option<OrderSpec>,
    selection: Selection,
}

impl FaceBuilder {
    /// Scan `layers_dir` and load the definition at `definition_path`.
    ///
    /// A missing directory or definition is not an error (see
    /// [`PartCatalog`] and [`definition::load_definition`]). A layer whose
    /// name has no token at `part_token_index` is.
    pub fn new(
        layers_dir: impl AsRef<Path>,
        definition_path: impl AsRef<Path>,
        part_token_index: usize,
    ) -> Result<Self, BuildError> {
        Self::with_backend(
            &RustBackend::new(),
            layers_dir.as_ref(),
            definition_path.as_ref(),
            &CatalogOptions::with_token_index(part_token_index),
        )
    }

    /// Build from `face-builder.toml` settings; the definition path in the
    /// config is resolved against `layers_dir`.
    pub fn from_config(layers_dir: &Path, config: &FaceConfig) -> Result<Self, BuildError> {
        Self::with_backend(
            &RustBackend::new(),
            layers_dir,
            &layers_dir.join(&config.definition),
            &CatalogOptions::from_face_config(config),
        )
    }

    /// Load `face-builder.toml` from `layers_dir` (stock defaults if absent)
    /// and build from it.
    pub fn open(layers_dir: &Path) -> Result<Self, BuildError> {
        let config = crate::config::load_config(layers_dir)?;
        Self::from_config(layers_dir, &config)
    }

    /// Build with a specific backend (allows testing with mock).
    pub fn with_backend(
        backend: &impl ImageBackend,
        layers_dir: &Path,
        definition_path: &Path,
        options: &CatalogOptions,
    ) -> Result<Self, BuildError> {
        let catalog = PartCatalog::build_with_backend(backend, layers_dir, options)?;
        let order = definition::load_definition(definition_path);
        Ok(Self::from_parts(catalog, order))
    }

    /// Assemble from an already-built catalog and order.
    pub fn from_parts(catalog: PartCatalog, order: Option<OrderSpec>) -> Self {
        Self {
            catalog,
            order,
            selection: Selection::new(),
        }
    }

    /// Stateless selector over this builder's catalog and order.
    pub fn composer(&self) -> FaceComposer<'_> {
        FaceComposer::new(&self.catalog, self.order.as_ref())
    }

    /// Composite one random layer per category.
    ///
    /// Replaces the recorded selection on every call, including when the
    /// result is `None` (nothing to paint) or the layers fail to blend.
    pub fn build_random_face<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<Option<CompositeImage>, BlendError> {
        let face = FaceComposer::new(&self.catalog, self.order.as_ref()).build_random(rng);
        let image = composite(&face.stack);
        self.selection = face.selection;
        image
    }

    /// Indices chosen by the last [`build_random_face`](Self::build_random_face).
    pub fn current_selection(&self) -> &Selection {
        &self.selection
    }

    /// Composite the layers named by `selection`, in definition order.
    ///
    /// Returns `Ok(None)` when nothing is selected, which includes every call
    /// made without a definition. Does not touch the recorded selection.
    pub fn build_face_by_indices(
        &self,
        selection: &Selection,
    ) -> Result<Option<CompositeImage>, BlendError> {
        composite(&self.composer().build_by_indices(selection))
    }

    /// Number of images per category.
    pub fn part_counts(&self) -> BTreeMap<String, usize> {
        self.catalog.part_counts()
    }

    pub fn catalog(&self) -> &PartCatalog {
        &self.catalog
    }

    pub fn order(&self) -> Option<&OrderSpec> {
        self.order.as_ref()
    }
}
