//! Layer discovery and classification.
//!
//! Scans a flat directory of layer images and groups them by part category.
//!
//! ## Directory Structure
//!
//! ```text
//! layers/
//! ├── face_definition.json          # Not an image: fails to decode, skipped
//! ├── face_head1.png                # head #0
//! ├── face_head1.png.import         # Sidecar: ignored by suffix
//! ├── face_head2.png                # head #1
//! ├── face_eyes1.png                # eyes #0
//! ├── face_eyes2.ase_layer_tex.png  # eyes #1 (canonical name face_eyes2.png)
//! └── extra/                        # Subdirectory: ignored
//! ```
//!
//! ## Ordering
//!
//! File names are sorted before loading, so the scan order is stable across
//! platforms. Within a category, images keep scan order; categories keep the
//! order in which they were first seen. That category order is the fallback
//! stacking order when no definition is loaded.
//!
//! ## Deduplication
//!
//! Two files with the same canonical name (file name with the texture marker
//! removed) are the same layer. The later file replaces the earlier one in
//! place, so indices of other images do not shift.
//!
//! ## Failure Modes
//!
//! - Missing or unreadable directory: warning, empty catalog.
//! - File that fails to decode: warning, file skipped. Non-image files in the
//!   directory (notes, the definition, `face-builder.toml`) end up here.
//! - Decodable image whose name has no category token:
//!   [`CatalogError::Naming`]. This is a broken export, not bad data, and is
//!   reported before anything is composed.

use crate::config::FaceConfig;
use crate::imaging::{ImageBackend, RustBackend};
use crate::naming::{self, NamingError};
use crate::types::PartImage;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed layer name {path}: {source}")]
    Naming {
        path: PathBuf,
        #[source]
        source: NamingError,
    },
}

/// How layer file names are filtered and classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogOptions {
    pub token_index: usize,
    pub separator: char,
    pub ignore_suffixes: Vec<String>,
    pub texture_suffix: String,
}

impl CatalogOptions {
    /// Build options from the `[parts]` section of a [`FaceConfig`].
    pub fn from_face_config(config: &FaceConfig) -> Self {
        Self {
            token_index: config.parts.token_index,
            separator: config.parts.separator,
            ignore_suffixes: config.parts.ignore_suffixes.clone(),
            texture_suffix: config.parts.texture_suffix.clone(),
        }
    }

    /// Default options with a different category token position.
    pub fn with_token_index(token_index: usize) -> Self {
        Self {
            token_index,
            ..Self::default()
        }
    }

    fn is_ignored(&self, file_name: &str) -> bool {
        file_name.starts_with('.')
            || self
                .ignore_suffixes
                .iter()
                .any(|suffix| file_name.ends_with(suffix.as_str()))
    }
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self::from_face_config(&FaceConfig::default())
    }
}

#[derive(Debug)]
struct Category {
    key: String,
    images: Vec<PartImage>,
}

/// Layer images grouped by part category.
///
/// Built once, read-only afterwards. `Sync`, so one catalog can feed
/// concurrent compositions.
#[derive(Debug, Default)]
pub struct PartCatalog {
    categories: Vec<Category>,
}

impl PartCatalog {
    /// Scan `dir` with the `image`-crate backend.
    pub fn build(dir: &Path, options: &CatalogOptions) -> Result<Self, CatalogError> {
        Self::build_with_backend(&RustBackend::new(), dir, options)
    }

    /// Scan `dir` with a specific backend (allows testing with mock).
    #[tracing::instrument(skip_all, fields(dir = %dir.display()))]
    pub fn build_with_backend(
        backend: &impl ImageBackend,
        dir: &Path,
        options: &CatalogOptions,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();

        let files = match collect_files(dir, options) {
            Ok(files) => files,
            Err(e) => {
                warn!("Could not open layer directory {}: {e}", dir.display());
                return Ok(catalog);
            }
        };

        // canonical name -> (category slot, image slot)
        let mut seen: HashMap<String, (usize, usize)> = HashMap::new();

        for path in files {
            let file_name = file_name_of(&path);
            let canonical = naming::canonical_name(&file_name, &options.texture_suffix);
            let stem = naming::layer_stem(&canonical);

            // Only decodable files are layers; anything else (notes, the
            // definition file) is skipped before its name is checked.
            let image = match backend.load(&path, &canonical) {
                Ok(image) => image,
                Err(e) => {
                    warn!("Skipping {}: {e}", path.display());
                    continue;
                }
            };

            let parsed = naming::parse_part_name(stem, options.token_index, options.separator)
                .map_err(|source| CatalogError::Naming {
                    path: path.clone(),
                    source,
                })?;

            debug!(
                file = %file_name,
                category = %parsed.category,
                variant = %parsed.variant,
                "Classified layer"
            );

            if let Some(&(cat, idx)) = seen.get(&canonical) {
                debug!(file = %file_name, "Replacing earlier layer {canonical}");
                catalog.categories[cat].images[idx] = image;
                continue;
            }

            let cat = catalog.slot_for(&parsed.category);
            let images = &mut catalog.categories[cat].images;
            images.push(image);
            seen.insert(canonical, (cat, images.len() - 1));
        }

        info!(
            categories = catalog.len(),
            images = catalog.image_count(),
            "Layer catalog built"
        );
        Ok(catalog)
    }

    fn slot_for(&mut self, key: &str) -> usize {
        if let Some(pos) = self.categories.iter().position(|c| c.key == key) {
            return pos;
        }
        self.categories.push(Category {
            key: key.to_string(),
            images: Vec::new(),
        });
        self.categories.len() - 1
    }

    /// Category keys in first-seen scan order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.key.as_str())
    }

    /// Images of a category in scan order. `None` if the category is unknown.
    pub fn images(&self, category: &str) -> Option<&[PartImage]> {
        self.categories
            .iter()
            .find(|c| c.key == category)
            .map(|c| c.images.as_slice())
    }

    /// Image at `index` in `category`, or `None` if either is out of range.
    pub fn get(&self, category: &str, index: usize) -> Option<&PartImage> {
        self.images(category).and_then(|images| images.get(index))
    }

    /// Number of images per category.
    pub fn part_counts(&self) -> BTreeMap<String, usize> {
        self.categories
            .iter()
            .map(|c| (c.key.clone(), c.images.len()))
            .collect()
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Total number of images across categories.
    pub fn image_count(&self) -> usize {
        self.categories.iter().map(|c| c.images.len()).sum()
    }
}

impl<K: Into<String>> FromIterator<(K, PartImage)> for PartCatalog {
    /// Assemble a catalog from already-decoded layers, keeping iteration order.
    fn from_iter<I: IntoIterator<Item = (K, PartImage)>>(iter: I) -> Self {
        let mut catalog = Self::default();
        for (key, image) in iter {
            let key = key.into();
            let cat = catalog.slot_for(&key);
            catalog.categories[cat].images.push(image);
        }
        catalog
    }
}

/// Candidate layer files in `dir`, sorted by name. Subdirectories, hidden
/// files, and sidecars are dropped here.
fn collect_files(dir: &Path, options: &CatalogOptions) -> Result<Vec<PathBuf>, CatalogError> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| !options.is_ignored(&file_name_of(p)))
        .collect();

    files.sort();
    Ok(files)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::*;
    use tempfile::TempDir;

    #[test]
    fn groups_layers_by_category() {
        let tmp = setup_layers(&[
            ("face_head1.png", RED),
            ("face_head2.png", BLUE),
            ("face_eyes1.png", BLUE),
        ]);
        let catalog = PartCatalog::build(tmp.path(), &CatalogOptions::default()).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.image_count(), 3);
        assert_eq!(catalog.images("head").unwrap().len(), 2);
        assert_eq!(catalog.images("eyes").unwrap().len(), 1);
        assert!(catalog.images("nose").is_none());
    }

    #[test]
    fn categories_in_first_seen_sorted_order() {
        let tmp = setup_layers(&[
            ("face_mouth1.png", RED),
            ("face_eyes2.png", RED),
            ("face_head1.png", RED),
            ("face_eyes1.png", RED),
        ]);
        let catalog = PartCatalog::build(tmp.path(), &CatalogOptions::default()).unwrap();

        // Sorted: face_eyes1, face_eyes2, face_head1, face_mouth1
        assert_eq!(category_keys(&catalog), vec!["eyes", "head", "mouth"]);
        assert_eq!(
            image_names(&catalog, "eyes"),
            vec!["face_eyes1.png", "face_eyes2.png"]
        );
    }

    #[test]
    fn part_counts_sum_to_loaded_files() {
        let tmp = setup_layers(&[
            ("face_head1.png", RED),
            ("face_head2.png", RED),
            ("face_hair1.png", RED),
        ]);
        fs::write(tmp.path().join("face_head1.png.import"), "[remap]").unwrap();
        fs::write(tmp.path().join("face_nose1.png"), "not an image").unwrap();

        let catalog = PartCatalog::build(tmp.path(), &CatalogOptions::default()).unwrap();
        let counts = catalog.part_counts();

        assert_eq!(counts.get("head"), Some(&2));
        assert_eq!(counts.get("hair"), Some(&1));
        assert_eq!(counts.get("nose"), None);
        assert_eq!(counts.values().sum::<usize>(), 3);
    }

    #[test]
    fn sidecars_are_never_loaded() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "face_head1.png");
        touch(tmp.path(), "face_head1.png.import");
        touch(tmp.path(), ".DS_Store");

        let backend =
            MockBackend::new().with_layer("face_head1.png", solid("x", 2, 2, RED));
        PartCatalog::build_with_backend(&backend, tmp.path(), &CatalogOptions::default())
            .unwrap();

        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Load("face_head1.png".into())]
        );
    }

    #[test]
    fn subdirectories_ignored() {
        let tmp = setup_layers(&[("face_head1.png", RED)]);
        fs::create_dir_all(tmp.path().join("face_eyes1.png")).unwrap();

        let catalog = PartCatalog::build(tmp.path(), &CatalogOptions::default()).unwrap();
        assert_eq!(category_keys(&catalog), vec!["head"]);
    }

    #[test]
    fn unloadable_file_is_skipped() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "face_head1.png");
        touch(tmp.path(), "face_head2.png");

        let backend =
            MockBackend::new().with_layer("face_head2.png", solid("x", 2, 2, RED));
        let catalog =
            PartCatalog::build_with_backend(&backend, tmp.path(), &CatalogOptions::default())
                .unwrap();

        assert_eq!(image_names(&catalog, "head"), vec!["face_head2.png"]);
    }

    #[test]
    fn missing_directory_gives_empty_catalog() {
        let catalog =
            PartCatalog::build(Path::new("/nonexistent/layers"), &CatalogOptions::default())
                .unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.part_counts().is_empty());
    }

    #[test]
    fn texture_marker_stripped_and_deduplicated() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "face_eyes1.ase_layer_tex.png");
        touch(tmp.path(), "face_eyes1.png");
        touch(tmp.path(), "face_eyes2.png");

        let backend = MockBackend::new()
            .with_layer("face_eyes1.ase_layer_tex.png", solid("x", 1, 1, RED))
            .with_layer("face_eyes1.png", solid("x", 1, 1, BLUE))
            .with_layer("face_eyes2.png", solid("x", 1, 1, RED));
        let catalog =
            PartCatalog::build_with_backend(&backend, tmp.path(), &CatalogOptions::default())
                .unwrap();

        // Sorted: face_eyes1.ase_layer_tex.png, face_eyes1.png, face_eyes2.png
        let eyes = catalog.images("eyes").unwrap();
        assert_eq!(eyes.len(), 2);
        assert_eq!(eyes[0].name(), "face_eyes1.png");
        assert_eq!(eyes[0].pixel(0, 0), BLUE);
        assert_eq!(eyes[1].name(), "face_eyes2.png");
    }

    #[test]
    fn malformed_name_is_error() {
        let tmp = setup_layers(&[("face_head1.png", RED), ("portrait.png", RED)]);

        let result = PartCatalog::build(tmp.path(), &CatalogOptions::default());
        match result {
            Err(CatalogError::Naming { path, source }) => {
                assert!(path.ends_with("portrait.png"));
                assert!(matches!(source, NamingError::MissingToken { .. }));
            }
            other => panic!("expected naming error, got {other:?}"),
        }
    }

    #[test]
    fn custom_token_index() {
        let tmp = setup_layers(&[("npc_v2_beard3.png", RED), ("npc_v2_head1.png", RED)]);
        let catalog =
            PartCatalog::build(tmp.path(), &CatalogOptions::with_token_index(2)).unwrap();
        assert_eq!(category_keys(&catalog), vec!["beard", "head"]);
    }

    #[test]
    fn extra_ignore_suffixes() {
        let tmp = setup_layers(&[("face_head1.png", RED)]);
        fs::write(tmp.path().join("face_head1.png.meta"), "guid: 1").unwrap();

        let options = CatalogOptions {
            ignore_suffixes: vec![".import".into(), ".meta".into()],
            ..CatalogOptions::default()
        };
        let catalog = PartCatalog::build(tmp.path(), &options).unwrap();
        assert_eq!(catalog.image_count(), 1);
    }

    #[test]
    fn get_checks_bounds() {
        let catalog: PartCatalog = [("head", solid("face_head1.png", 1, 1, RED))]
            .into_iter()
            .collect();
        assert!(catalog.get("head", 0).is_some());
        assert!(catalog.get("head", 1).is_none());
        assert!(catalog.get("eyes", 0).is_none());
    }

    #[test]
    fn options_from_config() {
        let mut config = FaceConfig::default();
        config.parts.token_index = 3;
        config.parts.separator = '-';
        let options = CatalogOptions::from_face_config(&config);
        assert_eq!(options.token_index, 3);
        assert_eq!(options.separator, '-');
        assert_eq!(options.texture_suffix, ".ase_layer_tex");
    }
}
