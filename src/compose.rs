//! Part selection: which layer of each category goes into a face, and in
//! what order.
//!
//! A [`FaceComposer`] borrows a catalog and an optional stacking order and
//! holds no other state. Every call returns its own stack (and, for random
//! builds, its own [`Selection`]), so one composer can be used from many
//! threads at once.
//!
//! ## Stacking order
//!
//! | Build | With definition | Without definition |
//! |---|---|---|
//! | random | definition order | catalog order (first seen) |
//! | by indices | definition order | empty stack |
//!
//! Categories named in the definition but absent from the catalog, or present
//! with zero images, contribute nothing. An index outside a category's range
//! is skipped the same way.

use crate::catalog::PartCatalog;
use crate::definition::OrderSpec;
use crate::types::{PartImage, Selection};
use rand::Rng;
use tracing::debug;

/// Result of a random build: the layers to paint and the indices chosen.
#[derive(Debug, Clone)]
pub struct RandomFace<'a> {
    /// Layers bottom to top.
    pub stack: Vec<&'a PartImage>,
    /// Chosen index per category that contributed a layer.
    pub selection: Selection,
}

/// Selects layers from a catalog.
#[derive(Debug, Clone, Copy)]
pub struct FaceComposer<'a> {
    catalog: &'a PartCatalog,
    order: Option<&'a OrderSpec>,
}

impl<'a> FaceComposer<'a> {
    pub fn new(catalog: &'a PartCatalog, order: Option<&'a OrderSpec>) -> Self {
        Self { catalog, order }
    }

    /// Category keys in painting order for random builds.
    pub fn stacking_order(&self) -> Vec<&'a str> {
        match self.order {
            Some(order) => order.iter().collect(),
            None => self.catalog.categories().collect(),
        }
    }

    /// Pick one layer per non-empty category, uniformly at random.
    pub fn build_random<R: Rng + ?Sized>(&self, rng: &mut R) -> RandomFace<'a> {
        let mut stack = Vec::new();
        let mut selection = Selection::new();

        for category in self.stacking_order() {
            let Some(images) = self.catalog.images(category) else {
                continue;
            };
            if images.is_empty() {
                continue;
            }
            let index = rng.gen_range(0..images.len());
            stack.push(&images[index]);
            selection.insert(category, index);
        }

        RandomFace { stack, selection }
    }

    /// Stack the layers named by `selection`, in definition order.
    ///
    /// Without a definition the stack is always empty. Categories missing
    /// from `selection` or the catalog, and out-of-range indices, are skipped.
    pub fn build_by_indices(&self, selection: &Selection) -> Vec<&'a PartImage> {
        let Some(order) = self.order else {
            if !selection.is_empty() {
                debug!("No stacking order defined; explicit selection yields no layers");
            }
            return Vec::new();
        };

        let mut stack = Vec::new();
        for category in order.iter() {
            let Some(index) = selection.get(category) else {
                continue;
            };
            match self.catalog.get(category, index) {
                Some(image) => stack.push(image),
                None => debug!(category, index, "Selection index out of range; skipped"),
            }
        }
        stack
    }
}
