//! Shared types passed between the catalog, composer, and blender.

use image::{DynamicImage, Rgba, Rgba32FImage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;
use tracing::warn;

/// A decoded layer image.
///
/// Pixels are stored as normalized `f32` RGBA so blending works on values in
/// `[0, 1]` without repeated 8-bit conversions. The catalog owns every
/// `PartImage`; composition stacks borrow them.
#[derive(Debug, Clone, PartialEq)]
pub struct PartImage {
    name: String,
    pixels: Rgba32FImage,
}

impl PartImage {
    pub fn new(name: impl Into<String>, pixels: Rgba32FImage) -> Self {
        Self {
            name: name.into(),
            pixels,
        }
    }

    /// Convert any decoded image (8-bit, 16-bit, grayscale, ...) to normalized RGBA.
    pub fn from_dynamic(name: impl Into<String>, image: &DynamicImage) -> Self {
        Self::new(name, image.to_rgba32f())
    }

    /// A layer where every pixel has the same color.
    pub fn filled(name: impl Into<String>, width: u32, height: u32, rgba: [f32; 4]) -> Self {
        Self::new(name, Rgba32FImage::from_pixel(width, height, Rgba(rgba)))
    }

    /// Canonical asset name the layer was loaded from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// RGBA at `(x, y)`. Panics if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        self.pixels.get_pixel(x, y).0
    }

    pub fn pixels(&self) -> &Rgba32FImage {
        &self.pixels
    }
}

/// Chosen image index per part category.
///
/// Serializes as a plain JSON object (`{"eyes": 2, "head": 0}`) so a random
/// selection can be saved and replayed later. Saved files may be edited by
/// hand: a negative index is dropped with a warning on load, like any other
/// index that names no layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, i64>")]
pub struct Selection(BTreeMap<String, usize>);

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: &str) -> Option<usize> {
        self.0.get(category).copied()
    }

    /// Set the index for a category, returning the previous one.
    pub fn insert(&mut self, category: impl Into<String>, index: usize) -> Option<usize> {
        self.0.insert(category.into(), index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries sorted by category key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Overlay `other` on top of `self`; entries in `other` win.
    pub fn merge(&mut self, other: Selection) {
        self.0.extend(other.0);
    }
}

impl From<BTreeMap<String, usize>> for Selection {
    fn from(map: BTreeMap<String, usize>) -> Self {
        Self(map)
    }
}

impl From<BTreeMap<String, i64>> for Selection {
    fn from(raw: BTreeMap<String, i64>) -> Self {
        Self(
            raw.into_iter()
                .filter_map(|(category, index)| match usize::try_from(index) {
                    Ok(index) => Some((category, index)),
                    Err(_) => {
                        warn!(category = %category, index, "Dropping negative selection index");
                        None
                    }
                })
                .collect(),
        )
    }
}

impl<K: Into<String>> FromIterator<(K, usize)> for Selection {
    fn from_iter<I: IntoIterator<Item = (K, usize)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl IntoIterator for Selection {
    type Item = (String, usize);
    type IntoIter = btree_map::IntoIter<String, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_layer_reports_its_color() {
        let img = PartImage::filled("face_head1.png", 3, 2, [1.0, 0.0, 0.0, 0.5]);
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.pixel(2, 1), [1.0, 0.0, 0.0, 0.5]);
        assert_eq!(img.name(), "face_head1.png");
    }

    #[test]
    fn from_dynamic_normalizes_8bit_channels() {
        let rgba8 = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 0, 0, 255]));
        let img = PartImage::from_dynamic("x", &DynamicImage::ImageRgba8(rgba8));
        assert_eq!(img.pixel(0, 0), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn selection_serializes_as_plain_object() {
        let sel: Selection = [("head", 0), ("eyes", 2)].into_iter().collect();
        let json = serde_json::to_string(&sel).unwrap();
        assert_eq!(json, r#"{"eyes":2,"head":0}"#);

        let back: Selection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sel);
    }

    #[test]
    fn selection_drops_negative_indices_on_load() {
        let sel: Selection = serde_json::from_str(r#"{"head": -1, "eyes": 2}"#).unwrap();
        let expected: Selection = [("eyes", 2)].into_iter().collect();
        assert_eq!(sel, expected);
    }

    #[test]
    fn selection_rejects_non_integer_index() {
        assert!(serde_json::from_str::<Selection>(r#"{"head": "one"}"#).is_err());
    }

    #[test]
    fn selection_merge_overrides() {
        let mut base: Selection = [("head", 0), ("eyes", 1)].into_iter().collect();
        base.merge([("eyes", 4)].into_iter().collect());
        assert_eq!(base.get("head"), Some(0));
        assert_eq!(base.get("eyes"), Some(4));
    }
}
