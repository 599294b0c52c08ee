//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output leads with the part category and positional index, the same
//! identity used by selections (`head=1`). File names are secondary context on
//! the indented lines below, so the listing doubles as a reference for writing
//! `--select` arguments.
//!
//! # Output Format
//!
//! ## Parts
//!
//! ```text
//! Parts
//! head (2 layers)
//!     0 face_head1.png
//!     1 face_head2.png
//! eyes (1 layer)
//!     0 face_eyes1.png
//!
//! Order
//!     head → eyes → beard (no layers)
//! ```
//!
//! ## Selection
//!
//! ```text
//! Selection
//!     head=1 face_head2.png
//!     eyes=0 face_eyes1.png
//! ```
//!
//! ## Face
//!
//! ```text
//! Composed 2 layers (64x64) → portrait.png
//! ```
//!
//! # Architecture
//!
//! Each section has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::builder::FaceBuilder;
use crate::imaging::CompositeImage;
use crate::types::Selection;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn layer_count(n: usize) -> String {
    match n {
        1 => "1 layer".to_string(),
        n => format!("{n} layers"),
    }
}

// ============================================================================
// Parts
// ============================================================================

/// Format the catalog as categories with their indexed layers, followed by
/// the stacking order if a definition was loaded.
pub fn format_parts_output(builder: &FaceBuilder) -> Vec<String> {
    let catalog = builder.catalog();
    let mut lines = vec!["Parts".to_string()];

    if catalog.is_empty() {
        lines.push(format!("{}(no layers found)", indent(1)));
    }

    for category in catalog.categories() {
        let images = catalog.images(category).unwrap_or_default();
        lines.push(format!("{} ({})", category, layer_count(images.len())));
        for (index, image) in images.iter().enumerate() {
            lines.push(format!("{}{} {}", indent(1), index, image.name()));
        }
    }

    lines.push(String::new());
    lines.push("Order".to_string());
    match builder.order() {
        Some(order) if !order.is_empty() => {
            let chain: Vec<String> = order
                .iter()
                .map(|category| match catalog.images(category) {
                    Some(images) if !images.is_empty() => category.to_string(),
                    _ => format!("{category} (no layers)"),
                })
                .collect();
            lines.push(format!("{}{}", indent(1), chain.join(" → ")));
        }
        Some(_) => lines.push(format!("{}(empty definition)", indent(1))),
        None => lines.push(format!("{}(no definition; catalog order)", indent(1))),
    }

    lines
}

pub fn print_parts_output(builder: &FaceBuilder) {
    for line in format_parts_output(builder) {
        println!("{}", line);
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Format a selection as `category=index file` lines in stacking order.
///
/// Categories in the selection that are not part of the stacking order are
/// listed after it. Indices with no matching layer are flagged.
pub fn format_selection_output(builder: &FaceBuilder, selection: &Selection) -> Vec<String> {
    let catalog = builder.catalog();
    let mut lines = vec!["Selection".to_string()];

    if selection.is_empty() {
        lines.push(format!("{}(empty)", indent(1)));
        return lines;
    }

    let order = builder.composer().stacking_order();
    let ordered = order
        .iter()
        .filter_map(|category| selection.get(category).map(|index| (*category, index)));
    let unordered = selection
        .iter()
        .filter(|(category, _)| !order.iter().any(|o| o == category));

    for (category, index) in ordered.chain(unordered) {
        let detail = match catalog.get(category, index) {
            Some(image) => image.name().to_string(),
            None => "(no such layer)".to_string(),
        };
        lines.push(format!("{}{}={} {}", indent(1), category, index, detail));
    }

    lines
}

pub fn print_selection_output(builder: &FaceBuilder, selection: &Selection) {
    for line in format_selection_output(builder, selection) {
        println!("{}", line);
    }
}

// ============================================================================
// Face
// ============================================================================

/// Format the outcome of a build: the written file, or why nothing was written.
pub fn format_face_output(face: Option<&CompositeImage>, path: &Path) -> Vec<String> {
    match face {
        Some(face) => vec![format!(
            "Composed {} ({}x{}) → {}",
            layer_count(face.layer_count()),
            face.width(),
            face.height(),
            path.display()
        )],
        None => vec![format!(
            "No layers selected; {} not written",
            path.display()
        )],
    }
}

pub fn print_face_output(face: Option<&CompositeImage>, path: &Path) {
    for line in format_face_output(face, path) {
        println!("{}", line);
    }
}
