//! Filename parsing for the `<prefix>_<category><variant>` layer convention.
//!
//! Every layer image encodes its part category in one `_`-separated token of
//! its file name. The token is a category key followed by an optional variant
//! suffix that starts at the first digit:
//!
//! - `face_head2.png` → category `head`, variant `2`
//! - `face_eyes10b.png` → category `eyes`, variant `10b`
//! - `face_beard.png` → category `beard`, variant `""`
//!
//! Which token holds the category is configurable (`parts.token_index`, default
//! `1`), so exports with extra leading tokens (`char_v2_head3.png` with index `2`)
//! classify the same way.
//!
//! ## Contract
//!
//! A name with too few tokens is a caller error and is rejected eagerly
//! with [`NamingError::MissingToken`]. A token with nothing before its first
//! digit (`face_3.png`) has no category and is rejected with
//! [`NamingError::EmptyCategory`].

use std::path::Path;
use thiserror::Error;

/// Token separator used by the layer export convention.
pub const DEFAULT_SEPARATOR: char = '_';

/// Token position of the category in a layer name.
pub const DEFAULT_TOKEN_INDEX: usize = 1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamingError {
    #[error("'{name}' has {found} token(s), need at least {needed} to read token {index}")]
    MissingToken {
        name: String,
        index: usize,
        needed: usize,
        found: usize,
    },
    #[error("token '{token}' in '{name}' has no category before its variant number")]
    EmptyCategory { name: String, token: String },
}

/// Result of parsing a layer name like `face_head2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPart {
    /// Category key (e.g. `head` from `head2`)
    pub category: String,
    /// Variant suffix starting at the first digit. Empty if the token has none.
    pub variant: String,
}

/// Split a token into its alphabetic prefix and the rest, starting at the first digit.
///
/// - `"head2"` → `("head", "2")`
/// - `"eyes10b"` → `("eyes", "10b")`
/// - `"beard"` → `("beard", "")`
/// - `"3"` → `("", "3")`
pub fn split_variant(token: &str) -> (&str, &str) {
    let idx = token
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(token.len());
    token.split_at(idx)
}

/// Parse a layer name (extension already removed) into category and variant.
pub fn parse_part_name(
    name: &str,
    token_index: usize,
    separator: char,
) -> Result<ParsedPart, NamingError> {
    let tokens: Vec<&str> = name.split(separator).collect();
    let token = tokens
        .get(token_index)
        .ok_or_else(|| NamingError::MissingToken {
            name: name.to_string(),
            index: token_index,
            needed: token_index + 1,
            found: tokens.len(),
        })?;

    let (category, variant) = split_variant(token);
    if category.is_empty() {
        return Err(NamingError::EmptyCategory {
            name: name.to_string(),
            token: token.to_string(),
        });
    }

    Ok(ParsedPart {
        category: category.to_string(),
        variant: variant.to_string(),
    })
}

/// Classify a layer name into its category key using the default `_` separator.
///
/// ```
/// use face_builder::naming::classify;
/// assert_eq!(classify("a_head3_b", 1).unwrap(), "head");
/// ```
pub fn classify(name: &str, token_index: usize) -> Result<String, NamingError> {
    parse_part_name(name, token_index, DEFAULT_SEPARATOR).map(|p| p.category)
}

/// Strip every occurrence of `marker` from a file name.
///
/// Some sprite packers insert a marker before the extension
/// (`face_head1.ase_layer_tex.png`). The stripped form is the canonical asset
/// name used for deduplication. An empty marker leaves the name unchanged.
pub fn canonical_name(file_name: &str, marker: &str) -> String {
    if marker.is_empty() {
        file_name.to_string()
    } else {
        file_name.replace(marker, "")
    }
}

/// The part of a canonical name that gets classified: everything before the
/// last `.`, so `face_head2.png` becomes `face_head2`.
pub fn layer_stem(canonical: &str) -> &str {
    Path::new(canonical)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(canonical)
}
