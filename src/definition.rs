//! Stacking-order definition loading.
//!
//! The definition is a JSON document whose `order` field lists part categories
//! bottom to top:
//!
//! ```json
//! { "order": ["head", "eyes", "nose", "mouth", "hair", "beard"] }
//! ```
//!
//! The definition is optional. A missing file, unreadable or malformed JSON,
//! and an `order` of the wrong shape all degrade to "no order", logged but
//! never fatal. Other top-level keys are ignored so the same file can carry
//! data for other tools.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Category stacking order, bottom to top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec(Vec<String>);

impl OrderSpec {
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(categories.into_iter().map(Into::into).collect())
    }

    pub fn categories(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The top-level document. Only `order` is read; its type is checked after
/// parsing so a bad `order` can be told apart from bad JSON.
#[derive(Debug, Deserialize)]
struct DefinitionFile {
    #[serde(default)]
    order: Option<serde_json::Value>,
}

/// Parse definition text.
///
/// - `Err` if the text is not a JSON object.
/// - `Ok(None)` if there is no `order`, or it is not an array of strings.
/// - `Ok(Some(order))` otherwise.
pub fn parse_definition(text: &str) -> Result<Option<OrderSpec>, DefinitionError> {
    let file: DefinitionFile = serde_json::from_str(text)?;
    let Some(order) = file.order else {
        return Ok(None);
    };

    match serde_json::from_value::<Vec<String>>(order) {
        Ok(categories) => Ok(Some(OrderSpec(categories))),
        Err(e) => {
            warn!("Definition 'order' is not a list of category names: {e}");
            Ok(None)
        }
    }
}

/// Read and parse the definition at `path`, surfacing every failure.
pub fn read_definition(path: &Path) -> Result<Option<OrderSpec>, DefinitionError> {
    let text = fs::read_to_string(path)?;
    parse_definition(&text)
}

/// Load the stacking order from `path`, or `None` if there is none to load.
pub fn load_definition(path: &Path) -> Option<OrderSpec> {
    match read_definition(path) {
        Ok(order) => order,
        Err(DefinitionError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "No definition file; using catalog order");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), "Ignoring definition: {e}");
            None
        }
    }
}
