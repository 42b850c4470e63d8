//! Options for a type context

use crate::error::{TypeError, TypeResult};
use serde::Deserialize;

/// Tunables for a [`TypeContext`](crate::TypeContext)
///
/// Can be built in code or loaded from TOML/JSON:
///
/// ```toml
/// root_tag = "Object"
/// json_tag_key = "__tag"
/// merge_nominal = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Name of the implicit root of the nominal hierarchy
    pub root_tag: String,

    /// JSON object key holding a record's nominal tag
    pub json_tag_key: String,

    /// Whether unions merge object clauses into their nominal join
    pub merge_nominal: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            root_tag: "Object".to_string(),
            json_tag_key: "__tag".to_string(),
            merge_nominal: true,
        }
    }
}

impl Options {
    /// Parse options from a TOML document
    pub fn from_toml_str(source: &str) -> TypeResult<Self> {
        toml::from_str(source).map_err(|e| TypeError::InvalidOptions {
            reason: e.to_string(),
        })
    }

    /// Parse options from a JSON document
    pub fn from_json_str(source: &str) -> TypeResult<Self> {
        serde_json::from_str(source).map_err(|e| TypeError::InvalidOptions {
            reason: e.to_string(),
        })
    }
}
