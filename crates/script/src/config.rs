use serde::{Deserialize, Serialize};

use crate::parser::DEFAULT_MAX_DEPTH;

/// Tunables for a [`Vm`](crate::Vm).
///
/// Every field has a default, so a config file only needs to name what it changes:
///
/// ```json
/// { "max_depth": 32 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Maximum nesting of parentheses and calls, enforced both when parsing and when evaluating.
    pub max_depth: usize,
    /// Whether to constant-fold calls to fold-eligible functions before caching an expression.
    pub optimize: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            optimize: true,
        }
    }
}

impl VmConfig {
    /// Deserializes a config from a JSON string slice.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Deserializes a config from a JSON reader.
    pub fn from_json_reader<R>(reader: R) -> serde_json::Result<Self>
    where
        R: std::io::Read,
    {
        serde_json::from_reader(reader)
    }
}
