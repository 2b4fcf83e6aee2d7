//! Generator configuration: which symbols mean what, and output policy.
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub symbols: KnownSymbols,
    /// Emit a warning for each constraint dropped over an unsupported operand.
    pub report_dropped_constraints: bool,
    /// Spaces per indentation level in generated source.
    pub indent: usize,
}

/// Fully qualified names the generator matches against.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct KnownSymbols {
    pub marker: String,
    pub capability: String,
    pub greater_than: String,
    pub less_than: String,
    pub between: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            symbols: KnownSymbols::default(),
            report_dropped_constraints: false,
            indent: 4,
        }
    }
}

impl Default for KnownSymbols {
    fn default() -> Self {
        Self {
            marker: "FastValidate.Attributes.GenerateValidateMethodAttribute".into(),
            capability: "FastValidate.IFastValidatable".into(),
            greater_than: "FastValidate.Attributes.Validate.GreaterThanAttribute".into(),
            less_than: "FastValidate.Attributes.LessThanAttribute".into(),
            between: "FastValidate.Attributes.Validate.BetweenAttribute".into(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        crate::path_de::from_str_with_path(&source).map_err(|message| ConfigError::Invalid {
            path: path.to_path_buf(),
            message,
        })
    }
}

/// Name equality as the host prints it, ignoring a `global::` alias.
pub fn same_symbol(expected: &str, actual: &str) -> bool {
    fn bare(name: &str) -> &str {
        name.strip_prefix("global::").unwrap_or(name)
    }
    bare(expected) == bare(actual)
}
