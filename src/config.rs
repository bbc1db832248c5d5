//! Configuration for ingesting raw tables into [`NetworkData`](crate::NetworkData).
//!
//! Column names of the raw tables can be given explicitly, or resolved from the alias lists in
//! [`ColumnAliases`]. The configuration is plain data, so the hosting framework can hand it over
//! as JSON.

use serde::{Deserialize, Serialize};

use crate::errors::NetworkDataError;

/// Candidate column names tried, in order, when a column hint is omitted.
///
/// Matching first looks for an exact name, then for a case-insensitive one.
///
/// # Default Configuration
///
/// ```rust
/// use network_data::ColumnAliases;
/// let aliases = ColumnAliases::default();
/// assert_eq!(aliases.id, vec!["id", "node_id"]);
/// assert_eq!(aliases.source[0], "source");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnAliases {
    /// Aliases for the node identifier column of a nodes table.
    ///
    /// **Default:** `["id", "node_id"]`
    pub id: Vec<String>,

    /// Aliases for the node label column of a nodes table.
    ///
    /// **Default:** `["label", "node_label"]`
    ///
    /// A missing label column is not an error; labels then fall back to the stringified id.
    pub label: Vec<String>,

    /// Aliases for the edge source column.
    ///
    /// **Default:** `["source", "sources", "source_id", "from", "sender"]`
    pub source: Vec<String>,

    /// Aliases for the edge target column.
    ///
    /// **Default:** `["target", "targets", "target_id", "to", "receiver"]`
    pub target: Vec<String>,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self {
            id: owned(&["id", "node_id"]),
            label: owned(&["label", "node_label"]),
            source: owned(&["source", "sources", "source_id", "from", "sender"]),
            target: owned(&["target", "targets", "target_id", "to", "receiver"]),
        }
    }
}

impl ColumnAliases {
    /// Resolves the first alias present in `available`.
    pub fn resolve<'a>(aliases: &[String], available: &'a [String]) -> Option<&'a str> {
        for alias in aliases {
            if let Some(found) = available.iter().find(|c| *c == alias) {
                return Some(found.as_str());
            }
        }
        for alias in aliases {
            if let Some(found) = available.iter().find(|c| c.eq_ignore_ascii_case(alias)) {
                return Some(found.as_str());
            }
        }
        None
    }
}

/// Options controlling how a [`NetworkData`](crate::NetworkData) is assembled.
///
/// # Examples
///
/// ```rust
/// use network_data::NetworkDataConfig;
///
/// let cfg = NetworkDataConfig::from_json(r#"{"label_components": false}"#).unwrap();
/// assert!(!cfg.label_components);
/// assert_eq!(cfg.aliases.label, vec!["label", "node_label"]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkDataConfig {
    /// Column alias lists used when explicit column names are not given.
    pub aliases: ColumnAliases,

    /// Whether component ids are computed during construction
    ///
    /// **Default:** `true`
    ///
    /// When `false`, the `_component_id` columns are left out and can be added later with
    /// [`NetworkData::with_components`](crate::NetworkData::with_components).
    pub label_components: bool,
}

impl Default for NetworkDataConfig {
    fn default() -> Self {
        Self {
            aliases: ColumnAliases::default(),
            label_components: true,
        }
    }
}

impl NetworkDataConfig {
    pub fn from_json(json: &str) -> Result<Self, NetworkDataError> {
        serde_json::from_str(json)
            .map_err(|e| NetworkDataError::configuration(format!("invalid configuration: {e}")))
    }

    pub fn to_json(&self) -> Result<String, NetworkDataError> {
        serde_json::to_string(self).map_err(|e| NetworkDataError::configuration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_prefers_exact_match_over_case_insensitive() {
        let available = vec!["FROM".to_string(), "sender".to_string(), "to".to_string()];
        let aliases = ColumnAliases::default();
        assert_eq!(ColumnAliases::resolve(&aliases.source, &available), Some("sender"));
        assert_eq!(ColumnAliases::resolve(&aliases.target, &available), Some("to"));
        let upper = vec!["SOURCE".to_string()];
        assert_eq!(ColumnAliases::resolve(&aliases.source, &upper), Some("SOURCE"));
        assert_eq!(ColumnAliases::resolve(&aliases.id, &upper), None);
    }

    #[test]
    fn invalid_json_is_a_configuration_error() {
        let err = NetworkDataConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, NetworkDataError::ConfigurationError(_)));
    }
}
