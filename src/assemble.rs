//! Assembling [`NetworkData`] from raw tables with arbitrary node identifiers.

use tracing::debug;

use crate::{
    config::{ColumnAliases, NetworkDataConfig},
    errors::NetworkDataError,
    identity::{self, NodeColumns},
    network::{CreateOptions, NetworkData},
    schema::{self, EDGES_TABLE, NODES_TABLE},
    table::Table,
};

/// Builder for network data from an edges table and an optional nodes table.
///
/// Column names not set explicitly are resolved through the configured aliases.
#[derive(Debug, Clone)]
pub struct NetworkDataBuilder<'a> {
    edges: &'a Table,
    nodes: Option<&'a Table>,
    source_column: Option<String>,
    target_column: Option<String>,
    id_column: Option<String>,
    label_column: Option<String>,
    config: NetworkDataConfig,
}

fn require_named(table: &Table, table_name: &str, role: &str, name: &str) -> Result<String, NetworkDataError> {
    if table.has_column(name) {
        return Ok(name.to_string());
    }
    Err(NetworkDataError::configuration(format!(
        "{table_name} table does not contain {role} column '{name}', use one of: {}",
        table.column_names().join(", ")
    )))
}

impl<'a> NetworkDataBuilder<'a> {
    pub fn new(edges: &'a Table) -> Self {
        Self {
            edges,
            nodes: None,
            source_column: None,
            target_column: None,
            id_column: None,
            label_column: None,
            config: NetworkDataConfig::default(),
        }
    }

    pub fn nodes(mut self, nodes: &'a Table) -> Self {
        self.nodes = Some(nodes);
        self
    }

    pub fn source_column<S: Into<String>>(mut self, name: S) -> Self {
        self.source_column = Some(name.into());
        self
    }

    pub fn target_column<S: Into<String>>(mut self, name: S) -> Self {
        self.target_column = Some(name.into());
        self
    }

    pub fn id_column<S: Into<String>>(mut self, name: S) -> Self {
        self.id_column = Some(name.into());
        self
    }

    pub fn label_column<S: Into<String>>(mut self, name: S) -> Self {
        self.label_column = Some(name.into());
        self
    }

    pub fn config(mut self, config: NetworkDataConfig) -> Self {
        self.config = config;
        self
    }

    fn resolve_endpoints(&self) -> Result<(String, String), NetworkDataError> {
        let available = self.edges.column_names();
        let aliases = &self.config.aliases;
        let source = match &self.source_column {
            Some(name) => Some(require_named(self.edges, EDGES_TABLE, "source", name)?),
            None => ColumnAliases::resolve(&aliases.source, &available).map(str::to_string),
        };
        let target = match &self.target_column {
            Some(name) => Some(require_named(self.edges, EDGES_TABLE, "target", name)?),
            None => ColumnAliases::resolve(&aliases.target, &available).map(str::to_string),
        };
        let (source, target) = match (source, target) {
            (Some(s), Some(t)) => (s, t),
            (None, None) if available.len() == 2 => {
                debug!("using the two edge columns as source and target");
                (available[0].clone(), available[1].clone())
            }
            (s, _) => {
                let missing = if s.is_none() { "source" } else { "target" };
                return Err(NetworkDataError::configuration(format!(
                    "could not auto-detect {missing} column, specify it using one of: {}",
                    available.join(", ")
                )));
            }
        };
        if source == target {
            return Err(NetworkDataError::configuration(format!(
                "source and target column can't be the same ('{source}')"
            )));
        }
        debug!(source = %source, target = %target, "resolved edge columns");
        Ok((source, target))
    }

    fn resolve_node_columns(&self, nodes: &Table) -> Result<(String, Option<String>), NetworkDataError> {
        let available = nodes.column_names();
        let aliases = &self.config.aliases;
        let id = match &self.id_column {
            Some(name) => require_named(nodes, NODES_TABLE, "id", name)?,
            None => ColumnAliases::resolve(&aliases.id, &available)
                .map(str::to_string)
                .ok_or_else(|| {
                    NetworkDataError::configuration(format!(
                        "could not auto-detect id column, specify it using one of: {}",
                        available.join(", ")
                    ))
                })?,
        };
        let label = match &self.label_column {
            Some(name) => Some(require_named(nodes, NODES_TABLE, "label", name)?),
            None => ColumnAliases::resolve(&aliases.label, &available).map(str::to_string),
        };
        debug!(id = %id, label = ?label, "resolved node columns");
        Ok((id, label))
    }

    pub fn build(self) -> Result<NetworkData, NetworkDataError> {
        schema::check_reserved_user_columns(self.edges, EDGES_TABLE)?;
        if let Some(nodes) = self.nodes {
            schema::check_reserved_user_columns(nodes, NODES_TABLE)?;
        }
        let (source, target) = self.resolve_endpoints()?;
        let node_columns = match self.nodes {
            Some(nodes) => Some((nodes, self.resolve_node_columns(nodes)?)),
            None => None,
        };
        let mapped = identity::map_identities(
            self.edges,
            &source,
            &target,
            node_columns.as_ref().map(|(table, (id, label))| NodeColumns {
                table: *table,
                id: id.as_str(),
                label: label.as_deref(),
            }),
        )?;
        NetworkData::create_with(mapped.nodes, mapped.edges, CreateOptions::from(&self.config))
    }
}

/// Shorthand for [`NetworkDataBuilder`] with alias-resolved columns.
pub fn assemble(
    edges: &Table,
    nodes: Option<&Table>,
    config: &NetworkDataConfig,
) -> Result<NetworkData, NetworkDataError> {
    let mut builder = NetworkDataBuilder::new(edges).config(config.clone());
    if let Some(nodes) = nodes {
        builder = builder.nodes(nodes);
    }
    builder.build()
}
