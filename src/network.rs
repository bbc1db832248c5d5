use tracing::debug;

use crate::{
    augment::{self, check_endpoints},
    components::{self, ComponentSummary},
    config::NetworkDataConfig,
    engine::Engine,
    errors::NetworkDataError,
    schema::{
        self, COMPONENT_ID, EDGE_AUGMENTED_COLUMNS, EDGES_TABLE, LABEL, NODE_AUGMENTED_COLUMNS,
        NODE_ID, NODES_TABLE, SOURCE, TARGET,
    },
    table::{Column, Provenance, Table, Value},
};

/// Network data stored as a nodes table and an edges table.
///
/// Node ids are dense: row `i` of the nodes table has `_node_id == i`. Every edge endpoint
/// references an existing node. Instances are never modified; every transformation returns a
/// new instance, so a `NetworkData` can be shared freely between threads.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkData {
    nodes: Table,
    edges: Table,
}

/// Construction options for [`NetworkData::create_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateOptions {
    /// Recompute every derived column. When `false` the tables must already carry them.
    pub augment: bool,
    /// Add `_component_id` to both tables.
    pub label_components: bool,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            augment: true,
            label_components: true,
        }
    }
}

impl From<&NetworkDataConfig> for CreateOptions {
    fn from(config: &NetworkDataConfig) -> Self {
        Self {
            augment: true,
            label_components: config.label_components,
        }
    }
}

fn mark_computed_columns(table: &mut Table) {
    for name in table.column_names() {
        if schema::computed_column_type(&name).is_some() {
            table.set_provenance(&name, Provenance::Computed);
        }
    }
}

/// Returns the permutation putting the nodes table into `_node_id` order, or an error if the
/// ids are not exactly `0..num_nodes`.
fn dense_order(nodes: &Table) -> Result<Option<Vec<usize>>, NetworkDataError> {
    let ids = nodes.require_column(NODES_TABLE, NODE_ID)?;
    let mut order = vec![usize::MAX; ids.len()];
    let mut sorted = true;
    for (row, value) in ids.values().iter().enumerate() {
        let id = match value {
            Value::Null => {
                return Err(NetworkDataError::data_integrity(format!(
                    "column '{NODE_ID}' contains a null value in row {row}"
                )));
            }
            other => other.as_i64().ok_or_else(|| {
                NetworkDataError::data_integrity(format!(
                    "column '{NODE_ID}' must hold integers, found '{other}'"
                ))
            })?,
        };
        if id < 0 || id as usize >= order.len() {
            return Err(NetworkDataError::data_integrity(format!(
                "node id {id} is outside the dense range [0, {})",
                order.len()
            )));
        }
        if order[id as usize] != usize::MAX {
            return Err(NetworkDataError::data_integrity(format!(
                "duplicate node id {id}"
            )));
        }
        order[id as usize] = row;
        sorted &= id as usize == row;
    }
    Ok(if sorted { None } else { Some(order) })
}

fn check_references(num_nodes: usize, edges: &Table) -> Result<(), NetworkDataError> {
    for name in [SOURCE, TARGET] {
        for value in edges.require_column(EDGES_TABLE, name)?.values() {
            match value.as_i64() {
                Some(id) if id >= 0 && (id as usize) < num_nodes => {}
                _ => {
                    return Err(NetworkDataError::referential_integrity(
                        format!("edge column '{name}' references a missing node"),
                        value.to_string(),
                    ));
                }
            }
        }
    }
    Ok(())
}

impl NetworkData {
    /// Builds network data from tables that already carry `_node_id`/`_label` (nodes) and
    /// `_source`/`_target` (edges). See [`crate::assemble`] for raw tables with arbitrary ids.
    pub fn create(nodes: Table, edges: Table, augment: bool) -> Result<Self, NetworkDataError> {
        Self::create_with(
            nodes,
            edges,
            CreateOptions {
                augment,
                ..CreateOptions::default()
            },
        )
    }

    pub fn create_with(
        mut nodes: Table,
        mut edges: Table,
        options: CreateOptions,
    ) -> Result<Self, NetworkDataError> {
        mark_computed_columns(&mut nodes);
        mark_computed_columns(&mut edges);
        schema::check_reserved_user_columns(&nodes, NODES_TABLE)?;
        schema::check_reserved_user_columns(&edges, EDGES_TABLE)?;

        if let Some(order) = dense_order(&nodes)? {
            nodes = nodes.take(&order);
        }
        if nodes.require_column(NODES_TABLE, LABEL)?.null_count() > 0 {
            return Err(NetworkDataError::data_integrity(format!(
                "column '{LABEL}' contains null values"
            )));
        }
        check_endpoints(&edges)?;
        check_references(nodes.num_rows(), &edges)?;

        if options.augment {
            edges = augment::augment_edges(&edges)?;
            nodes = augment::augment_nodes(&nodes, &edges)?;
        } else {
            for name in NODE_AUGMENTED_COLUMNS {
                nodes.require_column(NODES_TABLE, name)?;
            }
            for name in EDGE_AUGMENTED_COLUMNS {
                edges.require_column(EDGES_TABLE, name)?;
            }
        }
        if options.label_components && (options.augment || !nodes.has_column(COMPONENT_ID)) {
            (nodes, edges) = components::label_components(&nodes, &edges)?;
        }
        debug!(
            nodes = nodes.num_rows(),
            edges = edges.num_rows(),
            augment = options.augment,
            "created network data"
        );
        Ok(Self { nodes, edges })
    }

    /// Wraps tables produced by internal transforms that already uphold every invariant.
    pub(crate) fn from_parts(nodes: Table, edges: Table) -> Self {
        Self { nodes, edges }
    }

    pub fn nodes(&self) -> &Table {
        &self.nodes
    }

    pub fn edges(&self) -> &Table {
        &self.edges
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.num_rows()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.num_rows()
    }

    pub fn node_attribute_names(&self) -> Vec<String> {
        self.nodes.user_columns().map(|c| c.name().to_string()).collect()
    }

    pub fn edge_attribute_names(&self) -> Vec<String> {
        self.edges.user_columns().map(|c| c.name().to_string()).collect()
    }

    pub fn has_components(&self) -> bool {
        self.nodes.has_column(COMPONENT_ID) && self.edges.has_column(COMPONENT_ID)
    }

    pub fn query_nodes(&self, sql: &str) -> Result<Table, NetworkDataError> {
        Engine::with_tables(&[(NODES_TABLE, &self.nodes)])?.query_read_only(sql, &[&self.nodes])
    }

    pub fn query_edges(&self, sql: &str) -> Result<Table, NetworkDataError> {
        Engine::with_tables(&[(EDGES_TABLE, &self.edges)])?.query_read_only(sql, &[&self.edges])
    }

    /// Returns a copy with `_component_id` on both tables.
    pub fn with_components(&self) -> Result<Self, NetworkDataError> {
        let (nodes, edges) = components::label_components(&self.nodes, &self.edges)?;
        Ok(Self { nodes, edges })
    }

    /// Returns a copy with `_is_cut_point` on the nodes table.
    pub fn with_cut_points(&self) -> Result<Self, NetworkDataError> {
        let nodes = components::label_cut_points(&self.nodes, &self.edges)?;
        Ok(Self {
            nodes,
            edges: self.edges.clone(),
        })
    }

    pub fn component_summary(&self) -> Result<ComponentSummary, NetworkDataError> {
        components::component_summary(&self.nodes, &self.edges)
    }

    pub fn component_ids(&self) -> Result<Vec<i64>, NetworkDataError> {
        let labeled;
        let nodes = if self.nodes.has_column(COMPONENT_ID) {
            &self.nodes
        } else {
            labeled = self.with_components()?;
            &labeled.nodes
        };
        let mut ids: Vec<i64> = nodes
            .require_column(NODES_TABLE, COMPONENT_ID)?
            .values()
            .iter()
            .filter_map(Value::as_i64)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    /// Adds user columns without recomputing derived columns.
    pub fn with_columns(
        &self,
        node_columns: Vec<Column>,
        edge_columns: Vec<Column>,
    ) -> Result<Self, NetworkDataError> {
        let nodes = append_user_columns(self.nodes.clone(), node_columns, NODES_TABLE)?;
        let edges = append_user_columns(self.edges.clone(), edge_columns, EDGES_TABLE)?;
        Ok(Self { nodes, edges })
    }
}

fn append_user_columns(
    mut table: Table,
    columns: Vec<Column>,
    table_name: &str,
) -> Result<Table, NetworkDataError> {
    for column in columns {
        if schema::is_reserved(column.name()) {
            return Err(NetworkDataError::configuration(format!(
                "column name '{}' uses the reserved prefix '{}'",
                column.name(),
                schema::RESERVED_PREFIX
            )));
        }
        if table.has_column(column.name()) {
            return Err(NetworkDataError::configuration(format!(
                "{table_name} table already has a column named '{}'",
                column.name()
            )));
        }
        table = table.with_column(column.with_provenance(Provenance::UserSupplied))?;
    }
    Ok(table)
}
