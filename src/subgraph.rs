use tracing::debug;

use crate::{
    errors::NetworkDataError,
    network::{CreateOptions, NetworkData},
    schema::{COMPONENT_ID, EDGES_TABLE, LABEL, NODE_ID, NODES_TABLE, SOURCE, TARGET},
    table::{Column, ColumnType, Table, Value},
};

/// Which edges survive a node filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeSelection {
    /// Keep edges whose source and target are both selected.
    #[default]
    Induced,
    /// Keep edges with at least one selected endpoint. The other endpoint is added to the
    /// node set so that every kept edge still references existing nodes.
    Incident,
}

/// The largest component and, if the graph is not connected, everything else.
#[derive(Debug, Clone)]
pub struct ComponentSplit {
    pub largest: NetworkData,
    pub others: Option<NetworkData>,
}

fn node_index(value: &Value, num_nodes: usize) -> Result<usize, NetworkDataError> {
    match value.as_i64() {
        Some(id) if id >= 0 && (id as usize) < num_nodes => Ok(id as usize),
        _ => Err(NetworkDataError::referential_integrity(
            "edge endpoint does not reference a node",
            value.to_string(),
        )),
    }
}

impl NetworkData {
    /// Restricts the network to the given node ids.
    ///
    /// Which edges are kept depends on `selection`; see [`EdgeSelection`]. Surviving nodes are
    /// renumbered densely in ascending order of their previous ids, edges keep their relative
    /// order, and every derived column is recomputed.
    pub fn filter_by_nodes(
        &self,
        node_ids: &[u64],
        selection: EdgeSelection,
    ) -> Result<NetworkData, NetworkDataError> {
        let num_nodes = self.num_nodes();
        let mut selected = vec![false; num_nodes];
        for &id in node_ids {
            if id as usize >= num_nodes {
                return Err(NetworkDataError::referential_integrity(
                    "node id not present in network data",
                    id.to_string(),
                ));
            }
            selected[id as usize] = true;
        }

        let sources = self.edges().require_column(EDGES_TABLE, SOURCE)?;
        let targets = self.edges().require_column(EDGES_TABLE, TARGET)?;
        let mut keep_nodes = selected.clone();
        let mut edge_rows = Vec::new();
        let mut endpoints = Vec::new();
        for (row, (s, t)) in sources.values().iter().zip(targets.values()).enumerate() {
            let s = node_index(s, num_nodes)?;
            let t = node_index(t, num_nodes)?;
            let keep = match selection {
                EdgeSelection::Induced => selected[s] && selected[t],
                EdgeSelection::Incident => selected[s] || selected[t],
            };
            if keep {
                keep_nodes[s] = true;
                keep_nodes[t] = true;
                edge_rows.push(row);
                endpoints.push((s, t));
            }
        }

        let mut new_ids = vec![None; num_nodes];
        let mut node_rows = Vec::new();
        for (old, keep) in keep_nodes.iter().enumerate() {
            if *keep {
                new_ids[old] = Some(node_rows.len() as i64);
                node_rows.push(old);
            }
        }
        let remap = |old: usize| -> Result<Value, NetworkDataError> {
            new_ids[old].map(Value::Integer).ok_or_else(|| {
                NetworkDataError::data_integrity(format!("node {old} was dropped by the filter"))
            })
        };

        let kept_nodes = self.nodes().take(&node_rows);
        let mut node_columns = vec![
            Column::computed(
                NODE_ID,
                ColumnType::Integer,
                (0..node_rows.len() as i64).map(Value::Integer).collect(),
            ),
            kept_nodes.require_column(NODES_TABLE, LABEL)?.clone(),
        ];
        node_columns.extend(kept_nodes.user_columns().cloned());

        let kept_edges = self.edges().take(&edge_rows);
        let mut new_sources = Vec::with_capacity(endpoints.len());
        let mut new_targets = Vec::with_capacity(endpoints.len());
        for (s, t) in endpoints {
            new_sources.push(remap(s)?);
            new_targets.push(remap(t)?);
        }
        let mut edge_columns = vec![
            Column::computed(SOURCE, ColumnType::Integer, new_sources),
            Column::computed(TARGET, ColumnType::Integer, new_targets),
        ];
        edge_columns.extend(kept_edges.user_columns().cloned());

        debug!(
            nodes = node_rows.len(),
            edges = edge_rows.len(),
            ?selection,
            "filtered network data by nodes"
        );
        NetworkData::create_with(
            Table::from_columns(node_columns)?,
            Table::from_columns(edge_columns)?,
            CreateOptions {
                augment: true,
                label_components: self.has_components(),
            },
        )
    }

    /// Nodes and edges of one component, renumbered densely.
    pub fn select_component(&self, component_id: i64) -> Result<NetworkData, NetworkDataError> {
        let labeled;
        let source = if self.has_components() {
            self
        } else {
            labeled = self.with_components()?;
            &labeled
        };
        let available = source.component_ids()?;
        if !available.contains(&component_id) {
            return Err(NetworkDataError::configuration(format!(
                "component {component_id} does not exist (available: {})",
                available
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        let members = source.component_members(|id| id == component_id)?;
        source.filter_by_nodes(&members, EdgeSelection::Induced)
    }

    /// Splits off the largest component (id 0) from all other components.
    ///
    /// The two parts partition the node set. For a connected graph `others` is `None` and
    /// `largest` is the (component-labeled) input itself.
    pub fn split_largest_component(&self) -> Result<ComponentSplit, NetworkDataError> {
        let labeled = if self.has_components() {
            self.clone()
        } else {
            self.with_components()?
        };
        if labeled.component_ids()?.len() <= 1 {
            return Ok(ComponentSplit {
                largest: labeled,
                others: None,
            });
        }
        let largest = labeled.select_component(0)?;
        let rest = labeled.component_members(|id| id != 0)?;
        let others = labeled.filter_by_nodes(&rest, EdgeSelection::Induced)?;
        Ok(ComponentSplit {
            largest,
            others: Some(others),
        })
    }

    pub fn largest_component(&self) -> Result<NetworkData, NetworkDataError> {
        Ok(self.split_largest_component()?.largest)
    }

    fn component_members<F: Fn(i64) -> bool>(&self, keep: F) -> Result<Vec<u64>, NetworkDataError> {
        let components = self.nodes().require_column(NODES_TABLE, COMPONENT_ID)?;
        Ok(components
            .values()
            .iter()
            .enumerate()
            .filter(|(_, v)| v.as_i64().is_some_and(&keep))
            .map(|(row, _)| row as u64)
            .collect())
    }
}
