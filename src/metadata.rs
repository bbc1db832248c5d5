//! Summary statistics derived from the precomputed columns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    convert::GraphType,
    engine::Engine,
    errors::NetworkDataError,
    network::NetworkData,
    schema::{
        COMPONENT_ID, EDGES_TABLE, IDX_DUP_DIRECTED, IDX_DUP_UNDIRECTED, NODES_TABLE, SOURCE,
        TARGET, quote_ident,
    },
    table::Value,
};

/// Properties of the edges table read as one graph type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphProperties {
    pub number_of_edges: u64,
    /// Rows beyond the first of each group of parallel edges; always 0 for simple types.
    pub parallel_edges: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentProperties {
    pub component_id: i64,
    pub number_of_nodes: u64,
    pub number_of_associated_edge_rows: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkProperties {
    pub number_of_nodes: u64,
    pub properties_by_graph_type: BTreeMap<GraphType, GraphProperties>,
    pub number_of_self_loops: u64,
    pub number_of_components: u64,
    pub components: BTreeMap<i64, ComponentProperties>,
}

impl NetworkProperties {
    pub fn from_network_data(network_data: &NetworkData) -> Result<Self, NetworkDataError> {
        let labeled;
        let network_data = if network_data.has_components() {
            network_data
        } else {
            labeled = network_data.with_components()?;
            &labeled
        };
        let engine = Engine::with_tables(&[
            (NODES_TABLE, network_data.nodes()),
            (EDGES_TABLE, network_data.edges()),
        ])?;
        let count = |filter: String| -> Result<u64, NetworkDataError> {
            engine
                .query_i64(&format!("SELECT COUNT(*) FROM edges WHERE {filter}"))
                .map(|n| n as u64)
        };
        let idx_dir = quote_ident(IDX_DUP_DIRECTED);
        let idx_undir = quote_ident(IDX_DUP_UNDIRECTED);
        let num_edges = network_data.num_edges() as u64;

        let mut by_type = BTreeMap::new();
        by_type.insert(
            GraphType::Directed,
            GraphProperties {
                number_of_edges: count(format!("{idx_dir} = 1"))?,
                parallel_edges: 0,
            },
        );
        by_type.insert(
            GraphType::DirectedMulti,
            GraphProperties {
                number_of_edges: num_edges,
                parallel_edges: count(format!("{idx_dir} >= 2"))?,
            },
        );
        by_type.insert(
            GraphType::Undirected,
            GraphProperties {
                number_of_edges: count(format!("{idx_undir} = 1"))?,
                parallel_edges: 0,
            },
        );
        by_type.insert(
            GraphType::UndirectedMulti,
            GraphProperties {
                number_of_edges: num_edges,
                parallel_edges: count(format!("{idx_undir} >= 2"))?,
            },
        );
        let number_of_self_loops = count(format!(
            "{} = {}",
            quote_ident(SOURCE),
            quote_ident(TARGET)
        ))?;

        let component = quote_ident(COMPONENT_ID);
        let rows = engine.query(
            &format!(
                "SELECT n.{component} AS component_id, n.cnt AS nodes, COALESCE(e.cnt, 0) AS edges
                 FROM (SELECT {component}, COUNT(*) AS cnt FROM nodes GROUP BY {component}) n
                 LEFT JOIN (SELECT {component}, COUNT(*) AS cnt FROM edges GROUP BY {component}) e
                   ON e.{component} = n.{component}
                 ORDER BY n.{component}"
            ),
            &[],
        )?;
        let mut components = BTreeMap::new();
        for row in 0..rows.num_rows() {
            let get = |name: &str| rows.value(name, row).and_then(Value::as_i64).unwrap_or(0);
            let component_id = get("component_id");
            components.insert(
                component_id,
                ComponentProperties {
                    component_id,
                    number_of_nodes: get("nodes") as u64,
                    number_of_associated_edge_rows: get("edges") as u64,
                },
            );
        }

        Ok(Self {
            number_of_nodes: network_data.num_nodes() as u64,
            properties_by_graph_type: by_type,
            number_of_self_loops,
            number_of_components: components.len() as u64,
            components,
        })
    }

    pub fn graph_properties(&self, graph_type: GraphType) -> Option<&GraphProperties> {
        self.properties_by_graph_type.get(&graph_type)
    }

    pub fn to_json(&self) -> Result<String, NetworkDataError> {
        serde_json::to_string_pretty(self).map_err(|e| NetworkDataError::query(e.to_string()))
    }
}

impl NetworkData {
    pub fn properties(&self) -> Result<NetworkProperties, NetworkDataError> {
        NetworkProperties::from_network_data(self)
    }

    pub fn num_self_loops(&self) -> Result<u64, NetworkDataError> {
        let sources = self.edges().require_column(EDGES_TABLE, SOURCE)?;
        let targets = self.edges().require_column(EDGES_TABLE, TARGET)?;
        Ok(sources
            .values()
            .iter()
            .zip(targets.values())
            .filter(|(s, t)| s == t)
            .count() as u64)
    }
}
