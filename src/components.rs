//! Connected components and cut points.
//!
//! Connectivity is always evaluated on the undirected simple interpretation: self-loops are
//! dropped and parallel rows collapse into one edge.
//!
//! Components are ranked by node count, largest first. Components of equal size are ranked by
//! their smallest `_node_id`, so labeling the same tables twice yields the same ids.

use std::collections::VecDeque;

use ahash::AHashSet;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    errors::NetworkDataError,
    schema::{COMPONENT_ID, EDGES_TABLE, IS_CUT_POINT, NODE_ID, NODES_TABLE, SOURCE, TARGET},
    table::{Column, ColumnType, Table, Value},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSummary {
    pub number_of_components: usize,
    pub is_connected: bool,
}

fn dense_node_count(nodes: &Table) -> Result<usize, NetworkDataError> {
    let ids = nodes.require_column(NODES_TABLE, NODE_ID)?;
    for (row, value) in ids.values().iter().enumerate() {
        if value.as_i64() != Some(row as i64) {
            return Err(NetworkDataError::data_integrity(format!(
                "nodes table row {row} has node id {value}, expected {row}"
            )));
        }
    }
    Ok(ids.len())
}

fn endpoint(value: &Value, num_nodes: usize) -> Result<usize, NetworkDataError> {
    match value.as_i64() {
        Some(id) if id >= 0 && (id as usize) < num_nodes => Ok(id as usize),
        _ => Err(NetworkDataError::referential_integrity(
            "edge endpoint does not reference a node",
            value.to_string(),
        )),
    }
}

/// Builds the undirected simple graph used for connectivity; node index `i` is node id `i`.
pub fn connectivity_graph(
    num_nodes: usize,
    edges: &Table,
) -> Result<UnGraph<u64, u64>, NetworkDataError> {
    let sources = edges.require_column(EDGES_TABLE, SOURCE)?;
    let targets = edges.require_column(EDGES_TABLE, TARGET)?;
    let mut graph = UnGraph::with_capacity(num_nodes, edges.num_rows());
    for id in 0..num_nodes {
        graph.add_node(id as u64);
    }
    let mut seen = AHashSet::new();
    for (row, (s, t)) in sources.values().iter().zip(targets.values()).enumerate() {
        let s = endpoint(s, num_nodes)?;
        let t = endpoint(t, num_nodes)?;
        if s == t || !seen.insert((s.min(t), s.max(t))) {
            continue;
        }
        graph.add_edge(NodeIndex::new(s), NodeIndex::new(t), row as u64);
    }
    Ok(graph)
}

/// Node ids of every component, ranked largest first.
pub fn connected_components(graph: &UnGraph<u64, u64>) -> Vec<Vec<u64>> {
    let mut components = Vec::new();
    let mut visited = vec![false; graph.node_count()];
    for start in graph.node_indices() {
        if visited[start.index()] {
            continue;
        }
        visited[start.index()] = true;
        let mut queue = VecDeque::new();
        queue.push_back(start);
        let mut component = Vec::new();
        while let Some(node) = queue.pop_front() {
            component.push(graph[node]);
            for next in graph.neighbors(node) {
                if !visited[next.index()] {
                    visited[next.index()] = true;
                    queue.push_back(next);
                }
            }
        }
        component.sort_unstable();
        components.push(component);
    }
    // stable sort keeps discovery order, i.e. ascending smallest node id, among equal sizes
    components.sort_by(|a, b| b.len().cmp(&a.len()));
    components
}

/// Adds `_component_id` to both tables.
///
/// Fails with a `DataIntegrityError` if an edge's endpoints end up in different components.
pub fn label_components(nodes: &Table, edges: &Table) -> Result<(Table, Table), NetworkDataError> {
    let num_nodes = dense_node_count(nodes)?;
    let graph = connectivity_graph(num_nodes, edges)?;
    let components = connected_components(&graph);

    let mut node_component = vec![0_i64; num_nodes];
    if components.len() > 1 {
        for (component_id, members) in components.iter().enumerate() {
            for &node in members {
                node_component[node as usize] = component_id as i64;
            }
        }
    }

    let sources = edges.require_column(EDGES_TABLE, SOURCE)?;
    let targets = edges.require_column(EDGES_TABLE, TARGET)?;
    let mut edge_component = Vec::with_capacity(edges.num_rows());
    for (s, t) in sources.values().iter().zip(targets.values()) {
        let source_component = node_component[endpoint(s, num_nodes)?];
        let target_component = node_component[endpoint(t, num_nodes)?];
        if source_component != target_component {
            return Err(NetworkDataError::data_integrity(format!(
                "edge {s} -> {t} spans components {source_component} and {target_component}"
            )));
        }
        edge_component.push(Value::Integer(source_component));
    }

    let nodes = nodes.clone().with_computed_column(Column::computed(
        COMPONENT_ID,
        ColumnType::Integer,
        node_component.into_iter().map(Value::Integer).collect(),
    ))?;
    let edges = edges.clone().with_computed_column(Column::computed(
        COMPONENT_ID,
        ColumnType::Integer,
        edge_component,
    ))?;
    debug!(components = components.len(), nodes = num_nodes, "labeled components");
    Ok((nodes, edges))
}

pub fn component_summary(nodes: &Table, edges: &Table) -> Result<ComponentSummary, NetworkDataError> {
    let num_nodes = dense_node_count(nodes)?;
    let graph = connectivity_graph(num_nodes, edges)?;
    let number_of_components = connected_components(&graph).len();
    Ok(ComponentSummary {
        number_of_components,
        is_connected: number_of_components <= 1,
    })
}

/// Articulation points of an undirected simple graph, by node index.
///
/// Iterative depth-first search tracking discovery time and low-link per node.
pub fn articulation_points(graph: &UnGraph<u64, u64>) -> Vec<bool> {
    const UNSEEN: usize = usize::MAX;
    let n = graph.node_count();
    let neighbours = |i: usize| -> Vec<usize> {
        graph
            .neighbors(NodeIndex::new(i))
            .map(|x| x.index())
            .collect()
    };
    let mut disc = vec![UNSEEN; n];
    let mut low = vec![0_usize; n];
    let mut is_cut = vec![false; n];
    let mut timer = 0;

    for root in 0..n {
        if disc[root] != UNSEEN {
            continue;
        }
        disc[root] = timer;
        low[root] = timer;
        timer += 1;
        let mut root_children = 0;
        // (node, parent, neighbours, next neighbour position)
        let mut stack = vec![(root, UNSEEN, neighbours(root), 0_usize)];
        loop {
            let Some(frame) = stack.last_mut() else {
                break;
            };
            let (node, parent) = (frame.0, frame.1);
            if frame.3 < frame.2.len() {
                let next = frame.2[frame.3];
                frame.3 += 1;
                if next == parent {
                    continue;
                }
                if disc[next] == UNSEEN {
                    disc[next] = timer;
                    low[next] = timer;
                    timer += 1;
                    if node == root {
                        root_children += 1;
                    }
                    stack.push((next, node, neighbours(next), 0));
                } else {
                    low[node] = low[node].min(disc[next]);
                }
            } else {
                stack.pop();
                if let Some(up) = stack.last() {
                    let p = up.0;
                    low[p] = low[p].min(low[node]);
                    if p != root && low[node] >= disc[p] {
                        is_cut[p] = true;
                    }
                }
            }
        }
        if root_children > 1 {
            is_cut[root] = true;
        }
    }
    is_cut
}

/// Adds the `_is_cut_point` column to the nodes table.
pub fn label_cut_points(nodes: &Table, edges: &Table) -> Result<Table, NetworkDataError> {
    let num_nodes = dense_node_count(nodes)?;
    let graph = connectivity_graph(num_nodes, edges)?;
    let flags = articulation_points(&graph);
    debug!(
        cut_points = flags.iter().filter(|f| **f).count(),
        "computed cut points"
    );
    nodes.clone().with_computed_column(Column::computed(
        IS_CUT_POINT,
        ColumnType::Boolean,
        flags.into_iter().map(Value::Boolean).collect(),
    ))
}
