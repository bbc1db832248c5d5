//! Node identity mapping.
//!
//! Original node identifiers (booleans, integers or strings) are translated into dense ids in
//! `[0, number_of_nodes)`. With an explicit nodes table ids follow its row order; otherwise
//! the node set is the union of all edge endpoints, numbered in ascending identifier order
//! (booleans, then integers, then strings).

use std::{collections::BTreeSet, fmt};

use ahash::AHashMap;
use tracing::debug;

use crate::{
    errors::NetworkDataError,
    schema::{LABEL, NODE_ID, SOURCE, TARGET},
    table::{Column, ColumnType, Table, Value},
};

/// Hashable form of an original node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKey {
    Boolean(bool),
    Integer(i64),
    Text(String),
}

impl NodeKey {
    /// Returns `None` for null values.
    pub fn from_value(value: &Value) -> Option<NodeKey> {
        match value {
            Value::Null => None,
            Value::Integer(v) => Some(NodeKey::Integer(*v)),
            Value::Boolean(b) => Some(NodeKey::Boolean(*b)),
            Value::Real(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
                Some(NodeKey::Integer(*v as i64))
            }
            Value::Text(s) => Some(NodeKey::Text(s.clone())),
            other => Some(NodeKey::Text(other.to_string())),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            NodeKey::Boolean(b) => Value::Boolean(*b),
            NodeKey::Integer(v) => Value::Integer(*v),
            NodeKey::Text(s) => Value::Text(s.clone()),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Boolean(b) => write!(f, "{b}"),
            NodeKey::Integer(v) => write!(f, "{v}"),
            NodeKey::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for NodeKey {
    fn from(v: i64) -> Self {
        NodeKey::Integer(v)
    }
}

impl From<&str> for NodeKey {
    fn from(v: &str) -> Self {
        NodeKey::Text(v.to_string())
    }
}

/// Bijection between original identifiers and dense node ids.
#[derive(Debug, Clone, Default)]
pub struct NodeIdMap {
    forward: AHashMap<NodeKey, u64>,
    keys: Vec<NodeKey>,
}

impl NodeIdMap {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, key: &NodeKey) -> Option<u64> {
        self.forward.get(key).copied()
    }

    pub fn original(&self, node_id: u64) -> Option<&NodeKey> {
        self.keys.get(node_id as usize)
    }

    pub fn keys(&self) -> &[NodeKey] {
        &self.keys
    }

    pub fn resolve(&self, value: &Value) -> Result<u64, NetworkDataError> {
        let key = NodeKey::from_value(value)
            .ok_or_else(|| NetworkDataError::data_integrity("edge endpoint is null"))?;
        self.get(&key).ok_or_else(|| {
            NetworkDataError::referential_integrity(
                "edge endpoint not present in nodes table",
                key.to_string(),
            )
        })
    }
}

/// Single-use builder assigning dense ids in insertion order.
#[derive(Debug, Default)]
pub struct NodeIdMapBuilder {
    map: NodeIdMap,
}

impl NodeIdMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_assign(&mut self, key: NodeKey) -> u64 {
        if let Some(id) = self.map.forward.get(&key) {
            return *id;
        }
        let id = self.map.keys.len() as u64;
        self.map.keys.push(key.clone());
        self.map.forward.insert(key, id);
        id
    }

    /// Like [`get_or_assign`](Self::get_or_assign), but a key seen before is an error.
    pub fn insert_unique(&mut self, key: NodeKey) -> Result<u64, NetworkDataError> {
        if self.map.forward.contains_key(&key) {
            return Err(NetworkDataError::data_integrity(format!(
                "duplicate node id '{key}' in nodes table"
            )));
        }
        Ok(self.get_or_assign(key))
    }

    pub fn finish(self) -> NodeIdMap {
        self.map
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NodeColumns<'a> {
    pub table: &'a Table,
    pub id: &'a str,
    pub label: Option<&'a str>,
}

/// Raw tables with dense ids applied, ready for augmentation.
#[derive(Debug, Clone)]
pub struct MappedTables {
    pub nodes: Table,
    pub edges: Table,
    pub id_map: NodeIdMap,
}

/// Assigns dense node ids and rewrites edge endpoints.
///
/// The output nodes table starts with `_node_id` and `_label`, followed by the user columns of
/// the nodes table (or a single `id` column holding the original identifier when no nodes
/// table is given). The output edges table starts with `_source` and `_target`, followed by the
/// edge user columns other than the original endpoint columns.
pub fn map_identities(
    edges: &Table,
    source: &str,
    target: &str,
    nodes: Option<NodeColumns<'_>>,
) -> Result<MappedTables, NetworkDataError> {
    let source_column = edges.require_column("edges", source)?;
    let target_column = edges.require_column("edges", target)?;
    for column in [source_column, target_column] {
        if column.null_count() > 0 {
            return Err(NetworkDataError::data_integrity(format!(
                "column '{}' of edges table contains null values",
                column.name()
            )));
        }
    }

    let (id_map, nodes_table) = match nodes {
        Some(node_columns) => map_explicit_nodes(node_columns)?,
        None => map_implicit_nodes(source_column.values(), target_column.values())?,
    };

    let mut sources = Vec::with_capacity(edges.num_rows());
    let mut targets = Vec::with_capacity(edges.num_rows());
    for (s, t) in source_column.values().iter().zip(target_column.values()) {
        sources.push(Value::Integer(id_map.resolve(s)? as i64));
        targets.push(Value::Integer(id_map.resolve(t)? as i64));
    }
    let mut columns = vec![
        Column::computed(SOURCE, ColumnType::Integer, sources),
        Column::computed(TARGET, ColumnType::Integer, targets),
    ];
    columns.extend(
        edges
            .user_columns()
            .filter(|c| c.name() != source && c.name() != target)
            .cloned(),
    );
    let mut edges_table = Table::from_columns(columns)?;
    edges_table.set_num_rows_if_empty(edges.num_rows());

    debug!(
        nodes = id_map.len(),
        edges = edges_table.num_rows(),
        "mapped node identities"
    );
    Ok(MappedTables {
        nodes: nodes_table,
        edges: edges_table,
        id_map,
    })
}

fn map_explicit_nodes(node_columns: NodeColumns<'_>) -> Result<(NodeIdMap, Table), NetworkDataError> {
    let id_column = node_columns
        .table
        .column(node_columns.id)
        .ok_or_else(|| {
            NetworkDataError::configuration(format!(
                "could not find id column '{}' in nodes table, use one of: {}",
                node_columns.id,
                node_columns.table.column_names().join(", ")
            ))
        })?;
    let label_column = match node_columns.label {
        Some(name) => Some(node_columns.table.require_column("nodes", name)?),
        None => None,
    };

    let mut builder = NodeIdMapBuilder::new();
    let mut node_ids = Vec::with_capacity(id_column.len());
    let mut labels = Vec::with_capacity(id_column.len());
    for (row, value) in id_column.values().iter().enumerate() {
        let key = NodeKey::from_value(value).ok_or_else(|| {
            NetworkDataError::data_integrity(format!("node id in row {row} is null"))
        })?;
        let label = match label_column.and_then(|c| c.get(row)) {
            Some(v) if !v.is_null() => v.to_string(),
            _ => key.to_string(),
        };
        node_ids.push(Value::Integer(builder.insert_unique(key)? as i64));
        labels.push(Value::Text(label));
    }

    let mut columns = vec![
        Column::computed(NODE_ID, ColumnType::Integer, node_ids),
        Column::computed(LABEL, ColumnType::Text, labels),
    ];
    columns.extend(node_columns.table.user_columns().cloned());
    Ok((builder.finish(), Table::from_columns(columns)?))
}

fn map_implicit_nodes(
    sources: &[Value],
    targets: &[Value],
) -> Result<(NodeIdMap, Table), NetworkDataError> {
    let mut keys = BTreeSet::new();
    for value in sources.iter().chain(targets) {
        let key = NodeKey::from_value(value)
            .ok_or_else(|| NetworkDataError::data_integrity("edge endpoint is null"))?;
        keys.insert(key);
    }
    let mut builder = NodeIdMapBuilder::new();
    let mut node_ids = Vec::with_capacity(keys.len());
    let mut labels = Vec::with_capacity(keys.len());
    let mut originals = Vec::with_capacity(keys.len());
    for key in keys {
        labels.push(Value::Text(key.to_string()));
        originals.push(key.to_value());
        node_ids.push(Value::Integer(builder.get_or_assign(key) as i64));
    }
    let table = Table::from_columns(vec![
        Column::computed(NODE_ID, ColumnType::Integer, node_ids),
        Column::computed(LABEL, ColumnType::Text, labels),
        Column::new("id", originals),
    ])?;
    Ok((builder.finish(), table))
}
