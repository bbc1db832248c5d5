use std::{collections::BTreeMap, fmt, str::FromStr};

use ahash::AHashSet;
use petgraph::{
    Directed, EdgeType, Undirected,
    graph::{Graph, NodeIndex},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    components,
    errors::NetworkDataError,
    identity::{NodeIdMapBuilder, NodeKey},
    network::NetworkData,
    schema::{
        self, EDGES_TABLE, IDX_DUP_DIRECTED, IDX_DUP_UNDIRECTED, LABEL, NODE_ID, NODES_TABLE,
        SOURCE, TARGET,
    },
    table::{Column, ColumnType, Table, Value},
};

pub type Attributes = BTreeMap<String, Value>;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum GraphType {
    Directed,
    #[default]
    DirectedMulti,
    Undirected,
    UndirectedMulti,
}

impl GraphType {
    pub const ALL: [GraphType; 4] = [
        GraphType::Directed,
        GraphType::DirectedMulti,
        GraphType::Undirected,
        GraphType::UndirectedMulti,
    ];

    pub fn is_directed(self) -> bool {
        matches!(self, GraphType::Directed | GraphType::DirectedMulti)
    }

    pub fn is_multi(self) -> bool {
        matches!(self, GraphType::DirectedMulti | GraphType::UndirectedMulti)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GraphType::Directed => "directed",
            GraphType::DirectedMulti => "directed_multi",
            GraphType::Undirected => "undirected",
            GraphType::UndirectedMulti => "undirected_multi",
        }
    }

    /// Duplicate-index column selecting one row per edge in the simple interpretation.
    pub(crate) fn dedup_column(self) -> &'static str {
        if self.is_directed() {
            IDX_DUP_DIRECTED
        } else {
            IDX_DUP_UNDIRECTED
        }
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphType {
    type Err = NetworkDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GraphType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                NetworkDataError::configuration(format!(
                    "invalid graph type '{s}', use one of: {}",
                    GraphType::ALL.map(GraphType::as_str).join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AttributeSelection {
    #[default]
    None,
    All,
    /// Every column, computed ones included.
    AllWithComputed,
    Named(Vec<String>),
}

impl AttributeSelection {
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AttributeSelection::Named(names.into_iter().map(Into::into).collect())
    }

    fn resolve(
        &self,
        table: &Table,
        table_name: &str,
        identity: &[&str],
    ) -> Result<Vec<String>, NetworkDataError> {
        Ok(match self {
            AttributeSelection::None => Vec::new(),
            AttributeSelection::All => table.user_columns().map(|c| c.name().to_string()).collect(),
            AttributeSelection::AllWithComputed => table
                .column_names()
                .into_iter()
                .filter(|name| !identity.contains(&name.as_str()))
                .collect(),
            AttributeSelection::Named(names) => {
                for name in names {
                    table.require_column(table_name, name)?;
                }
                names.clone()
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportOptions {
    pub graph_type: GraphType,
    pub node_attributes: AttributeSelection,
    pub edge_attributes: AttributeSelection,
    pub omit_self_loops: bool,
}

impl ExportOptions {
    pub fn new(graph_type: GraphType) -> Self {
        Self {
            graph_type,
            ..Self::default()
        }
    }

    pub fn node_attributes(mut self, selection: AttributeSelection) -> Self {
        self.node_attributes = selection;
        self
    }

    pub fn edge_attributes(mut self, selection: AttributeSelection) -> Self {
        self.edge_attributes = selection;
        self
    }

    pub fn omit_self_loops(mut self, omit: bool) -> Self {
        self.omit_self_loops = omit;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    /// Dense node id on export, any non-null identifier on import.
    pub id: Value,
    pub label: Option<String>,
    pub attributes: Attributes,
}

impl GraphNode {
    pub fn new<V: Into<Value>>(id: V) -> Self {
        Self {
            id: id.into(),
            label: None,
            attributes: Attributes::new(),
        }
    }

    pub fn with_label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_attribute<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeIndexMap {
    to_index: Vec<NodeIndex>,
    to_node_id: Vec<u64>,
}

impl NodeIndexMap {
    fn insert(&mut self, node_id: u64, index: NodeIndex) {
        let slot = node_id as usize;
        if self.to_index.len() <= slot {
            self.to_index.resize(slot + 1, NodeIndex::end());
        }
        self.to_index[slot] = index;
        if self.to_node_id.len() <= index.index() {
            self.to_node_id.resize(index.index() + 1, u64::MAX);
        }
        self.to_node_id[index.index()] = node_id;
    }

    pub fn node_index(&self, node_id: u64) -> Option<NodeIndex> {
        self.to_index
            .get(node_id as usize)
            .copied()
            .filter(|idx| *idx != NodeIndex::end())
    }

    pub fn node_id(&self, index: NodeIndex) -> Option<u64> {
        self.to_node_id
            .get(index.index())
            .copied()
            .filter(|id| *id != u64::MAX)
    }

    pub fn len(&self) -> usize {
        self.to_node_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_node_id.is_empty()
    }

    pub fn node_ids<I: IntoIterator<Item = NodeIndex>>(&self, indices: I) -> Vec<u64> {
        indices.into_iter().filter_map(|i| self.node_id(i)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct AttributeGraph<Ty: EdgeType> {
    pub graph: Graph<GraphNode, Attributes, Ty>,
    pub node_map: NodeIndexMap,
}

#[derive(Debug, Clone)]
pub enum ExportedGraph {
    Directed(AttributeGraph<Directed>),
    Undirected(AttributeGraph<Undirected>),
}

impl ExportedGraph {
    pub fn node_count(&self) -> usize {
        match self {
            ExportedGraph::Directed(g) => g.graph.node_count(),
            ExportedGraph::Undirected(g) => g.graph.node_count(),
        }
    }

    pub fn edge_count(&self) -> usize {
        match self {
            ExportedGraph::Directed(g) => g.graph.edge_count(),
            ExportedGraph::Undirected(g) => g.graph.edge_count(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompactGraph<Ty: EdgeType> {
    pub graph: Graph<u64, u64, Ty>,
    pub node_map: NodeIndexMap,
}

impl CompactGraph<Undirected> {
    /// Node ids whose removal disconnects their component.
    pub fn cut_points(&self) -> Vec<u64> {
        let flags = components::articulation_points(&self.graph);
        self.node_map.node_ids(
            flags
                .iter()
                .enumerate()
                .filter(|(_, is_cut)| **is_cut)
                .map(|(i, _)| NodeIndex::new(i)),
        )
    }
}

fn row_attributes(table: &Table, names: &[String], row: usize) -> Attributes {
    names
        .iter()
        .filter_map(|name| {
            table
                .value(name, row)
                .map(|value| (name.clone(), value.clone()))
        })
        .collect()
}

fn endpoint_ids(
    edges: &Table,
) -> Result<(&[Value], &[Value]), NetworkDataError> {
    Ok((
        edges.require_column(EDGES_TABLE, SOURCE)?.values(),
        edges.require_column(EDGES_TABLE, TARGET)?.values(),
    ))
}

fn as_node_id(value: &Value) -> Result<u64, NetworkDataError> {
    value
        .as_i64()
        .filter(|id| *id >= 0)
        .map(|id| id as u64)
        .ok_or_else(|| {
            NetworkDataError::referential_integrity(
                "edge endpoint does not reference a node",
                value.to_string(),
            )
        })
}

impl NetworkData {
    /// Materializes one interpretation as an attribute graph.
    ///
    /// Simple interpretations merge parallel rows into one edge whose attributes are the union
    /// of the rows' attributes, later rows overriding earlier ones. Multi interpretations keep
    /// every row as its own edge.
    pub fn as_graph(&self, options: &ExportOptions) -> Result<ExportedGraph, NetworkDataError> {
        Ok(if options.graph_type.is_directed() {
            ExportedGraph::Directed(self.as_graph_type::<Directed>(options)?)
        } else {
            ExportedGraph::Undirected(self.as_graph_type::<Undirected>(options)?)
        })
    }

    /// Like [`NetworkData::as_graph`], with the edge direction fixed by `Ty`.
    ///
    /// The directedness of `options.graph_type` is ignored; only its simple/multi part is used.
    pub fn as_graph_type<Ty: EdgeType>(
        &self,
        options: &ExportOptions,
    ) -> Result<AttributeGraph<Ty>, NetworkDataError> {
        let nodes = self.nodes();
        let edges = self.edges();
        let node_attrs = options
            .node_attributes
            .resolve(nodes, NODES_TABLE, &[NODE_ID])?;
        let edge_attrs = options
            .edge_attributes
            .resolve(edges, EDGES_TABLE, &[SOURCE, TARGET])?;

        let mut graph: Graph<GraphNode, Attributes, Ty> =
            Graph::with_capacity(self.num_nodes(), self.num_edges());
        let mut node_map = NodeIndexMap::default();
        let labels = nodes.require_column(NODES_TABLE, LABEL)?;
        for row in 0..self.num_nodes() {
            let node = GraphNode {
                id: Value::Integer(row as i64),
                label: labels.get(row).map(|v| v.to_string()),
                attributes: row_attributes(nodes, &node_attrs, row),
            };
            let index = graph.add_node(node);
            node_map.insert(row as u64, index);
        }

        let (sources, targets) = endpoint_ids(edges)?;
        let multi = options.graph_type.is_multi();
        for (row, (s, t)) in sources.iter().zip(targets).enumerate() {
            let (s, t) = (as_node_id(s)?, as_node_id(t)?);
            if options.omit_self_loops && s == t {
                continue;
            }
            let (Some(a), Some(b)) = (node_map.node_index(s), node_map.node_index(t)) else {
                return Err(NetworkDataError::referential_integrity(
                    "edge endpoint does not reference a node",
                    format!("{s} -> {t}"),
                ));
            };
            let attributes = row_attributes(edges, &edge_attrs, row);
            if !multi {
                if let Some(existing) = graph.find_edge(a, b) {
                    graph[existing].extend(attributes);
                    continue;
                }
            }
            graph.add_edge(a, b, attributes);
        }
        debug!(
            graph_type = %options.graph_type,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "exported attribute graph"
        );
        Ok(AttributeGraph { graph, node_map })
    }

    /// Builds a compact graph (node weight = node id, edge weight = edge id).
    ///
    /// Simple interpretations keep the first row of every group of parallel edges, selected
    /// through the precomputed duplicate-index columns.
    pub fn as_compact_graph<Ty: EdgeType>(
        &self,
        multi: bool,
        omit_self_loops: bool,
    ) -> Result<CompactGraph<Ty>, NetworkDataError> {
        let graph_type = match (Ty::is_directed(), multi) {
            (true, true) => GraphType::DirectedMulti,
            (true, false) => GraphType::Directed,
            (false, true) => GraphType::UndirectedMulti,
            (false, false) => GraphType::Undirected,
        };
        let edges = self.edges();
        let (sources, targets) = endpoint_ids(edges)?;
        let dedup = if multi {
            None
        } else {
            Some(edges.require_column(EDGES_TABLE, graph_type.dedup_column())?)
        };

        let mut graph: Graph<u64, u64, Ty> =
            Graph::with_capacity(self.num_nodes(), self.num_edges());
        let mut node_map = NodeIndexMap::default();
        for node_id in 0..self.num_nodes() as u64 {
            let index = graph.add_node(node_id);
            node_map.insert(node_id, index);
        }
        for (row, (s, t)) in sources.iter().zip(targets).enumerate() {
            if let Some(idx) = dedup {
                if idx.get(row).and_then(Value::as_i64) != Some(1) {
                    continue;
                }
            }
            let (s, t) = (as_node_id(s)?, as_node_id(t)?);
            if omit_self_loops && s == t {
                continue;
            }
            let (Some(a), Some(b)) = (node_map.node_index(s), node_map.node_index(t)) else {
                return Err(NetworkDataError::referential_integrity(
                    "edge endpoint does not reference a node",
                    format!("{s} -> {t}"),
                ));
            };
            graph.add_edge(a, b, row as u64);
        }
        Ok(CompactGraph { graph, node_map })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Node attributes tried, in order, as the node label. Falls back to
    /// [`GraphNode::label`] and then to the stringified node id.
    pub label_attributes: Vec<String>,
    pub ignore_node_attributes: Vec<String>,
}

impl ImportOptions {
    pub fn label_attribute<S: Into<String>>(mut self, name: S) -> Self {
        self.label_attributes.push(name.into());
        self
    }

    pub fn ignore_node_attribute<S: Into<String>>(mut self, name: S) -> Self {
        self.ignore_node_attributes.push(name.into());
        self
    }
}

fn attribute_columns(
    maps: &[&Attributes],
    ignore: &[String],
    kind: &str,
) -> Result<Vec<Column>, NetworkDataError> {
    let mut names = Vec::new();
    let mut seen = AHashSet::new();
    for map in maps {
        for key in map.keys() {
            if ignore.contains(key) || !seen.insert(key.as_str()) {
                continue;
            }
            if schema::is_reserved(key) {
                return Err(NetworkDataError::data_integrity(format!(
                    "graph contains {kind} attribute '{key}' starting with the reserved prefix '{}'",
                    schema::RESERVED_PREFIX
                )));
            }
            names.push(key.clone());
        }
    }
    let mut values: Vec<Vec<Value>> = vec![Vec::with_capacity(maps.len()); names.len()];
    for map in maps {
        for (name, column) in names.iter().zip(values.iter_mut()) {
            column.push(map.get(name).cloned().unwrap_or(Value::Null));
        }
    }
    Ok(names
        .into_iter()
        .zip(values)
        .map(|(name, values)| Column::new(name, values))
        .collect())
}

impl NetworkData {
    /// Imports an attribute graph.
    ///
    /// Nodes are numbered in graph index order. Node identifiers must be unique and non-null;
    /// attribute names starting with the reserved prefix are rejected.
    pub fn from_graph<Ty: EdgeType>(
        graph: &Graph<GraphNode, Attributes, Ty>,
        options: &ImportOptions,
    ) -> Result<NetworkData, NetworkDataError> {
        let mut builder = NodeIdMapBuilder::new();
        let mut node_ids = Vec::with_capacity(graph.node_count());
        let mut labels = Vec::with_capacity(graph.node_count());
        for index in graph.node_indices() {
            let node = &graph[index];
            let key = NodeKey::from_value(&node.id).ok_or_else(|| {
                NetworkDataError::data_integrity(format!("node at index {} has a null id", index.index()))
            })?;
            let label = options
                .label_attributes
                .iter()
                .filter_map(|name| node.attributes.get(name))
                .find(|v| !v.is_null() && !v.to_string().is_empty())
                .map(|v| v.to_string())
                .or_else(|| node.label.clone())
                .unwrap_or_else(|| key.to_string());
            node_ids.push(Value::Integer(builder.insert_unique(key)? as i64));
            labels.push(Value::Text(label));
        }
        let mut node_columns = vec![
            Column::computed(NODE_ID, ColumnType::Integer, node_ids),
            Column::computed(LABEL, ColumnType::Text, labels),
        ];
        let node_maps: Vec<&Attributes> = graph
            .node_indices()
            .map(|index| &graph[index].attributes)
            .collect();
        node_columns.extend(attribute_columns(
            &node_maps,
            &options.ignore_node_attributes,
            "node",
        )?);

        let mut sources = Vec::with_capacity(graph.edge_count());
        let mut targets = Vec::with_capacity(graph.edge_count());
        for edge in graph.raw_edges() {
            sources.push(Value::Integer(edge.source().index() as i64));
            targets.push(Value::Integer(edge.target().index() as i64));
        }
        let mut edge_columns = vec![
            Column::computed(SOURCE, ColumnType::Integer, sources),
            Column::computed(TARGET, ColumnType::Integer, targets),
        ];
        let edge_maps: Vec<&Attributes> = graph.raw_edges().iter().map(|e| &e.weight).collect();
        edge_columns.extend(attribute_columns(&edge_maps, &[], "edge")?);

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            directed = Ty::is_directed(),
            "imported graph"
        );
        NetworkData::create(
            Table::from_columns(node_columns)?,
            Table::from_columns(edge_columns)?,
            true,
        )
    }
}
