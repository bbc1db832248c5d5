use crate::{
    errors::NetworkDataError,
    table::{Column, ColumnType, Table, Value},
};

pub const RESERVED_PREFIX: &str = "_";

pub const NODES_TABLE: &str = "nodes";
pub const EDGES_TABLE: &str = "edges";

pub const NODE_ID: &str = "_node_id";
pub const LABEL: &str = "_label";
pub const COUNT_EDGES: &str = "_count_edges";
pub const COUNT_EDGES_MULTI: &str = "_count_edges_multi";
pub const IN_EDGES: &str = "_in_edges";
pub const IN_EDGES_MULTI: &str = "_in_edges_multi";
pub const OUT_EDGES: &str = "_out_edges";
pub const OUT_EDGES_MULTI: &str = "_out_edges_multi";
pub const IS_SOURCE: &str = "_is_source";
pub const IS_TARGET: &str = "_is_target";
pub const DEGREE_CENTRALITY: &str = "_degree_centrality";
pub const DEGREE_CENTRALITY_MULTI: &str = "_degree_centrality_multi";
pub const BIPARTITE_DEGREE_CENTRALITY: &str = "_bipartite_degree_centrality";
pub const BIPARTITE_DEGREE_CENTRALITY_MULTI: &str = "_bipartite_degree_centrality_multi";
pub const COMPONENT_ID: &str = "_component_id";
pub const IS_CUT_POINT: &str = "_is_cut_point";

pub const EDGE_ID: &str = "_edge_id";
pub const SOURCE: &str = "_source";
pub const TARGET: &str = "_target";
pub const COUNT_DUP_DIRECTED: &str = "_count_dup_directed";
pub const IDX_DUP_DIRECTED: &str = "_idx_dup_directed";
pub const COUNT_DUP_UNDIRECTED: &str = "_count_dup_undirected";
pub const IDX_DUP_UNDIRECTED: &str = "_idx_dup_undirected";

/// Computed node columns produced by node augmentation, in output order.
pub const NODE_AUGMENTED_COLUMNS: &[&str] = &[
    COUNT_EDGES,
    COUNT_EDGES_MULTI,
    IN_EDGES,
    IN_EDGES_MULTI,
    OUT_EDGES,
    OUT_EDGES_MULTI,
    IS_SOURCE,
    IS_TARGET,
    DEGREE_CENTRALITY,
    DEGREE_CENTRALITY_MULTI,
    BIPARTITE_DEGREE_CENTRALITY,
    BIPARTITE_DEGREE_CENTRALITY_MULTI,
];

/// Computed edge columns produced by edge augmentation, in output order.
pub const EDGE_AUGMENTED_COLUMNS: &[&str] = &[
    EDGE_ID,
    SOURCE,
    TARGET,
    COUNT_DUP_DIRECTED,
    IDX_DUP_DIRECTED,
    COUNT_DUP_UNDIRECTED,
    IDX_DUP_UNDIRECTED,
];

pub fn is_reserved(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

/// Type of a computed column, if `name` is one.
pub fn computed_column_type(name: &str) -> Option<ColumnType> {
    let kind = match name {
        LABEL => ColumnType::Text,
        IS_SOURCE | IS_TARGET | IS_CUT_POINT => ColumnType::Boolean,
        DEGREE_CENTRALITY
        | DEGREE_CENTRALITY_MULTI
        | BIPARTITE_DEGREE_CENTRALITY
        | BIPARTITE_DEGREE_CENTRALITY_MULTI => ColumnType::Real,
        NODE_ID | COUNT_EDGES | COUNT_EDGES_MULTI | IN_EDGES | IN_EDGES_MULTI | OUT_EDGES
        | OUT_EDGES_MULTI | COMPONENT_ID | EDGE_ID | SOURCE | TARGET | COUNT_DUP_DIRECTED
        | IDX_DUP_DIRECTED | COUNT_DUP_UNDIRECTED | IDX_DUP_UNDIRECTED => ColumnType::Integer,
        _ => return None,
    };
    Some(kind)
}

/// One-line description of a computed column.
pub fn column_doc(name: &str) -> Option<&'static str> {
    let doc = match name {
        NODE_ID => "Dense node identifier in [0, number_of_nodes).",
        LABEL => "Node label, the stringified original id unless a label column was given.",
        COUNT_EDGES => "Number of distinct incoming plus outgoing neighbours (directed simple interpretation).",
        COUNT_EDGES_MULTI => "Number of incoming plus outgoing edge rows, parallel edges included.",
        IN_EDGES => "Number of distinct nodes with an edge pointing to this node.",
        IN_EDGES_MULTI => "Number of edge rows pointing to this node.",
        OUT_EDGES => "Number of distinct nodes this node points to.",
        OUT_EDGES_MULTI => "Number of edge rows originating from this node.",
        IS_SOURCE => "Whether this node is the source of at least one edge.",
        IS_TARGET => "Whether this node is the target of at least one edge.",
        DEGREE_CENTRALITY => "Simple degree divided by the number of nodes.",
        DEGREE_CENTRALITY_MULTI => "Multi degree divided by the number of nodes.",
        BIPARTITE_DEGREE_CENTRALITY => {
            "Simple degree divided by the number of nodes on the opposite side (sources or targets)."
        }
        BIPARTITE_DEGREE_CENTRALITY_MULTI => {
            "Multi degree divided by the number of nodes on the opposite side (sources or targets)."
        }
        COMPONENT_ID => "Connected component id; 0 is the largest component.",
        IS_CUT_POINT => "Whether removing this node disconnects its component.",
        EDGE_ID => "Dense edge identifier, assigned in row order.",
        SOURCE => "Node id of the edge source.",
        TARGET => "Node id of the edge target.",
        COUNT_DUP_DIRECTED => "Number of edge rows sharing this (source, target) pair.",
        IDX_DUP_DIRECTED => "1-based position of this row within its (source, target) group.",
        COUNT_DUP_UNDIRECTED => "Number of edge rows sharing this unordered node pair.",
        IDX_DUP_UNDIRECTED => "1-based position of this row within its unordered node pair group.",
        _ => return None,
    };
    Some(doc)
}

/// Rejects user columns whose name collides with the reserved prefix.
pub fn check_reserved_user_columns(table: &Table, table_name: &str) -> Result<(), NetworkDataError> {
    let reserved: Vec<String> = table
        .user_columns()
        .filter(|c| is_reserved(c.name()))
        .map(|c| c.name().to_string())
        .collect();
    if reserved.is_empty() {
        return Ok(());
    }
    Err(NetworkDataError::configuration(format!(
        "{table_name} table contains column name(s) with reserved prefix '{RESERVED_PREFIX}': {}",
        reserved.join(", ")
    )))
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// `CREATE TABLE` statement mirroring the column layout of `table`.
///
/// Text columns holding other storage classes are declared without a type, so SQLite keeps
/// every value as inserted instead of applying text affinity.
pub fn create_table_sql(name: &str, table: &Table) -> String {
    let columns: Vec<String> = table
        .columns()
        .iter()
        .map(|c| match declared_type(c) {
            Some(kind) => format!("{} {kind}", quote_ident(c.name())),
            None => quote_ident(c.name()),
        })
        .collect();
    format!("CREATE TABLE {} ({})", quote_ident(name), columns.join(", "))
}

fn declared_type(column: &Column) -> Option<&'static str> {
    let mixed = column.kind() == ColumnType::Text
        && column
            .values()
            .iter()
            .any(|v| !matches!(v, Value::Null | Value::Text(_)));
    if mixed { None } else { Some(column.kind().sql_type()) }
}
