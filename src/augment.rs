//! Column augmentation.
//!
//! Two relational passes derive every statistic the four graph interpretations need: one
//! windowed query over the edges table and one aggregate join for the nodes table. Neither pass
//! detects already-augmented input; stale computed columns are simply recomputed.

use tracing::debug;

use crate::{
    engine::Engine,
    errors::NetworkDataError,
    schema::{
        self, BIPARTITE_DEGREE_CENTRALITY, BIPARTITE_DEGREE_CENTRALITY_MULTI, COUNT_DUP_DIRECTED,
        COUNT_DUP_UNDIRECTED, COUNT_EDGES, COUNT_EDGES_MULTI, DEGREE_CENTRALITY,
        DEGREE_CENTRALITY_MULTI, EDGE_ID, EDGES_TABLE, IDX_DUP_DIRECTED, IDX_DUP_UNDIRECTED,
        IN_EDGES, IN_EDGES_MULTI, IS_SOURCE, IS_TARGET, LABEL, NODE_ID, NODES_TABLE, OUT_EDGES,
        OUT_EDGES_MULTI, SOURCE, TARGET, quote_ident,
    },
    table::Table,
};

/// Options for node augmentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeAugmentation {
    /// Leave self-loop rows out of degree and centrality columns.
    pub omit_self_loops: bool,
}

/// Comma-prefixed, quoted list of the user columns of `table`, or an empty string.
pub(crate) fn user_column_list(table: &Table, alias: Option<&str>) -> String {
    let prefix = alias.map(|a| format!("{a}.")).unwrap_or_default();
    table
        .user_columns()
        .map(|c| format!(", {prefix}{}", quote_ident(c.name())))
        .collect()
}

pub(crate) fn check_endpoints(edges: &Table) -> Result<(), NetworkDataError> {
    for name in [SOURCE, TARGET] {
        let column = edges.require_column(EDGES_TABLE, name)?;
        if column.null_count() > 0 {
            return Err(NetworkDataError::data_integrity(format!(
                "column '{name}' of edges table contains null values"
            )));
        }
    }
    Ok(())
}

/// Adds edge ids and duplicate counters to an edges table holding `_source` and `_target`.
///
/// Rows keep their order; `_edge_id` is the zero-based row position. Duplicate indices are
/// 1-based and follow row order within each group.
pub fn augment_edges(edges: &Table) -> Result<Table, NetworkDataError> {
    schema::check_reserved_user_columns(edges, EDGES_TABLE)?;
    check_endpoints(edges)?;

    let s = quote_ident(SOURCE);
    let t = quote_ident(TARGET);
    let pair = format!("min({s}, {t}), max({s}, {t})");
    let sql = format!(
        "SELECT
            ROW_NUMBER() OVER (ORDER BY _rowid_) - 1 AS {edge_id},
            {s}, {t},
            COUNT(*) OVER (PARTITION BY {s}, {t}) AS {count_dir},
            ROW_NUMBER() OVER (PARTITION BY {s}, {t} ORDER BY _rowid_) AS {idx_dir},
            COUNT(*) OVER (PARTITION BY {pair}) AS {count_undir},
            ROW_NUMBER() OVER (PARTITION BY {pair} ORDER BY _rowid_) AS {idx_undir}
            {others}
        FROM {edges}
        ORDER BY _rowid_",
        edge_id = quote_ident(EDGE_ID),
        count_dir = quote_ident(COUNT_DUP_DIRECTED),
        idx_dir = quote_ident(IDX_DUP_DIRECTED),
        count_undir = quote_ident(COUNT_DUP_UNDIRECTED),
        idx_undir = quote_ident(IDX_DUP_UNDIRECTED),
        others = user_column_list(edges, None),
        edges = quote_ident(EDGES_TABLE),
    );

    let engine = Engine::with_tables(&[(EDGES_TABLE, edges)])?;
    let augmented = engine.query(&sql, &[edges])?;
    debug!(rows = augmented.num_rows(), "augmented edges table");
    Ok(augmented)
}

/// Adds degree, direction and centrality columns to a nodes table, using an augmented edges
/// table. Nodes without incident edges get zero counts.
pub fn augment_nodes(nodes: &Table, edges: &Table) -> Result<Table, NetworkDataError> {
    augment_nodes_with(nodes, edges, NodeAugmentation::default())
}

pub fn augment_nodes_with(
    nodes: &Table,
    edges: &Table,
    options: NodeAugmentation,
) -> Result<Table, NetworkDataError> {
    schema::check_reserved_user_columns(nodes, NODES_TABLE)?;
    nodes.require_column(NODES_TABLE, NODE_ID)?;
    nodes.require_column(NODES_TABLE, LABEL)?;
    edges.require_column(EDGES_TABLE, IDX_DUP_DIRECTED)?;
    check_endpoints(edges)?;

    let s = quote_ident(SOURCE);
    let t = quote_ident(TARGET);
    let n_id = quote_ident(NODE_ID);
    let idx = quote_ident(IDX_DUP_DIRECTED);
    let loops = if options.omit_self_loops {
        format!("WHERE {s} != {t}")
    } else {
        String::new()
    };
    let simple = if options.omit_self_loops {
        format!("WHERE {s} != {t} AND {idx} = 1")
    } else {
        format!("WHERE {idx} = 1")
    };
    let edges_ident = quote_ident(EDGES_TABLE);
    let sql = format!(
        "WITH
            in_simple AS (SELECT {t} AS id, COUNT(*) AS n FROM {edges_ident} {simple} GROUP BY {t}),
            in_multi AS (SELECT {t} AS id, COUNT(*) AS n FROM {edges_ident} {loops} GROUP BY {t}),
            out_simple AS (SELECT {s} AS id, COUNT(*) AS n FROM {edges_ident} {simple} GROUP BY {s}),
            out_multi AS (SELECT {s} AS id, COUNT(*) AS n FROM {edges_ident} {loops} GROUP BY {s}),
            sources AS (SELECT DISTINCT {s} AS id FROM {edges_ident}),
            targets AS (SELECT DISTINCT {t} AS id FROM {edges_ident}),
            totals AS (
                SELECT
                    (SELECT COUNT(*) FROM nodes) AS num_nodes,
                    (SELECT COUNT(*) FROM sources) AS num_sources,
                    (SELECT COUNT(*) FROM targets) AS num_targets
            ),
            counted AS (
                SELECT
                    n.{n_id} AS node_id,
                    COALESCE(i_s.n, 0) AS in_s,
                    COALESCE(i_m.n, 0) AS in_m,
                    COALESCE(o_s.n, 0) AS out_s,
                    COALESCE(o_m.n, 0) AS out_m,
                    src.id IS NOT NULL AS is_source,
                    tgt.id IS NOT NULL AS is_target
                FROM nodes n
                LEFT JOIN in_simple i_s ON i_s.id = n.{n_id}
                LEFT JOIN in_multi i_m ON i_m.id = n.{n_id}
                LEFT JOIN out_simple o_s ON o_s.id = n.{n_id}
                LEFT JOIN out_multi o_m ON o_m.id = n.{n_id}
                LEFT JOIN sources src ON src.id = n.{n_id}
                LEFT JOIN targets tgt ON tgt.id = n.{n_id}
            )
        SELECT
            n.{n_id},
            n.{label},
            c.in_s + c.out_s AS {count_edges},
            c.in_m + c.out_m AS {count_edges_multi},
            c.in_s AS {in_edges},
            c.in_m AS {in_edges_multi},
            c.out_s AS {out_edges},
            c.out_m AS {out_edges_multi},
            c.is_source AS {is_source},
            c.is_target AS {is_target},
            CAST(c.in_s + c.out_s AS REAL) / max(tot.num_nodes, 1) AS {centrality},
            CAST(c.in_m + c.out_m AS REAL) / max(tot.num_nodes, 1) AS {centrality_multi},
            CASE WHEN c.is_source
                THEN CAST(c.out_s AS REAL) / max(tot.num_sources, 1)
                ELSE CAST(c.in_s AS REAL) / max(tot.num_targets, 1)
            END AS {bipartite},
            CASE WHEN c.is_source
                THEN CAST(c.out_m AS REAL) / max(tot.num_sources, 1)
                ELSE CAST(c.in_m AS REAL) / max(tot.num_targets, 1)
            END AS {bipartite_multi}
            {others}
        FROM nodes n
        JOIN counted c ON c.node_id = n.{n_id}
        CROSS JOIN totals tot
        ORDER BY n.{n_id}",
        label = quote_ident(LABEL),
        count_edges = quote_ident(COUNT_EDGES),
        count_edges_multi = quote_ident(COUNT_EDGES_MULTI),
        in_edges = quote_ident(IN_EDGES),
        in_edges_multi = quote_ident(IN_EDGES_MULTI),
        out_edges = quote_ident(OUT_EDGES),
        out_edges_multi = quote_ident(OUT_EDGES_MULTI),
        is_source = quote_ident(IS_SOURCE),
        is_target = quote_ident(IS_TARGET),
        centrality = quote_ident(DEGREE_CENTRALITY),
        centrality_multi = quote_ident(DEGREE_CENTRALITY_MULTI),
        bipartite = quote_ident(BIPARTITE_DEGREE_CENTRALITY),
        bipartite_multi = quote_ident(BIPARTITE_DEGREE_CENTRALITY_MULTI),
        others = user_column_list(nodes, Some("n")),
    );

    let engine = Engine::with_tables(&[(NODES_TABLE, nodes), (EDGES_TABLE, edges)])?;
    let augmented = engine.query(&sql, &[nodes])?;
    debug!(
        rows = augmented.num_rows(),
        omit_self_loops = options.omit_self_loops,
        "augmented nodes table"
    );
    Ok(augmented)
}
