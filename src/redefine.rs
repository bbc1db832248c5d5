use std::{fmt, str::FromStr};

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    engine::Engine,
    errors::NetworkDataError,
    network::{CreateOptions, NetworkData},
    schema::{self, EDGE_ID, EDGES_TABLE, SOURCE, TARGET, quote_ident, quote_literal},
    table::{ColumnType, Provenance, Table},
};

/// How the values of a source column are combined within a group of parallel edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Sum,
    /// Number of edge rows in the group.
    Count,
    /// All values, in edge order, as a list cell.
    List,
    /// All values joined into one string.
    StringConcat,
    /// Adds the column to the grouping key instead of aggregating it.
    GroupBy,
}

impl Aggregation {
    pub const NAMES: &'static [&'static str] = &["sum", "count", "list", "string_concat", "group_by"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::Count => "count",
            Aggregation::List => "list",
            Aggregation::StringConcat => "string_concat",
            Aggregation::GroupBy => "group_by",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = NetworkDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sum" => Ok(Aggregation::Sum),
            "count" => Ok(Aggregation::Count),
            "list" => Ok(Aggregation::List),
            "string_concat" | "concat" => Ok(Aggregation::StringConcat),
            "group_by" | "groupby" => Ok(Aggregation::GroupBy),
            other => Err(NetworkDataError::configuration(format!(
                "invalid aggregation function '{other}', use one of: {}",
                Self::NAMES.join(", ")
            ))),
        }
    }
}

/// One output column of a redefined edges table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeAggregation {
    pub source_column: String,
    pub target_column: String,
    pub aggregation: Aggregation,
}

impl AttributeAggregation {
    pub fn new<S: Into<String>, T: Into<String>>(
        source_column: S,
        target_column: T,
        aggregation: Aggregation,
    ) -> Self {
        Self {
            source_column: source_column.into(),
            target_column: target_column.into(),
            aggregation,
        }
    }

    /// Like [`AttributeAggregation::new`], with the aggregation given by name.
    pub fn parse<S: Into<String>, T: Into<String>>(
        source_column: S,
        target_column: T,
        aggregation: &str,
    ) -> Result<Self, NetworkDataError> {
        Ok(Self::new(source_column, target_column, aggregation.parse()?))
    }
}

/// Validated set of output columns for [`NetworkData::redefine_edges`].
///
/// Edge attributes that are not named here do not survive the redefinition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRedefinition {
    aggregations: Vec<AttributeAggregation>,
    separator: String,
}

impl EdgeRedefinition {
    pub fn new(aggregations: Vec<AttributeAggregation>) -> Result<Self, NetworkDataError> {
        let mut targets = AHashSet::new();
        for agg in &aggregations {
            if agg.target_column.is_empty() {
                return Err(NetworkDataError::configuration(
                    "aggregation target column name must not be empty",
                ));
            }
            if schema::is_reserved(&agg.target_column) {
                return Err(NetworkDataError::configuration(format!(
                    "aggregation target column '{}' uses the reserved prefix '{}'",
                    agg.target_column,
                    schema::RESERVED_PREFIX
                )));
            }
            if !targets.insert(agg.target_column.as_str()) {
                return Err(NetworkDataError::configuration(format!(
                    "aggregation target column '{}' is given more than once",
                    agg.target_column
                )));
            }
        }
        Ok(Self {
            aggregations,
            separator: ",".to_string(),
        })
    }

    /// Separator used by [`Aggregation::StringConcat`]; defaults to `","`.
    pub fn with_separator<S: Into<String>>(mut self, separator: S) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn aggregations(&self) -> &[AttributeAggregation] {
        &self.aggregations
    }

    fn select_expr(&self, agg: &AttributeAggregation) -> String {
        let column = quote_ident(&agg.source_column);
        let target = quote_ident(&agg.target_column);
        match agg.aggregation {
            Aggregation::Sum => format!("SUM({column}) AS {target}"),
            Aggregation::Count => format!("COUNT(*) AS {target}"),
            Aggregation::List => format!("json_group_array({column}) AS {target}"),
            Aggregation::StringConcat => format!(
                "group_concat(CAST({column} AS TEXT), {}) AS {target}",
                quote_literal(&self.separator)
            ),
            Aggregation::GroupBy => format!("{column} AS {target}"),
        }
    }
}

impl NetworkData {
    /// Collapses edges sharing `(source, target)` (and every group-by column) into one row.
    ///
    /// Output rows are ordered by the first edge of each group. The result is re-augmented,
    /// so its duplicate counters reflect the new, flattened edge set.
    pub fn redefine_edges(
        &self,
        redefinition: &EdgeRedefinition,
    ) -> Result<NetworkData, NetworkDataError> {
        let edges = self.edges();
        for agg in redefinition.aggregations() {
            edges.require_column(EDGES_TABLE, &agg.source_column)?;
        }

        let s = quote_ident(SOURCE);
        let t = quote_ident(TARGET);
        let mut group_by = vec![s.clone(), t.clone()];
        let mut select = vec![s.clone(), t.clone()];
        for agg in redefinition.aggregations() {
            if agg.aggregation == Aggregation::GroupBy {
                group_by.push(quote_ident(&agg.source_column));
            }
            select.push(redefinition.select_expr(agg));
        }
        let sql = format!(
            "SELECT {select}
             FROM (SELECT * FROM {edges_table} ORDER BY {edge_id})
             GROUP BY {group_by}
             ORDER BY MIN({edge_id})",
            select = select.join(", "),
            edges_table = quote_ident(EDGES_TABLE),
            edge_id = quote_ident(EDGE_ID),
            group_by = group_by.join(", "),
        );

        let engine = Engine::with_tables(&[(EDGES_TABLE, edges)])?;
        let mut redefined: Table = engine.query(&sql, &[edges])?;
        for agg in redefinition.aggregations() {
            redefined.set_provenance(&agg.target_column, Provenance::UserSupplied);
            if agg.aggregation == Aggregation::List {
                redefined.coerce_column(&agg.target_column, ColumnType::List);
            }
        }
        debug!(
            before = edges.num_rows(),
            after = redefined.num_rows(),
            "redefined edges"
        );

        let nodes = self.nodes().clone();
        NetworkData::create_with(
            nodes,
            redefined,
            CreateOptions {
                augment: true,
                label_components: self.has_components(),
            },
        )
    }
}
