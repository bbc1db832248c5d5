//! Table-backed network data with precomputed graph statistics.
//! Every operation runs its SQL against a fresh in-memory SQLite database; run Criterion
//! benchmarks with `cargo bench` to inspect reports under `target/criterion`.

pub mod assemble;
pub mod augment;
pub mod components;
pub mod config;
pub mod convert;
pub mod engine;
pub mod errors;
pub mod export;
pub mod identity;
pub mod metadata;
pub mod network;
pub mod redefine;
pub mod schema;
pub mod subgraph;
pub mod table;

pub use crate::assemble::{NetworkDataBuilder, assemble};
pub use crate::components::ComponentSummary;
pub use crate::config::{ColumnAliases, NetworkDataConfig};
pub use crate::convert::{
    AttributeGraph, AttributeSelection, Attributes, CompactGraph, ExportOptions, ExportedGraph,
    GraphNode, GraphType, ImportOptions, NodeIndexMap,
};
pub use crate::errors::NetworkDataError;
pub use crate::export::{ExportTarget, ImportFormat, export_network_data};
pub use crate::identity::{NodeIdMap, NodeIdMapBuilder, NodeKey};
pub use crate::metadata::{ComponentProperties, GraphProperties, NetworkProperties};
pub use crate::network::{CreateOptions, NetworkData};
pub use crate::redefine::{Aggregation, AttributeAggregation, EdgeRedefinition};
pub use crate::subgraph::{ComponentSplit, EdgeSelection};
pub use crate::table::{Column, ColumnType, Provenance, Table, Value};
