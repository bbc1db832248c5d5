use std::{
    fmt,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use tracing::debug;

use crate::{
    engine::Engine,
    errors::NetworkDataError,
    network::NetworkData,
    schema::{self, EDGES_TABLE, IDX_DUP_DIRECTED, NODES_TABLE, SOURCE, TARGET, quote_ident},
    table::{Table, Value},
};

/// Graph file formats recognised on import, by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportFormat {
    Gml,
    Gexf,
    GraphMl,
    Pajek,
    Leda,
    Graph6,
    Sparse6,
}

impl ImportFormat {
    pub const EXTENSIONS: &'static [&'static str] = &[
        "gml", "gexf", "graphml", "net", "pajek", "leda", "gw", "g6", "graph6", "s6", "sparse6",
    ];

    pub fn from_extension(extension: &str) -> Result<Self, NetworkDataError> {
        match extension.to_ascii_lowercase().as_str() {
            "gml" => Ok(ImportFormat::Gml),
            "gexf" => Ok(ImportFormat::Gexf),
            "graphml" => Ok(ImportFormat::GraphMl),
            "net" | "pajek" => Ok(ImportFormat::Pajek),
            "leda" | "gw" => Ok(ImportFormat::Leda),
            "g6" | "graph6" => Ok(ImportFormat::Graph6),
            "s6" | "sparse6" => Ok(ImportFormat::Sparse6),
            other => Err(NetworkDataError::unsupported_format(other, Self::EXTENSIONS)),
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, NetworkDataError> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(extension)
    }
}

/// Named export targets implemented by [`export_network_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportTarget {
    CsvFiles,
    SqlDump,
    SqliteDb,
    /// One `source target` line per edge row, with user attributes as a JSON object.
    EdgeList,
    /// One line per node listing its distinct out-neighbours.
    AdjList,
}

impl ExportTarget {
    pub const NAMES: &'static [&'static str] =
        &["csv_files", "sql_dump", "sqlite_db", "edgelist", "adjlist"];

    pub fn as_str(self) -> &'static str {
        match self {
            ExportTarget::CsvFiles => "csv_files",
            ExportTarget::SqlDump => "sql_dump",
            ExportTarget::SqliteDb => "sqlite_db",
            ExportTarget::EdgeList => "edgelist",
            ExportTarget::AdjList => "adjlist",
        }
    }
}

impl fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportTarget {
    type Err = NetworkDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv_files" | "csv" => Ok(ExportTarget::CsvFiles),
            "sql_dump" => Ok(ExportTarget::SqlDump),
            "sqlite_db" => Ok(ExportTarget::SqliteDb),
            "edgelist" => Ok(ExportTarget::EdgeList),
            "adjlist" => Ok(ExportTarget::AdjList),
            other => Err(NetworkDataError::unsupported_format(other, Self::NAMES)),
        }
    }
}

fn io_err(e: std::io::Error) -> NetworkDataError {
    NetworkDataError::io(e.to_string())
}

/// Writes `network_data` to `directory` using files named after `name`; returns the paths.
pub fn export_network_data(
    network_data: &NetworkData,
    target: ExportTarget,
    directory: &Path,
    name: &str,
) -> Result<Vec<PathBuf>, NetworkDataError> {
    fs::create_dir_all(directory).map_err(io_err)?;
    let paths = match target {
        ExportTarget::CsvFiles => {
            let nodes = directory.join(format!("{name}__{NODES_TABLE}.csv"));
            let edges = directory.join(format!("{name}__{EDGES_TABLE}.csv"));
            write_csv(network_data.nodes(), &nodes)?;
            write_csv(network_data.edges(), &edges)?;
            vec![nodes, edges]
        }
        ExportTarget::SqlDump => {
            let path = directory.join(format!("{name}.sql"));
            let mut writer = BufWriter::new(File::create(&path).map_err(io_err)?);
            dump_sql(network_data, &mut writer)?;
            writer.flush().map_err(io_err)?;
            vec![path]
        }
        ExportTarget::SqliteDb => {
            let path = directory.join(format!("{name}.sqlite"));
            if path.exists() {
                fs::remove_file(&path).map_err(io_err)?;
            }
            let engine = Engine::open(&path)?;
            engine.load_table(NODES_TABLE, network_data.nodes())?;
            engine.load_table(EDGES_TABLE, network_data.edges())?;
            vec![path]
        }
        ExportTarget::EdgeList => {
            let path = directory.join(format!("{name}.edgelist"));
            let mut writer = BufWriter::new(File::create(&path).map_err(io_err)?);
            write_edge_list(network_data, &mut writer)?;
            writer.flush().map_err(io_err)?;
            vec![path]
        }
        ExportTarget::AdjList => {
            let path = directory.join(format!("{name}.adjlist"));
            let mut writer = BufWriter::new(File::create(&path).map_err(io_err)?);
            write_adj_list(network_data, &mut writer)?;
            writer.flush().map_err(io_err)?;
            vec![path]
        }
    };
    debug!(format = %target, files = paths.len(), "exported network data");
    Ok(paths)
}

fn write_csv(table: &Table, path: &Path) -> Result<(), NetworkDataError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| NetworkDataError::io(e.to_string()))?;
    writer
        .write_record(table.column_names())
        .map_err(|e| NetworkDataError::io(e.to_string()))?;
    for row in 0..table.num_rows() {
        let record = table.columns().iter().map(|c| c.values()[row].to_string());
        writer
            .write_record(record)
            .map_err(|e| NetworkDataError::io(e.to_string()))?;
    }
    writer.flush().map_err(io_err)
}

fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Boolean(b) => i64::from(*b).to_string(),
        Value::Integer(v) => v.to_string(),
        Value::Real(v) if v.is_finite() => format!("{v:?}"),
        Value::Real(_) => "NULL".to_string(),
        Value::Text(_) | Value::List(_) => schema::quote_literal(&value.to_string()),
    }
}

/// Writes a SQL script that recreates both tables.
pub fn dump_sql<W: Write>(network_data: &NetworkData, writer: &mut W) -> Result<(), NetworkDataError> {
    writeln!(writer, "BEGIN TRANSACTION;").map_err(io_err)?;
    for (name, table) in [
        (NODES_TABLE, network_data.nodes()),
        (EDGES_TABLE, network_data.edges()),
    ] {
        writeln!(writer, "{};", schema::create_table_sql(name, table)).map_err(io_err)?;
        for row in 0..table.num_rows() {
            let values: Vec<String> = table
                .columns()
                .iter()
                .map(|c| sql_literal(&c.values()[row]))
                .collect();
            writeln!(
                writer,
                "INSERT INTO {} VALUES ({});",
                quote_ident(name),
                values.join(", ")
            )
            .map_err(io_err)?;
        }
    }
    writeln!(writer, "COMMIT;").map_err(io_err)
}

fn write_edge_list<W: Write>(network_data: &NetworkData, writer: &mut W) -> Result<(), NetworkDataError> {
    let edges = network_data.edges();
    let sources = edges.require_column(EDGES_TABLE, SOURCE)?;
    let targets = edges.require_column(EDGES_TABLE, TARGET)?;
    let attributes: Vec<_> = edges.user_columns().collect();
    for row in 0..edges.num_rows() {
        write!(writer, "{} {}", sources.values()[row], targets.values()[row]).map_err(io_err)?;
        if !attributes.is_empty() {
            let map = attributes
                .iter()
                .map(|c| {
                    serde_json::to_value(&c.values()[row])
                        .map(|value| (c.name().to_string(), value))
                        .map_err(|e| NetworkDataError::io(e.to_string()))
                })
                .collect::<Result<serde_json::Map<String, serde_json::Value>, _>>()?;
            write!(writer, " {}", serde_json::Value::Object(map)).map_err(io_err)?;
        }
        writeln!(writer).map_err(io_err)?;
    }
    Ok(())
}

fn write_adj_list<W: Write>(network_data: &NetworkData, writer: &mut W) -> Result<(), NetworkDataError> {
    let edges = network_data.edges();
    let sources = edges.require_column(EDGES_TABLE, SOURCE)?;
    let targets = edges.require_column(EDGES_TABLE, TARGET)?;
    let first = edges.require_column(EDGES_TABLE, IDX_DUP_DIRECTED)?;
    let mut neighbours: Vec<Vec<i64>> = vec![Vec::new(); network_data.num_nodes()];
    for row in 0..edges.num_rows() {
        if first.values()[row].as_i64() != Some(1) {
            continue;
        }
        let (Some(s), Some(t)) = (sources.values()[row].as_i64(), targets.values()[row].as_i64())
        else {
            continue;
        };
        if let Some(list) = neighbours.get_mut(s as usize) {
            list.push(t);
        }
    }
    for (node, list) in neighbours.iter().enumerate() {
        write!(writer, "{node}").map_err(io_err)?;
        for target in list {
            write!(writer, " {target}").map_err(io_err)?;
        }
        writeln!(writer).map_err(io_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_literals_escape_text() {
        assert_eq!(sql_literal(&Value::from("o'neil")), "'o''neil'");
        assert_eq!(sql_literal(&Value::Null), "NULL");
        assert_eq!(sql_literal(&Value::Boolean(true)), "1");
        assert_eq!(sql_literal(&Value::Real(1.0)), "1.0");
    }
}
