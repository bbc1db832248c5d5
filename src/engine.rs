use std::path::Path;

use rusqlite::{Batch, Connection, params_from_iter};
use tracing::debug;

use crate::{
    errors::NetworkDataError,
    schema::{self, quote_ident},
    table::{Column, ColumnType, Provenance, Table, Value},
};

pub struct Engine {
    conn: Connection,
}

impl Engine {
    pub fn open_in_memory() -> Result<Self, NetworkDataError> {
        let conn =
            Connection::open_in_memory().map_err(|e| NetworkDataError::query(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Opens (or creates) a database file, used for native database exports.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, NetworkDataError> {
        let conn = Connection::open(path).map_err(|e| NetworkDataError::io(e.to_string()))?;
        Ok(Self { conn })
    }

    pub fn with_tables(tables: &[(&str, &Table)]) -> Result<Self, NetworkDataError> {
        let engine = Self::open_in_memory()?;
        for (name, table) in tables {
            engine.load_table(name, table)?;
        }
        Ok(engine)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Creates table `name` and inserts every row of `table` in a single transaction.
    pub fn load_table(&self, name: &str, table: &Table) -> Result<(), NetworkDataError> {
        if table.num_columns() == 0 {
            return Err(NetworkDataError::data_integrity(format!(
                "cannot load table '{name}' without columns"
            )));
        }
        self.conn
            .execute_batch(&schema::create_table_sql(name, table))
            .map_err(|e| NetworkDataError::query(e.to_string()))?;
        if table.num_rows() == 0 {
            return Ok(());
        }
        let placeholders: Vec<String> = (1..=table.num_columns()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} VALUES ({})",
            quote_ident(name),
            placeholders.join(", ")
        );
        self.conn
            .execute("BEGIN IMMEDIATE", [])
            .map_err(|e| NetworkDataError::query(e.to_string()))?;
        let result: Result<(), NetworkDataError> = (|| {
            let mut stmt = self
                .conn
                .prepare_cached(&sql)
                .map_err(|e| NetworkDataError::query(e.to_string()))?;
            for row in 0..table.num_rows() {
                let values = table.columns().iter().map(|c| &c.values()[row]);
                stmt.execute(params_from_iter(values))
                    .map_err(|e| NetworkDataError::query(e.to_string()))?;
            }
            Ok(())
        })();
        self.finalize(result)?;
        debug!(table = name, rows = table.num_rows(), "loaded table into engine");
        Ok(())
    }

    fn finalize(&self, result: Result<(), NetworkDataError>) -> Result<(), NetworkDataError> {
        match result {
            Ok(()) => self
                .conn
                .execute("COMMIT", [])
                .map(|_| ())
                .map_err(|e| NetworkDataError::query(e.to_string())),
            Err(err) => {
                let _ = self.conn.execute("ROLLBACK", []);
                Err(err)
            }
        }
    }

    /// Runs `sql` and reads the result back into a table.
    ///
    /// Column types and provenance are taken from computed-column metadata first, then from the
    /// first `sources` table carrying a column of the same name, and inferred otherwise.
    pub fn query(&self, sql: &str, sources: &[&Table]) -> Result<Table, NetworkDataError> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| NetworkDataError::query(e.to_string()))?;
        read_statement(&mut stmt, sources)
    }

    /// Runs a caller supplied query that must consist of one read-only statement.
    pub fn query_read_only(&self, sql: &str, sources: &[&Table]) -> Result<Table, NetworkDataError> {
        self.conn
            .execute_batch("PRAGMA query_only = ON")
            .map_err(|e| NetworkDataError::query(e.to_string()))?;
        let mut batch = Batch::new(&self.conn, sql);
        let mut stmt = batch
            .next()
            .map_err(|e| NetworkDataError::query(e.to_string()))?
            .ok_or_else(|| NetworkDataError::configuration("query is empty"))?;
        if batch
            .next()
            .map_err(|e| NetworkDataError::query(e.to_string()))?
            .is_some()
        {
            return Err(NetworkDataError::configuration(format!(
                "query must be a single statement: {sql}"
            )));
        }
        if !stmt.readonly() {
            return Err(NetworkDataError::configuration(format!(
                "query is not read-only: {sql}"
            )));
        }
        read_statement(&mut stmt, sources)
    }

    pub fn query_i64(&self, sql: &str) -> Result<i64, NetworkDataError> {
        self.conn
            .query_row(sql, [], |row| row.get::<_, Option<i64>>(0))
            .map(|v| v.unwrap_or(0))
            .map_err(|e| NetworkDataError::query(e.to_string()))
    }
}

fn read_statement(
    stmt: &mut rusqlite::Statement<'_>,
    sources: &[&Table],
) -> Result<Table, NetworkDataError> {
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let hints: Vec<(Option<ColumnType>, Provenance)> =
        names.iter().map(|name| column_hint(name, sources)).collect();
    let mut data: Vec<Vec<Value>> = vec![Vec::new(); names.len()];
    let mut rows = stmt
        .query([])
        .map_err(|e| NetworkDataError::query(e.to_string()))?;
    while let Some(row) = rows
        .next()
        .map_err(|e| NetworkDataError::query(e.to_string()))?
    {
        for (idx, values) in data.iter_mut().enumerate() {
            let raw = row
                .get_ref(idx)
                .map_err(|e| NetworkDataError::query(e.to_string()))?;
            values.push(Value::from_sql_ref(raw, hints[idx].0));
        }
    }
    let columns = names
        .into_iter()
        .zip(data)
        .zip(hints)
        .map(|((name, values), (hint, provenance))| {
            let inferred = ColumnType::infer(&values);
            let kind = match hint {
                Some(h) if h == inferred || values.iter().all(Value::is_null) => h,
                _ => inferred,
            };
            Column::with_type(name, kind, values).with_provenance(provenance)
        })
        .collect();
    Table::from_columns(columns)
}

fn column_hint(name: &str, sources: &[&Table]) -> (Option<ColumnType>, Provenance) {
    if let Some(kind) = schema::computed_column_type(name) {
        return (Some(kind), Provenance::Computed);
    }
    sources
        .iter()
        .find_map(|t| t.column(name))
        .map(|c| (Some(c.kind()), c.provenance()))
        .unwrap_or((None, Provenance::UserSupplied))
}
