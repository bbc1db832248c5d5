use std::fmt;

use ahash::AHashSet;
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::errors::NetworkDataError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Boolean(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Integer(v) => Some(*v != 0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Reads a value coming out of SQLite, using the expected column type to restore
    /// booleans and list cells.
    pub(crate) fn from_sql_ref(raw: ValueRef<'_>, hint: Option<ColumnType>) -> Value {
        match raw {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => match hint {
                Some(ColumnType::Boolean) => Value::Boolean(v != 0),
                Some(ColumnType::Real) => Value::Real(v as f64),
                _ => Value::Integer(v),
            },
            ValueRef::Real(v) => Value::Real(v),
            ValueRef::Text(bytes) => {
                let text = String::from_utf8_lossy(bytes).into_owned();
                if hint == Some(ColumnType::List) {
                    if let Ok(items) = serde_json::from_str::<Vec<Value>>(&text) {
                        return Value::List(items);
                    }
                }
                Value::Text(text)
            }
            ValueRef::Blob(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
            Value::List(items) => {
                let json = serde_json::to_string(items).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use rusqlite::types::Value as SqlValue;
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Boolean(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Value::Integer(v) => ToSqlOutput::Owned(SqlValue::Integer(*v)),
            Value::Real(v) => ToSqlOutput::Owned(SqlValue::Real(*v)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::List(items) => {
                let json = serde_json::to_string(items)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
                ToSqlOutput::Owned(SqlValue::Text(json))
            }
        })
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl TryFrom<u64> for Value {
    type Error = NetworkDataError;

    fn try_from(v: u64) -> Result<Self, Self::Error> {
        i64::try_from(v).map(Value::Integer).map_err(|_| {
            NetworkDataError::data_integrity(format!("integer {v} does not fit a signed 64-bit value"))
        })
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Boolean,
    List,
}

impl ColumnType {
    /// Infers the column type from its values; all-null columns default to text.
    pub fn infer(values: &[Value]) -> ColumnType {
        let mut inferred: Option<ColumnType> = None;
        for value in values {
            let kind = match value {
                Value::Null => continue,
                Value::Boolean(_) => ColumnType::Boolean,
                Value::Integer(_) => ColumnType::Integer,
                Value::Real(_) => ColumnType::Real,
                Value::Text(_) => ColumnType::Text,
                Value::List(_) => ColumnType::List,
            };
            inferred = Some(match (inferred, kind) {
                (None, k) => k,
                (Some(a), b) if a == b => a,
                (Some(ColumnType::Integer), ColumnType::Real)
                | (Some(ColumnType::Real), ColumnType::Integer) => ColumnType::Real,
                _ => ColumnType::Text,
            });
        }
        inferred.unwrap_or(ColumnType::Text)
    }

    pub(crate) fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Integer | ColumnType::Boolean => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text | ColumnType::List => "TEXT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    UserSupplied,
    Computed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    kind: ColumnType,
    provenance: Provenance,
    values: Vec<Value>,
}

impl Column {
    pub fn new<N: Into<String>>(name: N, values: Vec<Value>) -> Self {
        let kind = ColumnType::infer(&values);
        Self {
            name: name.into(),
            kind,
            provenance: Provenance::UserSupplied,
            values,
        }
    }

    pub fn with_type<N: Into<String>>(name: N, kind: ColumnType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            kind,
            provenance: Provenance::UserSupplied,
            values,
        }
    }

    pub(crate) fn computed<N: Into<String>>(name: N, kind: ColumnType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            kind,
            provenance: Provenance::Computed,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnType {
        self.kind
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn is_computed(&self) -> bool {
        self.provenance == Provenance::Computed
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    pub(crate) fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    fn take(&self, rows: &[usize]) -> Column {
        Column {
            name: self.name.clone(),
            kind: self.kind,
            provenance: self.provenance,
            values: rows.iter().map(|&row| self.values[row].clone()).collect(),
        }
    }

    fn coerce(&mut self, kind: ColumnType) {
        if self.kind == kind {
            return;
        }
        for value in &mut self.values {
            let converted = match (kind, &*value) {
                (ColumnType::Boolean, Value::Integer(v)) => Some(Value::Boolean(*v != 0)),
                (ColumnType::Real, Value::Integer(v)) => Some(Value::Real(*v as f64)),
                (ColumnType::List, Value::Text(text)) => serde_json::from_str::<Vec<Value>>(text)
                    .ok()
                    .map(Value::List),
                _ => None,
            };
            if let Some(converted) = converted {
                *value = converted;
            }
        }
        self.kind = kind;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    num_rows: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from columns; all columns must have the same length and distinct names.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, NetworkDataError> {
        let num_rows = columns.first().map_or(0, Column::len);
        let mut seen = AHashSet::new();
        for column in &columns {
            if column.len() != num_rows {
                return Err(NetworkDataError::data_integrity(format!(
                    "column '{}' has {} rows, expected {num_rows}",
                    column.name(),
                    column.len()
                )));
            }
            if !seen.insert(column.name()) {
                return Err(NetworkDataError::configuration(format!(
                    "duplicate column name '{}'",
                    column.name()
                )));
            }
        }
        Ok(Self { columns, num_rows })
    }

    pub fn from_rows(headers: &[&str], rows: Vec<Vec<Value>>) -> Result<Self, NetworkDataError> {
        let mut data: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); headers.len()];
        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != headers.len() {
                return Err(NetworkDataError::data_integrity(format!(
                    "row {idx} has {} values, expected {}",
                    row.len(),
                    headers.len()
                )));
            }
            for (column, value) in data.iter_mut().zip(row) {
                column.push(value);
            }
        }
        let columns = headers
            .iter()
            .zip(data)
            .map(|(name, values)| Column::new(*name, values))
            .collect();
        Self::from_columns(columns)
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn require_column(&self, table: &str, name: &str) -> Result<&Column, NetworkDataError> {
        self.column(name)
            .ok_or_else(|| NetworkDataError::unknown_column(table, name, self.column_names()))
    }

    pub fn value(&self, column: &str, row: usize) -> Option<&Value> {
        self.column(column).and_then(|c| c.get(row))
    }

    pub fn user_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.is_computed())
    }

    /// Appends a column, replacing an existing one with the same name.
    pub fn with_column(mut self, column: Column) -> Result<Self, NetworkDataError> {
        if !self.columns.is_empty() && column.len() != self.num_rows {
            return Err(NetworkDataError::data_integrity(format!(
                "column '{}' has {} rows, expected {}",
                column.name(),
                column.len(),
                self.num_rows
            )));
        }
        if self.columns.is_empty() {
            self.num_rows = column.len();
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(self)
    }

    /// Places a computed column after the existing computed columns, replacing one with the
    /// same name.
    pub(crate) fn with_computed_column(self, column: Column) -> Result<Self, NetworkDataError> {
        let mut table = self.without_column(column.name());
        if !table.columns.is_empty() && column.len() != table.num_rows {
            return Err(NetworkDataError::data_integrity(format!(
                "column '{}' has {} rows, expected {}",
                column.name(),
                column.len(),
                table.num_rows
            )));
        }
        if table.columns.is_empty() {
            table.num_rows = column.len();
        }
        let position = table
            .columns
            .iter()
            .position(|c| !c.is_computed())
            .unwrap_or(table.columns.len());
        table
            .columns
            .insert(position, column.with_provenance(Provenance::Computed));
        Ok(table)
    }

    pub fn without_column(mut self, name: &str) -> Self {
        self.columns.retain(|c| c.name != name);
        self
    }

    pub fn select(&self, table: &str, names: &[&str]) -> Result<Table, NetworkDataError> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            columns.push(self.require_column(table, name)?.clone());
        }
        let mut selected = Table::from_columns(columns)?;
        if selected.columns.is_empty() {
            selected.num_rows = self.num_rows;
        }
        Ok(selected)
    }

    pub fn take(&self, rows: &[usize]) -> Table {
        Table {
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            num_rows: rows.len(),
        }
    }

    pub(crate) fn set_provenance(&mut self, name: &str, provenance: Provenance) {
        if let Some(column) = self.columns.iter_mut().find(|c| c.name == name) {
            column.provenance = provenance;
        }
    }

    pub(crate) fn coerce_column(&mut self, name: &str, kind: ColumnType) {
        if let Some(column) = self.columns.iter_mut().find(|c| c.name == name) {
            column.coerce(kind);
        }
    }

    pub(crate) fn set_num_rows_if_empty(&mut self, num_rows: usize) {
        if self.columns.is_empty() {
            self.num_rows = num_rows;
        }
    }
}
