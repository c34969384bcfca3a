//! Output shapes for serialized chunks.
//!
//! Each orientation is a fixed mapping from a window of tabular rows onto a
//! JSON structure. The shape is chosen once per conversion run, so the
//! dispatch lives in a closed enum rather than string comparison at write
//! time.

use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::AppError;

/// Field tokens treated as missing values, matching the default NA set of
/// the dataset tooling this converter feeds.
const NA_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

/// How rows of a chunk map onto the serialized JSON structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Array with one object per row.
    Records,
    /// Object with separate `columns`, `index`, and `data` arrays.
    Split,
    /// Object keyed by global row index, one row object per key.
    Index,
    /// Object keyed by column name, each column mapping row index to value.
    Columns,
    /// Bare matrix of row arrays.
    Values,
    /// Schema header plus indexed row objects.
    Table,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Records => "records",
            Orientation::Split => "split",
            Orientation::Index => "index",
            Orientation::Columns => "columns",
            Orientation::Values => "values",
            Orientation::Table => "table",
        }
    }
}

impl FromStr for Orientation {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "records" => Ok(Orientation::Records),
            "split" => Ok(Orientation::Split),
            "index" => Ok(Orientation::Index),
            "columns" => Ok(Orientation::Columns),
            "values" => Ok(Orientation::Values),
            "table" => Ok(Orientation::Table),
            other => Err(AppError::InvalidConfiguration(format!(
                "unknown orientation: {other}"
            ))),
        }
    }
}

/// One in-memory window of parsed rows plus the global index of its first
/// row. Index-keyed orientations number rows by source position, so the
/// numbering continues across chunks instead of restarting at zero.
pub(crate) struct Chunk<'a> {
    pub headers: &'a [String],
    pub rows: &'a [Vec<Value>],
    pub offset: u64,
}

impl Orientation {
    pub(crate) fn serialize_chunk(&self, chunk: &Chunk<'_>) -> Value {
        match self {
            Orientation::Records => Value::Array(
                chunk
                    .rows
                    .iter()
                    .map(|row| row_object(chunk.headers, row))
                    .collect(),
            ),
            Orientation::Split => {
                let mut map = Map::with_capacity(3);
                map.insert(
                    "columns".into(),
                    Value::Array(chunk.headers.iter().map(|h| Value::from(h.clone())).collect()),
                );
                map.insert(
                    "index".into(),
                    Value::Array((0..chunk.rows.len()).map(|i| Value::from(chunk.offset + i as u64)).collect()),
                );
                map.insert(
                    "data".into(),
                    Value::Array(chunk.rows.iter().map(|row| Value::Array(row.clone())).collect()),
                );
                Value::Object(map)
            }
            Orientation::Index => {
                let mut map = Map::with_capacity(chunk.rows.len());
                for (i, row) in chunk.rows.iter().enumerate() {
                    map.insert(
                        (chunk.offset + i as u64).to_string(),
                        row_object(chunk.headers, row),
                    );
                }
                Value::Object(map)
            }
            Orientation::Columns => {
                let mut map = Map::with_capacity(chunk.headers.len());
                for (col, header) in chunk.headers.iter().enumerate() {
                    let mut column = Map::with_capacity(chunk.rows.len());
                    for (i, row) in chunk.rows.iter().enumerate() {
                        column.insert(
                            (chunk.offset + i as u64).to_string(),
                            row.get(col).cloned().unwrap_or(Value::Null),
                        );
                    }
                    map.insert(header.clone(), Value::Object(column));
                }
                Value::Object(map)
            }
            Orientation::Values => Value::Array(
                chunk.rows.iter().map(|row| Value::Array(row.clone())).collect(),
            ),
            Orientation::Table => {
                let mut fields = Vec::with_capacity(chunk.headers.len() + 1);
                fields.push(field_entry("index", "integer"));
                for (col, header) in chunk.headers.iter().enumerate() {
                    fields.push(field_entry(header, column_type(chunk.rows, col)));
                }

                let mut schema = Map::with_capacity(2);
                schema.insert("fields".into(), Value::Array(fields));
                schema.insert(
                    "primaryKey".into(),
                    Value::Array(vec![Value::from("index")]),
                );

                let data = chunk
                    .rows
                    .iter()
                    .enumerate()
                    .map(|(i, row)| {
                        let mut object = Map::with_capacity(chunk.headers.len() + 1);
                        object.insert("index".into(), Value::from(chunk.offset + i as u64));
                        for (header, value) in chunk.headers.iter().zip(row) {
                            object.insert(header.clone(), value.clone());
                        }
                        Value::Object(object)
                    })
                    .collect();

                let mut map = Map::with_capacity(2);
                map.insert("schema".into(), Value::Object(schema));
                map.insert("data".into(), Value::Array(data));
                Value::Object(map)
            }
        }
    }
}

/// Parses one raw CSV field into a JSON value.
///
/// Numeric fields become numbers, boolean literals become booleans, NA
/// tokens and non-finite floats become null, and everything else stays a
/// string.
pub(crate) fn parse_cell(raw: &str) -> Value {
    if NA_TOKENS.contains(&raw) {
        return Value::Null;
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = raw.parse::<f64>() {
        // from_f64 rejects NaN and infinities, which fall through to null.
        return serde_json::Number::from_f64(float)
            .map(Value::Number)
            .unwrap_or(Value::Null);
    }
    match raw {
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

fn row_object(headers: &[String], row: &[Value]) -> Value {
    let mut map = Map::with_capacity(headers.len());
    for (header, value) in headers.iter().zip(row) {
        map.insert(header.clone(), value.clone());
    }
    Value::Object(map)
}

fn field_entry(name: &str, kind: &str) -> Value {
    let mut map = Map::with_capacity(2);
    map.insert("name".into(), Value::from(name));
    map.insert("type".into(), Value::from(kind));
    Value::Object(map)
}

/// Table-schema type of one column, inferred from its non-null values.
fn column_type(rows: &[Vec<Value>], col: usize) -> &'static str {
    let mut saw_integer = false;
    let mut saw_float = false;
    let mut saw_bool = false;
    let mut saw_string = false;

    for row in rows {
        match row.get(col) {
            Some(Value::Number(n)) if n.is_i64() => saw_integer = true,
            Some(Value::Number(_)) => saw_float = true,
            Some(Value::Bool(_)) => saw_bool = true,
            Some(Value::String(_)) => saw_string = true,
            _ => {}
        }
    }

    if saw_string || (saw_bool && (saw_integer || saw_float)) {
        "string"
    } else if saw_bool {
        "boolean"
    } else if saw_float {
        "number"
    } else if saw_integer {
        "integer"
    } else {
        "string"
    }
}
