//! Row loading
//!
//! Turns delimited text, JSON, JSON-lines or a read-only SQLite query into a
//! [`Dataset`]. Delimited values stay text; JSON and SQLite keep their native
//! scalar types.

use crate::data::{Dataset, Row, Value};
use crate::error::{ChartError, Result};
use crate::sniff::{self, Format};
use log::{debug, warn};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::Value as JsonValue;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// A query against a SQLite database file
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub database: PathBuf,
    pub query: String,
}

impl SqlQuery {
    pub fn new(database: impl Into<PathBuf>, query: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            query: query.into(),
        }
    }
}

/// Load rows from exactly one source.
///
/// Either a byte stream (with an optional declared format, sniffed when
/// absent) or a SQL query must be given, never both.
pub fn load_rows<R: Read>(
    stream: Option<R>,
    format: Option<Format>,
    sql: Option<&SqlQuery>,
) -> Result<Dataset> {
    let dataset = match (stream, sql) {
        (Some(_), Some(_)) => {
            return Err(ChartError::config(
                "An input file or stream cannot be combined with a SQL query",
            ))
        }
        (None, None) => return Err(ChartError::config("No input provided")),
        (None, Some(sql)) => {
            if let Some(format) = format {
                return Err(ChartError::config(format!(
                    "--{} cannot be combined with a SQL query",
                    format
                )));
            }
            load_rows_from_sql(&sql.database, &sql.query)?
        }
        (Some(reader), None) => match format {
            Some(format) => load_rows_as(reader, format)?,
            None => {
                let (format, reader) = sniff::detect_format(reader)?;
                load_rows_as(reader, format)?
            }
        },
    };

    debug!("loaded {} rows", dataset.len());
    Ok(dataset)
}

/// Parse `reader` as the given format
pub fn load_rows_as<R: Read>(reader: R, format: Format) -> Result<Dataset> {
    match format {
        Format::Csv => load_rows_from_csv(reader),
        Format::Tsv => load_rows_from_tsv(reader),
        Format::Json => load_rows_from_json(reader),
        Format::Jsonl => load_rows_from_jsonl(reader),
    }
}

pub fn load_rows_from_csv<R: Read>(reader: R) -> Result<Dataset> {
    load_rows_from_delimited(reader, b',')
}

pub fn load_rows_from_tsv<R: Read>(reader: R) -> Result<Dataset> {
    load_rows_from_delimited(reader, b'\t')
}

/// The header line names the columns; every later record becomes a row of text values
fn load_rows_from_delimited<R: Read>(mut reader: R, delimiter: u8) -> Result<Dataset> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let content = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content);

    let headers = csv_reader.headers()?.clone();

    let mut rows = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        if record.len() > headers.len() {
            warn!(
                "record {} has {} fields but the header has {}; dropping the extra fields",
                index + 1,
                record.len(),
                headers.len()
            );
        }

        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = record
                    .get(i)
                    .map(|field| Value::Text(field.to_string()))
                    .unwrap_or(Value::Null);
                (name.to_string(), value)
            })
            .collect();
        rows.push(row);
    }

    Ok(Dataset::new(rows))
}

/// A JSON array of objects, or a single object treated as one row
pub fn load_rows_from_json<R: Read>(mut reader: R) -> Result<Dataset> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let content = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);
    let decoded: JsonValue = serde_json::from_slice(content)?;

    let items = match decoded {
        JsonValue::Array(items) => items,
        object @ JsonValue::Object(_) => vec![object],
        other => {
            return Err(ChartError::InvalidData(format!(
                "JSON must be a list or an object, found {}",
                json_kind(&other)
            )))
        }
    };

    let rows = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| row_from_json(item, || format!("item {}", index)))
        .collect::<Result<Vec<_>>>()?;

    Ok(Dataset::new(rows))
}

/// One JSON object per non-blank line
pub fn load_rows_from_jsonl<R: Read>(reader: R) -> Result<Dataset> {
    let mut rows = Vec::new();

    for (index, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let line = line.trim_start_matches('\u{feff}');
        if line.trim().is_empty() {
            continue;
        }

        let item: JsonValue = serde_json::from_str(line).map_err(|e| {
            ChartError::InvalidData(format!("line {} is not valid JSON: {}", index + 1, e))
        })?;
        rows.push(row_from_json(item, || format!("line {}", index + 1))?);
    }

    Ok(Dataset::new(rows))
}

/// Run `query` against the database at `database`, opened read-only.
///
/// Statements that write fail with SQLite's read-only error instead of
/// silently doing nothing.
pub fn load_rows_from_sql(database: &Path, query: &str) -> Result<Dataset> {
    let conn = Connection::open_with_flags(
        database,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    debug!("opened {} read-only", database.display());

    let mut stmt = conn.prepare(query)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut result = stmt.query([])?;
    let mut rows = Vec::new();
    while let Some(record) = result.next()? {
        let mut row = Row::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            let value = match record.get_ref(i)? {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(n) => Value::Int(n),
                ValueRef::Real(f) => Value::Float(f),
                ValueRef::Text(text) => Value::Text(String::from_utf8_lossy(text).into_owned()),
                ValueRef::Blob(_) => {
                    return Err(ChartError::InvalidData(format!(
                        "Column '{}' contains binary data",
                        name
                    )))
                }
            };
            row.insert(name.clone(), value);
        }
        rows.push(row);
    }

    Ok(Dataset::new(rows))
}

fn row_from_json(item: JsonValue, position: impl Fn() -> String) -> Result<Row> {
    match item {
        JsonValue::Object(map) => map
            .iter()
            .map(|(key, value)| Ok((key.clone(), Value::from_json(value, key)?)))
            .collect(),
        other => Err(ChartError::InvalidData(format!(
            "{} must be a JSON object, found {}",
            position(),
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::row;
    use crate::error::ErrorKind;

    fn text_rows(pairs: &[&[(&str, &str)]]) -> Dataset {
        Dataset::new(pairs.iter().map(|r| row(r.iter().copied())).collect())
    }

    fn make_db(dir: &Path) -> PathBuf {
        let path = dir.join("test.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE t (name TEXT, value INTEGER, ratio REAL);
             INSERT INTO t VALUES ('alice', 10, 0.5);
             INSERT INTO t VALUES ('bob', 20, NULL);",
        )
        .unwrap();
        path
    }

    #[test]
    fn test_load_csv() {
        let rows = load_rows_from_csv(&b"name,value\nalice,10\nbob,20\n"[..]).unwrap();
        assert_eq!(
            rows,
            text_rows(&[
                &[("name", "alice"), ("value", "10")],
                &[("name", "bob"), ("value", "20")],
            ])
        );
    }

    #[test]
    fn test_load_csv_utf8_bom() {
        let rows = load_rows_from_csv(&b"\xef\xbb\xbfname,value\nalice,10\n"[..]).unwrap();
        assert_eq!(rows.columns(), vec!["name", "value"]);
        assert_eq!(rows, text_rows(&[&[("name", "alice"), ("value", "10")]]));
    }

    #[test]
    fn test_load_csv_short_record() {
        let rows = load_rows_from_csv(&b"a,b,c\n1,2\n"[..]).unwrap();
        assert_eq!(rows.rows()[0]["c"], Value::Null);
        assert_eq!(rows.rows()[0]["b"], Value::from("2"));
    }

    #[test]
    fn test_load_csv_duplicate_header() {
        let rows = load_rows_from_csv(&b"a,b,a\n1,2,3\n"[..]).unwrap();
        assert_eq!(rows.columns(), vec!["a", "b"]);
        assert_eq!(rows.rows()[0]["a"], Value::from("3"));
        assert_eq!(rows.rows()[0]["b"], Value::from("2"));
    }

    #[test]
    fn test_load_csv_surplus_fields_dropped() {
        let rows = load_rows_from_csv(&b"a,b\n1,2,3,4\n5,6\n"[..]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.rows()[0].len(), 2);
        assert_eq!(
            rows,
            text_rows(&[&[("a", "1"), ("b", "2")], &[("a", "5"), ("b", "6")]])
        );
    }

    #[test]
    fn test_load_tsv() {
        let rows = load_rows_from_tsv(&b"name\tvalue\nalice\t10\nbob\t20\n"[..]).unwrap();
        assert_eq!(
            rows,
            text_rows(&[
                &[("name", "alice"), ("value", "10")],
                &[("name", "bob"), ("value", "20")],
            ])
        );
    }

    #[test]
    fn test_load_json_array() {
        let rows = load_rows_from_json(&br#"[{"name": "alice", "value": 10}]"#[..]).unwrap();
        assert_eq!(
            rows,
            Dataset::new(vec![row([
                ("name", Value::from("alice")),
                ("value", Value::Int(10)),
            ])])
        );
    }

    #[test]
    fn test_load_json_keeps_key_order() {
        let rows = load_rows_from_json(&br#"[{"zeta": 1, "alpha": 2}]"#[..]).unwrap();
        assert_eq!(rows.columns(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_load_json_single_object() {
        let rows = load_rows_from_json(&br#"{"name": "alice", "value": 10}"#[..]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.rows()[0]["value"], Value::Int(10));
    }

    #[test]
    fn test_load_json_utf8_bom() {
        let rows = load_rows_from_json(&b"\xef\xbb\xbf[{\"name\": \"alice\", \"value\": 10}]"[..]).unwrap();
        assert_eq!(rows.columns(), vec!["name", "value"]);
        assert_eq!(rows.rows()[0]["value"], Value::Int(10));
    }

    #[test]
    fn test_load_json_bad_format() {
        let err = load_rows_from_json(&br#""just a string""#[..]).unwrap_err();
        assert!(err.to_string().contains("JSON must be a list or an object"));
        assert_eq!(err.kind(), ErrorKind::Load);
    }

    #[test]
    fn test_load_json_non_object_item() {
        let err = load_rows_from_json(&br#"[{"a": 1}, 2]"#[..]).unwrap_err();
        assert!(err.to_string().contains("item 1 must be a JSON object"));
    }

    #[test]
    fn test_load_jsonl() {
        let data = b"{\"name\": \"alice\", \"value\": 10}\n{\"name\": \"bob\", \"value\": 20}\n";
        let rows = load_rows_from_jsonl(&data[..]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.rows()[1]["name"], Value::from("bob"));
        assert_eq!(rows.rows()[1]["value"], Value::Int(20));
    }

    #[test]
    fn test_load_jsonl_blank_lines() {
        let rows = load_rows_from_jsonl(&b"{\"name\": \"alice\"}\n\n  \n{\"name\": \"bob\"}\n"[..]).unwrap();
        assert_eq!(
            rows,
            text_rows(&[&[("name", "alice")], &[("name", "bob")]])
        );
    }

    #[test]
    fn test_load_jsonl_bad_line() {
        let err = load_rows_from_jsonl(&b"{\"a\": 1}\nnot json\n"[..]).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_load_sql() {
        let dir = tempfile::tempdir().unwrap();
        let db = make_db(dir.path());
        let rows = load_rows_from_sql(&db, "SELECT name, value, ratio FROM t ORDER BY name").unwrap();
        assert_eq!(
            rows,
            Dataset::new(vec![
                row([
                    ("name", Value::from("alice")),
                    ("value", Value::Int(10)),
                    ("ratio", Value::Float(0.5)),
                ]),
                row([
                    ("name", Value::from("bob")),
                    ("value", Value::Int(20)),
                    ("ratio", Value::Null),
                ]),
            ])
        );
    }

    #[test]
    fn test_load_sql_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let db = make_db(dir.path());

        let err = load_rows_from_sql(&db, "INSERT INTO t VALUES ('hack', 1, 1.0)").unwrap_err();
        match err {
            ChartError::Sql(rusqlite::Error::SqliteFailure(e, _)) => {
                assert_eq!(e.code, rusqlite::ErrorCode::ReadOnly);
            }
            other => panic!("expected a read-only failure, got {:?}", other),
        }

        let rows = load_rows_from_sql(&db, "SELECT COUNT(*) AS n FROM t").unwrap();
        assert_eq!(rows.rows()[0]["n"], Value::Int(2));
    }

    #[test]
    fn test_load_sql_missing_database() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_rows_from_sql(&dir.path().join("nope.db"), "SELECT 1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Load);
    }

    #[test]
    fn test_load_rows_auto_csv() {
        let rows = load_rows(Some(&b"name,value\nalice,10\n"[..]), None, None).unwrap();
        assert_eq!(rows, text_rows(&[&[("name", "alice"), ("value", "10")]]));
    }

    #[test]
    fn test_load_rows_auto_json() {
        let rows = load_rows(Some(&br#"[{"name": "alice", "value": 10}]"#[..]), None, None).unwrap();
        assert_eq!(rows.rows()[0]["value"], Value::Int(10));
    }

    #[test]
    fn test_load_rows_explicit_format() {
        let rows = load_rows(Some(&b"name,value\nalice,10\n"[..]), Some(Format::Csv), None).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_load_rows_sql_mode() {
        let dir = tempfile::tempdir().unwrap();
        let db = make_db(dir.path());
        let sql = SqlQuery::new(&db, "SELECT name, value FROM t WHERE name = 'alice'");
        let rows = load_rows(None::<&[u8]>, None, Some(&sql)).unwrap();
        assert_eq!(
            rows,
            Dataset::new(vec![row([
                ("name", Value::from("alice")),
                ("value", Value::Int(10)),
            ])])
        );
    }

    #[test]
    fn test_load_rows_source_conflicts() {
        let sql = SqlQuery::new("unused.db", "SELECT 1");

        let err = load_rows(Some(&b"a,b\n"[..]), None, Some(&sql)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = load_rows(None::<&[u8]>, None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = load_rows(None::<&[u8]>, Some(Format::Json), Some(&sql)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
