use crate::error::{ChartError, Result};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::fmt;

/// A single scalar cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the value, or `None` when it cannot be coerced
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// Quoted rendering used in error messages
    pub fn describe(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Text(s) => format!("'{}'", s),
            other => other.to_string(),
        }
    }

    /// Convert a decoded JSON scalar; arrays and objects are rejected
    pub fn from_json(value: &JsonValue, column: &str) -> Result<Self> {
        match value {
            JsonValue::Null => Ok(Value::Null),
            JsonValue::Bool(b) => Ok(Value::Bool(*b)),
            JsonValue::Number(n) => Ok(match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            }),
            JsonValue::String(s) => Ok(Value::Text(s.clone())),
            JsonValue::Array(_) | JsonValue::Object(_) => Err(ChartError::InvalidData(format!(
                "Unsupported value {} for field '{}'",
                value, column
            ))),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", crate::caption::fmt_num(*v)),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

/// One record: column name to value, in source order
pub type Row = IndexMap<String, Value>;

/// All rows produced by a single load
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names, taken from the first row's keys
    pub fn columns(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Cells of `column` in row order; rows lacking the key are skipped
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows.iter().filter_map(move |row| row.get(column))
    }

    /// Every cell of `column` as a number, failing on the first one that is not numeric
    pub fn numeric_column(&self, column: &str) -> Result<Vec<f64>> {
        self.rows
            .iter()
            .map(|row| {
                let value = row.get(column).unwrap_or(&Value::Null);
                value.as_f64().ok_or_else(|| ChartError::NotNumeric {
                    value: value.describe(),
                    column: column.to_string(),
                })
            })
            .collect()
    }

    /// Display labels of `column`, blank for rows lacking it
    pub fn labels(&self, column: &str) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.get(column).map(|v| v.to_string()).unwrap_or_default())
            .collect()
    }
}

/// Keep only the values that coerce to a number
pub fn numeric_values<'a, I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = &'a Value>,
{
    values.into_iter().filter_map(Value::as_f64).collect()
}

/// Build a row from name/value pairs
pub fn row<K, V, I>(pairs: I) -> Row
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coercion() {
        assert_eq!(Value::from("10").as_f64(), Some(10.0));
        assert_eq!(Value::from(" 2.5 ").as_f64(), Some(2.5));
        assert_eq!(Value::from("abc").as_f64(), None);
        assert_eq!(Value::Null.as_f64(), None);
        assert_eq!(Value::Bool(true).as_f64(), Some(1.0));
        assert_eq!(Value::Int(7).as_f64(), Some(7.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Float(10.0).to_string(), "10");
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::from("bob").describe(), "'bob'");
    }

    #[test]
    fn test_from_json() {
        assert_eq!(Value::from_json(&json!(3), "a").unwrap(), Value::Int(3));
        assert_eq!(Value::from_json(&json!(3.5), "a").unwrap(), Value::Float(3.5));
        assert_eq!(Value::from_json(&json!("x"), "a").unwrap(), Value::from("x"));
        let err = Value::from_json(&json!([1, 2]), "tags").unwrap_err();
        assert!(err.to_string().contains("'tags'"));
    }

    #[test]
    fn test_numeric_column() {
        let data = Dataset::new(vec![
            row([("name", "a"), ("value", "1")]),
            row([("name", "b"), ("value", "oops")]),
        ]);
        let err = data.numeric_column("value").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot convert value 'oops' in column 'value' to a number"
        );
        assert_eq!(numeric_values(data.column_values("value")), vec![1.0]);
    }

    #[test]
    fn test_columns_from_first_row() {
        let data = Dataset::new(vec![
            row([("b", 1i64), ("a", 2i64)]),
            row([("c", 3i64)]),
        ]);
        assert_eq!(data.columns(), vec!["b", "a"]);
        assert!(Dataset::default().columns().is_empty());
    }
}
