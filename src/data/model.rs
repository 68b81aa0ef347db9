use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RawValue – a single cell as it arrives from a loader
// ---------------------------------------------------------------------------

/// A dynamically-typed source value mirroring common JSON / Arrow scalars.
/// Only the normalizer looks at these; everything downstream sees strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::String(s) => write!(f, "{s}"),
            RawValue::Integer(i) => write!(f, "{i}"),
            RawValue::Float(v) => f.write_str(&format_float(*v)),
            RawValue::Bool(b) => write!(f, "{b}"),
            RawValue::Null => Ok(()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::String(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::String(s)
    }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self {
        RawValue::Integer(i)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(RawValue::Null, Into::into)
    }
}

/// Number-to-text the way JavaScript's `String(n)` does it: shortest
/// round-trip digits, plain notation while the decimal exponent is within
/// -7..21, scientific (`1e+21`, `1e-7`) outside it.
fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if v == 0.0 {
        return "0".to_string();
    }

    let sci = format!("{:e}", v.abs());
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return v.to_string();
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return v.to_string();
    };
    let digits = mantissa.replace('.', "");
    let k = digits.len() as i32;
    let n = exp + 1;

    let body = if k <= n && n <= 21 {
        format!("{digits}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{int}.{frac}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat(-n as usize))
    } else {
        let sign = if n > 0 { '+' } else { '-' };
        let (lead, rest) = digits.split_at(1);
        let rest = if rest.is_empty() { String::new() } else { format!(".{rest}") };
        format!("{lead}{rest}e{sign}{}", (n - 1).abs())
    };

    if v < 0.0 { format!("-{body}") } else { body }
}

/// One source record: field name → raw value. Fields may be missing.
pub type RawRecord = BTreeMap<String, RawValue>;

// ---------------------------------------------------------------------------
// RawDataset – loader output, before normalization
// ---------------------------------------------------------------------------

/// Records as loaded from disk plus the column order the file declared.
#[derive(Debug, Clone, Default)]
pub struct RawDataset {
    /// Column names in first-seen order.
    pub columns: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl RawDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ColumnKeys – ordered, unique column identity
// ---------------------------------------------------------------------------

/// Ordered list of unique column keys. Defines column identity and display
/// order; duplicates are dropped keeping the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnKeys(Vec<String>);

impl ColumnKeys {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let keys = keys
            .into_iter()
            .map(Into::into)
            .filter(|k: &String| seen.insert(k.clone()))
            .collect();
        ColumnKeys(keys)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|k| k == key)
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.0.iter().position(|k| k == key)
    }
}

// ---------------------------------------------------------------------------
// Row – one normalized record
// ---------------------------------------------------------------------------

/// A normalized row: every declared column key maps to a trimmed string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<String, String>);

impl Row {
    pub(crate) fn with_cells(cells: BTreeMap<String, String>) -> Self {
        Row(cells)
    }

    /// The cell for `key`, or `None` if the key is not a dataset column.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// The cell for `key`, treating an unknown key as blank.
    pub fn value(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Dataset – the immutable normalized table
// ---------------------------------------------------------------------------

/// The normalized table. Built once by [`normalize`](super::normalize::normalize)
/// and never mutated afterwards; filtering derives new sequences from it.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: ColumnKeys,
    rows: Vec<Row>,
}

impl Dataset {
    pub(crate) fn new(columns: ColumnKeys, rows: Vec<Row>) -> Self {
        Dataset { columns, rows }
    }

    pub fn columns(&self) -> &ColumnKeys {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
