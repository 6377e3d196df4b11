//! Format-independent row representation.

/// Column storage type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Real,
    Bool,
    Text,
}

impl ColumnKind {
    /// SQLite column affinity
    pub fn sql_type(&self) -> &'static str {
        match self {
            Self::Integer | Self::Bool => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
        }
    }
}

/// Named, typed column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind }
    }
}

/// One cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    /// NaN is written as an empty/NULL cell
    Real(f64),
    Bool(bool),
    Text(String),
}

impl Value {
    /// Text form for delimited output
    pub fn to_field(&self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::Real(v) if v.is_nan() => String::new(),
            Self::Real(v) => v.to_string(),
            Self::Bool(v) => if *v { "True" } else { "False" }.to_string(),
            Self::Text(v) => v.clone(),
        }
    }
}

/// Rows sharing one fixed column layout
#[derive(Debug, Clone)]
pub struct RowBatch {
    pub columns: &'static [ColumnSpec],
    pub rows: Vec<Vec<Value>>,
}

impl RowBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> {
        self.columns.iter().map(|c| c.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_fields() {
        assert_eq!(Value::Int(-3).to_field(), "-3");
        assert_eq!(Value::Real(0.25).to_field(), "0.25");
        assert_eq!(Value::Real(f64::NAN).to_field(), "");
        assert_eq!(Value::Bool(true).to_field(), "True");
        assert_eq!(Value::Text("cue".into()).to_field(), "cue");
    }
}
