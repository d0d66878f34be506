//! Schema-driven conversion of tables into triples.
//!
//! A schema is a list of [`SchemaEntry`] rules. Each rule names a subject
//! column, a fixed predicate label and an object column; applying it to a
//! table yields one triple per row.
//!
//! ```rust
//! use lattix_core::{dataframe_to_triples, SchemaEntry, Table};
//!
//! let table = Table::from_rows(
//!     ["species", "sepal_length"],
//!     vec![vec!["setosa".into(), 5.1.into()]],
//! ).unwrap();
//!
//! let schema = [SchemaEntry::new("species", "has_sepal_length", "sepal_length")];
//! let triples = dataframe_to_triples(&table, &schema).unwrap();
//! assert_eq!(triples[0].as_array(), ["setosa", "has_sepal_length", "5.1"]);
//! ```

use crate::{Result, Table, Triple};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One triple-generation rule: `(subject column, predicate label, object column)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaEntry {
    /// Column whose values become subjects.
    pub subject_column: String,
    /// Literal predicate label attached to every generated triple.
    pub predicate: String,
    /// Column whose values become objects.
    pub object_column: String,
}

impl SchemaEntry {
    /// Create a new schema entry.
    pub fn new(
        subject_column: impl Into<String>,
        predicate: impl Into<String>,
        object_column: impl Into<String>,
    ) -> Self {
        Self {
            subject_column: subject_column.into(),
            predicate: predicate.into(),
            object_column: object_column.into(),
        }
    }
}

impl<S: Into<String>> From<(S, S, S)> for SchemaEntry {
    fn from((s, p, o): (S, S, S)) -> Self {
        Self::new(s, p, o)
    }
}

impl fmt::Display for SchemaEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.subject_column, self.predicate, self.object_column
        )
    }
}

impl FromStr for SchemaEntry {
    type Err = String;

    /// Parse `subject_column:predicate:object_column`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [subj, pred, obj] if !subj.is_empty() && !pred.is_empty() && !obj.is_empty() => {
                Ok(Self::new(*subj, *pred, *obj))
            }
            _ => Err(format!(
                "expected subject_column:predicate:object_column, got '{s}'"
            )),
        }
    }
}

/// What to do with rows whose subject or object cell is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingValues {
    /// Emit the triple with the missing cell rendered as `nan`.
    #[default]
    Keep,
    /// Drop the triple.
    Skip,
}

/// Convert a table into triples according to a schema.
///
/// Every column the schema references must exist, otherwise
/// [`Error::MissingColumn`](crate::Error::MissingColumn) is returned and no
/// triples are produced. Output is schema-major: all triples of the first
/// entry in row order, then all triples of the second entry, and so on.
pub fn dataframe_to_triples(table: &Table, schema: &[SchemaEntry]) -> Result<Vec<Triple>> {
    dataframe_to_triples_with(table, schema, MissingValues::Keep)
}

/// [`dataframe_to_triples`] with an explicit policy for missing cells.
pub fn dataframe_to_triples_with(
    table: &Table,
    schema: &[SchemaEntry],
    missing: MissingValues,
) -> Result<Vec<Triple>> {
    // Resolve every column before emitting anything.
    let resolved = schema
        .iter()
        .map(|entry| {
            let subject = table.require_column(&entry.subject_column)?;
            let object = table.require_column(&entry.object_column)?;
            Ok((subject, object))
        })
        .collect::<Result<Vec<(usize, usize)>>>()?;

    let mut triples = Vec::with_capacity(resolved.len() * table.num_rows());
    let mut skipped = 0usize;

    for (entry, (subj_idx, obj_idx)) in schema.iter().zip(resolved) {
        for row in table.rows() {
            let (subject, object) = (&row[subj_idx], &row[obj_idx]);
            if missing == MissingValues::Skip && (subject.is_null() || object.is_null()) {
                skipped += 1;
                continue;
            }
            triples.push(Triple::new(
                subject.to_string(),
                entry.predicate.as_str(),
                object.to_string(),
            ));
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped, "dropped triples with missing subject or object");
    }
    tracing::debug!(
        rows = table.num_rows(),
        rules = schema.len(),
        triples = triples.len(),
        "converted table to triples"
    );

    Ok(triples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Value};

    fn sample() -> Table {
        Table::from_rows(
            ["name", "city", "age"],
            vec![
                vec!["alice".into(), "paris".into(), 31i64.into()],
                vec!["bob".into(), Value::Null, 27i64.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_schema_major_order() {
        let schema = [
            SchemaEntry::new("name", "lives_in", "city"),
            SchemaEntry::new("name", "has_age", "age"),
        ];
        let triples = dataframe_to_triples(&sample(), &schema).unwrap();

        let got: Vec<[&str; 3]> = triples.iter().map(Triple::as_array).collect();
        assert_eq!(
            got,
            vec![
                ["alice", "lives_in", "paris"],
                ["bob", "lives_in", "nan"],
                ["alice", "has_age", "31"],
                ["bob", "has_age", "27"],
            ]
        );
    }

    #[test]
    fn test_skip_missing() {
        let schema = [SchemaEntry::new("name", "lives_in", "city")];
        let triples =
            dataframe_to_triples_with(&sample(), &schema, MissingValues::Skip).unwrap();
        assert_eq!(triples, vec![Triple::new("alice", "lives_in", "paris")]);
    }

    #[test]
    fn test_missing_subject_column() {
        let schema = [SchemaEntry::new("nope", "p", "city")];
        let err = dataframe_to_triples(&sample(), &schema).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(c) if c == "nope"));
    }

    #[test]
    fn test_later_bad_entry_produces_nothing() {
        let schema = [
            SchemaEntry::new("name", "lives_in", "city"),
            SchemaEntry::new("name", "p", "abc"),
        ];
        assert!(matches!(
            dataframe_to_triples(&sample(), &schema),
            Err(Error::MissingColumn(c)) if c == "abc"
        ));
    }

    #[test]
    fn test_empty_schema() {
        assert!(dataframe_to_triples(&sample(), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_parse_schema_entry() {
        let entry: SchemaEntry = "species:has_sepal_length:sepal_length".parse().unwrap();
        assert_eq!(
            entry,
            SchemaEntry::new("species", "has_sepal_length", "sepal_length")
        );
        assert_eq!(entry.to_string(), "species:has_sepal_length:sepal_length");

        assert!("species:has_sepal_length".parse::<SchemaEntry>().is_err());
        assert!("a::b".parse::<SchemaEntry>().is_err());
    }
}
