// Allow minor clippy style warnings at crate level
// These are mostly style preferences, not bugs
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]

//! Core types for turning tabular data into knowledge graph triples.
//!
//! - [`Triple`] - A (subject, predicate, object) statement
//! - [`Table`] / [`Value`] - Named columns of typed cells
//! - [`SchemaEntry`] - A `(subject column, predicate, object column)` rule
//! - [`dataframe_to_triples`] - Apply a schema to a table
//!
//! # Example
//!
//! ```rust
//! use lattix_core::{dataframe_to_triples, SchemaEntry, Table};
//!
//! let csv = "sepal_length,species\n5.1,setosa\n4.9,setosa\n";
//! let table = Table::from_csv_reader(csv.as_bytes()).unwrap();
//!
//! let schema = [SchemaEntry::new("species", "has_sepal_length", "sepal_length")];
//! let triples = dataframe_to_triples(&table, &schema).unwrap();
//!
//! assert_eq!(triples.len(), 2);
//! assert_eq!(triples[1].object, "4.9");
//! ```
//!
//! Referencing a column the table does not have is an error, and nothing
//! is emitted:
//!
//! ```rust
//! use lattix_core::{dataframe_to_triples, Error, SchemaEntry, Table};
//!
//! let table = Table::new(["species"]);
//! let schema = [SchemaEntry::new("species", "has_sepal_length", "abc")];
//! assert!(matches!(
//!     dataframe_to_triples(&table, &schema),
//!     Err(Error::MissingColumn(_))
//! ));
//! ```

mod error;
pub mod formats;
mod schema;
mod table;
mod triple;

pub use error::{Error, Result};
pub use formats::Csv;
pub use schema::{dataframe_to_triples, dataframe_to_triples_with, MissingValues, SchemaEntry};
pub use table::{ColumnType, Table, Value};
pub use triple::Triple;
