//! Text formats for tables and triples.
//!
//! - CSV tables with a header row (column types inferred)
//! - CSV triple lists: `subject,predicate,object` or `subject,object`

mod csv;

pub use self::csv::{Csv, DEFAULT_RELATION};
