//! CSV format support.
//!
//! Tables are read with a header row. Triple lists are headerless:
//! `subject,predicate,object` or `subject,object` (predicate `related_to`).

use crate::table::ColumnType;
use crate::{Result, Table, Triple};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

/// Predicate used for two-column triple rows.
pub const DEFAULT_RELATION: &str = "related_to";

/// CSV format handler.
pub struct Csv;

impl Csv {
    /// Read a headered CSV into a [`Table`].
    ///
    /// Column types are inferred over the whole column (see [`ColumnType::infer`]),
    /// so the read is two-pass over the buffered records.
    pub fn read_table<R: Read>(reader: R) -> Result<Table> {
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let records = reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let types: Vec<ColumnType> = (0..headers.len())
            .map(|col| ColumnType::infer(records.iter().map(|r| r.get(col).unwrap_or(""))))
            .collect();

        let mut table = Table::new(headers);
        for record in &records {
            let row = types
                .iter()
                .enumerate()
                .map(|(col, ty)| ty.parse(record.get(col).unwrap_or("")))
                .collect();
            table.push_row(row)?;
        }

        tracing::debug!(
            rows = table.num_rows(),
            columns = table.num_columns(),
            "read CSV table"
        );
        Ok(table)
    }

    /// Read a headered CSV file into a [`Table`].
    pub fn read_table_path(path: impl AsRef<Path>) -> Result<Table> {
        let file = File::open(path)?;
        Self::read_table(BufReader::new(file))
    }

    /// Read headerless triples.
    ///
    /// - 3+ cols: subject, predicate, object (extra columns ignored)
    /// - 2 cols: subject, object (predicate = [`DEFAULT_RELATION`])
    /// - shorter rows are skipped
    pub fn read_triples<R: Read>(reader: R) -> Result<Vec<Triple>> {
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut triples = Vec::new();
        let mut skipped = 0usize;

        for result in reader.records() {
            let record = result?;
            if record.len() >= 3 {
                triples.push(Triple::new(&record[0], &record[1], &record[2]));
            } else if record.len() == 2 {
                triples.push(Triple::new(&record[0], DEFAULT_RELATION, &record[1]));
            } else {
                skipped += 1;
            }
        }

        if skipped > 0 {
            tracing::warn!(skipped, "skipped CSV rows with fewer than two columns");
        }
        Ok(triples)
    }

    /// Read headerless triples from a file.
    pub fn read_triples_path(path: impl AsRef<Path>) -> Result<Vec<Triple>> {
        let file = File::open(path)?;
        Self::read_triples(BufReader::new(file))
    }

    /// Write triples as headerless `subject,predicate,object` rows.
    pub fn write_triples<W: Write>(writer: W, triples: &[Triple]) -> Result<()> {
        let mut writer = ::csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        for triple in triples {
            writer.write_record(triple.as_array())?;
        }
        writer.flush()?;
        Ok(())
    }
}
