// src/table/mod.rs
use csv::ReaderBuilder;
use std::io::{Cursor, Read};
use tracing::{debug, trace};

use crate::error::{Error, Result};

pub mod types;

pub use types::Table;

/// Parse comma-delimited text into a [`Table`].
///
/// The first record is the header row; every later record must have the same
/// number of fields. When a header name repeats, the later column wins.
pub fn load_table(text: &str) -> Result<Table> {
    Table::from_reader(Cursor::new(text.as_bytes()))
}

impl Table {
    /// Read a table from any byte stream of comma-delimited UTF-8 text.
    #[tracing::instrument(level = "debug", skip(reader))]
    pub fn from_reader<R: Read>(reader: R) -> Result<Table> {
        // strict record lengths: a short row is a format error, not a hole
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(false)
            .from_reader(reader);
        let mut records = rdr.records();

        let headers = match records.next() {
            Some(record) => record?,
            None => return Err(Error::Format("input has no header row".into())),
        };

        // For each distinct name, the position its cells are read from.
        // Later duplicates move the source position but not the column.
        let mut names: Vec<String> = Vec::with_capacity(headers.len());
        let mut sources: Vec<usize> = Vec::with_capacity(headers.len());
        for (pos, name) in headers.iter().enumerate() {
            match names.iter().position(|n| n == name) {
                Some(idx) => {
                    trace!(name, pos, "duplicate header overrides earlier column");
                    sources[idx] = pos;
                }
                None => {
                    names.push(name.to_string());
                    sources.push(pos);
                }
            }
        }

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); names.len()];
        for (idx, result) in records.enumerate() {
            let record = result
                .map_err(|e| Error::Format(format!("data row {}: {}", idx + 1, e)))?;
            for (column, &pos) in cells.iter_mut().zip(&sources) {
                column.push(record.get(pos).unwrap_or_default().to_string());
            }
        }

        let mut table = Table::default();
        for (name, column) in names.into_iter().zip(cells) {
            table.upsert(name, column);
        }
        debug!(
            columns = table.num_columns(),
            rows = table.num_rows(),
            "loaded table"
        );
        Ok(table)
    }
}
