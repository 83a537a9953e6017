// src/table/types.rs

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Column-oriented table keyed by header name.
///
/// Columns keep the order in which their name first appeared in the header
/// row, and every column holds exactly `num_rows()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<(String, Vec<String>)>,
}

impl Table {
    /// Build a table from `(name, cells)` pairs. A repeated name replaces the
    /// cells of the earlier column but keeps its position.
    ///
    /// Returns `None` if the columns are not all the same length.
    pub fn from_columns<I, N, C, V>(columns: I) -> Option<Self>
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let mut table = Table::default();
        for (name, cells) in columns {
            table.upsert(name.into(), cells.into_iter().map(Into::into).collect());
        }
        let rows = table.num_rows();
        if table.columns.iter().all(|(_, cells)| cells.len() == rows) {
            Some(table)
        } else {
            None
        }
    }

    pub(crate) fn upsert(&mut self, name: String, cells: Vec<String>) {
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = cells,
            None => self.columns.push((name, cells)),
        }
    }

    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, cells)| cells.as_slice())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.columns
            .iter()
            .map(|(n, cells)| (n.as_str(), cells.as_slice()))
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |(_, cells)| cells.len())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Serializes as `{"<column>": ["<cell>", ...], ...}` in column order.
impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, cells) in &self.columns {
            map.serialize_entry(name, cells)?;
        }
        map.end()
    }
}
