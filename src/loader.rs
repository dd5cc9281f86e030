//! Reads delimited source files into untyped, in-memory tables.
//!
//! A [`RawTable`] keeps every cell as text; typing happens in
//! [`crate::preprocess`]. Files ending in `.gz` are decompressed on the fly.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::{InsightsError, Result};

/// A headed table of string cells as read from disk.
#[derive(Debug, Clone)]
pub struct RawTable {
    name: String,
    headers: Vec<String>,
    rows: Vec<StringRecord>,
}

impl RawTable {
    /// Reads a headed CSV from any reader. `table` labels the table in errors.
    pub fn from_reader<R: Read>(table: &str, reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().trim(Trim::Headers).from_reader(reader);

        let headers = rdr.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            rows.push(result?);
        }

        debug!(table, rows = rows.len(), "Read raw table");

        Ok(Self {
            name: table.to_string(),
            headers,
            rows,
        })
    }

    /// Opens `path` and reads it, decompressing when the extension is `gz`.
    #[tracing::instrument(skip(path), fields(path = %path.display()))]
    pub fn from_path(table: &str, path: &Path) -> Result<Self> {
        let file = File::open(path)?;

        if path.extension().and_then(|e| e.to_str()) == Some("gz") {
            debug!("Decompressing gzip input");
            Self::from_reader(table, GzDecoder::new(file))
        } else {
            Self::from_reader(table, file)
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &StringRecord> {
        self.rows.iter()
    }

    /// Rows paired with their 1-based data-row number in the source file.
    /// Numbers survive [`retain_rows`](Self::retain_rows), so errors point at
    /// the line a user would find in the file.
    pub fn numbered_rows(&self) -> impl Iterator<Item = (usize, &StringRecord)> {
        self.rows.iter().enumerate().map(|(i, row)| {
            let number = row
                .position()
                .and_then(|p| usize::try_from(p.record()).ok())
                .unwrap_or(i + 1);
            (number, row)
        })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Like [`column_index`](Self::column_index) but absence is an error.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| InsightsError::MissingColumn {
                table: self.name.clone(),
                column: name.to_string(),
            })
    }

    /// Removes every listed column that exists. Returns how many were removed.
    pub fn drop_columns(&mut self, names: &[&str]) -> usize {
        let keep: Vec<usize> = (0..self.headers.len())
            .filter(|&i| !names.contains(&self.headers[i].as_str()))
            .collect();

        let dropped = self.headers.len() - keep.len();
        if dropped == 0 {
            return 0;
        }

        self.headers = keep.iter().map(|&i| self.headers[i].clone()).collect();
        for row in &mut self.rows {
            let mut kept: StringRecord = keep.iter().filter_map(|&i| row.get(i)).collect();
            kept.set_position(row.position().cloned());
            *row = kept;
        }

        dropped
    }

    /// Keeps only rows whose trimmed `column` cell satisfies `keep`. Returns
    /// how many rows were removed.
    pub fn retain_rows(
        &mut self,
        column: &str,
        mut keep: impl FnMut(&str) -> bool,
    ) -> Result<usize> {
        let idx = self.require_column(column)?;
        let before = self.rows.len();

        self.rows.retain(|row| keep(row.get(idx).unwrap_or("").trim()));

        let removed = before - self.rows.len();
        debug!(table = %self.name, column, removed, "Filtered raw rows");
        Ok(removed)
    }

    /// Renames column `from` to `to`. Returns `false` when `from` is absent.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(i) => {
                self.headers[i] = to.to_string();
                true
            }
            None => false,
        }
    }
}
