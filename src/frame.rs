//! In-memory table threaded through the pipeline.
//!
//! A [`Frame`] holds named columns over row-major typed cells. Stages derive
//! new columns row by row and never reorder retained rows unless they say so.

use std::io::Write;

use anyhow::{Context, Result, ensure};

use crate::data::{Value, display_cell};

pub type Row = Vec<Option<Value>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Frame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        let width = columns.len();
        for (idx, row) in rows.iter().enumerate() {
            ensure!(
                row.len() == width,
                "Row {} has {} cell(s) but the frame has {} column(s)",
                idx,
                row.len(),
                width
            );
        }
        Ok(Self { columns, rows })
    }

    /// Builds a frame whose rows are known to match the column count.
    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Row>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == columns.len()));
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Row>) {
        (self.columns, self.rows)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first column with this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_ref()
    }

    pub fn column_values<'a>(
        &'a self,
        column: &str,
    ) -> Option<impl Iterator<Item = Option<&'a Value>> + 'a> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(move |row| row[idx].as_ref()))
    }

    pub fn rename_columns<F>(&mut self, mut rename: F)
    where
        F: FnMut(&str) -> String,
    {
        for column in &mut self.columns {
            *column = rename(column);
        }
    }

    pub fn push_row(&mut self, row: Row) -> Result<()> {
        ensure!(
            row.len() == self.columns.len(),
            "Row has {} cell(s) but the frame has {} column(s)",
            row.len(),
            self.columns.len()
        );
        self.rows.push(row);
        Ok(())
    }

    /// Computes a cell for every row and stores it under `name`, replacing an
    /// existing column of that name in place or appending a new one.
    pub fn derive_column<F>(&mut self, name: &str, mut derive: F)
    where
        F: FnMut(&Row) -> Option<Value>,
    {
        match self.column_index(name) {
            Some(idx) => {
                for row in &mut self.rows {
                    row[idx] = derive(row);
                }
            }
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    let value = derive(row);
                    row.push(value);
                }
            }
        }
    }

    /// Renders the first `limit` rows as display strings.
    pub fn preview_rows(&self, limit: usize) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .take(limit)
            .map(|row| row.iter().map(|cell| display_cell(cell.as_ref())).collect())
            .collect()
    }

    pub fn write_csv<W: Write>(&self, writer: &mut csv::Writer<W>) -> Result<()> {
        writer
            .write_record(&self.columns)
            .context("Writing headers")?;
        for (idx, row) in self.rows.iter().enumerate() {
            writer
                .write_record(row.iter().map(|cell| display_cell(cell.as_ref())))
                .with_context(|| format!("Writing row {}", idx + 2))?;
        }
        writer.flush().context("Flushing CSV output")?;
        Ok(())
    }
}
