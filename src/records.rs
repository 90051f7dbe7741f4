//! Column-addressed row storage shared by every pipeline stage.
//!
//! A `RecordSet` owns an ordered header and the rows beneath it. Cells are
//! `Option<String>`: `None` is a true null, `Some("")` is the empty-string
//! sentinel the date normalizer emits. Stages take the set by value and hand
//! it back, so there is only ever one owner.

use indexmap::IndexSet;

use crate::error::SchemaError;

pub type Cell = Option<String>;

/// One contact/event row. Cell positions follow the owning set's header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    cells: Vec<Cell>,
}

impl Record {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.cells.get(idx).and_then(|c| c.as_deref())
    }

    pub fn is_null(&self, idx: usize) -> bool {
        self.get(idx).is_none()
    }

    pub fn set(&mut self, idx: usize, value: Cell) {
        if let Some(slot) = self.cells.get_mut(idx) {
            *slot = value;
        }
    }

    /// Move the cell out, leaving a null behind.
    pub fn take(&mut self, idx: usize) -> Cell {
        self.cells.get_mut(idx).and_then(Option::take)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    columns: IndexSet<String>,
    rows: Vec<Record>,
}

impl RecordSet {
    pub fn new<I, S>(columns: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = IndexSet::new();
        for name in columns {
            let name = name.into();
            if set.contains(&name) {
                return Err(SchemaError::DuplicateColumn(name));
            }
            set.insert(name);
        }
        Ok(Self {
            columns: set,
            rows: Vec::new(),
        })
    }

    /// Build a set from a header and raw rows. Short rows are padded with nulls.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Cell>>) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Self::new(columns)?;
        for cells in rows {
            out.push_row(cells);
        }
        Ok(out)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    /// Position of `name` in the header.
    pub fn column(&self, name: &str) -> Result<usize, SchemaError> {
        self.columns
            .get_index_of(name)
            .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Record] {
        &mut self.rows
    }

    /// Cell lookup by row index and column name; `None` for nulls and unknown columns.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.columns.get_index_of(column)?;
        self.rows.get(row)?.get(idx)
    }

    pub fn push_row(&mut self, mut cells: Vec<Cell>) {
        cells.resize(self.columns.len(), None);
        self.rows.push(Record::new(cells));
    }

    /// Index of `name`, appending it as an all-null column when absent.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.columns.get_index_of(name) {
            return idx;
        }
        self.columns.insert(name.to_string());
        for row in &mut self.rows {
            row.cells.push(None);
        }
        self.columns.len() - 1
    }

    pub fn drop_column(&mut self, name: &str) -> Result<(), SchemaError> {
        let (idx, _) = self
            .columns
            .shift_remove_full(name)
            .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))?;
        for row in &mut self.rows {
            row.cells.remove(idx);
        }
        Ok(())
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<(), SchemaError> {
        let idx = self.column(from)?;
        if from != to && self.columns.contains(to) {
            return Err(SchemaError::DuplicateColumn(to.to_string()));
        }
        self.columns = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| if i == idx { to.to_string() } else { name.clone() })
            .collect();
        Ok(())
    }

    /// Append `other` below `self`, taking the union of both headers.
    /// Columns missing on either side are null-filled; no rows are deduplicated.
    pub fn concat(mut self, other: RecordSet) -> RecordSet {
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|name| self.ensure_column(name))
            .collect();
        let width = self.columns.len();
        self.rows.reserve(other.rows.len());
        for row in other.rows {
            let mut cells: Vec<Cell> = vec![None; width];
            for (src, value) in row.cells.into_iter().enumerate() {
                if let Some(&dst) = mapping.get(src) {
                    cells[dst] = value;
                }
            }
            self.rows.push(Record::new(cells));
        }
        self
    }
}
