//! Schema-light, column-ordered table used by every pipeline stage.
//!
//! A `Table` maps column names to column data while preserving column order.
//! Cells are kept verbatim as text; `None` marks a missing value (an empty
//! field in the source file). The row index is implicit: it is a row's
//! position, so building a table from a subset of rows always yields a dense
//! 0-based index.

use indexmap::IndexMap;
use thiserror::Error;

/// A single cell. `None` is the missing-data marker.
pub type Cell = Option<String>;

/// Identifier of one subset: `"{group}_{participant}"`.
pub type SubsetKey = String;

/// Ordered mapping from subset key to its table.
///
/// Insertion order is the order in which subsets were created. Inserting an
/// existing key replaces the table and keeps the key's original position.
pub type SubsetCollection = IndexMap<SubsetKey, Table>;

/// Errors raised by column-level table operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("column not found: '{0}'")]
    MissingColumn(String),

    #[error("column '{0}' already exists")]
    DuplicateColumn(String),

    #[error("column '{name}' has {actual} values, table has {expected} rows")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("row has {actual} fields, table has {expected} columns")]
    RowWidth { expected: usize, actual: usize },

    #[error("row {row} out of bounds for table with {height} rows")]
    RowOutOfBounds { row: usize, height: usize },
}

/// Result type for table operations.
pub type Result<T> = std::result::Result<T, TableError>;

/// Column-ordered table of text cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: IndexMap<String, Vec<Cell>>,
    height: usize,
}

impl Table {
    /// Creates an empty table with the given column names.
    ///
    /// Repeated header names keep only their first occurrence.
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns = IndexMap::new();
        for name in headers {
            columns.entry(name.into()).or_insert_with(Vec::new);
        }
        Self { columns, height: 0 }
    }

    /// Builds a table from `(name, values)` pairs. All columns must have the
    /// same length.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<Cell>)>,
        S: Into<String>,
    {
        let mut table = Table::default();
        for (name, values) in columns {
            let position = table.width();
            table.insert_column(position, name, values)?;
        }
        Ok(table)
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.height == 0
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Returns the data of a column.
    pub fn column(&self, name: &str) -> Result<&[Cell]> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    /// Returns one cell by row position and column name.
    pub fn cell(&self, row: usize, name: &str) -> Result<Option<&str>> {
        let column = self.column(name)?;
        let cell = column.get(row).ok_or(TableError::RowOutOfBounds {
            row,
            height: self.height,
        })?;
        Ok(cell.as_deref())
    }

    /// Appends a row. The row must have exactly one field per column.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.width() {
            return Err(TableError::RowWidth {
                expected: self.width(),
                actual: row.len(),
            });
        }
        for (column, value) in self.columns.values_mut().zip(row) {
            column.push(value);
        }
        self.height += 1;
        Ok(())
    }

    /// Iterates rows as vectors of borrowed cells, in column order.
    pub fn rows(&self) -> impl Iterator<Item = Vec<Option<&str>>> + '_ {
        (0..self.height).map(move |i| {
            self.columns
                .values()
                .map(|column| column[i].as_deref())
                .collect()
        })
    }

    /// Builds a new table holding the given rows, in the given order.
    ///
    /// The result has a dense 0-based row index.
    pub fn take_rows(&self, indices: &[usize]) -> Result<Table> {
        if let Some(&row) = indices.iter().find(|&&i| i >= self.height) {
            return Err(TableError::RowOutOfBounds {
                row,
                height: self.height,
            });
        }
        let columns = self
            .columns
            .iter()
            .map(|(name, values)| {
                let taken = indices.iter().map(|&i| values[i].clone()).collect();
                (name.clone(), taken)
            })
            .collect();
        Ok(Table {
            columns,
            height: indices.len(),
        })
    }

    /// Removes the named columns.
    ///
    /// Fails without modifying the table if any name is absent.
    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        if let Some(missing) = names.iter().find(|n| !self.has_column((*n).as_ref())) {
            return Err(TableError::MissingColumn(missing.as_ref().to_string()));
        }
        for name in names {
            self.columns.shift_remove(name.as_ref());
        }
        Ok(())
    }

    /// Inserts a column at `position` (clamped to the current width).
    ///
    /// On an empty, column-less table the new column defines the height.
    pub fn insert_column<S: Into<String>>(
        &mut self,
        position: usize,
        name: S,
        values: Vec<Cell>,
    ) -> Result<()> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(TableError::DuplicateColumn(name));
        }
        if self.width() == 0 {
            self.height = values.len();
        } else if values.len() != self.height {
            return Err(TableError::LengthMismatch {
                name,
                expected: self.height,
                actual: values.len(),
            });
        }
        let position = position.min(self.width());
        self.columns.shift_insert(position, name, values);
        Ok(())
    }
}
