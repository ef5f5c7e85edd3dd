use std::collections::HashMap;
use std::fmt;

use allocative::Allocative;

use crate::error::{DbError, Result};
use crate::table::Table;

/// The in-memory model of one database directory.
///
/// Tables are keyed by their lower-cased name, so every lookup is
/// case-insensitive.
#[derive(Debug, Default, Allocative)]
pub struct Database {
    /// The database identifier, which is also its directory name.
    name: String,
    /// A map of lower-cased table names to their [Table].
    tables: HashMap<String, Table>,
}

/// Tabular output of `SELECT` and `JOIN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    /// The header, in display order.
    pub columns: Vec<String>,
    /// One entry per output row, aligned with `columns`.
    pub rows: Vec<Vec<String>>,
}

impl fmt::Display for QueryResult {
    /// Header then rows, one line each, cells separated by tabs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.columns.join("\t"))?;
        for row in &self.rows {
            writeln!(f, "{}", row.join("\t"))?;
        }
        Ok(())
    }
}

impl Database {
    /// Creates a new, empty database instance.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            tables: HashMap::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a table.
    ///
    /// # Errors
    /// Returns [DbError::DuplicateTable] if a table with the same name already exists.
    pub fn add_table(&mut self, table: Table) -> Result<()> {
        let key = table.name().to_lowercase();
        if self.tables.contains_key(&key) {
            return Err(DbError::DuplicateTable(key));
        }
        self.tables.insert(key, table);
        Ok(())
    }

    /// Removes a table from the database by its name and hands it back.
    ///
    /// # Errors
    /// Returns [DbError::UnknownTable] if the table does not exist.
    pub fn remove_table(&mut self, name: &str) -> Result<Table> {
        self.tables
            .remove(&name.to_lowercase())
            .ok_or_else(|| DbError::UnknownTable(name.to_string()))
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(&name.to_lowercase())
    }

    /// Retrieves a reference to a table by name.
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(&name.to_lowercase())
            .ok_or_else(|| DbError::UnknownTable(name.to_string()))
    }

    /// Retrieves a mutable reference to a table by name.
    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(&name.to_lowercase())
            .ok_or_else(|| DbError::UnknownTable(name.to_string()))
    }

    /// Returns the names of all tables, sorted.
    pub fn list_tables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.values().map(|t| t.name()).collect();
        names.sort_unstable();
        names
    }

    /// Bytes held by the loaded model, as measured by `allocative`.
    pub fn memory_footprint(&self) -> usize {
        allocative::size_of_unique(self)
    }
}
