use allocative::Allocative;
use bitvec::slice::BitSlice;

use crate::database::QueryResult;
use crate::error::{DbError, Result};
use crate::keyword::is_reserved;

/// Name of the primary key column, always at position 0.
pub const PRIMARY_KEY: &str = "id";

/// Cell text used to pad rows when a column is added.
pub const NULL_CELL: &str = "NULL";

/// A table: ordered column names and rows of text cells aligned with them.
///
/// Every row has exactly one cell per column. `last_primary_key` only ever
/// grows; ids are never reused after a delete.
#[derive(Debug, Clone, Allocative)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    last_primary_key: u64,
}

impl Table {
    /// Creates a table with no columns yet. Used when loading from disk,
    /// where the header supplies every column including `id`.
    pub fn new(name: &str, last_primary_key: u64) -> Self {
        Self {
            name: name.to_lowercase(),
            columns: Vec::new(),
            rows: Vec::new(),
            last_primary_key,
        }
    }

    /// Creates an empty table holding `id` followed by `columns`.
    ///
    /// # Errors
    /// Fails on a duplicate (case-insensitive) or reserved column name.
    pub fn with_columns(name: &str, columns: &[String]) -> Result<Self> {
        let mut table = Table::new(name, 0);
        table.add_column(PRIMARY_KEY)?;
        for column in columns {
            table.add_column(column)?;
        }
        Ok(table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn last_primary_key(&self) -> u64 {
        self.last_primary_key
    }

    pub fn set_last_primary_key(&mut self, value: u64) {
        self.last_primary_key = value;
    }

    /// Position of a column, matched case-insensitively.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Like [Table::column_index] but fails on an unknown name.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| DbError::UnknownColumn(name.to_string()))
    }

    /// Appends a column and pads every existing row with `NULL`.
    pub fn add_column(&mut self, name: &str) -> Result<()> {
        if is_reserved(name) {
            return Err(DbError::ReservedWord(name.to_string()));
        }
        if self.column_index(name).is_some() {
            return Err(DbError::DuplicateColumn(name.to_string()));
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(NULL_CELL.to_string());
        }
        Ok(())
    }

    /// Removes a column and its cell from every row. The primary key cannot be dropped.
    pub fn drop_column(&mut self, name: &str) -> Result<()> {
        if name.eq_ignore_ascii_case(PRIMARY_KEY) {
            return Err(DbError::PrimaryKeyNotWritable);
        }
        let index = self.require_column(name)?;
        self.columns.remove(index);
        for row in &mut self.rows {
            row.remove(index);
        }
        Ok(())
    }

    /// Appends a complete row, id included.
    pub fn add_row_with_id(&mut self, row: Vec<String>) -> Result<()> {
        self.check_arity(row.len())?;
        self.rows.push(row);
        Ok(())
    }

    /// Appends a row without its id, assigning the next primary key.
    ///
    /// Returns the id given to the row.
    pub fn add_row(&mut self, values: Vec<String>) -> Result<u64> {
        self.check_arity(values.len() + 1)?;
        self.last_primary_key += 1;
        let mut row = Vec::with_capacity(self.columns.len());
        row.push(self.last_primary_key.to_string());
        row.extend(values);
        self.rows.push(row);
        Ok(self.last_primary_key)
    }

    /// Replaces every row at once, as UPDATE and DELETE do after filtering.
    pub fn replace_rows(&mut self, rows: Vec<Vec<String>>) -> Result<()> {
        for row in &rows {
            self.check_arity(row.len())?;
        }
        self.rows = rows;
        Ok(())
    }

    /// Maps requested column names to their declared spelling.
    pub fn canonical_columns(&self, names: &[String]) -> Result<Vec<String>> {
        names
            .iter()
            .map(|name| {
                let index = self.require_column(name)?;
                let stored = &self.columns[index];
                if is_reserved(stored) {
                    return Err(DbError::ReservedWord(stored.clone()));
                }
                Ok(stored.clone())
            })
            .collect()
    }

    /// Selects `names` from the rows whose bit is set in `mask`, or from all
    /// rows when no mask is given.
    pub fn projection(&self, names: &[String], mask: Option<&BitSlice>) -> Result<QueryResult> {
        let columns = self.canonical_columns(names)?;
        let indexes: Vec<usize> = columns
            .iter()
            .map(|c| self.require_column(c))
            .collect::<Result<_>>()?;

        let rows = self
            .rows
            .iter()
            .enumerate()
            .filter(|(i, _)| mask.is_none_or(|m| m.get(*i).is_some_and(|bit| *bit)))
            .map(|(_, row)| indexes.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Ok(QueryResult { columns, rows })
    }

    fn check_arity(&self, len: usize) -> Result<()> {
        if len > self.columns.len() {
            return Err(DbError::TooManyValues(self.name.clone()));
        }
        if len < self.columns.len() {
            return Err(DbError::TooFewValues(self.name.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitvec::prelude::*;

    fn marks() -> Table {
        let mut table =
            Table::with_columns("Marks", &["name".into(), "mark".into(), "pass".into()]).unwrap();
        table
            .add_row(vec!["Steve".into(), "65".into(), "TRUE".into()])
            .unwrap();
        table
            .add_row(vec!["Dave".into(), "55".into(), "TRUE".into()])
            .unwrap();
        table
    }

    #[test]
    fn test_table_creation() {
        let table = marks();
        assert_eq!(table.name(), "marks");
        assert_eq!(table.columns(), ["id", "name", "mark", "pass"]);
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.last_primary_key(), 2);
    }

    #[test]
    fn test_rejects_duplicate_and_reserved_columns() {
        let dup = Table::with_columns("t", &["name".into(), "NAME".into()]);
        assert!(matches!(dup, Err(DbError::DuplicateColumn(_))));

        let reserved = Table::with_columns("t", &["like".into()]);
        assert!(matches!(reserved, Err(DbError::ReservedWord(_))));

        let explicit_id = Table::with_columns("t", &["id".into()]);
        assert!(matches!(explicit_id, Err(DbError::DuplicateColumn(_))));
    }

    #[test]
    fn test_add_row_assigns_ids() {
        let mut table = marks();
        let id = table
            .add_row(vec!["Bob".into(), "35".into(), "FALSE".into()])
            .unwrap();
        assert_eq!(id, 3);
        assert_eq!(table.rows()[2], ["3", "Bob", "35", "FALSE"]);
    }

    #[test]
    fn test_column_count_mismatch() {
        let mut table = marks();
        let too_few = table.add_row(vec!["Bob".into(), "35".into()]);
        assert!(matches!(too_few, Err(DbError::TooFewValues(_))));

        let too_many = table.add_row(vec!["a".into(), "b".into(), "c".into(), "d".into()]);
        assert!(matches!(too_many, Err(DbError::TooManyValues(_))));

        // failed inserts do not consume a primary key
        assert_eq!(table.last_primary_key(), 2);

        let with_id = table.add_row_with_id(vec!["9".into()]);
        assert!(matches!(with_id, Err(DbError::TooFewValues(_))));
    }

    #[test]
    fn test_add_column_pads_with_null() {
        let mut table = marks();
        table.add_column("isAbsent").unwrap();
        assert_eq!(table.columns().len(), 5);
        assert!(table.rows().iter().all(|r| r[4] == NULL_CELL));
    }

    #[test]
    fn test_drop_column() {
        let mut table = marks();
        table.drop_column("MARK").unwrap();
        assert_eq!(table.columns(), ["id", "name", "pass"]);
        assert_eq!(table.rows()[0], ["1", "Steve", "TRUE"]);

        assert!(matches!(
            table.drop_column("Id"),
            Err(DbError::PrimaryKeyNotWritable)
        ));
        assert!(matches!(
            table.drop_column("ghost"),
            Err(DbError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_projection_uses_declared_names() {
        let mut table = Table::with_columns("t", &["Name".into()]).unwrap();
        table.add_row(vec!["Steve".into()]).unwrap();

        let result = table.projection(&["NAME".into(), "id".into()], None).unwrap();
        assert_eq!(result.columns, ["Name", "id"]);
        assert_eq!(result.rows, vec![vec!["Steve".to_string(), "1".to_string()]]);

        let unknown = table.projection(&["age".into()], None);
        assert!(matches!(unknown, Err(DbError::UnknownColumn(_))));
    }

    #[test]
    fn test_projection_with_mask() {
        let table = marks();
        let mask = bitvec![0, 1];
        let result = table
            .projection(&["name".into()], Some(mask.as_bitslice()))
            .unwrap();
        assert_eq!(result.rows, vec![vec!["Dave".to_string()]]);
    }

    #[test]
    fn test_replace_rows_checks_arity() {
        let mut table = marks();
        let bad = table.replace_rows(vec![vec!["1".into()]]);
        assert!(matches!(bad, Err(DbError::TooFewValues(_))));
        assert_eq!(table.rows().len(), 2);

        table.replace_rows(Vec::new()).unwrap();
        assert!(table.rows().is_empty());
        assert_eq!(table.last_primary_key(), 2);
    }
}
