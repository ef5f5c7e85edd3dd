use std::fmt;

use tracing::{debug, info, warn};

use crate::ast::*;
use crate::config::Config;
use crate::database::{Database, QueryResult};
use crate::error::{DbError, Result};
use crate::keyword::is_reserved;
use crate::parser;
use crate::storage::Storage;
use crate::table::{PRIMARY_KEY, Table};

/// What a command hands back to the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A mutation succeeded.
    Ok,
    /// A read succeeded and produced rows.
    Table(QueryResult),
    /// The command failed; the message already carries the command prefix.
    Error(String),
}

impl Response {
    pub fn is_ok(&self) -> bool {
        !matches!(self, Response::Error(_))
    }
}

impl fmt::Display for Response {
    /// The response text sent back to the client.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Ok => write!(f, "[OK]"),
            Response::Table(result) => write!(f, "[OK]:\n{result}"),
            Response::Error(message) => write!(f, "[ERROR]: {message}"),
        }
    }
}

/// One client's view of the engine: the storage root and the database
/// selected with `USE`, if any.
///
/// Commands run one at a time to completion. A mutation works on a copy of
/// the table; the copy replaces the live table only once its files have been
/// rewritten, so a failed command leaves memory and disk as they were.
///
/// # Example
/// ```
/// use tabdb::{Config, Session};
///
/// let root = tempfile::tempdir().unwrap();
/// let mut session = Session::open(Config::new(root.path())).unwrap();
/// session.execute("CREATE DATABASE school;");
/// session.execute("USE school;");
/// session.execute("CREATE TABLE marks (name, mark);");
/// session.execute("INSERT INTO marks VALUES ('Steve', 65);");
///
/// let response = session.execute("SELECT * FROM marks;");
/// assert_eq!(response.to_string(), "[OK]:\nid\tname\tmark\n1\tSteve\t65\n");
/// ```
#[derive(Debug)]
pub struct Session {
    config: Config,
    storage: Storage,
    current: Option<Database>,
}

impl Session {
    /// Opens a session on the configured storage root, creating it if needed.
    pub fn open(config: Config) -> Result<Self> {
        let storage = Storage::open(config.storage_root())?;
        Ok(Self {
            config,
            storage,
            current: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The database selected by the last successful `USE`.
    pub fn current_database(&self) -> Option<&Database> {
        self.current.as_ref()
    }

    /// Runs one command and renders its outcome. Never panics on user input.
    pub fn execute(&mut self, command: &str) -> Response {
        debug!(command, "received command");
        let statement = match parser::parse(command) {
            Ok(statement) => statement,
            Err(e) => {
                warn!(error = %e, "rejected command");
                return Response::Error(format!("Invalid query: {e}"));
            }
        };

        let prefix = error_prefix(&statement);
        match self.run(statement) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "{prefix}");
                Response::Error(format!("{prefix}: {e}"))
            }
        }
    }

    /// Executes an already parsed statement.
    pub fn run(&mut self, statement: Statement) -> Result<Response> {
        debug!(kind = ?statement.kind(), "executing");
        match statement {
            Statement::Use(name) => self.run_use(&name),
            Statement::CreateDatabase(name) => self.run_create_database(&name),
            Statement::CreateTable(create) => self.run_create_table(create),
            Statement::DropDatabase(name) => self.run_drop_database(&name),
            Statement::DropTable(name) => self.run_drop_table(&name),
            Statement::Alter(alter) => self.run_alter(alter),
            Statement::InsertInto(insert) => self.run_insert(insert),
            Statement::Select(select) => self.run_select(select),
            Statement::Update(update) => self.run_update(update),
            Statement::Delete(delete) => self.run_delete(delete),
            Statement::Join(join) => self.run_join(join),
        }
    }

    fn selected(&self) -> Result<&Database> {
        self.current.as_ref().ok_or(DbError::NoDatabaseSelected)
    }

    fn selected_mut(&mut self) -> Result<(&Storage, &mut Database)> {
        let database = self.current.as_mut().ok_or(DbError::NoDatabaseSelected)?;
        Ok((&self.storage, database))
    }

    fn run_use(&mut self, name: &str) -> Result<Response> {
        check_name(name)?;
        let database = self.storage.load_database(name)?;
        info!(database = name, "database selected");
        self.current = Some(database);
        Ok(Response::Ok)
    }

    fn run_create_database(&mut self, name: &str) -> Result<Response> {
        check_name(name)?;
        self.storage.create_database(name)?;
        Ok(Response::Ok)
    }

    fn run_drop_database(&mut self, name: &str) -> Result<Response> {
        check_name(name)?;
        self.storage.drop_database(name)?;
        if self.current.as_ref().is_some_and(|db| db.name() == name) {
            info!(database = name, "dropped the selected database");
            self.current = None;
        }
        Ok(Response::Ok)
    }

    fn run_create_table(&mut self, create: CreateTable) -> Result<Response> {
        check_name(&create.name)?;
        let (storage, database) = self.selected_mut()?;
        if database.has_table(&create.name) {
            return Err(DbError::DuplicateTable(create.name));
        }
        let table = Table::with_columns(&create.name, &create.columns)?;
        storage.create_table(database.name(), &table)?;
        database.add_table(table)?;
        Ok(Response::Ok)
    }

    fn run_drop_table(&mut self, name: &str) -> Result<Response> {
        check_name(name)?;
        let (storage, database) = self.selected_mut()?;
        database.table(name)?;
        storage.delete_table(database.name(), name)?;
        database.remove_table(name)?;
        Ok(Response::Ok)
    }

    fn run_alter(&mut self, alter: Alter) -> Result<Response> {
        check_name(&alter.table)?;
        let (storage, database) = self.selected_mut()?;
        let database_name = database.name().to_string();
        let table = database.table_mut(&alter.table)?;
        let mut staged = table.clone();
        match alter.action {
            AlterAction::Add => staged.add_column(&alter.column)?,
            AlterAction::Drop => staged.drop_column(&alter.column)?,
        }
        commit(storage, &database_name, table, staged)?;
        info!(table = table.name(), action = ?alter.action, column = %alter.column, "table altered");
        Ok(Response::Ok)
    }

    fn run_insert(&mut self, insert: InsertInto) -> Result<Response> {
        check_name(&insert.table)?;
        let (storage, database) = self.selected_mut()?;
        let database_name = database.name().to_string();
        let table = database.table_mut(&insert.table)?;
        let cells = insert.values.into_iter().map(|v| v.into_cell()).collect();
        let mut staged = table.clone();
        let id = staged.add_row(cells)?;
        commit(storage, &database_name, table, staged)?;
        info!(table = table.name(), id, "row inserted");
        Ok(Response::Ok)
    }

    fn run_select(&self, select: Select) -> Result<Response> {
        check_name(&select.table)?;
        let table = self.selected()?.table(&select.table)?;
        let names = match select.columns {
            ColumnsSelect::Star => table.columns().to_vec(),
            ColumnsSelect::ColumnsNames(names) => names,
        };
        let mask = select
            .where_clause
            .map(|condition| condition.matching_rows(table))
            .transpose()?;
        let result = table.projection(&names, mask.as_deref())?;
        debug!(table = table.name(), rows = result.rows.len(), "rows selected");
        Ok(Response::Table(result))
    }

    fn run_update(&mut self, update: Update) -> Result<Response> {
        check_name(&update.table)?;
        let (storage, database) = self.selected_mut()?;
        let database_name = database.name().to_string();
        let table = database.table_mut(&update.table)?;

        let mut targets = Vec::with_capacity(update.assignments.len());
        for (column, value) in update.assignments {
            if column.eq_ignore_ascii_case(PRIMARY_KEY) {
                return Err(DbError::PrimaryKeyNotWritable);
            }
            if is_reserved(&column) {
                return Err(DbError::ReservedWord(column));
            }
            let index = table.require_column(&column)?;
            targets.push((index, value.into_cell()));
        }

        let mask = update.where_clause.matching_rows(table)?;
        let rows = table
            .rows()
            .iter()
            .zip(mask.iter().by_vals())
            .map(|(row, hit)| {
                let mut row = row.clone();
                if hit {
                    for (index, cell) in &targets {
                        row[*index] = cell.clone();
                    }
                }
                row
            })
            .collect();
        let mut staged = table.clone();
        staged.replace_rows(rows)?;
        commit(storage, &database_name, table, staged)?;
        info!(table = table.name(), rows = mask.count_ones(), "rows updated");
        Ok(Response::Ok)
    }

    fn run_delete(&mut self, delete: Delete) -> Result<Response> {
        check_name(&delete.table)?;
        let (storage, database) = self.selected_mut()?;
        let database_name = database.name().to_string();
        let table = database.table_mut(&delete.table)?;

        let mask = delete.where_clause.matching_rows(table)?;
        let kept = table
            .rows()
            .iter()
            .zip(mask.iter().by_vals())
            .filter(|(_, hit)| !hit)
            .map(|(row, _)| row.clone())
            .collect();
        let mut staged = table.clone();
        staged.replace_rows(kept)?;
        commit(storage, &database_name, table, staged)?;
        info!(table = table.name(), rows = mask.count_ones(), "rows deleted");
        Ok(Response::Ok)
    }

    fn run_join(&self, join: Join) -> Result<Response> {
        for name in &join.tables {
            check_name(name)?;
        }
        let database = self.selected()?;
        let first = database.table(&join.tables[0])?;
        let second = database.table(&join.tables[1])?;
        let (first_column, second_column) = bind_join_attributes(&join)?;
        let first_key = first.require_column(&first_column)?;
        let second_key = second.require_column(&second_column)?;

        let mut columns = vec![PRIMARY_KEY.to_string()];
        columns.extend(joined_columns(first, first_key));
        columns.extend(joined_columns(second, second_key));

        let mut rows = Vec::new();
        for left in first.rows() {
            for right in second.rows() {
                if left[first_key] != right[second_key] {
                    continue;
                }
                let mut row = vec![(rows.len() + 1).to_string()];
                row.extend(kept_cells(left, first_key));
                row.extend(kept_cells(right, second_key));
                rows.push(row);
            }
        }
        debug!(
            first = first.name(),
            second = second.name(),
            rows = rows.len(),
            "tables joined"
        );
        Ok(Response::Table(QueryResult { columns, rows }))
    }
}

/// Writes `staged` to disk, then swaps it in for `table`.
fn commit(storage: &Storage, database: &str, table: &mut Table, staged: Table) -> Result<()> {
    storage.save_table(database, &staged)?;
    *table = staged;
    Ok(())
}

/// Database and table names may not collide with the command vocabulary.
fn check_name(name: &str) -> Result<()> {
    if is_reserved(name) {
        return Err(DbError::ReservedWord(name.to_string()));
    }
    Ok(())
}

fn error_prefix(statement: &Statement) -> &'static str {
    match statement {
        Statement::Use(_) => "Failed using database",
        Statement::CreateDatabase(_) => "Failed creating database",
        Statement::CreateTable(_) => "Failed creating table",
        Statement::DropDatabase(_) => "Failed dropping database",
        Statement::DropTable(_) => "Failed dropping table",
        Statement::Alter(_) => "Failed altering table",
        Statement::InsertInto(_) => "Failed inserting into table",
        Statement::Select(_) => "Failed getting data from table",
        Statement::Update(_) => "Failed updating table",
        Statement::Delete(_) => "Failed deleting from table",
        Statement::Join(_) => "Failed joining tables",
    }
}

/// Resolves which column of each joined table the `ON` attributes name.
///
/// Qualified attributes bind to their table; bare ones fill the remaining
/// tables in the order they were written.
fn bind_join_attributes(join: &Join) -> Result<(String, String)> {
    let mut bound: [Option<String>; 2] = [None, None];
    let mut bare = Vec::new();
    for attribute in &join.attributes {
        match &attribute.table {
            Some(qualifier) => {
                let slot = join
                    .tables
                    .iter()
                    .position(|t| t == qualifier)
                    .ok_or_else(|| DbError::UnknownTable(qualifier.clone()))?;
                bound[slot] = Some(attribute.column.clone());
            }
            None => bare.push(attribute.column.clone()),
        }
    }

    let mut bare = bare.into_iter();
    let [first, second] = bound;
    let mut resolve = |slot: Option<String>, table: &str| {
        slot.or_else(|| bare.next())
            .ok_or_else(|| DbError::UnboundJoinAttribute(table.to_string()))
    };
    let first = resolve(first, &join.tables[0])?;
    let second = resolve(second, &join.tables[1])?;
    Ok((first, second))
}

/// Every column but the primary key and the join column, as `table.column`.
fn joined_columns(table: &Table, join_key: usize) -> impl Iterator<Item = String> + '_ {
    table
        .columns()
        .iter()
        .enumerate()
        .filter(move |(i, _)| *i != 0 && *i != join_key)
        .map(move |(_, column)| format!("{}.{column}", table.name()))
}

fn kept_cells(row: &[String], join_key: usize) -> impl Iterator<Item = String> + '_ {
    row.iter()
        .enumerate()
        .filter(move |(i, _)| *i != 0 && *i != join_key)
        .map(|(_, cell)| cell.clone())
}
