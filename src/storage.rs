//! On-disk layout of the databases under the storage root.
//!
//! Each database is a directory. Each table in it is a `<table>.tab` file
//! (tab-separated header then rows, one per line) plus a `<table>_config.tab`
//! file holding `pk=<last primary key>`. Writes rewrite the whole file.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::table::Table;

const TABLE_EXTENSION: &str = ".tab";
const CONFIG_SUFFIX: &str = "_config.tab";
const CONFIG_PREFIX: &str = "pk=";

/// File access rooted at the storage directory.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Opens the storage root, creating it if it does not exist yet.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "storage root ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn database_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Creates an empty database directory.
    ///
    /// # Errors
    /// Returns [DbError::DuplicateDatabase] if the directory already exists.
    pub fn create_database(&self, name: &str) -> Result<()> {
        match fs::create_dir(self.database_dir(name)) {
            Ok(()) => {
                info!(database = name, "database created");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(DbError::DuplicateDatabase(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes every file of a database, then its directory.
    pub fn drop_database(&self, name: &str) -> Result<()> {
        let dir = self.database_dir(name);
        if !dir.is_dir() {
            return Err(DbError::UnknownDatabase(name.to_string()));
        }
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
        fs::remove_dir(&dir)?;
        info!(database = name, "database dropped");
        Ok(())
    }

    /// Rebuilds a [Database] from its directory.
    ///
    /// Tables whose config file is missing get their primary key counter from
    /// the number of rows, and the config file is written back.
    ///
    /// # Errors
    /// Returns [DbError::UnknownDatabase] if the directory does not exist and
    /// [DbError::CorruptFile] if a table or config file cannot be parsed.
    pub fn load_database(&self, name: &str) -> Result<Database> {
        let dir = self.database_dir(name);
        if !dir.is_dir() {
            return Err(DbError::UnknownDatabase(name.to_string()));
        }

        let mut database = Database::new(name);
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !path.is_file() || file_name.ends_with(CONFIG_SUFFIX) {
                continue;
            }
            let Some(table_name) = file_name.strip_suffix(TABLE_EXTENSION) else {
                continue;
            };
            let table = self.load_table(&dir, table_name)?;
            database.add_table(table)?;
        }

        info!(
            database = name,
            tables = database.list_tables().len(),
            "database loaded"
        );
        Ok(database)
    }

    fn load_table(&self, dir: &Path, name: &str) -> Result<Table> {
        let path = table_path(dir, name);
        let contents = fs::read_to_string(&path)?;
        let mut lines = contents.lines();

        let header = lines
            .next()
            .filter(|line| !line.is_empty())
            .ok_or_else(|| DbError::corrupt(&path, "missing header line"))?;

        let mut table = Table::new(name, 0);
        for column in header.split('\t') {
            table
                .add_column(column)
                .map_err(|e| DbError::corrupt(&path, e.to_string()))?;
        }
        for line in lines.filter(|line| !line.is_empty()) {
            let row = line.split('\t').map(str::to_string).collect();
            table
                .add_row_with_id(row)
                .map_err(|e| DbError::corrupt(&path, e.to_string()))?;
        }

        let config = config_path(dir, name);
        match read_config(&config)? {
            Some(last_primary_key) => table.set_last_primary_key(last_primary_key),
            None => {
                let healed = table.rows().len() as u64;
                warn!(
                    table = name,
                    last_primary_key = healed,
                    "config file missing, rebuilt from row count"
                );
                table.set_last_primary_key(healed);
                write_config(dir, &table)?;
            }
        }
        debug!(table = name, rows = table.rows().len(), "table loaded");
        Ok(table)
    }

    /// Creates the files of a new table.
    ///
    /// # Errors
    /// Returns [DbError::DuplicateTable] if the table file already exists.
    pub fn create_table(&self, database: &str, table: &Table) -> Result<()> {
        let dir = self.database_dir(database);
        let path = table_path(&dir, table.name());
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(DbError::DuplicateTable(table.name().to_string()));
            }
            Err(e) => return Err(e.into()),
        }
        self.save_table(database, table)?;
        info!(database, table = table.name(), "table created");
        Ok(())
    }

    /// Rewrites both files of a table from its in-memory state.
    pub fn save_table(&self, database: &str, table: &Table) -> Result<()> {
        let dir = self.database_dir(database);
        fs::write(table_path(&dir, table.name()), render_table(table))?;
        write_config(&dir, table)?;
        debug!(
            database,
            table = table.name(),
            rows = table.rows().len(),
            "table saved"
        );
        Ok(())
    }

    /// Removes both files of a table. A missing config file is ignored.
    pub fn delete_table(&self, database: &str, name: &str) -> Result<()> {
        let dir = self.database_dir(database);
        fs::remove_file(table_path(&dir, name))?;
        match fs::remove_file(config_path(&dir, name)) {
            Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }
        info!(database, table = name, "table dropped");
        Ok(())
    }
}

fn table_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}{TABLE_EXTENSION}"))
}

fn config_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}{CONFIG_SUFFIX}"))
}

/// Header and rows, tab-separated, joined by newlines without a trailing one.
fn render_table(table: &Table) -> String {
    std::iter::once(table.columns())
        .chain(table.rows().iter().map(Vec::as_slice))
        .map(|cells| cells.join("\t"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_config(dir: &Path, table: &Table) -> Result<()> {
    let line = format!("{CONFIG_PREFIX}{}", table.last_primary_key());
    fs::write(config_path(dir, table.name()), line)?;
    Ok(())
}

/// `Ok(None)` when the config file does not exist.
fn read_config(path: &Path) -> Result<Option<u64>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    contents
        .trim()
        .strip_prefix(CONFIG_PREFIX)
        .and_then(|n| n.parse::<u64>().ok())
        .map(Some)
        .ok_or_else(|| DbError::corrupt(path, "expected pk=<integer>"))
}
