//! Error types shared by the parser, the store and the persistence layer.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("{0}")]
    Syntax(String),

    #[error("no database selected")]
    NoDatabaseSelected,

    #[error("database {0} does not exist")]
    UnknownDatabase(String),

    #[error("table {0} does not exist")]
    UnknownTable(String),

    #[error("column {0} does not exist")]
    UnknownColumn(String),

    #[error("database {0} already exists")]
    DuplicateDatabase(String),

    #[error("table {0} already exists")]
    DuplicateTable(String),

    #[error("column {0} already exists")]
    DuplicateColumn(String),

    #[error("cannot use reserved word {0}")]
    ReservedWord(String),

    #[error("the id column cannot be modified")]
    PrimaryKeyNotWritable,

    #[error("too many values for table {0}")]
    TooManyValues(String),

    #[error("not enough values for table {0}")]
    TooFewValues(String),

    #[error("string literal {0} is not wrapped in single quotes")]
    MalformedString(String),

    #[error("cannot bind a join attribute to table {0}")]
    UnboundJoinAttribute(String),

    #[error("corrupted file {}: {reason}", path.display())]
    CorruptFile { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DbError {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        DbError::Syntax(message.into())
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DbError::CorruptFile {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_readable() {
        assert_eq!(
            DbError::UnknownTable("marks".into()).to_string(),
            "table marks does not exist"
        );
        assert_eq!(
            DbError::ReservedWord("like".into()).to_string(),
            "cannot use reserved word like"
        );
        let err = DbError::corrupt("db/marks_config.tab", "expected pk=<integer>");
        assert_eq!(
            err.to_string(),
            "corrupted file db/marks_config.tab: expected pk=<integer>"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: DbError = io.into();
        assert!(matches!(err, DbError::Io(_)));
    }
}
