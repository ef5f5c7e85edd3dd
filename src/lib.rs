//! An embedded, file-backed relational engine driven by a small SQL-like
//! command language.
//!
//! Commands go through a [Session]: the text is tokenized, parsed into a
//! typed [ast::Statement], executed against the selected [Database] and the
//! affected table files are rewritten under the storage root.

pub mod ast;
pub mod condition;
pub mod config;
pub mod data_type;
pub mod database;
pub mod error;
pub mod executor;
pub mod keyword;
pub mod parser;
pub mod storage;
pub mod table;
pub mod tokenizer;
pub mod value;

pub use config::Config;
pub use data_type::ValueType;
pub use database::{Database, QueryResult};
pub use error::{DbError, Result};
pub use executor::{Response, Session};
pub use table::Table;
pub use value::Value;
