use crate::condition::Condition;
use crate::keyword::CommandKind;
use crate::value::Value;

/// One validated command. Table and database names are already lower-cased;
/// column names keep the spelling used in the command.
#[derive(Debug, PartialEq)]
pub enum Statement {
    Use(String),
    CreateDatabase(String),
    CreateTable(CreateTable),
    DropDatabase(String),
    DropTable(String),
    Alter(Alter),
    InsertInto(InsertInto),
    Select(Select),
    Update(Update),
    Delete(Delete),
    Join(Join),
}

impl Statement {
    /// The command word the statement was written with.
    pub fn kind(&self) -> CommandKind {
        match self {
            Statement::Use(_) => CommandKind::Use,
            Statement::CreateDatabase(_) | Statement::CreateTable(_) => CommandKind::Create,
            Statement::DropDatabase(_) | Statement::DropTable(_) => CommandKind::Drop,
            Statement::Alter(_) => CommandKind::Alter,
            Statement::InsertInto(_) => CommandKind::Insert,
            Statement::Select(_) => CommandKind::Select,
            Statement::Update(_) => CommandKind::Update,
            Statement::Delete(_) => CommandKind::Delete,
            Statement::Join(_) => CommandKind::Join,
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlterAction {
    Add,
    Drop,
}

#[derive(Debug, PartialEq)]
pub struct Alter {
    pub table: String,
    pub action: AlterAction,
    pub column: String,
}

#[derive(Debug, PartialEq)]
pub struct InsertInto {
    pub table: String,
    pub values: Vec<Value>,
}

#[derive(Debug, PartialEq)]
pub enum ColumnsSelect {
    Star,
    ColumnsNames(Vec<String>),
}

#[derive(Debug, PartialEq)]
pub struct Select {
    pub columns: ColumnsSelect,
    pub table: String,
    pub where_clause: Option<Condition>,
}

#[derive(Debug, PartialEq)]
pub struct Update {
    pub table: String,
    pub assignments: Vec<(String, Value)>,
    pub where_clause: Condition,
}

#[derive(Debug, PartialEq)]
pub struct Delete {
    pub table: String,
    pub where_clause: Condition,
}

/// An attribute reference, either `column` or `table.column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub table: Option<String>,
    pub column: String,
}

#[derive(Debug, PartialEq)]
pub struct Join {
    pub tables: [String; 2],
    pub attributes: [Attribute; 2],
}
