/// Reserved words of the command language, other than the command names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Database,
    Table,
    Into,
    Values,
    From,
    Where,
    And,
    Or,
    Set,
    On,
    True,
    False,
    Null,
    Like,
    Add,
    Drop,
}

impl Keyword {
    /// Matches a token against the vocabulary, case-insensitively.
    pub fn parse(token: &str) -> Option<Keyword> {
        match token.to_uppercase().as_str() {
            "DATABASE" => Some(Keyword::Database),
            "TABLE" => Some(Keyword::Table),
            "INTO" => Some(Keyword::Into),
            "VALUES" => Some(Keyword::Values),
            "FROM" => Some(Keyword::From),
            "WHERE" => Some(Keyword::Where),
            "AND" => Some(Keyword::And),
            "OR" => Some(Keyword::Or),
            "SET" => Some(Keyword::Set),
            "ON" => Some(Keyword::On),
            "TRUE" => Some(Keyword::True),
            "FALSE" => Some(Keyword::False),
            "NULL" => Some(Keyword::Null),
            "LIKE" => Some(Keyword::Like),
            "ADD" => Some(Keyword::Add),
            "DROP" => Some(Keyword::Drop),
            _ => None,
        }
    }

    /// Returns `true` if `token` spells this keyword in any letter case.
    pub fn matches(self, token: &str) -> bool {
        Keyword::parse(token) == Some(self)
    }
}

/// The nine command names a statement can start with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Use,
    Create,
    Drop,
    Alter,
    Insert,
    Select,
    Update,
    Delete,
    Join,
}

impl CommandKind {
    pub fn parse(token: &str) -> Option<CommandKind> {
        match token.to_uppercase().as_str() {
            "USE" => Some(CommandKind::Use),
            "CREATE" => Some(CommandKind::Create),
            "DROP" => Some(CommandKind::Drop),
            "ALTER" => Some(CommandKind::Alter),
            "INSERT" => Some(CommandKind::Insert),
            "SELECT" => Some(CommandKind::Select),
            "UPDATE" => Some(CommandKind::Update),
            "DELETE" => Some(CommandKind::Delete),
            "JOIN" => Some(CommandKind::Join),
            _ => None,
        }
    }
}

/// Returns `true` if `name` cannot be used as a database, table or column name.
pub fn is_reserved(name: &str) -> bool {
    Keyword::parse(name).is_some() || CommandKind::parse(name).is_some()
}
