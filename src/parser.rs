use crate::ast::*;
use crate::condition::{Comparator, Condition, Connective};
use crate::data_type::{is_float, is_integer};
use crate::error::{DbError, Result};
use crate::keyword::{CommandKind, Keyword};
use crate::tokenizer::{Token, Tokenizer};
use crate::value::Value;

/// Characters allowed inside a string literal besides letters, digits and space.
const SYMBOLS: &str = "!#$%&()*+,-./:;>=<?@[\\]^_`{}~";

/// Deepest parenthesis nesting accepted in a `WHERE` clause.
pub const MAX_CONDITION_DEPTH: usize = 64;

/// Most comparisons accepted in one `WHERE` clause.
pub const MAX_CONDITION_TERMS: usize = 4096;

/// Tokenizes and parses one command.
pub fn parse(command: &str) -> Result<Statement> {
    Parser::new(Tokenizer::new(command).tokenize()).parse()
}

/// Recursive-descent parser over a token sequence.
///
/// Validation and extraction happen in the same walk: a command either fails
/// with [DbError::Syntax] or comes out as a typed [Statement]. Nothing here
/// looks at table data, so reserved names and unknown tables are the
/// executor's concern.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    condition_terms: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
            condition_terms: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Statement> {
        let command = self.next("a command")?;
        let kind = CommandKind::parse(&command)
            .ok_or_else(|| DbError::syntax(format!("unknown command {command}")))?;

        let statement = match kind {
            CommandKind::Use => Statement::Use(self.consume_name("database name")?),
            CommandKind::Create => self.parse_create()?,
            CommandKind::Drop => self.parse_drop()?,
            CommandKind::Alter => self.parse_alter()?,
            CommandKind::Insert => self.parse_insert()?,
            CommandKind::Select => self.parse_select()?,
            CommandKind::Update => self.parse_update()?,
            CommandKind::Delete => self.parse_delete()?,
            CommandKind::Join => self.parse_join()?,
        };

        self.consume_terminator()?;
        Ok(statement)
    }

    fn current_token(&self) -> Option<&str> {
        self.tokens.get(self.position).map(Token::as_str)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    /// Returns the current token and moves past it.
    fn next(&mut self, expected: &str) -> Result<String> {
        let token = self
            .current_token()
            .ok_or_else(|| DbError::syntax(format!("expected {expected}, found end of command")))?
            .to_string();
        self.advance();
        Ok(token)
    }

    fn is_at_keyword(&self, keyword: Keyword) -> bool {
        self.current_token().is_some_and(|t| keyword.matches(t))
    }

    fn is_at_symbol(&self, symbol: &str) -> bool {
        self.current_token() == Some(symbol)
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> Result<()> {
        let expected = format!("{keyword:?}").to_uppercase();
        let token = self.next(&expected)?;
        if keyword.matches(&token) {
            Ok(())
        } else {
            Err(DbError::syntax(format!("expected {expected}, found {token}")))
        }
    }

    fn consume_symbol(&mut self, symbol: &str) -> Result<()> {
        let token = self.next(&format!("'{symbol}'"))?;
        if token == symbol {
            Ok(())
        } else {
            Err(DbError::syntax(format!("expected '{symbol}', found {token}")))
        }
    }

    /// The statement must end with `;` and nothing may follow it.
    fn consume_terminator(&mut self) -> Result<()> {
        match self.current_token() {
            Some(";") => self.advance(),
            Some(token) => {
                return Err(DbError::syntax(format!("expected ';', found {token}")));
            }
            None => return Err(DbError::syntax("missing ';' at the end of the command")),
        }
        match self.current_token() {
            Some(token) => Err(DbError::syntax(format!("unexpected {token} after ';'"))),
            None => Ok(()),
        }
    }

    /// A database or table name, lower-cased.
    fn consume_name(&mut self, what: &str) -> Result<String> {
        let token = self.next(what)?;
        if !is_plain_text(&token) {
            return Err(DbError::syntax(format!("invalid {what}: {token}")));
        }
        Ok(token.to_lowercase())
    }

    /// `column` or `table.column`; both parts letters and digits only.
    fn consume_attribute(&mut self) -> Result<Attribute> {
        let token = self.next("an attribute name")?;
        let valid = match token.split_once('.') {
            Some((table, column)) => is_plain_text(table) && is_plain_text(column),
            None => is_plain_text(&token),
        };
        if !valid {
            return Err(DbError::syntax(format!("invalid attribute name: {token}")));
        }
        let attribute = match token.split_once('.') {
            Some((table, column)) => Attribute {
                table: Some(table.to_lowercase()),
                column: column.to_string(),
            },
            None => Attribute {
                table: None,
                column: token,
            },
        };
        Ok(attribute)
    }

    fn consume_attribute_list(&mut self) -> Result<Vec<String>> {
        let mut columns = vec![self.consume_attribute()?.column];
        while self.is_at_symbol(",") {
            self.advance();
            columns.push(self.consume_attribute()?.column);
        }
        Ok(columns)
    }

    fn consume_value(&mut self) -> Result<Value> {
        let token = self.next("a value")?;
        if !is_value(&token) {
            return Err(DbError::syntax(format!("invalid value: {token}")));
        }
        Value::from_token(&token)
    }

    fn consume_value_list(&mut self) -> Result<Vec<Value>> {
        let mut values = vec![self.consume_value()?];
        while self.is_at_symbol(",") {
            self.advance();
            values.push(self.consume_value()?);
        }
        Ok(values)
    }

    fn current_connective(&self) -> Option<Connective> {
        if self.is_at_keyword(Keyword::And) {
            Some(Connective::And)
        } else if self.is_at_keyword(Keyword::Or) {
            Some(Connective::Or)
        } else {
            None
        }
    }

    /// `operand (AND|OR operand)*`, folded from the right so that
    /// `a AND b OR c` becomes `And(a, Or(b, c))`.
    fn parse_condition(&mut self, depth: usize) -> Result<Condition> {
        let mut operands = vec![self.parse_operand(depth)?];
        let mut connectives = Vec::new();
        while let Some(connective) = self.current_connective() {
            self.advance();
            connectives.push(connective);
            operands.push(self.parse_operand(depth)?);
        }

        let mut folded = operands
            .pop()
            .ok_or_else(|| DbError::syntax("empty condition"))?;
        while let (Some(left), Some(connective)) = (operands.pop(), connectives.pop()) {
            folded = connective.join(left, folded);
        }
        Ok(folded)
    }

    /// `( condition ) | attribute comparator value`
    fn parse_operand(&mut self, depth: usize) -> Result<Condition> {
        if self.is_at_symbol("(") {
            if depth >= MAX_CONDITION_DEPTH {
                return Err(DbError::syntax(format!(
                    "conditions nested deeper than {MAX_CONDITION_DEPTH} levels"
                )));
            }
            self.advance();
            let inner = self.parse_condition(depth + 1)?;
            self.consume_symbol(")")?;
            return Ok(inner);
        }

        self.condition_terms += 1;
        if self.condition_terms > MAX_CONDITION_TERMS {
            return Err(DbError::syntax(format!(
                "more than {MAX_CONDITION_TERMS} comparisons in one condition"
            )));
        }
        let attribute = self.consume_attribute()?;
        let token = self.next("a comparator")?;
        let comparator = Comparator::parse(&token)
            .ok_or_else(|| DbError::syntax(format!("invalid comparator: {token}")))?;
        let value = self.consume_value()?;
        Ok(Condition::Leaf {
            attribute: attribute.column,
            comparator,
            value,
        })
    }

    fn parse_create(&mut self) -> Result<Statement> {
        if self.is_at_keyword(Keyword::Database) {
            self.advance();
            return Ok(Statement::CreateDatabase(
                self.consume_name("database name")?,
            ));
        }
        if !self.is_at_keyword(Keyword::Table) {
            return Err(DbError::syntax("CREATE must be followed by TABLE or DATABASE"));
        }
        self.advance();
        let name = self.consume_name("table name")?;

        let mut columns = vec![];
        if self.is_at_symbol("(") {
            self.advance();
            columns = self.consume_attribute_list()?;
            self.consume_symbol(")")?;
        }
        Ok(Statement::CreateTable(CreateTable { name, columns }))
    }

    fn parse_drop(&mut self) -> Result<Statement> {
        if self.is_at_keyword(Keyword::Database) {
            self.advance();
            return Ok(Statement::DropDatabase(self.consume_name("database name")?));
        }
        if self.is_at_keyword(Keyword::Table) {
            self.advance();
            return Ok(Statement::DropTable(self.consume_name("table name")?));
        }
        Err(DbError::syntax("DROP must be followed by TABLE or DATABASE"))
    }

    fn parse_alter(&mut self) -> Result<Statement> {
        self.consume_keyword(Keyword::Table)?;
        let table = self.consume_name("table name")?;
        let token = self.next("ADD or DROP")?;
        let action = match Keyword::parse(&token) {
            Some(Keyword::Add) => AlterAction::Add,
            Some(Keyword::Drop) => AlterAction::Drop,
            _ => return Err(DbError::syntax(format!("invalid alteration type: {token}"))),
        };
        let column = self.consume_attribute()?.column;
        Ok(Statement::Alter(Alter {
            table,
            action,
            column,
        }))
    }

    fn parse_insert(&mut self) -> Result<Statement> {
        self.consume_keyword(Keyword::Into)?;
        let table = self.consume_name("table name")?;
        self.consume_keyword(Keyword::Values)?;
        self.consume_symbol("(")?;
        let values = self.consume_value_list()?;
        self.consume_symbol(")")?;
        Ok(Statement::InsertInto(InsertInto { table, values }))
    }

    fn parse_select(&mut self) -> Result<Statement> {
        let columns = if self.is_at_symbol("*") {
            self.advance();
            ColumnsSelect::Star
        } else {
            ColumnsSelect::ColumnsNames(self.consume_attribute_list()?)
        };
        self.consume_keyword(Keyword::From)?;
        let table = self.consume_name("table name")?;

        let mut where_clause = None;
        if self.is_at_keyword(Keyword::Where) {
            self.advance();
            where_clause = Some(self.parse_condition(0)?);
        }
        Ok(Statement::Select(Select {
            columns,
            table,
            where_clause,
        }))
    }

    fn parse_update(&mut self) -> Result<Statement> {
        let table = self.consume_name("table name")?;
        self.consume_keyword(Keyword::Set)?;

        let mut assignments = vec![];
        loop {
            let column = self.consume_attribute()?.column;
            self.consume_symbol("=")?;
            let value = self.consume_value()?;
            assignments.push((column, value));
            if !self.is_at_symbol(",") {
                break;
            }
            self.advance();
        }

        self.consume_keyword(Keyword::Where)?;
        let where_clause = self.parse_condition(0)?;
        Ok(Statement::Update(Update {
            table,
            assignments,
            where_clause,
        }))
    }

    fn parse_delete(&mut self) -> Result<Statement> {
        self.consume_keyword(Keyword::From)?;
        let table = self.consume_name("table name")?;
        self.consume_keyword(Keyword::Where)?;
        let where_clause = self.parse_condition(0)?;
        Ok(Statement::Delete(Delete {
            table,
            where_clause,
        }))
    }

    fn parse_join(&mut self) -> Result<Statement> {
        let first = self.consume_name("table name")?;
        self.consume_keyword(Keyword::And)?;
        let second = self.consume_name("table name")?;
        self.consume_keyword(Keyword::On)?;
        let first_attribute = self.consume_attribute()?;
        self.consume_keyword(Keyword::And)?;
        let second_attribute = self.consume_attribute()?;
        Ok(Statement::Join(Join {
            tables: [first, second],
            attributes: [first_attribute, second_attribute],
        }))
    }
}

/// Letters and digits only, at least one character.
fn is_plain_text(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_alphanumeric())
}

fn is_value(token: &str) -> bool {
    Keyword::Null.matches(token)
        || Keyword::True.matches(token)
        || Keyword::False.matches(token)
        || is_integer(token)
        || is_float(token)
        || is_string_literal(token)
}

fn is_string_literal(token: &str) -> bool {
    if !(token.len() >= 2 && token.starts_with('\'') && token.ends_with('\'')) {
        return false;
    }
    token[1..token.len() - 1]
        .chars()
        .all(|c| c == ' ' || c.is_ascii_alphanumeric() || SYMBOLS.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(attribute: &str, comparator: Comparator, token: &str) -> Condition {
        Condition::Leaf {
            attribute: attribute.into(),
            comparator,
            value: Value::from_token(token).unwrap(),
        }
    }

    fn syntax_error(command: &str) -> bool {
        matches!(parse(command), Err(DbError::Syntax(_)))
    }

    #[test]
    fn test_parse_use_and_databases() {
        assert_eq!(parse("USE School;").unwrap(), Statement::Use("school".into()));
        assert_eq!(
            parse("create database Uni;").unwrap(),
            Statement::CreateDatabase("uni".into())
        );
        assert_eq!(
            parse("DROP DATABASE uni;").unwrap(),
            Statement::DropDatabase("uni".into())
        );
        assert_eq!(
            parse("drop table Marks;").unwrap(),
            Statement::DropTable("marks".into())
        );
    }

    #[test]
    fn test_parse_create_table() {
        let statement = parse("CREATE TABLE Marks (name, marks.Mark, pass);").unwrap();
        assert_eq!(
            statement,
            Statement::CreateTable(CreateTable {
                name: "marks".into(),
                columns: vec!["name".into(), "Mark".into(), "pass".into()],
            })
        );

        let bare = parse("CREATE TABLE empty;").unwrap();
        assert_eq!(
            bare,
            Statement::CreateTable(CreateTable {
                name: "empty".into(),
                columns: vec![],
            })
        );
    }

    #[test]
    fn test_parse_alter() {
        assert_eq!(
            parse("ALTER TABLE marks ADD isAbsent;").unwrap(),
            Statement::Alter(Alter {
                table: "marks".into(),
                action: AlterAction::Add,
                column: "isAbsent".into(),
            })
        );
        assert!(syntax_error("ALTER TABLE marks RENAME x;"));
        assert!(syntax_error("ALTER marks ADD x;"));
    }

    #[test]
    fn test_parse_insert() {
        let statement = parse("INSERT INTO marks VALUES ('Steve', 65, TRUE, -1.5, NULL);").unwrap();
        let Statement::InsertInto(insert) = statement else {
            panic!("Expected InsertInto");
        };
        assert_eq!(insert.table, "marks");
        let tokens: Vec<&str> = insert.values.iter().map(Value::token).collect();
        assert_eq!(tokens, vec!["'Steve'", "65", "TRUE", "-1.5", "NULL"]);
    }

    #[test]
    fn test_parse_select() {
        assert_eq!(
            parse("SELECT * FROM marks;").unwrap(),
            Statement::Select(Select {
                columns: ColumnsSelect::Star,
                table: "marks".into(),
                where_clause: None,
            })
        );
        assert_eq!(
            parse("select name, marks.mark from marks where mark>=40;").unwrap(),
            Statement::Select(Select {
                columns: ColumnsSelect::ColumnsNames(vec!["name".into(), "mark".into()]),
                table: "marks".into(),
                where_clause: Some(leaf("mark", Comparator::GreaterOrEqual, "40")),
            })
        );
    }

    #[test]
    fn test_condition_nests_to_the_right() {
        let Statement::Delete(delete) =
            parse("DELETE FROM marks WHERE pass == FALSE AND mark < 30 OR name LIKE 'Cl';")
                .unwrap()
        else {
            panic!("Expected Delete");
        };
        assert_eq!(
            delete.where_clause,
            Condition::And(
                Box::new(leaf("pass", Comparator::Equal, "FALSE")),
                Box::new(Condition::Or(
                    Box::new(leaf("mark", Comparator::Less, "30")),
                    Box::new(leaf("name", Comparator::Like, "'Cl'")),
                )),
            )
        );
    }

    #[test]
    fn test_condition_with_parentheses() {
        let Statement::Select(select) =
            parse("SELECT * FROM marks WHERE ((pass == TRUE) AND (mark > 60)) OR name == 'Bob';")
                .unwrap()
        else {
            panic!("Expected Select");
        };
        assert_eq!(
            select.where_clause,
            Some(Condition::Or(
                Box::new(Condition::And(
                    Box::new(leaf("pass", Comparator::Equal, "TRUE")),
                    Box::new(leaf("mark", Comparator::Greater, "60")),
                )),
                Box::new(leaf("name", Comparator::Equal, "'Bob'")),
            ))
        );
    }

    #[test]
    fn test_long_condition_chain() {
        let terms = vec!["mark == 1"; 1000].join(" AND ");
        let Statement::Delete(delete) = parse(&format!("DELETE FROM marks WHERE {terms};")).unwrap()
        else {
            panic!("Expected Delete");
        };
        let mut depth = 0;
        let mut node = &delete.where_clause;
        while let Condition::And(left, right) = node {
            assert!(matches!(**left, Condition::Leaf { .. }));
            depth += 1;
            node = &**right;
        }
        assert_eq!(depth, 999);
    }

    #[test]
    fn test_condition_limits() {
        let terms = vec!["mark == 1"; MAX_CONDITION_TERMS + 1].join(" OR ");
        assert!(syntax_error(&format!("SELECT * FROM marks WHERE {terms};")));

        let nested = |levels: usize| {
            format!(
                "SELECT * FROM marks WHERE {}mark == 1{};",
                "(".repeat(levels),
                ")".repeat(levels)
            )
        };
        assert!(parse(&nested(MAX_CONDITION_DEPTH)).is_ok());
        assert!(syntax_error(&nested(MAX_CONDITION_DEPTH + 1)));
        assert!(syntax_error(&nested(100_000)));
    }

    #[test]
    fn test_parse_update() {
        let Statement::Update(update) =
            parse("UPDATE marks SET mark = 38, pass = FALSE WHERE name == 'Clive';").unwrap()
        else {
            panic!("Expected Update");
        };
        assert_eq!(update.table, "marks");
        assert_eq!(update.assignments.len(), 2);
        assert_eq!(update.assignments[0].0, "mark");
        assert_eq!(update.assignments[1].1.token(), "FALSE");
        assert!(syntax_error("UPDATE marks SET mark == 38 WHERE id == 1;"));
        assert!(syntax_error("UPDATE marks SET mark = 38;"));
    }

    #[test]
    fn test_parse_join() {
        assert_eq!(
            parse("JOIN coursework AND marks ON submission AND marks.id;").unwrap(),
            Statement::Join(Join {
                tables: ["coursework".into(), "marks".into()],
                attributes: [
                    Attribute {
                        table: None,
                        column: "submission".into(),
                    },
                    Attribute {
                        table: Some("marks".into()),
                        column: "id".into(),
                    },
                ],
            })
        );
        assert!(syntax_error("JOIN coursework marks ON submission AND id;"));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(syntax_error(""));
        assert!(syntax_error("SELECT * FROM marks"));
        assert!(syntax_error("SELECT * FROM marks; SELECT"));
        assert!(syntax_error("FETCH * FROM marks;"));
        assert!(syntax_error("SELECT * marks;"));
        assert!(syntax_error("CREATE TABLE my_table;"));
        assert!(syntax_error("CREATE TABLE marks (name,);"));
        assert!(syntax_error("CREATE INDEX marks;"));
        assert!(syntax_error("INSERT INTO marks VALUES (Steve);"));
        assert!(syntax_error("INSERT INTO marks VALUES ('Steve', 65;"));
        assert!(syntax_error("INSERT INTO marks VALUES ('tab\there');"));
        assert!(syntax_error("SELECT * FROM marks WHERE name = 'Steve';"));
        assert!(syntax_error("SELECT * FROM marks WHERE (mark > 5;"));
        assert!(syntax_error("SELECT * FROM marks WHERE mark > ;"));
        assert!(syntax_error("DELETE FROM marks;"));
    }

    #[test]
    fn test_value_grammar() {
        assert!(is_value("'Hello, world! (#1)'"));
        assert!(is_value("''"));
        assert!(is_value("+12"));
        assert!(is_value("-0.5"));
        assert!(is_value("false"));
        assert!(is_value("null"));
        assert!(!is_value("1."));
        assert!(!is_value("+"));
        assert!(!is_value("'it\"s'"));
        assert!(!is_value("Steve"));
    }
}
