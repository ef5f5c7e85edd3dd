use crate::data_type::ValueType;
use crate::error::{DbError, Result};

/// A literal value written in a command (`'Steve'`, `65`, `-1.5`, `TRUE`, `NULL`).
///
/// The literal keeps its exact spelling so that a stored value re-displays
/// verbatim (a leading `+` survives, `true` stays lower-case).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    raw: String,
    kind: ValueType,
}

impl Value {
    /// Builds a literal from its token.
    ///
    /// # Errors
    /// Returns [DbError::MalformedString] when the token is neither a number,
    /// a boolean, `NULL`, nor a quote-wrapped string.
    pub fn from_token(token: &str) -> Result<Value> {
        let kind = ValueType::of(token);
        if kind == ValueType::String {
            unquote(token)?;
        }
        Ok(Value {
            raw: token.to_string(),
            kind,
        })
    }

    /// The inferred kind of the literal as written (quoted strings are [ValueType::String]).
    pub fn kind(&self) -> ValueType {
        self.kind
    }

    /// The literal exactly as it appeared in the command.
    pub fn token(&self) -> &str {
        &self.raw
    }

    /// The text compared against and stored in cells: string literals lose
    /// their quotes, every other literal is kept as spelled.
    pub fn text(&self) -> &str {
        match self.kind {
            ValueType::String => &self.raw[1..self.raw.len() - 1],
            _ => &self.raw,
        }
    }

    /// Consumes the literal, returning the text to store in a cell.
    pub fn into_cell(self) -> String {
        match self.kind {
            ValueType::String => self.text().to_string(),
            _ => self.raw,
        }
    }
}

/// Removes the surrounding single quotes of a string literal.
pub fn unquote(text: &str) -> Result<&str> {
    if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
        Ok(&text[1..text.len() - 1])
    } else {
        Err(DbError::MalformedString(text.to_string()))
    }
}
