use bitvec::prelude::*;

use crate::data_type::ValueType;
use crate::error::Result;
use crate::keyword::Keyword;
use crate::table::Table;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
    Like,
}

impl Comparator {
    pub fn parse(token: &str) -> Option<Comparator> {
        match token {
            "==" => Some(Comparator::Equal),
            "!=" => Some(Comparator::NotEqual),
            ">" => Some(Comparator::Greater),
            "<" => Some(Comparator::Less),
            ">=" => Some(Comparator::GreaterOrEqual),
            "<=" => Some(Comparator::LessOrEqual),
            _ if Keyword::Like.matches(token) => Some(Comparator::Like),
            _ => None,
        }
    }

    fn is_ordering(self) -> bool {
        matches!(
            self,
            Comparator::Greater
                | Comparator::Less
                | Comparator::GreaterOrEqual
                | Comparator::LessOrEqual
        )
    }

    /// Compares a stored cell against a literal.
    ///
    /// A comparison between kinds that are not comparable never matches, and
    /// neither does an ordering against a non-numeric literal or `LIKE`
    /// against a non-string literal.
    pub fn apply(self, cell: &str, literal: &Value) -> bool {
        let kind = literal.kind();
        if !ValueType::of(cell).is_comparable_with(kind) {
            return false;
        }
        if self.is_ordering() && !kind.is_numeric() {
            return false;
        }

        let target = literal.text();
        match self {
            Comparator::Equal => loose_equal(cell, target, kind),
            Comparator::NotEqual => !loose_equal(cell, target, kind),
            Comparator::Like => kind == ValueType::String && cell.contains(target),
            _ => {
                let (Ok(left), Ok(right)) = (cell.parse::<f64>(), target.parse::<f64>()) else {
                    return false;
                };
                match self {
                    Comparator::Greater => left > right,
                    Comparator::Less => left < right,
                    Comparator::GreaterOrEqual => left >= right,
                    _ => left <= right,
                }
            }
        }
    }
}

/// `NULL` and booleans compare case-insensitively, everything else byte for byte.
fn loose_equal(cell: &str, target: &str, kind: ValueType) -> bool {
    match kind {
        ValueType::Null | ValueType::Boolean => cell.eq_ignore_ascii_case(target),
        _ => cell == target,
    }
}

/// How two conditions are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    pub fn join(self, left: Condition, right: Condition) -> Condition {
        match self {
            Connective::And => Condition::And(Box::new(left), Box::new(right)),
            Connective::Or => Condition::Or(Box::new(left), Box::new(right)),
        }
    }

    fn apply(self, left: bool, right: bool) -> bool {
        match self {
            Connective::And => left && right,
            Connective::Or => left || right,
        }
    }
}

/// A parsed `WHERE` clause.
///
/// Operators carry no precedence: `a AND b OR c` nests to the right as
/// `And(a, Or(b, c))`, and parentheses group explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Leaf {
        attribute: String,
        comparator: Comparator,
        value: Value,
    },
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

enum Step<'a> {
    Visit(&'a Condition),
    Combine(Connective),
}

impl Condition {
    /// Evaluates the condition against one row of `table`.
    ///
    /// Both sides of `AND`/`OR` are always evaluated, so an unknown column on
    /// either side is reported even when the other side already decides.
    /// The tree is walked with an explicit stack, so long chains of terms do
    /// not grow the call stack.
    ///
    /// # Errors
    /// Returns [crate::DbError::UnknownColumn] if a leaf names a column the table lacks.
    pub fn evaluate(&self, table: &Table, row: &[String]) -> Result<bool> {
        let mut pending = vec![Step::Visit(self)];
        let mut results: Vec<bool> = Vec::new();

        while let Some(step) = pending.pop() {
            match step {
                Step::Visit(Condition::Leaf {
                    attribute,
                    comparator,
                    value,
                }) => {
                    let index = table.require_column(attribute)?;
                    results.push(comparator.apply(&row[index], value));
                }
                Step::Visit(Condition::And(left, right)) => {
                    pending.extend([
                        Step::Combine(Connective::And),
                        Step::Visit(right),
                        Step::Visit(left),
                    ]);
                }
                Step::Visit(Condition::Or(left, right)) => {
                    pending.extend([
                        Step::Combine(Connective::Or),
                        Step::Visit(right),
                        Step::Visit(left),
                    ]);
                }
                Step::Combine(connective) => {
                    // both operands were pushed by the matching Visit
                    let right = results.pop().unwrap_or(false);
                    let left = results.pop().unwrap_or(false);
                    results.push(connective.apply(left, right));
                }
            }
        }
        Ok(results.pop().unwrap_or(false))
    }

    /// Evaluates every row of `table`; bit `i` is set when row `i` matches.
    pub fn matching_rows(&self, table: &Table) -> Result<BitVec> {
        let mut mask = BitVec::with_capacity(table.rows().len());
        for row in table.rows() {
            mask.push(self.evaluate(table, row)?);
        }
        Ok(mask)
    }
}
