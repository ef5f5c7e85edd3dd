use crate::keyword::Keyword;

/// The kind of a literal or stored cell, inferred from its text.
///
/// Cells are stored as text; the kind is computed on demand whenever two
/// values have to be compared and is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Anything that is not one of the other kinds (quoted literals included).
    String,
    /// `TRUE` or `FALSE`, in any letter case.
    Boolean,
    /// An optionally signed decimal with a fractional part, e.g. `-1.5`.
    Float,
    /// An optionally signed run of digits, e.g. `+42`.
    Integer,
    /// `NULL`, in any letter case.
    Null,
}

impl ValueType {
    /// Classifies `text`. Booleans and `NULL` are checked before numbers.
    pub fn of(text: &str) -> ValueType {
        if Keyword::True.matches(text) || Keyword::False.matches(text) {
            return ValueType::Boolean;
        }
        if Keyword::Null.matches(text) {
            return ValueType::Null;
        }
        if is_integer(text) {
            return ValueType::Integer;
        }
        if is_float(text) {
            return ValueType::Float;
        }
        ValueType::String
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Float)
    }

    /// Two kinds are comparable when they are equal or both numeric.
    pub fn is_comparable_with(self, other: ValueType) -> bool {
        self == other || (self.is_numeric() && other.is_numeric())
    }
}

fn strip_sign(text: &str) -> &str {
    text.strip_prefix(['+', '-']).unwrap_or(text)
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// `[-+]?\d+`
pub(crate) fn is_integer(text: &str) -> bool {
    is_digits(strip_sign(text))
}

/// `[-+]?\d+\.\d+`
pub(crate) fn is_float(text: &str) -> bool {
    match strip_sign(text).split_once('.') {
        Some((whole, fraction)) => is_digits(whole) && is_digits(fraction),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(ValueType::of("TRUE"), ValueType::Boolean);
        assert_eq!(ValueType::of("false"), ValueType::Boolean);
        assert_eq!(ValueType::of("Null"), ValueType::Null);
        assert_eq!(ValueType::of("65"), ValueType::Integer);
        assert_eq!(ValueType::of("+65"), ValueType::Integer);
        assert_eq!(ValueType::of("-65"), ValueType::Integer);
        assert_eq!(ValueType::of("6.5"), ValueType::Float);
        assert_eq!(ValueType::of("-0.25"), ValueType::Float);
        assert_eq!(ValueType::of("Steve"), ValueType::String);
        assert_eq!(ValueType::of("'65'"), ValueType::String);
        assert_eq!(ValueType::of(""), ValueType::String);
    }

    #[test]
    fn test_malformed_numbers_are_strings() {
        assert_eq!(ValueType::of("+"), ValueType::String);
        assert_eq!(ValueType::of("1."), ValueType::String);
        assert_eq!(ValueType::of(".5"), ValueType::String);
        assert_eq!(ValueType::of("1.2.3"), ValueType::String);
        assert_eq!(ValueType::of("12a"), ValueType::String);
        assert_eq!(ValueType::of("+-1"), ValueType::String);
    }

    #[test]
    fn test_comparability() {
        assert!(ValueType::Integer.is_comparable_with(ValueType::Float));
        assert!(ValueType::Float.is_comparable_with(ValueType::Integer));
        assert!(ValueType::String.is_comparable_with(ValueType::String));
        assert!(ValueType::Null.is_comparable_with(ValueType::Null));
        assert!(!ValueType::Integer.is_comparable_with(ValueType::String));
        assert!(!ValueType::Boolean.is_comparable_with(ValueType::Null));
    }
}
