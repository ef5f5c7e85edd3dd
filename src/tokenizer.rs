use std::fmt;

/// A lexical unit, kept exactly as it was spelled in the command.
///
/// Tokens carry no classification of their own: keywords, identifiers and
/// literals are told apart by the parser from their spelling alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for a token produced from a `'...'` region.
    pub fn is_quoted(&self) -> bool {
        self.0.len() >= 2 && self.0.starts_with('\'') && self.0.ends_with('\'')
    }
}

impl PartialEq<&str> for Token {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Splits a raw command string into [Token]s.
///
/// Quoted regions (`'...'`) become a single token, quotes included, and are
/// never re-tokenized. Outside quotes, `( ) , ;` and the comparators
/// `== >= <= != > < =` always stand as tokens of their own, whatever the
/// surrounding spacing.
pub struct Tokenizer {
    input: String,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.trim().to_string(),
        }
    }

    /// Processes the entire input and returns the token sequence.
    ///
    /// An unterminated quote is not reported here: the trailing fragment is
    /// treated as a quoted literal and the parser decides what to do with it.
    ///
    /// # Example
    /// ```
    /// # use tabdb::tokenizer::Tokenizer;
    /// let tokens = Tokenizer::new("SELECT * FROM marks WHERE name=='Bob Dylan';").tokenize();
    /// let spelled: Vec<&str> = tokens.iter().map(|t| t.as_str()).collect();
    /// assert_eq!(
    ///     spelled,
    ///     vec!["SELECT", "*", "FROM", "marks", "WHERE", "name", "==", "'Bob Dylan'", ";"]
    /// );
    /// ```
    pub fn tokenize(&self) -> Vec<Token> {
        let mut tokens = Vec::new();

        for (i, fragment) in self.input.split('\'').enumerate() {
            // odd fragments sit between a pair of quotes
            if i % 2 == 1 {
                tokens.push(Token(format!("'{fragment}'")));
                continue;
            }
            let padded = Self::pad_symbols(fragment);
            tokens.extend(padded.split_whitespace().map(|t| Token(t.to_string())));
        }

        tokens
    }

    /// Surrounds punctuation and comparators with spaces so that splitting on
    /// whitespace isolates them.
    fn pad_symbols(fragment: &str) -> String {
        let chars: Vec<char> = fragment.chars().collect();
        let mut out = String::with_capacity(fragment.len() * 2);
        let mut position = 0;

        while position < chars.len() {
            let current = chars[position];
            let next = chars.get(position + 1).copied();

            match (current, next) {
                ('=' | '>' | '<' | '!', Some('=')) => {
                    out.push(' ');
                    out.push(current);
                    out.push('=');
                    out.push(' ');
                    position += 2;
                    continue;
                }
                ('(' | ')' | ',' | ';' | '=' | '>' | '<', _) => {
                    out.push(' ');
                    out.push(current);
                    out.push(' ');
                }
                _ => out.push(current),
            }
            position += 1;
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spell(input: &str) -> Vec<String> {
        Tokenizer::new(input)
            .tokenize()
            .into_iter()
            .map(|t| t.as_str().to_string())
            .collect()
    }

    #[test]
    fn test_tokenize_simple() {
        assert_eq!(spell("USE marks;"), vec!["USE", "marks", ";"]);
    }

    #[test]
    fn test_tokenize_with_parens() {
        assert_eq!(
            spell("CREATE TABLE marks(name,mark ,pass);"),
            vec!["CREATE", "TABLE", "marks", "(", "name", ",", "mark", ",", "pass", ")", ";"]
        );
    }

    #[test]
    fn test_tokenize_strings_are_kept_whole() {
        assert_eq!(
            spell("INSERT INTO marks VALUES ('Bob  Dylan', 'a,b;(c)==d', 12);"),
            vec![
                "INSERT",
                "INTO",
                "marks",
                "VALUES",
                "(",
                "'Bob  Dylan'",
                ",",
                "'a,b;(c)==d'",
                ",",
                "12",
                ")",
                ";"
            ]
        );
    }

    #[test]
    fn test_tokenize_comparators() {
        assert_eq!(
            spell("a==1 b>=2 c<=3 d!=4 e>5 f<6 g=7"),
            vec![
                "a", "==", "1", "b", ">=", "2", "c", "<=", "3", "d", "!=", "4", "e", ">", "5",
                "f", "<", "6", "g", "=", "7"
            ]
        );
    }

    #[test]
    fn test_tokenize_signed_numbers_stay_whole() {
        assert_eq!(spell("mark>-12.5"), vec!["mark", ">", "-12.5"]);
        assert_eq!(spell("mark==+3"), vec!["mark", "==", "+3"]);
    }

    #[test]
    fn test_tokenize_collapses_whitespace() {
        assert_eq!(
            spell("  SELECT   *\n FROM\tmarks ;  "),
            vec!["SELECT", "*", "FROM", "marks", ";"]
        );
    }

    #[test]
    fn test_empty_string_literal() {
        assert_eq!(spell("VALUES ('')"), vec!["VALUES", "(", "''", ")"]);
    }

    #[test]
    fn test_unterminated_string_is_not_an_error() {
        let tokens = Tokenizer::new("VALUES ('abc);").tokenize();
        assert_eq!(tokens.last().unwrap().as_str(), "'abc);'");
        assert!(tokens.last().unwrap().is_quoted());
    }

    #[test]
    fn test_no_empty_tokens() {
        assert!(Tokenizer::new("").tokenize().is_empty());
        assert!(Tokenizer::new("   ").tokenize().is_empty());
        assert!(spell(" ( ) ").iter().all(|t| !t.is_empty()));
    }
}
