use crate::error::ParseError;

/// Represents the smallest meaningful units (atoms) of the query language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // --- Keywords ---
    Select,
    Count,
    From,
    Where,

    // --- Identifiers ---
    /// Any other run of non-delimiter characters (e.g., `users`, `age`, `42`).
    Ident(String),

    // --- Symbols ---
    /// Left parenthesis `(`
    LeftParen,
    /// Right parenthesis `)`
    RightParen,
    /// Comma `,`
    Comma,
    /// Semicolon `;`
    Semicolon,
    /// Wildcard symbol `*`
    Star,
    /// Equal to
    Equal,
    /// Not equal to
    NotEqual,
    /// Greater than
    Greater,
    /// Greater than or equal to
    GreaterEqual,
    /// Lower than
    Lower,
    /// Lower than or equal to
    LowerEqual,

    // --- Special ---
    /// Represents the End Of File/Input.
    Eof,
}

/// A [Token] together with the byte range it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub start: usize,
    pub end: usize,
}

/// A lexical scanner (lexer) that converts a raw query string into [Token]s.
///
/// Tokens are produced on demand, so a caller can stop at any point and take
/// the untouched remainder of the input with [Tokenizer::rest].
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    /// Byte offset of the next unread character.
    position: usize,
}

impl<'a> Tokenizer<'a> {
    /// Creates a new Tokenizer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    /// Creates a Tokenizer that starts reading at byte offset `position`.
    /// Spans stay relative to the whole input.
    pub fn starting_at(input: &'a str, position: usize) -> Self {
        Self { input, position }
    }

    /// Reads the next token, skipping leading whitespace.
    /// Returns [Token::Eof] (repeatedly) once the input is exhausted.
    pub fn next_spanned(&mut self) -> Result<Spanned, ParseError> {
        self.skip_whitespace();
        let start = self.position;
        let token = match self.current_char() {
            None => Token::Eof,
            Some(ch) => self.next_token(ch)?,
        };
        Ok(Spanned {
            token,
            start,
            end: self.position,
        })
    }

    /// Returns the unread part of the input, without consuming it.
    pub fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    /// Identifies the next token based on the character at the current position.
    fn next_token(&mut self, ch: char) -> Result<Token, ParseError> {
        let token = match ch {
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            '*' => Token::Star,
            '=' => Token::Equal,
            // two-character operators win over their one-character prefix
            '<' => return Ok(self.read_operator(Token::Lower, Token::LowerEqual)),
            '>' => return Ok(self.read_operator(Token::Greater, Token::GreaterEqual)),
            '!' => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    return Ok(Token::NotEqual);
                }
                return Err(ParseError::UnexpectedCharacter {
                    ch,
                    position: self.position - 1,
                });
            }
            _ => return Ok(self.read_identifier()),
        };
        self.advance();
        Ok(token)
    }

    // --- Navigation Helpers ---

    fn current_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += ch.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    // --- Extraction Logic ---

    /// Reads `<`/`>` optionally followed by `=`.
    fn read_operator(&mut self, single: Token, with_equal: Token) -> Token {
        self.advance();
        if self.current_char() == Some('=') {
            self.advance();
            return with_equal;
        }
        single
    }

    /// Reads a run of non-delimiter characters and determines if it's
    /// a reserved keyword or a user-defined identifier.
    ///
    /// Keywords are matched case-insensitively.
    fn read_identifier(&mut self) -> Token {
        let start = self.position;
        while self.current_char().is_some_and(|c| !is_delimiter(c)) {
            self.advance();
        }
        let ident = &self.input[start..self.position];

        match ident.to_uppercase().as_str() {
            "SELECT" => Token::Select,
            "COUNT" => Token::Count,
            "FROM" => Token::From,
            "WHERE" => Token::Where,
            _ => Token::Ident(ident.to_string()),
        }
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | ',' | ';' | '*' | '=' | '<' | '>' | '!')
}

/// Returns true for `[A-Za-z_][A-Za-z0-9_]*` style names.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}
