use crate::Value;
use crate::ast::*;
use crate::error::ParseError;
use crate::tokenizer::{Spanned, Token, Tokenizer, is_identifier};

/// Parses one query line into a [Statement].
///
/// A single trailing `;` is accepted. Table and column names are not checked
/// here; that happens when the statement is executed.
///
/// # Example
/// ```
/// use minisql::ast::{ColumnsSelect, Statement};
///
/// let statement = minisql::parse("SELECT name, age FROM employees WHERE age > 30;").unwrap();
/// let Statement::Select(select) = statement else { panic!("expected a selection") };
/// assert_eq!(select.table, "employees");
/// assert_eq!(
///     select.columns,
///     ColumnsSelect::ColumnsNames(vec!["name".into(), "age".into()])
/// );
/// ```
pub fn parse(sql: &str) -> Result<Statement, ParseError> {
    let trimmed = sql.trim();
    let body = trimmed.strip_suffix(';').map(str::trim_end).unwrap_or(trimmed);
    if body.is_empty() {
        return Err(ParseError::Empty);
    }
    let statement = Parser::new(body)?.parse()?;
    tracing::trace!(?statement, "parsed query");
    Ok(statement)
}

pub struct Parser<'a> {
    source: &'a str,
    tokenizer: Tokenizer<'a>,
    current: Spanned,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Result<Self, ParseError> {
        let mut tokenizer = Tokenizer::new(source);
        let current = tokenizer.next_spanned()?;
        Ok(Self {
            source,
            tokenizer,
            current,
        })
    }

    pub fn parse(&mut self) -> Result<Statement, ParseError> {
        if *self.current_token() != Token::Select {
            return Err(self.unsupported());
        }
        let list_start = self.current.end;

        if let Ok(count) = self.parse_count() {
            return Ok(Statement::Count(count));
        }
        self.parse_select(list_start).map(Statement::Select)
    }

    //helpers
    fn current_token(&self) -> &Token {
        &self.current.token
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current = self.tokenizer.next_spanned()?;
        Ok(())
    }

    /// Moves the cursor to the token starting at byte offset `position`.
    fn seek(&mut self, position: usize) -> Result<(), ParseError> {
        self.tokenizer = Tokenizer::starting_at(self.source, position);
        self.advance()
    }

    fn unsupported(&self) -> ParseError {
        let near = match self.current_token() {
            Token::Eof => "end of input".to_string(),
            _ => format!("'{}'", &self.source[self.current.start..self.current.end]),
        };
        ParseError::Unsupported { near }
    }

    fn consume(&mut self, expected: Token) -> Result<(), ParseError> {
        if *self.current_token() == expected {
            self.advance()
        } else {
            Err(self.unsupported())
        }
    }

    fn consume_table_name(&mut self) -> Result<String, ParseError> {
        match self.current_token() {
            Token::Ident(name) if is_identifier(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(name)
            }
            Token::Ident(name) => Err(ParseError::InvalidIdentifier { name: name.clone() }),
            _ => Err(self.unsupported()),
        }
    }

    /// `SELECT COUNT ( * ) FROM <table> [WHERE ...]`.
    ///
    /// Any failure sends the caller to [Parser::parse_select], which reads
    /// the same text as a select list, so `count(*), name` is a list item.
    fn parse_count(&mut self) -> Result<Count, ParseError> {
        for expected in [
            Token::Select,
            Token::Count,
            Token::LeftParen,
            Token::Star,
            Token::RightParen,
            Token::From,
        ] {
            self.consume(expected)?;
        }

        let table = self.consume_table_name()?;
        let where_clause = self.parse_where_clause()?;
        Ok(Count {
            table,
            where_clause,
        })
    }

    /// `SELECT <list> FROM <table> [WHERE ...]`.
    ///
    /// The list is raw text and may itself contain `FROM`, so every
    /// whitespace-delimited `FROM` is a candidate end of the list. The
    /// rightmost candidate whose tail parses wins; when none does, the
    /// leftmost candidate's error is returned.
    fn parse_select(&mut self, list_start: usize) -> Result<Select, ParseError> {
        let mut result = Err(ParseError::Unsupported {
            near: "end of input".to_string(),
        });
        for from_at in from_keywords(self.source, list_start).into_iter().rev() {
            result = self.parse_select_at(list_start, from_at);
            if result.is_ok() {
                break;
            }
        }
        result
    }

    fn parse_select_at(&mut self, list_start: usize, from_at: usize) -> Result<Select, ParseError> {
        self.seek(from_at)?;
        self.consume(Token::From)?;
        let table = self.consume_table_name()?;
        let where_clause = self.parse_where_clause()?;
        let columns = parse_select_list(&self.source[list_start..from_at])?;

        Ok(Select {
            columns,
            table,
            where_clause,
        })
    }

    fn parse_where_clause(&mut self) -> Result<Option<Predicate>, ParseError> {
        match self.current_token() {
            Token::Eof => Ok(None),
            Token::Where => {
                self.advance()?;
                self.parse_predicate().map(Some)
            }
            _ => Err(self.unsupported()),
        }
    }

    /// `<identifier> <operator> <literal>` where the literal is the rest of
    /// the input.
    fn parse_predicate(&mut self) -> Result<Predicate, ParseError> {
        let malformed = |near: &str| ParseError::MalformedPredicate {
            near: if near.is_empty() {
                "end of input".to_string()
            } else {
                format!("'{near}'")
            },
        };
        let source = self.source;
        let remaining = source[self.current.start..].trim();

        let column = match self.current_token() {
            Token::Ident(name) if is_identifier(name) => name.clone(),
            _ => return Err(malformed(remaining)),
        };
        self.advance()?;

        let op = match self.current_token() {
            Token::Equal => ComparisonOp::Eq,
            Token::NotEqual => ComparisonOp::NotEq,
            Token::Lower => ComparisonOp::Lt,
            Token::LowerEqual => ComparisonOp::LtEq,
            Token::Greater => ComparisonOp::Gt,
            Token::GreaterEqual => ComparisonOp::GtEq,
            _ => return Err(malformed(remaining)),
        };

        // The literal is never tokenized: quotes, commas and keywords are data.
        let raw = self.tokenizer.rest().trim();
        if raw.is_empty() {
            return Err(malformed(remaining));
        }

        Ok(Predicate {
            column,
            op,
            value: parse_literal(raw),
        })
    }
}

/// Byte offsets of every `FROM` after `start` with whitespace on both sides.
fn from_keywords(source: &str, start: usize) -> Vec<usize> {
    let text = &source[start..];
    text.to_ascii_lowercase()
        .match_indices("from")
        .map(|(i, _)| i)
        .filter(|&i| {
            text[..i].chars().next_back().is_some_and(char::is_whitespace)
                && text[i + 4..].chars().next().is_some_and(char::is_whitespace)
        })
        .map(|i| start + i)
        .collect()
}

/// Splits the raw list on commas. Items keep their inner text (spaces,
/// punctuation) and blank items are dropped. A list that is only `*`
/// selects every column.
fn parse_select_list(text: &str) -> Result<ColumnsSelect, ParseError> {
    let items: Vec<String> = text
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();

    match items.as_slice() {
        [] => Err(ParseError::EmptySelectList),
        [only] if only == "*" => Ok(ColumnsSelect::Star),
        _ => Ok(ColumnsSelect::ColumnsNames(items)),
    }
}

/// Strips one matching pair of quotes (text kept verbatim), otherwise applies
/// the usual typing rule.
fn parse_literal(raw: &str) -> Value {
    for quote in ['\'', '"'] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return Value::Text(raw[1..raw.len() - 1].into());
        }
    }
    Value::infer(raw)
}
