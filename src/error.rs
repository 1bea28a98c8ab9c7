//! Error types for loading, parsing and executing queries.

use std::io;

use thiserror::Error;

/// Failure while ingesting a CSV source into a [crate::Table].
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source file does not exist.
    #[error("CSV file '{origin}' not found")]
    NotFound { origin: String },

    /// The source could not be opened or read.
    #[error("error reading CSV '{origin}': {source}")]
    Io {
        origin: String,
        #[source]
        source: io::Error,
    },

    /// The source contains no header record.
    #[error("CSV file '{origin}' has no header row")]
    MissingHeader { origin: String },

    /// Two header cells carry the same name.
    #[error("CSV file '{origin}' declares column '{column}' more than once")]
    DuplicateColumn { origin: String, column: String },

    /// A data record does not have one cell per header column.
    #[error("CSV file '{origin}' line {line}: expected {expected} fields, found {found}")]
    RowLength {
        origin: String,
        line: u64,
        expected: u64,
        found: u64,
    },

    /// Any other reader failure (invalid UTF-8, broken quoting).
    #[error("malformed CSV '{origin}': {source}")]
    Malformed {
        origin: String,
        #[source]
        source: csv::Error,
    },
}

/// Failure while turning query text into a [crate::ast::Statement].
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("empty query")]
    Empty,

    #[error("unexpected character {ch:?} at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    #[error(
        "unsupported query near {near}: only queries of the form \
         SELECT <columns> | * | COUNT(*) FROM <table> [WHERE <column> <op> <value>] are supported"
    )]
    Unsupported { near: String },

    #[error("SELECT list is empty")]
    EmptySelectList,

    #[error("'{name}' is not a valid table name")]
    InvalidIdentifier { name: String },

    #[error(
        "WHERE clause must be: column op value (e.g., age > 30 or city = 'Austin'), found {near}"
    )]
    MalformedPredicate { near: String },
}

/// Failure while executing a syntactically valid statement.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("unknown table '{name}'. Loaded tables: {loaded:?}")]
    UnknownTable { name: String, loaded: Vec<String> },

    #[error("unknown column '{column}' in table '{table}'")]
    UnknownColumn { column: String, table: String },
}

/// Either half of a one-shot [crate::Database::query].
#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}
