pub mod ast;
pub mod database;
pub mod error;
pub mod parser;
pub mod table;
pub mod tokenizer;
pub mod value;

pub use database::{Database, QueryResult};
pub use error::{EngineError, LoadError, ParseError, QueryError};
pub use parser::parse;
pub use table::{Row, Table};
pub use value::Value;
