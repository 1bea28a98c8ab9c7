//! Interactive read-eval-print loop.

use anyhow::{Context, Result, bail};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use minisql::{Database, QueryError};

use crate::formatter;

/// The prompt shown when waiting for input.
const PROMPT: &str = "SQL> ";

pub struct Repl {
    db: Database,
    editor: DefaultEditor,
}

impl Repl {
    pub fn new(db: Database) -> Result<Self> {
        let editor = DefaultEditor::new().context("failed to initialize line editor")?;
        Ok(Self { db, editor })
    }

    /// Runs until `exit`, `quit`, Ctrl-C or Ctrl-D.
    pub fn run(&mut self, example_table: &str) -> Result<()> {
        println!("Enter SQL queries like:");
        println!("  SELECT * FROM {example_table};");
        println!("  SELECT name, age FROM {example_table} WHERE age > 30;");
        println!("  SELECT COUNT(*) FROM {example_table};");
        println!("Type 'exit' or 'quit' to leave.\n");

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                        debug!("failed to record history: {e}");
                    }
                    if is_quit(&line) {
                        println!("Bye!");
                        return Ok(());
                    }
                    println!("{}", evaluate(&self.db, &line));
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                    println!("\nBye!");
                    return Ok(());
                }
                Err(e) => bail!("failed to read input: {e}"),
            }
        }
    }
}

fn is_quit(line: &str) -> bool {
    let word = line.trim();
    word.eq_ignore_ascii_case("exit") || word.eq_ignore_ascii_case("quit")
}

/// Runs one line and renders either the result table or the error.
fn evaluate(db: &Database, line: &str) -> String {
    match db.query(line) {
        Ok(result) => formatter::format_table(&result),
        Err(QueryError::Parse(e)) => format!("Parse error: {e}\n"),
        Err(QueryError::Engine(e)) => format!("Engine error: {e}\n"),
    }
}
