use crate::{
    Value,
    ast::{ColumnsSelect, Predicate, Statement},
    error::{EngineError, LoadError, QueryError},
    parser,
    table::Table,
};
use bitvec::prelude::*;
use std::{collections::HashMap, path::Path, sync::Arc};

/// Header of the single column produced by `SELECT COUNT(*)`.
pub const COUNT_HEADER: &str = "COUNT";

/// The main entry point for the in-memory query engine.
/// It owns the registry of loaded tables and executes parsed statements
/// against it.
///
/// Tables are registered up front; execution only reads, so a populated
/// `Database` can be shared across threads behind an `Arc` without locking.
#[derive(Default)]
pub struct Database {
    /// Loaded tables keyed by their lowercased name.
    tables: HashMap<String, Table>,
}

/// Represents the result of a successful query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// The names of the columns included in the result set.
    pub columns: Vec<String>,
    /// The actual data, returned as a vector of rows, where each row is a vector of [Value].
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    /// Splits the result into its `(headers, rows)` pair.
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }
}

impl Database {
    /// Creates a new, empty database instance.
    pub fn new() -> Self {
        Self {
            tables: HashMap::default(),
        }
    }

    /// Adds a table to the registry under its lowercased name.
    ///
    /// A table already registered under the same name is replaced.
    pub fn register_table(&mut self, table: Table) {
        let key = table.name().to_lowercase();
        let (columns, rows) = (table.columns().len(), table.row_count());
        if self.tables.insert(key.clone(), table).is_some() {
            tracing::debug!(table = %key, "replaced registered table");
        }
        tracing::debug!(table = %key, columns, rows, "registered table");
    }

    /// Loads a CSV file and registers it under `name`.
    ///
    /// # Errors
    /// Returns the [LoadError] of [Table::from_csv]; nothing is registered then.
    pub fn load_csv(&mut self, name: &str, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let table = Table::from_csv(name, path)?;
        self.register_table(table);
        Ok(())
    }

    /// Retrieves a table by name, ignoring case.
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&name.to_lowercase())
    }

    /// Returns the registry keys of all loaded tables, sorted.
    pub fn list_tables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Parses and executes a single query line.
    ///
    /// # Example
    ///
    /// ```
    /// use minisql::{Database, Table, Value};
    ///
    /// let csv = "name,price\nLaptop,1200\nMouse,25\n";
    /// let mut db = Database::new();
    /// db.register_table(Table::from_reader("products", csv.as_bytes()).unwrap());
    ///
    /// let result = db.query("SELECT name FROM Products WHERE price > 100").unwrap();
    ///
    /// assert_eq!(result.columns, vec!["name"]);
    /// assert_eq!(result.rows, vec![vec![Value::Text("Laptop".into())]]);
    /// ```
    ///
    /// # Errors
    /// Returns [QueryError::Parse] for text outside the grammar and
    /// [QueryError::Engine] for unknown tables or columns.
    pub fn query(&self, sql: &str) -> Result<QueryResult, QueryError> {
        let statement = parser::parse(sql)?;
        Ok(self.execute(&statement)?)
    }

    /// Executes a parsed statement against the registry.
    ///
    /// The table is resolved first, then the `WHERE` column, then the
    /// projected columns.
    ///
    /// # Errors
    /// Returns an error if the table is not registered, or if the `WHERE`
    /// column or a projected column does not exist in it.
    pub fn execute(&self, statement: &Statement) -> Result<QueryResult, EngineError> {
        let table = self.resolve_table(statement.table())?;
        let selection = self.filter_rows(table, statement.where_clause())?;

        let result = match statement {
            Statement::Select(select) => self.project(table, &select.columns, &selection)?,
            Statement::Count(_) => QueryResult {
                columns: vec![COUNT_HEADER.to_string()],
                rows: vec![vec![Value::Int(selection.count_ones() as i64)]],
            },
        };
        tracing::debug!(
            table = statement.table(),
            rows = result.rows.len(),
            "executed query"
        );
        Ok(result)
    }

    fn resolve_table(&self, name: &str) -> Result<&Table, EngineError> {
        self.get_table(name)
            .ok_or_else(|| EngineError::UnknownTable {
                name: name.to_string(),
                loaded: self.list_tables().into_iter().map(str::to_string).collect(),
            })
    }

    /// Builds the selection bitmap of a table: bit `i` is set when row `i`
    /// satisfies the `WHERE` clause (every bit is set without one).
    ///
    /// Rows whose value cannot be compared with the literal are left out,
    /// they never raise an error.
    ///
    /// # Errors
    /// Returns [EngineError::UnknownColumn] if the predicate names a column
    /// the table does not have.
    fn filter_rows(
        &self,
        table: &Table,
        where_clause: Option<&Predicate>,
    ) -> Result<BitVec, EngineError> {
        let Some(predicate) = where_clause else {
            return Ok(bitvec![1; table.row_count()]);
        };

        let col_idx = table
            .column_index(&predicate.column)
            .ok_or_else(|| unknown_column(&predicate.column, table))?;

        Ok(table
            .rows()
            .iter()
            .map(|row| row.get(col_idx).is_some_and(|cell| predicate.matches(cell)))
            .collect())
    }

    /// Projects the selected rows of a `SELECT`.
    ///
    /// 1. **Resolves** the projected columns (`*` means every column in table order).
    /// 2. **Projects** each row whose bit is set onto those columns, keeping storage order.
    fn project(
        &self,
        table: &Table,
        columns: &ColumnsSelect,
        selection: &BitSlice,
    ) -> Result<QueryResult, EngineError> {
        let selected_cols: Vec<String> = match columns {
            ColumnsSelect::Star => table.columns().to_vec(),
            ColumnsSelect::ColumnsNames(cols) => {
                if let Some(missing) = cols.iter().find(|c| !table.has_column(c)) {
                    return Err(unknown_column(missing, table));
                }
                cols.clone()
            }
        };

        let indexes: Vec<Option<usize>> = selected_cols
            .iter()
            .map(|col| table.column_index(col))
            .collect();
        let blank: Value = Value::Text(Arc::from(""));

        let rows = selection
            .iter_ones()
            .filter_map(|i| table.get_row(i))
            .map(|row| {
                indexes
                    .iter()
                    .map(|idx| idx.and_then(|i| row.get(i)).unwrap_or(&blank).clone())
                    .collect()
            })
            .collect();

        Ok(QueryResult {
            columns: selected_cols,
            rows,
        })
    }
}

fn unknown_column(column: &str, table: &Table) -> EngineError {
    EngineError::UnknownColumn {
        column: column.to_string(),
        table: table.name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ComparisonOp, Count, Select};

    const EMPLOYEES: &str = "\
id,name,age,salary,city
1,Alice,34,85000,Austin
2,Bob,28,52000.5,Boston
3,Carol,,61000,Austin
4,Dan,45,120000,Denver
5,Eve,30,47000,Austin
";

    fn setup_db() -> Database {
        let mut db = Database::new();
        db.register_table(Table::from_reader("Employees", EMPLOYEES.as_bytes()).unwrap());
        db
    }

    fn text(s: &str) -> Value {
        Value::Text(s.into())
    }

    #[test]
    fn test_register_and_get_table() {
        let db = setup_db();

        assert!(db.get_table("employees").is_some());
        assert!(db.get_table("EMPLOYEES").is_some());
        assert!(db.get_table("unknown").is_none());
        assert_eq!(db.list_tables(), vec!["employees"]);
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut db = setup_db();
        db.register_table(Table::from_reader("EMPLOYEES", "id\n1\n".as_bytes()).unwrap());

        assert_eq!(db.list_tables(), vec!["employees"]);
        assert_eq!(db.get_table("employees").unwrap().columns(), ["id"]);
    }

    #[test]
    fn test_list_tables() {
        let mut db = setup_db();
        db.register_table(Table::from_reader("products", "id\n".as_bytes()).unwrap());

        assert_eq!(db.list_tables(), vec!["employees", "products"]);
    }

    #[test]
    fn test_query_star_round_trip() {
        let db = setup_db();
        let result = db.query("SELECT * FROM employees").unwrap();

        assert_eq!(result.columns, vec!["id", "name", "age", "salary", "city"]);
        assert_eq!(result.rows.len(), 5);
        assert_eq!(
            result.rows[0],
            vec![
                Value::Int(1),
                text("Alice"),
                Value::Int(34),
                Value::Int(85000),
                text("Austin")
            ]
        );
        assert_eq!(result.rows[1][3], Value::Float(52000.5));
        assert_eq!(result.rows[2][2], Value::Empty);

        let ids: Vec<Value> = result.rows.iter().map(|r| r[0].clone()).collect();
        assert_eq!(ids, (1..=5).map(Value::Int).collect::<Vec<_>>());
    }

    #[test]
    fn test_query_specific_columns_reordered() {
        let db = setup_db();
        let result = db.query("SELECT name, id FROM employees").unwrap();

        assert_eq!(result.columns, vec!["name", "id"]);
        assert_eq!(result.rows[0], vec![text("Alice"), Value::Int(1)]);
        assert_eq!(result.rows[4], vec![text("Eve"), Value::Int(5)]);
    }

    #[test]
    fn test_query_duplicate_columns() {
        let db = setup_db();
        let result = db.query("SELECT id, id FROM employees WHERE id = 2").unwrap();

        assert_eq!(result.columns, vec!["id", "id"]);
        assert_eq!(result.rows, vec![vec![Value::Int(2), Value::Int(2)]]);
    }

    #[test]
    fn test_query_with_where_excludes_empty() {
        let db = setup_db();
        let result = db.query("SELECT name FROM employees WHERE age > 30").unwrap();

        // Carol has no age and is left out
        assert_eq!(result.rows, vec![vec![text("Alice")], vec![text("Dan")]]);
    }

    #[test]
    fn test_query_with_where_on_mixed_numeric_column() {
        let db = setup_db();
        let result = db
            .query("SELECT name FROM employees WHERE salary <= 52000.5")
            .unwrap();

        assert_eq!(result.rows, vec![vec![text("Bob")], vec![text("Eve")]]);
    }

    #[test]
    fn test_integer_literal_matches_integer_cell() {
        let db = setup_db();

        let result = db.query("SELECT name FROM employees WHERE age = 34").unwrap();
        assert_eq!(result.rows, vec![vec![text("Alice")]]);

        // quoted literal stays text and never equals an integer cell
        let result = db.query("SELECT name FROM employees WHERE age = '34'").unwrap();
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_not_equal_keeps_incomparable_rows() {
        let db = setup_db();
        let result = db.query("SELECT id FROM employees WHERE age != 34").unwrap();

        assert_eq!(
            result.rows,
            vec![
                vec![Value::Int(2)],
                vec![Value::Int(3)],
                vec![Value::Int(4)],
                vec![Value::Int(5)]
            ]
        );
    }

    #[test]
    fn test_text_vs_number_ordering_matches_nothing() {
        let db = setup_db();
        let result = db.query("SELECT * FROM employees WHERE city > 10").unwrap();

        assert_eq!(result.columns.len(), 5);
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_text_ordering() {
        let db = setup_db();
        let result = db
            .query("SELECT city FROM employees WHERE city < 'Boston'")
            .unwrap();

        assert_eq!(result.rows.len(), 3);
        assert!(result.rows.iter().all(|r| r[0] == text("Austin")));
    }

    #[test]
    fn test_query_with_where_no_match_keeps_headers() {
        let db = setup_db();
        let result = db
            .query("SELECT name, city FROM employees WHERE city = 'Paris'")
            .unwrap();

        assert_eq!(result.columns, vec!["name", "city"]);
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_count() {
        let db = setup_db();

        let result = db.query("SELECT COUNT(*) FROM employees").unwrap();
        assert_eq!(result.columns, vec![COUNT_HEADER]);
        assert_eq!(result.rows, vec![vec![Value::Int(5)]]);

        let result = db
            .query("SELECT COUNT(*) FROM employees WHERE city = 'Austin'")
            .unwrap();
        assert_eq!(result.rows, vec![vec![Value::Int(3)]]);

        let result = db
            .query("SELECT COUNT(*) FROM employees WHERE city = 'Paris'")
            .unwrap();
        assert_eq!(result.into_parts(), (vec!["COUNT".to_string()], vec![vec![Value::Int(0)]]));
    }

    #[test]
    fn test_large_integer_against_float_literal() {
        let mut db = Database::new();
        db.register_table(Table::from_reader("big", "id\n9007199254740993\n".as_bytes()).unwrap());

        let result = db
            .query("SELECT COUNT(*) FROM big WHERE id = 9007199254740992.0")
            .unwrap();
        assert_eq!(result.rows, vec![vec![Value::Int(0)]]);

        let result = db
            .query("SELECT id FROM big WHERE id > 9007199254740992.0")
            .unwrap();
        assert_eq!(result.rows, vec![vec![Value::Int(9_007_199_254_740_993)]]);
    }

    #[test]
    fn test_last_from_makes_an_unknown_column() {
        let db = setup_db();
        let err = db.query("SELECT name FROM x FROM employees").unwrap_err();

        assert_eq!(
            err,
            QueryError::Engine(EngineError::UnknownColumn {
                column: "name FROM x".into(),
                table: "Employees".into(),
            })
        );
    }

    #[test]
    fn test_count_on_empty_table() {
        let mut db = Database::new();
        db.register_table(Table::from_reader("empty", "id,name\n".as_bytes()).unwrap());

        let result = db.query("SELECT COUNT(*) FROM empty").unwrap();
        assert_eq!(result.rows, vec![vec![Value::Int(0)]]);

        let result = db.query("SELECT * FROM empty").unwrap();
        assert_eq!(result.columns, vec!["id", "name"]);
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_unknown_table() {
        let db = setup_db();
        let err = db.query("SELECT * FROM ghost").unwrap_err();

        assert_eq!(
            err,
            QueryError::Engine(EngineError::UnknownTable {
                name: "ghost".into(),
                loaded: vec!["employees".into()],
            })
        );
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_unknown_projected_column() {
        let db = setup_db();
        let err = db.query("SELECT name, bogus FROM employees").unwrap_err();

        assert_eq!(
            err,
            QueryError::Engine(EngineError::UnknownColumn {
                column: "bogus".into(),
                table: "Employees".into(),
            })
        );
    }

    #[test]
    fn test_column_lookup_is_case_sensitive() {
        let db = setup_db();
        let err = db.query("SELECT Name FROM employees").unwrap_err();

        assert!(matches!(
            err,
            QueryError::Engine(EngineError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_unknown_where_column() {
        let db = setup_db();

        let err = db
            .query("SELECT COUNT(*) FROM employees WHERE bogus = 1")
            .unwrap_err();
        assert_eq!(
            err,
            QueryError::Engine(EngineError::UnknownColumn {
                column: "bogus".into(),
                table: "Employees".into(),
            })
        );

        // the WHERE column is checked even when the table has no rows
        let mut db = Database::new();
        db.register_table(Table::from_reader("empty", "id\n".as_bytes()).unwrap());
        assert!(db.query("SELECT id FROM empty WHERE bogus = 1").is_err());
    }

    #[test]
    fn test_parse_errors_surface_as_parse() {
        let db = setup_db();
        let err = db.query("DELETE FROM employees").unwrap_err();

        assert!(matches!(err, QueryError::Parse(_)));
    }

    #[test]
    fn test_execute_ast_directly() {
        let db = setup_db();
        let count = Statement::Count(Count {
            table: "employees".into(),
            where_clause: None,
        });
        assert_eq!(db.execute(&count).unwrap().rows, vec![vec![Value::Int(5)]]);

        let statement = Statement::Select(Select {
            columns: ColumnsSelect::ColumnsNames(vec!["city".into()]),
            table: "EMPLOYEES".into(),
            where_clause: Some(Predicate {
                column: "id".into(),
                op: ComparisonOp::GtEq,
                value: Value::Int(4),
            }),
        });

        let first = db.execute(&statement).unwrap();
        let second = db.execute(&statement).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.rows, vec![vec![text("Denver")], vec![text("Austin")]]);
    }

    #[test]
    fn test_concurrent_readers() {
        let db = Arc::new(setup_db());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let db = Arc::clone(&db);
                std::thread::spawn(move || {
                    db.query("SELECT COUNT(*) FROM employees WHERE city = 'Austin'")
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().rows, vec![vec![Value::Int(3)]]);
        }
    }
}
