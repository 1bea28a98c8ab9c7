use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::error::LoadError;
use crate::value::Value;

/// One stored record, holding a [Value] for every column of its [Table],
/// in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }
}

/// An immutable in-memory relation loaded from delimited text.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    /// Column name to position in [Table::columns]. Lookups are case-sensitive.
    index: HashMap<String, usize>,
    rows: Vec<Row>,
}

impl Table {
    /// Loads a comma separated file whose first record is the header.
    ///
    /// # Errors
    /// Returns [LoadError] if the file is missing or unreadable, has no
    /// header, repeats a header name, or has a record whose length differs
    /// from the header.
    pub fn from_csv(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let file = File::open(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound {
                origin: origin.clone(),
            },
            _ => LoadError::Io {
                origin: origin.clone(),
                source,
            },
        })?;
        Self::load(name.into(), origin, file)
    }

    /// Loads comma separated text from any reader.
    ///
    /// # Example
    /// ```
    /// # use minisql::{Table, Value};
    /// let csv = "id,name,age\n1,Alice,30\n2,Bob,\n";
    /// let table = Table::from_reader("people", csv.as_bytes()).unwrap();
    ///
    /// assert_eq!(table.columns(), ["id", "name", "age"]);
    /// assert_eq!(table.row_count(), 2);
    /// assert_eq!(table.get_row(1).unwrap().values()[2], Value::Empty);
    /// ```
    pub fn from_reader(name: impl Into<String>, reader: impl Read) -> Result<Self, LoadError> {
        Self::load(name.into(), "<reader>".to_string(), reader)
    }

    fn load(name: String, origin: String, reader: impl Read) -> Result<Self, LoadError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| Self::csv_error(&origin, e))?
            .clone();
        if headers.is_empty() {
            return Err(LoadError::MissingHeader { origin });
        }

        let columns: Vec<String> = headers.iter().map(str::to_string).collect();
        let mut index = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            if index.insert(column.clone(), i).is_some() {
                return Err(LoadError::DuplicateColumn {
                    origin,
                    column: column.clone(),
                });
            }
        }

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(|e| Self::csv_error(&origin, e))?;
            // the reader already rejects ragged records, this guards the row invariant
            if record.len() != columns.len() {
                return Err(LoadError::RowLength {
                    origin,
                    line: record.position().map_or(0, |p| p.line()),
                    expected: columns.len() as u64,
                    found: record.len() as u64,
                });
            }
            rows.push(Row {
                values: record.iter().map(Value::infer).collect(),
            });
        }

        tracing::info!(
            table = %name,
            source = %origin,
            columns = columns.len(),
            rows = rows.len(),
            "loaded table"
        );

        Ok(Self {
            name,
            columns,
            index,
            rows,
        })
    }

    fn csv_error(origin: &str, err: csv::Error) -> LoadError {
        let origin = origin.to_string();
        if let csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } = err.kind()
        {
            return LoadError::RowLength {
                origin,
                line: pos.as_ref().map_or(0, |p| p.line()),
                expected: *expected_len,
                found: *len,
            };
        }
        LoadError::Malformed {
            origin,
            source: err,
        }
    }

    /// Name as given at load time.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column names in header order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn get_row(&self, row_idx: usize) -> Option<&Row> {
        self.rows.get(row_idx)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}
