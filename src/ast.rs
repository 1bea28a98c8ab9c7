use std::fmt;

use crate::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Select),
    Count(Count),
}

impl Statement {
    /// Target table name, as written in the query.
    pub fn table(&self) -> &str {
        match self {
            Statement::Select(select) => &select.table,
            Statement::Count(count) => &count.table,
        }
    }

    pub fn where_clause(&self) -> Option<&Predicate> {
        match self {
            Statement::Select(select) => select.where_clause.as_ref(),
            Statement::Count(count) => count.where_clause.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnsSelect {
    Star,
    ColumnsNames(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub columns: ColumnsSelect,
    pub table: String,
    pub where_clause: Option<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Count {
    pub table: String,
    pub where_clause: Option<Predicate>,
}

/// A single `column op literal` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub op: ComparisonOp,
    pub value: Value,
}

impl Predicate {
    /// Evaluates the condition against the value a row holds for [Predicate::column].
    pub fn matches(&self, cell: &Value) -> bool {
        self.op.evaluate(cell, &self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl ComparisonOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::NotEq => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::LtEq => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::GtEq => ">=",
        }
    }

    /// Compares `left op right`.
    ///
    /// Ordering operators on values that cannot be ordered (text against a
    /// number, anything against an empty cell) are `false` rather than errors.
    pub fn evaluate(&self, left: &Value, right: &Value) -> bool {
        match self {
            ComparisonOp::Eq => left.sql_eq(right),
            ComparisonOp::NotEq => !left.sql_eq(right),
            ComparisonOp::Lt => left.sql_cmp(right).is_some_and(|o| o.is_lt()),
            ComparisonOp::LtEq => left.sql_cmp(right).is_some_and(|o| o.is_le()),
            ComparisonOp::Gt => left.sql_cmp(right).is_some_and(|o| o.is_gt()),
            ComparisonOp::GtEq => left.sql_cmp(right).is_some_and(|o| o.is_ge()),
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
