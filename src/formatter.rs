//! Plain-text rendering of query results.

use minisql::QueryResult;

/// Renders a result as an aligned text table, or `No rows.` when empty.
pub fn format_table(result: &QueryResult) -> String {
    if result.rows.is_empty() {
        return "No rows.\n".to_string();
    }

    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect();

    let mut widths: Vec<usize> = result.columns.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    out.push_str(&format_line(&result.columns, &widths));
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in &cells {
        out.push_str(&format_line(row, &widths));
    }
    out
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ");
    line + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use minisql::Value;

    fn make_test_result() -> QueryResult {
        QueryResult {
            columns: vec!["id".to_string(), "name".to_string(), "score".to_string()],
            rows: vec![
                vec![Value::Int(1), Value::Text("Alice".into()), Value::Float(9.5)],
                vec![Value::Int(22), Value::Text("Bo".into()), Value::Empty],
            ],
        }
    }

    #[test]
    fn test_format_table() {
        let output = format_table(&make_test_result());
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "id | name  | score");
        assert_eq!(lines[1], "---+-------+------");
        assert_eq!(lines[2], "1  | Alice | 9.5  ");
        assert_eq!(lines[3], "22 | Bo    |      ");
    }

    #[test]
    fn test_format_count() {
        let result = QueryResult {
            columns: vec!["COUNT".to_string()],
            rows: vec![vec![Value::Int(3)]],
        };
        assert_eq!(format_table(&result), "COUNT\n-----\n3    \n");
    }

    #[test]
    fn test_format_no_rows() {
        let result = QueryResult {
            columns: vec!["id".to_string()],
            rows: vec![],
        };
        assert_eq!(format_table(&result), "No rows.\n");
    }
}
