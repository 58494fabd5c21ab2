use chrono::{DateTime, FixedOffset};

use crate::error::{PgTimeError, Result};
use crate::types::SqlValue;

/// Driver-agnostic raw result from a database query.
/// Drivers decode every column into a [`SqlValue`].
#[derive(Debug, Clone, Default)]
pub struct RawQueryResult {
    /// Column names in order
    pub columns: Vec<String>,
    /// Rows, where each row is a vector of values in column order
    pub rows: Vec<Vec<SqlValue>>,
}

impl RawQueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// A single row result from a query, accessed by column name.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Row {
    pub(crate) fn new(columns: Vec<String>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Gets a value by column name.
    pub fn get(&self, column: &str) -> Result<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
            .ok_or_else(|| PgTimeError::ColumnNotFound(column.to_string()))
    }

    pub fn get_i64(&self, column: &str) -> Result<i64> {
        match self.get(column)? {
            SqlValue::Int64(v) => Ok(*v),
            _ => Err(PgTimeError::TypeMismatch {
                column: column.to_string(),
                expected: "int8",
            }),
        }
    }

    pub fn get_timestamptz(&self, column: &str) -> Result<DateTime<FixedOffset>> {
        match self.get(column)? {
            SqlValue::TimestampTz(v) => Ok(*v),
            _ => Err(PgTimeError::TypeMismatch {
                column: column.to_string(),
                expected: "timestamptz",
            }),
        }
    }

    /// Returns all column names in this row.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of a query execution, containing zero or more rows.
#[derive(Debug)]
pub struct QueryResult {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl QueryResult {
    /// Creates a QueryResult from a RawQueryResult.
    pub fn from_raw(raw: RawQueryResult) -> Self {
        let columns = raw.columns;
        let rows = raw
            .rows
            .into_iter()
            .map(|values| Row::new(columns.clone(), values))
            .collect();
        Self { columns, rows }
    }

    /// Extracts a single row from the result.
    /// Returns an error if the result contains zero or more than one row.
    pub fn single_row(self) -> Result<Row> {
        match self.optional_row()? {
            Some(row) => Ok(row),
            None => Err(PgTimeError::UnexpectedRowCount {
                expected: 1,
                actual: 0,
            }),
        }
    }

    /// Extracts at most one row from the result.
    /// Returns an error if the result contains more than one row.
    pub fn optional_row(self) -> Result<Option<Row>> {
        if self.rows.len() > 1 {
            return Err(PgTimeError::UnexpectedRowCount {
                expected: 1,
                actual: self.rows.len(),
            });
        }
        Ok(self.rows.into_iter().next())
    }

    /// Returns all rows from the result.
    pub fn rows(self) -> Vec<Row> {
        self.rows
    }

    /// Returns the column names from this result.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn raw(rows: Vec<Vec<SqlValue>>) -> RawQueryResult {
        RawQueryResult::new(vec!["id".to_string(), "created_at".to_string()], rows)
    }

    fn created_at() -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2009, 11, 10, 23, 0, 0)
            .unwrap()
            .fixed_offset()
    }

    #[test]
    fn test_row_get() {
        let row = QueryResult::from_raw(raw(vec![vec![
            SqlValue::Int64(1),
            SqlValue::TimestampTz(created_at()),
        ]]))
        .single_row()
        .unwrap();

        assert_eq!(row.get_i64("id").unwrap(), 1);
        assert_eq!(row.get_timestamptz("created_at").unwrap(), created_at());
        assert!(matches!(
            row.get("missing"),
            Err(PgTimeError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_row_type_mismatch() {
        let row = Row::new(vec!["id".to_string()], vec![SqlValue::Text("1".into())]);
        match row.get_i64("id").unwrap_err() {
            PgTimeError::TypeMismatch { column, expected } => {
                assert_eq!(column, "id");
                assert_eq!(expected, "int8");
            }
            other => panic!("Expected TypeMismatch error, got {:?}", other),
        }
        assert!(row.get_timestamptz("id").is_err());
    }

    #[test]
    fn test_query_result_single_row_error_on_empty() {
        let err = QueryResult::from_raw(raw(vec![])).single_row().unwrap_err();
        match err {
            PgTimeError::UnexpectedRowCount { expected, actual } => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 0);
            }
            _ => panic!("Expected UnexpectedRowCount error"),
        }
    }

    #[test]
    fn test_query_result_optional_row() {
        assert!(QueryResult::from_raw(raw(vec![]))
            .optional_row()
            .unwrap()
            .is_none());

        let two = raw(vec![
            vec![SqlValue::Int64(1), SqlValue::Null],
            vec![SqlValue::Int64(2), SqlValue::Null],
        ]);
        match QueryResult::from_raw(two).optional_row().unwrap_err() {
            PgTimeError::UnexpectedRowCount { expected, actual } => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            _ => panic!("Expected UnexpectedRowCount error"),
        }
    }
}
