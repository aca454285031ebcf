//! Shared write helpers for the SQLite repositories

use fieldline_domain::{FieldlineError, Result};
use rusqlite::{params, Connection, ToSql};

use crate::errors::map_sql_error;

/// Incrementally built `UPDATE ... SET` statement for patch-style writes.
pub(crate) struct UpdateBuilder {
    assignments: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl UpdateBuilder {
    pub(crate) fn new() -> Self {
        Self { assignments: Vec::new(), params: Vec::new() }
    }

    /// Add a column assignment.
    pub(crate) fn set(&mut self, column: &str, value: impl ToSql + 'static) {
        self.params.push(Box::new(value));
        self.assignments.push(format!("{column} = ?{}", self.params.len()));
    }

    /// Add a column assignment only when the value is present.
    pub(crate) fn set_opt(&mut self, column: &str, value: Option<impl ToSql + 'static>) {
        if let Some(value) = value {
            self.set(column, value);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Run the update against one row by id.
    pub(crate) fn execute(mut self, conn: &Connection, table: &str, id: i64) -> Result<usize> {
        self.params.push(Box::new(id));
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            table,
            self.assignments.join(", "),
            self.params.len()
        );
        let param_refs: Vec<&dyn ToSql> = self.params.iter().map(AsRef::as_ref).collect();
        conn.execute(&sql, param_refs.as_slice()).map_err(map_sql_error)
    }
}

/// Bump the opportunity's optimistic concurrency token inside a guarded
/// transaction. Zero rows updated means either the row is gone or another
/// writer got there first.
pub(crate) fn bump_opportunity_revision(
    conn: &Connection,
    opportunity_id: i64,
    expected_revision: i64,
) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE opportunities SET revision = revision + 1 WHERE id = ?1 AND revision = ?2",
            params![opportunity_id, expected_revision],
        )
        .map_err(map_sql_error)?;
    if updated == 1 {
        return Ok(());
    }

    let exists: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM opportunities WHERE id = ?1)",
            params![opportunity_id],
            |row| row.get(0),
        )
        .map_err(map_sql_error)?;
    if exists {
        Err(FieldlineError::Conflict(format!(
            "opportunity {opportunity_id} was modified concurrently"
        )))
    } else {
        Err(FieldlineError::NotFound("Opportunity not found".into()))
    }
}
