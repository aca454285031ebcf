//! SQLite-backed QA repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldline_core::qa::ports::{
    NewQaChecklist, NewQaResult, QaRepository as QaRepositoryPort, QaResultUpdate,
};
use fieldline_domain::{
    FieldlineError, QaChecklist, QaChecklistItem, QaResult, Result as DomainResult, WorkOrderKind,
};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::task;

use super::manager::DbManager;
use super::rows::{
    map_qa_checklist_item_row, map_qa_result_row, parse_opt_label, QA_RESULT_COLUMNS,
};
use crate::errors::{map_join_error, map_sql_error};

/// QA repository backed by SQLite.
pub struct SqliteQaRepository {
    db: Arc<DbManager>,
}

impl SqliteQaRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl QaRepositoryPort for SqliteQaRepository {
    async fn insert_checklist(&self, checklist: NewQaChecklist) -> DomainResult<QaChecklist> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;

            tx.execute(
                "INSERT INTO qa_checklists (name, product_offering_id, work_order_type_id) \
                 VALUES (?1, ?2, (SELECT id FROM work_order_types WHERE name = ?3))",
                params![
                    checklist.name,
                    checklist.product_offering_id,
                    checklist.work_order_kind.map(|k| k.to_string()),
                ],
            )
            .map_err(map_sql_error)?;
            let checklist_id = tx.last_insert_rowid();

            for item in &checklist.items {
                tx.execute(
                    "INSERT INTO qa_checklist_items (checklist_id, item_text, mandatory, \
                     sort_order) VALUES (?1, ?2, ?3, ?4)",
                    params![checklist_id, item.item_text, item.mandatory, item.sort_order],
                )
                .map_err(map_sql_error)?;
            }

            let created = query_checklist(&tx, checklist_id)?
                .ok_or_else(|| FieldlineError::NotFound("QA checklist not found".into()))?;
            tx.commit().map_err(map_sql_error)?;
            Ok(created)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_applicable_checklist(
        &self,
        kind: WorkOrderKind,
        product_offering_id: Option<i64>,
    ) -> DomainResult<Option<QaChecklist>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let checklist_id: Option<i64> = conn
                .query_row(
                    "SELECT c.id FROM qa_checklists c \
                     LEFT JOIN work_order_types t ON t.id = c.work_order_type_id \
                     WHERE c.is_active = 1 \
                     AND (c.work_order_type_id IS NULL OR t.name = ?1) \
                     AND (c.product_offering_id IS NULL OR c.product_offering_id = ?2) \
                     ORDER BY c.id LIMIT 1",
                    params![kind.to_string(), product_offering_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(map_sql_error)?;

            match checklist_id {
                Some(id) => query_checklist(&conn, id),
                None => Ok(None),
            }
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_result_for_item(
        &self,
        work_order_id: i64,
        checklist_item_id: i64,
    ) -> DomainResult<Option<QaResult>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.query_row(
                &format!(
                    "SELECT {QA_RESULT_COLUMNS} FROM qa_results \
                     WHERE work_order_id = ?1 AND checklist_item_id = ?2"
                ),
                params![work_order_id, checklist_item_id],
                map_qa_result_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn insert_result(&self, result: NewQaResult) -> DomainResult<QaResult> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO qa_results (opportunity_id, work_order_id, checklist_item_id, \
                 result) VALUES (?1, ?2, ?3, 'N/A')",
                params![result.opportunity_id, result.work_order_id, result.checklist_item_id],
            )
            .map_err(map_sql_error)?;
            let id = conn.last_insert_rowid();
            query_result(&conn, id)?
                .ok_or_else(|| FieldlineError::NotFound("QA result not found".into()))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_result(&self, result_id: i64) -> DomainResult<Option<QaResult>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            query_result(&conn, result_id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update_result(
        &self,
        result_id: i64,
        update: QaResultUpdate,
        checked_at: DateTime<Utc>,
    ) -> DomainResult<QaResult> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE qa_results SET result = ?1, notes = ?2, checked_by = ?3, \
                 checked_on = ?4 WHERE id = ?5",
                params![
                    update.outcome.to_string(),
                    update.notes,
                    update.checked_by,
                    checked_at.timestamp(),
                    result_id,
                ],
            )
            .map_err(map_sql_error)?;
            query_result(&conn, result_id)?
                .ok_or_else(|| FieldlineError::NotFound("QA result not found".into()))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_for_work_order(&self, work_order_id: i64) -> DomainResult<Vec<QaResult>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {QA_RESULT_COLUMNS} FROM qa_results \
                     WHERE work_order_id = ?1 ORDER BY id"
                ))
                .map_err(map_sql_error)?;
            let results = stmt
                .query_map(params![work_order_id], map_qa_result_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(results)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn set_qa_gate_status(&self, work_order_id: i64, status: &str) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let status = status.to_string();
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE work_orders SET qa_gate_status = ?1 WHERE id = ?2",
                params![status, work_order_id],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

fn query_checklist(conn: &Connection, checklist_id: i64) -> DomainResult<Option<QaChecklist>> {
    let header = conn
        .query_row(
            "SELECT c.id, c.name, c.product_offering_id, c.is_active, t.name \
             FROM qa_checklists c \
             LEFT JOIN work_order_types t ON t.id = c.work_order_type_id WHERE c.id = ?1",
            params![checklist_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    row.get::<_, bool>(3)?,
                    parse_opt_label::<WorkOrderKind>(4, row.get(4)?)?,
                ))
            },
        )
        .optional()
        .map_err(map_sql_error)?;

    let Some((id, name, product_offering_id, is_active, work_order_kind)) = header else {
        return Ok(None);
    };

    let mut stmt = conn
        .prepare(
            "SELECT id, checklist_id, item_text, mandatory, sort_order \
             FROM qa_checklist_items WHERE checklist_id = ?1 ORDER BY sort_order, id",
        )
        .map_err(map_sql_error)?;
    let items: Vec<QaChecklistItem> = stmt
        .query_map(params![id], map_qa_checklist_item_row)
        .map_err(map_sql_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(map_sql_error)?;

    Ok(Some(QaChecklist { id, name, product_offering_id, work_order_kind, is_active, items }))
}

fn query_result(conn: &Connection, result_id: i64) -> DomainResult<Option<QaResult>> {
    conn.query_row(
        &format!("SELECT {QA_RESULT_COLUMNS} FROM qa_results WHERE id = ?1"),
        params![result_id],
        map_qa_result_row,
    )
    .optional()
    .map_err(map_sql_error)
}
