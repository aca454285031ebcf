//! SQLite-backed work order repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use fieldline_core::workorders::ports::{
    NewWorkOrder, WorkOrderRepository as WorkOrderRepositoryPort, WorkOrderSchedule,
    WorkOrderStatusUpdate,
};
use fieldline_domain::{constants, FieldlineError, Result as DomainResult, WorkOrder};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::task;

use super::manager::DbManager;
use super::opportunity_repository::query_work_orders;
use super::patch::{bump_opportunity_revision, UpdateBuilder};
use super::rows::{map_work_order_row, WORK_ORDER_COLUMNS};
use crate::errors::{map_join_error, map_sql_error};

/// Work order repository backed by SQLite.
pub struct SqliteWorkOrderRepository {
    db: Arc<DbManager>,
}

impl SqliteWorkOrderRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WorkOrderRepositoryPort for SqliteWorkOrderRepository {
    async fn insert_work_order(
        &self,
        order: NewWorkOrder,
        property_id: i64,
        funding_type_id: Option<i64>,
        expected_revision: i64,
    ) -> DomainResult<WorkOrder> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;

            bump_opportunity_revision(&tx, order.opportunity_id, expected_revision)?;

            let evidence_gate = if order.evidence_required {
                constants::GATE_STATUS_PENDING
            } else {
                constants::GATE_STATUS_NOT_REQUIRED
            };
            tx.execute(
                "INSERT INTO work_orders (opportunity_id, property_id, work_order_type_id, \
                 funding_type_id, status, evidence_required, evidence_gate_status, \
                 qa_gate_status, created_at) VALUES (?1, ?2, \
                 (SELECT id FROM work_order_types WHERE name = ?3), ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    order.opportunity_id,
                    property_id,
                    order.kind.to_string(),
                    funding_type_id,
                    constants::WORK_ORDER_STATUS_SCHEDULED,
                    order.evidence_required,
                    evidence_gate,
                    constants::GATE_STATUS_PENDING,
                    Utc::now().timestamp(),
                ],
            )
            .map_err(map_sql_error)?;
            let id = tx.last_insert_rowid();

            let created = query_work_order(&tx, id)?
                .ok_or_else(|| FieldlineError::NotFound("Work order not found".into()))?;
            tx.commit().map_err(map_sql_error)?;
            Ok(created)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_work_order(&self, work_order_id: i64) -> DomainResult<Option<WorkOrder>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            query_work_order(&conn, work_order_id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn schedule(
        &self,
        work_order_id: i64,
        schedule: WorkOrderSchedule,
    ) -> DomainResult<WorkOrder> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE work_orders SET scheduled_start = ?1, scheduled_end = ?2 WHERE id = ?3",
                params![
                    schedule.scheduled_start.timestamp(),
                    schedule.scheduled_end.timestamp(),
                    work_order_id,
                ],
            )
            .map_err(map_sql_error)?;
            query_work_order(&conn, work_order_id)?
                .ok_or_else(|| FieldlineError::NotFound("Work order not found".into()))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update_status(
        &self,
        work_order_id: i64,
        update: WorkOrderStatusUpdate,
    ) -> DomainResult<WorkOrder> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;

            let mut builder = UpdateBuilder::new();
            builder.set("status", update.status);
            builder.set("substatus", update.substatus);
            builder.set("completion_blocked_reason", update.completion_blocked_reason);
            builder.set_opt("actual_start", update.actual_start.map(|t| t.timestamp()));
            builder.set_opt("actual_end", update.actual_end.map(|t| t.timestamp()));
            builder.execute(&conn, "work_orders", work_order_id)?;

            query_work_order(&conn, work_order_id)?
                .ok_or_else(|| FieldlineError::NotFound("Work order not found".into()))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_for_opportunity(&self, opportunity_id: i64) -> DomainResult<Vec<WorkOrder>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            query_work_orders(&conn, opportunity_id)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn query_work_order(conn: &Connection, work_order_id: i64) -> DomainResult<Option<WorkOrder>> {
    conn.query_row(
        &format!(
            "SELECT {WORK_ORDER_COLUMNS} FROM work_orders w \
             JOIN work_order_types t ON t.id = w.work_order_type_id WHERE w.id = ?1"
        ),
        params![work_order_id],
        map_work_order_row,
    )
    .optional()
    .map_err(map_sql_error)
}
