//! SQLite-backed evidence repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldline_core::evidence::ports::{
    EvidenceRepository as EvidenceRepositoryPort, EvidenceReview, NewEvidenceItem,
    NewEvidenceRequirement,
};
use fieldline_domain::{
    EvidenceItem, EvidenceRequirement, FieldlineError, Result as DomainResult, WorkOrderKind,
};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::task;

use super::manager::DbManager;
use super::rows::{
    map_evidence_item_row, map_requirement_row, EVIDENCE_ITEM_COLUMNS, REQUIREMENT_COLUMNS,
};
use crate::errors::{map_join_error, map_sql_error};

/// Evidence repository backed by SQLite.
pub struct SqliteEvidenceRepository {
    db: Arc<DbManager>,
}

impl SqliteEvidenceRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EvidenceRepositoryPort for SqliteEvidenceRepository {
    async fn insert_requirement(
        &self,
        requirement: NewEvidenceRequirement,
    ) -> DomainResult<EvidenceRequirement> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO evidence_requirements (name, product_offering_id, \
                 work_order_type_id, funding_type_id, evidence_category_id, required_count, \
                 mandatory, sort_order) VALUES (?1, ?2, \
                 (SELECT id FROM work_order_types WHERE name = ?3), ?4, ?5, ?6, ?7, ?8)",
                params![
                    requirement.name,
                    requirement.product_offering_id,
                    requirement.work_order_kind.map(|k| k.to_string()),
                    requirement.funding_type_id,
                    requirement.evidence_category_id,
                    requirement.required_count,
                    requirement.mandatory,
                    requirement.sort_order,
                ],
            )
            .map_err(map_sql_error)?;
            let id = conn.last_insert_rowid();
            query_requirement(&conn, id)?
                .ok_or_else(|| FieldlineError::NotFound("Evidence requirement not found".into()))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_applicable_requirements(
        &self,
        kind: WorkOrderKind,
        product_offering_id: Option<i64>,
        funding_type_id: Option<i64>,
    ) -> DomainResult<Vec<EvidenceRequirement>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {REQUIREMENT_COLUMNS} FROM evidence_requirements r \
                     LEFT JOIN work_order_types t ON t.id = r.work_order_type_id \
                     WHERE r.is_active = 1 \
                     AND (r.work_order_type_id IS NULL OR t.name = ?1) \
                     AND (r.product_offering_id IS NULL OR r.product_offering_id = ?2) \
                     AND (r.funding_type_id IS NULL OR r.funding_type_id = ?3) \
                     ORDER BY r.sort_order, r.id"
                ))
                .map_err(map_sql_error)?;
            let requirements = stmt
                .query_map(
                    params![kind.to_string(), product_offering_id, funding_type_id],
                    map_requirement_row,
                )
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(requirements)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn insert_item(&self, item: NewEvidenceItem) -> DomainResult<EvidenceItem> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO evidence_items (name, opportunity_id, work_order_id, property_id, \
                 requirement_id, evidence_type_id, status, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'Pending', ?7)",
                params![
                    item.name,
                    item.opportunity_id,
                    item.work_order_id,
                    item.property_id,
                    item.requirement_id,
                    item.evidence_type_id,
                    Utc::now().timestamp(),
                ],
            )
            .map_err(map_sql_error)?;
            let id = conn.last_insert_rowid();
            query_item(&conn, id)?
                .ok_or_else(|| FieldlineError::NotFound("Evidence item not found".into()))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_item(&self, item_id: i64) -> DomainResult<Option<EvidenceItem>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            query_item(&conn, item_id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn attach_file(
        &self,
        item_id: i64,
        file_path: String,
        captured_at: DateTime<Utc>,
    ) -> DomainResult<EvidenceItem> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE evidence_items SET file_path = ?1, captured_on = ?2, \
                 status = 'Submitted' WHERE id = ?3",
                params![file_path, captured_at.timestamp(), item_id],
            )
            .map_err(map_sql_error)?;
            query_item(&conn, item_id)?
                .ok_or_else(|| FieldlineError::NotFound("Evidence item not found".into()))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update_item_review(
        &self,
        item_id: i64,
        review: EvidenceReview,
        reviewed_at: DateTime<Utc>,
    ) -> DomainResult<EvidenceItem> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE evidence_items SET status = ?1, reviewer = ?2, rejection_reason = ?3, \
                 notes = ?4, reviewed_on = ?5 WHERE id = ?6",
                params![
                    review.status.to_string(),
                    review.reviewer,
                    review.rejection_reason,
                    review.notes,
                    reviewed_at.timestamp(),
                    item_id,
                ],
            )
            .map_err(map_sql_error)?;
            query_item(&conn, item_id)?
                .ok_or_else(|| FieldlineError::NotFound("Evidence item not found".into()))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_for_work_order(&self, work_order_id: i64) -> DomainResult<Vec<EvidenceItem>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {EVIDENCE_ITEM_COLUMNS} FROM evidence_items \
                     WHERE work_order_id = ?1 ORDER BY id"
                ))
                .map_err(map_sql_error)?;
            let items = stmt
                .query_map(params![work_order_id], map_evidence_item_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(items)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn set_evidence_gate_status(
        &self,
        work_order_id: i64,
        status: &str,
    ) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let status = status.to_string();
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE work_orders SET evidence_gate_status = ?1 WHERE id = ?2",
                params![status, work_order_id],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

fn query_requirement(
    conn: &Connection,
    requirement_id: i64,
) -> DomainResult<Option<EvidenceRequirement>> {
    conn.query_row(
        &format!(
            "SELECT {REQUIREMENT_COLUMNS} FROM evidence_requirements r \
             LEFT JOIN work_order_types t ON t.id = r.work_order_type_id WHERE r.id = ?1"
        ),
        params![requirement_id],
        map_requirement_row,
    )
    .optional()
    .map_err(map_sql_error)
}

fn query_item(conn: &Connection, item_id: i64) -> DomainResult<Option<EvidenceItem>> {
    conn.query_row(
        &format!("SELECT {EVIDENCE_ITEM_COLUMNS} FROM evidence_items WHERE id = ?1"),
        params![item_id],
        map_evidence_item_row,
    )
    .optional()
    .map_err(map_sql_error)
}
