//! SQLite-backed opportunity repository.
//!
//! Implements both the `OpportunityRepository` write port and the
//! read-only `ProcessSnapshotRepository` the process engine decides over.
//! All queries operate on the shared connection pool provided by
//! `DbManager`; blocking work runs on the tokio blocking pool.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldline_core::opportunities::ports::{
    InvoiceLinkUpdate, OpportunityPatch, OpportunityRepository as OpportunityRepositoryPort,
};
use fieldline_core::process::ports::{
    InstallWorkOrder, OpportunitySnapshot, ProcessSnapshotRepository, QuoteWithLines,
};
use fieldline_domain::{
    EvidenceRequirement, FieldlineError, Opportunity, Result as DomainResult, SalesStage,
    TimelineNote, WorkOrderKind, XeroInvoiceLink,
};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::task;

use super::manager::DbManager;
use super::patch::{bump_opportunity_revision, UpdateBuilder};
use super::rows::{
    map_assessment_path_row, map_evidence_item_row, map_invoice_link_row, map_opportunity_row,
    map_qa_result_row, map_quote_line_row, map_quote_row, map_requirement_row, map_timeline_row,
    map_work_order_row,
    EVIDENCE_ITEM_COLUMNS, INVOICE_LINK_COLUMNS, OPPORTUNITY_COLUMNS, QA_RESULT_COLUMNS,
    QUOTE_COLUMNS, QUOTE_LINE_COLUMNS, REQUIREMENT_COLUMNS, WORK_ORDER_COLUMNS,
};
use crate::errors::{map_join_error, map_sql_error};

/// Opportunity repository + process snapshot reader backed by SQLite.
pub struct SqliteOpportunityRepository {
    db: Arc<DbManager>,
}

impl SqliteOpportunityRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OpportunityRepositoryPort for SqliteOpportunityRepository {
    async fn find_opportunity(&self, opportunity_id: i64) -> DomainResult<Option<Opportunity>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            query_opportunity(&conn, opportunity_id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update_opportunity(
        &self,
        opportunity_id: i64,
        patch: OpportunityPatch,
    ) -> DomainResult<Opportunity> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;

            let mut update = UpdateBuilder::new();
            update.set_opt("name", patch.name);
            update.set_opt("assessment_path_id", patch.assessment_path_id);
            update.set_opt("requires_survey", patch.requires_survey);
            if let Some(stage) = patch.sales_stage {
                let stage: SalesStage =
                    stage.parse().map_err(FieldlineError::InvalidInput)?;
                update.set("sales_stage", stage.to_string());
            }
            update.set_opt("estimated_value", patch.estimated_value);
            update.set_opt(
                "target_install_window_start",
                patch.target_install_window_start.map(|t| t.timestamp()),
            );
            update.set_opt(
                "target_install_window_end",
                patch.target_install_window_end.map(|t| t.timestamp()),
            );
            update.set_opt("quote_status", patch.quote_status);
            update.set_opt("delivery_status", patch.delivery_status);
            update.set_opt("evidence_status", patch.evidence_status);
            update.set_opt("qa_status", patch.qa_status);
            update.set_opt("payment_link_sent", patch.payment_link_sent);
            update.set_opt(
                "payment_link_sent_on",
                patch.payment_link_sent_on.map(|t| t.timestamp()),
            );
            update.set_opt("payment_requested", patch.payment_requested);
            update.set_opt(
                "payment_requested_on",
                patch.payment_requested_on.map(|t| t.timestamp()),
            );

            if !update.is_empty() {
                update.execute(&conn, "opportunities", opportunity_id)?;
            }

            query_opportunity(&conn, opportunity_id)?
                .ok_or_else(|| FieldlineError::NotFound("Opportunity not found".into()))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn close_opportunity(
        &self,
        opportunity_id: i64,
        closed_at: DateTime<Utc>,
        expected_revision: i64,
    ) -> DomainResult<Opportunity> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;

            bump_opportunity_revision(&tx, opportunity_id, expected_revision)?;
            tx.execute(
                "UPDATE opportunities SET sales_stage = ?1, actual_close_date = ?2, \
                 close_blocked_reason = NULL WHERE id = ?3",
                params![SalesStage::Closed.to_string(), closed_at.timestamp(), opportunity_id],
            )
            .map_err(map_sql_error)?;

            let closed = query_opportunity(&tx, opportunity_id)?
                .ok_or_else(|| FieldlineError::NotFound("Opportunity not found".into()))?;
            tx.commit().map_err(map_sql_error)?;
            Ok(closed)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn upsert_invoice_link(
        &self,
        opportunity_id: i64,
        update: InvoiceLinkUpdate,
        synced_at: DateTime<Utc>,
    ) -> DomainResult<XeroInvoiceLink> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;

            tx.execute(
                "INSERT INTO xero_invoice_links (opportunity_id, xero_invoice_id, \
                 xero_invoice_number, xero_status, total, sync_error, last_synced_on) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
                 ON CONFLICT(opportunity_id) DO UPDATE SET \
                 xero_invoice_id = excluded.xero_invoice_id, \
                 xero_invoice_number = excluded.xero_invoice_number, \
                 xero_status = excluded.xero_status, \
                 total = excluded.total, \
                 sync_error = excluded.sync_error, \
                 last_synced_on = excluded.last_synced_on",
                params![
                    opportunity_id,
                    update.xero_invoice_id,
                    update.xero_invoice_number,
                    update.xero_status,
                    update.total,
                    update.sync_error,
                    synced_at.timestamp(),
                ],
            )
            .map_err(map_sql_error)?;

            tx.execute(
                "UPDATE opportunities SET xero_invoice_id = ?1, xero_invoice_number = ?2, \
                 xero_invoice_status = ?3 WHERE id = ?4",
                params![
                    update.xero_invoice_id,
                    update.xero_invoice_number,
                    update.xero_status,
                    opportunity_id,
                ],
            )
            .map_err(map_sql_error)?;

            let link = tx
                .query_row(
                    &format!(
                        "SELECT {INVOICE_LINK_COLUMNS} FROM xero_invoice_links \
                         WHERE opportunity_id = ?1"
                    ),
                    params![opportunity_id],
                    map_invoice_link_row,
                )
                .map_err(map_sql_error)?;
            tx.commit().map_err(map_sql_error)?;
            Ok(link)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn add_timeline_note(
        &self,
        opportunity_id: i64,
        note: String,
        created_by: Option<String>,
    ) -> DomainResult<TimelineNote> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO opportunity_timeline (opportunity_id, note, created_by, created_at) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![opportunity_id, note, created_by, Utc::now().timestamp()],
            )
            .map_err(map_sql_error)?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                "SELECT id, opportunity_id, note, created_by, created_at \
                 FROM opportunity_timeline WHERE id = ?1",
                params![id],
                map_timeline_row,
            )
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_timeline(&self, opportunity_id: i64) -> DomainResult<Vec<TimelineNote>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(
                    "SELECT id, opportunity_id, note, created_by, created_at \
                     FROM opportunity_timeline WHERE opportunity_id = ?1 ORDER BY id",
                )
                .map_err(map_sql_error)?;
            let notes = stmt
                .query_map(params![opportunity_id], map_timeline_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(notes)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl ProcessSnapshotRepository for SqliteOpportunityRepository {
    async fn load_snapshot(
        &self,
        opportunity_id: i64,
    ) -> DomainResult<Option<OpportunitySnapshot>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let Some(opportunity) = query_opportunity(&conn, opportunity_id)? else {
                return Ok(None);
            };

            let assessment_path = match opportunity.assessment_path_id {
                Some(path_id) => conn
                    .query_row(
                        "SELECT id, name, requires_survey, is_active FROM assessment_paths \
                         WHERE id = ?1",
                        params![path_id],
                        map_assessment_path_row,
                    )
                    .optional()
                    .map_err(map_sql_error)?,
                None => None,
            };

            let quotes = query_quotes_with_lines(&conn, opportunity_id)?;
            let work_orders = query_work_orders(&conn, opportunity_id)?;

            Ok(Some(OpportunitySnapshot { opportunity, assessment_path, quotes, work_orders }))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_install_orders(
        &self,
        opportunity_id: i64,
    ) -> DomainResult<Vec<InstallWorkOrder>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {WORK_ORDER_COLUMNS} FROM work_orders w \
                     JOIN work_order_types t ON t.id = w.work_order_type_id \
                     WHERE w.opportunity_id = ?1 AND t.name = ?2 ORDER BY w.id"
                ))
                .map_err(map_sql_error)?;
            let orders = stmt
                .query_map(
                    params![opportunity_id, WorkOrderKind::Install.to_string()],
                    map_work_order_row,
                )
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;

            let mut install_orders = Vec::with_capacity(orders.len());
            for work_order in orders {
                let mut item_stmt = conn
                    .prepare(&format!(
                        "SELECT {EVIDENCE_ITEM_COLUMNS} FROM evidence_items \
                         WHERE work_order_id = ?1 ORDER BY id"
                    ))
                    .map_err(map_sql_error)?;
                let evidence_items = item_stmt
                    .query_map(params![work_order.id], map_evidence_item_row)
                    .map_err(map_sql_error)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(map_sql_error)?;

                let mut qa_stmt = conn
                    .prepare(&format!(
                        "SELECT {QA_RESULT_COLUMNS} FROM qa_results \
                         WHERE work_order_id = ?1 ORDER BY id"
                    ))
                    .map_err(map_sql_error)?;
                let qa_results = qa_stmt
                    .query_map(params![work_order.id], map_qa_result_row)
                    .map_err(map_sql_error)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(map_sql_error)?;

                install_orders.push(InstallWorkOrder { work_order, evidence_items, qa_results });
            }
            Ok(install_orders)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_mandatory_requirements(
        &self,
        kind: WorkOrderKind,
    ) -> DomainResult<Vec<EvidenceRequirement>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {REQUIREMENT_COLUMNS} FROM evidence_requirements r \
                     LEFT JOIN work_order_types t ON t.id = r.work_order_type_id \
                     WHERE r.mandatory = 1 AND r.is_active = 1 \
                     AND (r.work_order_type_id IS NULL OR t.name = ?1) \
                     ORDER BY r.sort_order, r.id"
                ))
                .map_err(map_sql_error)?;
            let requirements = stmt
                .query_map(params![kind.to_string()], map_requirement_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(requirements)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_invoice_link(
        &self,
        opportunity_id: i64,
    ) -> DomainResult<Option<XeroInvoiceLink>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.query_row(
                &format!(
                    "SELECT {INVOICE_LINK_COLUMNS} FROM xero_invoice_links \
                     WHERE opportunity_id = ?1"
                ),
                params![opportunity_id],
                map_invoice_link_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

pub(crate) fn query_opportunity(
    conn: &Connection,
    opportunity_id: i64,
) -> DomainResult<Option<Opportunity>> {
    conn.query_row(
        &format!("SELECT {OPPORTUNITY_COLUMNS} FROM opportunities WHERE id = ?1"),
        params![opportunity_id],
        map_opportunity_row,
    )
    .optional()
    .map_err(map_sql_error)
}

pub(crate) fn query_quotes_with_lines(
    conn: &Connection,
    opportunity_id: i64,
) -> DomainResult<Vec<QuoteWithLines>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quotes WHERE opportunity_id = ?1 ORDER BY id"
        ))
        .map_err(map_sql_error)?;
    let quotes = stmt
        .query_map(params![opportunity_id], map_quote_row)
        .map_err(map_sql_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(map_sql_error)?;

    let mut result = Vec::with_capacity(quotes.len());
    for quote in quotes {
        let mut line_stmt = conn
            .prepare(&format!(
                "SELECT {QUOTE_LINE_COLUMNS} FROM quote_lines WHERE quote_id = ?1 ORDER BY id"
            ))
            .map_err(map_sql_error)?;
        let lines = line_stmt
            .query_map(params![quote.id], map_quote_line_row)
            .map_err(map_sql_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_sql_error)?;
        result.push(QuoteWithLines { quote, lines });
    }
    Ok(result)
}

pub(crate) fn query_work_orders(
    conn: &Connection,
    opportunity_id: i64,
) -> DomainResult<Vec<fieldline_domain::WorkOrder>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {WORK_ORDER_COLUMNS} FROM work_orders w \
             JOIN work_order_types t ON t.id = w.work_order_type_id \
             WHERE w.opportunity_id = ?1 ORDER BY w.id"
        ))
        .map_err(map_sql_error)?;
    let orders = stmt
        .query_map(params![opportunity_id], map_work_order_row)
        .map_err(map_sql_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(map_sql_error)?;
    Ok(orders)
}
