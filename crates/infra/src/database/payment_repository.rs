//! SQLite-backed payment request repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldline_core::payments::ports::{
    NewPaymentRequest, PaymentRepository as PaymentRepositoryPort,
};
use fieldline_domain::{
    FieldlineError, PaymentRequest, PaymentStatus, Result as DomainResult,
};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::task;

use super::manager::DbManager;
use super::patch::{bump_opportunity_revision, UpdateBuilder};
use super::rows::{map_payment_request_row, PAYMENT_REQUEST_COLUMNS};
use crate::errors::{map_join_error, map_sql_error};

/// Payment request repository backed by SQLite.
pub struct SqlitePaymentRepository {
    db: Arc<DbManager>,
}

impl SqlitePaymentRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PaymentRepositoryPort for SqlitePaymentRepository {
    async fn insert_request(
        &self,
        opportunity_id: i64,
        property_id: Option<i64>,
        request: NewPaymentRequest,
        requested_at: DateTime<Utc>,
        expected_revision: i64,
    ) -> DomainResult<PaymentRequest> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;

            bump_opportunity_revision(&tx, opportunity_id, expected_revision)?;

            let status = if request.payment_link_url.is_some() {
                PaymentStatus::Sent
            } else {
                PaymentStatus::NotSent
            };
            let link_sent_on = request.payment_link_url.as_ref().map(|_| requested_at);
            tx.execute(
                "INSERT INTO payment_requests (opportunity_id, property_id, amount_requested, \
                 payment_link_url, payment_link_sent_on, sent_by, payment_status, notes, \
                 created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    opportunity_id,
                    property_id,
                    request.amount_requested,
                    request.payment_link_url,
                    link_sent_on.map(|t| t.timestamp()),
                    request.sent_by,
                    status.to_string(),
                    request.notes,
                    requested_at.timestamp(),
                ],
            )
            .map_err(map_sql_error)?;
            let id = tx.last_insert_rowid();

            tx.execute(
                "UPDATE opportunities SET payment_requested = 1, payment_requested_on = ?1 \
                 WHERE id = ?2",
                params![requested_at.timestamp(), opportunity_id],
            )
            .map_err(map_sql_error)?;

            let created = query_request(&tx, id)?
                .ok_or_else(|| FieldlineError::NotFound("Payment request not found".into()))?;
            tx.commit().map_err(map_sql_error)?;
            Ok(created)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_request(&self, request_id: i64) -> DomainResult<Option<PaymentRequest>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            query_request(&conn, request_id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update_status(
        &self,
        request_id: i64,
        status: PaymentStatus,
        paid_on: Option<DateTime<Utc>>,
        notes: Option<String>,
    ) -> DomainResult<PaymentRequest> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;

            let mut builder = UpdateBuilder::new();
            builder.set("payment_status", status.to_string());
            builder.set_opt("paid_on", paid_on.map(|t| t.timestamp()));
            builder.set_opt("notes", notes);
            builder.execute(&conn, "payment_requests", request_id)?;

            query_request(&conn, request_id)?
                .ok_or_else(|| FieldlineError::NotFound("Payment request not found".into()))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_for_opportunity(
        &self,
        opportunity_id: i64,
    ) -> DomainResult<Vec<PaymentRequest>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {PAYMENT_REQUEST_COLUMNS} FROM payment_requests \
                     WHERE opportunity_id = ?1 ORDER BY id DESC"
                ))
                .map_err(map_sql_error)?;
            let requests = stmt
                .query_map(params![opportunity_id], map_payment_request_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(requests)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn query_request(conn: &Connection, request_id: i64) -> DomainResult<Option<PaymentRequest>> {
    conn.query_row(
        &format!("SELECT {PAYMENT_REQUEST_COLUMNS} FROM payment_requests WHERE id = ?1"),
        params![request_id],
        map_payment_request_row,
    )
    .optional()
    .map_err(map_sql_error)
}
