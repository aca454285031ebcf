//! SQLite-backed quote repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldline_core::process::ports::QuoteWithLines;
use fieldline_core::quotes::ports::{
    NewQuote, QuoteAcceptance, QuoteRepository as QuoteRepositoryPort, QuoteUpdate,
};
use fieldline_domain::{constants, FieldlineError, Quote, QuoteLine, Result as DomainResult};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::task;

use super::manager::DbManager;
use super::opportunity_repository::query_quotes_with_lines;
use super::patch::{bump_opportunity_revision, UpdateBuilder};
use super::rows::{map_quote_line_row, map_quote_row, QUOTE_COLUMNS, QUOTE_LINE_COLUMNS};
use crate::errors::{map_join_error, map_sql_error};

/// Quote repository backed by SQLite.
pub struct SqliteQuoteRepository {
    db: Arc<DbManager>,
}

impl SqliteQuoteRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl QuoteRepositoryPort for SqliteQuoteRepository {
    async fn insert_quote(&self, quote: NewQuote, expected_revision: i64) -> DomainResult<Quote> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;

            bump_opportunity_revision(&tx, quote.opportunity_id, expected_revision)?;
            tx.execute(
                "INSERT INTO quotes (opportunity_id, property_id, name, quote_type, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    quote.opportunity_id,
                    quote.property_id,
                    quote.name,
                    quote
                        .quote_type
                        .unwrap_or_else(|| constants::QUOTE_TYPE_INITIAL.to_string()),
                    Utc::now().timestamp(),
                ],
            )
            .map_err(map_sql_error)?;
            let id = tx.last_insert_rowid();

            let created = query_quote(&tx, id)?
                .ok_or_else(|| FieldlineError::NotFound("Quote not found".into()))?;
            tx.commit().map_err(map_sql_error)?;
            Ok(created)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_quote(&self, quote_id: i64) -> DomainResult<Option<Quote>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            query_quote(&conn, quote_id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_quote_with_lines(
        &self,
        quote_id: i64,
    ) -> DomainResult<Option<QuoteWithLines>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let Some(quote) = query_quote(&conn, quote_id)? else {
                return Ok(None);
            };
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {QUOTE_LINE_COLUMNS} FROM quote_lines WHERE quote_id = ?1 ORDER BY id"
                ))
                .map_err(map_sql_error)?;
            let lines = stmt
                .query_map(params![quote_id], map_quote_line_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(Some(QuoteWithLines { quote, lines }))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update_quote(&self, quote_id: i64, update: QuoteUpdate) -> DomainResult<Quote> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;

            let mut builder = UpdateBuilder::new();
            builder.set_opt("name", update.name);
            builder.set_opt("quote_type", update.quote_type);
            builder.set_opt("status", update.status.map(|s| s.to_string()));
            builder.set_opt("sent_on", update.sent_on.map(|t| t.timestamp()));
            if !builder.is_empty() {
                builder.execute(&conn, "quotes", quote_id)?;
            }

            query_quote(&conn, quote_id)?
                .ok_or_else(|| FieldlineError::NotFound("Quote not found".into()))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn add_line(
        &self,
        quote_id: i64,
        description: String,
        quantity: f64,
        unit_price: f64,
        line_total: f64,
    ) -> DomainResult<QuoteLine> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;

            tx.execute(
                "INSERT INTO quote_lines (quote_id, description, quantity, unit_price, \
                 line_total) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![quote_id, description, quantity, unit_price, line_total],
            )
            .map_err(map_sql_error)?;
            let id = tx.last_insert_rowid();

            tx.execute(
                "UPDATE quotes SET total_amount = \
                 (SELECT COALESCE(SUM(line_total), 0) FROM quote_lines WHERE quote_id = ?1) \
                 WHERE id = ?1",
                params![quote_id],
            )
            .map_err(map_sql_error)?;

            let line = tx
                .query_row(
                    &format!("SELECT {QUOTE_LINE_COLUMNS} FROM quote_lines WHERE id = ?1"),
                    params![id],
                    map_quote_line_row,
                )
                .map_err(map_sql_error)?;
            tx.commit().map_err(map_sql_error)?;
            Ok(line)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn accept_quote(
        &self,
        quote_id: i64,
        acceptance: QuoteAcceptance,
        accepted_at: DateTime<Utc>,
    ) -> DomainResult<Quote> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;

            let updated = tx
                .execute(
                    "UPDATE quotes SET status = 'Accepted', accepted_on = ?1, \
                     acceptance_method = ?2, customer_proof = ?3 WHERE id = ?4",
                    params![
                        accepted_at.timestamp(),
                        acceptance.acceptance_method,
                        acceptance.customer_proof,
                        quote_id,
                    ],
                )
                .map_err(map_sql_error)?;
            if updated == 0 {
                return Err(FieldlineError::NotFound("Quote not found".into()));
            }

            tx.execute(
                "UPDATE opportunities SET quote_status = 'Accepted', acceptance_date = ?1, \
                 revision = revision + 1 \
                 WHERE id = (SELECT opportunity_id FROM quotes WHERE id = ?2)",
                params![accepted_at.timestamp(), quote_id],
            )
            .map_err(map_sql_error)?;

            let quote = query_quote(&tx, quote_id)?
                .ok_or_else(|| FieldlineError::NotFound("Quote not found".into()))?;
            tx.commit().map_err(map_sql_error)?;
            Ok(quote)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_for_opportunity(
        &self,
        opportunity_id: i64,
    ) -> DomainResult<Vec<QuoteWithLines>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            query_quotes_with_lines(&conn, opportunity_id)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn query_quote(conn: &Connection, quote_id: i64) -> DomainResult<Option<Quote>> {
    conn.query_row(
        &format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = ?1"),
        params![quote_id],
        map_quote_row,
    )
    .optional()
    .map_err(map_sql_error)
}
