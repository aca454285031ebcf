//! Port interfaces for quote persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldline_domain::{Quote, QuoteLine, QuoteStatus, Result};

use crate::process::ports::QuoteWithLines;

/// Fields for creating a quote.
#[derive(Debug, Clone)]
pub struct NewQuote {
    pub opportunity_id: i64,
    pub name: String,
    pub quote_type: Option<String>,
    pub property_id: Option<i64>,
}

/// Fields for adding a quote line; `line_total` is computed by the service.
#[derive(Debug, Clone)]
pub struct NewQuoteLine {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
}

/// Patch-style quote update.
#[derive(Debug, Clone, Default)]
pub struct QuoteUpdate {
    pub name: Option<String>,
    pub quote_type: Option<String>,
    pub status: Option<QuoteStatus>,
    pub sent_on: Option<DateTime<Utc>>,
}

/// How the customer accepted the quote.
#[derive(Debug, Clone)]
pub struct QuoteAcceptance {
    pub acceptance_method: String,
    pub customer_proof: Option<String>,
}

/// Trait for persisting quotes and their lines.
#[async_trait]
pub trait QuoteRepository: Send + Sync {
    /// Insert a quote after a passed guard, bumping the opportunity
    /// revision; a revision mismatch surfaces as a conflict.
    async fn insert_quote(&self, quote: NewQuote, expected_revision: i64) -> Result<Quote>;

    /// Fetch a quote without lines.
    async fn find_quote(&self, quote_id: i64) -> Result<Option<Quote>>;

    /// Fetch a quote with its ordered lines.
    async fn find_quote_with_lines(&self, quote_id: i64) -> Result<Option<QuoteWithLines>>;

    /// Apply a patch-style update.
    async fn update_quote(&self, quote_id: i64, update: QuoteUpdate) -> Result<Quote>;

    /// Append a line and recompute the quote total in the same write.
    async fn add_line(
        &self,
        quote_id: i64,
        description: String,
        quantity: f64,
        unit_price: f64,
        line_total: f64,
    ) -> Result<QuoteLine>;

    /// Transactionally mark the quote accepted and mirror acceptance onto
    /// the owning opportunity (`quote_status`, `acceptance_date`).
    async fn accept_quote(
        &self,
        quote_id: i64,
        acceptance: QuoteAcceptance,
        accepted_at: DateTime<Utc>,
    ) -> Result<Quote>;

    /// All quotes for an opportunity, with lines.
    async fn list_for_opportunity(&self, opportunity_id: i64) -> Result<Vec<QuoteWithLines>>;
}
