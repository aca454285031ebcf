//! Quote service - core business logic

use std::sync::Arc;

use chrono::Utc;
use fieldline_domain::{FieldlineError, Quote, QuoteLine, Result};
use tracing::info;

use super::ports::{NewQuote, NewQuoteLine, QuoteAcceptance, QuoteRepository, QuoteUpdate};
use crate::process::ports::QuoteWithLines;
use crate::process::ProcessEngine;

/// Quote service enforcing the quote-creation and acceptance guards.
pub struct QuoteService {
    repository: Arc<dyn QuoteRepository>,
    engine: Arc<ProcessEngine>,
}

impl QuoteService {
    /// Create a new quote service.
    pub fn new(repository: Arc<dyn QuoteRepository>, engine: Arc<ProcessEngine>) -> Self {
        Self { repository, engine }
    }

    /// Create a quote for an opportunity.
    ///
    /// # Errors
    /// [`FieldlineError::Blocked`] when the process rules refuse quote
    /// creation; the error carries the current blocker list.
    pub async fn create_quote(&self, quote: NewQuote) -> Result<Quote> {
        let process = self.engine.process_status(quote.opportunity_id).await?;
        if !process.can_create_quote {
            return Err(FieldlineError::blocked(
                "Quote creation blocked by process rules.",
                process.blocked_reasons,
            ));
        }

        let created = self.repository.insert_quote(quote, process.revision).await?;
        info!(quote_id = created.id, opportunity_id = created.opportunity_id, "quote created");
        Ok(created)
    }

    /// Append a line to a quote; the quote total is recomputed in the same
    /// write.
    pub async fn add_line(&self, quote_id: i64, line: NewQuoteLine) -> Result<QuoteLine> {
        if line.quantity <= 0.0 {
            return Err(FieldlineError::InvalidInput("quantity must be positive".into()));
        }
        if line.unit_price < 0.0 {
            return Err(FieldlineError::InvalidInput("unit price must not be negative".into()));
        }
        if self.repository.find_quote(quote_id).await?.is_none() {
            return Err(FieldlineError::NotFound("Quote not found".into()));
        }

        let line_total = line.quantity * line.unit_price;
        self.repository
            .add_line(quote_id, line.description, line.quantity, line.unit_price, line_total)
            .await
    }

    /// Apply a patch-style update to a quote.
    pub async fn update_quote(&self, quote_id: i64, update: QuoteUpdate) -> Result<Quote> {
        if self.repository.find_quote(quote_id).await?.is_none() {
            return Err(FieldlineError::NotFound("Quote not found".into()));
        }
        self.repository.update_quote(quote_id, update).await
    }

    /// Accept a quote.
    ///
    /// A quote cannot be accepted with zero lines. On success the quote
    /// becomes Accepted and the opportunity's `quote_status` and
    /// `acceptance_date` are updated in the same transaction.
    pub async fn accept_quote(&self, quote_id: i64, acceptance: QuoteAcceptance) -> Result<Quote> {
        let quote = self
            .repository
            .find_quote_with_lines(quote_id)
            .await?
            .ok_or_else(|| FieldlineError::NotFound("Quote not found".into()))?;

        if quote.lines.is_empty() {
            let message = "Cannot accept quote without at least one line.";
            return Err(FieldlineError::blocked(message, vec![message.to_string()]));
        }

        let accepted = self.repository.accept_quote(quote_id, acceptance, Utc::now()).await?;
        info!(quote_id, opportunity_id = accepted.opportunity_id, "quote accepted");
        Ok(accepted)
    }

    /// Fetch a quote with its lines.
    pub async fn quote_with_lines(&self, quote_id: i64) -> Result<QuoteWithLines> {
        self.repository
            .find_quote_with_lines(quote_id)
            .await?
            .ok_or_else(|| FieldlineError::NotFound("Quote not found".into()))
    }

    /// All quotes for an opportunity.
    pub async fn quotes_for_opportunity(&self, opportunity_id: i64) -> Result<Vec<QuoteWithLines>> {
        self.repository.list_for_opportunity(opportunity_id).await
    }
}
