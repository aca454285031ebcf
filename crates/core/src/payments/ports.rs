//! Port interfaces for payment request persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldline_domain::{PaymentRequest, PaymentStatus, Result};

/// Fields for creating a payment request.
#[derive(Debug, Clone)]
pub struct NewPaymentRequest {
    pub amount_requested: f64,
    pub payment_link_url: Option<String>,
    pub sent_by: Option<String>,
    pub notes: Option<String>,
}

/// Trait for persisting payment requests.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert a payment request and mark the opportunity as
    /// payment-requested in the same transaction. Bumps the opportunity
    /// revision; a mismatch surfaces as a conflict.
    async fn insert_request(
        &self,
        opportunity_id: i64,
        property_id: Option<i64>,
        request: NewPaymentRequest,
        requested_at: DateTime<Utc>,
        expected_revision: i64,
    ) -> Result<PaymentRequest>;

    /// Fetch a payment request.
    async fn find_request(&self, request_id: i64) -> Result<Option<PaymentRequest>>;

    /// Record external settlement progress on a request.
    async fn update_status(
        &self,
        request_id: i64,
        status: PaymentStatus,
        paid_on: Option<DateTime<Utc>>,
        notes: Option<String>,
    ) -> Result<PaymentRequest>;

    /// All payment requests for an opportunity, newest first.
    async fn list_for_opportunity(&self, opportunity_id: i64) -> Result<Vec<PaymentRequest>>;
}
