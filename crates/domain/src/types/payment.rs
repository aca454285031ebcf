//! Payment request types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_status_conversions;

/// Lifecycle of a payment request; settlement happens externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "Not Sent")]
    NotSent,
    Sent,
    Paid,
    Failed,
}

impl_status_conversions!(PaymentStatus {
    NotSent => "Not Sent",
    Sent => "Sent",
    Paid => "Paid",
    Failed => "Failed",
});

/// Append-only record of a request for customer payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub id: i64,
    pub opportunity_id: i64,
    pub property_id: Option<i64>,
    pub amount_requested: f64,
    pub payment_link_url: Option<String>,
    pub payment_link_sent_on: Option<DateTime<Utc>>,
    pub sent_by: Option<String>,
    pub status: PaymentStatus,
    pub paid_on: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
