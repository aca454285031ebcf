//! Quote and quote line types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_status_conversions;

/// Quote lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteStatus {
    Draft,
    Sent,
    Accepted,
    Declined,
}

impl Default for QuoteStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl_status_conversions!(QuoteStatus {
    Draft => "Draft",
    Sent => "Sent",
    Accepted => "Accepted",
    Declined => "Declined",
});

/// A priced offer against one opportunity.
///
/// `total_amount` is the sum of line totals and is recomputed on every
/// line mutation; a quote cannot be accepted with zero lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub id: i64,
    pub opportunity_id: i64,
    pub property_id: Option<i64>,
    pub name: String,
    pub quote_type: String,
    pub status: QuoteStatus,
    pub total_amount: f64,
    pub sent_on: Option<DateTime<Utc>>,
    pub accepted_on: Option<DateTime<Utc>>,
    pub acceptance_method: Option<String>,
    pub customer_proof: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One priced line on a quote; `line_total = quantity * unit_price`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteLine {
    pub id: i64,
    pub quote_id: i64,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub line_total: f64,
}
