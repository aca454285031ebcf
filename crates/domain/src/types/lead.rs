//! Lead intake and the customer entities created at qualification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inbound enquiry prior to qualification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub full_name: Option<String>,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub source_id: Option<i64>,
    pub campaign_id: Option<i64>,
    pub funding_type_id: Option<i64>,
    pub interested_product_id: Option<i64>,
    pub property_address_line1: Option<String>,
    pub property_address_line2: Option<String>,
    pub property_city: Option<String>,
    pub property_postcode: Option<String>,
    pub property_country: Option<String>,
    pub notes: Option<String>,
    pub qualification_status: String,
    pub disqualification_reason: Option<String>,
    pub duplicate_status: String,
    pub duplicate_of_lead_id: Option<i64>,
    pub qualified_account_id: Option<i64>,
    pub qualified_contact_id: Option<i64>,
    pub qualified_property_id: Option<i64>,
    pub qualified_opportunity_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    /// Best available display name for account creation.
    pub fn display_name(&self) -> String {
        self.company_name
            .clone()
            .or_else(|| self.full_name.clone())
            .unwrap_or_else(|| format!("Lead-{}", self.id))
    }
}

/// Customer account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub funding_type_id: Option<i64>,
    pub account_type: String,
    pub created_at: DateTime<Utc>,
}

/// Person attached to an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub account_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Physical site work is delivered against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: i64,
    pub name: String,
    pub account_id: i64,
    pub primary_contact_id: Option<i64>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
    pub created_from_lead_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}
