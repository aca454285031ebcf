//! Port interfaces for lead persistence

use async_trait::async_trait;
use fieldline_domain::{Account, Contact, Lead, Opportunity, Property, Result};

/// Fields for creating a lead. Duplicate screening fields are filled by
/// the service before the insert.
#[derive(Debug, Clone, Default)]
pub struct NewLead {
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
    pub duplicate_status: String,
    pub duplicate_of_lead_id: Option<i64>,
    pub qualification_status: String,
}

/// Patch-style lead update.
#[derive(Debug, Clone, Default)]
pub struct LeadPatch {
    pub full_name: Option<String>,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub funding_type_id: Option<i64>,
    pub interested_product_id: Option<i64>,
    pub notes: Option<String>,
}

/// Result of scanning for existing records with the same contact details.
#[derive(Debug, Clone, Default)]
pub struct DuplicateScan {
    pub matched_lead_id: Option<i64>,
    pub matched_contact_id: Option<i64>,
}

impl DuplicateScan {
    /// Whether anything matched.
    pub fn any(&self) -> bool {
        self.matched_lead_id.is_some() || self.matched_contact_id.is_some()
    }
}

/// Everything the qualification transaction needs, precomputed by the
/// service so the repository only executes writes.
#[derive(Debug, Clone)]
pub struct QualificationPlan {
    pub lead_id: i64,
    pub account_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub funding_type_id: Option<i64>,
    pub product_offering_id: Option<i64>,
    pub property_name: String,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
}

/// Rows touched by a successful qualification.
#[derive(Debug, Clone)]
pub struct QualificationOutcome {
    pub lead: Lead,
    pub account: Account,
    pub contact: Contact,
    pub property: Property,
    pub opportunity: Opportunity,
}

/// Trait for persisting leads and executing the qualification write.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Insert a lead.
    async fn insert_lead(&self, lead: NewLead) -> Result<Lead>;

    /// Fetch a lead.
    async fn find_lead(&self, lead_id: i64) -> Result<Option<Lead>>;

    /// Apply a patch-style update.
    async fn update_lead(&self, lead_id: i64, patch: LeadPatch) -> Result<Lead>;

    /// Scan leads and contacts for matching email/phone, optionally
    /// excluding one lead (used when re-checking an existing lead).
    async fn scan_duplicates(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
        exclude_lead_id: Option<i64>,
    ) -> Result<DuplicateScan>;

    /// Persist the duplicate screening outcome.
    async fn set_duplicate_status(
        &self,
        lead_id: i64,
        status: &str,
        duplicate_of_lead_id: Option<i64>,
    ) -> Result<Lead>;

    /// Mark a lead disqualified with the given reason.
    async fn disqualify(&self, lead_id: i64, reason: &str) -> Result<Lead>;

    /// Execute the qualification as one all-or-nothing transaction:
    /// find-or-create account, contact and property, refuse with a
    /// conflict when an open opportunity already exists for the same
    /// property and product, create the opportunity and mark the lead
    /// qualified. Any failure rolls back every prior write in the group.
    async fn qualify(&self, plan: QualificationPlan) -> Result<QualificationOutcome>;
}
