//! Lead service - core business logic

use std::sync::Arc;

use fieldline_domain::{constants, FieldlineError, Lead, Result};
use tracing::info;

use super::ports::{LeadPatch, LeadRepository, NewLead, QualificationOutcome, QualificationPlan};

/// Lead service owning intake screening and the qualification flow.
pub struct LeadService {
    repository: Arc<dyn LeadRepository>,
}

impl LeadService {
    /// Create a new lead service.
    pub fn new(repository: Arc<dyn LeadRepository>) -> Self {
        Self { repository }
    }

    /// Create a lead, screening for potential duplicates on the way in.
    pub async fn create_lead(&self, mut lead: NewLead) -> Result<Lead> {
        let scan = self
            .repository
            .scan_duplicates(lead.email.as_deref(), lead.phone.as_deref(), None)
            .await?;

        lead.duplicate_status = if scan.any() {
            constants::DUPLICATE_STATUS_POTENTIAL.to_string()
        } else {
            constants::DUPLICATE_STATUS_UNIQUE.to_string()
        };
        lead.duplicate_of_lead_id = scan.matched_lead_id;
        lead.qualification_status = constants::LEAD_STATUS_NEW.to_string();

        self.repository.insert_lead(lead).await
    }

    /// Fetch a lead.
    pub async fn lead(&self, lead_id: i64) -> Result<Lead> {
        self.repository
            .find_lead(lead_id)
            .await?
            .ok_or_else(|| FieldlineError::NotFound("Lead not found".into()))
    }

    /// Apply a patch-style update.
    pub async fn update_lead(&self, lead_id: i64, patch: LeadPatch) -> Result<Lead> {
        self.lead(lead_id).await?;
        self.repository.update_lead(lead_id, patch).await
    }

    /// Re-run duplicate screening for an existing lead, ignoring itself.
    pub async fn dedupe_check(&self, lead_id: i64) -> Result<Lead> {
        let lead = self.lead(lead_id).await?;
        let scan = self
            .repository
            .scan_duplicates(lead.email.as_deref(), lead.phone.as_deref(), Some(lead_id))
            .await?;

        let (status, duplicate_of) = if scan.any() {
            (constants::DUPLICATE_STATUS_POTENTIAL, scan.matched_lead_id)
        } else {
            (constants::DUPLICATE_STATUS_UNIQUE, None)
        };
        self.repository.set_duplicate_status(lead_id, status, duplicate_of).await
    }

    /// Disqualify a lead; a reason is required.
    pub async fn disqualify(&self, lead_id: i64, reason: &str) -> Result<Lead> {
        if reason.is_empty() {
            return Err(FieldlineError::InvalidInput("reason must not be empty".into()));
        }
        self.lead(lead_id).await?;
        self.repository.disqualify(lead_id, reason).await
    }

    /// Qualify a lead into account, contact, property and opportunity.
    ///
    /// The whole write is one transaction; it fails with a conflict when
    /// an open opportunity already exists for the same property and
    /// product combination.
    pub async fn qualify(&self, lead_id: i64) -> Result<QualificationOutcome> {
        let lead = self.lead(lead_id).await?;

        let account_name = lead.display_name();
        let (first_name, last_name) = split_name(
            lead.full_name.as_deref().or(lead.company_name.as_deref()).unwrap_or_default(),
        );
        let property_name = lead
            .property_address_line1
            .clone()
            .unwrap_or_else(|| format!("Property for {account_name}"));

        let plan = QualificationPlan {
            lead_id: lead.id,
            account_name,
            first_name,
            last_name,
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            funding_type_id: lead.funding_type_id,
            product_offering_id: lead.interested_product_id,
            property_name,
            address_line1: lead.property_address_line1.clone(),
            address_line2: lead.property_address_line2.clone(),
            city: lead.property_city.clone(),
            postcode: lead.property_postcode.clone(),
            country: lead.property_country.clone(),
        };

        let outcome = self.repository.qualify(plan).await?;
        info!(
            lead_id,
            opportunity_id = outcome.opportunity.id,
            account_id = outcome.account.id,
            "lead qualified"
        );
        Ok(outcome)
    }
}

/// Split a free-form name into first/last parts with sensible fallbacks.
fn split_name(name: &str) -> (String, String) {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or("Unknown").to_string();
    let rest = parts.collect::<Vec<_>>().join(" ");
    let last = if rest.is_empty() { "Contact".to_string() } else { rest };
    (first, last)
}
