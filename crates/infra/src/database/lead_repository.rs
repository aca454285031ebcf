//! SQLite-backed lead repository.
//!
//! Owns the one multi-row transactional write in the system: lead
//! qualification. Account, contact and property are found or created,
//! the open-opportunity conflict check runs against the resolved
//! property, and the opportunity plus lead update land in the same
//! transaction; any failure rolls the whole group back.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use fieldline_core::leads::ports::{
    DuplicateScan, LeadPatch, LeadRepository as LeadRepositoryPort, NewLead, QualificationOutcome,
    QualificationPlan,
};
use fieldline_domain::{
    constants, Account, Contact, FieldlineError, Lead, Property, Result as DomainResult,
};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::task;

use super::manager::DbManager;
use super::opportunity_repository::query_opportunity;
use super::patch::UpdateBuilder;
use super::rows::{
    map_account_row, map_contact_row, map_lead_row, map_property_row, LEAD_COLUMNS,
};
use crate::errors::{map_join_error, map_sql_error};

const ACCOUNT_COLUMNS: &str = "id, name, email, phone, funding_type_id, account_type, created_at";
const CONTACT_COLUMNS: &str = "id, account_id, first_name, last_name, email, mobile, created_at";
const PROPERTY_COLUMNS: &str = "id, name, account_id, primary_contact_id, address_line1, \
    address_line2, city, postcode, country, created_from_lead_id, created_at";

/// Lead repository backed by SQLite.
pub struct SqliteLeadRepository {
    db: Arc<DbManager>,
}

impl SqliteLeadRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LeadRepositoryPort for SqliteLeadRepository {
    async fn insert_lead(&self, lead: NewLead) -> DomainResult<Lead> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO leads (full_name, company_name, phone, email, source_id, \
                 campaign_id, funding_type_id, interested_product_id, property_address_line1, \
                 property_address_line2, property_city, property_postcode, property_country, \
                 notes, qualification_status, duplicate_status, duplicate_of_lead_id, \
                 created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, \
                 ?16, ?17, ?18)",
                params![
                    lead.full_name,
                    lead.company_name,
                    lead.phone,
                    lead.email,
                    lead.source_id,
                    lead.campaign_id,
                    lead.funding_type_id,
                    lead.interested_product_id,
                    lead.property_address_line1,
                    lead.property_address_line2,
                    lead.property_city,
                    lead.property_postcode,
                    lead.property_country,
                    lead.notes,
                    lead.qualification_status,
                    lead.duplicate_status,
                    lead.duplicate_of_lead_id,
                    Utc::now().timestamp(),
                ],
            )
            .map_err(map_sql_error)?;
            let id = conn.last_insert_rowid();
            query_lead(&conn, id)?
                .ok_or_else(|| FieldlineError::NotFound("Lead not found".into()))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_lead(&self, lead_id: i64) -> DomainResult<Option<Lead>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            query_lead(&conn, lead_id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update_lead(&self, lead_id: i64, patch: LeadPatch) -> DomainResult<Lead> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;

            let mut builder = UpdateBuilder::new();
            builder.set_opt("full_name", patch.full_name);
            builder.set_opt("company_name", patch.company_name);
            builder.set_opt("phone", patch.phone);
            builder.set_opt("email", patch.email);
            builder.set_opt("funding_type_id", patch.funding_type_id);
            builder.set_opt("interested_product_id", patch.interested_product_id);
            builder.set_opt("notes", patch.notes);
            if !builder.is_empty() {
                builder.execute(&conn, "leads", lead_id)?;
            }

            query_lead(&conn, lead_id)?
                .ok_or_else(|| FieldlineError::NotFound("Lead not found".into()))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn scan_duplicates(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
        exclude_lead_id: Option<i64>,
    ) -> DomainResult<DuplicateScan> {
        let db = Arc::clone(&self.db);
        let email = email.map(str::to_string);
        let phone = phone.map(str::to_string);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;

            let matched_lead_id: Option<i64> = conn
                .query_row(
                    "SELECT id FROM leads \
                     WHERE ((?1 IS NOT NULL AND email = ?1) OR (?2 IS NOT NULL AND phone = ?2)) \
                     AND (?3 IS NULL OR id != ?3) \
                     ORDER BY id DESC LIMIT 1",
                    params![email, phone, exclude_lead_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(map_sql_error)?;

            let matched_contact_id: Option<i64> = conn
                .query_row(
                    "SELECT id FROM contacts \
                     WHERE (?1 IS NOT NULL AND email = ?1) OR (?2 IS NOT NULL AND mobile = ?2) \
                     ORDER BY id DESC LIMIT 1",
                    params![email, phone],
                    |row| row.get(0),
                )
                .optional()
                .map_err(map_sql_error)?;

            Ok(DuplicateScan { matched_lead_id, matched_contact_id })
        })
        .await
        .map_err(map_join_error)?
    }

    async fn set_duplicate_status(
        &self,
        lead_id: i64,
        status: &str,
        duplicate_of_lead_id: Option<i64>,
    ) -> DomainResult<Lead> {
        let db = Arc::clone(&self.db);
        let status = status.to_string();
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE leads SET duplicate_status = ?1, duplicate_of_lead_id = ?2 WHERE id = ?3",
                params![status, duplicate_of_lead_id, lead_id],
            )
            .map_err(map_sql_error)?;
            query_lead(&conn, lead_id)?
                .ok_or_else(|| FieldlineError::NotFound("Lead not found".into()))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn disqualify(&self, lead_id: i64, reason: &str) -> DomainResult<Lead> {
        let db = Arc::clone(&self.db);
        let reason = reason.to_string();
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE leads SET qualification_status = ?1, disqualification_reason = ?2 \
                 WHERE id = ?3",
                params![constants::LEAD_STATUS_DISQUALIFIED, reason, lead_id],
            )
            .map_err(map_sql_error)?;
            query_lead(&conn, lead_id)?
                .ok_or_else(|| FieldlineError::NotFound("Lead not found".into()))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn qualify(&self, plan: QualificationPlan) -> DomainResult<QualificationOutcome> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;
            let now = Utc::now().timestamp();

            let account = find_or_create_account(&tx, &plan, now)?;
            let contact = find_or_create_contact(&tx, &plan, account.id, now)?;
            let property = find_or_create_property(&tx, &plan, account.id, contact.id, now)?;

            let open_exists: bool = tx
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM opportunities \
                     WHERE property_id = ?1 \
                     AND (product_offering_id IS ?2) \
                     AND actual_close_date IS NULL)",
                    params![property.id, plan.product_offering_id],
                    |row| row.get(0),
                )
                .map_err(map_sql_error)?;
            if open_exists {
                return Err(FieldlineError::Conflict(
                    "Active opportunity already exists for this property/product.".into(),
                ));
            }

            tx.execute(
                "INSERT INTO opportunities (name, account_id, primary_contact_id, property_id, \
                 funding_type_id, product_offering_id, sales_stage, quote_status, \
                 delivery_status, evidence_status, qa_status, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'New', ?7, ?8, ?9, ?10, ?11)",
                params![
                    format!("{} - {}", plan.account_name, property.name),
                    account.id,
                    contact.id,
                    property.id,
                    plan.funding_type_id,
                    plan.product_offering_id,
                    constants::OPPORTUNITY_QUOTE_STATUS_DRAFT,
                    constants::OPPORTUNITY_DELIVERY_NOT_STARTED,
                    constants::OPPORTUNITY_EVIDENCE_NOT_REQUIRED,
                    constants::OPPORTUNITY_QA_NOT_STARTED,
                    now,
                ],
            )
            .map_err(map_sql_error)?;
            let opportunity_id = tx.last_insert_rowid();

            tx.execute(
                "UPDATE leads SET qualification_status = ?1, qualified_account_id = ?2, \
                 qualified_contact_id = ?3, qualified_property_id = ?4, \
                 qualified_opportunity_id = ?5 WHERE id = ?6",
                params![
                    constants::LEAD_STATUS_QUALIFIED,
                    account.id,
                    contact.id,
                    property.id,
                    opportunity_id,
                    plan.lead_id,
                ],
            )
            .map_err(map_sql_error)?;

            let opportunity = query_opportunity(&tx, opportunity_id)?
                .ok_or_else(|| FieldlineError::NotFound("Opportunity not found".into()))?;
            let lead = query_lead(&tx, plan.lead_id)?
                .ok_or_else(|| FieldlineError::NotFound("Lead not found".into()))?;

            tx.commit().map_err(map_sql_error)?;
            Ok(QualificationOutcome { lead, account, contact, property, opportunity })
        })
        .await
        .map_err(map_join_error)?
    }
}

fn find_or_create_account(
    conn: &Connection,
    plan: &QualificationPlan,
    now: i64,
) -> DomainResult<Account> {
    let existing = conn
        .query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE name = ?1 ORDER BY id LIMIT 1"),
            params![plan.account_name],
            map_account_row,
        )
        .optional()
        .map_err(map_sql_error)?;
    if let Some(account) = existing {
        return Ok(account);
    }

    conn.execute(
        "INSERT INTO accounts (name, email, phone, funding_type_id, account_type, created_at) \
         VALUES (?1, ?2, ?3, ?4, 'Customer', ?5)",
        params![plan.account_name, plan.email, plan.phone, plan.funding_type_id, now],
    )
    .map_err(map_sql_error)?;
    let id = conn.last_insert_rowid();
    conn.query_row(
        &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
        params![id],
        map_account_row,
    )
    .map_err(map_sql_error)
}

fn find_or_create_contact(
    conn: &Connection,
    plan: &QualificationPlan,
    account_id: i64,
    now: i64,
) -> DomainResult<Contact> {
    let existing = conn
        .query_row(
            &format!(
                "SELECT {CONTACT_COLUMNS} FROM contacts WHERE account_id = ?1 \
                 AND ((?2 IS NOT NULL AND email = ?2) OR (?3 IS NOT NULL AND mobile = ?3)) \
                 ORDER BY id LIMIT 1"
            ),
            params![account_id, plan.email, plan.phone],
            map_contact_row,
        )
        .optional()
        .map_err(map_sql_error)?;
    if let Some(contact) = existing {
        return Ok(contact);
    }

    conn.execute(
        "INSERT INTO contacts (account_id, first_name, last_name, email, mobile, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![account_id, plan.first_name, plan.last_name, plan.email, plan.phone, now],
    )
    .map_err(map_sql_error)?;
    let id = conn.last_insert_rowid();
    conn.query_row(
        &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1"),
        params![id],
        map_contact_row,
    )
    .map_err(map_sql_error)
}

fn find_or_create_property(
    conn: &Connection,
    plan: &QualificationPlan,
    account_id: i64,
    contact_id: i64,
    now: i64,
) -> DomainResult<Property> {
    // Re-qualification for the same address must converge on the same
    // property row so the open-opportunity check can see prior engagements.
    if plan.address_line1.is_some() {
        let existing = conn
            .query_row(
                &format!(
                    "SELECT {PROPERTY_COLUMNS} FROM properties \
                     WHERE account_id = ?1 AND address_line1 = ?2 ORDER BY id LIMIT 1"
                ),
                params![account_id, plan.address_line1],
                map_property_row,
            )
            .optional()
            .map_err(map_sql_error)?;
        if let Some(property) = existing {
            return Ok(property);
        }
    }

    conn.execute(
        "INSERT INTO properties (name, account_id, primary_contact_id, address_line1, \
         address_line2, city, postcode, country, created_from_lead_id, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            plan.property_name,
            account_id,
            contact_id,
            plan.address_line1,
            plan.address_line2,
            plan.city,
            plan.postcode,
            plan.country,
            plan.lead_id,
            now,
        ],
    )
    .map_err(map_sql_error)?;
    let id = conn.last_insert_rowid();
    conn.query_row(
        &format!("SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = ?1"),
        params![id],
        map_property_row,
    )
    .map_err(map_sql_error)
}

fn query_lead(conn: &Connection, lead_id: i64) -> DomainResult<Option<Lead>> {
    conn.query_row(
        &format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?1"),
        params![lead_id],
        map_lead_row,
    )
    .optional()
    .map_err(map_sql_error)
}
