//! Shared row mappers and SQL value helpers
//!
//! Timestamps are persisted as integer epoch seconds; status enums as
//! their display labels. Mappers read columns in the order of the
//! corresponding `*_COLUMNS` constant so every query stays consistent.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use fieldline_domain::{
    Account, AssessmentPath, AssessmentPathKind, Contact, EvidenceItem, EvidenceRequirement, Lead,
    Opportunity, PaymentRequest, Property, QaChecklistItem, QaResult, Quote, QuoteLine,
    TimelineNote, WorkOrder, XeroInvoiceLink,
};
use rusqlite::types::Type;
use rusqlite::Row;

pub(crate) const OPPORTUNITY_COLUMNS: &str = "id, name, account_id, primary_contact_id, \
    property_id, funding_type_id, product_offering_id, assessment_path_id, sales_stage, \
    requires_survey, estimated_value, quote_status, delivery_status, evidence_status, qa_status, \
    acceptance_date, target_install_window_start, target_install_window_end, payment_requested, \
    payment_requested_on, payment_link_sent, payment_link_sent_on, xero_invoice_id, \
    xero_invoice_number, xero_invoice_status, actual_close_date, close_blocked_reason, revision, \
    created_at";

pub(crate) const QUOTE_COLUMNS: &str = "id, opportunity_id, property_id, name, quote_type, \
    status, total_amount, sent_on, accepted_on, acceptance_method, customer_proof, created_at";

pub(crate) const QUOTE_LINE_COLUMNS: &str =
    "id, quote_id, description, quantity, unit_price, line_total";

/// Work order columns; queries must join `work_order_types` and select its
/// name as the final column.
pub(crate) const WORK_ORDER_COLUMNS: &str = "w.id, w.opportunity_id, w.property_id, \
    w.funding_type_id, w.status, w.substatus, w.completion_blocked_reason, w.evidence_required, \
    w.evidence_gate_status, w.qa_gate_status, w.scheduled_start, w.scheduled_end, \
    w.actual_start, w.actual_end, w.created_at, t.name";

/// Requirement columns; queries must left-join `work_order_types` and
/// select its name as the final column.
pub(crate) const REQUIREMENT_COLUMNS: &str = "r.id, r.name, r.product_offering_id, \
    r.funding_type_id, r.evidence_category_id, r.required_count, r.mandatory, r.sort_order, \
    r.is_active, t.name";

pub(crate) const EVIDENCE_ITEM_COLUMNS: &str = "id, name, opportunity_id, work_order_id, \
    property_id, requirement_id, evidence_type_id, status, file_path, captured_on, reviewer, \
    reviewed_on, rejection_reason, notes, created_at";

pub(crate) const QA_RESULT_COLUMNS: &str =
    "id, opportunity_id, work_order_id, checklist_item_id, result, notes, checked_by, checked_on";

pub(crate) const PAYMENT_REQUEST_COLUMNS: &str = "id, opportunity_id, property_id, \
    amount_requested, payment_link_url, payment_link_sent_on, sent_by, payment_status, paid_on, \
    notes, created_at";

pub(crate) const LEAD_COLUMNS: &str = "id, full_name, company_name, phone, email, source_id, \
    campaign_id, funding_type_id, interested_product_id, property_address_line1, \
    property_address_line2, property_city, property_postcode, property_country, notes, \
    qualification_status, disqualification_reason, duplicate_status, duplicate_of_lead_id, \
    qualified_account_id, qualified_contact_id, qualified_property_id, \
    qualified_opportunity_id, created_at";

pub(crate) const INVOICE_LINK_COLUMNS: &str = "id, opportunity_id, xero_invoice_id, \
    xero_invoice_number, xero_status, total, sync_error, last_synced_on";

/// Convert an epoch-second column into a UTC timestamp.
pub(crate) fn timestamp_from(index: usize, value: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp(value, 0).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Integer,
            format!("timestamp {value} out of range").into(),
        )
    })
}

/// Convert an optional epoch-second column into an optional timestamp.
pub(crate) fn opt_timestamp_from(
    index: usize,
    value: Option<i64>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.map(|v| timestamp_from(index, v)).transpose()
}

/// Parse a status label column into its enum.
pub(crate) fn parse_label<T>(index: usize, value: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    value.parse().map_err(|err: String| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, err.into())
    })
}

/// Parse an optional status label column into its optional enum.
pub(crate) fn parse_opt_label<T>(index: usize, value: Option<String>) -> rusqlite::Result<Option<T>>
where
    T: FromStr<Err = String>,
{
    value.map(|v| parse_label(index, &v)).transpose()
}

pub(crate) fn map_opportunity_row(row: &Row<'_>) -> rusqlite::Result<Opportunity> {
    Ok(Opportunity {
        id: row.get(0)?,
        name: row.get(1)?,
        account_id: row.get(2)?,
        primary_contact_id: row.get(3)?,
        property_id: row.get(4)?,
        funding_type_id: row.get(5)?,
        product_offering_id: row.get(6)?,
        assessment_path_id: row.get(7)?,
        sales_stage: parse_label(8, &row.get::<_, String>(8)?)?,
        requires_survey: row.get(9)?,
        estimated_value: row.get(10)?,
        quote_status: row.get(11)?,
        delivery_status: row.get(12)?,
        evidence_status: row.get(13)?,
        qa_status: row.get(14)?,
        acceptance_date: opt_timestamp_from(15, row.get(15)?)?,
        target_install_window_start: opt_timestamp_from(16, row.get(16)?)?,
        target_install_window_end: opt_timestamp_from(17, row.get(17)?)?,
        payment_requested: row.get(18)?,
        payment_requested_on: opt_timestamp_from(19, row.get(19)?)?,
        payment_link_sent: row.get(20)?,
        payment_link_sent_on: opt_timestamp_from(21, row.get(21)?)?,
        xero_invoice_id: row.get(22)?,
        xero_invoice_number: row.get(23)?,
        xero_invoice_status: row.get(24)?,
        actual_close_date: opt_timestamp_from(25, row.get(25)?)?,
        close_blocked_reason: row.get(26)?,
        revision: row.get(27)?,
        created_at: timestamp_from(28, row.get(28)?)?,
    })
}

pub(crate) fn map_quote_row(row: &Row<'_>) -> rusqlite::Result<Quote> {
    Ok(Quote {
        id: row.get(0)?,
        opportunity_id: row.get(1)?,
        property_id: row.get(2)?,
        name: row.get(3)?,
        quote_type: row.get(4)?,
        status: parse_label(5, &row.get::<_, String>(5)?)?,
        total_amount: row.get(6)?,
        sent_on: opt_timestamp_from(7, row.get(7)?)?,
        accepted_on: opt_timestamp_from(8, row.get(8)?)?,
        acceptance_method: row.get(9)?,
        customer_proof: row.get(10)?,
        created_at: timestamp_from(11, row.get(11)?)?,
    })
}

pub(crate) fn map_quote_line_row(row: &Row<'_>) -> rusqlite::Result<QuoteLine> {
    Ok(QuoteLine {
        id: row.get(0)?,
        quote_id: row.get(1)?,
        description: row.get(2)?,
        quantity: row.get(3)?,
        unit_price: row.get(4)?,
        line_total: row.get(5)?,
    })
}

pub(crate) fn map_work_order_row(row: &Row<'_>) -> rusqlite::Result<WorkOrder> {
    Ok(WorkOrder {
        id: row.get(0)?,
        opportunity_id: row.get(1)?,
        property_id: row.get(2)?,
        funding_type_id: row.get(3)?,
        status: row.get(4)?,
        substatus: row.get(5)?,
        completion_blocked_reason: row.get(6)?,
        evidence_required: row.get(7)?,
        evidence_gate_status: row.get(8)?,
        qa_gate_status: row.get(9)?,
        scheduled_start: opt_timestamp_from(10, row.get(10)?)?,
        scheduled_end: opt_timestamp_from(11, row.get(11)?)?,
        actual_start: opt_timestamp_from(12, row.get(12)?)?,
        actual_end: opt_timestamp_from(13, row.get(13)?)?,
        created_at: timestamp_from(14, row.get(14)?)?,
        kind: parse_label(15, &row.get::<_, String>(15)?)?,
    })
}

pub(crate) fn map_requirement_row(row: &Row<'_>) -> rusqlite::Result<EvidenceRequirement> {
    Ok(EvidenceRequirement {
        id: row.get(0)?,
        name: row.get(1)?,
        product_offering_id: row.get(2)?,
        funding_type_id: row.get(3)?,
        evidence_category_id: row.get(4)?,
        required_count: row.get(5)?,
        mandatory: row.get(6)?,
        sort_order: row.get(7)?,
        is_active: row.get(8)?,
        work_order_kind: parse_opt_label(9, row.get(9)?)?,
    })
}

pub(crate) fn map_evidence_item_row(row: &Row<'_>) -> rusqlite::Result<EvidenceItem> {
    Ok(EvidenceItem {
        id: row.get(0)?,
        name: row.get(1)?,
        opportunity_id: row.get(2)?,
        work_order_id: row.get(3)?,
        property_id: row.get(4)?,
        requirement_id: row.get(5)?,
        evidence_type_id: row.get(6)?,
        status: parse_label(7, &row.get::<_, String>(7)?)?,
        file_path: row.get(8)?,
        captured_on: opt_timestamp_from(9, row.get(9)?)?,
        reviewer: row.get(10)?,
        reviewed_on: opt_timestamp_from(11, row.get(11)?)?,
        rejection_reason: row.get(12)?,
        notes: row.get(13)?,
        created_at: timestamp_from(14, row.get(14)?)?,
    })
}

pub(crate) fn map_qa_result_row(row: &Row<'_>) -> rusqlite::Result<QaResult> {
    Ok(QaResult {
        id: row.get(0)?,
        opportunity_id: row.get(1)?,
        work_order_id: row.get(2)?,
        checklist_item_id: row.get(3)?,
        outcome: parse_label(4, &row.get::<_, String>(4)?)?,
        notes: row.get(5)?,
        checked_by: row.get(6)?,
        checked_on: opt_timestamp_from(7, row.get(7)?)?,
    })
}

pub(crate) fn map_qa_checklist_item_row(row: &Row<'_>) -> rusqlite::Result<QaChecklistItem> {
    Ok(QaChecklistItem {
        id: row.get(0)?,
        checklist_id: row.get(1)?,
        item_text: row.get(2)?,
        mandatory: row.get(3)?,
        sort_order: row.get(4)?,
    })
}

pub(crate) fn map_payment_request_row(row: &Row<'_>) -> rusqlite::Result<PaymentRequest> {
    Ok(PaymentRequest {
        id: row.get(0)?,
        opportunity_id: row.get(1)?,
        property_id: row.get(2)?,
        amount_requested: row.get(3)?,
        payment_link_url: row.get(4)?,
        payment_link_sent_on: opt_timestamp_from(5, row.get(5)?)?,
        sent_by: row.get(6)?,
        status: parse_label(7, &row.get::<_, String>(7)?)?,
        paid_on: opt_timestamp_from(8, row.get(8)?)?,
        notes: row.get(9)?,
        created_at: timestamp_from(10, row.get(10)?)?,
    })
}

pub(crate) fn map_lead_row(row: &Row<'_>) -> rusqlite::Result<Lead> {
    Ok(Lead {
        id: row.get(0)?,
        full_name: row.get(1)?,
        company_name: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        source_id: row.get(5)?,
        campaign_id: row.get(6)?,
        funding_type_id: row.get(7)?,
        interested_product_id: row.get(8)?,
        property_address_line1: row.get(9)?,
        property_address_line2: row.get(10)?,
        property_city: row.get(11)?,
        property_postcode: row.get(12)?,
        property_country: row.get(13)?,
        notes: row.get(14)?,
        qualification_status: row.get(15)?,
        disqualification_reason: row.get(16)?,
        duplicate_status: row.get(17)?,
        duplicate_of_lead_id: row.get(18)?,
        qualified_account_id: row.get(19)?,
        qualified_contact_id: row.get(20)?,
        qualified_property_id: row.get(21)?,
        qualified_opportunity_id: row.get(22)?,
        created_at: timestamp_from(23, row.get(23)?)?,
    })
}

pub(crate) fn map_account_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        funding_type_id: row.get(4)?,
        account_type: row.get(5)?,
        created_at: timestamp_from(6, row.get(6)?)?,
    })
}

pub(crate) fn map_contact_row(row: &Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        account_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        mobile: row.get(5)?,
        created_at: timestamp_from(6, row.get(6)?)?,
    })
}

pub(crate) fn map_property_row(row: &Row<'_>) -> rusqlite::Result<Property> {
    Ok(Property {
        id: row.get(0)?,
        name: row.get(1)?,
        account_id: row.get(2)?,
        primary_contact_id: row.get(3)?,
        address_line1: row.get(4)?,
        address_line2: row.get(5)?,
        city: row.get(6)?,
        postcode: row.get(7)?,
        country: row.get(8)?,
        created_from_lead_id: row.get(9)?,
        created_at: timestamp_from(10, row.get(10)?)?,
    })
}

pub(crate) fn map_invoice_link_row(row: &Row<'_>) -> rusqlite::Result<XeroInvoiceLink> {
    Ok(XeroInvoiceLink {
        id: row.get(0)?,
        opportunity_id: row.get(1)?,
        xero_invoice_id: row.get(2)?,
        xero_invoice_number: row.get(3)?,
        xero_status: row.get(4)?,
        total: row.get(5)?,
        sync_error: row.get(6)?,
        last_synced_on: opt_timestamp_from(7, row.get(7)?)?,
    })
}

pub(crate) fn map_timeline_row(row: &Row<'_>) -> rusqlite::Result<TimelineNote> {
    Ok(TimelineNote {
        id: row.get(0)?,
        opportunity_id: row.get(1)?,
        note: row.get(2)?,
        created_by: row.get(3)?,
        created_at: timestamp_from(4, row.get(4)?)?,
    })
}

pub(crate) fn map_assessment_path_row(row: &Row<'_>) -> rusqlite::Result<AssessmentPath> {
    Ok(AssessmentPath {
        id: row.get(0)?,
        kind: parse_label::<AssessmentPathKind>(1, &row.get::<_, String>(1)?)?,
        requires_survey: row.get(2)?,
        is_active: row.get(3)?,
    })
}
