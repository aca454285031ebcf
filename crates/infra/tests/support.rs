//! Shared test support for infra integration tests

use std::sync::Arc;

use fieldline_core::{
    EvidenceService, LeadService, OpportunityService, PaymentService, ProcessEngine, QaService,
    QuoteService, WorkOrderService,
};
use fieldline_infra::{
    DbManager, SqliteEvidenceRepository, SqliteLeadRepository, SqliteOpportunityRepository,
    SqlitePaymentRepository, SqliteQaRepository, SqliteQuoteRepository,
    SqliteWorkOrderRepository,
};
use tempfile::TempDir;

/// Fully wired service stack over a throwaway SQLite database.
pub struct TestCrm {
    pub db: Arc<DbManager>,
    pub engine: Arc<ProcessEngine>,
    pub leads: LeadService,
    pub quotes: QuoteService,
    pub work_orders: WorkOrderService,
    pub evidence: EvidenceService,
    pub qa: QaService,
    pub payments: PaymentService,
    pub opportunities: OpportunityService,
    _temp_dir: TempDir,
}

/// Build a migrated database and the full service stack on top of it.
pub fn setup() -> TestCrm {
    let temp_dir = TempDir::new().expect("tempdir created");
    let db_path = temp_dir.path().join("fieldline.db");

    let db = Arc::new(DbManager::new(&db_path, 4).expect("db manager created"));
    db.run_migrations().expect("migrations run");

    let opportunities_repo = Arc::new(SqliteOpportunityRepository::new(Arc::clone(&db)));
    let quotes_repo = Arc::new(SqliteQuoteRepository::new(Arc::clone(&db)));
    let work_orders_repo = Arc::new(SqliteWorkOrderRepository::new(Arc::clone(&db)));
    let evidence_repo = Arc::new(SqliteEvidenceRepository::new(Arc::clone(&db)));
    let qa_repo = Arc::new(SqliteQaRepository::new(Arc::clone(&db)));
    let payments_repo = Arc::new(SqlitePaymentRepository::new(Arc::clone(&db)));
    let leads_repo = Arc::new(SqliteLeadRepository::new(Arc::clone(&db)));

    let engine = Arc::new(ProcessEngine::new(opportunities_repo.clone()));

    TestCrm {
        leads: LeadService::new(leads_repo),
        quotes: QuoteService::new(quotes_repo, Arc::clone(&engine)),
        work_orders: WorkOrderService::new(
            work_orders_repo.clone(),
            opportunities_repo.clone(),
            Arc::clone(&engine),
        ),
        evidence: EvidenceService::new(
            evidence_repo,
            work_orders_repo.clone(),
            opportunities_repo.clone(),
        ),
        qa: QaService::new(qa_repo, work_orders_repo, opportunities_repo.clone()),
        payments: PaymentService::new(
            payments_repo,
            opportunities_repo.clone(),
            Arc::clone(&engine),
        ),
        opportunities: OpportunityService::new(opportunities_repo, Arc::clone(&engine)),
        engine,
        db,
        _temp_dir: temp_dir,
    }
}

impl TestCrm {
    /// Look up a seeded assessment path id by name.
    pub fn assessment_path_id(&self, name: &str) -> i64 {
        let conn = self.db.get_connection().expect("connection acquired");
        conn.query_row(
            "SELECT id FROM assessment_paths WHERE name = ?1",
            rusqlite::params![name],
            |row| row.get(0),
        )
        .expect("assessment path seeded")
    }
}
