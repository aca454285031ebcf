//! Process engine decision result

use serde::{Deserialize, Serialize};

use super::opportunity::{AssessmentPathKind, SalesStage};

/// Snapshot of what an opportunity may do next.
///
/// Computed fresh on every read from the opportunity's relational state;
/// never cached or persisted, since any of several independently mutated
/// child tables can invalidate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessStatus {
    pub opportunity_id: i64,
    pub current_stage: SalesStage,
    pub assessment_path: Option<AssessmentPathKind>,
    pub requires_survey: bool,
    pub has_accepted_quote: bool,
    pub has_completed_survey: bool,
    pub can_create_quote: bool,
    pub can_create_survey_work_order: bool,
    pub can_create_install_work_order: bool,
    pub can_request_payment: bool,
    pub can_close: bool,
    /// Ordered, deduplicated human-readable blockers.
    pub blocked_reasons: Vec<String>,
    /// Ordered, deduplicated suggested next actions.
    pub next_actions: Vec<String>,
    /// Opportunity revision observed while deciding; guarded writes pass
    /// this back so concurrent mutations surface as conflicts.
    pub revision: i64,
}
