//! Sales stage ladder checks
//!
//! The ladder is the ordered [`SalesStage`] enumeration; the check is
//! purely ordinal. Skipping forward over stages is allowed, retreating is
//! not, and unrecognized stage names never pass.

use std::str::FromStr;

use fieldline_domain::SalesStage;

/// Whether a move between the named stages is permitted.
///
/// Allowed when `to` is unset or equal to `from` (a no-op), or when both
/// names are recognized stages and the target does not precede the source
/// in the ladder.
pub fn stage_transition_allowed(from: &str, to: Option<&str>) -> bool {
    let Some(to) = to else { return true };
    if from == to {
        return true;
    }
    match (SalesStage::from_str(from), SalesStage::from_str(to)) {
        (Ok(from), Ok(to)) => from.allows_transition_to(to),
        _ => false,
    }
}
