//! Database implementations

pub mod evidence_repository;
pub mod lead_repository;
pub mod manager;
pub mod opportunity_repository;
pub mod payment_repository;
pub mod qa_repository;
pub mod quote_repository;
pub mod work_order_repository;

mod patch;
mod rows;

pub use evidence_repository::*;
pub use lead_repository::*;
pub use manager::*;
pub use opportunity_repository::*;
pub use payment_repository::*;
pub use qa_repository::*;
pub use quote_repository::*;
pub use work_order_repository::*;
