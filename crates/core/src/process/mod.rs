//! Opportunity process engine
//!
//! Computes, from an opportunity's current relational state, which actions
//! are currently legal and which are blocked. The engine is read-only; the
//! guarded services in the sibling modules consult it before every write.

pub mod gates;
pub mod ports;
pub mod service;
pub mod stages;

pub use gates::DeliveryGate;
pub use service::ProcessEngine;
