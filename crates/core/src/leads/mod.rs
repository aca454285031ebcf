//! Lead intake and qualification

pub mod ports;
pub mod service;

pub use service::LeadService;
