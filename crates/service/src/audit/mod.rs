//! Append-only log of admin actions.

pub mod repository;
pub mod service;

pub use repository::{AuditRepository, MemoryAuditRepository, SeaOrmAuditRepository};
pub use service::{AuditEntry, AuditService};
