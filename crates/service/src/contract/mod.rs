//! Plan changes: paid upgrades wait for activation, downgrades apply at once.

pub mod repository;
pub mod service;

pub use repository::{ContractRepository, MemoryContractRepository, SeaOrmContractRepository};
pub use service::{ContractService, PlanChangeRequest};
