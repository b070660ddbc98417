//! Service layer for the city portal: content, directory, catalog, checkout
//! and accounts on top of the `models` entities.
//! - Repository traits with PostgreSQL (SeaORM) and in-memory backends.
//! - Writes tolerate optional columns missing from older databases.
//! - Framework-independent; the HTTP layer lives in the `server` crate.

pub mod errors;
pub mod schema;
pub mod slug;
pub mod plans;
pub mod pagination;
pub mod content;
pub mod storage;
pub mod category;
pub mod news;
pub mod events;
pub mod subscriber;
pub mod product;
pub mod comment;
pub mod order;
pub mod contract;
pub mod audit;
pub mod local_store;
pub mod address;
pub mod auth;
pub mod runtime;
#[cfg(test)]
pub mod test_support;
#[cfg(test)]
mod seaorm_tests;

pub use errors::ServiceError;
pub use pagination::Pagination;
