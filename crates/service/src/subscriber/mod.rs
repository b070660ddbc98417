//! Businesses and professionals listed on the portal.

pub mod repository;
pub mod service;

pub use repository::{DirectoryFilter, MemorySubscriberRepository, SeaOrmSubscriberRepository, SubscriberRepository};
pub use service::{ProfileUpdate, SubscriberInput, SubscriberService};
