//! Table backends for the service repositories.
//!
//! `seaorm` talks to PostgreSQL; `memory` keeps rows in process for tests
//! and demo mode and reproduces the driver's error messages so the schema
//! fallbacks behave the same on both. `json_map_store` persists small maps
//! as JSON files for the local collections.

pub mod json_map_store;
pub mod memory;
pub mod seaorm;

use uuid::Uuid;

use models::{audit_log, category, comment, contract, event, news, order, order_item, product, subscriber};

/// A stored row addressed by UUID, optionally carrying a unique slug.
pub trait Row: Clone + Send + Sync + 'static {
    fn row_id(&self) -> Uuid;
    fn slug(&self) -> Option<&str> { None }
}

macro_rules! slugged_row {
    ($($m:ident),+) => {$(
        impl Row for $m::Model {
            fn row_id(&self) -> Uuid { self.id }
            fn slug(&self) -> Option<&str> { Some(&self.slug) }
        }
    )+};
}

macro_rules! plain_row {
    ($($m:ident),+) => {$(
        impl Row for $m::Model {
            fn row_id(&self) -> Uuid { self.id }
        }
    )+};
}

slugged_row!(category, subscriber, news, event, product);
plain_row!(comment, order, order_item, contract, audit_log);
