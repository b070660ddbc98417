//! Store checkout for sellers whose plan includes a store.

pub mod repository;
pub mod service;

pub use repository::{MemoryOrderRepository, OrderRepository, SeaOrmOrderRepository};
pub use service::{OrderInput, OrderLine, OrderReceipt, OrderService};
