//! Subscriber products and the plan cap on active listings.

pub mod repository;
pub mod service;

pub use repository::{MemoryProductRepository, ProductRepository, SeaOrmProductRepository};
pub use service::{ProductInput, ProductService};
