pub mod repository;
pub mod service;

pub use repository::{MemoryNewsRepository, NewsRepository, SeaOrmNewsRepository};
pub use service::{NewsInput, NewsService, RelatedLink};
