//! Categories for directories, news, events, jobs and the forum.

pub mod repository;
pub mod service;

pub use repository::{CategoryRepository, MemoryCategoryRepository, SeaOrmCategoryRepository};
pub use service::{CategoryInput, CategoryNode, CategoryService};
