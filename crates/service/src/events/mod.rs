pub mod repository;
pub mod service;

pub use repository::{EventRepository, MemoryEventRepository, SeaOrmEventRepository};
pub use service::{EventInput, EventService};
