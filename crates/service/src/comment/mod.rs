//! Visitor comments held for moderation.

pub mod repository;
pub mod service;

pub use repository::{CommentRepository, MemoryCommentRepository, SeaOrmCommentRepository};
pub use service::{CommentInput, CommentService};
