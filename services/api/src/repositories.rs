//! Repositories for database operations
//!
//! Each repository owns the SQL for one aggregate. Multi-row changes
//! (uploads with tag links, cascading deletes, reaction toggles) run inside
//! a single transaction; cascade order is explicit here rather than
//! declared on the schema.

pub mod comment;
pub mod reaction;
pub mod short;
pub mod tag;
pub mod user;
pub mod video;

pub use comment::CommentRepository;
pub use reaction::ReactionRepository;
pub use short::ShortRepository;
pub use tag::TagRepository;
pub use user::UserRepository;
pub use video::VideoRepository;
