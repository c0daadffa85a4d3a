//! Data models for backend entities.
//!
//! - `Page`: the paginated envelope list endpoints return
//! - `Project`: public project listing
//! - `User`: account records under `/auth/users`
//!
//! Entities are passthrough payloads; only the identifying key and the
//! fields the frontend reads are modelled.

pub mod page;
pub mod project;
pub mod user;

pub use page::Page;
pub use project::Project;
pub use user::User;
