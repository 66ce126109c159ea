pub mod document;
pub mod types;
pub mod user;

pub use document::{Document, DocumentFilter, DocumentStatus, NewDocument};
pub use types::{DocumentId, UserId};
pub use user::{Role, User};
