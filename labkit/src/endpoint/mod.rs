mod projects;
mod repository;
mod users;

pub use projects::Project;
pub use repository::{Branch, EntryKind, TreeEntry};
pub use users::User;
