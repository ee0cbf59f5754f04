//! Labkit: a read-only GitLab REST (v4) client.
//!
//! Resolves the numeric id of the user behind an access token, lists their
//! projects, a project's branches and repository tree, and fetches raw file
//! contents. Listings are page-numbered and fetched until an empty page.
//!
//! ## Usage
//! ```no_run
//! fn main() -> Result<(), labkit::Error> {
//!     let client = labkit::Client::new(labkit::Config::new_authenticated("secret_access_token"))?;
//!     let project = client.find_project_id("my-project")?;
//!     for file in client.list_files_under(project, "src", "main")? {
//!         let bytes = client.get_file_raw(project, &file.path, "main")?;
//!         println!("{}: {} bytes", file.path, bytes.len());
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod endpoint;
mod error;
pub mod transport;
pub(crate) mod util;

pub use client::Client;
pub use config::{Config, UserIdStrategy, DEFAULT_BASE_URL, MAX_PER_PAGE};
pub use endpoint::{Branch, EntryKind, Project, TreeEntry, User};
pub use error::{Error, ErrorKind};
pub use transport::{ReqwestTransport, Response, Transport};
pub use util::encode_path_segment;
