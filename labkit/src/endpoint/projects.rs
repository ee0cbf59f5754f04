use crate::error::{Error, ErrorKind};
use crate::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A project as GitLab returns it. Only `id` and `name` are read; every
/// other field is carried along in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Client {
    /// Every project owned by the configured user.
    pub fn list_projects(&self) -> Result<Vec<Project>, Error> {
        let uid = self.resolve_user_id()?;
        self.collect(&format!("users/{}/projects", uid), &[])
    }

    /// Id of the user's project called exactly `name`.
    ///
    /// GitLab's `search` filter is fuzzy, so each page is scanned in full for
    /// an exact name and the first hit in page order wins. Later pages are
    /// only requested while nothing has matched.
    pub fn find_project_id(&self, name: &str) -> Result<u64, Error> {
        let uid = self.resolve_user_id()?;
        let found = self.find_in_pages(
            &format!("users/{}/projects", uid),
            &[("search", name)],
            |page: Vec<Project>| page.into_iter().find(|p| p.name == name).map(|p| p.id),
        )?;

        found.ok_or_else(|| ErrorKind::NotFound(format!("no project named '{}'", name)).into())
    }
}
