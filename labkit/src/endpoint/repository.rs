use crate::error::{Error, ErrorKind};
use crate::{util, Client};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A file.
    Blob,
    /// A directory.
    Tree,
    /// A submodule.
    Commit,
    #[serde(other)]
    Other,
}

/// One entry of a repository tree listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub path: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TreeEntry {
    pub fn is_blob(&self) -> bool {
        self.kind == EntryKind::Blob
    }

    /// Whether the entry is `dir` itself or lies below it. Matching is by
    /// whole path segments: `src` covers `src/a.rs` but not `src-old/a.rs`.
    /// An empty `dir` covers everything.
    pub fn is_under(&self, dir: &str) -> bool {
        is_under(&self.path, dir)
    }
}

fn is_under(path: &str, dir: &str) -> bool {
    if dir.is_empty() {
        return true;
    }
    match path.strip_prefix(dir) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

impl Client {
    pub fn list_branches(&self, project_id: u64) -> Result<Vec<Branch>, Error> {
        self.collect(&format!("projects/{}/repository/branches", project_id), &[])
    }

    /// Recursive tree listing of `git_ref`.
    pub fn list_tree(&self, project_id: u64, git_ref: &str) -> Result<Vec<TreeEntry>, Error> {
        self.list_tree_with(project_id, git_ref, true)
    }

    pub fn list_tree_with(
        &self,
        project_id: u64,
        git_ref: &str,
        recursive: bool,
    ) -> Result<Vec<TreeEntry>, Error> {
        let mut query = vec![("ref", git_ref)];
        if recursive {
            query.push(("recursive", "1"));
        }
        self.collect(&format!("projects/{}/repository/tree", project_id), &query)
    }

    /// Files (blobs) at or below `path`. Leading and trailing `/` are ignored.
    pub fn list_files_under(
        &self,
        project_id: u64,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<TreeEntry>, Error> {
        let dir = path.trim_matches('/');
        let entries = self.list_tree(project_id, git_ref)?;
        let total = entries.len();

        let files: Vec<TreeEntry> = entries
            .into_iter()
            .filter(|e| e.is_blob() && e.is_under(dir))
            .collect();
        debug!("{} of {} tree entries under '{}'", files.len(), total, dir);
        Ok(files)
    }

    /// Raw bytes of the file at `path` on `git_ref`.
    ///
    /// Any non-success answer is reported as `NotFound`; GitLab uses 404 for
    /// both a missing file and a missing ref.
    pub fn get_file_raw(&self, project_id: u64, path: &str, git_ref: &str) -> Result<Vec<u8>, Error> {
        let url = self.endpoint(
            &format!(
                "projects/{}/repository/files/{}/raw",
                project_id,
                util::encode_path_segment(path)
            ),
            &[("ref", git_ref)],
        )?;

        let res = self.get(&url)?;
        if !res.is_success() {
            let message = util::remote_message(&res);
            return Err(ErrorKind::NotFound(format!(
                "file '{}' at '{}' in project {} ({}: {})",
                path, git_ref, project_id, res.status, message
            ))
            .into());
        }
        debug!("read {} bytes of {}", res.body.len(), path);
        Ok(res.body)
    }
}
