use crate::config::UserIdStrategy;
use crate::error::{Error, ErrorKind};
use crate::{util, Client};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::PoisonError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Client {
    /// Returns the numeric id of the configured user, resolving it on first
    /// call with the configured [`UserIdStrategy`].
    ///
    /// The id is cached until the user name or access token changes. The cache
    /// lock is held while resolving, so concurrent callers wait for a single
    /// resolution instead of racing their own.
    pub fn resolve_user_id(&self) -> Result<u64, Error> {
        let mut cached = self.user_id.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(id) = *cached {
            debug!("user id {} (cached)", id);
            return Ok(id);
        }

        let id = match self.config.user_id_strategy {
            UserIdStrategy::CurrentUser => self.current_user()?.id,
            UserIdStrategy::SearchByName => self.search_user_id()?,
        };
        debug!("resolved user id {}", id);
        *cached = Some(id);
        Ok(id)
    }

    /// `GET /user`: the account the access token belongs to.
    pub fn current_user(&self) -> Result<User, Error> {
        let url = self.endpoint("user", &[])?;
        let res = util::check_status(self.get(&url)?, "current user")?;
        res.json()
    }

    fn search_user_id(&self) -> Result<u64, Error> {
        let name = self.user_name().ok_or_else(|| {
            ErrorKind::Configuration(
                "user name is required to resolve the user id by search".to_string(),
            )
        })?;

        // The search ranks prefix matches too ("bob" finds "bobby"), so only
        // an exact username is accepted.
        let found = self.find_in_pages(
            "search",
            &[("scope", "users"), ("search", name)],
            |page: Vec<User>| page.into_iter().find(|u| u.username == name).map(|u| u.id),
        )?;

        found.ok_or_else(|| ErrorKind::NotFound(format!("no user named '{}'", name)).into())
    }
}
