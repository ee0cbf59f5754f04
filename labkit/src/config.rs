use crate::error::{Error, ErrorKind};
use reqwest::Url;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://gitlab.com/api/v4/";
pub const DEFAULT_USER_AGENT: &str = "labkit-rs";
/// GitLab refuses larger pages.
pub const MAX_PER_PAGE: u32 = 100;

/// How the numeric id of the configured user is found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserIdStrategy {
    /// `GET /user` with the access token. The token alone decides the id.
    CurrentUser,
    /// Page through `GET /search?scope=users` and accept the first record
    /// whose `username` equals `Config::user_name` exactly.
    SearchByName,
}

impl Default for UserIdStrategy {
    fn default() -> Self {
        UserIdStrategy::CurrentUser
    }
}

#[derive(Clone)]
pub struct Config {
    pub base_url: String,
    pub access_token: Option<String>,
    pub user_name: Option<String>,
    pub user_id_strategy: UserIdStrategy,
    pub user_agent: String,
    /// Records requested per page, 1..=100.
    pub per_page: u32,
    /// Fail with the records gathered so far when a page comes back with a
    /// non-success status, instead of treating it as the end of the data.
    pub strict_pagination: bool,
    /// Follow `Link: <..>; rel="next"` instead of requesting until an empty page.
    pub follow_link_header: bool,
    pub timeout: Duration,
    /// Extra attempts after a transport failure. Statuses are never retried.
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Config {
    pub fn new_authenticated(token: &str) -> Self {
        Config {
            access_token: Some(token.to_string()),
            ..Config::default()
        }
    }

    /// Config for resolving the user id by searching for `user_name`.
    pub fn for_user(user_name: &str, token: &str) -> Self {
        Config {
            user_name: Some(user_name.to_string()),
            access_token: Some(token.to_string()),
            user_id_strategy: UserIdStrategy::SearchByName,
            ..Config::default()
        }
    }

    /// Parses `base_url`, adding the trailing slash `Url::join` needs.
    pub(crate) fn api_url(&self) -> Result<Url, Error> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw).map_err(|e| {
            ErrorKind::Configuration(format!("invalid base url '{}': {}", self.base_url, e))
        })?;
        if url.cannot_be_a_base() {
            return Err(ErrorKind::Configuration(format!(
                "base url '{}' cannot be a base",
                self.base_url
            ))
            .into());
        }
        Ok(url)
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        check_token(self.access_token.as_ref().map(String::as_str))?;
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(ErrorKind::Configuration(format!(
                "per_page must be within 1..={}, got {}",
                MAX_PER_PAGE, self.per_page
            ))
            .into());
        }
        if self.user_id_strategy == UserIdStrategy::SearchByName {
            match &self.user_name {
                Some(name) if !name.trim().is_empty() => {}
                _ => {
                    return Err(ErrorKind::Configuration(
                        "user name is required to resolve the user id by search".to_string(),
                    )
                    .into())
                }
            }
        }
        Ok(())
    }
}

pub(crate) fn check_token(token: Option<&str>) -> Result<(), Error> {
    match token {
        Some(t) if !t.trim().is_empty() => Ok(()),
        _ => Err(ErrorKind::Configuration("access token is missing".to_string()).into()),
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: None,
            user_name: None,
            user_id_strategy: UserIdStrategy::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            per_page: MAX_PER_PAGE,
            strict_pagination: false,
            follow_link_header: false,
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

// The token stays out of logs and panic messages.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("user_name", &self.user_name)
            .field("user_id_strategy", &self.user_id_strategy)
            .field("user_agent", &self.user_agent)
            .field("per_page", &self.per_page)
            .field("strict_pagination", &self.strict_pagination)
            .field("follow_link_header", &self.follow_link_header)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff", &self.retry_backoff)
            .finish()
    }
}
