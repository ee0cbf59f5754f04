use crate::config::{check_token, Config};
use crate::error::{Error, ErrorKind};
use crate::transport::{ReqwestTransport, Response, Transport};
use crate::util::{self, PageSettings};
use log::{debug, warn};
use reqwest::header::HeaderMap;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::ops::ControlFlow;
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

/// A read-only GitLab client.
///
/// The numeric id of the configured user is resolved on first use and
/// cached. Changing the user name or the token drops the cached id.
pub struct Client {
    pub(crate) config: Config,
    api_url: Url,
    headers: HeaderMap,
    transport: Box<dyn Transport>,
    pub(crate) user_id: Mutex<Option<u64>>,
}

impl Client {
    /// Creates a client talking HTTP through `reqwest`.
    pub fn new(config: Config) -> Result<Self, Error> {
        let transport = ReqwestTransport::new(config.timeout, &config.user_agent)?;
        Client::with_transport(config, transport)
    }

    /// Creates a client on top of any [`Transport`].
    pub fn with_transport<T>(config: Config, transport: T) -> Result<Self, Error>
    where
        T: Transport + 'static,
    {
        config.validate()?;
        let api_url = config.api_url()?;
        let headers = util::build_headers(config.access_token.as_deref().unwrap_or_default())?;

        Ok(Client {
            config,
            api_url,
            headers,
            transport: Box::new(transport),
            user_id: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn user_name(&self) -> Option<&str> {
        self.config.user_name.as_deref()
    }

    /// The cached user id, if it has been resolved. Never issues a request.
    pub fn user_id(&self) -> Option<u64> {
        *self.user_id.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_user_name(&mut self, user_name: &str) -> Result<(), Error> {
        if user_name.trim().is_empty() {
            return Err(ErrorKind::Configuration("user name is empty".to_string()).into());
        }
        self.config.user_name = Some(user_name.to_string());
        self.forget_user_id();
        Ok(())
    }

    pub fn set_access_token(&mut self, token: &str) -> Result<(), Error> {
        check_token(Some(token))?;
        self.headers = util::build_headers(token)?;
        self.config.access_token = Some(token.to_string());
        self.forget_user_id();
        Ok(())
    }

    fn forget_user_id(&mut self) {
        let cached = self
            .user_id
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if cached.take().is_some() {
            debug!("identity changed, dropped cached user id");
        }
    }

    /// Builds `<api_url>/<path>?<query>`.
    pub(crate) fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, Error> {
        let mut url = self.api_url.join(path).map_err(|e| {
            ErrorKind::Configuration(format!("cannot build url for '{}': {}", path, e))
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Issues a GET, retrying transport failures up to `max_retries` times.
    pub(crate) fn get(&self, url: &Url) -> Result<Response, Error> {
        let mut attempt = 0;
        loop {
            debug!("GET {}", url);
            match self.transport.get(url, &self.headers) {
                Ok(res) => {
                    debug!("GET {} -> {}", url, res.status);
                    return Ok(res);
                }
                Err(e) => {
                    let transient = match e.kind() {
                        ErrorKind::Transport(_) => true,
                        _ => false,
                    };
                    if !transient || attempt >= self.config.max_retries {
                        return Err(e);
                    }
                    attempt += 1;
                    let wait = backoff(self.config.retry_backoff, attempt);
                    warn!(
                        "GET {} failed: {}; retry {}/{} in {:?}",
                        url, e, attempt, self.config.max_retries, wait
                    );
                    thread::sleep(wait);
                }
            }
        }
    }

    pub(crate) fn page_settings(&self) -> PageSettings {
        PageSettings {
            per_page: self.config.per_page,
            strict: self.config.strict_pagination,
            follow_links: self.config.follow_link_header,
        }
    }

    fn page_url(
        &self,
        path: &str,
        query: &[(&str, &str)],
        per_page: u32,
        page: u32,
    ) -> Result<Url, Error> {
        let mut url = self.endpoint(path, query)?;
        url.query_pairs_mut()
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    /// Fetches every page of a listing.
    pub(crate) fn collect<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<T>, Error>
    where
        T: DeserializeOwned,
    {
        let settings = self.page_settings();
        let items = util::collect_pages(&settings, |page| {
            let url = self.page_url(path, query, settings.per_page, page)?;
            self.get(&url)
        })?;
        debug!("{}: {} records", path, items.len());
        Ok(serde_json::from_value(Value::Array(items))?)
    }

    /// Walks a listing page by page until `pick` returns something.
    ///
    /// A failed page is always an error here, whatever the pagination mode:
    /// `Ok(None)` must only ever mean the listing ran out without a match.
    pub(crate) fn find_in_pages<T, B, P>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        mut pick: P,
    ) -> Result<Option<B>, Error>
    where
        T: DeserializeOwned,
        P: FnMut(Vec<T>) -> Option<B>,
    {
        let settings = self.page_settings();
        util::walk_pages(
            &settings,
            |page| {
                let url = self.page_url(path, query, settings.per_page, page)?;
                util::check_status(self.get(&url)?, path)
            },
            |items| {
                let records: Vec<T> = serde_json::from_value(Value::Array(items))?;
                Ok(match pick(records) {
                    Some(found) => ControlFlow::Break(found),
                    None => ControlFlow::Continue(()),
                })
            },
        )
    }
}

/// Linear backoff, saturating instead of overflowing.
fn backoff(base: Duration, attempt: u32) -> Duration {
    base.checked_mul(attempt).unwrap_or(Duration::MAX)
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("api_url", &self.api_url.as_str())
            .field("user_id", &self.user_id())
            .finish()
    }
}
