use crate::error::{Error, ErrorKind};
use crate::transport::Response;
use crate::util;
use log::{debug, warn};
use reqwest::header::{HeaderMap, LINK};
use reqwest::Url;
use serde_json::Value;
use std::ops::ControlFlow;

/// How a listing is walked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PageSettings {
    pub per_page: u32,
    /// A non-success page is an error instead of the end of the data.
    pub strict: bool,
    /// Take the next page number from the `Link` header.
    pub follow_links: bool,
}

/// Walks a page-numbered listing starting at page 1.
///
/// `fetch` issues the request for one page number. Every non-empty page is
/// handed to `visit`, which may stop the walk early by returning `Break`.
/// The walk ends at the first empty page, at the first non-success page
/// (an error in strict mode), or, when following links, once a page has no
/// `rel="next"` link.
pub(crate) fn walk_pages<F, V, B>(
    settings: &PageSettings,
    mut fetch: F,
    mut visit: V,
) -> Result<Option<B>, Error>
where
    F: FnMut(u32) -> Result<Response, Error>,
    V: FnMut(Vec<Value>) -> Result<ControlFlow<B>, Error>,
{
    let mut page = 1;

    loop {
        let res = fetch(page)?;

        if !res.is_success() {
            let message = util::remote_message(&res);
            if settings.strict {
                return Err(ErrorKind::Transport(format!(
                    "page {} failed with {}: {}",
                    page, res.status, message
                ))
                .into());
            }
            warn!(
                "page {} failed with {} ({}), returning what was fetched so far",
                page, res.status, message
            );
            return Ok(None);
        }

        let items: Vec<Value> = res.json()?;
        if items.is_empty() {
            debug!("page {} is empty, done", page);
            return Ok(None);
        }
        debug!("page {} returned {} records", page, items.len());

        let next = if settings.follow_links {
            next_page(&res.headers, page)
        } else {
            Some(page + 1)
        };

        if let ControlFlow::Break(found) = visit(items)? {
            return Ok(Some(found));
        }

        match next {
            Some(n) => page = n,
            None => {
                debug!("page {} has no next link, done", page);
                return Ok(None);
            }
        }
    }
}

/// Concatenates every page in order. On failure the error carries the records
/// gathered before the failing page.
pub(crate) fn collect_pages<F>(settings: &PageSettings, fetch: F) -> Result<Vec<Value>, Error>
where
    F: FnMut(u32) -> Result<Response, Error>,
{
    let mut out = vec![];
    let walked = walk_pages(settings, fetch, |items| {
        out.extend(items);
        Ok(ControlFlow::<()>::Continue(()))
    });

    match walked {
        Ok(_) => Ok(out),
        Err(e) => Err(e.with_partial(out)),
    }
}

/// Page to request after `current`. Without a `Link` header (or with one we
/// cannot read) pages are simply counted up.
fn next_page(headers: &HeaderMap, current: u32) -> Option<u32> {
    match LinkHeaders::new(headers) {
        Some(lh) => {
            if lh.should_next(current) {
                Some(lh.get_next(current))
            } else {
                None
            }
        }
        None => Some(current + 1),
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum LinkHeaderType {
    Prev,
    Next,
    First,
    Last,
    Unknown,
}

impl From<&str> for LinkHeaderType {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "prev" => LinkHeaderType::Prev,
            "next" => LinkHeaderType::Next,
            "first" => LinkHeaderType::First,
            "last" => LinkHeaderType::Last,
            _ => LinkHeaderType::Unknown,
        }
    }
}

#[derive(Debug, PartialEq)]
pub(crate) struct LinkHeader {
    pub url: Url,
    pub page: Option<u32>,
    pub rel: LinkHeaderType,
}

#[derive(Debug)]
struct LinkHeaders {
    next: Option<LinkHeader>,
}

impl LinkHeaders {
    fn new(headers: &HeaderMap) -> Option<Self> {
        let raw = headers.get(LINK)?.to_str().ok()?;
        let links = match util::parser::link_header(raw) {
            Ok(links) => links,
            Err(e) => {
                warn!("{}", e);
                return None;
            }
        };

        Some(LinkHeaders {
            next: links.into_iter().find(|lh| lh.rel == LinkHeaderType::Next),
        })
    }

    fn should_next(&self, page: u32) -> bool {
        match &self.next {
            // A next link without a page number still means there is more.
            Some(next) => next.page.map_or(true, |p| p > page),
            None => false,
        }
    }

    fn get_next(&self, current: u32) -> u32 {
        match &self.next {
            Some(LinkHeader { page: Some(p), url, .. }) => {
                debug!("following next link {}", url);
                *p
            }
            _ => current + 1,
        }
    }
}
