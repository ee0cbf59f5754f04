//! The HTTP boundary.
//!
//! Everything the client needs from HTTP is a single blocking `GET`. The
//! [`Transport`] trait keeps that seam narrow so tests (or callers with their
//! own HTTP stack) can supply responses without a network.

use crate::error::{Error, ErrorKind};
use failure::Fail;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// A fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode, body: Vec<u8>) -> Self {
        Response {
            status,
            headers: HeaderMap::new(),
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_json(&self) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("json"))
            .unwrap_or(false)
    }

    /// Decodes the body as JSON. A body not labelled as JSON by its
    /// `Content-Type` is a `Serde` error, never decoded on a guess.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        if !self.is_json() {
            let content_type = self
                .headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("none");
            return Err(ErrorKind::Serde(format!(
                "expected a JSON body, got content-type {}",
                content_type
            ))
            .into());
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Issues one blocking GET.
///
/// Implementations report only failures to obtain a response as errors
/// (`ErrorKind::Transport`); any status, success or not, is a `Response`.
pub trait Transport: Send + Sync {
    fn get(&self, url: &Url, headers: &HeaderMap) -> Result<Response, Error>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn get(&self, url: &Url, headers: &HeaderMap) -> Result<Response, Error> {
        (**self).get(url, headers)
    }
}

/// Default transport on top of a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: HttpClient,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, Error> {
        let client = HttpClient::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(transport_error)?;
        Ok(ReqwestTransport { client })
    }

    pub fn from_client(client: HttpClient) -> Self {
        ReqwestTransport { client }
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &Url, headers: &HeaderMap) -> Result<Response, Error> {
        let res = self
            .client
            .get(url.clone())
            .headers(headers.clone())
            .send()
            .map_err(transport_error)?;

        let status = res.status();
        let headers = res.headers().clone();
        let body = res.bytes().map_err(transport_error)?.to_vec();

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    // reqwest includes the url, never the headers.
    let msg = err.to_string();
    err.context(ErrorKind::Transport(msg)).into()
}

/// Scripted in-memory transport for unit tests.
#[cfg(test)]
pub(crate) mod stub {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::Value;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    type Outcome = Result<Response, String>;

    /// Answers by url relative to [`StubTransport::BASE`]. Each route plays its
    /// outcomes in order and then keeps repeating the last one; unknown routes
    /// answer 404. Every request is recorded.
    #[derive(Default)]
    pub(crate) struct StubTransport {
        routes: Mutex<HashMap<String, VecDeque<Outcome>>>,
        requests: Mutex<Vec<String>>,
        tokens: Mutex<Vec<Option<String>>>,
    }

    impl StubTransport {
        pub(crate) const BASE: &'static str = "https://gitlab.test/api/v4/";

        pub(crate) fn new() -> Self {
            StubTransport::default()
        }

        fn push(&self, route: &str, outcome: Outcome) {
            self.routes
                .lock()
                .unwrap()
                .entry(route.to_string())
                .or_default()
                .push_back(outcome);
        }

        /// Queues a 200 JSON answer.
        pub(crate) fn on(&self, route: &str, body: Value) {
            let mut res = Response::new(StatusCode::OK, serde_json::to_vec(&body).unwrap());
            res.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            self.push(route, Ok(res));
        }

        pub(crate) fn on_response(&self, route: &str, res: Response) {
            self.push(route, Ok(res));
        }

        pub(crate) fn on_status(&self, route: &str, status: u16, body: &str) {
            let status = StatusCode::from_u16(status).unwrap();
            self.push(route, Ok(Response::new(status, body.as_bytes().to_vec())));
        }

        /// Queues `times` connection failures.
        pub(crate) fn fail(&self, route: &str, times: usize) {
            for _ in 0..times {
                self.push(route, Err("connection reset by peer".to_string()));
            }
        }

        pub(crate) fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        pub(crate) fn last_token(&self) -> Option<String> {
            self.tokens.lock().unwrap().last().cloned().flatten()
        }
    }

    impl Transport for StubTransport {
        fn get(&self, url: &Url, headers: &HeaderMap) -> Result<Response, Error> {
            let route = url
                .as_str()
                .strip_prefix(Self::BASE)
                .unwrap_or_else(|| url.as_str())
                .to_string();
            self.requests.lock().unwrap().push(route.clone());
            self.tokens.lock().unwrap().push(
                headers
                    .get("private-token")
                    .and_then(|v| v.to_str().ok())
                    .map(String::from),
            );

            let mut routes = self.routes.lock().unwrap();
            let outcome = match routes.get_mut(&route) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            };
            match outcome {
                Some(Ok(res)) => Ok(res),
                Some(Err(msg)) => Err(ErrorKind::Transport(msg).into()),
                None => Ok(Response::new(
                    StatusCode::NOT_FOUND,
                    br#"{"message":"404 Not Found"}"#.to_vec(),
                )),
            }
        }
    }
}
