use failure::{Backtrace, Context, Fail};
use serde_json::Value;
use std::fmt;

/// The specific kind of error that can occur.
#[derive(Clone, Eq, PartialEq, Debug, Fail)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The request never produced a response (connection, TLS, timeout), or a
    /// page failed while paginating in strict mode.
    #[fail(display = "Transport error: {}", _0)]
    Transport(String),
    /// The server answered with a non-success status.
    #[fail(display = "Remote error ({}): {}", status, message)]
    Remote { status: u16, message: String },
    /// A lookup or resolution found nothing.
    #[fail(display = "Not found: {}", _0)]
    NotFound(String),
    /// Missing credentials or an unusable setting.
    #[fail(display = "Configuration error: {}", _0)]
    Configuration(String),
    /// A serialization / deserialization error
    #[fail(display = "Serialization error: {}", _0)]
    Serde(String),
}

/// An error that can occur while talking to the GitLab API.
///
/// Errors raised in the middle of a paginated listing keep the records that
/// were already fetched; see [`Error::partial`].
#[derive(Debug)]
pub struct Error {
    inner: Context<ErrorKind>,
    partial: Vec<Value>,
}

impl Error {
    /// Return the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        self.inner.get_context()
    }

    /// Records gathered before the failing page, in document order.
    pub fn partial(&self) -> &[Value] {
        &self.partial
    }

    pub(crate) fn with_partial(mut self, partial: Vec<Value>) -> Self {
        self.partial = partial;
        self
    }

    pub fn is_not_found(&self) -> bool {
        match self.kind() {
            ErrorKind::NotFound(_) => true,
            _ => false,
        }
    }
}

impl Fail for Error {
    fn cause(&self) -> Option<&dyn Fail> {
        self.inner.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.inner.backtrace()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Context::new(kind),
            partial: Vec::new(),
        }
    }
}

impl From<Context<ErrorKind>> for Error {
    fn from(inner: Context<ErrorKind>) -> Error {
        Error {
            inner,
            partial: Vec::new(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        let msg = err.to_string();
        err.context(ErrorKind::Serde(msg)).into()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_and_display() {
        let err = Error::from(ErrorKind::Remote {
            status: 403,
            message: "403 Forbidden".to_string(),
        });
        assert_eq!(
            err.kind(),
            &ErrorKind::Remote {
                status: 403,
                message: "403 Forbidden".to_string()
            }
        );
        assert_eq!(err.to_string(), "Remote error (403): 403 Forbidden");
        assert!(err.partial().is_empty());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_partial_is_kept() {
        let err = Error::from(ErrorKind::Transport("page 3 failed".to_string()))
            .with_partial(vec![json!({"id": 1}), json!({"id": 2})]);
        assert_eq!(err.partial().len(), 2);
        assert_eq!(err.partial()[1]["id"], 2);
    }

    #[test]
    fn test_serde_error_converts() {
        let err: Error = serde_json::from_str::<Value>("{not json")
            .unwrap_err()
            .into();
        match err.kind() {
            ErrorKind::Serde(_) => {}
            other => panic!("unexpected kind {:?}", other),
        }
        assert!(err.cause().is_some());
    }
}
