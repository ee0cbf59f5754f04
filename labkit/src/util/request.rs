use crate::error::{Error, ErrorKind};
use crate::transport::Response;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;

const PRIVATE_TOKEN: &str = "private-token";
/// Error bodies longer than this are cut when echoed into an error.
const MAX_MESSAGE_LEN: usize = 200;

/// Returns the headers every API request carries.
/// The token header is marked sensitive so it never shows up in `Debug` output.
pub(crate) fn build_headers(token: &str) -> Result<HeaderMap, Error> {
    let mut token = HeaderValue::from_str(token).map_err(|_| {
        ErrorKind::Configuration("access token is not a valid header value".to_string())
    })?;
    token.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static(PRIVATE_TOKEN), token);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Maps a non-success response onto the error taxonomy: 404 becomes
/// `NotFound`, anything else `Remote` with the server's message.
pub(crate) fn check_status(res: Response, what: &str) -> Result<Response, Error> {
    if res.is_success() {
        return Ok(res);
    }
    let message = remote_message(&res);
    if res.status == StatusCode::NOT_FOUND {
        return Err(ErrorKind::NotFound(format!("{}: {}", what, message)).into());
    }
    Err(ErrorKind::Remote {
        status: res.status.as_u16(),
        message,
    }
    .into())
}

/// Pulls the human readable part out of a GitLab error body.
///
/// GitLab answers `{"message": ...}` for most failures and `{"error": ...}`
/// for OAuth ones; `message` may itself be an object of field errors.
pub(crate) fn remote_message(res: &Response) -> String {
    if let Ok(body) = serde_json::from_slice::<Value>(&res.body) {
        for key in &["message", "error"] {
            match body.get(*key) {
                Some(Value::String(s)) => return s.clone(),
                Some(Value::Null) | None => {}
                Some(other) => return other.to_string(),
            }
        }
    }

    let text = String::from_utf8_lossy(&res.body);
    let text = text.trim();
    if text.is_empty() {
        return res.status.to_string();
    }
    text.chars().take(MAX_MESSAGE_LEN).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn response(status: u16, body: &str) -> Response {
        Response::new(StatusCode::from_u16(status).unwrap(), body.as_bytes().to_vec())
    }

    #[test]
    fn test_build_headers() {
        let headers = build_headers("glpat-secret").unwrap();
        assert_eq!(headers["private-token"], "glpat-secret");
        assert!(headers["private-token"].is_sensitive());
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert!(!format!("{:?}", headers).contains("glpat-secret"));
    }

    #[test]
    fn test_build_headers_rejects_newline() {
        let err = build_headers("bad\ntoken").unwrap_err();
        match err.kind() {
            ErrorKind::Configuration(_) => {}
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_check_status_passes_success() {
        assert!(check_status(response(200, "[]"), "projects").is_ok());
    }

    #[test]
    fn test_check_status_not_found() {
        let err = check_status(response(404, r#"{"message":"404 Project Not Found"}"#), "project 9")
            .unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::NotFound("project 9: 404 Project Not Found".to_string())
        );
    }

    #[test]
    fn test_check_status_remote() {
        let err = check_status(response(401, r#"{"message":"401 Unauthorized"}"#), "user")
            .unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::Remote {
                status: 401,
                message: "401 Unauthorized".to_string()
            }
        );
    }

    #[test]
    fn test_remote_message_variants() {
        assert_eq!(
            remote_message(&response(401, r#"{"error":"invalid_token"}"#)),
            "invalid_token"
        );
        assert_eq!(
            remote_message(&response(400, r#"{"message":{"name":["is too long"]}}"#)),
            r#"{"name":["is too long"]}"#
        );
        assert_eq!(remote_message(&response(502, "Bad gateway")), "Bad gateway");
        assert_eq!(remote_message(&response(500, "")), "500 Internal Server Error");
    }
}
