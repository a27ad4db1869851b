//! Network port used to retrieve fragments and external scripts.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::FetchError;

/// The `mode` a request is issued with.
// https://fetch.spec.whatwg.org/#concept-request-mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    #[default]
    Cors,
    NoCors,
    SameOrigin,
}

impl RequestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMode::Cors => "cors",
            RequestMode::NoCors => "no-cors",
            RequestMode::SameOrigin => "same-origin",
        }
    }
}

impl fmt::Display for RequestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown request mode {0:?}")]
pub struct UnknownRequestMode(pub String);

impl FromStr for RequestMode {
    type Err = UnknownRequestMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cors" => Ok(RequestMode::Cors),
            "no-cors" => Ok(RequestMode::NoCors),
            "same-origin" => Ok(RequestMode::SameOrigin),
            _ => Err(UnknownRequestMode(value.to_string())),
        }
    }
}

/// Options for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestInit {
    pub mode: RequestMode,
}

/// A response with its body already read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub ok: bool,
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl Response {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            ok: (200..=299).contains(&status),
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }

    /// A `200 OK` response carrying `body`.
    pub fn with_body(body: impl Into<String>) -> Self {
        Self::new(200, "OK", body)
    }

    // https://fetch.spec.whatwg.org/#concept-filtered-response-opaque
    pub fn opaque() -> Self {
        Self {
            ok: false,
            status: 0,
            status_text: String::new(),
            body: String::new(),
        }
    }

    pub fn text(self) -> String {
        self.body
    }
}

/// Issues requests on behalf of an include element.
///
/// Implementations resolve `url` themselves, the element passes attribute
/// values through untouched.
#[async_trait(?Send)]
pub trait Fetch {
    async fn fetch(&self, url: &str, init: &RequestInit) -> Result<Response, FetchError>;
}

/// Fetches `url` and returns the body, turning a non-OK response into
/// [`FetchError::Status`].
pub async fn fetch_text<F>(fetcher: &F, url: &str, init: &RequestInit) -> Result<String, FetchError>
where
    F: Fetch + ?Sized,
{
    let response = fetcher.fetch(url, init).await?;
    if !response.ok {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status,
            status_text: response.status_text,
        });
    }
    Ok(response.text())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Response);

    #[async_trait(?Send)]
    impl Fetch for Fixed {
        async fn fetch(&self, _url: &str, _init: &RequestInit) -> Result<Response, FetchError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn parse_request_modes() {
        assert_eq!("cors".parse::<RequestMode>(), Ok(RequestMode::Cors));
        assert_eq!("No-Cors".parse::<RequestMode>(), Ok(RequestMode::NoCors));
        assert_eq!(" same-origin ".parse::<RequestMode>(), Ok(RequestMode::SameOrigin));
        assert_eq!(
            "navigate".parse::<RequestMode>(),
            Err(UnknownRequestMode("navigate".to_string()))
        );
        assert_eq!(RequestMode::NoCors.to_string(), "no-cors");
    }

    #[test]
    fn response_ok_follows_status() {
        assert!(Response::with_body("x").ok);
        assert!(Response::new(204, "No Content", "").ok);
        assert!(!Response::new(404, "Not Found", "").ok);
        assert!(!Response::opaque().ok);
    }

    #[tokio::test]
    async fn fetch_text_rejects_non_ok() {
        let ok = Fixed(Response::with_body("<p>hi</p>"));
        let text = fetch_text(&ok, "/a.html", &RequestInit::default()).await;
        assert_eq!(text.unwrap(), "<p>hi</p>");

        let missing = Fixed(Response::new(404, "Not Found", "gone"));
        let error = fetch_text(&missing, "/b.html", &RequestInit::default())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            FetchError::Status { status: 404, ref status_text, .. } if status_text == "Not Found"
        ));
    }
}
