//! [`Fetch`] over HTTP with `reqwest`.
//!
//! Relative URLs resolve against the URL of the hosting document. Request
//! modes are applied the way a browser filters responses for a document at
//! that URL.

use async_trait::async_trait;
use reqwest::header::{ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN};
use reqwest::Url;

use crate::error::FetchError;
use crate::fetch::{Fetch, RequestInit, RequestMode, Response};

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    document_url: Url,
}

impl HttpFetcher {
    pub fn new(document_url: &str) -> Result<Self, FetchError> {
        Self::with_client(reqwest::Client::new(), document_url)
    }

    pub fn with_client(client: reqwest::Client, document_url: &str) -> Result<Self, FetchError> {
        let document_url = Url::parse(document_url).map_err(|error| FetchError::Network {
            url: document_url.to_string(),
            message: error.to_string(),
        })?;
        Ok(Self {
            client,
            document_url,
        })
    }

    pub fn document_url(&self) -> &Url {
        &self.document_url
    }

    fn resolve(&self, url: &str) -> Result<Url, FetchError> {
        self.document_url
            .join(url)
            .map_err(|error| FetchError::Network {
                url: url.to_string(),
                message: error.to_string(),
            })
    }

    fn is_cross_origin(&self, target: &Url) -> bool {
        target.origin() != self.document_url.origin()
    }
}

#[async_trait(?Send)]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str, init: &RequestInit) -> Result<Response, FetchError> {
        let target = self.resolve(url)?;
        let cross_origin = self.is_cross_origin(&target);

        if cross_origin && init.mode == RequestMode::SameOrigin {
            return Err(FetchError::ModeViolation {
                url: target.to_string(),
                mode: init.mode,
            });
        }

        let origin = self.document_url.origin().ascii_serialization();
        let mut request = self.client.get(target.clone());
        if cross_origin && init.mode == RequestMode::Cors {
            request = request.header(ORIGIN, origin.as_str());
        }

        tracing::debug!(url = %target, mode = %init.mode, "sending request");
        let response = request.send().await?;

        if cross_origin {
            match init.mode {
                RequestMode::NoCors => return Ok(Response::opaque()),
                RequestMode::Cors => {
                    let allowed = response
                        .headers()
                        .get(ACCESS_CONTROL_ALLOW_ORIGIN)
                        .and_then(|value| value.to_str().ok())
                        .is_some_and(|value| value == "*" || value == origin);
                    if !allowed {
                        return Err(FetchError::Network {
                            url: target.to_string(),
                            message: format!("CORS check failed for origin {origin}"),
                        });
                    }
                }
                RequestMode::SameOrigin => {}
            }
        }

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.text().await?;
        Ok(Response::new(status.as_u16(), status_text, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_document_url() {
        let error = HttpFetcher::new("not a url").unwrap_err();
        assert!(matches!(error, FetchError::Network { .. }));
    }

    #[test]
    fn resolves_against_document_url() {
        let fetcher = HttpFetcher::new("https://example.test/docs/index.html").unwrap();
        assert_eq!(
            fetcher.resolve("part.html").unwrap().as_str(),
            "https://example.test/docs/part.html"
        );
        assert_eq!(
            fetcher.resolve("/root.html").unwrap().as_str(),
            "https://example.test/root.html"
        );
        assert!(!fetcher.is_cross_origin(&fetcher.resolve("part.html").unwrap()));
        assert!(fetcher.is_cross_origin(&fetcher.resolve("https://cdn.test/x.html").unwrap()));
    }

    #[tokio::test]
    async fn same_origin_mode_rejects_cross_origin_urls() {
        let fetcher = HttpFetcher::new("https://example.test/").unwrap();
        let init = RequestInit {
            mode: RequestMode::SameOrigin,
        };
        let error = fetcher
            .fetch("https://elsewhere.test/a.html", &init)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            FetchError::ModeViolation { mode: RequestMode::SameOrigin, .. }
        ));
    }
}
