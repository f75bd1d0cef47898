use crate::extract::paragraph_text;
use async_trait::async_trait;
use scholar_http::{HttpClient, HttpError, RequestOpts, user_agent_headers};
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid link '{0}'")]
    InvalidUrl(String),
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("not an HTML page ({0})")]
    NotHtml(String),
}

/// URL to extracted plain text.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetches a page with a browser-like user agent and keeps its paragraph text.
#[derive(Clone)]
pub struct WebFetcher {
    http: HttpClient,
    user_agent: String,
}

impl WebFetcher {
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Result<Self, FetchError> {
        let http = HttpClient::unanchored()?
            .with_timeout(timeout)
            .with_retries(0);
        Ok(Self {
            http,
            user_agent: user_agent.into(),
        })
    }
}

#[async_trait]
impl ContentFetcher for WebFetcher {
    async fn fetch(&self, link: &str) -> Result<String, FetchError> {
        let url = Url::parse(link.trim()).map_err(|_| FetchError::InvalidUrl(link.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(link.to_string()));
        }

        let started = Instant::now();
        let opts = RequestOpts {
            headers: Some(user_agent_headers(&self.user_agent)?),
            ..Default::default()
        };
        let page = self.http.get_text(url.as_str(), opts).await?;

        // Pages without a content type are parsed anyway.
        if page.content_type.is_some() && !page.is_html() {
            let kind = page.content_type.unwrap_or_default();
            tracing::info!(target: "web.fetch", url = %url, content_type = %kind, "fetch.not_html");
            return Err(FetchError::NotHtml(kind));
        }

        let text = paragraph_text(&page.body);
        tracing::info!(
            target: "web.fetch",
            url = %url,
            html_bytes = page.body.len(),
            text_chars = text.chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fetch.done"
        );
        Ok(text)
    }
}
