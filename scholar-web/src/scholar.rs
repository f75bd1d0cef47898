use async_trait::async_trait;
use scholar_common::Paper;
use scholar_http::{Auth, HttpClient, HttpError, RequestOpts};
use serde::Deserialize;
use std::borrow::Cow;
use std::time::Instant;
use thiserror::Error;

pub const SERPAPI_BASE_URL: &str = "https://serpapi.com";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("search service error: {0}")]
    Api(String),
}

/// Free-text topic to an ordered list of papers. An empty list is a valid answer.
#[async_trait]
pub trait PaperSearch: Send + Sync {
    async fn search(&self, topic: &str) -> Result<Vec<Paper>, SearchError>;
}

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

/// Google Scholar through SerpAPI (`/search.json?engine=google_scholar`).
#[derive(Clone)]
pub struct SerpApiScholar {
    http: HttpClient,
    api_key: String,
    engine: String,
}

impl SerpApiScholar {
    pub fn new(endpoint: &str, api_key: String, engine: String) -> Result<Self, SearchError> {
        let http = HttpClient::new(endpoint)?.with_retries(1);
        Ok(Self {
            http,
            api_key,
            engine,
        })
    }
}

#[async_trait]
impl PaperSearch for SerpApiScholar {
    async fn search(&self, topic: &str) -> Result<Vec<Paper>, SearchError> {
        let started = Instant::now();
        tracing::info!(target: "web.scholar", query = %topic, engine = %self.engine, "search.scholar.start");

        let opts = RequestOpts {
            query: Some(vec![
                ("engine", Cow::Borrowed(self.engine.as_str())),
                ("q", Cow::Borrowed(topic)),
            ]),
            auth: Some(Auth::Query {
                name: "api_key",
                value: Cow::Borrowed(self.api_key.as_str()),
            }),
            ..Default::default()
        };

        let resp: SerpResponse = match self.http.get_json("search.json", opts).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(
                    target: "web.scholar",
                    query = %topic,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "search.scholar.error"
                );
                return Err(e.into());
            }
        };

        let papers = papers_from(resp)?;
        tracing::info!(
            target: "web.scholar",
            query = %topic,
            hit_count = papers.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search.scholar.success"
        );
        Ok(papers)
    }
}

fn papers_from(resp: SerpResponse) -> Result<Vec<Paper>, SearchError> {
    if resp.organic_results.is_empty() {
        return match resp.error {
            // SerpAPI reports an empty result page through the error field.
            Some(msg) if msg.contains("hasn't returned any results") => Ok(Vec::new()),
            Some(msg) => Err(SearchError::Api(msg)),
            None => Ok(Vec::new()),
        };
    }

    Ok(resp
        .organic_results
        .into_iter()
        .filter_map(|r| {
            let title = r.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
            Some(Paper::new(
                title,
                r.link.unwrap_or_default(),
                r.snippet.unwrap_or_default(),
            ))
        })
        .collect())
}
