//! Content source speaking a Prismic-style REST API

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::{ContentSource, Document, PageRequest, Query, QueryResponse};
use crate::config::ContentConfig;
use crate::error::ContentError;

/// How long the published ref is reused before asking the API again
const MASTER_REF_TTL: Duration = Duration::from_secs(30);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// `GET {endpoint}` response
#[derive(Debug, Deserialize)]
struct ApiInfo {
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    content_ref: String,
    #[serde(rename = "isMasterRef", default)]
    is_master: bool,
}

/// `GET {endpoint}/documents/search` response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<Document>,
    #[serde(default)]
    next_page: Option<String>,
}

/// HTTP client for the content repository
pub struct HttpContentSource {
    client: Client,
    endpoint: Url,
    access_token: Option<String>,
    master_ref: RwLock<Option<(String, Instant)>>,
}

impl HttpContentSource {
    pub fn new(config: &ContentConfig) -> Result<Self, ContentError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| ContentError::Decode(format!("invalid endpoint {}: {}", config.endpoint, e)))?;

        let client = Client::builder()
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
            master_ref: RwLock::new(None),
        })
    }

    /// Published ref, cached for a short while
    async fn master_ref(&self) -> Result<String, ContentError> {
        if let Some((content_ref, fetched)) = self.master_ref.read().await.as_ref() {
            if fetched.elapsed() < MASTER_REF_TTL {
                return Ok(content_ref.clone());
            }
        }

        let mut url = self.endpoint.clone();
        if let Some(token) = &self.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }

        let info: ApiInfo = self.get_json(url).await?;
        let master = info
            .refs
            .into_iter()
            .find(|r| r.is_master)
            .map(|r| r.content_ref)
            .ok_or_else(|| ContentError::Decode("API exposes no master ref".to_string()))?;

        tracing::debug!("Master ref is {}", master);
        *self.master_ref.write().await = Some((master.clone(), Instant::now()));
        Ok(master)
    }

    async fn resolve_ref(&self, content_ref: Option<&str>) -> Result<String, ContentError> {
        match content_ref {
            Some(content_ref) => Ok(content_ref.to_string()),
            None => self.master_ref().await,
        }
    }

    fn search_url(&self) -> Result<Url, ContentError> {
        let mut url = self.endpoint.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|_| ContentError::Decode(format!("endpoint {} cannot be a base", self.endpoint)))?
            .pop_if_empty()
            .push("documents")
            .push("search");
        Ok(url)
    }

    /// Rebuild a `next_page` cursor for the requested ref.
    ///
    /// Cursors travel through the browser, so only URLs pointing at our own
    /// search endpoint are followed.
    fn cursor_url(&self, cursor: &str, content_ref: &str) -> Result<Url, ContentError> {
        let parsed =
            Url::parse(cursor).map_err(|_| ContentError::InvalidCursor(cursor.to_string()))?;
        let search = self.search_url()?;

        if parsed.origin() != search.origin() || parsed.path() != search.path() {
            return Err(ContentError::InvalidCursor(cursor.to_string()));
        }

        let kept: Vec<(String, String)> = parsed
            .query_pairs()
            .filter(|(k, _)| k != "ref" && k != "access_token")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut url = search;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", content_ref);
            for (k, v) in &kept {
                pairs.append_pair(k, v);
            }
            if let Some(token) = &self.access_token {
                pairs.append_pair("access_token", token);
            }
        }
        Ok(url)
    }

    fn listing_url(&self, query: &Query, content_ref: &str) -> Result<Url, ContentError> {
        let page = match &query.page {
            PageRequest::Cursor(cursor) => return self.cursor_url(cursor, content_ref),
            PageRequest::Number(n) => (*n).max(1),
        };

        let mut url = self.search_url()?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", content_ref);
            pairs.append_pair("q", &predicate("document.type", &query.doc_type));
            pairs.append_pair("pageSize", &query.page_size.max(1).to_string());
            pairs.append_pair("page", &page.to_string());
            if let Some(ordering) = query.ordering {
                pairs.append_pair("orderings", ordering.as_predicate());
            }
            if let Some(after) = &query.after {
                pairs.append_pair("after", after);
            }
            if let Some(token) = &self.access_token {
                pairs.append_pair("access_token", token);
            }
        }
        Ok(url)
    }

    /// Fetch the first document matching a single predicate
    async fn find_one(
        &self,
        path: &str,
        value: &str,
        content_ref: Option<&str>,
    ) -> Result<Document, ContentError> {
        let content_ref = self.resolve_ref(content_ref).await?;
        let mut url = self.search_url()?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", &content_ref);
            pairs.append_pair("q", &predicate(path, value));
            pairs.append_pair("pageSize", "1");
            if let Some(token) = &self.access_token {
                pairs.append_pair("access_token", token);
            }
        }

        let response: SearchResponse = self.get_json(url).await?;
        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ContentError::NotFound(value.to_string()))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, ContentError> {
        tracing::debug!("GET {}", url.path());
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ContentError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// `[[at(path,"value")]]`
fn predicate(path: &str, value: &str) -> String {
    format!(
        r#"[[at({},"{}")]]"#,
        path,
        value.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn query(&self, query: &Query) -> Result<QueryResponse, ContentError> {
        let content_ref = self.resolve_ref(query.content_ref.as_deref()).await?;
        let url = self.listing_url(query, &content_ref)?;
        let response: SearchResponse = self.get_json(url).await?;

        Ok(QueryResponse {
            results: response.results,
            next_cursor: response.next_page,
        })
    }

    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        content_ref: Option<&str>,
    ) -> Result<Document, ContentError> {
        self.find_one(&format!("my.{}.uid", doc_type), uid, content_ref)
            .await
    }

    async fn get_by_id(
        &self,
        id: &str,
        content_ref: Option<&str>,
    ) -> Result<Document, ContentError> {
        self.find_one("document.id", id, content_ref).await
    }
}
