//! HTTP client for the Prismic REST API (v2)

use reqwest::{header, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{ContentSource, Query};
use crate::config::PrismicConfig;
use crate::content::{PostPage, SearchResponse};
use crate::error::FetchError;

/// API descriptor returned by the repository root
#[derive(Debug, Clone, Deserialize)]
pub struct ApiInfo {
    pub refs: Vec<ApiRef>,
}

/// A content release
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRef {
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}

impl ApiInfo {
    /// The ref of the published content
    pub fn master_ref(&self) -> Option<&str> {
        self.refs
            .iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference.as_str())
    }
}

/// Client bound to one Prismic repository
#[derive(Debug, Clone)]
pub struct PrismicClient {
    client: reqwest::Client,
    endpoint: Url,
    access_token: Option<String>,
    document_type: String,
    fetch: Vec<String>,
}

impl PrismicClient {
    /// Create a client for the repository described by `config`
    pub fn new(config: &PrismicConfig) -> Result<Self, FetchError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|_| FetchError::InvalidUrl(config.endpoint.clone()))?;
        if endpoint.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(config.endpoint.clone()));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::ACCEPT,
                    header::HeaderValue::from_static("application/json"),
                );
                headers
            })
            .build()?;

        Ok(Self {
            client,
            endpoint,
            access_token: config.access_token.clone(),
            document_type: config.document_type.clone(),
            fetch: config.fetch_fields(),
        })
    }

    /// Fetch the API descriptor
    pub async fn api_info(&self) -> Result<ApiInfo, FetchError> {
        let mut url = self.endpoint.clone();
        self.authorize(&mut url);
        self.get_json(url).await
    }

    /// Run a document search against the master ref
    pub async fn query(&self, query: &Query) -> Result<PostPage, FetchError> {
        let info = self.api_info().await?;
        let master_ref = info.master_ref().ok_or(FetchError::NoMasterRef)?;
        let url = self.search_url(master_ref, query)?;

        let response: SearchResponse = self.get_json(url).await?;
        Ok(PostPage::from(response))
    }

    /// Build `{endpoint}/documents/search?ref=..&q=..`
    pub fn search_url(&self, master_ref: &str, query: &Query) -> Result<Url, FetchError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.endpoint.to_string()))?
            .pop_if_empty()
            .push("documents")
            .push("search");

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", master_ref);
            for (key, value) in query.params() {
                pairs.append_pair(key, &value);
            }
        }
        self.authorize(&mut url);
        Ok(url)
    }

    /// Parse a cursor, refusing hosts other than the configured repository
    pub fn cursor_url(&self, cursor: &str) -> Result<Url, FetchError> {
        let url = Url::parse(cursor).map_err(|_| FetchError::InvalidUrl(cursor.to_string()))?;
        if url.origin() != self.endpoint.origin() {
            return Err(FetchError::ForeignCursor(cursor.to_string()));
        }
        Ok(url)
    }

    fn authorize(&self, url: &mut Url) {
        if let Some(token) = &self.access_token {
            let present = url.query_pairs().any(|(k, _)| k == "access_token");
            if !present {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        tracing::debug!(url = %redact(&url), "GET");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: redact(&url),
                status,
            });
        }

        let body = response.text().await.map_err(reqwest::Error::without_url)?;
        serde_json::from_str(&body).map_err(|source| FetchError::Decode {
            url: redact(&url),
            source,
        })
    }
}

impl ContentSource for PrismicClient {
    async fn fetch_first_page(&self, page_size: usize) -> Result<PostPage, FetchError> {
        let query = Query::document_type(&self.document_type)
            .fetch(self.fetch.iter().cloned())
            .page_size(page_size);
        let page = self.query(&query).await?;
        tracing::info!(
            "Fetched {} {} (next page: {})",
            page.results.len(),
            self.document_type,
            page.next_page().is_some()
        );
        Ok(page)
    }

    async fn fetch_page(&self, cursor: &str) -> Result<PostPage, FetchError> {
        let mut url = self.cursor_url(cursor)?;
        self.authorize(&mut url);
        let response: SearchResponse = self.get_json(url).await?;
        Ok(PostPage::from(response))
    }
}

/// URL for logs and errors, with the access token masked
fn redact(url: &Url) -> String {
    if !url.query_pairs().any(|(k, _)| k == "access_token") {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "access_token" {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(token: Option<&str>) -> PrismicClient {
        let config = PrismicConfig {
            endpoint: "https://blog.cdn.prismic.io/api/v2".to_string(),
            access_token: token.map(String::from),
            ..Default::default()
        };
        PrismicClient::new(&config).unwrap()
    }

    #[test]
    fn test_invalid_endpoint() {
        let config = PrismicConfig::default();
        assert!(matches!(
            PrismicClient::new(&config),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_search_url() {
        let client = client(None);
        let query = Query::document_type("posts")
            .fetch(["posts.title"])
            .page_size(1);
        let url = client.search_url("YF1x", &query).unwrap();

        assert_eq!(url.path(), "/api/v2/documents/search");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("ref".to_string(), "YF1x".to_string()),
                ("q".to_string(), r#"[[at(document.type, "posts")]]"#.to_string()),
                ("fetch".to_string(), "posts.title".to_string()),
                ("pageSize".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_search_url_with_token() {
        let client = client(Some("secret"));
        let url = client.search_url("YF1x", &Query::document_type("posts")).unwrap();
        assert!(url
            .query_pairs()
            .any(|(k, v)| k == "access_token" && v == "secret"));
        let redacted = redact(&url);
        assert!(redacted.contains("access_token=***"));
        assert!(!redacted.contains("secret"));
    }

    #[test]
    fn test_cursor_must_share_origin() {
        let client = client(None);
        let cursor = "https://blog.cdn.prismic.io/api/v2/documents/search?ref=YF1x&page=2";
        assert!(client.cursor_url(cursor).is_ok());

        assert!(matches!(
            client.cursor_url("https://evil.example.com/api/v2/documents/search"),
            Err(FetchError::ForeignCursor(_))
        ));
        assert!(matches!(
            client.cursor_url("not a url"),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_master_ref() {
        let json = r#"{"refs": [
            {"id": "preview", "ref": "P1", "label": "Preview"},
            {"id": "master", "ref": "M1", "label": "Master", "isMasterRef": true}
        ], "types": {"posts": "Posts"}}"#;
        let info: ApiInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.master_ref(), Some("M1"));
    }
}
