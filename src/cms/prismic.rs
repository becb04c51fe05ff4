//! Prismic REST API (v2) client

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

use super::lenient::seq_from_value;
use super::{CmsError, ContentSource, Document, Query, Result, ResultPage};
use crate::config::PrismicConfig;

/// How long a resolved master ref is reused before asking again
const REF_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ApiInfo {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master: bool,
}

/// Search response; `results` must be an array, its elements are parsed leniently
#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<Value>,
    #[serde(default)]
    next_page: Option<String>,
}

/// Client for a single Prismic repository
pub struct PrismicClient {
    http: Client,
    endpoint: Url,
    access_token: Option<String>,
    master_ref: Mutex<Option<(String, Instant)>>,
}

impl PrismicClient {
    /// Create a client for `endpoint`, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub fn new(endpoint: &str, access_token: Option<String>, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| CmsError::InvalidEndpoint(endpoint.to_string()))?;

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            access_token: access_token.filter(|t| !t.is_empty()),
            master_ref: Mutex::new(None),
        })
    }

    /// Create a client from the `prismic` config section
    pub fn from_config(config: &PrismicConfig) -> Result<Self> {
        Self::new(
            &config.endpoint,
            config.access_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Resolve the ref of the currently published content
    async fn master_ref(&self) -> Result<String> {
        let mut cached = self.master_ref.lock().await;
        if let Some((reference, fetched_at)) = cached.as_ref() {
            if fetched_at.elapsed() < REF_TTL {
                return Ok(reference.clone());
            }
        }

        let info: ApiInfo = self.get_json(self.with_token(self.endpoint.clone())).await?;
        let reference = info
            .refs
            .into_iter()
            .find(|r| r.is_master)
            .map(|r| r.reference)
            .ok_or(CmsError::NoMasterRef)?;

        tracing::debug!("Resolved master ref {}", reference);
        *cached = Some((reference.clone(), Instant::now()));
        Ok(reference)
    }

    fn search_url(&self, reference: &str, query: &Query) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["documents", "search"]);
        }

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", reference);
            pairs.append_pair("q", &query.predicate_string());
            if !query.fetch.is_empty() {
                pairs.append_pair("fetch", &query.fetch.join(","));
            }
            if let Some(size) = query.page_size {
                pairs.append_pair("pageSize", &size.to_string());
            }
        }

        self.with_token(url)
    }

    fn with_token(&self, mut url: Url) -> Url {
        if let Some(token) = &self.access_token {
            if !url.query_pairs().any(|(key, _)| key == "access_token") {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }
        url
    }

    /// Only follow tokens that stay on the repository's origin
    fn next_page_url(&self, token: &str) -> Result<Url> {
        let url = Url::parse(token).map_err(|e| CmsError::InvalidToken {
            token: token.to_string(),
            reason: e.to_string(),
        })?;

        if url.origin() != self.endpoint.origin() {
            return Err(CmsError::InvalidToken {
                token: token.to_string(),
                reason: "points outside the content repository".to_string(),
            });
        }

        Ok(self.with_token(url))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let shown = redact(&url);
        tracing::debug!("GET {}", shown);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CmsError::Status {
                status: status.as_u16(),
                url: shown,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn search(&self, url: Url) -> Result<ResultPage> {
        let response: SearchResponse = self.get_json(url).await?;
        let results: Vec<Document> = seq_from_value(Value::Array(response.results));

        Ok(ResultPage {
            results,
            next_page: response.next_page.filter(|p| !p.is_empty()),
        })
    }
}

#[async_trait]
impl ContentSource for PrismicClient {
    async fn query(&self, query: &Query) -> Result<ResultPage> {
        let reference = self.master_ref().await?;
        self.search(self.search_url(&reference, query)).await
    }

    async fn fetch_next(&self, token: &str) -> Result<ResultPage> {
        let url = self.next_page_url(token)?;
        self.search(url).await
    }

    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<Option<Document>> {
        let page = self.query(&Query::by_uid(document_type, uid)).await?;
        Ok(page.results.into_iter().next())
    }
}

/// Hide the access token when a URL is logged or reported
fn redact(url: &Url) -> String {
    if !url.query_pairs().any(|(key, _)| key == "access_token") {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            if key == "access_token" {
                (key.into_owned(), "***".to_string())
            } else {
                (key.into_owned(), value.into_owned())
            }
        })
        .collect();

    let mut shown = url.clone();
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(token: Option<&str>) -> PrismicClient {
        PrismicClient::new(
            "https://blog.cdn.prismic.io/api/v2",
            token.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        assert!(matches!(
            PrismicClient::new("not a url", None, Duration::from_secs(1)),
            Err(CmsError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            PrismicClient::new("mailto:someone@example.com", None, Duration::from_secs(1)),
            Err(CmsError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_search_url() {
        let query = Query::documents_of_type("posts")
            .fetch(vec!["posts.title".to_string(), "posts.author".to_string()])
            .page_size(Some(2));
        let url = client(Some("secret")).search_url("master-ref", &query);

        assert_eq!(url.path(), "/api/v2/documents/search");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("ref".to_string(), "master-ref".to_string()),
                ("q".to_string(), r#"[[at(document.type,"posts")]]"#.to_string()),
                ("fetch".to_string(), "posts.title,posts.author".to_string()),
                ("pageSize".to_string(), "2".to_string()),
                ("access_token".to_string(), "secret".to_string()),
            ]
        );
    }

    #[test]
    fn test_next_page_must_stay_on_origin() {
        let client = client(None);
        assert!(client
            .next_page_url("https://blog.cdn.prismic.io/api/v2/documents/search?page=2")
            .is_ok());
        assert!(matches!(
            client.next_page_url("https://evil.example.com/api/v2/documents/search?page=2"),
            Err(CmsError::InvalidToken { .. })
        ));
        assert!(matches!(
            client.next_page_url("/relative"),
            Err(CmsError::InvalidToken { .. })
        ));
    }

    #[test]
    fn test_token_not_duplicated() {
        let client = client(Some("secret"));
        let url = client
            .next_page_url("https://blog.cdn.prismic.io/api/v2/documents/search?page=2&access_token=secret")
            .unwrap();
        assert_eq!(
            url.query_pairs().filter(|(key, _)| key == "access_token").count(),
            1
        );
    }

    #[tokio::test]
    async fn test_transport_error_hides_token() {
        // nothing listens on a port right after its listener is dropped
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let endpoint = format!("http://{}/api/v2", addr);
        let client = PrismicClient::new(
            &endpoint,
            Some("supersecret".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();

        let err = client
            .fetch_next(&format!("{}/documents/search?page=2", endpoint))
            .await
            .unwrap_err();
        assert!(matches!(err, CmsError::Http(_)));
        assert!(!err.to_string().contains("supersecret"));
        assert!(!format!("{:?}", err).contains("supersecret"));
        assert!(!format!("{:#}", anyhow::Error::from(err)).contains("supersecret"));
    }

    #[test]
    fn test_redact() {
        let url = Url::parse("https://blog.cdn.prismic.io/api/v2?access_token=secret&ref=x").unwrap();
        let shown = redact(&url);
        assert!(!shown.contains("secret"));
        assert!(shown.contains("ref=x"));
    }
}
