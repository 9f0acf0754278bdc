//! Confluence REST client.

use crate::error::ApiError;
use crate::http::{check_response, decode_json};
use crate::models::PageVersion;
use crate::wiki::{NewPage, PageUpdate, SearchResults, WikiApi};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const PAGE_TYPE: &str = "page";
const STORAGE_REPRESENTATION: &str = "storage";

#[derive(Debug, Serialize)]
struct Storage<'a> {
    value: &'a str,
    representation: &'static str,
}

#[derive(Debug, Serialize)]
struct Body<'a> {
    storage: Storage<'a>,
}

impl<'a> Body<'a> {
    fn storage(value: &'a str) -> Self {
        Self {
            storage: Storage {
                value,
                representation: STORAGE_REPRESENTATION,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct SpaceRef<'a> {
    key: &'a str,
}

#[derive(Debug, Serialize)]
struct Ancestor<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize, Deserialize)]
struct Version {
    number: u64,
}

/// POST body for a new page.
#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    title: &'a str,
    space: SpaceRef<'a>,
    ancestors: Vec<Ancestor<'a>>,
    body: Body<'a>,
}

/// PUT body for a page update.
#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    title: &'a str,
    body: Body<'a>,
    version: Version,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    id: String,
    title: String,
    version: Version,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    size: usize,
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: String,
}

impl<'a> From<&'a NewPage> for CreateRequest<'a> {
    fn from(page: &'a NewPage) -> Self {
        Self {
            kind: PAGE_TYPE,
            title: &page.title,
            space: SpaceRef { key: &page.space },
            ancestors: vec![Ancestor {
                id: &page.ancestor_id,
            }],
            body: Body::storage(&page.body),
        }
    }
}

impl<'a> From<&'a PageUpdate> for UpdateRequest<'a> {
    fn from(update: &'a PageUpdate) -> Self {
        Self {
            id: &update.id,
            kind: PAGE_TYPE,
            title: &update.title,
            body: Body::storage(&update.body),
            version: Version {
                number: update.version,
            },
        }
    }
}

impl TryFrom<SearchResponse> for SearchResults {
    type Error = ApiError;

    fn try_from(resp: SearchResponse) -> Result<Self, Self::Error> {
        let ids: Vec<String> = resp.results.into_iter().map(|hit| hit.id).collect();
        if resp.size == 1 && ids.is_empty() {
            return Err(ApiError::Decode(
                "search reported one match but returned no id".to_string(),
            ));
        }
        Ok(SearchResults {
            size: resp.size,
            ids,
        })
    }
}

/// Wiki API backed by Confluence's `/rest/api/content` endpoints.
pub struct ConfluenceClient {
    http: reqwest::Client,
    endpoint: String,
    user: String,
    password: String,
}

impl ConfluenceClient {
    pub fn new(http: reqwest::Client, endpoint: &str, user: &str, password: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            user: user.to_string(),
            password: password.to_string(),
        }
    }

    fn content_url(&self) -> String {
        format!("{}/rest/api/content", self.endpoint)
    }

    fn page_url(&self, id: &str) -> String {
        format!("{}/{}", self.content_url(), urlencoding::encode(id))
    }
}

#[async_trait]
impl WikiApi for ConfluenceClient {
    async fn find_by_title(&self, space: &str, title: &str) -> Result<SearchResults, ApiError> {
        let url = self.content_url();
        debug!("GET {} (space {}, title {:?})", url, space, title);

        let resp = self
            .http
            .get(&url)
            .basic_auth(&self.user, Some(&self.password))
            .query(&[("spaceKey", space), ("title", title)])
            .send()
            .await?;
        let resp = check_response(resp).await?;

        let search: SearchResponse = decode_json(resp).await?;
        SearchResults::try_from(search)
    }

    async fn current_version(&self, id: &str) -> Result<PageVersion, ApiError> {
        let url = self.page_url(id);
        debug!("GET {}", url);

        let resp = self
            .http
            .get(&url)
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await?;
        let resp = check_response(resp).await?;

        let content: ContentResponse = decode_json(resp).await?;
        Ok(PageVersion {
            id: content.id,
            title: content.title,
            number: content.version.number,
        })
    }

    async fn create_page(&self, page: &NewPage) -> Result<(), ApiError> {
        let url = format!("{}/", self.content_url());
        debug!("POST {} (title {:?})", url, page.title);

        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&CreateRequest::from(page))
            .send()
            .await?;
        check_response(resp).await?;
        Ok(())
    }

    async fn update_page(&self, update: &PageUpdate) -> Result<(), ApiError> {
        let url = self.page_url(&update.id);
        debug!("PUT {} (version {})", url, update.version);

        let resp = self
            .http
            .put(&url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&UpdateRequest::from(update))
            .send()
            .await?;
        check_response(resp).await?;
        Ok(())
    }
}
