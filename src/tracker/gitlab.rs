//! GitLab v4 REST client for project issues.

use crate::error::ApiError;
use crate::http::{check_response, decode_json};
use crate::models::IssueFilter;
use crate::tracker::{IssuePage, IssueSource, PageInfo, RawIssue};
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::header::HeaderMap;
use tracing::debug;

/// Issue source backed by the GitLab HTTP API.
pub struct GitLabClient {
    http: reqwest::Client,
    endpoint: String,
    user: String,
    password: String,
}

impl GitLabClient {
    pub fn new(http: reqwest::Client, endpoint: &str, user: &str, password: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            user: user.to_string(),
            password: password.to_string(),
        }
    }

    fn issues_url(&self, project: &str) -> String {
        format!(
            "{}/api/v4/projects/{}/issues",
            self.endpoint,
            urlencoding::encode(project)
        )
    }
}

/// Query parameters for one page request.
fn issue_query(filter: &IssueFilter, page: u32) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("order_by", filter.order_by.as_param().to_string()),
        ("sort", filter.sort.as_param().to_string()),
    ];

    if let Some(after) = filter.updated_after {
        query.push((
            "updated_after",
            after.to_rfc3339_opts(SecondsFormat::Secs, true),
        ));
    }
    if let Some(state) = filter.state {
        query.push(("state", state.as_param().to_string()));
    }

    query.push(("per_page", filter.per_page.to_string()));
    query.push(("page", page.to_string()));
    query
}

fn header_u32(headers: &HeaderMap, name: &str) -> Option<u32> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Read GitLab's pagination headers. `requested` stands in for a
/// missing `X-Page`.
fn page_info(headers: &HeaderMap, requested: u32) -> PageInfo {
    PageInfo {
        current: header_u32(headers, "x-page").unwrap_or(requested),
        total: header_u32(headers, "x-total-pages"),
        next: header_u32(headers, "x-next-page"),
    }
}

#[async_trait]
impl IssueSource for GitLabClient {
    async fn list_issues(
        &self,
        project: &str,
        filter: &IssueFilter,
        page: u32,
    ) -> Result<IssuePage, ApiError> {
        let url = self.issues_url(project);
        debug!("GET {} (page {})", url, page);

        let resp = self
            .http
            .get(&url)
            .basic_auth(&self.user, Some(&self.password))
            .query(&issue_query(filter, page))
            .send()
            .await?;
        let resp = check_response(resp).await?;

        let info = page_info(resp.headers(), page);
        let issues: Vec<RawIssue> = decode_json(resp).await?;

        Ok(IssuePage { issues, info })
    }
}
