//! Issue tracker access.
//!
//! [`IssueSource`] is the page-level boundary to the tracker API;
//! [`IssueFetcher`] walks every page of a project and maps the raw records.

pub mod fetcher;
pub mod gitlab;

pub use fetcher::IssueFetcher;
pub use gitlab::GitLabClient;

use crate::error::ApiError;
use crate::models::IssueFilter;
use async_trait::async_trait;
use serde::Deserialize;

/// Issue record as the tracker returns it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawIssue {
    #[serde(default)]
    pub iid: Option<u64>,
    pub title: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub assignee: Option<RawUser>,
    #[serde(default)]
    pub web_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUser {
    pub name: String,
}

/// Pagination metadata of one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub current: u32,
    /// Absent when the tracker does not count the result set.
    pub total: Option<u32>,
    pub next: Option<u32>,
}

impl PageInfo {
    /// Page to request after this one, or `None` when this was the last.
    ///
    /// The returned page is always greater than `current`. A total of
    /// zero (empty project) ends the walk after the first page.
    pub fn next_cursor(&self) -> Option<u32> {
        let advancing = self.next.filter(|&n| n > self.current);
        match self.total {
            Some(total) if self.current >= total => None,
            Some(_) => Some(advancing.unwrap_or(self.current + 1)),
            None => advancing,
        }
    }
}

/// One page of raw issues plus its pagination metadata.
#[derive(Debug, Clone)]
pub struct IssuePage {
    pub issues: Vec<RawIssue>,
    pub info: PageInfo,
}

/// Page-level access to a project's issues.
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// Request a single page (1-based) of a project's issues.
    async fn list_issues(
        &self,
        project: &str,
        filter: &IssueFilter,
        page: u32,
    ) -> Result<IssuePage, ApiError>;
}
