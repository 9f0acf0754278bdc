//! Paginated issue retrieval for one project.

use crate::error::FetchError;
use crate::models::{Issue, IssueFilter, IssueState};
use crate::tracker::{IssueSource, PageInfo, RawIssue};
use tracing::debug;

/// Identifier width used when none is configured.
pub const DEFAULT_ID_WIDTH: usize = 4;

/// Retrieves every assigned issue of a project across all result pages.
pub struct IssueFetcher<S> {
    source: S,
    id_width: usize,
}

impl<S: IssueSource> IssueFetcher<S> {
    pub fn new(source: S, id_width: usize) -> Self {
        Self { source, id_width }
    }

    #[cfg(test)]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch all issues of `project` matching `filter`, in server order.
    ///
    /// Unassigned records are dropped. Any failing page fails the whole
    /// fetch; no partial result is returned.
    pub async fn fetch(
        &self,
        project: &str,
        filter: &IssueFilter,
    ) -> Result<Vec<Issue>, FetchError> {
        let mut output = Vec::new();
        let mut cursor = Some(1u32);

        while let Some(page) = cursor {
            let response = self
                .source
                .list_issues(project, filter, page)
                .await
                .map_err(|source| FetchError {
                    project: project.to_string(),
                    page,
                    source,
                })?;

            let received = response.issues.len();
            output.extend(
                response
                    .issues
                    .into_iter()
                    .filter_map(|raw| to_issue(raw, self.id_width)),
            );

            debug!(
                "Project {} page {}/{}: {} records",
                project,
                page,
                response
                    .info
                    .total
                    .map_or_else(|| "?".to_string(), |t| t.to_string()),
                received
            );

            // The page we asked for, not the server's X-Page echo, decides
            // where the walk continues. Never go back to a consumed page.
            let info = PageInfo {
                current: page.max(response.info.current),
                ..response.info
            };
            cursor = info.next_cursor().filter(|&next| next > page);
        }

        Ok(output)
    }
}

/// Map a raw record into an [`Issue`], or `None` when it has no owner.
pub fn to_issue(raw: RawIssue, id_width: usize) -> Option<Issue> {
    let assignee = raw.assignee.map(|u| u.name).filter(|name| !name.is_empty())?;

    Some(Issue {
        title: raw.title,
        state: IssueState::from(raw.state),
        assignee,
        url: raw.web_url,
        id: raw.iid.map(|iid| pad_id(iid, id_width)),
    })
}

/// Zero-pad a numeric identifier to `width` digits.
pub fn pad_id(iid: u64, width: usize) -> String {
    format!("{:0width$}", iid, width = width)
}
