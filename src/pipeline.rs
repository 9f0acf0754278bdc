//! Report run orchestration.
//!
//! Projects are fetched and grouped one at a time. The page is only
//! published after every project succeeded.

use crate::analysis::group_by_assignee;
use crate::error::{FetchError, PublishError, RunError};
use crate::models::{IssueFilter, PageSlot, Project, PublishOutcome};
use crate::report::{render_storage, ReportMeta};
use crate::tracker::{IssueFetcher, IssueSource};
use crate::wiki::{PagePublisher, WikiApi};
use chrono::{DateTime, TimeZone};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::{Display, Write};
use std::time::Duration;
use tracing::{debug, info};

/// Everything one run needs besides the remote clients.
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// `(project id, display name)` in report order.
    pub projects: Vec<(String, String)>,
    pub filter: IssueFilter,
    pub slot: PageSlot,
    pub meta: ReportMeta,
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub projects: usize,
    pub issues: usize,
    pub outcome: PublishOutcome,
}

/// Fetch-aggregate-render-publish pipeline over injected clients.
pub struct Pipeline<S, W> {
    fetcher: IssueFetcher<S>,
    publisher: PagePublisher<W>,
    progress: ProgressBar,
}

impl<S: IssueSource, W: WikiApi> Pipeline<S, W> {
    pub fn new(fetcher: IssueFetcher<S>, publisher: PagePublisher<W>) -> Self {
        Self {
            fetcher,
            publisher,
            progress: ProgressBar::hidden(),
        }
    }

    /// Show a spinner while projects are fetched.
    pub fn with_progress(mut self) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(120));
        self.progress = spinner;
        self
    }

    /// Fetch and group every project. The first failure aborts the rest.
    pub async fn collect(
        &self,
        projects: &[(String, String)],
        filter: &IssueFilter,
    ) -> Result<Vec<Project>, FetchError> {
        let mut collected = Vec::with_capacity(projects.len());

        for (id, name) in projects {
            self.progress.set_message(format!("Fetching {} ({})", name, id));

            let issues = match self.fetcher.fetch(id, filter).await {
                Ok(issues) => issues,
                Err(e) => {
                    self.progress.abandon_with_message(format!("Failed on {}", name));
                    return Err(e);
                }
            };
            let groups = group_by_assignee(issues);
            info!(
                "Project {} ({}): {} issues across {} assignees",
                name,
                id,
                groups.issue_count(),
                groups.len()
            );
            debug!("Assignees of {}: {:?}", name, groups.assignees().collect::<Vec<_>>());

            collected.push(Project {
                id: id.clone(),
                name: name.clone(),
                groups,
            });
        }

        self.progress.finish_and_clear();
        Ok(collected)
    }

    /// Publish an already rendered body.
    pub async fn publish(
        &self,
        slot: &PageSlot,
        body: &str,
    ) -> Result<PublishOutcome, PublishError> {
        self.publisher.publish(slot, body).await
    }

    /// Run the whole pipeline for `plan`.
    pub async fn run(&self, plan: &RunPlan) -> Result<RunSummary, RunError> {
        let projects = self.collect(&plan.projects, &plan.filter).await?;
        let body = render_storage(&projects, &plan.meta);
        let outcome = self.publish(&plan.slot, &body).await?;

        Ok(RunSummary {
            projects: projects.len(),
            issues: projects.iter().map(|p| p.groups.issue_count()).sum(),
            outcome,
        })
    }
}

/// Page title for a run at `now`: `prefix` followed by the formatted date.
///
/// Fails on an invalid chrono format string.
pub fn page_title<Tz>(
    now: &DateTime<Tz>,
    prefix: &str,
    format: &str,
) -> Result<String, std::fmt::Error>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut title = prefix.to_string();
    write!(title, "{}", now.format(format))?;
    Ok(title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PublishStep;
    use crate::models::FilterPreset;
    use crate::testing::{page_of, raw_issue, InMemoryWiki, StubTracker, WikiCall};
    use crate::tracker::fetcher::DEFAULT_ID_WIDTH;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn plan(projects: &[(&str, &str)], title: &str) -> RunPlan {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        RunPlan {
            projects: projects
                .iter()
                .map(|(id, name)| (id.to_string(), name.to_string()))
                .collect(),
            filter: FilterPreset::ClosedRecentlyUpdated.filter(now, 7),
            slot: PageSlot::Titled(title.to_string()),
            meta: ReportMeta {
                preset: FilterPreset::ClosedRecentlyUpdated,
                generated_at: now,
                updated_after: None,
            },
        }
    }

    fn pipeline(tracker: StubTracker, wiki: InMemoryWiki) -> Pipeline<StubTracker, InMemoryWiki> {
        Pipeline::new(
            IssueFetcher::new(tracker, DEFAULT_ID_WIDTH),
            PagePublisher::new(wiki, "TEAM", "1000"),
        )
    }

    #[tokio::test]
    async fn test_run_creates_page_with_all_projects() {
        let tracker = StubTracker::new()
            .with_project(
                "1",
                vec![
                    page_of(1, 2, vec![raw_issue(1, "a", Some("Bob")), raw_issue(2, "b", None)]),
                    page_of(2, 2, vec![raw_issue(3, "c", Some("Alice"))]),
                ],
            )
            .with_project("2", vec![page_of(1, 1, vec![raw_issue(9, "d", Some("Bob"))])]);
        let pipeline = pipeline(tracker, InMemoryWiki::new());

        let summary = pipeline
            .run(&plan(&[("1", "Backend"), ("2", "Frontend")], "2024-01-01"))
            .await
            .unwrap();

        assert_eq!(summary.projects, 2);
        assert_eq!(summary.issues, 3);
        assert_eq!(
            summary.outcome,
            PublishOutcome::Created {
                title: "2024-01-01".to_string()
            }
        );
        assert_eq!(pipeline.publisher().api().page_count(), 1);
        assert_eq!(pipeline.fetcher_source().requested_projects(), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_collect_groups_across_pages_in_arrival_order() {
        let mut first: Vec<_> = (1..=100u64).map(|iid| raw_issue(iid, "x", None)).collect();
        first[9] = raw_issue(10, "a", Some("Bob"));
        first[19] = raw_issue(20, "b", Some("Alice"));
        first[29] = raw_issue(30, "c", Some("Bob"));
        let tracker = StubTracker::new().with_project(
            "1",
            vec![page_of(1, 2, first), page_of(2, 2, vec![raw_issue(101, "d", Some("Alice"))])],
        );
        let pipeline = pipeline(tracker, InMemoryWiki::new());
        let plan = plan(&[("1", "Backend")], "2024-01-01");

        let projects = pipeline.collect(&plan.projects, &plan.filter).await.unwrap();

        let groups = &projects[0].groups;
        assert_eq!(groups.issue_count(), 4);
        assert_eq!(groups.assignees().collect::<Vec<_>>(), vec!["Bob", "Alice"]);
        assert!(pipeline.publisher().api().calls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_publishes_nothing() {
        let tracker = StubTracker::new()
            .with_project("1", vec![page_of(1, 1, vec![raw_issue(1, "a", Some("Bob"))])])
            .fail_page("2", 1, 401, "401 Unauthorized");
        let pipeline = pipeline(tracker, InMemoryWiki::new());

        let err = pipeline
            .run(&plan(&[("1", "Backend"), ("2", "Frontend"), ("3", "Docs")], "2024-01-01"))
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::Fetch(ref e) if e.project == "2"));
        assert!(pipeline.publisher().api().calls().is_empty());
        // later projects are never requested
        assert_eq!(pipeline.fetcher_source().requested_projects(), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_second_run_same_day_updates() {
        let tracker = StubTracker::new()
            .with_project("1", vec![page_of(1, 1, vec![raw_issue(1, "a", Some("Bob"))])]);
        let pipeline = pipeline(tracker, InMemoryWiki::new());
        let plan = plan(&[("1", "Backend")], "2024-01-01");

        pipeline.run(&plan).await.unwrap();
        let second = pipeline.run(&plan).await.unwrap();

        assert!(matches!(second.outcome, PublishOutcome::Updated { revision: 2, .. }));
        assert_eq!(pipeline.publisher().api().page_count(), 1);
        let creates = pipeline
            .publisher()
            .api()
            .calls()
            .into_iter()
            .filter(|c| matches!(c, WikiCall::Create { .. }))
            .count();
        assert_eq!(creates, 1);
    }

    #[tokio::test]
    async fn test_publish_failure_surfaces() {
        let tracker = StubTracker::new().with_project("1", vec![page_of(1, 0, vec![])]);
        let wiki = InMemoryWiki::new();
        wiki.reject(PublishStep::Search, 403, "forbidden");
        let pipeline = pipeline(tracker, wiki);

        let err = pipeline
            .run(&plan(&[("1", "Backend")], "2024-01-01"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RunError::Publish(PublishError::Rejected {
                step: PublishStep::Search,
                ..
            })
        ));
    }

    #[test]
    fn test_page_title() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 0).unwrap();
        assert_eq!(page_title(&now, "", "%Y-%m-%d").unwrap(), "2024-01-01");
        assert_eq!(
            page_title(&now, "Standup ", "%d.%m.%Y").unwrap(),
            "Standup 01.01.2024"
        );
        assert!(page_title(&now, "", "%Q").is_err());
    }

    impl<S: IssueSource, W: WikiApi> Pipeline<S, W> {
        fn fetcher_source(&self) -> &S {
            self.fetcher.source()
        }

        fn publisher(&self) -> &PagePublisher<W> {
            &self.publisher
        }
    }
}
