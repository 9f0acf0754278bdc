//! Data models for the reporter.
//!
//! This module contains the core data structures passed between the
//! tracker, the aggregator, the report renderer and the wiki publisher.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// State of a tracker issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IssueState {
    Open,
    Closed,
    /// Any state the tracker reports that we have no name for.
    Other(String),
}

impl From<String> for IssueState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "opened" | "open" => IssueState::Open,
            "closed" => IssueState::Closed,
            _ => IssueState::Other(s),
        }
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueState::Open => write!(f, "opened"),
            IssueState::Closed => write!(f, "closed"),
            IssueState::Other(s) => write!(f, "{}", s),
        }
    }
}

/// One tracker item relevant to the report.
///
/// Only issues with an owner are ever constructed, so `assignee` is
/// always a non-empty name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub title: String,
    pub state: IssueState,
    pub assignee: String,
    pub url: Option<String>,
    /// Zero-padded project-local identifier, e.g. `0042`.
    pub id: Option<String>,
}

/// Field the tracker orders results by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    #[default]
    UpdatedAt,
    CreatedAt,
}

impl OrderBy {
    pub fn as_param(&self) -> &'static str {
        match self {
            OrderBy::UpdatedAt => "updated_at",
            OrderBy::CreatedAt => "created_at",
        }
    }
}

/// Sort direction of the ordering field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Server-side state restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFilter {
    Opened,
    Closed,
}

impl StateFilter {
    pub fn as_param(&self) -> &'static str {
        match self {
            StateFilter::Opened => "opened",
            StateFilter::Closed => "closed",
        }
    }
}

/// Immutable query parameters for one project fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueFilter {
    pub order_by: OrderBy,
    pub sort: SortOrder,
    pub updated_after: Option<DateTime<Utc>>,
    pub state: Option<StateFilter>,
    pub per_page: u32,
}

impl Default for IssueFilter {
    fn default() -> Self {
        Self {
            order_by: OrderBy::UpdatedAt,
            sort: SortOrder::Desc,
            updated_after: None,
            state: None,
            per_page: 100,
        }
    }
}

/// Named filters used by the different report flavours.
///
/// The preset only changes the query sent to the tracker; grouping and
/// output shape are identical for all of them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum FilterPreset {
    /// Closed issues touched within the window (weekly report).
    #[default]
    ClosedRecentlyUpdated,
    /// Issues in any state touched within the window (standup report).
    RecentlyUpdated,
    /// Every assigned issue, no time bound.
    CurrentlyAssigned,
    /// Assigned issues that are still open, no time bound.
    CurrentlyOpen,
}

impl FilterPreset {
    /// Build the filter for a run starting at `now`, with a window of
    /// `days` where the preset has one. Ordering and page size keep their
    /// defaults.
    pub fn filter(self, now: DateTime<Utc>, days: u32) -> IssueFilter {
        let window_start = now - Duration::days(i64::from(days));
        let (state, updated_after) = match self {
            FilterPreset::ClosedRecentlyUpdated => (Some(StateFilter::Closed), Some(window_start)),
            FilterPreset::RecentlyUpdated => (None, Some(window_start)),
            FilterPreset::CurrentlyAssigned => (None, None),
            FilterPreset::CurrentlyOpen => (Some(StateFilter::Opened), None),
        };

        IssueFilter {
            updated_after,
            state,
            ..IssueFilter::default()
        }
    }

    /// Heading used by the rendered report.
    pub fn heading(&self) -> &'static str {
        match self {
            FilterPreset::ClosedRecentlyUpdated => "Closed issues",
            FilterPreset::RecentlyUpdated => "Recently updated issues",
            FilterPreset::CurrentlyAssigned => "Assigned issues",
            FilterPreset::CurrentlyOpen => "Open issues",
        }
    }
}

impl fmt::Display for FilterPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterPreset::ClosedRecentlyUpdated => write!(f, "closed-recently-updated"),
            FilterPreset::RecentlyUpdated => write!(f, "recently-updated"),
            FilterPreset::CurrentlyAssigned => write!(f, "currently-assigned"),
            FilterPreset::CurrentlyOpen => write!(f, "currently-open"),
        }
    }
}

/// All issues owned by one assignee within one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssigneeGroup {
    pub assignee: String,
    pub issues: Vec<Issue>,
}

/// Assignee groups of one project, iterated in first-encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssigneeGroups {
    groups: Vec<AssigneeGroup>,
    index: HashMap<String, usize>,
}

impl AssigneeGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an issue to its assignee's group, creating the group on
    /// first encounter.
    pub fn push(&mut self, issue: Issue) {
        match self.index.get(&issue.assignee) {
            Some(&pos) => self.groups[pos].issues.push(issue),
            None => {
                self.index.insert(issue.assignee.clone(), self.groups.len());
                self.groups.push(AssigneeGroup {
                    assignee: issue.assignee.clone(),
                    issues: vec![issue],
                });
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, assignee: &str) -> Option<&AssigneeGroup> {
        self.index.get(assignee).map(|&pos| &self.groups[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssigneeGroup> {
        self.groups.iter()
    }

    pub fn assignees(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.assignee.as_str())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total issue count across all groups.
    pub fn issue_count(&self) -> usize {
        self.groups.iter().map(|g| g.issues.len()).sum()
    }
}

impl<'a> IntoIterator for &'a AssigneeGroups {
    type Item = &'a AssigneeGroup;
    type IntoIter = std::slice::Iter<'a, AssigneeGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// A configured project with its resolved assignee groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub groups: AssigneeGroups,
}

/// Current revision information of a wiki page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageVersion {
    pub id: String,
    pub title: String,
    pub number: u64,
}

/// Which page a publish call writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSlot {
    /// Search the space for this title; create the page when absent.
    Titled(String),
    /// Update this page id directly.
    Fixed(String),
}

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Created { title: String },
    Updated { page_id: String, title: String, revision: u64 },
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishOutcome::Created { title } => write!(f, "created page \"{}\"", title),
            PublishOutcome::Updated {
                page_id,
                title,
                revision,
            } => write!(
                f,
                "updated page \"{}\" (id {}) to revision {}",
                title, page_id, revision
            ),
        }
    }
}
