//! Issue aggregation and statistics.
//!
//! This module groups fetched issues by assignee and computes the
//! summary figures shown at the top of the report.

use crate::models::{AssigneeGroups, Issue, IssueState, Project};

/// Group issues by assignee, keeping arrival order within each group.
///
/// Groups appear in the order their assignee was first seen. Empty
/// input gives empty groups.
pub fn group_by_assignee(issues: Vec<Issue>) -> AssigneeGroups {
    let mut grouped = AssigneeGroups::new();

    for issue in issues {
        grouped.push(issue);
    }

    grouped
}

/// Summary figures of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub name: String,
    pub assignees: usize,
    pub issues: usize,
    pub open: usize,
    pub closed: usize,
}

/// Per-project summary rows, in project order.
pub fn summarize(projects: &[Project]) -> Vec<ProjectSummary> {
    projects
        .iter()
        .map(|project| {
            let (open, closed) = state_counts(&project.groups);
            ProjectSummary {
                name: project.name.clone(),
                assignees: project.groups.len(),
                issues: project.groups.issue_count(),
                open,
                closed,
            }
        })
        .collect()
}

/// Count open and closed issues; other states count towards neither.
fn state_counts(groups: &AssigneeGroups) -> (usize, usize) {
    groups
        .iter()
        .flat_map(|g| &g.issues)
        .fold((0, 0), |(open, closed), issue| match issue.state {
            IssueState::Open => (open + 1, closed),
            IssueState::Closed => (open, closed + 1),
            IssueState::Other(_) => (open, closed),
        })
}

/// Total issues across all projects.
pub fn total_issues(projects: &[Project]) -> usize {
    projects.iter().map(|p| p.groups.issue_count()).sum()
}

/// Assignees with the most issues across all projects, highest first.
///
/// Ties keep first-encounter order.
pub fn busiest_assignees(projects: &[Project], n: usize) -> Vec<(String, usize)> {
    let mut totals: Vec<(String, usize)> = Vec::new();

    for group in projects.iter().flat_map(|p| p.groups.iter()) {
        match totals.iter_mut().find(|(name, _)| *name == group.assignee) {
            Some((_, count)) => *count += group.issues.len(),
            None => totals.push((group.assignee.clone(), group.issues.len())),
        }
    }

    totals.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    totals.truncate(n);
    totals
}
