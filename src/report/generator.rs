//! Report body generation.
//!
//! This module renders the aggregated projects into Confluence storage
//! format for publishing, and into plain text for dry runs.

use crate::analysis::{busiest_assignees, summarize, total_issues};
use crate::models::{AssigneeGroup, FilterPreset, Issue, Project};
use chrono::{DateTime, Utc};

/// Context shown in the report header.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub preset: FilterPreset,
    pub generated_at: DateTime<Utc>,
    /// Lower bound of the update window, if the preset has one.
    pub updated_after: Option<DateTime<Utc>>,
}

/// Generate the complete storage-format body.
pub fn render_storage(projects: &[Project], meta: &ReportMeta) -> String {
    let mut output = String::new();

    output.push_str(&generate_header(meta));
    output.push_str(&generate_summary_table(projects));

    for project in projects {
        output.push_str(&generate_project_section(project));
    }

    output
}

fn generate_header(meta: &ReportMeta) -> String {
    let mut section = String::new();

    section.push_str(&format!("<h1>{}</h1>\n", escape(meta.preset.heading())));
    let window = match meta.updated_after {
        Some(after) => format!(
            "Updated since {} | ",
            after.format("%Y-%m-%d %H:%M UTC")
        ),
        None => String::new(),
    };
    section.push_str(&format!(
        "<p><em>{}Generated {}</em></p>\n",
        window,
        meta.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    section
}

fn generate_summary_table(projects: &[Project]) -> String {
    let mut table = String::new();

    table.push_str("<table>\n<tbody>\n");
    table.push_str(concat!(
        "<tr><th>Project</th><th>Assignees</th><th>Issues</th>",
        "<th>Open</th><th>Closed</th></tr>\n"
    ));

    for row in summarize(projects) {
        table.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&row.name),
            row.assignees,
            row.issues,
            row.open,
            row.closed
        ));
    }

    table.push_str(&format!(
        concat!(
            "<tr><td><strong>Total</strong></td><td></td>",
            "<td><strong>{}</strong></td><td></td><td></td></tr>\n"
        ),
        total_issues(projects)
    ));
    table.push_str("</tbody>\n</table>\n");

    table
}

fn generate_project_section(project: &Project) -> String {
    let mut section = String::new();

    section.push_str(&format!("<h2>{}</h2>\n", escape(&project.name)));

    if project.groups.is_empty() {
        section.push_str("<p>No matching issues.</p>\n");
        return section;
    }

    for group in &project.groups {
        section.push_str(&generate_group_block(group));
    }

    section
}

fn generate_group_block(group: &AssigneeGroup) -> String {
    let mut block = String::new();

    block.push_str(&format!(
        "<h3>{} ({})</h3>\n<ul>\n",
        escape(&group.assignee),
        group.issues.len()
    ));
    for issue in &group.issues {
        block.push_str(&format!("<li>{}</li>\n", generate_issue_line(issue)));
    }
    block.push_str("</ul>\n");

    block
}

fn generate_issue_line(issue: &Issue) -> String {
    let label = match issue.id {
        Some(ref id) => format!("#{}", id),
        None => "#".to_string(),
    };
    let reference = match issue.url {
        Some(ref url) => format!("<a href=\"{}\">{}</a>", escape(url), escape(&label)),
        None => escape(&label),
    };

    format!(
        "{} {} <em>({})</em>",
        reference,
        escape(&issue.title),
        escape(&issue.state.to_string())
    )
}

/// Generate a plain-text preview of the report.
pub fn render_text(projects: &[Project], meta: &ReportMeta) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{} (generated {})\n",
        meta.preset.heading(),
        meta.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    if let Some(after) = meta.updated_after {
        output.push_str(&format!("Updated since {}\n", after.format("%Y-%m-%d %H:%M UTC")));
    }
    output.push('\n');

    for project in projects {
        output.push_str(&format!(
            "== {} [{}] ({} issues) ==\n",
            project.name,
            project.id,
            project.groups.issue_count()
        ));
        if project.groups.is_empty() {
            output.push_str("  No matching issues.\n");
        }
        for group in &project.groups {
            output.push_str(&format!("  {} ({})\n", group.assignee, group.issues.len()));
            for issue in &group.issues {
                output.push_str(&format!(
                    "    #{} {} [{}]\n",
                    issue.id.as_deref().unwrap_or("-"),
                    issue.title,
                    issue.state
                ));
            }
        }
        output.push('\n');
    }

    let top = busiest_assignees(projects, 3);
    if !top.is_empty() {
        output.push_str("Most issues:\n");
        for (name, count) in top {
            output.push_str(&format!("  {}: {}\n", name, count));
        }
    }

    output
}

/// Escape text for inclusion in XHTML storage format.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
