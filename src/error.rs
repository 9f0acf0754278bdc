//! Error types for the fetch and publish pipeline.
//!
//! Every error is surfaced to the caller of the pipeline; nothing here
//! is retried or recovered locally.

use std::fmt;
use thiserror::Error;

/// Failure of a single request against a remote API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connection refused, DNS, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a status other than 200.
    #[error("status {status}: {body}")]
    Status {
        /// HTTP status code returned by the service.
        status: u16,
        /// Raw response body, kept for diagnostics.
        body: String,
    },

    /// The response arrived but could not be understood.
    #[error("decode error: {0}")]
    Decode(String),
}

impl ApiError {
    /// Status code of a rejected request, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode(_) => None,
        }
    }
}

/// Fetching the issues of one project failed. No partial result exists.
#[derive(Debug, Error)]
#[error("failed to fetch issues for project {project} (page {page}): {source}")]
pub struct FetchError {
    pub project: String,
    pub page: u32,
    #[source]
    pub source: ApiError,
}

/// The title search matched more than one page.
#[derive(Debug, Error)]
#[error("title {title:?} matches {matches} pages in space {space}; refusing to pick one")]
pub struct AmbiguousPageError {
    pub space: String,
    pub title: String,
    pub matches: usize,
}

/// Remote step of a publish call, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublishStep {
    Search,
    Read,
    Create,
    Update,
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishStep::Search => write!(f, "search"),
            PublishStep::Read => write!(f, "read"),
            PublishStep::Create => write!(f, "create"),
            PublishStep::Update => write!(f, "update"),
        }
    }
}

/// Publishing the report page failed.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Ambiguous(#[from] AmbiguousPageError),

    /// The wiki service rejected one of the requests, including stale
    /// revision conflicts on update.
    #[error("wiki {step} failed: {source}")]
    Rejected {
        step: PublishStep,
        #[source]
        source: ApiError,
    },
}

impl PublishError {
    pub(crate) fn at(step: PublishStep) -> impl FnOnce(ApiError) -> Self {
        move |source| PublishError::Rejected { step, source }
    }
}

/// Anything that aborts a report run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}
