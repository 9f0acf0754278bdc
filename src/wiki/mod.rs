//! Wiki service access and report publishing.
//!
//! [`WikiApi`] covers the four remote calls the publisher needs;
//! [`PagePublisher`] drives search, create and update on top of it.

pub mod confluence;
pub mod publisher;

pub use confluence::ConfluenceClient;
pub use publisher::PagePublisher;

use crate::error::ApiError;
use crate::models::PageVersion;
use async_trait::async_trait;

/// Pages matching a title search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub size: usize,
    pub ids: Vec<String>,
}

/// A page to be created under a parent page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPage {
    pub title: String,
    pub space: String,
    pub ancestor_id: String,
    pub body: String,
}

/// A new revision of an existing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUpdate {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Must be exactly the current revision plus one.
    pub version: u64,
}

/// Remote operations on wiki content.
#[async_trait]
pub trait WikiApi: Send + Sync {
    /// Find pages with exactly this title in `space`.
    async fn find_by_title(&self, space: &str, title: &str) -> Result<SearchResults, ApiError>;

    /// Current title and revision number of a page.
    async fn current_version(&self, id: &str) -> Result<PageVersion, ApiError>;

    async fn create_page(&self, page: &NewPage) -> Result<(), ApiError>;

    async fn update_page(&self, update: &PageUpdate) -> Result<(), ApiError>;
}
