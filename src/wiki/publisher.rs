//! Idempotent report publishing.
//!
//! A titled slot is searched first: no match creates the page, one match
//! updates it, more than one fails without writing. A fixed slot skips the
//! search and always updates.
//!
//! The search and the following write are separate remote calls. Two runs
//! racing on the same title can both see no match and both try to create.

use crate::error::{AmbiguousPageError, ApiError, PublishError, PublishStep};
use crate::models::{PageSlot, PublishOutcome};
use crate::wiki::{NewPage, PageUpdate, WikiApi};
use tracing::{debug, info};

/// Result of the title search.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Lookup {
    NotFound,
    Found(String),
}

/// Publishes a rendered body into one page slot of a wiki space.
pub struct PagePublisher<W> {
    api: W,
    space: String,
    parent_page: String,
}

impl<W: WikiApi> PagePublisher<W> {
    pub fn new(api: W, space: &str, parent_page: &str) -> Self {
        Self {
            api,
            space: space.to_string(),
            parent_page: parent_page.to_string(),
        }
    }

    #[cfg(test)]
    pub fn api(&self) -> &W {
        &self.api
    }

    /// Write `body` into `slot`, creating or updating the page.
    pub async fn publish(
        &self,
        slot: &PageSlot,
        body: &str,
    ) -> Result<PublishOutcome, PublishError> {
        match slot {
            PageSlot::Titled(title) => match self.search(title).await? {
                Lookup::NotFound => self.create(title, body).await,
                Lookup::Found(page_id) => self.update(&page_id, body).await,
            },
            PageSlot::Fixed(page_id) => self.update(page_id, body).await,
        }
    }

    async fn search(&self, title: &str) -> Result<Lookup, PublishError> {
        let results = self
            .api
            .find_by_title(&self.space, title)
            .await
            .map_err(PublishError::at(PublishStep::Search))?;

        match (results.size, results.ids.as_slice()) {
            (0, _) => {
                debug!("No page titled {:?} in space {}", title, self.space);
                Ok(Lookup::NotFound)
            }
            (1, [id]) => {
                debug!("Found page {} titled {:?}", id, title);
                Ok(Lookup::Found(id.clone()))
            }
            (1, []) => Err(PublishError::Rejected {
                step: PublishStep::Search,
                source: ApiError::Decode(format!(
                    "search for {:?} reported one match but returned no id",
                    title
                )),
            }),
            (size, ids) => Err(AmbiguousPageError {
                space: self.space.clone(),
                title: title.to_string(),
                matches: size.max(ids.len()),
            }
            .into()),
        }
    }

    async fn create(&self, title: &str, body: &str) -> Result<PublishOutcome, PublishError> {
        let page = NewPage {
            title: title.to_string(),
            space: self.space.clone(),
            ancestor_id: self.parent_page.clone(),
            body: body.to_string(),
        };

        self.api
            .create_page(&page)
            .await
            .map_err(PublishError::at(PublishStep::Create))?;

        info!("Created page {:?} under {}", title, self.parent_page);
        Ok(PublishOutcome::Created {
            title: title.to_string(),
        })
    }

    async fn update(&self, page_id: &str, body: &str) -> Result<PublishOutcome, PublishError> {
        let current = self
            .api
            .current_version(page_id)
            .await
            .map_err(PublishError::at(PublishStep::Read))?;
        debug!("Page {} is at revision {}", current.id, current.number);

        let update = PageUpdate {
            id: page_id.to_string(),
            title: current.title,
            body: body.to_string(),
            version: current.number + 1,
        };

        self.api
            .update_page(&update)
            .await
            .map_err(PublishError::at(PublishStep::Update))?;

        info!(
            "Updated page {} ({:?}) to revision {}",
            page_id, update.title, update.version
        );
        Ok(PublishOutcome::Updated {
            page_id: page_id.to_string(),
            title: update.title,
            revision: update.version,
        })
    }
}
