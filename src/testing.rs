//! In-memory stand-ins for the tracker and the wiki used by unit tests.

use crate::error::{ApiError, PublishStep};
use crate::models::{IssueFilter, PageVersion};
use crate::tracker::{IssuePage, IssueSource, PageInfo, RawIssue, RawUser};
use crate::wiki::{NewPage, PageUpdate, SearchResults, WikiApi};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Raw tracker record with an optional assignee.
pub fn raw_issue(iid: u64, title: &str, assignee: Option<&str>) -> RawIssue {
    RawIssue {
        iid: Some(iid),
        title: title.to_string(),
        state: "opened".to_string(),
        assignee: assignee.map(|name| RawUser {
            name: name.to_string(),
        }),
        web_url: Some(format!("https://gitlab.example.com/g/p/-/issues/{iid}")),
    }
}

/// Page `current` of `total`, with GitLab's next-page hint.
pub fn page_of(current: u32, total: u32, issues: Vec<RawIssue>) -> IssuePage {
    IssuePage {
        issues,
        info: PageInfo {
            current,
            total: Some(total),
            next: (current < total).then_some(current + 1),
        },
    }
}

/// Tracker serving canned pages per project and recording requests.
#[derive(Default)]
pub struct StubTracker {
    projects: HashMap<String, Vec<IssuePage>>,
    failures: HashMap<(String, u32), (u16, String)>,
    requests: Mutex<Vec<(String, u32)>>,
}

impl StubTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(mut self, project: &str, pages: Vec<IssuePage>) -> Self {
        self.projects.insert(project.to_string(), pages);
        self
    }

    pub fn fail_page(mut self, project: &str, page: u32, status: u16, body: &str) -> Self {
        self.failures
            .insert((project.to_string(), page), (status, body.to_string()));
        self
    }

    pub fn requested_pages(&self, project: &str) -> Vec<u32> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == project)
            .map(|(_, page)| *page)
            .collect()
    }

    pub fn requested_projects(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for (project, _) in self.requests.lock().unwrap().iter() {
            if !seen.contains(project) {
                seen.push(project.clone());
            }
        }
        seen
    }
}

#[async_trait]
impl IssueSource for StubTracker {
    async fn list_issues(
        &self,
        project: &str,
        _filter: &IssueFilter,
        page: u32,
    ) -> Result<IssuePage, ApiError> {
        self.requests
            .lock()
            .unwrap()
            .push((project.to_string(), page));

        if let Some((status, body)) = self.failures.get(&(project.to_string(), page)) {
            return Err(ApiError::Status {
                status: *status,
                body: body.clone(),
            });
        }

        let pages = self.projects.get(project).ok_or_else(|| ApiError::Status {
            status: 404,
            body: r#"{"message":"404 Project Not Found"}"#.to_string(),
        })?;

        match pages.get(page as usize - 1) {
            Some(found) => Ok(found.clone()),
            None => Ok(IssuePage {
                issues: Vec::new(),
                info: PageInfo {
                    current: page,
                    total: Some(pages.len() as u32),
                    next: None,
                },
            }),
        }
    }
}

/// Remote call observed by [`InMemoryWiki`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WikiCall {
    Search { space: String, title: String },
    Get { id: String },
    Create { title: String, ancestor_id: String },
    Update { id: String, version: u64 },
}

#[derive(Debug, Clone)]
struct StoredPage {
    id: String,
    space: String,
    title: String,
    body: String,
    version: u64,
}

#[derive(Default)]
struct WikiState {
    pages: Vec<StoredPage>,
    calls: Vec<WikiCall>,
    next_id: u64,
    rejections: HashMap<PublishStep, (u16, String)>,
    bump_on_read: HashSet<String>,
    search_overcount: usize,
}

/// Wiki that stores pages in memory and enforces revision numbering.
#[derive(Default)]
pub struct InMemoryWiki {
    state: Mutex<WikiState>,
}

impl InMemoryWiki {
    pub fn new() -> Self {
        let wiki = Self::default();
        wiki.state.lock().unwrap().next_id = 5000;
        wiki
    }

    pub fn seed_page(&self, id: &str, space: &str, title: &str, body: &str, version: u64) {
        self.state.lock().unwrap().pages.push(StoredPage {
            id: id.to_string(),
            space: space.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            version,
        });
    }

    /// Make every request of `step` fail with the given status and body.
    pub fn reject(&self, step: PublishStep, status: u16, body: &str) {
        self.state
            .lock()
            .unwrap()
            .rejections
            .insert(step, (status, body.to_string()));
    }

    /// Simulate another writer updating `id` right after each read.
    pub fn bump_on_read(&self, id: &str) {
        self.state
            .lock()
            .unwrap()
            .bump_on_read
            .insert(id.to_string());
    }

    /// Report `extra` more search matches than there are ids.
    pub fn overcount_search(&self, extra: usize) {
        self.state.lock().unwrap().search_overcount = extra;
    }

    pub fn calls(&self) -> Vec<WikiCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn body_of(&self, id: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .pages
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.body.clone())
    }

    pub fn page_count(&self) -> usize {
        self.state.lock().unwrap().pages.len()
    }
}

impl WikiState {
    fn check(&self, step: PublishStep) -> Result<(), ApiError> {
        match self.rejections.get(&step) {
            Some((status, body)) => Err(ApiError::Status {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl WikiApi for InMemoryWiki {
    async fn find_by_title(&self, space: &str, title: &str) -> Result<SearchResults, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(WikiCall::Search {
            space: space.to_string(),
            title: title.to_string(),
        });
        state.check(PublishStep::Search)?;

        let ids: Vec<String> = state
            .pages
            .iter()
            .filter(|p| p.space == space && p.title == title)
            .map(|p| p.id.clone())
            .collect();
        Ok(SearchResults {
            size: ids.len() + state.search_overcount,
            ids,
        })
    }

    async fn current_version(&self, id: &str) -> Result<PageVersion, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(WikiCall::Get { id: id.to_string() });
        state.check(PublishStep::Read)?;

        let bump = state.bump_on_read.contains(id);
        let page = state
            .pages
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ApiError::Status {
                status: 404,
                body: format!("No content found with id: {id}"),
            })?;

        let version = PageVersion {
            id: page.id.clone(),
            title: page.title.clone(),
            number: page.version,
        };
        if bump {
            page.version += 1;
        }
        Ok(version)
    }

    async fn create_page(&self, new: &NewPage) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(WikiCall::Create {
            title: new.title.clone(),
            ancestor_id: new.ancestor_id.clone(),
        });
        state.check(PublishStep::Create)?;

        if state
            .pages
            .iter()
            .any(|p| p.space == new.space && p.title == new.title)
        {
            return Err(ApiError::Status {
                status: 400,
                body: "A page with this title already exists".to_string(),
            });
        }

        state.next_id += 1;
        let id = state.next_id.to_string();
        state.pages.push(StoredPage {
            id,
            space: new.space.clone(),
            title: new.title.clone(),
            body: new.body.clone(),
            version: 1,
        });
        Ok(())
    }

    async fn update_page(&self, update: &PageUpdate) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(WikiCall::Update {
            id: update.id.clone(),
            version: update.version,
        });
        state.check(PublishStep::Update)?;

        let page = state
            .pages
            .iter_mut()
            .find(|p| p.id == update.id)
            .ok_or_else(|| ApiError::Status {
                status: 404,
                body: format!("No content found with id: {}", update.id),
            })?;

        if update.version != page.version + 1 {
            return Err(ApiError::Status {
                status: 409,
                body: format!(
                    "Version must be incremented on update. Current version is: {}",
                    page.version
                ),
            });
        }

        page.title = update.title.clone();
        page.body = update.body.clone();
        page.version = update.version;
        Ok(())
    }
}
