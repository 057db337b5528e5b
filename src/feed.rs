use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::cache::PageCache;
use crate::models::{Page, Post, Strategy};
use crate::tabnews_client::{ApiError, TabNewsClient};

pub const FIRST_PAGE: u32 = 1;

/// One outstanding page fetch. A response is only applied if its request is
/// still the sequence's in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub strategy: Strategy,
    pub page: u32,
    pub generation: u64,
    pub refresh: bool,
}

impl PageRequest {
    pub async fn run(&self, client: &TabNewsClient) -> Result<Vec<Post>, ApiError> {
        client.fetch_page(self.page, self.strategy).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchStatus {
    Idle,
    Fetching,
    Error(ApiError),
}

/// What asking for the next page led to.
#[derive(Debug, Clone, PartialEq)]
pub enum NextPage {
    /// The caller must run this request and hand the result to [`Feed::complete`].
    Fetch(PageRequest),
    /// A fresh cached copy was appended straight away.
    Served(u32),
    InFlight,
    Exhausted,
    /// The last fetch failed; only [`Feed::retry`] resumes.
    AwaitingRetry,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Applied { page: u32, added: usize },
    Failed(ApiError),
    Stale,
}

struct Sequence {
    posts: Vec<Post>,
    seen: HashSet<String>,
    next_page: u32,
    pages_loaded: u32,
    has_more: bool,
    status: FetchStatus,
    in_flight: Option<PageRequest>,
    generation: u64,
}

impl Sequence {
    fn new(generation: u64) -> Self {
        Self {
            posts: Vec::new(),
            seen: HashSet::new(),
            next_page: FIRST_PAGE,
            pages_loaded: 0,
            has_more: true,
            status: FetchStatus::Idle,
            in_flight: None,
            generation,
        }
    }

    fn apply(&mut self, page: Page) -> usize {
        self.pages_loaded += 1;
        self.has_more = page.is_full();
        self.next_page = page.index + 1;
        self.status = FetchStatus::Idle;

        let mut added = 0;
        for post in page.posts {
            if self.seen.insert(post.id.clone()) {
                self.posts.push(post);
                added += 1;
            }
        }
        added
    }
}

/// Cursor-based page accumulation for the active strategy.
///
/// Feed state is only touched from the UI thread. Network work happens
/// elsewhere and comes back through [`Feed::complete`].
pub struct Feed {
    active: Strategy,
    current: Sequence,
    // In-flight requests of strategies we switched away from
    background: HashMap<Strategy, PageRequest>,
    cache: PageCache,
    last_generation: u64,
}

impl Feed {
    pub fn new(strategy: Strategy, cache: PageCache) -> Self {
        Self {
            active: strategy,
            current: Sequence::new(0),
            background: HashMap::new(),
            cache,
            last_generation: 0,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.active
    }

    pub fn posts(&self) -> &[Post] {
        &self.current.posts
    }

    pub fn has_more(&self) -> bool {
        self.current.has_more
    }

    pub fn status(&self) -> &FetchStatus {
        &self.current.status
    }

    pub fn is_fetching(&self) -> bool {
        self.current.in_flight.is_some()
    }

    pub fn pages_loaded(&self) -> u32 {
        self.current.pages_loaded
    }

    pub fn next_page(&mut self) -> NextPage {
        self.cache.evict_expired();

        if self.current.in_flight.is_some() {
            return NextPage::InFlight;
        }
        if matches!(self.current.status, FetchStatus::Error(_)) {
            return NextPage::AwaitingRetry;
        }
        if !self.current.has_more {
            return NextPage::Exhausted;
        }
        self.begin()
    }

    /// Resumes after an error from the page that failed.
    pub fn retry(&mut self) -> NextPage {
        if self.current.in_flight.is_some() {
            return NextPage::InFlight;
        }
        if matches!(self.current.status, FetchStatus::Error(_)) {
            info!(strategy = %self.active, page = self.current.next_page, "retrying page");
            self.current.status = FetchStatus::Idle;
        }
        self.next_page()
    }

    /// Drops the accumulated posts and fetches page 1 again, bypassing the
    /// cache. Returns `None` while another refresh is still running.
    pub fn refresh(&mut self) -> Option<PageRequest> {
        if matches!(self.current.in_flight, Some(request) if request.refresh) {
            debug!(strategy = %self.active, "refresh already in flight");
            return None;
        }

        info!(strategy = %self.active, "refreshing feed");
        // Whatever was left running before a switch is superseded too
        self.background.remove(&self.active);
        self.cache.invalidate(self.active);
        let generation = self.bump_generation();
        self.current = Sequence::new(generation);
        Some(self.issue(true))
    }

    /// Starts a fresh sequence for `strategy`. The previous strategy keeps
    /// its cached pages.
    pub fn set_strategy(&mut self, strategy: Strategy) -> Option<NextPage> {
        if strategy == self.active {
            return None;
        }

        if let Some(request) = self.current.in_flight.take() {
            self.background.insert(self.active, request);
        }
        self.cache.release(self.active);
        info!(from = %self.active, to = %strategy, "switching strategy");

        self.active = strategy;
        let generation = self.bump_generation();
        self.current = Sequence::new(generation);
        Some(self.next_page())
    }

    pub fn complete(&mut self, request: PageRequest, result: Result<Vec<Post>, ApiError>) -> Completion {
        if request.strategy == self.active && self.current.in_flight == Some(request) {
            self.current.in_flight = None;
            return match result {
                Ok(posts) => {
                    let page = Page::new(request.page, posts);
                    self.cache.store(request.strategy, page.clone());
                    let added = self.current.apply(page);
                    debug!(
                        strategy = %request.strategy,
                        page = request.page,
                        added,
                        has_more = self.current.has_more,
                        "page applied"
                    );
                    Completion::Applied {
                        page: request.page,
                        added,
                    }
                }
                Err(err) => {
                    warn!(
                        strategy = %request.strategy,
                        page = request.page,
                        status = ?err.status(),
                        error = %err,
                        "page fetch failed"
                    );
                    self.current.status = FetchStatus::Error(err.clone());
                    Completion::Failed(err)
                }
            };
        }

        if self.background.get(&request.strategy) == Some(&request) {
            self.background.remove(&request.strategy);
            if let Ok(posts) = result {
                self.cache.store(request.strategy, Page::new(request.page, posts));
                if request.strategy != self.active {
                    self.cache.release(request.strategy);
                }
                debug!(strategy = %request.strategy, page = request.page, "cached page for inactive strategy");
            }
            return Completion::Stale;
        }

        debug!(strategy = %request.strategy, page = request.page, "discarding stale page response");
        Completion::Stale
    }

    fn begin(&mut self) -> NextPage {
        let index = self.current.next_page;

        // A request left running when we switched away is reused if it is for
        // this page. One for another page blocks new fetches until it lands.
        let pending = self.background.get(&self.active).copied();
        if let Some(request) = pending.filter(|request| request.page == index) {
            self.background.remove(&self.active);
            self.current.in_flight = Some(request);
            self.current.status = FetchStatus::Fetching;
            debug!(strategy = %self.active, page = index, "adopted request still in flight");
            return NextPage::InFlight;
        }

        if let Some(page) = self.cache.take_fresh(self.active, index) {
            self.current.apply(page);
            return NextPage::Served(index);
        }
        if pending.is_some() {
            return NextPage::InFlight;
        }
        NextPage::Fetch(self.issue(false))
    }

    fn issue(&mut self, refresh: bool) -> PageRequest {
        let request = PageRequest {
            strategy: self.active,
            page: self.current.next_page,
            generation: self.current.generation,
            refresh,
        };
        self.current.in_flight = Some(request);
        self.current.status = FetchStatus::Fetching;
        debug!(strategy = %request.strategy, page = request.page, refresh, "page requested");
        request
    }

    fn bump_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }
}
