use tracing::debug;

use crate::feed::{Feed, FetchStatus, NextPage};
use crate::models::Post;
use crate::tabnews_client::ApiError;

/// Synthetic back-stack entries pushed for the detail view. Depth 0 is the
/// feed itself.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NavigationHistory {
    depth: usize,
}

impl NavigationHistory {
    pub fn push(&mut self) {
        self.depth += 1;
    }

    pub fn pop(&mut self) -> bool {
        if self.depth == 0 {
            return false;
        }
        self.depth -= 1;
        true
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    /// The open post was closed.
    ClosedDetail,
    /// A leftover entry was popped; nothing visible changes.
    Absorbed,
    /// Nothing left to go back to inside the app.
    Propagate,
}

/// How the feed area should be drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedDisplay {
    InitialLoading,
    /// Only a failed first page takes the whole screen.
    InitialError(ApiError),
    Content(TailState),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TailState {
    Loading,
    Failed(ApiError),
    More,
    End,
}

impl FeedDisplay {
    pub fn of(feed: &Feed) -> Self {
        let empty = feed.posts().is_empty() && feed.pages_loaded() == 0;
        match (feed.status(), empty) {
            (FetchStatus::Error(err), true) => FeedDisplay::InitialError(err.clone()),
            (FetchStatus::Error(err), false) => FeedDisplay::Content(TailState::Failed(err.clone())),
            (FetchStatus::Fetching, true) => FeedDisplay::InitialLoading,
            (FetchStatus::Idle, true) if feed.has_more() => FeedDisplay::InitialLoading,
            (FetchStatus::Fetching, false) => FeedDisplay::Content(TailState::Loading),
            (FetchStatus::Idle, _) if feed.has_more() => FeedDisplay::Content(TailState::More),
            (FetchStatus::Idle, _) => FeedDisplay::Content(TailState::End),
        }
    }
}

/// Which post is open, and when the feed should grow.
#[derive(Debug, Default)]
pub struct ViewState {
    selected: Option<Post>,
    history: NavigationHistory,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&Post> {
        self.selected.as_ref()
    }

    #[cfg(test)]
    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub fn open(&mut self, post: Post) {
        self.history.push();
        debug!(post = %post.id, depth = self.history.depth(), "opening post");
        self.selected = Some(post);
    }

    /// Closes from the detail view's own control; history is left alone.
    pub fn close(&mut self) {
        self.selected = None;
    }

    pub fn on_back(&mut self) -> BackOutcome {
        if self.selected.is_some() {
            self.history.pop();
            self.selected = None;
            return BackOutcome::ClosedDetail;
        }
        if self.history.pop() {
            BackOutcome::Absorbed
        } else {
            BackOutcome::Propagate
        }
    }

    /// Called every frame with the end-of-feed sentinel's visibility. Returns
    /// what the feed did when asked for more, or `None` if it was not asked.
    pub fn on_proximity(&self, visible: bool, feed: &mut Feed) -> Option<NextPage> {
        if !visible || feed.is_fetching() || !feed.has_more() {
            return None;
        }
        if matches!(feed.status(), FetchStatus::Error(_)) {
            return None;
        }
        Some(feed.next_page())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::PageCache;
    use crate::models::{sample_post, sample_posts, Strategy, PAGE_SIZE};
    use crate::tabnews_client::testing::{posts_json, ScriptedTransport};
    use crate::tabnews_client::{RetryPolicy, TabNewsClient};
    use std::sync::Arc;

    fn feed() -> Feed {
        Feed::new(Strategy::Relevant, PageCache::default())
    }

    #[test]
    fn opening_pushes_one_entry_and_back_closes() {
        let mut view = ViewState::new();
        view.open(sample_post("1", "Hello"));
        assert_eq!(view.history().depth(), 1);
        assert_eq!(view.selected().map(|p| p.id.as_str()), Some("1"));

        assert_eq!(view.on_back(), BackOutcome::ClosedDetail);
        assert!(view.selected().is_none());
        assert_eq!(view.history().depth(), 0);
    }

    #[test]
    fn closing_by_button_leaves_the_entry_behind() {
        let mut view = ViewState::new();
        view.open(sample_post("1", "Hello"));
        view.close();

        assert!(view.selected().is_none());
        assert_eq!(view.history().depth(), 1);
        assert_eq!(view.on_back(), BackOutcome::Absorbed);
        assert_eq!(view.on_back(), BackOutcome::Propagate);
    }

    #[test]
    fn back_on_the_bare_feed_propagates() {
        let mut view = ViewState::new();
        assert_eq!(view.on_back(), BackOutcome::Propagate);
    }

    #[tokio::test]
    async fn repeated_proximity_during_a_fetch_makes_one_call() {
        let transport = Arc::new(ScriptedTransport::new(vec![posts_json(&sample_posts("a", PAGE_SIZE))]));
        let client = TabNewsClient::with_transport(transport.clone(), RetryPolicy::default());
        let mut feed = feed();
        let view = ViewState::new();

        let first = view.on_proximity(true, &mut feed);
        let second = view.on_proximity(true, &mut feed);
        let third = view.on_proximity(true, &mut feed);

        let request = match first {
            Some(NextPage::Fetch(request)) => request,
            other => panic!("expected a fetch, got {:?}", other),
        };
        assert!(second.is_none());
        assert!(third.is_none());

        let result = request.run(&client).await;
        feed.complete(request, result);
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn hidden_sentinel_does_not_fetch() {
        let mut feed = feed();
        let view = ViewState::new();
        assert!(view.on_proximity(false, &mut feed).is_none());
        assert!(!feed.is_fetching());
    }

    #[test]
    fn terminal_feed_stops_growing() {
        let mut feed = feed();
        let view = ViewState::new();
        if let Some(NextPage::Fetch(request)) = view.on_proximity(true, &mut feed) {
            feed.complete(request, Ok(sample_posts("a", 3)));
        }
        assert!(view.on_proximity(true, &mut feed).is_none());
        assert_eq!(FeedDisplay::of(&feed), FeedDisplay::Content(TailState::End));
    }

    #[test]
    fn failed_first_page_is_full_screen() {
        let mut feed = feed();
        let view = ViewState::new();
        assert_eq!(FeedDisplay::of(&feed), FeedDisplay::InitialLoading);

        if let Some(NextPage::Fetch(request)) = view.on_proximity(true, &mut feed) {
            assert_eq!(FeedDisplay::of(&feed), FeedDisplay::InitialLoading);
            feed.complete(request, Err(ApiError::RateLimited));
        }

        assert_eq!(FeedDisplay::of(&feed), FeedDisplay::InitialError(ApiError::RateLimited));
        assert!(view.on_proximity(true, &mut feed).is_none());
    }

    #[test]
    fn failed_later_page_keeps_the_content() {
        let mut feed = feed();
        let view = ViewState::new();
        if let Some(NextPage::Fetch(request)) = view.on_proximity(true, &mut feed) {
            feed.complete(request, Ok(sample_posts("a", PAGE_SIZE)));
        }
        assert_eq!(FeedDisplay::of(&feed), FeedDisplay::Content(TailState::More));

        let err = ApiError::from_status(500, "boom");
        if let Some(NextPage::Fetch(request)) = view.on_proximity(true, &mut feed) {
            assert_eq!(FeedDisplay::of(&feed), FeedDisplay::Content(TailState::Loading));
            feed.complete(request, Err(err.clone()));
        }

        assert_eq!(FeedDisplay::of(&feed), FeedDisplay::Content(TailState::Failed(err)));
        assert_eq!(feed.posts().len(), PAGE_SIZE);
    }
}
