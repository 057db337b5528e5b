use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::models::{Page, Strategy};

pub const FRESH_FOR: Duration = Duration::from_secs(5 * 60);
pub const EVICT_AFTER: Duration = Duration::from_secs(10 * 60);

struct CacheEntry {
    page: Page,
    fetched_at: Instant,
    // Set while no feed sequence holds this page
    released_at: Option<Instant>,
}

/// Pages keyed by (strategy, index).
///
/// A page is served while younger than `fresh_for`. Once the feed lets go of
/// it (strategy switch or refresh) it is dropped after `evict_after`.
pub struct PageCache {
    entries: HashMap<(Strategy, u32), CacheEntry>,
    fresh_for: Duration,
    evict_after: Duration,
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new(FRESH_FOR, EVICT_AFTER)
    }
}

impl PageCache {
    pub fn new(fresh_for: Duration, evict_after: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            fresh_for,
            evict_after,
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns a fresh copy of the page and marks it referenced again.
    pub fn take_fresh(&mut self, strategy: Strategy, index: u32) -> Option<Page> {
        let fresh_for = self.fresh_for;
        let entry = self.entries.get_mut(&(strategy, index))?;
        if entry.fetched_at.elapsed() >= fresh_for {
            return None;
        }
        entry.released_at = None;
        debug!(%strategy, page = index, "page served from cache");
        Some(entry.page.clone())
    }

    pub fn store(&mut self, strategy: Strategy, page: Page) {
        self.entries.insert(
            (strategy, page.index),
            CacheEntry {
                page,
                fetched_at: Instant::now(),
                released_at: None,
            },
        );
    }

    /// Starts the eviction clock for every page of `strategy`.
    pub fn release(&mut self, strategy: Strategy) {
        let now = Instant::now();
        for ((entry_strategy, _), entry) in self.entries.iter_mut() {
            if *entry_strategy == strategy && entry.released_at.is_none() {
                entry.released_at = Some(now);
            }
        }
    }

    /// Forgets every page of `strategy`.
    pub fn invalidate(&mut self, strategy: Strategy) {
        self.entries.retain(|(entry_strategy, _), _| *entry_strategy != strategy);
    }

    pub fn evict_expired(&mut self) -> usize {
        let evict_after = self.evict_after;
        let before = self.entries.len();
        self.entries.retain(|_, entry| match entry.released_at {
            Some(released) => released.elapsed() < evict_after,
            None => true,
        });
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, "evicted unreferenced pages");
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_posts;

    fn page(index: u32) -> Page {
        Page::new(index, sample_posts(&format!("page{}", index), 10))
    }

    #[tokio::test(start_paused = true)]
    async fn pages_are_fresh_for_five_minutes() {
        let mut cache = PageCache::default();
        cache.store(Strategy::Relevant, page(1));

        tokio::time::advance(Duration::from_secs(4 * 60)).await;
        assert_eq!(cache.take_fresh(Strategy::Relevant, 1), Some(page(1)));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.take_fresh(Strategy::Relevant, 1), None);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_include_the_strategy() {
        let mut cache = PageCache::default();
        cache.store(Strategy::Relevant, page(1));

        assert!(cache.take_fresh(Strategy::New, 1).is_none());
        assert!(cache.take_fresh(Strategy::Relevant, 2).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn referenced_pages_are_never_evicted() {
        let mut cache = PageCache::default();
        cache.store(Strategy::Relevant, page(1));

        tokio::time::advance(Duration::from_secs(60 * 60)).await;
        assert_eq!(cache.evict_expired(), 0);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn released_pages_go_after_ten_minutes() {
        let mut cache = PageCache::default();
        cache.store(Strategy::Relevant, page(1));
        cache.store(Strategy::New, page(1));
        cache.release(Strategy::Relevant);

        tokio::time::advance(Duration::from_secs(9 * 60)).await;
        assert_eq!(cache.evict_expired(), 0);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(cache.evict_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_only_touches_one_strategy() {
        let mut cache = PageCache::default();
        cache.store(Strategy::Relevant, page(1));
        cache.store(Strategy::Relevant, page(2));
        cache.store(Strategy::New, page(1));

        cache.invalidate(Strategy::Relevant);

        assert_eq!(cache.len(), 1);
        assert!(cache.take_fresh(Strategy::New, 1).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn serving_a_released_page_references_it_again() {
        let mut cache = PageCache::default();
        cache.store(Strategy::New, page(1));
        cache.release(Strategy::New);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(cache.take_fresh(Strategy::New, 1).is_some());

        tokio::time::advance(Duration::from_secs(20 * 60)).await;
        assert_eq!(cache.evict_expired(), 0);
    }
}
