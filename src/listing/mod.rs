//! Listing state: the statically generated first page plus pages loaded
//! on demand through the pagination cursor.

use serde::{Deserialize, Serialize};

use crate::content::{Post, PostPage};
use crate::error::{FetchError, ListingError};
use crate::prismic::ContentSource;

/// How a loaded page is merged into the listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Loaded posts are replaced by each new page; the cursor stays the
    /// one captured from the first page.
    #[default]
    Replace,
    /// Pages accumulate and the cursor follows each response.
    Append,
}

/// Whether a load is in flight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
}

/// Posts visible on one listing view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    initial_posts: Vec<Post>,
    loaded_posts: Vec<Post>,
    next_page: Option<String>,
    mode: LoadMode,
    state: LoadState,
}

impl Listing {
    /// Start a listing from the statically generated first page
    pub fn new(first_page: PostPage, mode: LoadMode) -> Self {
        let next_page = first_page.next_page().map(str::to_string);
        Self {
            initial_posts: first_page.results,
            loaded_posts: Vec::new(),
            next_page,
            mode,
            state: LoadState::Idle,
        }
    }

    pub fn initial_posts(&self) -> &[Post] {
        &self.initial_posts
    }

    pub fn loaded_posts(&self) -> &[Post] {
        &self.loaded_posts
    }

    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    pub fn mode(&self) -> LoadMode {
        self.mode
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Whether the "load more" control should be offered
    pub fn can_load_more(&self) -> bool {
        self.next_page.as_deref().is_some_and(|url| !url.is_empty())
    }

    /// Initial posts followed by loaded posts
    pub fn visible_posts(&self) -> impl Iterator<Item = &Post> {
        self.initial_posts.iter().chain(self.loaded_posts.iter())
    }

    /// Merge a successfully loaded page, returning the next listing state
    pub fn apply_loaded_page(mut self, page: PostPage) -> Self {
        match self.mode {
            LoadMode::Replace => {
                self.loaded_posts = page.results;
            }
            LoadMode::Append => {
                self.next_page = page.next_page().map(str::to_string);
                self.loaded_posts.extend(page.results);
            }
        }
        self.state = LoadState::Idle;
        self
    }

    /// Enter `Loading`, returning the cursor to fetch
    pub fn begin_load(&mut self) -> Result<String, ListingError> {
        if self.state == LoadState::Loading {
            return Err(ListingError::AlreadyLoading);
        }
        let cursor = match self.next_page.as_deref() {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => return Err(ListingError::NoMorePages),
        };
        self.state = LoadState::Loading;
        Ok(cursor)
    }

    /// Leave `Loading` with the outcome of the fetch.
    ///
    /// On failure the loaded posts are left as they were and the error is
    /// handed back to the caller.
    pub fn finish_load(
        &mut self,
        result: Result<PostPage, FetchError>,
    ) -> Result<(), ListingError> {
        match result {
            Ok(page) => {
                let mode = self.mode;
                let current = std::mem::replace(self, Self::empty(mode));
                *self = current.apply_loaded_page(page);
                Ok(())
            }
            Err(e) => {
                self.state = LoadState::Idle;
                tracing::warn!("Loading more posts failed: {}", e);
                Err(ListingError::Fetch(e))
            }
        }
    }

    /// Run one "load more" action against `source`.
    ///
    /// Dropping the future before the fetch completes returns the listing
    /// to `Idle` with its posts unchanged.
    pub async fn load_more<S: ContentSource>(&mut self, source: &S) -> Result<(), ListingError> {
        let cursor = self.begin_load()?;
        tracing::debug!("Loading more posts from {}", cursor);
        let pending = PendingLoad(self);
        let result = source.fetch_page(&cursor).await;
        pending.0.finish_load(result)
    }

    fn empty(mode: LoadMode) -> Self {
        Self::new(PostPage::default(), mode)
    }
}

/// Resets a listing to `Idle` when a load is abandoned mid-fetch
struct PendingLoad<'a>(&'a mut Listing);

impl Drop for PendingLoad<'_> {
    fn drop(&mut self) {
        self.0.state = LoadState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn post(uid: &str) -> Post {
        Post {
            uid: Some(uid.to_string()),
            publication_date: None,
            title: format!("Title {}", uid),
            subtitle: String::new(),
            author: "Author".to_string(),
        }
    }

    fn page(uids: &[&str], next: Option<&str>) -> PostPage {
        PostPage {
            results: uids.iter().map(|u| post(u)).collect(),
            next_page: next.map(String::from),
        }
    }

    fn uids(listing: &Listing) -> Vec<String> {
        listing
            .visible_posts()
            .filter_map(|p| p.uid.clone())
            .collect()
    }

    /// Serves `url2 -> [p2]` then `url3 -> [p3]`; fails on anything else
    struct FakeSource {
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ContentSource for FakeSource {
        async fn fetch_first_page(&self, _page_size: usize) -> Result<PostPage, FetchError> {
            Ok(page(&["p1"], Some("url2")))
        }

        async fn fetch_page(&self, cursor: &str) -> Result<PostPage, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match cursor {
                "url2" => Ok(page(&["p2"], Some("url3"))),
                "url3" => Ok(page(&["p3"], None)),
                "hang" => std::future::pending().await,
                other => Err(FetchError::InvalidUrl(other.to_string())),
            }
        }
    }

    #[test]
    fn test_new_listing() {
        let listing = Listing::new(page(&["p1"], Some("url2")), LoadMode::Replace);
        assert_eq!(uids(&listing), vec!["p1"]);
        assert!(listing.loaded_posts().is_empty());
        assert!(listing.can_load_more());
        assert_eq!(listing.state(), LoadState::Idle);
    }

    #[test]
    fn test_no_more_pages() {
        let mut listing = Listing::new(page(&["p1"], None), LoadMode::Replace);
        assert!(!listing.can_load_more());
        assert!(matches!(listing.begin_load(), Err(ListingError::NoMorePages)));

        let mut listing = Listing::new(page(&["p1"], Some("")), LoadMode::Replace);
        assert!(!listing.can_load_more());
        assert!(matches!(listing.begin_load(), Err(ListingError::NoMorePages)));
    }

    #[test]
    fn test_replace_keeps_cursor() {
        let listing = Listing::new(page(&["p1"], Some("url2")), LoadMode::Replace);
        let listing = listing.apply_loaded_page(page(&["p2"], Some("url3")));
        assert_eq!(uids(&listing), vec!["p1", "p2"]);
        assert_eq!(listing.next_page(), Some("url2"));

        let listing = listing.apply_loaded_page(page(&["p2b"], None));
        assert_eq!(uids(&listing), vec!["p1", "p2b"]);
        assert_eq!(listing.initial_posts().len(), 1);
    }

    #[test]
    fn test_append_follows_cursor() {
        let listing = Listing::new(page(&["p1"], Some("url2")), LoadMode::Append);
        let listing = listing.apply_loaded_page(page(&["p2"], Some("url3")));
        assert_eq!(listing.next_page(), Some("url3"));
        let listing = listing.apply_loaded_page(page(&["p3"], None));
        assert_eq!(uids(&listing), vec!["p1", "p2", "p3"]);
        assert!(!listing.can_load_more());
    }

    #[test]
    fn test_reentrant_load_is_refused() {
        let mut listing = Listing::new(page(&["p1"], Some("url2")), LoadMode::Replace);
        assert_eq!(listing.begin_load().unwrap(), "url2");
        assert_eq!(listing.state(), LoadState::Loading);
        assert!(matches!(
            listing.begin_load(),
            Err(ListingError::AlreadyLoading)
        ));

        listing.finish_load(Ok(page(&["p2"], None))).unwrap();
        assert_eq!(listing.state(), LoadState::Idle);
        assert_eq!(uids(&listing), vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_load_more_replaces() {
        let source = FakeSource::new();
        let first = source.fetch_first_page(1).await.unwrap();
        let mut listing = Listing::new(first, LoadMode::Replace);

        listing.load_more(&source).await.unwrap();
        assert_eq!(listing.loaded_posts(), &[post("p2")]);
        assert_eq!(uids(&listing), vec!["p1", "p2"]);

        // Same cursor again: replaced, not appended
        listing.load_more(&source).await.unwrap();
        assert_eq!(listing.loaded_posts(), &[post("p2")]);
        assert_eq!(uids(&listing), vec!["p1", "p2"]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_load_more_appends() {
        let source = FakeSource::new();
        let first = source.fetch_first_page(1).await.unwrap();
        let mut listing = Listing::new(first, LoadMode::Append);

        listing.load_more(&source).await.unwrap();
        listing.load_more(&source).await.unwrap();
        assert_eq!(uids(&listing), vec!["p1", "p2", "p3"]);
        assert!(matches!(
            listing.load_more(&source).await,
            Err(ListingError::NoMorePages)
        ));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_load_leaves_state_unchanged() {
        let source = FakeSource::new();
        let mut listing = Listing::new(page(&["p1"], Some("broken")), LoadMode::Replace)
            .apply_loaded_page(page(&["p2"], None));
        let before = listing.clone();

        let err = listing.load_more(&source).await.unwrap_err();
        assert!(matches!(err, ListingError::Fetch(FetchError::InvalidUrl(_))));
        assert_eq!(listing, before);
        assert_eq!(listing.loaded_posts(), &[post("p2")]);
        assert_eq!(listing.state(), LoadState::Idle);
    }

    #[tokio::test]
    async fn test_abandoned_load_returns_to_idle() {
        let source = FakeSource::new();
        let mut listing = Listing::new(page(&["p1"], Some("hang")), LoadMode::Replace);
        let before = listing.clone();

        let timed_out = tokio::time::timeout(Duration::from_millis(20), listing.load_more(&source))
            .await
            .is_err();
        assert!(timed_out);
        assert_eq!(listing.state(), LoadState::Idle);
        assert_eq!(listing, before);

        // A later load is not refused as re-entrant
        let second = tokio::time::timeout(Duration::from_millis(20), listing.load_more(&source)).await;
        assert!(second.is_err());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
