//! Content fetching from a Prismic repository
//!
//! [`ContentSource`] is the seam the listing and the server depend on;
//! [`PrismicClient`] is the HTTP implementation.

mod client;
mod predicates;

use std::future::Future;

pub use client::{ApiInfo, ApiRef, PrismicClient};
pub use predicates::{Predicate, Query};

use crate::content::PostPage;
use crate::error::FetchError;

/// A source of paginated post summaries
pub trait ContentSource {
    /// Fetch the first page of posts, `page_size` posts per page
    fn fetch_first_page(
        &self,
        page_size: usize,
    ) -> impl Future<Output = Result<PostPage, FetchError>> + Send;

    /// Fetch the page identified by a cursor previously returned as `next_page`
    fn fetch_page(&self, cursor: &str)
        -> impl Future<Output = Result<PostPage, FetchError>> + Send;
}
