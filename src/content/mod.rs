//! Content module - post summaries and their wire shapes

mod post;

pub use post::{parse_publication_date, Post, PostPage, RawDocument, RawPostData, SearchResponse};
