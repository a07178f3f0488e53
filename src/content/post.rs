//! Post summary models and the raw document shapes they are mapped from

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

/// A post summary as shown in the listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier, used as list key and detail route parameter
    pub uid: Option<String>,

    /// First publication date, absent for documents never published
    pub publication_date: Option<DateTime<FixedOffset>>,

    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// One page of post summaries with the cursor of the next page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPage {
    pub results: Vec<Post>,
    pub next_page: Option<String>,
}

impl PostPage {
    /// Cursor of the next page, if there is one
    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref().filter(|url| !url.is_empty())
    }
}

/// Document as returned by the content API
#[derive(Debug, Clone, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default, deserialize_with = "deserialize_publication_date")]
    pub first_publication_date: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub data: RawPostData,
}

/// The `data` object of a post document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPostData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// Body of a search or pagination response
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<RawDocument>,
    #[serde(default)]
    pub next_page: Option<String>,
}

impl From<RawDocument> for Post {
    fn from(doc: RawDocument) -> Self {
        Self {
            uid: doc.uid,
            publication_date: doc.first_publication_date,
            title: doc.data.title,
            subtitle: doc.data.subtitle,
            author: doc.data.author,
        }
    }
}

impl From<SearchResponse> for PostPage {
    fn from(response: SearchResponse) -> Self {
        Self {
            results: response.results.into_iter().map(Post::from).collect(),
            next_page: response.next_page.filter(|url| !url.is_empty()),
        }
    }
}

/// Parse a publication timestamp.
///
/// Prismic writes offsets without a colon (`2021-03-25T19:25:28+0000`),
/// RFC 3339 is accepted as well.
pub fn parse_publication_date(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
}

fn deserialize_publication_date<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<FixedOffset>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) => parse_publication_date(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("malformed publication date: {}", s))),
    }
}
