//! Search backend boundary: request/result model and the backend trait.

mod stackexchange;

pub use stackexchange::{decode_entities, StackExchangeClient, DEFAULT_API_BASE};

use std::future::Future;
use thiserror::Error;

/// Filter parameters passed alongside the query. Empty strings mean
/// "use the backend default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub site: String,
    pub tags: String,
    pub sort: String,
    pub order: String,
}

/// One submitted question plus its filter parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub params: SearchParams,
}

/// Ranked set of questions returned for one search. An empty set is a
/// valid outcome ("no matches"), not an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub items: Vec<ResultItem>,
}

impl SearchResult {
    pub fn new(items: Vec<ResultItem>) -> Self {
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find an item by its display identifier (as shown in the table)
    pub fn find_by_display_id(&self, id: &str) -> Option<&ResultItem> {
        self.items.iter().find(|item| item.id.to_string() == id)
    }
}

/// A question with its answers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultItem {
    pub id: u64,
    pub title: String,
    /// Markdown source of the question body
    pub body: String,
    pub score: i64,
    pub view_count: u64,
    pub answers: Vec<Answer>,
    pub comments: Vec<Comment>,
    pub link: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Answer {
    pub id: u64,
    /// Markdown source of the answer body
    pub body: String,
    pub score: i64,
    pub is_accepted: bool,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comment {
    pub owner: String,
    pub score: i64,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Stack Exchange API error {id} ({name}): {message}")]
    Api {
        id: i64,
        name: String,
        message: String,
    },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Search failed: {0}")]
    Backend(String),
}

/// Something that can answer a search request.
///
/// Implementations own their transport and timeouts. Returning an empty
/// [`SearchResult`] means "no matches"; any failure must be an `Err`.
pub trait SearchBackend: Send + Sync + 'static {
    fn search(
        &self,
        request: &SearchRequest,
    ) -> impl Future<Output = Result<SearchResult, SearchError>> + Send;
}
