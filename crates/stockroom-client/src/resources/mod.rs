//! Typed clients for the tenant-scoped REST resources.
//!
//! Every method here is a protected call on [`AdminClient`](crate::AdminClient),
//! so it carries the bearer token and tenant header and takes part in the
//! refresh-and-retry cycle like any other request.
//!
//! The backend serializes decimals as strings (`"12.50"`) and paginates list
//! endpoints as `{count, next, previous, results}`; the helpers below accept
//! both those shapes and the plain ones.

pub mod alerts;
pub mod catalog;
pub mod inventory;
pub mod orders;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ClientError, Result};

// ============================================================================
// Pagination
// ============================================================================

/// One page of a list endpoint.
///
/// Deserializes from the paginated envelope or from a bare JSON array, which
/// becomes a single page with no neighbours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PageRepr<T>", bound(deserialize = "T: Deserialize<'de>"))]
pub struct PaginatedResponse<T> {
    /// Total number of items across all pages.
    pub count: u64,
    /// URL of the next page.
    pub next: Option<String>,
    /// URL of the previous page.
    pub previous: Option<String>,
    /// Items on this page.
    pub results: Vec<T>,
}

impl<T> PaginatedResponse<T> {
    /// Whether another page follows this one.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Whether this page is empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl<T> IntoIterator for PaginatedResponse<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageRepr<T> {
    Page {
        count: u64,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
        results: Vec<T>,
    },
    Bare(Vec<T>),
}

impl<T> From<PageRepr<T>> for PaginatedResponse<T> {
    fn from(repr: PageRepr<T>) -> Self {
        match repr {
            PageRepr::Page {
                count,
                next,
                previous,
                results,
            } => Self {
                count,
                next,
                previous,
                results,
            },
            PageRepr::Bare(results) => Self {
                count: results.len() as u64,
                next: None,
                previous: None,
                results,
            },
        }
    }
}

/// `page`, `page_size` and `search` parameters shared by list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
}

impl PageQuery {
    /// Page `page` of `page_size` items.
    pub fn page(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
            search: None,
        }
    }

    /// Restrict to items matching `search`.
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Query pairs in wire order. An empty search is left out.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(size) = self.page_size {
            params.push(("page_size", size.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        params
    }
}

// ============================================================================
// Paths
// ============================================================================

/// `{collection}{id}/`, optionally followed by `{action}/`.
///
/// Ids are interpolated into the path, so anything that would change the
/// path structure is refused.
pub(crate) fn member(collection: &str, id: &str, action: Option<&str>) -> Result<String> {
    if id.trim().is_empty() {
        return Err(ClientError::invalid_request("empty resource id"));
    }
    if id.contains(['/', '?', '#', '%']) || id.chars().any(char::is_whitespace) {
        return Err(ClientError::invalid_request(format!(
            "resource id {id:?} contains reserved characters"
        )));
    }
    Ok(match action {
        Some(action) => format!("{collection}{id}/{action}/"),
        None => format!("{collection}{id}/"),
    })
}

// ============================================================================
// Lenient field decoding
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(serde_json::Number),
    Text(String),
}

impl NumberOrText {
    fn amount<E: serde::de::Error>(self) -> std::result::Result<f64, E> {
        match self {
            NumberOrText::Number(n) => n
                .as_f64()
                .ok_or_else(|| E::custom(format!("amount {n} out of range"))),
            NumberOrText::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid amount {s:?}"))),
        }
    }

    fn text(self) -> String {
        match self {
            NumberOrText::Number(n) => n.to_string(),
            NumberOrText::Text(s) => s,
        }
    }
}

/// Decimal sent as a JSON number or a numeric string.
pub(crate) fn amount<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrText::deserialize(deserializer)?.amount()
}

/// Foreign key sent as a number or a string, kept as text.
pub(crate) fn optional_key<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumberOrText>::deserialize(deserializer).map(|key| key.map(NumberOrText::text))
}
