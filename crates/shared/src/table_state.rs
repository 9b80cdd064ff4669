//! Table filter/sort/pagination state mirrored into a URL query parameter.
//!
//! The whole state is written as one JSON document under a single query
//! parameter so links reproduce the exact view. Fields equal to their
//! defaults are left out, and a fully default state removes the parameter.

use serde::{Deserialize, Serialize};
use url::{form_urlencoded, Url};

pub const DEFAULT_STATE_PARAM: &str = "state";
pub const DEFAULT_PAGE_SIZE: u32 = 15;

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn is_default_page_size(size: &u32) -> bool {
    *size == DEFAULT_PAGE_SIZE
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub id: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRule {
    pub id: String,
    #[serde(default)]
    pub desc: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(rename = "pIndex", default, skip_serializing_if = "is_zero")]
    pub page_index: u32,
    #[serde(
        rename = "pSize",
        default = "default_page_size",
        skip_serializing_if = "is_default_page_size"
    )]
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    fn is_default(&self) -> bool {
        *self == Pagination::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableState {
    #[serde(rename = "cF", default, skip_serializing_if = "Vec::is_empty")]
    pub column_filters: Vec<ColumnFilter>,
    #[serde(rename = "srt", default, skip_serializing_if = "Vec::is_empty")]
    pub sorting: Vec<SortRule>,
    #[serde(rename = "gFil", default, skip_serializing_if = "Option::is_none")]
    pub global_filter: Option<String>,
    #[serde(rename = "p", default, skip_serializing_if = "Pagination::is_default")]
    pub pagination: Pagination,
}

impl TableState {
    pub fn is_default(&self) -> bool {
        *self == TableState::default()
    }

    /// Replaces the filter on `column`; a `null` value clears it.
    pub fn set_column_filter(&mut self, column: &str, value: serde_json::Value) {
        self.column_filters.retain(|f| f.id != column);
        if !value.is_null() {
            self.column_filters.push(ColumnFilter {
                id: column.to_string(),
                value,
            });
        }
        self.pagination.page_index = 0;
    }

    pub fn set_sort(&mut self, column: &str, desc: bool) {
        self.sorting = vec![SortRule {
            id: column.to_string(),
            desc,
        }];
    }

    pub fn set_global_filter(&mut self, filter: Option<String>) {
        self.global_filter = filter.filter(|f| !f.trim().is_empty());
        self.pagination.page_index = 0;
    }

    /// JSON document for the query parameter, or `None` for the default state.
    pub fn encode(&self) -> Option<String> {
        if self.is_default() {
            return None;
        }
        serde_json::to_string(self).ok()
    }

    /// The inverse of [`TableState::encode`]. Anything unreadable decodes to
    /// the default state so a bad link still opens the table.
    pub fn decode(raw: Option<&str>) -> Self {
        raw.and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }

    pub fn from_query(query: &str, param: &str) -> Self {
        let raw = form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .find(|(key, _)| key == param)
            .map(|(_, value)| value.into_owned());
        Self::decode(raw.as_deref())
    }

    pub fn from_url(url: &Url, param: &str) -> Self {
        Self::from_query(url.query().unwrap_or_default(), param)
    }

    /// Rewrites `param` on `url`, keeping every other query parameter.
    pub fn apply_to_url(&self, url: &mut Url, param: &str) {
        let retained: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != param)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let encoded = self.encode();
        if retained.is_empty() && encoded.is_none() {
            url.set_query(None);
            return;
        }

        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (key, value) in &retained {
            pairs.append_pair(key, value);
        }
        if let Some(encoded) = encoded {
            pairs.append_pair(param, &encoded);
        }
    }
}

/// Tracks the state last written to the URL so unchanged states do not
/// produce a new history entry.
#[derive(Debug, Clone)]
pub struct TableStateSync {
    param: String,
    current: TableState,
}

impl TableStateSync {
    pub fn from_url(url: &Url, param: impl Into<String>) -> Self {
        let param = param.into();
        let current = TableState::from_url(url, &param);
        Self { param, current }
    }

    pub fn state(&self) -> &TableState {
        &self.current
    }

    pub fn param(&self) -> &str {
        &self.param
    }

    /// Returns the url to navigate to, or `None` when nothing changed.
    pub fn update(&mut self, next: TableState, url: &Url) -> Option<Url> {
        if next == self.current {
            return None;
        }
        let mut updated = url.clone();
        next.apply_to_url(&mut updated, &self.param);
        self.current = next;
        Some(updated)
    }
}
