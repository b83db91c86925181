//! Query paging state

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;

/// Continuation state for paged queries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pager {
    /// 1-based page number
    pub page: u32,
    /// Sort field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    /// Descending sort
    pub desc: bool,
    /// Page size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Opaque key for search-after style continuation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_key: Option<String>,
}

impl Pager {
    pub fn new(page: u32) -> Self {
        Self {
            page,
            desc: true,
            ..Default::default()
        }
    }

    /// Query string parameters for the store
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if self.page > 0 {
            params.push(("page", self.page.to_string()));
        }
        if let Some(sort) = &self.sort_by {
            params.push(("sort", sort.clone()));
        }
        params.push(("desc", self.desc.to_string()));
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(key) = &self.last_key {
            params.push(("lastKey", key.clone()));
        }
        params
    }
}

/// Page requested on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelector {
    /// A single page
    Number(u32),
    /// Every page until an empty one comes back
    All,
}

impl FromStr for PageSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<u32>()
            .map(Self::Number)
            .map_err(|_| Error::validation(format!("invalid page '{}': expected a number or 'all'", s)))
    }
}
