//! Paged result envelope.

use serde::{Deserialize, Serialize};

/// Paging input supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationOptions {
    pub continuation_token: Option<String>,
}

impl PaginationOptions {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            continuation_token: Some(token.into()),
        }
    }

    /// 1-based page number carried by the token. Absent, unparseable or
    /// zero tokens mean the first page.
    pub fn page_number(&self) -> u32 {
        self.continuation_token
            .as_deref()
            .and_then(|t| t.trim().parse::<u32>().ok())
            .filter(|&n| n >= 1)
            .unwrap_or(1)
    }
}

/// How a [`PagedResult`] describes its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pagination {
    Counts {
        total: usize,
        page_size: usize,
        returned: usize,
    },
    /// Token to pass back for the next page. Never signals the end; an
    /// empty page is the caller's stop condition.
    Continuation { token: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PagedResult<T> {
    /// Everything in one page.
    pub fn complete(data: Vec<T>) -> Self {
        let n = data.len();
        Self {
            data,
            pagination: Pagination::Counts {
                total: n,
                page_size: n,
                returned: n,
            },
        }
    }

    /// A page followed by the token for `page + 1`.
    pub fn continued(data: Vec<T>, page: u32) -> Self {
        Self {
            data,
            pagination: Pagination::Continuation {
                token: page.saturating_add(1).to_string(),
            },
        }
    }

    pub fn continuation_token(&self) -> Option<&str> {
        match &self.pagination {
            Pagination::Continuation { token } => Some(token),
            Pagination::Counts { .. } => None,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
