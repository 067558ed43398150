use serde::{Deserialize, Serialize};

use crate::error::DataError;
use crate::query::QueryError;

pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Pagination options as supplied by the caller.
///
/// Starts from the defaults (`page_number = 0`, `page_size = 10`,
/// ascending) and applies each setter in call order: later calls override
/// scalar fields, `sort_by` accumulates. Nothing is checked until
/// [`PageRequest::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page_number: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    #[serde(default)]
    pub sort_by: Vec<String>,
    #[serde(default)]
    pub sort_desc: bool,
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: 0,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: Vec::new(),
            sort_desc: false,
        }
    }
}

impl PageRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-based page number.
    pub fn page_number(mut self, number: u64) -> Self {
        self.page_number = number;
        self
    }

    /// Rows per page; must be greater than 0.
    pub fn page_size(mut self, size: u64) -> Self {
        self.page_size = size;
        self
    }

    /// Add a sort column. Multiple calls append.
    pub fn sort_by(mut self, column: impl Into<String>) -> Self {
        self.sort_by.push(column.into());
        self
    }

    /// Sort every column descending.
    pub fn sort_desc(mut self) -> Self {
        self.sort_desc = true;
        self
    }

    /// Sort every column ascending (the default).
    pub fn sort_asc(mut self) -> Self {
        self.sort_desc = false;
        self
    }

    pub fn validate(&self) -> Result<(), DataError> {
        if self.page_size == 0 {
            return Err(DataError::InvalidPageSize(self.page_size));
        }
        Ok(())
    }

    /// Validate and fill in the default sort column.
    pub fn resolve(self, id_column: &str) -> Result<PageParams, DataError> {
        self.validate()?;
        let sort_by = if self.sort_by.is_empty() {
            vec![id_column.to_string()]
        } else {
            self.sort_by
        };
        Ok(PageParams {
            page_number: self.page_number,
            page_size: self.page_size,
            sort_by,
            sort_desc: self.sort_desc,
        })
    }
}

/// Validated pagination parameters: `page_size > 0` and at least one sort
/// column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageParams {
    page_number: u64,
    page_size: u64,
    sort_by: Vec<String>,
    sort_desc: bool,
}

impl PageParams {
    pub fn page_number(&self) -> u64 {
        self.page_number
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn sort_by(&self) -> &[String] {
        &self.sort_by
    }

    pub fn sort_desc(&self) -> bool {
        self.sort_desc
    }

    pub fn offset(&self) -> Result<u64, QueryError> {
        self.page_number
            .checked_mul(self.page_size)
            .ok_or(QueryError::OffsetOverflow {
                page: self.page_number,
                size: self.page_size,
            })
    }
}

/// A page of results with pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Zero-based page number.
    pub number: u64,
    /// Rows actually returned; below the requested size on the last page.
    pub size: u64,
    pub total: u64,
    pub total_pages: u64,
    pub content: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, params: &PageParams, total: u64) -> Self {
        Self {
            number: params.page_number,
            size: content.len() as u64,
            total,
            total_pages: total_pages(total, params.page_size),
            content,
        }
    }

    /// The page returned when a query matched no rows, whatever was asked for.
    pub fn empty() -> Self {
        Self {
            number: 0,
            size: 0,
            total: 0,
            total_pages: 0,
            content: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            number: self.number,
            size: self.size,
            total: self.total,
            total_pages: self.total_pages,
            content: self.content.into_iter().map(f).collect(),
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// `ceil(total / page_size)`; zero when `page_size` is zero.
pub fn total_pages(total: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    }
}
