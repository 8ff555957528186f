use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Requested page, either a 1-based number or the last page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    Number(u64),
    Last,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::Number(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("Page is not a positive integer: {0}")]
    NotAnInteger(String),

    #[error("Page {requested} is out of range (last page is {num_pages})")]
    OutOfRange { requested: u64, num_pages: u64 },
}

impl FromStr for PageRequest {
    type Err = PageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "last" {
            return Ok(PageRequest::Last);
        }
        match s.parse::<u64>() {
            Ok(0) => Err(PageError::OutOfRange { requested: 0, num_pages: 0 }),
            Ok(n) => Ok(PageRequest::Number(n)),
            Err(_) => Err(PageError::NotAnInteger(s.to_string())),
        }
    }
}

impl PageRequest {
    /// Parse an optional `page` query value, absent meaning page 1
    pub fn parse_optional(raw: Option<&str>) -> Result<Self, PageError> {
        match raw {
            None => Ok(PageRequest::default()),
            Some(s) if s.trim().is_empty() => Ok(PageRequest::default()),
            Some(s) => s.parse(),
        }
    }
}

/// Offset/limit slice of a result set for one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub offset: u64,
    pub limit: u64,
    pub total: u64,
}

/// Page metadata rendered alongside the items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page: Option<u64>,
    pub previous_page: Option<u64>,
}

impl From<PageWindow> for PageInfo {
    fn from(w: PageWindow) -> Self {
        let has_next = w.number < w.num_pages;
        let has_previous = w.number > 1;
        Self {
            number: w.number,
            num_pages: w.num_pages,
            total: w.total,
            has_next,
            has_previous,
            next_page: has_next.then(|| w.number + 1),
            previous_page: has_previous.then(|| w.number - 1),
        }
    }
}

/// Splits `total` items into pages of `per_page`
///
/// An empty result set still has one (empty) first page.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: u64,
    total: u64,
}

impl Paginator {
    pub fn new(per_page: u64, total: u64) -> Self {
        Self {
            per_page: per_page.max(1),
            total,
        }
    }

    pub fn num_pages(&self) -> u64 {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.per_page)
        }
    }

    pub fn window(&self, request: PageRequest) -> Result<PageWindow, PageError> {
        let num_pages = self.num_pages();
        let number = match request {
            PageRequest::Last => num_pages,
            PageRequest::Number(n) => n,
        };

        if number == 0 || number > num_pages {
            return Err(PageError::OutOfRange {
                requested: number,
                num_pages,
            });
        }

        Ok(PageWindow {
            number,
            num_pages,
            offset: (number - 1) * self.per_page,
            limit: self.per_page,
            total: self.total,
        })
    }
}
