//! Spring-style pagination envelope.

use serde::{Deserialize, Serialize};

use crate::validate::{self, Validate, ValidationError};

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_pages: i64,
    pub total_elements: i64,
    pub last: bool,
    pub size: i64,
    pub number: i64,
    pub first: bool,
    pub empty: bool,
}

impl<T> Page<T> {
    /// Wrap a complete, unpaged result set as the only page.
    #[must_use]
    pub fn single(content: Vec<T>) -> Self {
        let len = i64::try_from(content.len()).unwrap_or(i64::MAX);
        Self {
            empty: content.is_empty(),
            content,
            total_pages: 1,
            total_elements: len,
            last: true,
            size: len,
            number: 0,
            first: true,
        }
    }

    /// Whether another page follows this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        !self.last
    }

    /// Request for the page after this one, if any.
    #[must_use]
    pub fn next_request(&self) -> Option<PageRequest> {
        if self.last {
            return None;
        }
        let number = u32::try_from(self.number + 1).ok()?;
        let size = u32::try_from(self.size).ok()?;
        Some(PageRequest {
            page: number,
            size,
            ..PageRequest::default()
        })
    }
}

impl<T: Validate> Validate for Page<T> {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::non_negative_count("totalPages", self.total_pages)?;
        validate::non_negative_count("totalElements", self.total_elements)?;
        validate::non_negative_count("size", self.size)?;
        validate::non_negative_count("number", self.number)?;
        if self.empty != self.content.is_empty() {
            return Err(ValidationError::new(
                "empty",
                "disagrees with the page content",
            ));
        }
        let len = i64::try_from(self.content.len()).unwrap_or(i64::MAX);
        if len > self.total_elements {
            return Err(ValidationError::new(
                "totalElements",
                "is smaller than the page content",
            ));
        }
        validate::each("content", &self.content)
    }
}

/// Paging and filtering parameters for the product listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page number.
    pub page: u32,
    pub size: u32,
    /// Sort expression, e.g. `price,asc`.
    pub sort: Option<String>,
    pub category_id: Option<i64>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: 20,
            sort: None,
            category_id: None,
        }
    }
}

impl PageRequest {
    /// Query pairs in wire order.
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("size", self.size.to_string()),
        ];
        if let Some(sort) = &self.sort {
            pairs.push(("sort", sort.clone()));
        }
        if let Some(category_id) = self.category_id {
            pairs.push(("categoryId", category_id.to_string()));
        }
        pairs
    }
}

impl Validate for PageRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.size == 0 {
            return Err(ValidationError::new("size", "must be at least 1"));
        }
        if let Some(sort) = &self.sort {
            validate::non_blank("sort", sort)?;
        }
        Ok(())
    }
}
