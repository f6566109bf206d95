//! Cache types for catalog responses.

use std::sync::Arc;

use crate::types::{Product, SystemCodes};

/// Cache key for catalog responses.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    SystemCodes,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Arc<Vec<Product>>),
    SystemCodes(Arc<SystemCodes>),
}
