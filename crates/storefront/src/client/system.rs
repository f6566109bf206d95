//! System code endpoint.

use std::sync::Arc;

use tracing::instrument;

use super::cache::{CacheKey, CacheValue};
use super::{ApiClient, Call};
use crate::error::ApiError;
use crate::types::SystemCodes;

impl ApiClient {
    /// Fetch the category and delivery-type code tables.
    ///
    /// Cached for the configured catalog TTL.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the codes are malformed.
    #[instrument(skip(self))]
    pub async fn system_codes(&self) -> Result<SystemCodes, ApiError> {
        if let Some(CacheValue::SystemCodes(codes)) = self.cached(&CacheKey::SystemCodes).await {
            return Ok(codes.as_ref().clone());
        }

        let codes: SystemCodes = self.fetch(Call::get("/system/codes")).await?;
        self.cache_insert(CacheKey::SystemCodes, CacheValue::SystemCodes(Arc::new(codes.clone())))
            .await;
        Ok(codes)
    }
}
