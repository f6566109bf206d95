//! Store locator and partner registration endpoints.

use blossom_core::StoreId;
use tracing::{info, instrument};

use super::{ApiClient, Call};
use crate::error::ApiError;
use crate::types::{CreateStoreRequest, NearbyStoreQuery, Store, StoreWithDistance};
use crate::validate::Validate;

impl ApiClient {
    /// Find stores around a point.
    ///
    /// # Errors
    ///
    /// Returns an error if the query is invalid, the request fails, or a
    /// store is malformed.
    #[instrument(skip(self))]
    pub async fn nearby_stores(
        &self,
        query: &NearbyStoreQuery,
    ) -> Result<Vec<StoreWithDistance>, ApiError> {
        query.validate()?;
        self.fetch(Call::get("/stores/nearby").query_pairs(query.query_pairs()))
            .await
    }

    /// Register a partner store.
    ///
    /// # Errors
    ///
    /// Returns an error if the registration is invalid or rejected.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_store(&self, request: &CreateStoreRequest) -> Result<Store, ApiError> {
        request.validate()?;
        let store: Store = self.fetch(Call::post("/stores").json(request)?).await?;
        info!(store_id = %store.id, "Store registered");
        Ok(store)
    }

    /// Fetch one store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store does not exist or is malformed.
    #[instrument(skip(self))]
    pub async fn store(&self, store_id: StoreId) -> Result<Store, ApiError> {
        let path = format!("/stores/{store_id}");
        self.fetch(Call::get(&path)).await
    }
}
