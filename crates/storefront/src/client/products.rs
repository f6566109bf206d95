//! Product catalog endpoints.

use std::sync::Arc;

use blossom_core::ProductId;
use serde_json::json;
use tracing::instrument;

use super::cache::{CacheKey, CacheValue};
use super::{ApiClient, Call};
use crate::error::ApiError;
use crate::types::{
    CreateProductRequest, Page, PageRequest, Product, ProductAddon, ProductListing, ProductOption,
    UpdateProductRequest,
};
use crate::validate::{self, Validate};

impl ApiClient {
    /// List all products.
    ///
    /// Cached for the configured catalog TTL.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the listing is malformed.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.cached(&CacheKey::Products).await {
            return Ok(products.as_ref().clone());
        }

        let listing: ProductListing = self.fetch(Call::get("/products")).await?;
        let products = listing.into_page().content;

        self.cache_insert(CacheKey::Products, CacheValue::Products(Arc::new(products.clone())))
            .await;
        Ok(products)
    }

    /// Fetch one page of products.
    ///
    /// Backends that ignore paging and answer with a bare array get that
    /// array wrapped as a single page.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid, the request fails, or the
    /// page is malformed.
    #[instrument(skip(self), fields(page = request.page, size = request.size))]
    pub async fn products_page(&self, request: &PageRequest) -> Result<Page<Product>, ApiError> {
        request.validate()?;
        let listing: ProductListing = self
            .fetch(Call::get("/products").query_pairs(request.query_pairs()))
            .await?;
        Ok(listing.into_page())
    }

    /// Fetch a single product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        let path = format!("/products/{id}");
        self.fetch(Call::get(&path)).await
    }

    /// Fetch the selectable options of a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or an option is malformed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product_options(&self, id: ProductId) -> Result<Vec<ProductOption>, ApiError> {
        let path = format!("/products/{id}/options");
        self.fetch(Call::get(&path)).await
    }

    /// Fetch the add-ons offered with every product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or an add-on is malformed.
    #[instrument(skip(self))]
    pub async fn addons(&self) -> Result<Vec<ProductAddon>, ApiError> {
        self.fetch(Call::get("/products/addons")).await
    }

    /// Create a product. Requires a back-office role.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin, the request is invalid,
    /// or the backend rejects it.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_product(&self, request: &CreateProductRequest) -> Result<Product, ApiError> {
        self.require_admin()?;
        request.validate()?;
        let product = self.fetch(Call::post("/products").json(request)?).await?;
        self.invalidate_cache();
        Ok(product)
    }

    /// Change some fields of a product. Requires a back-office role.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin, the update is empty or
    /// invalid, or the backend rejects it.
    #[instrument(skip(self, request), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: ProductId,
        request: &UpdateProductRequest,
    ) -> Result<Product, ApiError> {
        self.require_admin()?;
        request.validate()?;
        let path = format!("/products/{id}");
        let product = self.fetch(Call::put(&path).json(request)?).await?;
        self.invalidate_cache();
        Ok(product)
    }

    /// Delete a product. Requires a back-office role.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin or the backend rejects it.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ApiError> {
        self.require_admin()?;
        let path = format!("/products/{id}");
        self.execute(Call::delete(&path)).await?;
        self.invalidate_cache();
        Ok(())
    }

    /// Add stock to a product. Requires a back-office role.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin, the quantity is not
    /// positive, or the backend rejects it.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn restock_product(&self, id: ProductId, quantity: i64) -> Result<(), ApiError> {
        self.require_admin()?;
        validate::positive_count("quantity", quantity)?;
        let path = format!("/products/{id}/restock");
        self.execute(Call::post(&path).json(&json!({ "quantity": quantity }))?)
            .await?;
        self.invalidate_cache();
        Ok(())
    }
}
