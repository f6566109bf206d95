//! Product catalog types.

use blossom_core::{AddonId, DeliveryType, OptionId, ProductCategory, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::page::Page;
use crate::validate::{self, Validate, ValidationError};

/// A product as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub stock_quantity: i64,
    pub thumbnail_url: Option<String>,
    /// Category code; labels come from the system code book.
    pub category: Option<String>,
    pub is_active: Option<bool>,
    pub is_available_today: Option<bool>,
    /// Delivery type code; labels come from the system code book.
    pub delivery_type: Option<String>,
    #[serde(default)]
    pub options: Vec<ProductOption>,
    pub review_count: Option<i64>,
    pub total_rating: Option<f64>,
    pub average_rating: Option<f64>,
}

impl Product {
    /// Price the customer pays before options (discount price when present).
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        self.discount_price.unwrap_or(self.price)
    }

    /// Unit price with the chosen options applied.
    ///
    /// Option IDs that do not belong to this product are ignored.
    #[must_use]
    pub fn unit_price_with(&self, option_ids: &[OptionId]) -> Decimal {
        self.options
            .iter()
            .filter(|option| option_ids.contains(&option.id))
            .fold(self.effective_price(), |total, option| {
                total + option.price_adjustment
            })
    }

    /// Whether the product can be ordered right now.
    #[must_use]
    pub fn is_orderable(&self) -> bool {
        self.is_active.unwrap_or(true) && self.stock_quantity > 0
    }
}

impl Validate for Product {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::non_blank("name", &self.name)?;
        validate::non_negative("price", self.price)?;
        if let Some(discount) = self.discount_price {
            validate::non_negative("discountPrice", discount)?;
        }
        validate::non_negative_count("stockQuantity", self.stock_quantity)?;
        if let Some(count) = self.review_count {
            validate::non_negative_count("reviewCount", count)?;
        }
        if let Some(rating) = self.average_rating
            && !(0.0..=5.0).contains(&rating)
        {
            return Err(ValidationError::new("averageRating", "must be between 0 and 5"));
        }
        validate::each("options", &self.options)
    }
}

/// A selectable option (size, wrapping, ...) with its price adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOption {
    pub id: OptionId,
    pub name: String,
    pub option_value: String,
    pub price_adjustment: Decimal,
}

impl Validate for ProductOption {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::non_blank("name", &self.name)
    }
}

/// An add-on sold alongside products (cards, vases, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAddon {
    pub id: AddonId,
    pub name: String,
    pub price: Decimal,
}

impl Validate for ProductAddon {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::non_blank("name", &self.name)?;
        validate::non_negative("price", self.price)
    }
}

/// Paged product listing as returned by the backend.
///
/// Older backends answer the paged endpoint with a bare array; that shape is
/// wrapped into a single page.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProductListing {
    Paged(Page<Product>),
    Legacy(Vec<Product>),
}

impl ProductListing {
    /// Normalize into a page.
    #[must_use]
    pub fn into_page(self) -> Page<Product> {
        match self {
            Self::Paged(page) => page,
            Self::Legacy(products) => Page::single(products),
        }
    }
}

impl Validate for ProductListing {
    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Paged(page) => page.validate(),
            Self::Legacy(products) => validate::each("content", products),
        }
    }
}

/// Option definition sent when creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProductOption {
    pub name: String,
    pub option_value: String,
    pub price_adjustment: Decimal,
}

impl Validate for NewProductOption {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::non_blank("name", &self.name)?;
        validate::non_blank("optionValue", &self.option_value)
    }
}

/// Back-office request to create a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub product_code: String,
    pub price: Decimal,
    pub stock_quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: ProductCategory,
    pub delivery_type: DeliveryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<NewProductOption>,
}

impl Validate for CreateProductRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::non_blank("name", &self.name)?;
        validate::non_blank("productCode", &self.product_code)?;
        validate::non_negative("price", self.price)?;
        validate::non_negative_count("stockQuantity", self.stock_quantity)?;
        validate::each("options", &self.options)
    }
}

/// Back-office partial update; only present fields are changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ProductCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_type: Option<DeliveryType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<NewProductOption>>,
}

impl UpdateProductRequest {
    /// Whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Validate for UpdateProductRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::new("product", "update changes no fields"));
        }
        if let Some(name) = &self.name {
            validate::non_blank("name", name)?;
        }
        if let Some(code) = &self.product_code {
            validate::non_blank("productCode", code)?;
        }
        if let Some(price) = self.price {
            validate::non_negative("price", price)?;
        }
        if let Some(stock) = self.stock_quantity {
            validate::non_negative_count("stockQuantity", stock)?;
        }
        if let Some(options) = &self.options {
            validate::each("options", options)?;
        }
        Ok(())
    }
}
