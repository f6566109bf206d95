//! System code tables (category and delivery-type labels).

use serde::{Deserialize, Serialize};

use crate::validate::{self, Validate, ValidationError};

/// A code with its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeItem {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub order: Option<i64>,
}

impl Validate for CodeItem {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::non_blank("value", &self.value)
    }
}

/// All code groups served by `GET /system/codes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemCodes {
    pub category: Vec<CodeItem>,
    pub delivery_type: Vec<CodeItem>,
}

impl Validate for SystemCodes {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::each("category", &self.category)?;
        validate::each("deliveryType", &self.delivery_type)
    }
}
