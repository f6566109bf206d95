//! Display labels for system codes.

use tokio::sync::OnceCell;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::{CodeItem, SystemCodes};

/// Category and delivery-type labels, fetched once per book.
#[derive(Debug)]
pub struct CodeBook {
    client: ApiClient,
    codes: OnceCell<SystemCodes>,
}

impl CodeBook {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            codes: OnceCell::new(),
        }
    }

    /// A book with codes already known.
    #[must_use]
    pub fn with_codes(client: ApiClient, codes: SystemCodes) -> Self {
        Self {
            client,
            codes: OnceCell::new_with(Some(codes)),
        }
    }

    /// Fetch the codes unless already loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the codes cannot be fetched.
    pub async fn codes(&self) -> Result<&SystemCodes, ApiError> {
        self.codes
            .get_or_try_init(|| self.client.system_codes())
            .await
    }

    /// Category choices in display order.
    ///
    /// # Errors
    ///
    /// Returns an error if the codes cannot be fetched.
    pub async fn category_options(&self) -> Result<Vec<CodeItem>, ApiError> {
        Ok(sorted(&self.codes().await?.category))
    }

    /// Delivery-type choices in display order.
    ///
    /// # Errors
    ///
    /// Returns an error if the codes cannot be fetched.
    pub async fn delivery_type_options(&self) -> Result<Vec<CodeItem>, ApiError> {
        Ok(sorted(&self.codes().await?.delivery_type))
    }

    /// Label for a category code; unknown codes (or codes not loaded yet)
    /// are shown as-is.
    #[must_use]
    pub fn category_label<'a>(&'a self, value: &'a str) -> &'a str {
        self.codes
            .get()
            .map_or(value, |codes| label_in(&codes.category, value))
    }

    /// Label for a delivery-type code, falling back to the code itself.
    #[must_use]
    pub fn delivery_type_label<'a>(&'a self, value: &'a str) -> &'a str {
        self.codes
            .get()
            .map_or(value, |codes| label_in(&codes.delivery_type, value))
    }
}

fn label_in<'a>(items: &'a [CodeItem], value: &'a str) -> &'a str {
    items
        .iter()
        .find(|item| item.value == value)
        .map_or(value, |item| item.label.as_str())
}

fn sorted(items: &[CodeItem]) -> Vec<CodeItem> {
    let mut items = items.to_vec();
    items.sort_by_key(|item| item.order.unwrap_or(i64::MAX));
    items
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::config::ClientConfig;
    use crate::session::Session;

    fn book() -> CodeBook {
        let config = ClientConfig::new(Url::parse("http://127.0.0.1:9").unwrap());
        let client = ApiClient::new(&config, Session::in_memory()).unwrap();
        let codes: SystemCodes = serde_json::from_value(json!({
            "category": [
                {"label": "Plant", "value": "PLANT", "order": 2},
                {"label": "Bouquet", "value": "FLOWER_BOUQUET", "order": 1}
            ],
            "deliveryType": [{"label": "Same-day", "value": "QUICK"}]
        }))
        .unwrap();
        CodeBook::with_codes(client, codes)
    }

    #[test]
    fn test_labels_fall_back_to_value() {
        let book = book();
        assert_eq!(book.category_label("PLANT"), "Plant");
        assert_eq!(book.category_label("CACTUS"), "CACTUS");
        assert_eq!(book.delivery_type_label("QUICK"), "Same-day");
        assert_eq!(book.delivery_type_label("PARCEL"), "PARCEL");
    }

    #[tokio::test]
    async fn test_options_are_ordered() {
        let options = book().category_options().await.unwrap();
        assert_eq!(options[0].value, "FLOWER_BOUQUET");
        assert_eq!(options[1].value, "PLANT");
    }
}
