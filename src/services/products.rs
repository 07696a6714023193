use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    config::AppConfig,
    errors::ServiceError,
    models::{Product, ProductForm},
    notifications::{Notice, NoticeSender},
    pricing::{InventoryFields, PricingFields},
};

/// Wire payload for creating or updating a product.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductPayload {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "sku is required"))]
    pub sku: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(flatten)]
    pub pricing: PricingFields,
    #[serde(flatten)]
    pub inventory: InventoryFields,
}

impl ProductPayload {
    /// Builds the wire payload from form state. Fails on a missing required
    /// field or attribute text that is not a JSON object.
    pub fn from_form(form: &ProductForm) -> Result<Self, ServiceError> {
        let attributes: Map<String, Value> = if form.attributes_json.trim().is_empty() {
            Map::new()
        } else {
            serde_json::from_str(&form.attributes_json).map_err(|e| {
                ServiceError::ValidationError(format!("attributes must be a JSON object: {}", e))
            })?
        };

        let payload = Self {
            name: form.name.trim().to_string(),
            sku: form.sku.trim().to_string(),
            description: (!form.description.is_empty()).then(|| form.description.clone()),
            category_id: form.category_id.clone(),
            is_active: form.is_active,
            attributes,
            pricing: form.pricing,
            inventory: form.inventory,
        };
        payload.validate()?;
        Ok(payload)
    }
}

/// The backend product service, as consumed by the admin console.
#[async_trait]
pub trait ProductApi: Send + Sync {
    async fn create(&self, payload: ProductPayload) -> Result<Product, ServiceError>;
    async fn update(&self, id: &str, payload: ProductPayload) -> Result<Product, ServiceError>;
}

/// `reqwest`-backed [`ProductApi`] implementation.
#[derive(Debug, Clone)]
pub struct HttpProductClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpProductClient {
    pub fn new(config: &AppConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| {
                ServiceError::ExternalServiceError(format!("failed to build HTTP client: {}", e))
            })?;
        Ok(Self::with_client(&config.api_base_url, http))
    }

    /// Build a client around an existing `reqwest::Client` (useful for tests).
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ProductApi for HttpProductClient {
    #[instrument(skip(self, payload))]
    async fn create(&self, payload: ProductPayload) -> Result<Product, ServiceError> {
        let response = self
            .http
            .post(self.url("/products"))
            .json(&payload)
            .send()
            .await?;
        super::read_json(response).await
    }

    #[instrument(skip(self, payload))]
    async fn update(&self, id: &str, payload: ProductPayload) -> Result<Product, ServiceError> {
        let response = self
            .http
            .put(self.url(&format!("/products/{}", id)))
            .json(&payload)
            .send()
            .await?;
        super::read_json(response).await
    }
}

/// Validates and submits product forms.
///
/// Validation runs before any service call: a rejected form sends nothing.
#[derive(Clone)]
pub struct ProductFormService<A: ProductApi> {
    api: Arc<A>,
    notices: NoticeSender,
}

impl<A: ProductApi> ProductFormService<A> {
    pub fn new(api: Arc<A>, notices: NoticeSender) -> Self {
        Self { api, notices }
    }

    /// Submits the form: create when it has no product id, update otherwise.
    #[instrument(skip(self, form))]
    pub async fn submit(&self, form: &ProductForm) -> Result<Product, ServiceError> {
        let payload = match ProductPayload::from_form(form) {
            Ok(payload) => payload,
            Err(err) => {
                self.notices
                    .send_or_log(Notice::error("invalid_product_form", err.to_string()))
                    .await;
                return Err(err);
            }
        };

        let result = match &form.id {
            Some(id) => self.api.update(id, payload).await,
            None => self.api.create(payload).await,
        };

        match &result {
            Ok(product) => info!(product_id = %product.id, "Product saved"),
            Err(err) => {
                warn!(error = %err, "Failed to save product");
                self.notices
                    .send_or_log(Notice::error("product_service_error", "Failed to save product"))
                    .await;
            }
        }
        result
    }
}
