use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use crate::{
    catalog::{self, ExpandedKeys},
    config::AppConfig,
    errors::ServiceError,
    models::{Category, CategoryRow},
    notifications::{Notice, NoticeSender},
};

/// Payload for creating a category. `parent_id: None` creates a root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Partial update for an existing category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCategoryInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Result of the pre-delete children check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteCheck {
    pub has_children: bool,
}

/// The backend category service, as consumed by the admin console.
#[async_trait]
pub trait CategoryApi: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Category>, ServiceError>;
    async fn create(&self, input: CreateCategoryInput) -> Result<Category, ServiceError>;
    async fn update(&self, id: &str, input: UpdateCategoryInput)
        -> Result<Category, ServiceError>;
    /// Children-blocking delete; the backend rejects it if children exist.
    async fn delete(&self, id: &str) -> Result<(), ServiceError>;
    /// Cascading delete of the category and its whole subtree.
    async fn delete_with_children(&self, id: &str) -> Result<(), ServiceError>;
    async fn list_children(&self, id: &str) -> Result<Vec<Category>, ServiceError>;
}

/// `reqwest`-backed [`CategoryApi`] implementation.
#[derive(Debug, Clone)]
pub struct HttpCategoryClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCategoryClient {
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
impl CategoryApi for HttpCategoryClient {
    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Category>, ServiceError> {
        let response = self.http.get(self.url("/categories")).send().await?;
        super::read_json(response).await
    }

    #[instrument(skip(self, input))]
    async fn create(&self, input: CreateCategoryInput) -> Result<Category, ServiceError> {
        let response = self
            .http
            .post(self.url("/categories"))
            .json(&input)
            .send()
            .await?;
        super::read_json(response).await
    }

    #[instrument(skip(self, input))]
    async fn update(
        &self,
        id: &str,
        input: UpdateCategoryInput,
    ) -> Result<Category, ServiceError> {
        let response = self
            .http
            .put(self.url(&format!("/categories/{}", id)))
            .json(&input)
            .send()
            .await?;
        super::read_json(response).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let response = self
            .http
            .delete(self.url(&format!("/categories/{}", id)))
            .send()
            .await?;
        super::ensure_success(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_with_children(&self, id: &str) -> Result<(), ServiceError> {
        let response = self
            .http
            .delete(self.url(&format!("/categories/{}", id)))
            .query(&[("cascade", "true")])
            .send()
            .await?;
        super::ensure_success(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_children(&self, id: &str) -> Result<Vec<Category>, ServiceError> {
        let response = self
            .http
            .get(self.url(&format!("/categories/{}/children", id)))
            .send()
            .await?;
        super::read_json(response).await
    }
}

/// The category forest plus its interaction state. Owned by the UI layer;
/// every mutation flows through [`CategoryAdminService`] and comes back as a
/// fresh state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTreeState {
    pub forest: Vec<Category>,
    pub expanded: ExpandedKeys,
}

impl CategoryTreeState {
    /// Current display rows for the tree table.
    pub fn rows(&self) -> Vec<CategoryRow<'_>> {
        catalog::flatten(&self.forest, &self.expanded)
    }

    /// Display rows filtered by a name search.
    pub fn search(&self, query: &str) -> Vec<CategoryRow<'_>> {
        catalog::search(&self.forest, query)
    }
}

/// Admin flows over the category service: load, refresh, create, update,
/// and the two-step delete.
///
/// Mutations never patch the local forest; they refetch it, since the
/// backend's cascade semantics cannot be fully predicted client-side.
#[derive(Clone)]
pub struct CategoryAdminService<A: CategoryApi> {
    api: Arc<A>,
    notices: NoticeSender,
}

impl<A: CategoryApi> CategoryAdminService<A> {
    pub fn new(api: Arc<A>, notices: NoticeSender) -> Self {
        Self { api, notices }
    }

    /// Surfaces a service failure as an error notice; local state is the
    /// caller's and stays untouched.
    async fn surface<T>(
        &self,
        result: Result<T, ServiceError>,
        context: &str,
    ) -> Result<T, ServiceError> {
        if let Err(err) = &result {
            warn!(error = %err, "{}", context);
            self.notices
                .send_or_log(Notice::error("category_service_error", context))
                .await;
        }
        result
    }

    /// Initial load: fetches the forest and expands its root categories.
    #[instrument(skip(self))]
    pub async fn load_tree(&self) -> Result<CategoryTreeState, ServiceError> {
        let forest = self.api.list_all().await;
        let forest = self.surface(forest, "Failed to load categories").await?;
        let expanded = ExpandedKeys::for_initial_load(&forest);
        info!(roots = forest.len(), "Loaded category tree");
        Ok(CategoryTreeState { forest, expanded })
    }

    /// Refetches the forest, preserving the expand/collapse state.
    #[instrument(skip(self, state))]
    pub async fn refresh(
        &self,
        state: &CategoryTreeState,
    ) -> Result<CategoryTreeState, ServiceError> {
        let forest = self.api.list_all().await;
        let forest = self.surface(forest, "Failed to refresh categories").await?;
        Ok(CategoryTreeState {
            forest,
            expanded: state.expanded.clone(),
        })
    }

    #[instrument(skip(self, state, input))]
    pub async fn create_category(
        &self,
        state: &CategoryTreeState,
        input: CreateCategoryInput,
    ) -> Result<CategoryTreeState, ServiceError> {
        let created = self.api.create(input).await;
        let created = self.surface(created, "Failed to create category").await?;
        info!(category_id = %created.id, "Category created");
        self.refresh(state).await
    }

    #[instrument(skip(self, state, input))]
    pub async fn update_category(
        &self,
        state: &CategoryTreeState,
        id: &str,
        input: UpdateCategoryInput,
    ) -> Result<CategoryTreeState, ServiceError> {
        let updated = self.api.update(id, input).await;
        let updated = self.surface(updated, "Failed to update category").await?;
        info!(category_id = %updated.id, "Category updated");
        self.refresh(state).await
    }

    /// Checks for children before offering delete options. When the check
    /// itself fails, assumes children exist so the unconfirmed destructive
    /// path is never offered by mistake.
    #[instrument(skip(self))]
    pub async fn request_delete(&self, id: &str) -> DeleteCheck {
        match self.api.list_children(id).await {
            Ok(children) => DeleteCheck {
                has_children: !children.is_empty(),
            },
            Err(err) => {
                warn!(category_id = %id, error = %err, "Children check failed; assuming children exist");
                DeleteCheck { has_children: true }
            }
        }
    }

    #[instrument(skip(self, state))]
    pub async fn confirm_delete(
        &self,
        state: &CategoryTreeState,
        id: &str,
        delete_with_children: bool,
    ) -> Result<CategoryTreeState, ServiceError> {
        let result = if delete_with_children {
            self.api.delete_with_children(id).await
        } else {
            self.api.delete(id).await
        };
        self.surface(result, "Failed to delete category").await?;
        info!(category_id = %id, cascade = delete_with_children, "Category deleted");
        self.refresh(state).await
    }
}
