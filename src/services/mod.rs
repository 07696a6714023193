//! Clients for the external backend services and the admin flows built on
//! top of them. Everything here does I/O; the engines it feeds do not.

pub mod categories;
pub mod products;

pub use categories::{
    CategoryAdminService, CategoryApi, CategoryTreeState, CreateCategoryInput, DeleteCheck,
    HttpCategoryClient, UpdateCategoryInput,
};
pub use products::{HttpProductClient, ProductApi, ProductFormService, ProductPayload};

use serde::de::DeserializeOwned;

use crate::errors::ServiceError;

/// Maps a non-success HTTP status into the error taxonomy.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response.text().await.unwrap_or_default();
    Err(match status {
        reqwest::StatusCode::NOT_FOUND => {
            if detail.is_empty() {
                ServiceError::NotFound("resource not found".to_string())
            } else {
                ServiceError::NotFound(detail)
            }
        }
        s if s.is_client_error() => ServiceError::BadRequest(format!("{}: {}", status, detail)),
        _ => ServiceError::ExternalServiceError(format!("{}: {}", status, detail)),
    })
}

pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ServiceError> {
    let response = ensure_success(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| ServiceError::SerializationError(format!("failed to decode response: {}", e)))
}
