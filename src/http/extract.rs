//! Validating extractors.
//!
//! Wrap axum's `Json`, `Path` and `Query` so that every rejection, and every
//! failed semantic check, becomes the fixed bad-request envelope.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::http::error::ApiError;

/// Semantic checks beyond what deserialization enforces.
///
/// The default accepts anything that deserialized; types whose fields are
/// fully constrained by their Rust types (flags, enums) use it as-is.
pub trait Validate {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Reject blank strings.
pub fn require_non_blank(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{field} must not be blank"))
    } else {
        Ok(())
    }
}

/// Reject blank strings when present.
pub fn optional_non_blank(field: &str, value: Option<&str>) -> Result<(), String> {
    value.map_or(Ok(()), |value| require_non_blank(field, value))
}

/// Page numbers and sizes start at 1; sizes are capped.
pub fn check_paging(page: Option<u32>, page_size: Option<u32>) -> Result<(), String> {
    const MAX_PAGE_SIZE: u32 = 500;
    if page == Some(0) {
        return Err("page must be at least 1".to_string());
    }
    match page_size {
        Some(0) => Err("page_size must be at least 1".to_string()),
        Some(size) if size > MAX_PAGE_SIZE => Err(format!("page_size must be at most {MAX_PAGE_SIZE}")),
        _ => Ok(()),
    }
}

/// JSON body, deserialized then validated.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        value.validate().map_err(ApiError::Validation)?;
        Ok(ValidJson(value))
    }
}

/// Query string, deserialized then validated.
#[derive(Debug, Clone)]
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        value.validate().map_err(ApiError::Validation)?;
        Ok(ValidQuery(value))
    }
}

/// A single path identifier: non-blank, no `/`, bounded length.
#[derive(Debug, Clone)]
pub struct ValidId(pub String);

impl<S> FromRequestParts<S> for ValidId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        check_id(&id)?;
        Ok(ValidId(id))
    }
}

fn check_id(id: &str) -> Result<(), ApiError> {
    const MAX_ID_LEN: usize = 128;
    if id.trim().is_empty() || id.len() > MAX_ID_LEN || id.contains('/') {
        return Err(ApiError::validation(format!("invalid identifier '{id}'")));
    }
    Ok(())
}
