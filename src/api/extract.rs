//! Request extractors that reject with the registry's error envelope.
//!
//! Axum's stock `Json`, `Query` and `Path` rejections answer in plain text;
//! these wrappers turn every failure into a 422 [`AppError::Validation`].

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Json, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::models::{FieldError, Page, PageParams, Validate};

/// JSON body that has been parsed and passed [`Validate`].
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                AppError::validation(vec![FieldError::new("body", rejection.body_text())])
            })?;

        let errors = value.validate();
        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }
        Ok(Self(value))
    }
}

/// `skip`/`limit` query parameters, range-checked.
#[derive(Debug, Clone, Copy)]
pub struct Pagination(pub Page);

#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<PageParams>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                AppError::validation(vec![FieldError::new("query", rejection.body_text())])
            })?;

        params.into_page().map(Self).map_err(AppError::validation)
    }
}

/// Path parameters, e.g. a malformed fund id.
#[derive(Debug, Clone)]
pub struct ValidPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                AppError::validation(vec![FieldError::new("path", rejection.body_text())])
            })?;
        Ok(Self(value))
    }
}
