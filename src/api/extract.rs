//! Request extractors that report failures as [`Error::Validation`].

use crate::{errors::Error, validation::from_json};
use axum::{
    Json,
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::collections::HashMap;
use uuid::Uuid;

/// Record id taken from the `/{id}` path segment or the `?id=` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId(pub Uuid);

#[derive(Debug, Default, Deserialize)]
struct IdParam {
    id: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let from_path = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .ok()
            .and_then(|Path(params)| params.get("id").cloned());
        let raw = match from_path {
            Some(raw) => Some(raw),
            None => Query::<IdParam>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(p)| p.id),
        };

        let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
            return Err(Error::Validation {
                message: "Missing record id".to_string(),
                details: json!({ "id": "is required" }),
            });
        };
        Uuid::parse_str(raw.trim()).map(Self).map_err(|_| Error::Validation {
            message: "Malformed record id".to_string(),
            details: json!({ "id": format!("`{raw}` is not a valid id") }),
        })
    }
}

/// JSON body deserialized into `T`; shape errors become 400 with details.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| Error::Validation {
                message: "Invalid request body".to_string(),
                details: json!({ "body": rejection.body_text() }),
            })?;
        from_json(value).map(Self)
    }
}

/// Query string deserialized into `T`; unknown parameters are ignored.
#[derive(Debug, Clone)]
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::try_from_uri(&parts.uri)
            .map(|Query(v)| Self(v))
            .map_err(|rejection| Error::Validation {
                message: "Invalid query parameters".to_string(),
                details: json!({ "query": rejection.body_text() }),
            })
    }
}
