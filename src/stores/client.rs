//! HTTP client for the JSON API, used by the view-state stores.

use crate::errors::{Error, Result};
use reqwest::{Method, RequestBuilder, Response};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Thin wrapper over `reqwest` that speaks the API's verb contract.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for the server at `base_url` (e.g. `http://127.0.0.1:3000`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// `GET path` with optional query parameters.
    #[instrument(skip(self, query))]
    pub async fn list<T, Q>(&self, path: &str, query: &Q) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self.request(Method::GET, path).query(query).send().await?;
        decode(response).await
    }

    /// `GET path/{id}`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, id: Uuid) -> Result<T> {
        let response = self
            .request(Method::GET, &format!("{path}/{id}"))
            .send()
            .await?;
        decode(response).await
    }

    /// `POST path` with a JSON body.
    #[instrument(skip(self, body))]
    pub async fn create<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.request(Method::POST, path).json(body).send().await?;
        decode(response).await
    }

    /// `PATCH path/{id}` with the changed fields.
    #[instrument(skip(self, changes))]
    pub async fn update<T, B>(&self, path: &str, id: Uuid, changes: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .request(Method::PATCH, &format!("{path}/{id}"))
            .json(changes)
            .send()
            .await?;
        decode(response).await
    }

    /// `DELETE path/{id}`.
    #[instrument(skip(self))]
    pub async fn delete(&self, path: &str, id: Uuid) -> Result<()> {
        let response = self
            .request(Method::DELETE, &format!("{path}/{id}"))
            .send()
            .await?;
        decode::<Value>(response).await.map(|_| ())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response.json::<T>().await.map_err(Into::into);
    }

    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = body
        .pointer("/error/message")
        .and_then(Value::as_str)
        .map_or_else(|| status.to_string(), ToString::to_string);
    debug!(status = status.as_u16(), %message, "API call failed");
    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}
