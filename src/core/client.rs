//! Service client: URL construction plus the executor, with typed decoding.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::http::{self, DEFAULT_TIMEOUT_MS, PREVIEW_TIMEOUT_MS, RequestOptions};
use crate::core::models::{FeatureCollection, LayerDetail, QueryOptions, ServiceDescriptor};
use crate::core::url::{layer_url, preview_query_url, strip_query, with_forced_format};
use crate::error::RequestError;

/// A fully built request: final URL and the timeout it will run with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub url: String,
    pub timeout_ms: u64,
}

impl PreparedRequest {
    #[must_use]
    pub fn options(&self) -> RequestOptions {
        RequestOptions::new(self.timeout_ms)
    }
}

/// Client for one or more map services.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: Client,
    timeout_ms: u64,
}

impl ServiceClient {
    /// Create a client with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, RequestError> {
        Ok(Self::with_client(http::build_client()?))
    }

    /// Wrap an existing HTTP client.
    #[must_use]
    pub const fn with_client(http: Client) -> Self {
        Self {
            http,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Set the timeout for service and layer requests.
    ///
    /// Preview queries keep their fixed timeout.
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = RequestOptions::new(timeout_ms).timeout_ms();
        self
    }

    #[must_use]
    pub const fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Request for a service description.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` when `url` is not an absolute http(s) URL.
    pub fn prepare_service(&self, url: &str) -> Result<PreparedRequest, RequestError> {
        Ok(PreparedRequest {
            url: with_forced_format(url)?,
            timeout_ms: self.timeout_ms,
        })
    }

    /// Request for a layer or table description.
    ///
    /// Any query on `service_url` is dropped before the layer id is appended.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` when `service_url` is not an absolute http(s) URL.
    pub fn prepare_layer(
        &self,
        service_url: &str,
        layer_id: i64,
    ) -> Result<PreparedRequest, RequestError> {
        Ok(PreparedRequest {
            url: with_forced_format(&layer_url(&strip_query(service_url), layer_id))?,
            timeout_ms: self.timeout_ms,
        })
    }

    /// Request for a record preview. Always uses [`PREVIEW_TIMEOUT_MS`].
    ///
    /// Any query on `service_url` is dropped, as for [`Self::prepare_layer`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` when `service_url` is not an absolute http(s) URL.
    pub fn prepare_preview(
        &self,
        service_url: &str,
        layer_id: i64,
        options: &QueryOptions,
    ) -> Result<PreparedRequest, RequestError> {
        Ok(PreparedRequest {
            url: preview_query_url(&strip_query(service_url), layer_id, options)?,
            timeout_ms: PREVIEW_TIMEOUT_MS,
        })
    }

    /// Raw JSON fetch through the executor.
    ///
    /// # Errors
    ///
    /// Returns the executor's normalized error.
    pub async fn get_json(&self, url: &str, options: RequestOptions) -> Result<Value, RequestError> {
        http::get_json(&self.http, url, options).await
    }

    /// Fetch a service description.
    ///
    /// # Errors
    ///
    /// Returns the executor's normalized error, or `Protocol` when the body
    /// does not match the service schema.
    pub async fn fetch_service(&self, url: &str) -> Result<ServiceDescriptor, RequestError> {
        let request = self.prepare_service(url)?;
        self.fetch(&request).await
    }

    /// Fetch a layer or table description.
    ///
    /// # Errors
    ///
    /// Returns the executor's normalized error, or `Protocol` when the body
    /// does not match the layer schema.
    pub async fn fetch_layer(
        &self,
        service_url: &str,
        layer_id: i64,
    ) -> Result<LayerDetail, RequestError> {
        let request = self.prepare_layer(service_url, layer_id)?;
        self.fetch(&request).await
    }

    /// Fetch a page of records for a layer.
    ///
    /// # Errors
    ///
    /// Returns the executor's normalized error, or `Protocol` when the body
    /// does not match the query-result schema.
    pub async fn fetch_layer_preview(
        &self,
        service_url: &str,
        layer_id: i64,
        options: &QueryOptions,
    ) -> Result<FeatureCollection, RequestError> {
        let request = self.prepare_preview(service_url, layer_id, options)?;
        self.fetch(&request).await
    }

    /// Execute a prepared request and decode the body.
    ///
    /// # Errors
    ///
    /// Returns the executor's normalized error, or `Protocol` on a schema mismatch.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        request: &PreparedRequest,
    ) -> Result<T, RequestError> {
        let value = self.get_json(&request.url, request.options()).await?;
        decode(value)
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, RequestError> {
    serde_json::from_value(value).map_err(|e| {
        tracing::debug!(error = %e, "Response did not match expected schema");
        RequestError::Protocol {
            detail: e.to_string(),
        }
    })
}
