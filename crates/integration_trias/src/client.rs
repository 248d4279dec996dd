//! TRIAS HTTP client
//!
//! POSTs request envelopes to a single TRIAS endpoint and decodes the XML
//! deliveries with [`decode`]. Successful deliveries are cached by request
//! payload, so repeated searches within the TTL skip the network.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use moka::future::Cache;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use tracing::{debug, instrument, warn};

use crate::config::TriasConfig;
use crate::decoder::{ResponseSchema, decode};
use crate::error::TriasError;
use crate::models::{LocationInformationResponse, StopEventResponse};
use crate::request::{LocationInformationRequest, RequestPayload, StopEventRequest, envelope};

/// Trait for TRIAS service clients
#[async_trait]
pub trait TriasClient: Send + Sync {
    /// Search locations by name or around a coordinate
    async fn search_locations(
        &self,
        request: &LocationInformationRequest,
    ) -> Result<LocationInformationResponse, TriasError>;

    /// List departures at a stop point
    async fn stop_events(&self, request: &StopEventRequest)
    -> Result<StopEventResponse, TriasError>;

    /// Check if the TRIAS service is reachable
    async fn is_healthy(&self) -> bool;
}

/// TRIAS client over HTTP
#[derive(Debug)]
pub struct HttpTriasClient {
    client: Client,
    config: TriasConfig,
    cache: Option<Cache<String, Bytes>>,
}

impl HttpTriasClient {
    /// Create a new TRIAS client
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new(config: &TriasConfig) -> Result<Self, TriasError> {
        config.validate().map_err(TriasError::ConfigurationError)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("trias-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TriasError::ConnectionFailed(e.to_string()))?;

        let cache = config.caching_enabled().then(|| {
            Cache::builder()
                .max_capacity(256)
                .time_to_live(Duration::from_secs(u64::from(config.cache_ttl_minutes) * 60))
                .build()
        });

        Ok(Self {
            client,
            config: config.clone(),
            cache,
        })
    }

    /// Send one payload and decode the delivery into `R`
    async fn execute<R: ResponseSchema>(&self, payload: String) -> Result<R, TriasError> {
        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(&payload).await {
                debug!("TRIAS cache hit");
                return Ok(decode(&body)?);
            }
        }

        let body = self.post(&payload).await?;
        let response: R = decode(&body)?;

        if !response.header().status {
            warn!(producer = %response.header().reference, "TRIAS service reported status false");
            return Err(TriasError::ServiceRejected {
                producer: response.header().reference.clone(),
            });
        }

        if let Some(cache) = &self.cache {
            cache.insert(payload, body).await;
        }

        Ok(response)
    }

    /// POST a payload wrapped in a fresh envelope and return the raw body
    async fn post(&self, payload: &str) -> Result<Bytes, TriasError> {
        let requestor_ref = self
            .config
            .requestor_ref
            .as_ref()
            .map(|r| r.expose_secret().to_string());
        let body = envelope(payload, Utc::now(), requestor_ref.as_deref());

        let response = self
            .client
            .post(&self.config.base_url)
            .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TriasError::Timeout {
                        timeout_secs: self.config.timeout_secs,
                    }
                } else {
                    TriasError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TriasError::RateLimitExceeded {
                retry_after_secs: response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok()),
            });
        }

        if status.is_server_error() {
            return Err(TriasError::ServiceUnavailable(format!("HTTP {status}")));
        }

        if !status.is_success() {
            return Err(TriasError::RequestFailed(format!("HTTP {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TriasError::ConnectionFailed(e.to_string()))?;

        debug!(bytes = body.len(), "TRIAS response received");
        Ok(body)
    }
}

#[async_trait]
impl TriasClient for HttpTriasClient {
    #[instrument(skip(self), fields(max_results = request.max_results))]
    async fn search_locations(
        &self,
        request: &LocationInformationRequest,
    ) -> Result<LocationInformationResponse, TriasError> {
        let response: LocationInformationResponse = self.execute(request.payload_xml()).await?;

        if response.results.is_empty() {
            warn!("No locations found");
        }

        debug!(count = response.results.len(), "Locations found");
        Ok(response)
    }

    #[instrument(skip(self), fields(stop = %request.stop_point_ref))]
    async fn stop_events(
        &self,
        request: &StopEventRequest,
    ) -> Result<StopEventResponse, TriasError> {
        if request.stop_point_ref.trim().is_empty() {
            return Err(TriasError::InvalidLocation(
                "Stop point reference must not be empty".to_string(),
            ));
        }

        let response: StopEventResponse = self.execute(request.payload_xml()).await?;
        debug!(count = response.results.len(), "Stop events found");
        Ok(response)
    }

    async fn is_healthy(&self) -> bool {
        let probe = LocationInformationRequest::by_name("test").with_max_results(1);
        self.post(&probe.payload_xml()).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = TriasConfig {
            base_url: String::new(),
            ..TriasConfig::for_testing()
        };
        assert!(matches!(
            HttpTriasClient::new(&config),
            Err(TriasError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_cache_follows_config() {
        let client = HttpTriasClient::new(&TriasConfig::for_testing()).unwrap();
        assert!(client.cache.is_none());

        let client = HttpTriasClient::new(&TriasConfig::default()).unwrap();
        assert!(client.cache.is_some());
    }

    #[tokio::test]
    async fn test_stop_events_empty_ref() {
        let client = HttpTriasClient::new(&TriasConfig::for_testing()).unwrap();
        let result = client.stop_events(&StopEventRequest::new("  ")).await;
        assert!(matches!(result, Err(TriasError::InvalidLocation(_))));
    }
}
