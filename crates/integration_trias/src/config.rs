//! TRIAS service configuration

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for a TRIAS endpoint
#[derive(Clone, Serialize, Deserialize)]
pub struct TriasConfig {
    /// Full URL of the TRIAS endpoint; every request is POSTed here
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Requestor reference (access token) issued by the operator
    #[serde(default, skip_serializing)]
    pub requestor_ref: Option<SecretString>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Default number of results per request
    #[serde(default = "default_max_results")]
    pub max_results: u8,

    /// How long successful deliveries are reused, in minutes; 0 turns the cache off
    #[serde(default = "default_cache_ttl_minutes")]
    pub cache_ttl_minutes: u32,
}

impl std::fmt::Debug for TriasConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriasConfig")
            .field("base_url", &self.base_url)
            .field(
                "requestor_ref",
                &if self.requestor_ref.is_some() {
                    Some("[REDACTED]")
                } else {
                    None
                },
            )
            .field("timeout_secs", &self.timeout_secs)
            .field("max_results", &self.max_results)
            .field("cache_ttl_minutes", &self.cache_ttl_minutes)
            .finish()
    }
}

/// Upper bound for `max_results`
const MAX_RESULTS_LIMIT: u8 = 50;

fn default_base_url() -> String {
    "http://localhost:8080/trias".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_max_results() -> u8 {
    10
}

const fn default_cache_ttl_minutes() -> u32 {
    5
}

impl Default for TriasConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            requestor_ref: None,
            timeout_secs: default_timeout_secs(),
            max_results: default_max_results(),
            cache_ttl_minutes: default_cache_ttl_minutes(),
        }
    }
}

impl TriasConfig {
    /// Short timeout, few results and no cache
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            timeout_secs: 5,
            max_results: 3,
            cache_ttl_minutes: 0,
            ..Default::default()
        }
    }

    /// Whether responses are cached at all
    #[must_use]
    pub const fn caching_enabled(&self) -> bool {
        self.cache_ttl_minutes > 0
    }

    /// Check the endpoint URL and the numeric limits
    ///
    /// # Errors
    ///
    /// Returns a message naming the first offending field.
    pub fn validate(&self) -> Result<(), String> {
        let url = Url::parse(&self.base_url).map_err(|e| format!("base_url is invalid: {e}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("base_url must be http(s), got {}", url.scheme()));
        }

        if self.timeout_secs == 0 {
            return Err("timeout_secs must be at least 1".to_string());
        }

        if !(1..=MAX_RESULTS_LIMIT).contains(&self.max_results) {
            return Err(format!(
                "max_results must be between 1 and {MAX_RESULTS_LIMIT}, got {}",
                self.max_results
            ));
        }

        Ok(())
    }
}
