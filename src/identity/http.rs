//! HTTP client for the downstream identity API
//!
//! [`HttpIdentityClient`] issues `GET {base}/api/v1/users/me` with the
//! caller's bearer credential and deserializes the JSON body into a
//! [`UserRecord`]. The base URL and per-request timeout come from
//! configuration; nothing about a credential outlives the call.

use std::time::Duration;

use crate::error::{BridgeError, Result};
use crate::identity::{IdentityService, UserRecord};

/// Path of the "get current user" endpoint, relative to the base URL.
const WHOAMI_PATH: &str = "api/v1/users/me";

/// Production [`IdentityService`] implementation over reqwest.
#[derive(Debug)]
pub struct HttpIdentityClient {
    /// Underlying reqwest HTTP client.
    http_client: reqwest::Client,
    /// Base URL of the downstream identity API.
    base_url: url::Url,
}

impl HttpIdentityClient {
    /// Construct a client targeting `base_url`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Root of the identity API (e.g.
    ///   `https://identity.example.com/`).
    /// * `timeout` - Per-request timeout.
    ///
    /// # Returns
    ///
    /// A fully constructed client. No network I/O is performed at
    /// construction time.
    pub fn new(base_url: url::Url, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            // SAFETY: Default reqwest client construction cannot fail
            // unless TLS initialisation fails, which is a fatal startup
            // condition on any supported platform.
            .expect("failed to build reqwest client");

        Self {
            http_client,
            base_url,
        }
    }

    /// Resolve the absolute URL of the whoami endpoint.
    fn whoami_url(&self) -> Result<url::Url> {
        self.base_url
            .join(WHOAMI_PATH)
            .map_err(|e| BridgeError::Config(format!("invalid identity base URL: {}", e)).into())
    }
}

#[async_trait::async_trait]
impl IdentityService for HttpIdentityClient {
    /// Call `GET /api/v1/users/me` with `Authorization: Bearer <credential>`.
    ///
    /// Status mapping:
    ///
    /// - `401` / `403`: the credential is rejected --
    ///   [`BridgeError::Unauthenticated`]
    /// - any other non-2xx: [`BridgeError::Downstream`]
    /// - network fault or malformed body: [`BridgeError::Downstream`]
    async fn who_am_i(&self, credential: &str) -> Result<UserRecord> {
        let url = self.whoami_url()?;

        let response = self
            .http_client
            .get(url)
            .header("Authorization", format!("Bearer {}", credential))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| BridgeError::Downstream(format!("identity request failed: {}", e)))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(BridgeError::Unauthenticated(format!(
                "identity service rejected credential (HTTP {})",
                status.as_u16()
            ))
            .into());
        }

        if !status.is_success() {
            return Err(BridgeError::Downstream(format!(
                "identity service returned HTTP {}",
                status.as_u16()
            ))
            .into());
        }

        response
            .json::<UserRecord>()
            .await
            .map_err(|e| BridgeError::Downstream(format!("malformed identity body: {}", e)).into())
    }
}
