//! Downstream identity service abstraction
//!
//! This module defines the [`IdentityService`] trait, the seam between the
//! bridge and the downstream identity API. The bridge uses it for two
//! things:
//!
//! - credential validation -- `validate` confirms a bearer credential is
//!   currently accepted downstream; any failure maps to `false`, and
//!   results are never cached (tokens can expire mid-session, so every
//!   request re-proves its credential)
//! - the `get-current-user` tool -- `who_am_i` exchanges the session's
//!   bound credential for the caller's identity attributes
//!
//! The production implementation lives in [`http::HttpIdentityClient`]. A
//! [`fake::FakeIdentityService`] is provided for tests (cfg(test) only).

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Identity attributes returned by the downstream service.
///
/// Field names are `camelCase` on the wire, matching the downstream API's
/// JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Stable unique identifier of the user.
    pub user_id: String,
    /// Login name.
    pub username: String,
    /// Primary email address.
    pub email: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Identifier of the organization the user belongs to.
    pub organization_id: String,
}

/// Abstraction over the downstream identity API.
///
/// Implementations MUST be stateless with respect to credentials: every
/// call performs a fresh round trip, and nothing about a credential is
/// retained between calls.
#[async_trait::async_trait]
pub trait IdentityService: Send + Sync + std::fmt::Debug {
    /// Exchange a bearer credential for the caller's identity attributes.
    ///
    /// # Arguments
    ///
    /// * `credential` - The raw bearer token, without the `"Bearer "`
    ///   prefix.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::BridgeError::Unauthenticated`] when the
    /// downstream service rejects the credential, and
    /// [`crate::error::BridgeError::Downstream`] for any other failure
    /// (network fault, non-2xx status, malformed body).
    async fn who_am_i(&self, credential: &str) -> Result<UserRecord>;

    /// Confirm that `credential` is currently accepted downstream.
    ///
    /// Never errors: any downstream failure is reported as `false`.
    /// Performs exactly one round trip; results MUST NOT be cached.
    async fn validate(&self, credential: &str) -> bool {
        self.who_am_i(credential).await.is_ok()
    }
}

pub mod http;

#[cfg(test)]
pub mod fake;
