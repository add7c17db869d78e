//! In-process fake identity service for unit tests
//!
//! [`FakeIdentityService`] replaces the real downstream identity API in
//! tests. It holds a fixed set of accepted credentials, each mapped to a
//! [`UserRecord`], and counts the calls it receives so tests can assert
//! that the bridge re-validates on every request instead of caching.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{BridgeError, Result};
use crate::identity::{IdentityService, UserRecord};

/// Fake [`IdentityService`] backed by an in-memory credential map.
#[derive(Debug, Default)]
pub struct FakeIdentityService {
    /// Accepted credentials and the identity each resolves to.
    accepted: Mutex<HashMap<String, UserRecord>>,
    /// Number of `who_am_i` round trips performed.
    calls: AtomicUsize,
}

impl FakeIdentityService {
    /// Construct an empty fake: every credential is rejected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `credential`, resolving it to `user`.
    pub fn accept(&self, credential: &str, user: UserRecord) {
        self.accepted
            .lock()
            .unwrap()
            .insert(credential.to_string(), user);
    }

    /// Stop accepting `credential` (simulates mid-session revocation).
    pub fn revoke(&self, credential: &str) {
        self.accepted.lock().unwrap().remove(credential);
    }

    /// Number of downstream round trips performed so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// A ready-made user record for tests.
    pub fn sample_user() -> UserRecord {
        UserRecord {
            user_id: "u-1001".to_string(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            display_name: "Ada Lovelace".to_string(),
            organization_id: "org-42".to_string(),
        }
    }
}

#[async_trait::async_trait]
impl IdentityService for FakeIdentityService {
    async fn who_am_i(&self, credential: &str) -> Result<UserRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.accepted
            .lock()
            .unwrap()
            .get(credential)
            .cloned()
            .ok_or_else(|| {
                BridgeError::Unauthenticated("identity service rejected credential".to_string())
                    .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepted credentials resolve; unknown ones are rejected.
    #[tokio::test]
    async fn test_accept_and_reject() {
        let fake = FakeIdentityService::new();
        fake.accept("good", FakeIdentityService::sample_user());

        assert!(fake.who_am_i("good").await.is_ok());
        assert!(fake.who_am_i("bad").await.is_err());
        assert_eq!(fake.call_count(), 2);
    }

    /// Revocation takes effect on the next call.
    #[tokio::test]
    async fn test_revoke_takes_effect() {
        let fake = FakeIdentityService::new();
        fake.accept("tok", FakeIdentityService::sample_user());
        assert!(fake.validate("tok").await);

        fake.revoke("tok");
        assert!(!fake.validate("tok").await);
    }
}
