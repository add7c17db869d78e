//! Session lifecycle and the in-memory session table
//!
//! A [`Session`] is one logical client conversation: exactly one
//! [`ServerTransport`] plus the most recently validated bearer credential.
//! Sessions move through `Pending -> Active -> Closed`:
//!
//! - **Pending**: transport constructed, no session id assigned yet; the
//!   session is not in the table.
//! - **Active**: an id has been assigned via [`SessionTable::activate`];
//!   the entry is registered and carries a non-empty bound credential.
//! - **Closed**: the entry has been removed; no further operations are
//!   valid against the id. Closed sessions leave no tombstone.
//!
//! The [`SessionTable`] is the only shared mutable state in the bridge.
//! Every mutation goes through one `RwLock`-guarded map, which makes
//! `create`/`activate`/`rebind`/`close` atomic with respect to concurrent
//! requests racing on the same session id: two racers can never both win
//! an activation, and the loser observes the winner's Active entry.
//!
//! Lifecycle transitions are explicit method calls returning `Result`s, so
//! the state machine is directly testable without simulating transport
//! event emission.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{BridgeError, Result};
use crate::mcp::transport::ServerTransport;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport constructed, no id assigned, not in the table.
    Pending,
    /// Registered in the table with an id and a bound credential.
    Active,
    /// Removed from the table; the id is dead.
    Closed,
}

/// A session that has been created but not yet activated.
///
/// Produced by [`SessionTable::create`]; consumed by
/// [`SessionTable::activate`].
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    transport: Arc<ServerTransport>,
}

impl Session {
    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The transport exclusively owned by this session.
    pub fn transport(&self) -> Arc<ServerTransport> {
        Arc::clone(&self.transport)
    }
}

/// Snapshot of an Active table entry returned by [`SessionTable::lookup`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    /// The session's transport. One transport per session, never shared
    /// across sessions, never migrated.
    pub transport: Arc<ServerTransport>,
    /// The credential bound at lookup time.
    pub credential: String,
}

/// One Active entry in the table.
#[derive(Debug)]
struct SessionEntry {
    transport: Arc<ServerTransport>,
    credential: String,
}

/// In-memory mapping from session id to live session state.
///
/// Cheap to clone; clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct SessionTable {
    inner: Arc<RwLock<HashMap<String, SessionEntry>>>,
}

impl SessionTable {
    /// Construct an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new session in the Pending state.
    ///
    /// The session owns `transport` exclusively. Nothing is registered in
    /// the table until [`activate`](Self::activate) assigns an id.
    pub fn create(&self, transport: Arc<ServerTransport>) -> Session {
        Session {
            state: SessionState::Pending,
            transport,
        }
    }

    /// Transition a Pending session to Active under `session_id`.
    ///
    /// Consumes the session: once activated, the table entry is the
    /// authoritative representation.
    ///
    /// # Errors
    ///
    /// - the session is not Pending
    /// - `credential` is empty (an Active session's bound credential is
    ///   never empty)
    /// - `session_id` is already Active -- the racer that got here second
    ///   must not displace the existing entry
    pub async fn activate(
        &self,
        session: Session,
        session_id: &str,
        credential: &str,
    ) -> Result<()> {
        if session.state != SessionState::Pending {
            return Err(BridgeError::Transport(format!(
                "cannot activate session in state {:?}",
                session.state
            ))
            .into());
        }
        if credential.is_empty() {
            return Err(
                BridgeError::Transport("cannot activate with an empty credential".into()).into(),
            );
        }

        let mut map = self.inner.write().await;
        if map.contains_key(session_id) {
            return Err(BridgeError::Transport(format!(
                "session {} is already active",
                session_id
            ))
            .into());
        }

        map.insert(
            session_id.to_string(),
            SessionEntry {
                transport: session.transport,
                credential: credential.to_string(),
            },
        );
        tracing::debug!(session_id, "session activated");
        Ok(())
    }

    /// Look up an Active session by id. O(1); `None` for unknown ids.
    pub async fn lookup(&self, session_id: &str) -> Option<SessionHandle> {
        let map = self.inner.read().await;
        map.get(session_id).map(|entry| SessionHandle {
            transport: Arc::clone(&entry.transport),
            credential: entry.credential.clone(),
        })
    }

    /// Overwrite the bound credential of an Active session.
    ///
    /// Used when a later request on an existing session carries a
    /// (possibly refreshed) credential. Rebinds apply in arrival order for
    /// the session.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnknownSession`] if the id is not Active,
    /// and a transport fault for an empty credential.
    pub async fn rebind(&self, session_id: &str, credential: &str) -> Result<()> {
        if credential.is_empty() {
            return Err(
                BridgeError::Transport("cannot rebind an empty credential".into()).into(),
            );
        }

        let mut map = self.inner.write().await;
        match map.get_mut(session_id) {
            Some(entry) => {
                entry.credential = credential.to_string();
                Ok(())
            }
            None => Err(BridgeError::UnknownSession(session_id.to_string()).into()),
        }
    }

    /// Close a session, releasing its entry and credential copy.
    ///
    /// Idempotent: closing an unknown or already-closed id is a no-op.
    pub async fn close(&self, session_id: &str) {
        let mut map = self.inner.write().await;
        if map.remove(session_id).is_some() {
            tracing::debug!(session_id, "session closed");
        }
    }

    /// Number of Active sessions.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether the table holds no Active sessions.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::fake::FakeIdentityService;
    use crate::mcp::transport::ServerTransport;

    fn make_transport() -> Arc<ServerTransport> {
        Arc::new(ServerTransport::new(Arc::new(FakeIdentityService::new())))
    }

    /// A freshly created session is Pending and not in the table.
    #[tokio::test]
    async fn test_create_is_pending_and_unregistered() {
        let table = SessionTable::new();
        let session = table.create(make_transport());

        assert_eq!(session.state(), SessionState::Pending);
        assert!(table.is_empty().await);
    }

    /// Activation registers the entry with its bound credential.
    #[tokio::test]
    async fn test_activate_registers_entry() {
        let table = SessionTable::new();
        let session = table.create(make_transport());

        table.activate(session, "s-1", "tok").await.unwrap();

        let handle = table.lookup("s-1").await.expect("active entry");
        assert_eq!(handle.credential, "tok");
        assert_eq!(table.len().await, 1);
    }

    /// Activating with an empty credential violates the Active invariant.
    #[tokio::test]
    async fn test_activate_rejects_empty_credential() {
        let table = SessionTable::new();
        let session = table.create(make_transport());

        assert!(table.activate(session, "s-1", "").await.is_err());
        assert!(table.is_empty().await);
    }

    /// The second activation for the same id loses and does not displace
    /// the first entry.
    #[tokio::test]
    async fn test_activate_same_id_second_loses() {
        let table = SessionTable::new();
        let first = table.create(make_transport());
        let second = table.create(make_transport());

        table.activate(first, "s-1", "tok-a").await.unwrap();
        assert!(table.activate(second, "s-1", "tok-b").await.is_err());

        let handle = table.lookup("s-1").await.unwrap();
        assert_eq!(handle.credential, "tok-a");
        assert_eq!(table.len().await, 1);
    }

    /// Rebind overwrites the credential of an Active session.
    #[tokio::test]
    async fn test_rebind_overwrites_credential() {
        let table = SessionTable::new();
        let session = table.create(make_transport());
        table.activate(session, "s-1", "old").await.unwrap();

        table.rebind("s-1", "new").await.unwrap();

        let handle = table.lookup("s-1").await.unwrap();
        assert_eq!(handle.credential, "new");
    }

    /// Rebind against an unknown id is an UnknownSession error.
    #[tokio::test]
    async fn test_rebind_unknown_session() {
        let table = SessionTable::new();
        let err = table.rebind("nope", "tok").await.unwrap_err();
        let bridge_err = err.downcast_ref::<BridgeError>().expect("BridgeError");
        assert!(matches!(bridge_err, BridgeError::UnknownSession(_)));
    }

    /// Close removes the entry; closing twice or closing an unknown id is
    /// a silent no-op.
    #[tokio::test]
    async fn test_close_is_idempotent() {
        let table = SessionTable::new();
        let session = table.create(make_transport());
        table.activate(session, "s-1", "tok").await.unwrap();

        table.close("s-1").await;
        assert!(table.lookup("s-1").await.is_none());

        // No tombstone, no panic.
        table.close("s-1").await;
        table.close("never-existed").await;
        assert!(table.is_empty().await);
    }

    /// Concurrent activations under distinct ids both land; nothing is
    /// merged or lost.
    #[tokio::test]
    async fn test_concurrent_distinct_creates_both_land() {
        let table = SessionTable::new();

        let t1 = {
            let table = table.clone();
            let session = table.create(make_transport());
            tokio::spawn(async move { table.activate(session, "s-a", "tok-a").await })
        };
        let t2 = {
            let table = table.clone();
            let session = table.create(make_transport());
            tokio::spawn(async move { table.activate(session, "s-b", "tok-b").await })
        };

        t1.await.unwrap().unwrap();
        t2.await.unwrap().unwrap();

        assert_eq!(table.len().await, 2);
        assert!(table.lookup("s-a").await.is_some());
        assert!(table.lookup("s-b").await.is_some());
    }

    /// Concurrent activations racing on the same id: exactly one wins.
    #[tokio::test]
    async fn test_concurrent_same_id_exactly_one_wins() {
        let table = SessionTable::new();

        let mut handles = Vec::new();
        for i in 0..8 {
            let table = table.clone();
            let session = table.create(make_transport());
            let credential = format!("tok-{}", i);
            handles.push(tokio::spawn(async move {
                table.activate(session, "contested", &credential).await
            }));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                wins += 1;
            }
        }

        assert_eq!(wins, 1);
        assert_eq!(table.len().await, 1);
    }
}
