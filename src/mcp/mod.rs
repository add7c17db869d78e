//! MCP (Model Context Protocol) server support for the bridge
//!
//! This module holds everything that speaks the protocol itself:
//!
//! - `types`     -- JSON-RPC 2.0 primitives and the MCP wire types the
//!   bridge serves
//! - `session`   -- the session lifecycle state machine and the in-memory
//!   session table
//! - `transport` -- the per-session protocol engine fed by the HTTP
//!   multiplexer
//!
//! The HTTP surface that authenticates requests and routes frames to
//! sessions lives in `crate::server`.

pub mod session;
pub mod transport;
pub mod types;

pub use session::{Session, SessionHandle, SessionState, SessionTable};
pub use transport::ServerTransport;
