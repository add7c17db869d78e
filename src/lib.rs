//! MCP identity bridge library
//!
//! This library terminates MCP over streamable HTTP from an external
//! caller, multiplexes it across concurrent client sessions, and forwards
//! each caller's bearer credential to a downstream identity API on a
//! per-request basis.
//!
//! # Architecture
//!
//! - `server`: HTTP surface -- request authentication, session
//!   resolution, and frame multiplexing
//! - `mcp`: protocol types, the session table, and the per-session
//!   transport engine
//! - `identity`: the downstream identity collaborator behind the
//!   [`identity::IdentityService`] trait
//! - `config`: configuration loading and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! Sessions live in process memory only; they are cheap to establish and
//! are lost on restart by design.

pub mod cli;
pub mod config;
pub mod error;
pub mod identity;
pub mod mcp;
pub mod server;

// Re-export commonly used types
pub use config::Config;
pub use error::{BridgeError, Result};
pub use identity::{IdentityService, UserRecord};
pub use mcp::{ServerTransport, SessionState, SessionTable};
pub use server::{build_router, AppState, SESSION_ID_HEADER};
