//! Per-session MCP protocol engine
//!
//! [`ServerTransport`] is the server end of the streamable HTTP transport:
//! one instance per session, fed one inbound JSON-RPC frame at a time by
//! the multiplexer in `crate::server`. It owns the protocol handshake
//! (version negotiation on `initialize`) and the single tool surface
//! (`get-current-user`), delegating the actual identity call to the
//! session's [`IdentityService`] with the credential the caller bound to
//! the session.
//!
//! # Handled methods
//!
//! - `initialize` -- negotiates the protocol version and returns server
//!   info with the `tools` capability
//! - `notifications/initialized` -- acknowledged silently (no response)
//! - `ping` -- returns an empty result object
//! - `tools/list` -- returns the single `get-current-user` tool
//! - `tools/call` with `name: "get-current-user"` -- calls the downstream
//!   identity service with the session's bound credential
//! - everything else -- JSON-RPC `-32601 Method not found`
//!
//! Frames of a session are handled strictly in arrival order: the engine
//! state sits behind a `Mutex` that is held for the whole of
//! [`ServerTransport::handle_frame`].
//!
//! A tool-level downstream failure (identity API unreachable after the
//! request already authenticated) is reported inside the `tools/call`
//! result with `isError: true`; it is never an HTTP-level failure and
//! never closes the session.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::Result;
use crate::identity::IdentityService;
use crate::mcp::types::{
    CallToolParams, CallToolResponse, Implementation, InitializeParams, InitializeResponse,
    JsonRpcRequest, JsonRpcResponse, ListToolsResponse, McpTool, ServerCapabilities,
    ToolResponseContent, ERROR_INVALID_PARAMS, ERROR_METHOD_NOT_FOUND, LATEST_PROTOCOL_VERSION,
    METHOD_INITIALIZE, METHOD_INITIALIZED, METHOD_PING, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST,
    SUPPORTED_PROTOCOL_VERSIONS,
};

/// Name of the single tool the bridge exposes.
pub const TOOL_GET_CURRENT_USER: &str = "get-current-user";

/// Mutable handshake state of one session's protocol engine.
#[derive(Debug, Default)]
struct EngineState {
    /// Protocol version negotiated on `initialize`.
    protocol_version: Option<String>,
    /// Set when the client has sent `notifications/initialized`.
    initialized: bool,
}

/// The server end of one session's streamable HTTP transport.
#[derive(Debug)]
pub struct ServerTransport {
    /// Downstream identity collaborator used by `tools/call`.
    identity: Arc<dyn IdentityService>,
    /// Handshake state; the lock also serializes frame handling.
    state: Mutex<EngineState>,
}

impl ServerTransport {
    /// Construct a transport delegating identity calls to `identity`.
    pub fn new(identity: Arc<dyn IdentityService>) -> Self {
        Self {
            identity,
            state: Mutex::new(EngineState::default()),
        }
    }

    /// The protocol version negotiated for this session, if any.
    pub async fn negotiated_version(&self) -> Option<String> {
        self.state.lock().await.protocol_version.clone()
    }

    /// Whether the client has completed the initialize handshake.
    pub async fn is_initialized(&self) -> bool {
        self.state.lock().await.initialized
    }

    /// Feed one inbound frame to the transport.
    ///
    /// # Arguments
    ///
    /// * `frame` - The parsed JSON-RPC request.
    /// * `credential` - The session's currently bound bearer credential,
    ///   passed explicitly so no request can observe another request's
    ///   token.
    ///
    /// # Returns
    ///
    /// `Ok(Some(response))` for requests, `Ok(None)` for notifications.
    ///
    /// # Errors
    ///
    /// Only internal faults (result serialization) error; per-frame
    /// protocol problems are reported as JSON-RPC error responses so a
    /// transient bad frame never kills the session.
    pub async fn handle_frame(
        &self,
        frame: JsonRpcRequest,
        credential: &str,
    ) -> Result<Option<JsonRpcResponse>> {
        let mut state = self.state.lock().await;

        if frame.is_notification() {
            if frame.method == METHOD_INITIALIZED {
                state.initialized = true;
                tracing::debug!("client completed the initialize handshake");
            }
            // All other notifications are acknowledged silently.
            return Ok(None);
        }

        let id = frame.id.clone();

        let response = match frame.method.as_str() {
            METHOD_INITIALIZE => self.handle_initialize(&mut state, &frame)?,
            METHOD_PING => JsonRpcResponse::success(id, serde_json::json!({})),
            METHOD_TOOLS_LIST => {
                let result = ListToolsResponse {
                    tools: vec![current_user_tool()],
                    next_cursor: None,
                };
                JsonRpcResponse::success(id, serde_json::to_value(result)?)
            }
            METHOD_TOOLS_CALL => self.handle_tools_call(&frame, credential).await?,
            other => JsonRpcResponse::failure(
                id,
                ERROR_METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            ),
        };

        Ok(Some(response))
    }

    /// Negotiate the protocol version and describe the server.
    ///
    /// A version the server supports is echoed back; anything else is
    /// answered with the latest supported version, per the negotiation
    /// rules of the spec.
    fn handle_initialize(
        &self,
        state: &mut EngineState,
        frame: &JsonRpcRequest,
    ) -> Result<JsonRpcResponse> {
        let requested = frame
            .params
            .clone()
            .and_then(|p| serde_json::from_value::<InitializeParams>(p).ok())
            .map(|p| p.protocol_version);

        let version = match requested {
            Some(v) if SUPPORTED_PROTOCOL_VERSIONS.contains(&v.as_str()) => v,
            _ => LATEST_PROTOCOL_VERSION.to_string(),
        };
        state.protocol_version = Some(version.clone());

        let result = InitializeResponse {
            protocol_version: version,
            capabilities: ServerCapabilities {
                tools: Some(serde_json::json!({})),
            },
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: None,
        };

        Ok(JsonRpcResponse::success(
            frame.id.clone(),
            serde_json::to_value(result)?,
        ))
    }

    /// Dispatch a `tools/call` frame.
    async fn handle_tools_call(
        &self,
        frame: &JsonRpcRequest,
        credential: &str,
    ) -> Result<JsonRpcResponse> {
        let id = frame.id.clone();

        let params = match frame
            .params
            .clone()
            .map(serde_json::from_value::<CallToolParams>)
        {
            Some(Ok(p)) => p,
            _ => {
                return Ok(JsonRpcResponse::failure(
                    id,
                    ERROR_INVALID_PARAMS,
                    "tools/call requires a tool name",
                ))
            }
        };

        if params.name != TOOL_GET_CURRENT_USER {
            return Ok(JsonRpcResponse::failure(
                id,
                ERROR_INVALID_PARAMS,
                format!("Unknown tool: {}", params.name),
            ));
        }

        let result = match self.identity.who_am_i(credential).await {
            Ok(user) => {
                let payload = serde_json::json!({
                    "success": true,
                    "user": {
                        "id": user.user_id,
                        "username": user.username,
                        "email": user.email,
                        "displayName": user.display_name,
                        "organizationId": user.organization_id,
                    },
                });
                CallToolResponse {
                    content: vec![ToolResponseContent::Text {
                        text: serde_json::to_string(&payload)?,
                    }],
                    is_error: None,
                }
            }
            Err(e) => {
                // Auth already succeeded for this request, so a failure
                // here is a downstream fault reported inside the tool
                // result, not an HTTP failure.
                tracing::warn!(error = %e, "identity call failed during tools/call");
                let payload = serde_json::json!({
                    "success": false,
                    "error": e.to_string(),
                });
                CallToolResponse {
                    content: vec![ToolResponseContent::Text {
                        text: serde_json::to_string(&payload)?,
                    }],
                    is_error: Some(true),
                }
            }
        };

        Ok(JsonRpcResponse::success(id, serde_json::to_value(result)?))
    }
}

/// Definition of the `get-current-user` tool.
fn current_user_tool() -> McpTool {
    McpTool {
        name: TOOL_GET_CURRENT_USER.to_string(),
        description: Some("Get the profile of the currently authenticated user".to_string()),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {},
        }),
    }
}
