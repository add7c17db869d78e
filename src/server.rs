//! HTTP surface of the bridge
//!
//! One endpoint, four methods:
//!
//! - `POST` -- carries one protocol frame; authenticated, resolved to a
//!   session, and fed to that session's [`ServerTransport`]
//! - `DELETE` -- explicit session termination (idempotent)
//! - `GET` -- `405`; the bridge pushes no standalone notification stream
//! - `OPTIONS` -- CORS preflight, answered by the `tower-http` CORS layer
//!
//! # Per-request order
//!
//! Authentication is the cheapest-possible rejection path and runs before
//! any session or transport work:
//!
//! 1. extract the `Authorization: Bearer` header (missing -> 401, the
//!    session table is never touched)
//! 2. re-validate the credential downstream -- on **every** request; an
//!    Active session grants no implicit trust
//! 3. resolve or create the session, bind/rebind the credential
//! 4. only then drive the transport
//!
//! Error kind -> HTTP status is mapped in exactly one place,
//! [`error_response`].

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::error::BridgeError;
use crate::identity::IdentityService;
use crate::mcp::session::{SessionHandle, SessionTable};
use crate::mcp::transport::ServerTransport;
use crate::mcp::types::{JsonRpcRequest, JsonRpcResponse, METHOD_INITIALIZE};

/// Request and response header carrying the session id.
pub const SESSION_ID_HEADER: &str = "mcp-session-id";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Downstream identity collaborator.
    pub identity: Arc<dyn IdentityService>,
    /// The only shared mutable resource in the bridge.
    pub sessions: SessionTable,
}

impl AppState {
    /// Construct state with an empty session table.
    pub fn new(identity: Arc<dyn IdentityService>) -> Self {
        Self {
            identity,
            sessions: SessionTable::new(),
        }
    }
}

/// Build the axum router serving the bridge on `endpoint`.
///
/// The CORS layer answers `OPTIONS` preflights with 200 and an empty
/// body, and stamps `Access-Control-Allow-Origin: *` on every response.
pub fn build_router(state: AppState, endpoint: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(SESSION_ID_HEADER),
        ]);

    Router::new()
        .route(
            endpoint,
            post(post_frame).delete(delete_session).get(get_not_allowed),
        )
        .layer(cors)
        .with_state(state)
}

/// `POST` handler: one inbound protocol frame.
async fn post_frame(State(state): State<AppState>, headers: HeaderMap, body: String) -> Response {
    match handle_post(&state, &headers, body).await {
        Ok(response) => response,
        Err(e) => error_response(&e),
    }
}

/// `DELETE` handler: explicit session termination.
///
/// Authenticated like every other call; closing an unknown or absent id
/// is a no-op, never an error.
async fn delete_session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let credential = match extract_bearer(&headers) {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };
    if !state.identity.validate(&credential).await {
        return error_response(&BridgeError::Unauthenticated(
            "identity service rejected credential".to_string(),
        ));
    }

    if let Some(session_id) = session_id_header(&headers) {
        state.sessions.close(&session_id).await;
    }

    StatusCode::OK.into_response()
}

/// `GET` handler: the bridge serves no standalone SSE stream.
async fn get_not_allowed() -> Response {
    StatusCode::METHOD_NOT_ALLOWED.into_response()
}

/// The authenticated POST path: session resolution and frame dispatch.
async fn handle_post(
    state: &AppState,
    headers: &HeaderMap,
    body: String,
) -> std::result::Result<Response, BridgeError> {
    // 1-2. Authenticate before any session or transport work.
    let credential = extract_bearer(headers)?;
    if !state.identity.validate(&credential).await {
        return Err(BridgeError::Unauthenticated(
            "identity service rejected credential".to_string(),
        ));
    }

    // 3. Parse the frame.
    let frame: JsonRpcRequest = serde_json::from_str(&body)
        .map_err(|e| BridgeError::Transport(format!("malformed frame: {}", e)))?;

    // 4. Resolve the session.
    match session_id_header(headers) {
        Some(session_id) => match state.sessions.lookup(&session_id).await {
            Some(handle) => {
                // Rebind before driving the transport so the frame runs
                // under the credential this request proved. A concurrent
                // close can race the lookup; surface that as an unknown
                // session rather than resurrecting the entry.
                state
                    .sessions
                    .rebind(&session_id, &credential)
                    .await
                    .map_err(|_| BridgeError::UnknownSession(session_id.clone()))?;
                drive_existing(handle, &session_id, frame, &credential).await
            }
            None if frame.method == METHOD_INITIALIZE => {
                // Stale id on an initialize frame: degrade gracefully by
                // starting a fresh session.
                open_session(state, frame, &credential).await
            }
            None => Err(BridgeError::UnknownSession(session_id)),
        },
        None if frame.method == METHOD_INITIALIZE => open_session(state, frame, &credential).await,
        None => Err(BridgeError::Transport(format!(
            "{} header required for method {}",
            SESSION_ID_HEADER, frame.method
        ))),
    }
}

/// Feed a frame to an existing Active session's transport.
async fn drive_existing(
    handle: SessionHandle,
    session_id: &str,
    frame: JsonRpcRequest,
    credential: &str,
) -> std::result::Result<Response, BridgeError> {
    let response = handle
        .transport
        .handle_frame(frame, credential)
        .await
        .map_err(|e| BridgeError::Transport(e.to_string()))?;

    Ok(frame_response(response, session_id))
}

/// Construct, drive, and activate a new session for an initialize frame.
async fn open_session(
    state: &AppState,
    frame: JsonRpcRequest,
    credential: &str,
) -> std::result::Result<Response, BridgeError> {
    let transport = Arc::new(ServerTransport::new(Arc::clone(&state.identity)));
    let session = state.sessions.create(Arc::clone(&transport));

    let response = transport
        .handle_frame(frame, credential)
        .await
        .map_err(|e| BridgeError::Transport(e.to_string()))?;

    // Server-generated id; uuids cannot collide with live entries, and the
    // table's activate guard holds even if one somehow did.
    let session_id = Uuid::new_v4().to_string();
    state
        .sessions
        .activate(session, &session_id, credential)
        .await
        .map_err(|e| BridgeError::Transport(e.to_string()))?;

    tracing::info!(session_id = %session_id, "session established");
    Ok(frame_response(response, &session_id))
}

/// Shape the transport's output into an HTTP response.
///
/// Requests get `200` with the JSON-RPC response body; notifications get
/// `202` with an empty body. Either way the session id header rides along
/// so the caller can continue the session.
fn frame_response(response: Option<JsonRpcResponse>, session_id: &str) -> Response {
    let mut http_response = match response {
        Some(frame) => (StatusCode::OK, Json(frame)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    };

    if let Ok(value) = session_id.parse() {
        http_response
            .headers_mut()
            .insert(HeaderName::from_static(SESSION_ID_HEADER), value);
    }

    http_response
}

/// Extract and strip the bearer credential from `Authorization`.
fn extract_bearer(headers: &HeaderMap) -> std::result::Result<String, BridgeError> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            BridgeError::Unauthenticated("missing Authorization header".to_string())
        })?;

    match raw.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(BridgeError::Unauthenticated(
            "Authorization header must use the Bearer scheme".to_string(),
        )),
    }
}

/// The session id header, if present and readable.
fn session_id_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// The single error-kind -> HTTP status mapping.
///
/// Unauthenticated is `401`; every other kind that escapes to the HTTP
/// boundary is `500` with an `{error, message}` body. Downstream failures
/// inside `tools/call` never reach here; they are tool-payload errors.
fn error_response(err: &BridgeError) -> Response {
    let status = match err {
        BridgeError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = serde_json::json!({
        "error": err.kind(),
        "message": err.to_string(),
    });

    (status, Json(body)).into_response()
}
