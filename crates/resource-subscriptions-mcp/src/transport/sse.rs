//! SSE transport — many MCP sessions over HTTP.
//!
//! `POST /mcp` carries client messages; an `initialize` without a session
//! header opens a new session whose id comes back in `mcp-session-id`.
//! `GET /sse` streams that session's notifications as server-sent events.
//! `DELETE /mcp` ends the session and drops its subscriptions, and so does
//! the client going away while its event stream is open.

#[cfg(feature = "sse")]
use std::collections::HashMap;
#[cfg(feature = "sse")]
use std::pin::Pin;
#[cfg(feature = "sse")]
use std::sync::Arc;
#[cfg(feature = "sse")]
use std::task::{Context, Poll};

#[cfg(feature = "sse")]
use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
#[cfg(feature = "sse")]
use serde::Deserialize;
#[cfg(feature = "sse")]
use tokio::sync::{mpsc, Mutex};
#[cfg(feature = "sse")]
use tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt};
#[cfg(feature = "sse")]
use tower_http::cors::CorsLayer;

#[cfg(feature = "sse")]
use crate::protocol::ProtocolHandler;
#[cfg(feature = "sse")]
use crate::session::{SessionGuard, SessionId, SessionManager};
#[cfg(feature = "sse")]
use crate::types::{methods, JsonRpcMessage, JsonRpcNotification, McpError, McpResult};

/// Header carrying the session id on every request after `initialize`.
#[cfg(feature = "sse")]
pub const SESSION_HEADER: &str = "mcp-session-id";

#[cfg(feature = "sse")]
struct HttpSession {
    id: SessionId,
    handler: ProtocolHandler,
    notifications: Mutex<Option<mpsc::Receiver<JsonRpcNotification>>>,
    guard: Mutex<Option<SessionGuard>>,
}

#[cfg(feature = "sse")]
#[derive(Clone)]
struct AppState {
    manager: Arc<SessionManager>,
    sessions: Arc<Mutex<HashMap<SessionId, Arc<HttpSession>>>>,
}

#[cfg(feature = "sse")]
#[derive(Debug, Deserialize)]
struct SessionQuery {
    session: Option<String>,
}

/// SSE transport for web-based MCP clients.
#[cfg(feature = "sse")]
pub struct SseTransport {
    state: AppState,
}

#[cfg(feature = "sse")]
impl SseTransport {
    /// Create a new SSE transport.
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self {
            state: AppState {
                manager,
                sessions: Arc::new(Mutex::new(HashMap::new())),
            },
        }
    }

    /// The HTTP routes, for embedding or testing.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/mcp", post(handle_post).delete(handle_delete))
            .route("/sse", get(handle_sse))
            .route("/health", get(|| async { "ok" }))
            .layer(tower::ServiceBuilder::new().layer(CorsLayer::permissive()))
            .with_state(self.state.clone())
    }

    /// Run the SSE server on the given address.
    pub async fn run(&self, addr: &str) -> McpResult<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(McpError::Io)?;

        tracing::info!("SSE transport listening on {addr}");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| McpError::Transport(e.to_string()))?;

        Ok(())
    }
}

#[cfg(feature = "sse")]
impl AppState {
    async fn open_session(&self) -> Arc<HttpSession> {
        let (guard, notifications) = self.manager.connect_channel();
        let session = Arc::new(HttpSession {
            id: guard.id(),
            handler: ProtocolHandler::new(self.manager.clone(), guard.handle().clone()),
            notifications: Mutex::new(Some(notifications)),
            guard: Mutex::new(Some(guard)),
        });
        self.sessions.lock().await.insert(session.id, session.clone());
        session
    }

    async fn find(&self, id: SessionId) -> Option<Arc<HttpSession>> {
        self.sessions.lock().await.get(&id).cloned()
    }

    /// Forget a session and remove its subscriptions. Returns `false` if it
    /// was already gone.
    async fn end_session(&self, id: SessionId) -> bool {
        let Some(session) = self.sessions.lock().await.remove(&id) else {
            return false;
        };
        let guard = session.guard.lock().await.take();
        if let Some(guard) = guard {
            guard.close().await;
        }
        true
    }
}

/// A session's notification stream. Ends the session when dropped, which
/// happens once the client disconnects.
#[cfg(feature = "sse")]
struct EventStream {
    notifications: ReceiverStream<JsonRpcNotification>,
    state: AppState,
    id: SessionId,
}

#[cfg(feature = "sse")]
impl Stream for EventStream {
    type Item = JsonRpcNotification;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.notifications).poll_next(cx)
    }
}

#[cfg(feature = "sse")]
impl Drop for EventStream {
    fn drop(&mut self) {
        let state = self.state.clone();
        let id = self.id;
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if state.end_session(id).await {
                        tracing::debug!("Session {id} closed its event stream");
                    }
                });
            }
            Err(_) => {
                tracing::error!("Event stream for session {id} dropped outside a runtime");
            }
        }
    }
}

#[cfg(feature = "sse")]
fn session_id(headers: &HeaderMap, query: &SessionQuery) -> Option<SessionId> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .or(query.session.as_deref())
        .and_then(|raw| raw.parse().ok())
}

#[cfg(feature = "sse")]
async fn handle_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let Ok(message) = serde_json::from_value::<JsonRpcMessage>(body) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let session = match session_id(&headers, &query) {
        Some(id) => match state.find(id).await {
            Some(session) => session,
            None => return StatusCode::NOT_FOUND.into_response(),
        },
        None => {
            let is_initialize = matches!(
                &message,
                JsonRpcMessage::Request(request) if request.method == methods::INITIALIZE
            );
            if !is_initialize {
                return (StatusCode::BAD_REQUEST, "missing mcp-session-id").into_response();
            }
            state.open_session().await
        }
    };

    let mut response = match session.handler.handle_message(message).await {
        Some(body) => Json(body).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    };
    if let Ok(value) = HeaderValue::from_str(&session.id.to_string()) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

#[cfg(feature = "sse")]
async fn handle_sse(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
) -> Response {
    let Some(id) = session_id(&headers, &query) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let Some(session) = state.find(id).await else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(notifications) = session.notifications.lock().await.take() else {
        return (StatusCode::CONFLICT, "event stream already open").into_response();
    };

    tracing::debug!("Session {id} opened its event stream");
    let events = EventStream {
        notifications: ReceiverStream::new(notifications),
        state,
        id,
    }
    .map(|notification| Event::default().event("message").json_data(notification));

    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}

#[cfg(feature = "sse")]
async fn handle_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
) -> Response {
    let Some(id) = session_id(&headers, &query) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    if state.end_session(id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}
