//! MCP SSE Transport
//!
//! `GET <sse_path>` opens a session and streams responses back as `message`
//! events. The first event is `endpoint`, telling the client where to POST.
//! `POST <message_path>?sessionId=<id>` carries client messages; the HTTP
//! response is empty and the JSON-RPC reply travels over the SSE stream.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use super::context::{server_version, ToolContext};
use super::handler::handle_message;
use crate::server::metrics;
use crate::server::state::{GuardedSessionManager, ServerState};
use crate::server::ServerConfig;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

struct SessionEntry {
    sender: UnboundedSender<String>,
    initialized: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendError {
    /// No session with this id.
    NotConnected,
    /// The SSE stream went away.
    Disconnected,
}

/// Open SSE sessions, keyed by session id.
pub struct SessionManager {
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
        // Entries stay consistent even if a holder panicked.
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a new session. The receiver yields serialized responses.
    pub fn register(&self) -> (String, UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded();
        let session_id = uuid::Uuid::new_v4().to_string();
        self.lock().insert(
            session_id.clone(),
            SessionEntry {
                sender: tx,
                initialized: false,
            },
        );
        metrics::set_sse_sessions(self.session_count());
        (session_id, rx)
    }

    pub fn unregister(&self, session_id: &str) {
        if self.lock().remove(session_id).is_some() {
            metrics::set_sse_sessions(self.session_count());
        }
    }

    /// Lifecycle flag of a session, `None` when the session is unknown.
    pub fn is_initialized(&self, session_id: &str) -> Option<bool> {
        self.lock().get(session_id).map(|entry| entry.initialized)
    }

    pub fn mark_initialized(&self, session_id: &str) {
        if let Some(entry) = self.lock().get_mut(session_id) {
            entry.initialized = true;
        }
    }

    pub fn send(&self, session_id: &str, payload: String) -> Result<(), SendError> {
        let sessions = self.lock();
        let entry = sessions.get(session_id).ok_or(SendError::NotConnected)?;
        entry
            .sender
            .unbounded_send(payload)
            .map_err(|_| SendError::Disconnected)
    }

    pub fn session_count(&self) -> usize {
        self.lock().len()
    }
}

/// Removes the session once the SSE stream holding it is dropped.
struct SessionGuard {
    session_id: String,
    sessions: GuardedSessionManager,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        debug!("MCP session {} closed", self.session_id);
        self.sessions.unregister(&self.session_id);
    }
}

/// Opens an SSE session.
pub async fn sse_handler(
    State(config): State<ServerConfig>,
    State(sessions): State<GuardedSessionManager>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (session_id, receiver) = sessions.register();
    info!("Opened MCP session {}", session_id);

    let endpoint = format!("{}?sessionId={}", config.message_path, session_id);
    let guard = SessionGuard {
        session_id,
        sessions,
    };

    let endpoint_event =
        stream::once(async move { Ok(Event::default().event("endpoint").data(endpoint)) });
    let messages = receiver.map(move |payload| {
        let _session = &guard;
        Ok(Event::default().event("message").data(payload))
    });

    Sse::new(endpoint_event.chain(messages)).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageQuery {
    session_id: Option<String>,
}

/// Accepts one client message for an open session.
pub async fn message_handler(
    State(state): State<ServerState>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Response {
    let Some(session_id) = query.session_id else {
        return (StatusCode::BAD_REQUEST, "Missing sessionId").into_response();
    };
    let Some(mut initialized) = state.sessions.is_initialized(&session_id) else {
        debug!("Message for unknown session {}", session_id);
        return (StatusCode::NOT_FOUND, "Unknown session").into_response();
    };

    let ctx = ToolContext {
        gateway: state.gateway.clone(),
        server_version: server_version(),
        start_time: state.start_time,
    };
    let response = handle_message(&body, ctx, &state.mcp_state, &mut initialized).await;
    if initialized {
        state.sessions.mark_initialized(&session_id);
    }

    if let Some(response) = response {
        let json = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize MCP response: {}", e);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };
        if let Err(e) = state.sessions.send(&session_id, json) {
            warn!("Could not deliver response to session {}: {:?}", session_id, e);
            return (StatusCode::NOT_FOUND, "Session closed").into_response();
        }
    }

    StatusCode::OK.into_response()
}
