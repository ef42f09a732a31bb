//! Realtime WebSocket endpoint.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use domain::models::realtime::Viewer;
use futures::{stream::SplitSink, SinkExt, StreamExt};
use persistence::repositories::ProfileRepository;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::UserAuth;
use crate::services::realtime::{ClientMessage, ServerMessage, Subscription};

#[derive(Debug, Deserialize)]
pub struct RealtimeParams {
    pub token: String,
}

/// Open a realtime subscription.
///
/// GET /api/v1/realtime?token=...
///
/// Browsers cannot set headers on WebSocket requests, so the access token
/// travels in the query string.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<RealtimeParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let auth = match UserAuth::validate(&state.jwt, &params.token) {
        Ok(auth) => auth,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let viewer = match load_viewer(&state, &auth).await {
        Ok(viewer) => viewer,
        Err(e) => return e.into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, viewer))
}

async fn load_viewer(state: &AppState, auth: &UserAuth) -> Result<Viewer, ApiError> {
    let profile = ProfileRepository::new(state.pool.clone())
        .find_by_user_id(auth.user_id)
        .await?;

    Ok(match profile {
        Some(p) => Viewer {
            user_id: auth.user_id,
            email: Some(p.email),
            is_admin: p.is_admin,
        },
        None => Viewer {
            user_id: auth.user_id,
            email: auth.email.clone(),
            is_admin: false,
        },
    })
}

async fn handle_socket(socket: WebSocket, state: AppState, viewer: Viewer) {
    let connection_id = Uuid::new_v4();
    info!(user_id = %viewer.user_id, %connection_id, "Realtime connected");

    let (mut sender, mut receiver) = socket.split();
    let mut events = state.realtime.subscribe();
    let mut subscription = Subscription::default();

    let connected = ServerMessage::Connected {
        user_id: viewer.user_id,
    };
    if !send(&mut sender, &connected).await {
        return;
    }

    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let reply = match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(ClientMessage::Ping) => ServerMessage::Pong,
                        Ok(msg) => {
                            subscription.apply(&msg);
                            subscription.snapshot()
                        }
                        Err(e) => {
                            debug!(%connection_id, error = %e, "Unparsable client message");
                            ServerMessage::Error {
                                message: "Unrecognized message".to_string(),
                            }
                        }
                    };
                    if !send(&mut sender, &reply).await {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    warn!(%connection_id, error = %e, "Realtime socket error");
                    break;
                }
                Some(Ok(_)) => {}
            },
            event = events.recv() => match event {
                Ok(event) => {
                    if let Some(msg) = subscription.filter(&event, &viewer) {
                        if !send(&mut sender, &msg).await {
                            break;
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%connection_id, skipped, "Realtime subscriber lagged");
                    if !send(&mut sender, &ServerMessage::Lagged { skipped }).await {
                        break;
                    }
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    info!(user_id = %viewer.user_id, %connection_id, "Realtime disconnected");
}

/// Returns false once the peer is gone.
async fn send(sender: &mut SplitSink<WebSocket, Message>, msg: &ServerMessage) -> bool {
    let text = match serde_json::to_string(msg) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Failed to serialize realtime message");
            return true;
        }
    };
    sender.send(Message::Text(text)).await.is_ok()
}
