//! WebSocket entry point. The handshake authenticates the externally-issued
//! token; after upgrade the socket is plumbed to the hub — inbound frames
//! become hub commands, hub events become outbound frames.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query,
    },
    http::StatusCode,
    response::IntoResponse,
    Extension,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::auth::jwt;
use crate::config::Config;
use crate::hub::HubHandle;
use crate::protocol::{ClientMessage, ServerMessage};

#[derive(Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    Extension(config): Extension<Config>,
    Extension(hub): Extension<HubHandle>,
) -> impl IntoResponse {
    let claims = query
        .token
        .as_deref()
        .and_then(|t| jwt::verify_token(t, &config.jwt_secret));

    match claims {
        Some(claims) => ws
            .on_upgrade(move |socket| handle_socket(socket, hub, claims.sub))
            .into_response(),
        None => {
            tracing::warn!("WebSocket connection rejected: missing or invalid token");
            (StatusCode::UNAUTHORIZED, "Missing or invalid token").into_response()
        }
    }
}

async fn handle_socket(socket: WebSocket, hub: HubHandle, user: String) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let conn = hub.connect(user, tx.clone());

    // Pump hub events out to the socket
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::warn!("Failed to serialize outbound event: {e}");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = receiver.next().await {
        let text = match msg {
            Message::Text(t) => t.to_string(),
            Message::Close(_) => break,
            _ => continue,
        };

        match serde_json::from_str::<ClientMessage>(&text) {
            Ok(message) => hub.inbound(conn, message),
            Err(e) => {
                let _ = tx.send(ServerMessage::Error {
                    message: format!("Invalid message: {e}"),
                });
            }
        }
    }

    hub.disconnect(conn);
    send_task.abort();
}
