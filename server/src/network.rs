//! HTTP and WebSocket front: lobby creation, lobby join upgrades and the
//! per-connection message loops.

use std::convert::Infallible;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::ws::{Message, WebSocket, Ws};
use warp::{Filter, Rejection, Reply};

use crate::hub::{send_message, Hub, LobbySession, OutboundTx};
use shared::{ClientMessage, ServerMessage};

#[derive(Debug, Deserialize)]
struct JoinQuery {
    id: String,
}

#[derive(Debug, Serialize)]
struct LobbyCreated {
    id: String,
}

/// Builds the full route set: `POST /lobby`, `GET /lobby?id=` (WebSocket
/// upgrade) and `GET /health`.
pub fn routes(
    hub: Arc<Hub>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let create = warp::path("lobby")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_hub(Arc::clone(&hub)))
        .and_then(create_lobby);

    let join = warp::path("lobby")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<JoinQuery>())
        .and(warp::ws())
        .and(with_hub(Arc::clone(&hub)))
        .and_then(join_lobby);

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| "healthy");

    create.or(join).or(health)
}

fn with_hub(hub: Arc<Hub>) -> impl Filter<Extract = (Arc<Hub>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&hub))
}

async fn create_lobby(hub: Arc<Hub>) -> Result<Response, Infallible> {
    match hub.create_lobby().await {
        Ok(id) => Ok(reply::json(&LobbyCreated { id }).into_response()),
        Err(err) => {
            error!("Failed to create lobby: {}", err);
            Ok(
                reply::with_status("Failed to create lobby", StatusCode::INTERNAL_SERVER_ERROR)
                    .into_response(),
            )
        }
    }
}

async fn join_lobby(query: JoinQuery, ws: Ws, hub: Arc<Hub>) -> Result<Response, Infallible> {
    match hub.lobby(&query.id).await {
        Some(session) => {
            let client_id = hub.next_client_id();
            let token = query.id;
            Ok(ws
                .on_upgrade(move |socket| client_connection(socket, client_id, token, session))
                .into_response())
        }
        None => {
            warn!("Rejected join for unknown lobby {}", query.id);
            Ok(reply::with_status("Lobby not found", StatusCode::NOT_FOUND).into_response())
        }
    }
}

/// Runs one client's connection: a writer task drains the outbound channel
/// into the socket while this task reads, parses and dispatches inbound
/// frames. Membership is dropped when the read loop ends for any reason.
async fn client_connection(
    socket: WebSocket,
    client_id: u32,
    token: String,
    session: Arc<LobbySession>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(json) = rx.recv().await {
            if ws_tx.send(Message::text(json)).await.is_err() {
                break;
            }
        }
    });

    session.join(client_id, tx.clone()).await;
    info!("Client {} joined lobby {}", client_id, token);

    while let Some(result) = ws_rx.next().await {
        let message = match result {
            Ok(message) => message,
            Err(err) => {
                debug!("Client {} socket error: {}", client_id, err);
                break;
            }
        };
        if message.is_close() {
            break;
        }
        let Ok(text) = message.to_str() else {
            // Binary and control frames carry no lobby messages.
            continue;
        };
        dispatch_message(&session, client_id, &tx, text).await;
    }

    let remaining = session.leave(client_id).await;
    info!(
        "Client {} left lobby {} ({} clients remaining)",
        client_id, token, remaining
    );
}

/// Parses one inbound frame and routes it. Parse failures answer the
/// sender with an error message and touch nobody else; unknown message
/// types are rejected the same way rather than forwarded.
async fn dispatch_message(session: &LobbySession, client_id: u32, reply: &OutboundTx, text: &str) {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => {
            debug!("Client {} sent unparseable payload", client_id);
            send_message(reply, &ServerMessage::protocol_error("Invalid JSON format"));
            return;
        }
    };
    let type_field = value.get("type").and_then(Value::as_str).map(str::to_owned);

    match serde_json::from_value::<ClientMessage>(value) {
        Ok(ClientMessage::Move { row, col, value }) => {
            debug!(
                "Client {} move request: row={}, col={}, value={}",
                client_id, row, col, value
            );
            session.handle_move(row, col, value, reply).await;
        }
        Ok(ClientMessage::Clear { row, col }) => {
            debug!(
                "Client {} clear request: row={}, col={}",
                client_id, row, col
            );
            session.handle_clear(row, col, reply).await;
        }
        Ok(ClientMessage::RequestState) => {
            debug!("Client {} requested state", client_id);
            session.handle_request_state(reply).await;
        }
        Err(_) => {
            let error = match type_field.as_deref() {
                None => "Message type is required".to_string(),
                Some("move") => "Invalid move format".to_string(),
                Some("clear") => "Invalid clear format".to_string(),
                Some(other) => format!("Unknown message type: {}", other),
            };
            debug!("Client {} sent rejected payload: {}", client_id, error);
            send_message(reply, &ServerMessage::protocol_error(error));
        }
    }
}
