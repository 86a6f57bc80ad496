//! WebSocket handlers for live games and the matchmaking lobby.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws/game/{id}[?playerId=]` or `GET /ws/lobby`
//! 2. The server opens a mailbox for the connection in the hub and spawns a
//!    writer task that drains it and sends keepalive pings
//! 3. A game socket subscribes to its game and the current `gameState` is
//!    broadcast; a lobby socket is greeted with `connected`
//! 4. The receive loop decodes `{type, payload}` envelopes and dispatches
//!    them to the game service until the client leaves or goes idle
//! 5. On exit the connection is removed from every topic and player slot
//!
//! The writer task is the only place frames are written to the socket.
//! Replies to the client, including errors, are queued on the same mailbox
//! as broadcasts so ordering is preserved.
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:9000/ws/game/GAME_ID?playerId=alice');
//!
//! ws.onmessage = (event) => {
//!   const { type, payload } = JSON.parse(event.data);
//!   if (type === 'gameState') renderBoard(payload.board);
//! };
//!
//! ws.send(JSON.stringify({ type: 'move', payload: { playerId: 'alice', column: 3 } }));
//! ```

use axum::{
    body::Bytes,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
};
use connect_four::{ClientMessage, ConnectionHandle, ConnectionInbox, GameId, ServerMessage};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use log::{debug, info, warn};
use serde::Deserialize;
use std::time::Duration;
use tokio::{task::JoinHandle, time::Instant};

use super::{AppState, middleware::RequestId, rate_limiter::MessageLimits, session_error};
use crate::metrics;

/// How long teardown waits for the writer to flush its close frame.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Reply to an envelope that is not valid JSON or has an unknown type.
const INVALID_MESSAGE: &str = "Invalid message format";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSocketQuery {
    #[serde(default)]
    pub player_id: Option<String>,
}

/// Which audience a socket belongs to.
#[derive(Clone, Debug)]
enum Channel {
    Game(GameId),
    Lobby,
}

impl Channel {
    fn label(&self) -> &'static str {
        match self {
            Self::Game(_) => "ws_game",
            Self::Lobby => "ws_lobby",
        }
    }
}

/// Upgrade to a per-game socket.
///
/// # Query Parameters
///
/// - `playerId` (optional): registers this socket as the player's own
///   connection when they hold a seat in the game
///
/// # Response
///
/// `101 Switching Protocols` on success, `404 Not Found` with an `{error}`
/// body when the game does not exist.
pub async fn game_socket_handler(
    ws: WebSocketUpgrade,
    Path(game_id): Path<String>,
    Query(query): Query<GameSocketQuery>,
    State(state): State<AppState>,
    request_id: RequestId,
) -> Response {
    if let Err(e) = state.service.sessions().get_game(&game_id).await {
        info!(
            "Refusing socket for game {} (request {}): {}",
            game_id,
            request_id.as_str(),
            e
        );
        return session_error(e).into_response();
    }

    let player_id = query.player_id.filter(|id| !id.trim().is_empty());
    ws.on_upgrade(move |socket| handle_socket(socket, Channel::Game(game_id), player_id, state))
}

/// Upgrade to a lobby socket used for matchmaking.
pub async fn lobby_socket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, Channel::Lobby, None, state))
}

/// Handle an established WebSocket connection until it closes.
async fn handle_socket(
    socket: WebSocket,
    channel: Channel,
    player_id: Option<String>,
    state: AppState,
) {
    let (sender, receiver) = socket.split();
    let (handle, inbox) = state.service.hub().open();
    let connection_id = handle.id();

    metrics::websocket_connection_opened();
    info!("WebSocket connected: {:?}, connection={}", channel, connection_id);

    let ping_interval = state.config.websocket.ping_interval;
    let mut send_task = tokio::spawn(write_frames(sender, inbox, ping_interval));

    let attached = match &channel {
        Channel::Game(game_id) => state
            .service
            .attach_game_connection(game_id, &handle, player_id.as_deref())
            .await
            .map(|_| ()),
        Channel::Lobby => {
            state.service.attach_lobby_connection(&handle).await;
            Ok(())
        }
    };

    let writer_finished = match attached {
        Ok(()) => read_frames(receiver, &channel, &handle, &state, &mut send_task).await,
        Err(e) => {
            warn!("Failed to attach connection {}: {}", connection_id, e);
            false
        }
    };

    state.service.detach(&handle).await;
    if !writer_finished {
        let abort = send_task.abort_handle();
        if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, send_task)
            .await
            .is_err()
        {
            abort.abort();
        }
    }

    metrics::websocket_connection_closed();
    info!("WebSocket disconnected: {:?}, connection={}", channel, connection_id);
}

/// Drains the connection's mailbox onto the socket and sends keepalive pings.
async fn write_frames(
    mut sender: SplitSink<WebSocket, Message>,
    mut inbox: ConnectionInbox,
    ping_interval: Duration,
) {
    let mut ping = tokio::time::interval_at(Instant::now() + ping_interval, ping_interval);

    loop {
        tokio::select! {
            frame = inbox.next() => {
                let Some(frame) = frame else { break };
                if sender.send(Message::Text(frame.to_string().into())).await.is_err() {
                    debug!("Connection {} went away while sending", inbox.id());
                    return;
                }
                metrics::websocket_messages_sent();
            }
            _ = ping.tick() => {
                if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                    return;
                }
            }
        }
    }

    let _ = sender.send(Message::Close(None)).await;
}

/// Processes inbound frames until the client leaves, goes idle, or the
/// writer stops. Returns `true` if the writer task has already finished.
async fn read_frames(
    mut receiver: SplitStream<WebSocket>,
    channel: &Channel,
    handle: &ConnectionHandle,
    state: &AppState,
    send_task: &mut JoinHandle<()>,
) -> bool {
    let idle_timeout = state.config.websocket.idle_timeout;
    let mut deadline = Instant::now() + idle_timeout;
    let mut limits = MessageLimits::from_config(&state.config.websocket);

    loop {
        let next = tokio::select! {
            _ = &mut *send_task => return true,
            next = tokio::time::timeout_at(deadline, receiver.next()) => next,
        };

        let message = match next {
            Err(_) => {
                info!("Connection {} idle for {:?}, closing", handle.id(), idle_timeout);
                return false;
            }
            Ok(None) => return false,
            Ok(Some(Err(e))) => {
                warn!("WebSocket error on connection {}: {}", handle.id(), e);
                return false;
            }
            Ok(Some(Ok(message))) => message,
        };

        // Any inbound frame, pongs included, proves the peer is alive.
        deadline = Instant::now() + idle_timeout;

        match message {
            Message::Text(text) => {
                metrics::websocket_messages_received();

                if let Err(limit) = limits.admit() {
                    warn!("{:?} rate limit exceeded on connection {}", limit, handle.id());
                    metrics::rate_limit_hits_total(channel.label());
                    handle.send(&ServerMessage::error(limit.client_message()));
                    continue;
                }

                match ClientMessage::decode(text.as_str()) {
                    Ok(envelope) => dispatch(channel, handle, state, envelope).await,
                    Err(e) => {
                        debug!("Undecodable envelope on connection {}: {}", handle.id(), e);
                        handle.send(&ServerMessage::error(INVALID_MESSAGE));
                    }
                }
            }
            Message::Binary(_) => {
                handle.send(&ServerMessage::error(INVALID_MESSAGE));
            }
            Message::Close(_) => return false,
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }
}

/// Routes one envelope to the game service and reports failures back to
/// the sender only.
async fn dispatch(
    channel: &Channel,
    handle: &ConnectionHandle,
    state: &AppState,
    envelope: ClientMessage,
) {
    let kind = envelope.to_string();
    let result = match channel {
        Channel::Game(game_id) => {
            let is_move = matches!(envelope, ClientMessage::Move { .. });
            state
                .service
                .handle_game_message(game_id, handle, envelope)
                .await
                .map(|changed| {
                    if let Some(game) = changed {
                        if is_move {
                            metrics::moves_applied_total();
                        }
                        metrics::game_finished(&game);
                    }
                })
        }
        Channel::Lobby => state
            .service
            .handle_lobby_message(handle, envelope)
            .await
            .map(|_| ()),
    };

    if let Err(e) = result {
        debug!("{} from connection {} rejected: {}", kind, handle.id(), e);
        handle.send(&ServerMessage::error(e.client_message()));
    }
}
