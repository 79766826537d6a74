//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{SessionEvent, SessionEventKind};
use crate::util::rate_limit::SessionRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler. Every connection is a new anonymous session.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let session_id = Uuid::new_v4();
    info!(session_id = %session_id, "New WebSocket connection");

    let (mut ws_sink, ws_stream) = socket.split();
    let event_tx = state.game.event_tx.clone();

    // Subscribe before joining so nothing broadcast after the welcome is missed
    let broadcast_rx = state.game.subscribe();

    let (reply_tx, reply_rx) = oneshot::channel();
    let join = SessionEvent {
        session_id,
        kind: SessionEventKind::Join { reply: reply_tx },
        received_at: unix_millis(),
    };
    if event_tx.send(join).await.is_err() {
        warn!(session_id = %session_id, "Match loop unavailable, dropping connection");
        return;
    }

    let welcome = match reply_rx.await {
        Ok(welcome) => welcome,
        Err(_) => {
            warn!(session_id = %session_id, "Match loop dropped join request");
            return;
        }
    };

    let joined_at = match &welcome {
        ServerMsg::Welcome(w) => w.game_state.timestamp,
        _ => 0,
    };

    if let Err(e) = send_msg(&mut ws_sink, &welcome).await {
        error!(session_id = %session_id, error = %e, "Failed to send welcome");
    } else {
        run_session(session_id, joined_at, ws_sink, ws_stream, &event_tx, broadcast_rx).await;
    }

    // Signal disconnect to match loop
    let _ = event_tx
        .send(SessionEvent {
            session_id,
            kind: SessionEventKind::Disconnect,
            received_at: unix_millis(),
        })
        .await;

    info!(session_id = %session_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    session_id: Uuid,
    joined_at: u64,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    event_tx: &mpsc::Sender<SessionEvent>,
    mut broadcast_rx: broadcast::Receiver<ServerMsg>,
) {
    let rate_limiter = SessionRateLimiter::new();

    // Spawn writer task: broadcast -> WebSocket
    let writer_handle = tokio::spawn(async move {
        loop {
            match broadcast_rx.recv().await {
                Ok(msg) => {
                    if !should_forward(session_id, joined_at, &msg) {
                        continue;
                    }
                    if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                        debug!(session_id = %session_id, error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(
                        session_id = %session_id,
                        lagged_count = n,
                        "Client lagged, skipping {} messages", n
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(session_id = %session_id, "Broadcast channel closed");
                    break;
                }
            }
        }
    });

    // Reader loop: WebSocket -> match loop
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_message() {
                    warn!(session_id = %session_id, "Rate limited client message");
                    continue;
                }

                match ClientMsg::parse(&text) {
                    Ok(client_msg) => {
                        let event = SessionEvent {
                            session_id,
                            kind: SessionEventKind::Message(client_msg),
                            received_at: unix_millis(),
                        };

                        if event_tx.send(event).await.is_err() {
                            debug!(session_id = %session_id, "Event channel closed");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(session_id = %session_id, error = %e, "Dropping client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(session_id = %session_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(session_id = %session_id, "Client initiated close");
                break;
            }
            Err(e) => {
                debug!(session_id = %session_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// A session is never told about its own arrival, and snapshots older than
/// its welcome are stale
fn should_forward(session_id: Uuid, joined_at: u64, msg: &ServerMsg) -> bool {
    match msg {
        ServerMsg::PlayerJoin(player) => player.id != session_id,
        ServerMsg::GameState(snapshot) => snapshot.timestamp >= joined_at,
        _ => true,
    }
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::game::obstacles::ObstacleField;
    use crate::game::player::Player;
    use crate::game::MatchState;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::Arc;

    #[test]
    fn test_own_join_is_not_echoed() {
        let config = GameConfig::default();
        let field = ObstacleField::from_obstacles(Vec::new(), config.world_width, config.world_height);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let me = Uuid::from_u128(1);
        let other = Uuid::from_u128(2);

        let my_join = ServerMsg::PlayerJoin(Player::spawn(me, None, &field, &config, &mut rng));
        let other_join = ServerMsg::PlayerJoin(Player::spawn(other, None, &field, &config, &mut rng));

        assert!(!should_forward(me, 0, &my_join));
        assert!(should_forward(me, 0, &other_join));
        assert!(should_forward(me, 0, &ServerMsg::PlayerLeave { id: me }));
    }

    #[test]
    fn test_snapshots_before_welcome_are_dropped() {
        let mut state = MatchState::with_obstacles(
            Arc::new(GameConfig::default()),
            ObstacleField::from_obstacles(Vec::new(), 3200.0, 2432.0),
            ChaCha8Rng::seed_from_u64(4),
        );
        let me = Uuid::from_u128(1);

        let stale = ServerMsg::GameState(Arc::new(state.game_state(100)));
        let joined_at = match state.handle_join(me, 116) {
            ServerMsg::Welcome(welcome) => welcome.game_state.timestamp,
            other => panic!("unexpected welcome {:?}", other),
        };
        let fresh = ServerMsg::GameState(Arc::new(state.game_state(116)));

        assert_eq!(joined_at, 116);
        assert!(!should_forward(me, joined_at, &stale));
        assert!(should_forward(me, joined_at, &fresh));
    }
}
