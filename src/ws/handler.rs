//! WebSocket upgrade handler: attaches a client to one game's live stream
//! and runs the commands it sends.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::api::state::SharedState;
use crate::engine::GameStatus;
use crate::service::{MoveOutcome, ServiceError};

use super::manager::{ClientId, ClientSender, WsManager};
use super::messages::{WsCommand, WsEvent};

/// GET /ws/games/{id} — upgrade to WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(id): Path<u32>,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, id, state))
}

async fn handle_socket(socket: WebSocket, game_id: u32, state: SharedState) {
    if let Err(e) = state.service.get_game(game_id).await {
        let (mut sink, _) = socket.split();
        let _ = sink
            .send(Message::Text(WsEvent::error(e.to_string()).to_json().into()))
            .await;
        let _ = sink.close().await;
        return;
    }

    // Replies reach the socket right away; broadcasts only once `connect`
    // succeeds and the manager holds a clone of `tx`.
    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = Client {
        id: state.ws.next_client_id(),
        tx,
    };
    let client_id = client.id;
    let (mut sink, mut stream) = socket.split();

    // Writer task: queue → socket.
    let writer_state = state.clone();
    let mut writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if sink
                .send(Message::Text(event.to_json().into()))
                .await
                .is_err()
            {
                break;
            }
        }
        let _ = sink.close().await;
        cleanup(&writer_state, game_id, client_id).await;
    });

    // Reader task: socket → commands.
    let reader_state = state.clone();
    let mut reader = tokio::spawn(async move {
        while let Some(Ok(msg)) = stream.next().await {
            match msg {
                Message::Text(text) => {
                    handle_client_message(&reader_state, game_id, &client, &text).await;
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut writer => { reader.abort(); }
        _ = &mut reader => { writer.abort(); }
    }

    cleanup(&state, game_id, client_id).await;
}

/// One socket: its id and the queue its writer task drains.
struct Client {
    id: ClientId,
    tx: ClientSender,
}

impl Client {
    /// Queue an event for this socket only. A send fails only after the
    /// writer has stopped, which ends the session anyway.
    fn reply(&self, event: WsEvent) {
        let _ = self.tx.send(event);
    }
}

/// Run one client command. Failures go back to the sender only.
async fn handle_client_message(state: &SharedState, game_id: u32, client: &Client, text: &str) {
    let ws = &state.ws;
    let client_id = client.id;
    let cmd = match serde_json::from_str::<WsCommand>(text) {
        Ok(c) => c,
        Err(e) => {
            debug!(game_id, client_id, "invalid WS command: {e}");
            client.reply(WsEvent::error(format!("invalid command: {e}")));
            return;
        }
    };

    match cmd {
        WsCommand::Ping => client.reply(WsEvent::pong()),
        WsCommand::Connect { auth_token } => {
            // No move may land between the snapshot and the subscription.
            let _order = ws.order_guard(game_id).await;
            match state.service.connect(&auth_token, game_id).await {
                Ok((username, role, record)) => {
                    ws.subscribe(game_id, client_id, client.tx.clone()).await;
                    info!(
                        game_id,
                        client_id,
                        username = %username,
                        role = role.describe(),
                        "client connected"
                    );
                    client.reply(WsEvent::load_game(&record));
                    let text = format!("{username} joined the game as {}", role.describe());
                    ws.broadcast_except(game_id, client_id, WsEvent::notification(text))
                        .await;
                }
                Err(e) => reject(client, game_id, e),
            }
        }
        WsCommand::MakeMove { auth_token, mv } => {
            let _order = ws.order_guard(game_id).await;
            match state.service.play_move(&auth_token, game_id, mv).await {
                Ok(outcome) => announce_move(ws, &outcome, Some(client_id)).await,
                Err(e) => reject(client, game_id, e),
            }
        }
        WsCommand::Resign { auth_token } => {
            let _order = ws.order_guard(game_id).await;
            match state.service.resign(&auth_token, game_id).await {
                Ok(username) => {
                    let text = format!("{username} resigned. Game over!");
                    ws.broadcast(game_id, WsEvent::notification(text)).await;
                }
                Err(e) => reject(client, game_id, e),
            }
        }
        WsCommand::Leave { auth_token } => {
            match state.service.leave(&auth_token, game_id).await {
                Ok(username) => {
                    ws.unsubscribe(game_id, client_id).await;
                    let text = format!("{username} left the game");
                    ws.broadcast(game_id, WsEvent::notification(text)).await;
                }
                Err(e) => reject(client, game_id, e),
            }
        }
    }
}

fn reject(client: &Client, game_id: u32, err: ServiceError) {
    debug!(game_id, client_id = client.id, error = %err, "WS command rejected");
    client.reply(WsEvent::error(err.to_string()));
}

/// Push the result of a move to a game's clients: the new position to all,
/// the move itself to everyone but `mover`, then check or game-end news.
/// Callers hold the game's [`WsManager::order_guard`] across the move and
/// this call.
pub async fn announce_move(ws: &WsManager, outcome: &MoveOutcome, mover: Option<ClientId>) {
    let game_id = outcome.game_id;
    ws.broadcast(game_id, WsEvent::load_game(&outcome.record))
        .await;

    let made = WsEvent::notification(format!(
        "{} made move: {} -> {}",
        outcome.username, outcome.mv.from, outcome.mv.to
    ));
    match mover {
        Some(client_id) => ws.broadcast_except(game_id, client_id, made).await,
        None => ws.broadcast(game_id, made).await,
    }

    let opponent = outcome
        .opponent
        .clone()
        .unwrap_or_else(|| (!outcome.color).to_string());
    let news = match outcome.opponent_status {
        GameStatus::Checkmate => Some(format!("{opponent} is in checkmate!")),
        GameStatus::Stalemate => Some(format!("{opponent} is in stalemate!")),
        GameStatus::Check => Some(format!("{opponent} is in check!")),
        GameStatus::Active => None,
    };
    if let Some(text) = news {
        ws.broadcast(game_id, WsEvent::notification(text)).await;
    }
}

async fn cleanup(state: &SharedState, game_id: u32, client_id: ClientId) {
    state.ws.unsubscribe(game_id, client_id).await;
    debug!(game_id, client_id, "WS session cleaned up");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn handler_type_check() {
        fn assert_handler<F, Fut, R>(_: F)
        where
            F: FnOnce(WebSocketUpgrade, Path<u32>, State<SharedState>) -> Fut,
            Fut: std::future::Future<Output = R>,
            R: IntoResponse,
        {
        }
        assert_handler(ws_handler);
    }
}
