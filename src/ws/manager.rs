//! WebSocket connection manager: tracks the clients attached to each game
//! and fans events out to them.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, mpsc};
use tracing::{debug, warn};

use super::messages::WsEvent;

/// Sending half of a client's outbound queue. The handler's writer task owns
/// the receiving half.
pub type ClientSender = mpsc::UnboundedSender<WsEvent>;

/// A unique ID assigned to each connected WebSocket client.
pub type ClientId = u64;

/// Per-game sets of connected clients.
///
/// Only clients that completed `connect` are subscribed; a socket that has
/// not authenticated gets nothing from a broadcast.
#[derive(Debug)]
pub struct WsManager {
    /// game_id → { client_id → sender }
    subs: RwLock<HashMap<u32, HashMap<ClientId, ClientSender>>>,
    /// game_id → lock held from applying a move until it is queued to clients
    order: Mutex<HashMap<u32, Arc<Mutex<()>>>>,
    next_id: AtomicU64,
}

impl WsManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Allocate an id for a new socket.
    pub fn next_client_id(&self) -> ClientId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Attach an authenticated client to a game. Subscribing again replaces
    /// the previous sender.
    pub async fn subscribe(&self, game_id: u32, client_id: ClientId, tx: ClientSender) {
        let mut subs = self.subs.write().await;
        subs.entry(game_id).or_default().insert(client_id, tx);
        debug!(game_id, client_id, "WS client subscribed");
    }

    /// Remove a client from a game. Unknown ids are ignored.
    pub async fn unsubscribe(&self, game_id: u32, client_id: ClientId) {
        let mut subs = self.subs.write().await;
        if let Some(clients) = subs.get_mut(&game_id) {
            if clients.remove(&client_id).is_some() {
                debug!(game_id, client_id, "WS client unsubscribed");
            }
            if clients.is_empty() {
                subs.remove(&game_id);
            }
        }
    }

    /// Send to every client of a game.
    pub async fn broadcast(&self, game_id: u32, event: WsEvent) {
        self.fan_out(game_id, None, event).await;
    }

    /// Send to every client of a game except `skip`.
    pub async fn broadcast_except(&self, game_id: u32, skip: ClientId, event: WsEvent) {
        self.fan_out(game_id, Some(skip), event).await;
    }

    /// Serialise move announcements for a game. Hold the guard from applying
    /// a move until its events are queued, so every client sees moves in the
    /// order they were played.
    pub async fn order_guard(&self, game_id: u32) -> OwnedMutexGuard<()> {
        let lock = {
            let mut order = self.order.lock().await;
            order.entry(game_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    async fn fan_out(&self, game_id: u32, skip: Option<ClientId>, event: WsEvent) {
        let subs = self.subs.read().await;
        let Some(clients) = subs.get(&game_id) else {
            return;
        };
        let mut stale: Vec<ClientId> = Vec::new();
        for (&cid, tx) in clients {
            if Some(cid) == skip {
                continue;
            }
            if tx.send(event.clone()).is_err() {
                stale.push(cid);
            }
        }
        drop(subs); // release read lock before write

        if !stale.is_empty() {
            let mut subs = self.subs.write().await;
            if let Some(clients) = subs.get_mut(&game_id) {
                for cid in &stale {
                    clients.remove(cid);
                    warn!(game_id, client_id = cid, "removed stale WS client");
                }
                if clients.is_empty() {
                    subs.remove(&game_id);
                }
            }
        }
    }

    /// Number of subscribers for a game.
    pub async fn subscriber_count(&self, game_id: u32) -> usize {
        let subs = self.subs.read().await;
        subs.get(&game_id).map_or(0, |c| c.len())
    }

    /// Total number of active connections across all games.
    pub async fn total_connections(&self) -> usize {
        let subs = self.subs.read().await;
        subs.values().map(|c| c.len()).sum()
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self {
            subs: RwLock::new(HashMap::new()),
            order: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
