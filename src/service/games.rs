use std::sync::Arc;
use tokio::sync::RwLock;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::engine::{Color, Move, Position};
use crate::store::{GameRecord, GameStore, Session, SessionStore, User, UserStore};

use super::types::*;

// ---------------------------------------------------------------------------
// GameService
// ---------------------------------------------------------------------------

/// Accounts, sessions and games behind async locks. Every mutation of a game
/// happens while the game store's write lock is held.
///
/// Lock order is users, then sessions, then games; no lock is held across an
/// await on another in the reverse order.
pub struct GameService {
    users: RwLock<UserStore>,
    games: RwLock<GameStore>,
    sessions: RwLock<SessionStore>,
    hash_cost: u32,
}

impl GameService {
    /// Empty service whose password hashes use bcrypt cost `hash_cost`.
    pub fn new(hash_cost: u32) -> Arc<Self> {
        Arc::new(Self {
            users: RwLock::new(UserStore::new()),
            games: RwLock::new(GameStore::new()),
            sessions: RwLock::new(SessionStore::new()),
            hash_cost,
        })
    }

    // -----------------------------------------------------------------------
    // Accounts and sessions
    // -----------------------------------------------------------------------

    /// Create an account and open a first session for it.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<Session, ServiceError> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() || password.is_empty() || email.is_empty() {
            return Err(ServiceError::BadRequest(
                "username, password and email are required".into(),
            ));
        }
        if self.users.read().await.get_user(username).is_some() {
            return Err(ServiceError::AlreadyTaken);
        }

        let password_hash = hash_password(password, self.hash_cost).await?;
        let user = User {
            username: username.to_string(),
            password_hash,
            email: email.to_string(),
            created_at: Utc::now(),
        };
        // Another registration may have taken the name while we hashed.
        self.users
            .write()
            .await
            .create_user(user)
            .map_err(|_| ServiceError::AlreadyTaken)?;

        let session = self.sessions.write().await.create_session(username);
        info!(username, "user registered");
        Ok(session)
    }

    /// Check `password` against the stored hash and open a session.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ServiceError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ServiceError::BadRequest(
                "username and password are required".into(),
            ));
        }
        let password_hash = self
            .users
            .read()
            .await
            .get_user(username)
            .map(|u| u.password_hash.clone())
            .ok_or(ServiceError::Unauthorized)?;

        if !verify_password(password, password_hash).await? {
            warn!(username, "login with wrong password");
            return Err(ServiceError::Unauthorized);
        }
        let session = self.sessions.write().await.create_session(username);
        info!(username, "session opened");
        Ok(session)
    }

    pub async fn logout(&self, token: &str) -> Result<(), ServiceError> {
        if !self.sessions.write().await.delete_session(token) {
            return Err(ServiceError::Unauthorized);
        }
        debug!("session closed");
        Ok(())
    }

    /// Username behind `token`.
    pub async fn authenticate(&self, token: &str) -> Result<String, ServiceError> {
        self.sessions
            .read()
            .await
            .get_session(token)
            .map(|s| s.username.clone())
            .ok_or(ServiceError::Unauthorized)
    }

    // -----------------------------------------------------------------------
    // Lobby
    // -----------------------------------------------------------------------

    pub async fn create_game(&self, token: &str, name: &str) -> Result<u32, ServiceError> {
        let username = self.authenticate(token).await?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::BadRequest("game name is required".into()));
        }
        let id = self.games.write().await.insert_game(name).id;
        info!(game_id = id, username = %username, name, "game created");
        Ok(id)
    }

    pub async fn list_games(&self, token: &str) -> Result<Vec<GameSummary>, ServiceError> {
        self.authenticate(token).await?;
        let games = self.games.read().await;
        Ok(games.list_games().into_iter().map(GameSummary::from).collect())
    }

    /// Take the `color` seat of game `id`. Sitting in a seat you already
    /// hold is a no-op.
    pub async fn join_game(&self, token: &str, id: u32, color: Color) -> Result<(), ServiceError> {
        let username = self.authenticate(token).await?;
        let mut games = self.games.write().await;
        let record = games
            .get_game_mut(id)
            .ok_or_else(|| ServiceError::BadRequest(format!("game {id} does not exist")))?;

        if record.seat(color).is_some_and(|holder| holder != username) {
            return Err(ServiceError::AlreadyTaken);
        }
        *record.seat_mut(color) = Some(username.clone());
        info!(game_id = id, username = %username, color = %color, "player seated");
        Ok(())
    }

    /// Give up whatever seat the caller holds in game `id`. Returns the
    /// caller's username.
    pub async fn leave(&self, token: &str, id: u32) -> Result<String, ServiceError> {
        let username = self.authenticate(token).await?;
        let mut games = self.games.write().await;
        let record = games
            .get_game_mut(id)
            .ok_or(ServiceError::GameNotFound(id))?;
        for color in [Color::White, Color::Black] {
            let seat = record.seat_mut(color);
            if seat.as_deref() == Some(username.as_str()) {
                *seat = None;
                info!(game_id = id, username = %username, color = %color, "seat freed");
            }
        }
        Ok(username)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Snapshot of game `id`.
    pub async fn get_game(&self, id: u32) -> Result<GameRecord, ServiceError> {
        self.games
            .read()
            .await
            .get_game(id)
            .cloned()
            .ok_or(ServiceError::GameNotFound(id))
    }

    /// Legal moves of the piece on `from`, with the board they were
    /// computed on. Both come from one read of the game.
    pub async fn legal_moves(&self, id: u32, from: Position) -> Result<LegalMoves, ServiceError> {
        let games = self.games.read().await;
        let record = games.get_game(id).ok_or(ServiceError::GameNotFound(id))?;
        Ok(LegalMoves {
            from,
            moves: record.game.valid_moves(from),
            board: record.game.board().clone(),
        })
    }

    /// Resolve the caller's role in game `id` and return a snapshot of it.
    pub async fn connect(
        &self,
        token: &str,
        id: u32,
    ) -> Result<(String, Role, GameRecord), ServiceError> {
        let username = self.authenticate(token).await?;
        let record = self.get_game(id).await?;
        let role = match record.color_of(&username) {
            Some(color) => Role::Player(color),
            None => Role::Observer,
        };
        Ok((username, role, record))
    }

    // -----------------------------------------------------------------------
    // Play
    // -----------------------------------------------------------------------

    /// Play `mv` in game `id` on behalf of the caller.
    pub async fn play_move(
        &self,
        token: &str,
        id: u32,
        mv: Move,
    ) -> Result<MoveOutcome, ServiceError> {
        let username = self.authenticate(token).await?;
        let mut games = self.games.write().await;
        let mut record = games
            .get_game(id)
            .cloned()
            .ok_or(ServiceError::GameNotFound(id))?;

        if record.finished {
            return Err(ServiceError::GameOver);
        }
        let turn = record.game.team_turn();
        if record.seat(turn) != Some(username.as_str()) {
            return Err(match record.color_of(&username) {
                Some(_) => ServiceError::NotYourTurn,
                None => ServiceError::NotAPlayer,
            });
        }

        if let Err(e) = record.game.make_move(mv) {
            let reason = e.invalid_move_reason().map_or("invalid", |r| r.code());
            debug!(game_id = id, username = %username, mv = %mv, reason, "move rejected");
            return Err(e.into());
        }

        record.move_count += 1;
        let opponent_color = !turn;
        let opponent_status = record.game.status_of(opponent_color);
        if opponent_status.is_game_over() {
            record.finished = true;
            info!(game_id = id, status = opponent_status.as_str(), "game finished");
        }
        games.update_game(id, record.clone())?;
        drop(games);

        debug!(game_id = id, username = %username, mv = %mv, "move played");
        Ok(MoveOutcome {
            game_id: id,
            opponent: record.seat(opponent_color).map(str::to_string),
            username,
            color: turn,
            mv,
            opponent_status,
            record,
        })
    }

    /// Concede game `id`. Returns the caller's username.
    pub async fn resign(&self, token: &str, id: u32) -> Result<String, ServiceError> {
        let username = self.authenticate(token).await?;
        let mut games = self.games.write().await;
        let record = games
            .get_game_mut(id)
            .ok_or(ServiceError::GameNotFound(id))?;
        if record.color_of(&username).is_none() {
            return Err(ServiceError::NotAPlayer);
        }
        if record.finished {
            return Err(ServiceError::GameOver);
        }
        record.finished = true;
        info!(game_id = id, username = %username, "player resigned");
        Ok(username)
    }

    // -----------------------------------------------------------------------
    // Admin
    // -----------------------------------------------------------------------

    /// Drop every account, session and game.
    pub async fn clear(&self) {
        self.users.write().await.clear();
        self.sessions.write().await.clear();
        self.games.write().await.clear();
        info!("all state cleared");
    }

    pub async fn game_count(&self) -> usize {
        self.games.read().await.len()
    }
}

// ---------------------------------------------------------------------------
// Password hashing
// ---------------------------------------------------------------------------

// bcrypt is CPU-bound; keep it off the async workers.
async fn hash_password(password: &str, cost: u32) -> Result<String, ServiceError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ServiceError::Internal(format!("hash task failed: {e}")))?
        .map_err(|e| ServiceError::Internal(format!("password hashing failed: {e}")))
}

async fn verify_password(password: &str, hash: String) -> Result<bool, ServiceError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ServiceError::Internal(format!("verify task failed: {e}")))?
        .map_err(|e| ServiceError::Internal(format!("password check failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ChessError, GameStatus, InvalidMoveReason};

    fn mv(s: &str) -> Move {
        Move::from_coordinates(s).unwrap()
    }

    fn service() -> Arc<GameService> {
        GameService::new(4) // bcrypt MIN_COST (private in bcrypt 0.17)
    }

    /// Register `name` (password "pw-<name>") and return the session token.
    async fn user(svc: &GameService, name: &str) -> String {
        svc.register(name, &format!("pw-{name}"), &format!("{name}@example.com"))
            .await
            .unwrap()
            .auth_token
    }

    /// Service with one game, alice as White and bob as Black.
    async fn seated() -> (Arc<GameService>, u32, String, String) {
        let svc = service();
        let alice = user(&svc, "alice").await;
        let bob = user(&svc, "bob").await;
        let id = svc.create_game(&alice, "test").await.unwrap();
        svc.join_game(&alice, id, Color::White).await.unwrap();
        svc.join_game(&bob, id, Color::Black).await.unwrap();
        (svc, id, alice, bob)
    }

    #[tokio::test]
    async fn register_requires_every_field() {
        let svc = service();
        for (name, pw, email) in [("  ", "pw", "a@b"), ("a", "", "a@b"), ("a", "pw", "")] {
            assert!(matches!(
                svc.register(name, pw, email).await,
                Err(ServiceError::BadRequest(_))
            ));
        }
        assert!(matches!(
            svc.login("", "pw").await,
            Err(ServiceError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_registration_is_taken() {
        let svc = service();
        user(&svc, "alice").await;
        assert_eq!(
            svc.register("alice", "other", "x@example.com").await,
            Err(ServiceError::AlreadyTaken)
        );
    }

    #[tokio::test]
    async fn login_checks_password() {
        let svc = service();
        user(&svc, "alice").await;
        assert_eq!(
            svc.login("alice", "wrong").await,
            Err(ServiceError::Unauthorized)
        );
        assert_eq!(
            svc.login("mallory", "pw-mallory").await,
            Err(ServiceError::Unauthorized)
        );
        let session = svc.login("alice", "pw-alice").await.unwrap();
        assert_eq!(svc.authenticate(&session.auth_token).await.unwrap(), "alice");
    }

    #[tokio::test]
    async fn password_is_stored_hashed() {
        let svc = service();
        user(&svc, "alice").await;
        let users = svc.users.read().await;
        let stored = &users.get_user("alice").unwrap().password_hash;
        assert_ne!(stored, "pw-alice");
        assert!(bcrypt::verify("pw-alice", stored).unwrap());
    }

    #[tokio::test]
    async fn logout_invalidates_token() {
        let svc = service();
        let token = user(&svc, "carol").await;
        assert_eq!(svc.authenticate(&token).await.unwrap(), "carol");
        svc.logout(&token).await.unwrap();
        assert_eq!(
            svc.authenticate(&token).await,
            Err(ServiceError::Unauthorized)
        );
        assert_eq!(svc.logout(&token).await, Err(ServiceError::Unauthorized));
    }

    #[tokio::test]
    async fn create_and_list_games() {
        let svc = service();
        let token = user(&svc, "alice").await;
        assert_eq!(
            svc.create_game("bogus", "x").await,
            Err(ServiceError::Unauthorized)
        );
        assert!(matches!(
            svc.create_game(&token, "").await,
            Err(ServiceError::BadRequest(_))
        ));
        let a = svc.create_game(&token, "one").await.unwrap();
        let b = svc.create_game(&token, "two").await.unwrap();
        let games = svc.list_games(&token).await.unwrap();
        assert_eq!(games.iter().map(|g| g.id).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(games[0].name, "one");
        assert!(!games[0].finished);
    }

    #[tokio::test]
    async fn seats_cannot_be_stolen() {
        let (svc, id, alice, bob) = seated().await;
        assert_eq!(
            svc.join_game(&bob, id, Color::White).await,
            Err(ServiceError::AlreadyTaken)
        );
        // Re-joining your own seat is fine.
        svc.join_game(&alice, id, Color::White).await.unwrap();
        let record = svc.get_game(id).await.unwrap();
        assert_eq!(record.white_username.as_deref(), Some("alice"));
        assert_eq!(record.black_username.as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn join_missing_game_is_bad_request() {
        let svc = service();
        let token = user(&svc, "alice").await;
        assert!(matches!(
            svc.join_game(&token, 99, Color::White).await,
            Err(ServiceError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn players_alternate() {
        let (svc, id, alice, bob) = seated().await;
        let outcome = svc.play_move(&alice, id, mv("e2e4")).await.unwrap();
        assert_eq!(outcome.username, "alice");
        assert_eq!(outcome.color, Color::White);
        assert_eq!(outcome.opponent.as_deref(), Some("bob"));
        assert_eq!(outcome.opponent_status, GameStatus::Active);
        assert_eq!(outcome.game().team_turn(), Color::Black);

        assert_eq!(
            svc.play_move(&alice, id, mv("d2d4")).await.unwrap_err(),
            ServiceError::NotYourTurn
        );
        let outcome = svc.play_move(&bob, id, mv("e7e5")).await.unwrap();
        assert_eq!(outcome.record.move_count, 2);
    }

    #[tokio::test]
    async fn observers_cannot_move_or_resign() {
        let (svc, id, _, _) = seated().await;
        let eve = user(&svc, "eve").await;
        assert_eq!(
            svc.play_move(&eve, id, mv("e2e4")).await.unwrap_err(),
            ServiceError::NotAPlayer
        );
        assert_eq!(
            svc.resign(&eve, id).await.unwrap_err(),
            ServiceError::NotAPlayer
        );
    }

    #[tokio::test]
    async fn illegal_move_leaves_game_untouched() {
        let (svc, id, alice, _) = seated().await;
        let before = svc.get_game(id).await.unwrap();
        let err = svc.play_move(&alice, id, mv("e2e5")).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidMove(ChessError::InvalidMove {
                reason: InvalidMoveReason::IllegalDestination,
                ..
            })
        ));
        assert_eq!(svc.get_game(id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn checkmate_finishes_game() {
        let (svc, id, alice, bob) = seated().await;
        svc.play_move(&alice, id, mv("f2f3")).await.unwrap();
        svc.play_move(&bob, id, mv("e7e5")).await.unwrap();
        svc.play_move(&alice, id, mv("g2g4")).await.unwrap();
        let outcome = svc.play_move(&bob, id, mv("d8h4")).await.unwrap();
        assert_eq!(outcome.opponent_status, GameStatus::Checkmate);
        assert!(outcome.record.finished);
        assert_eq!(
            svc.play_move(&alice, id, mv("a2a3")).await.unwrap_err(),
            ServiceError::GameOver
        );
    }

    #[tokio::test]
    async fn resign_finishes_once() {
        let (svc, id, alice, _) = seated().await;
        assert_eq!(svc.resign(&alice, id).await.unwrap(), "alice");
        assert!(svc.get_game(id).await.unwrap().finished);
        assert_eq!(
            svc.resign(&alice, id).await.unwrap_err(),
            ServiceError::GameOver
        );
    }

    #[tokio::test]
    async fn leave_frees_seat() {
        let (svc, id, alice, _) = seated().await;
        svc.leave(&alice, id).await.unwrap();
        let record = svc.get_game(id).await.unwrap();
        assert_eq!(record.white_username, None);
        let carol = user(&svc, "carol").await;
        svc.join_game(&carol, id, Color::White).await.unwrap();
    }

    #[tokio::test]
    async fn connect_resolves_role() {
        let (svc, id, alice, bob) = seated().await;
        let eve = user(&svc, "eve").await;
        assert_eq!(
            svc.connect(&alice, id).await.unwrap().1,
            Role::Player(Color::White)
        );
        assert_eq!(
            svc.connect(&bob, id).await.unwrap().1,
            Role::Player(Color::Black)
        );
        assert_eq!(svc.connect(&eve, id).await.unwrap().1, Role::Observer);
        assert_eq!(
            svc.connect(&eve, 42).await.unwrap_err(),
            ServiceError::GameNotFound(42)
        );
    }

    #[tokio::test]
    async fn legal_moves_query() {
        let (svc, id, _, _) = seated().await;
        let e2 = Position::from_algebraic("e2").unwrap();
        let e4 = Position::from_algebraic("e4").unwrap();
        let found = svc.legal_moves(id, e2).await.unwrap();
        assert_eq!(found.moves.map(|m| m.len()), Some(2));
        assert_eq!(svc.legal_moves(id, e4).await.unwrap().moves, None);
    }

    #[tokio::test]
    async fn legal_moves_come_with_their_board() {
        let (svc, id, alice, _) = seated().await;
        svc.play_move(&alice, id, mv("e2e4")).await.unwrap();
        let e7 = Position::from_algebraic("e7").unwrap();
        let found = svc.legal_moves(id, e7).await.unwrap();
        let record = svc.get_game(id).await.unwrap();
        assert_eq!(found.board, *record.game.board());
        assert_eq!(found.from, e7);
        assert_eq!(found.moves.map(|m| m.len()), Some(2));
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let (svc, _, alice, _) = seated().await;
        svc.clear().await;
        assert_eq!(svc.game_count().await, 0);
        assert_eq!(
            svc.authenticate(&alice).await,
            Err(ServiceError::Unauthorized)
        );
        assert_eq!(
            svc.login("alice", "pw-alice").await,
            Err(ServiceError::Unauthorized)
        );
    }
}
