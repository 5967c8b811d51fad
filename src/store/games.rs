use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::engine::{Color, Game};

/// A stored match: the engine state plus who sits where.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: u32,
    pub name: String,
    pub white_username: Option<String>,
    pub black_username: Option<String>,
    pub game: Game,
    /// Plies played so far. Live events carry it so clients can order them.
    #[serde(default)]
    pub move_count: u32,
    /// Set once the game ends by checkmate, stalemate or resignation.
    pub finished: bool,
    pub created_at: DateTime<Utc>,
}

impl GameRecord {
    /// Username holding `color`'s seat.
    pub fn seat(&self, color: Color) -> Option<&str> {
        match color {
            Color::White => self.white_username.as_deref(),
            Color::Black => self.black_username.as_deref(),
        }
    }

    /// Mutable access to `color`'s seat.
    pub fn seat_mut(&mut self, color: Color) -> &mut Option<String> {
        match color {
            Color::White => &mut self.white_username,
            Color::Black => &mut self.black_username,
        }
    }

    /// Colour `username` plays, or `None` for an observer. White wins if
    /// the same user holds both seats.
    pub fn color_of(&self, username: &str) -> Option<Color> {
        [Color::White, Color::Black]
            .into_iter()
            .find(|&c| self.seat(c) == Some(username))
    }
}

/// Games keyed by a sequential id starting at 1.
#[derive(Debug)]
pub struct GameStore {
    games: HashMap<u32, GameRecord>,
    next_id: u32,
}

impl GameStore {
    pub fn new() -> Self {
        Self {
            games: HashMap::new(),
            next_id: 1,
        }
    }

    /// Create a game with a fresh board and no players.
    pub fn insert_game(&mut self, name: &str) -> &GameRecord {
        let id = self.next_id;
        self.next_id += 1;
        let record = GameRecord {
            id,
            name: name.to_string(),
            white_username: None,
            black_username: None,
            game: Game::new(),
            move_count: 0,
            finished: false,
            created_at: Utc::now(),
        };
        self.games.entry(id).or_insert(record)
    }

    pub fn get_game(&self, id: u32) -> Option<&GameRecord> {
        self.games.get(&id)
    }

    pub fn get_game_mut(&mut self, id: u32) -> Option<&mut GameRecord> {
        self.games.get_mut(&id)
    }

    /// All games, ordered by id.
    pub fn list_games(&self) -> Vec<&GameRecord> {
        let mut games: Vec<&GameRecord> = self.games.values().collect();
        games.sort_by_key(|g| g.id);
        games
    }

    /// Replace an existing record.
    pub fn update_game(&mut self, id: u32, record: GameRecord) -> Result<(), StoreError> {
        let slot = self
            .games
            .get_mut(&id)
            .ok_or(StoreError::GameNotFound(id))?;
        *slot = record;
        Ok(())
    }

    /// Drop every game and restart ids at 1.
    pub fn clear(&mut self) {
        self.games.clear();
        self.next_id = 1;
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

impl Default for GameStore {
    fn default() -> Self {
        Self::new()
    }
}
