//! The session manager: every hosted game, who is in it, and which
//! games still have free seats.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use rand::Rng;
use skirmish_engine::{ContentCatalog, Game, MapId};

use crate::session::{GameId, GameSession};
use crate::SessionError;

struct GameEntry {
    session: Arc<GameSession>,
    map: MapId,
    /// Seats are assigned in join order.
    players: Vec<String>,
    started: bool,
}

#[derive(Default)]
struct ManagerInner {
    games: HashMap<GameId, GameEntry>,
    player_games: HashMap<String, GameId>,
    /// Games still gathering players, in id order.
    joinable: BTreeSet<GameId>,
    next_id: u64,
}

/// Owns all game sessions on the server.
///
/// The manager's coarse lock guards the bookkeeping maps and is only held
/// for short, in-memory operations. The game inside each session has its
/// own fine lock, so moves in different games never contend. Lock order
/// is always coarse before fine.
pub struct SessionManager {
    catalog: Arc<ContentCatalog>,
    max_games: usize,
    inner: Mutex<ManagerInner>,
}

impl SessionManager {
    pub fn new(catalog: Arc<ContentCatalog>, max_games: usize) -> Self {
        Self {
            catalog,
            max_games,
            inner: Mutex::new(ManagerInner {
                next_id: 1, // 0 is the "join any" wire sentinel
                ..ManagerInner::default()
            }),
        }
    }

    pub fn catalog(&self) -> &ContentCatalog {
        &self.catalog
    }

    /// Opens a new game on the named map with `username` in the first
    /// seat. Single-seat maps start immediately.
    pub fn host_game(
        &self,
        username: &str,
        map: &str,
    ) -> Result<(GameId, Arc<GameSession>), SessionError> {
        let map_id = self
            .catalog
            .map_by_stable_id(map)
            .map(|(id, _)| id)
            .ok_or_else(|| SessionError::UnknownMap(map.to_string()))?;
        let mut inner = self.lock();
        self.host_locked(&mut inner, username, map_id)
    }

    /// Seats `username` in an existing game. When the last seat fills,
    /// the game is constructed and started before the call returns.
    pub fn join_game(
        &self,
        username: &str,
        game_id: GameId,
    ) -> Result<Arc<GameSession>, SessionError> {
        let mut inner = self.lock();
        self.seat_player(&mut inner, username, game_id)
    }

    /// Seats `username` in any game with a free seat, hosting a fresh one
    /// on a randomly chosen map when none is waiting.
    pub fn join_any(&self, username: &str) -> Result<(GameId, Arc<GameSession>), SessionError> {
        let mut inner = self.lock();
        if let Some(&game_id) = inner.joinable.iter().next() {
            let session = self.seat_player(&mut inner, username, game_id)?;
            return Ok((game_id, session));
        }

        let maps: Vec<MapId> = self.catalog.maps().map(|(id, _)| id).collect();
        if maps.is_empty() {
            return Err(SessionError::UnknownMap(String::new()));
        }
        let map_id = maps[rand::rng().random_range(0..maps.len())];
        self.host_locked(&mut inner, username, map_id)
    }

    /// Removes `username` from their game. A game with nobody left in it
    /// is deleted.
    pub fn leave_game(&self, username: &str) -> Result<GameId, SessionError> {
        let mut inner = self.lock();
        let game_id = inner
            .player_games
            .remove(username)
            .ok_or(SessionError::NotInGame)?;
        if let Some(entry) = inner.games.get_mut(&game_id) {
            entry.players.retain(|name| name != username);
            if entry.players.is_empty() {
                inner.games.remove(&game_id);
                inner.joinable.remove(&game_id);
                tracing::info!(id = %game_id, "game deleted, no players left");
            }
        }
        tracing::info!(id = %game_id, player = username, "player left game");
        Ok(game_id)
    }

    /// The game `username` is currently seated in, if any.
    pub fn find_game_of(&self, username: &str) -> Option<(GameId, Arc<GameSession>)> {
        let inner = self.lock();
        let game_id = *inner.player_games.get(username)?;
        let entry = inner.games.get(&game_id)?;
        Some((game_id, Arc::clone(&entry.session)))
    }

    pub fn session(&self, game_id: GameId) -> Option<Arc<GameSession>> {
        let inner = self.lock();
        inner.games.get(&game_id).map(|e| Arc::clone(&e.session))
    }

    /// Seated players of a game, in seat order.
    pub fn players_in(&self, game_id: GameId) -> Option<Vec<String>> {
        let inner = self.lock();
        inner.games.get(&game_id).map(|e| e.players.clone())
    }

    pub fn game_count(&self) -> usize {
        self.lock().games.len()
    }

    // -----------------------------------------------------------------------

    fn host_locked(
        &self,
        inner: &mut ManagerInner,
        username: &str,
        map_id: MapId,
    ) -> Result<(GameId, Arc<GameSession>), SessionError> {
        if inner.player_games.contains_key(username) {
            return Err(SessionError::AlreadyInGame);
        }
        if inner.games.len() >= self.max_games {
            return Err(SessionError::ServerFull);
        }

        let game_id = GameId(inner.next_id);
        inner.next_id += 1;
        let session = Arc::new(GameSession::new(game_id));
        inner.games.insert(
            game_id,
            GameEntry {
                session: Arc::clone(&session),
                map: map_id,
                players: Vec::new(),
                started: false,
            },
        );
        inner.joinable.insert(game_id);
        tracing::info!(id = %game_id, host = username, "game hosted");

        // Seating the host may start a single-seat game outright. If it
        // fails, the freshly created entry must not linger empty.
        if let Err(e) = self.seat_player(inner, username, game_id) {
            inner.games.remove(&game_id);
            inner.joinable.remove(&game_id);
            return Err(e);
        }
        Ok((game_id, session))
    }

    fn seat_player(
        &self,
        inner: &mut ManagerInner,
        username: &str,
        game_id: GameId,
    ) -> Result<Arc<GameSession>, SessionError> {
        if inner.player_games.contains_key(username) {
            return Err(SessionError::AlreadyInGame);
        }
        let entry = inner
            .games
            .get(&game_id)
            .ok_or(SessionError::GameDoesntExist(game_id))?;
        if entry.started {
            return Err(SessionError::GameAlreadyRunning(game_id));
        }
        let template = self
            .catalog
            .map(entry.map)
            .ok_or(SessionError::GameDoesntExist(game_id))?;

        // Build the full roster first: if this seat completes the game,
        // construct it before committing anything.
        let mut roster = entry.players.clone();
        roster.push(username.to_string());
        let starting = roster.len() as u32 == template.player_count();
        let game = if starting {
            Some(Game::new(&self.catalog, template, roster.clone())?)
        } else {
            None
        };

        let entry = inner
            .games
            .get_mut(&game_id)
            .ok_or(SessionError::GameDoesntExist(game_id))?;
        entry.players = roster;
        let session = Arc::clone(&entry.session);
        if let Some(game) = game {
            entry.started = true;
            inner.joinable.remove(&game_id);
            session.start(game);
        }
        inner
            .player_games
            .insert(username.to_string(), game_id);
        tracing::info!(id = %game_id, player = username, "player seated");
        Ok(session)
    }

    fn lock(&self) -> MutexGuard<'_, ManagerInner> {
        self.inner.lock().expect("session manager lock poisoned")
    }
}

// =========================================================================
// Tests
// =========================================================================
