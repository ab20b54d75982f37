//! One game session: the authoritative game plus its move log.

use std::fmt;
use std::sync::Mutex;

use skirmish_engine::{ContentCatalog, Game, GameSnapshot, Move};

use crate::SessionError;

/// Server-wide identifier of a game session. Id `0` is reserved on the
/// wire as the "join any" sentinel, so real ids start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

/// The started portion of a session: the game and every move accepted so
/// far, in order.
#[derive(Debug)]
struct MatchState {
    game: Game,
    move_log: Vec<Move>,
}

/// One hosted game, shared between the connections seated in it.
///
/// Until all seats are filled the session holds no game; the manager
/// starts it with [`GameSession::start`] when the last player joins. The
/// inner mutex is the per-session fine lock: it is only ever taken for
/// short, in-memory operations, never across I/O.
#[derive(Debug)]
pub struct GameSession {
    id: GameId,
    state: Mutex<Option<MatchState>>,
}

impl GameSession {
    pub(crate) fn new(id: GameId) -> Self {
        Self {
            id,
            state: Mutex::new(None),
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    /// `true` once the game has started.
    pub fn is_ready(&self) -> bool {
        self.lock().is_some()
    }

    pub(crate) fn start(&self, game: Game) {
        let mut state = self.lock();
        debug_assert!(state.is_none(), "a session starts exactly once");
        *state = Some(MatchState {
            game,
            move_log: Vec::new(),
        });
        tracing::info!(id = %self.id, "game started");
    }

    /// Validates and applies one move on behalf of `username`.
    ///
    /// On success the move is appended to the log and its index returned;
    /// on any error the game and the log are untouched.
    pub fn apply_move(
        &self,
        catalog: &ContentCatalog,
        username: &str,
        mv: &Move,
    ) -> Result<u32, SessionError> {
        let mut state = self.lock();
        let state = state.as_mut().ok_or(SessionError::NotReady)?;
        let seat = state
            .game
            .player_names()
            .iter()
            .position(|name| name == username)
            .ok_or(SessionError::NotSeated)?;
        if state.game.current_player() != seat as u32 {
            return Err(SessionError::NotYourTurn);
        }
        state.game.make_move(catalog, mv)?;
        state.move_log.push(mv.clone());
        Ok(state.move_log.len() as u32 - 1)
    }

    /// The accepted moves from `first_index` on, for incremental sync.
    pub fn moves_since(&self, first_index: u32) -> Result<Vec<Move>, SessionError> {
        let state = self.lock();
        let state = state.as_ref().ok_or(SessionError::NotReady)?;
        let start = (first_index as usize).min(state.move_log.len());
        Ok(state.move_log[start..].to_vec())
    }

    /// Number of moves accepted so far.
    pub fn move_count(&self) -> Result<u32, SessionError> {
        let state = self.lock();
        let state = state.as_ref().ok_or(SessionError::NotReady)?;
        Ok(state.move_log.len() as u32)
    }

    /// A full snapshot of the current game state.
    pub fn snapshot(&self) -> Result<GameSnapshot, SessionError> {
        let state = self.lock();
        let state = state.as_ref().ok_or(SessionError::NotReady)?;
        Ok(state.game.snapshot())
    }

    /// A snapshot together with the move count it reflects, read under a
    /// single lock acquisition.
    ///
    /// A full sync must pair these atomically: a move applied between two
    /// separate reads would be counted as synced but missing from the
    /// snapshot, leaving the receiver permanently behind.
    pub fn snapshot_with_move_count(&self) -> Result<(GameSnapshot, u32), SessionError> {
        let state = self.lock();
        let state = state.as_ref().ok_or(SessionError::NotReady)?;
        Ok((state.game.snapshot(), state.move_log.len() as u32))
    }

    /// The winning seat's username, if the game is decided.
    pub fn winner(&self) -> Result<Option<String>, SessionError> {
        let state = self.lock();
        let state = state.as_ref().ok_or(SessionError::NotReady)?;
        Ok(state
            .winner_seat()
            .map(|seat| state.game.player_names()[seat as usize].clone()))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<MatchState>> {
        self.state.lock().expect("session lock poisoned")
    }
}

impl MatchState {
    fn winner_seat(&self) -> Option<u32> {
        self.game.winner()
    }
}
