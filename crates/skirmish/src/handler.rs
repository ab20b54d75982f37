//! Per-connection handler: the phase machine between login and game over.
//!
//! Each accepted connection gets its own task running this handler. The
//! flow is:
//!   1. Version handshake (symmetric, bounded by the handshake timeout)
//!   2. AwaitingLogin — only `LoginRequest` is accepted
//!   3. Idle — host, join, or echo
//!   4. AwaitingGame — wait for the last seat to fill, or leave
//!   5. InGame — exchange incremental syncs until someone wins, leaves,
//!      or breaks the rules
//!
//! The handler adjusts the protocol entity's tag filters on every phase
//! change, so out-of-phase messages are rejected before their payload is
//! even decoded.

use std::sync::Arc;

use skirmish_engine::Move;
use skirmish_protocol::{
    perform_version_handshake, Event, JoinError, LoginResult, Message, MessageTag,
    ProtocolEntity, JOIN_ANY,
};
use skirmish_session::{GameId, GameSession, SessionError};
use skirmish_transport::{MessageTransport, POLL_INTERVAL};
use tokio::net::TcpStream;

use crate::server::{ServerState, ServerStatus};
use crate::ServerError;

enum Phase {
    AwaitingLogin,
    Idle,
    AwaitingGame { session: Arc<GameSession> },
    InGame { session: Arc<GameSession>, synced: u32 },
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    state: Arc<ServerState>,
) -> Result<(), ServerError> {
    let mut transport = MessageTransport::new(stream);
    let peer_version =
        perform_version_handshake(&mut transport, state.config.handshake_timeout).await?;
    tracing::debug!(%peer_version, "peer handshake complete");

    let entity = ProtocolEntity::new(transport, state.config.idle_timeout);
    let mut connection = Connection {
        state,
        entity,
        username: None,
        phase: Phase::AwaitingLogin,
    };
    connection.set_phase(Phase::AwaitingLogin);
    connection.run().await;
    connection.cleanup();
    Ok(())
}

struct Connection {
    state: Arc<ServerState>,
    entity: ProtocolEntity,
    username: Option<String>,
    phase: Phase,
}

impl Connection {
    async fn run(&mut self) {
        while self.entity.is_running() {
            if self.state.status() == ServerStatus::FastShutdown {
                self.refuse_and_halt("server is shutting down".to_string());
                break;
            }

            for event in self.entity.poll() {
                match event {
                    // A halt earlier in the batch drops the rest of it.
                    Event::Message(message) if self.entity.is_running() => {
                        self.dispatch(message)
                    }
                    Event::Message(_) => {}
                    Event::ProtocolError(e) => {
                        tracing::warn!(user = ?self.username, error = %e, "protocol violation");
                        self.refuse_and_halt(format!("protocol violation: {e}"));
                    }
                    Event::Disconnected => {
                        tracing::debug!(user = ?self.username, "peer disconnected");
                    }
                    Event::TimedOut => {
                        tracing::debug!(user = ?self.username, "connection idled out");
                    }
                }
            }

            self.pump_game_sync();
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Routes one permitted message. The phase filters guarantee a
    /// message's tag fits the current phase, so each handler only checks
    /// its own preconditions.
    fn dispatch(&mut self, message: Message) {
        match message {
            Message::LoginRequest { username } => self.on_login(username),
            Message::HostGame { map } => self.on_host(map),
            Message::JoinGame { game_id } => self.on_join(game_id),
            Message::LeaveGame => self.on_leave(),
            Message::GameIncrementalSync { moves, .. } => self.on_moves(moves),
            Message::Echo { text } => self.entity.send(&Message::Echo { text }),
            other => {
                tracing::debug!(tag = ?other.tag(), "ignoring message");
            }
        }
    }

    fn on_login(&mut self, username: String) {
        if self.state.status() != ServerStatus::Running {
            self.refuse_and_halt("server is shutting down, logins disabled".to_string());
            return;
        }
        if username.is_empty() {
            // "AlreadyLoggedIn" would be a lie here; name the real problem
            // and let the client try again.
            self.entity.send(&Message::Alert {
                text: "a username must not be empty".to_string(),
            });
            return;
        }
        if self.state.users.login(&username) {
            tracing::info!(user = %username, "logged in");
            self.username = Some(username);
            self.entity.send(&Message::LoginResponse {
                result: LoginResult::Ok,
            });
            self.set_phase(Phase::Idle);
        } else {
            self.entity.send(&Message::LoginResponse {
                result: LoginResult::AlreadyLoggedIn,
            });
        }
    }

    fn on_host(&mut self, map: String) {
        let Some(user) = self.username.clone() else {
            return;
        };
        if self.state.status() != ServerStatus::Running {
            self.entity.send(&Message::GameJoinError {
                reason: JoinError::ServerShuttingDown,
            });
            return;
        }
        match self.state.sessions.host_game(&user, &map) {
            Ok((game_id, session)) => {
                self.entity.send(&Message::HostGameAck { game_id: game_id.0 });
                self.set_phase(Phase::AwaitingGame { session });
            }
            Err(e) => {
                tracing::debug!(user = %user, error = %e, "host refused");
                self.entity.send(&Message::GameJoinError {
                    reason: join_error(&e),
                });
            }
        }
    }

    fn on_join(&mut self, game_id: u64) {
        let Some(user) = self.username.clone() else {
            return;
        };
        if self.state.status() != ServerStatus::Running {
            self.entity.send(&Message::GameJoinError {
                reason: JoinError::ServerShuttingDown,
            });
            return;
        }
        let result = if game_id == JOIN_ANY {
            self.state.sessions.join_any(&user).map(|(_, session)| session)
        } else {
            self.state.sessions.join_game(&user, GameId(game_id))
        };
        match result {
            Ok(session) => {
                // A successful join is acknowledged with the no-error
                // reason; the full sync follows once the game starts.
                self.entity.send(&Message::GameJoinError {
                    reason: JoinError::NoError,
                });
                self.set_phase(Phase::AwaitingGame { session });
            }
            Err(e) => {
                tracing::debug!(user = %user, error = %e, "join refused");
                self.entity.send(&Message::GameJoinError {
                    reason: join_error(&e),
                });
            }
        }
    }

    fn on_leave(&mut self) {
        let Some(user) = self.username.clone() else {
            return;
        };
        match self.state.sessions.leave_game(&user) {
            Ok(game_id) => tracing::info!(user = %user, id = %game_id, "left game"),
            Err(e) => tracing::debug!(user = %user, error = %e, "leave failed"),
        }
        self.set_phase(Phase::Idle);
    }

    /// Applies moves received from the client. Any rejected move is a
    /// protocol violation: the client is expected to validate locally
    /// against the same authoritative rules.
    fn on_moves(&mut self, moves: Vec<Move>) {
        let Phase::InGame { session, .. } = &self.phase else {
            return;
        };
        let session = Arc::clone(session);
        let Some(user) = self.username.clone() else {
            return;
        };
        for mv in &moves {
            if let Err(e) = session.apply_move(self.state.sessions.catalog(), &user, mv) {
                tracing::warn!(user = %user, error = %e, "invalid move");
                self.refuse_and_halt(format!("invalid move: {e}"));
                return;
            }
        }
    }

    /// Phase work that is driven by time rather than by a message: the
    /// full sync when a game starts, and incremental syncs of the move
    /// log suffix this connection has not seen yet.
    fn pump_game_sync(&mut self) {
        if let Phase::AwaitingGame { session } = &self.phase {
            if !session.is_ready() {
                return;
            }
            let session = Arc::clone(session);
            // The snapshot and the count it reflects must come from one
            // lock acquisition: a move applied between separate reads
            // would be marked synced without ever reaching this client.
            if let Ok((snapshot, count)) = session.snapshot_with_move_count() {
                self.entity.send(&Message::GameFullSync { snapshot });
                self.set_phase(Phase::InGame {
                    session,
                    synced: count,
                });
            }
            return;
        }

        if let Phase::InGame { session, synced } = &mut self.phase {
            let Ok(moves) = session.moves_since(*synced) else {
                return;
            };
            if moves.is_empty() {
                return;
            }
            // Advance by what was actually fetched. A count read in a
            // separate lock window could lag the fetch and re-echo the
            // tail moves on the next poll.
            let first_move_index = *synced;
            *synced += moves.len() as u32;
            self.entity.send(&Message::GameIncrementalSync {
                first_move_index,
                moves,
            });
        }
    }

    /// Enters a phase and installs its message filters.
    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        match &self.phase {
            Phase::AwaitingLogin => {
                self.entity.permit_only([MessageTag::LoginRequest]);
                self.entity.forbid([MessageTag::Version]);
            }
            Phase::Idle => {
                self.entity.permit_only([
                    MessageTag::HostGame,
                    MessageTag::JoinGame,
                    MessageTag::Echo,
                ]);
                self.entity
                    .forbid([MessageTag::Version, MessageTag::LoginRequest]);
            }
            Phase::AwaitingGame { .. } => {
                self.entity
                    .permit_only([MessageTag::LeaveGame, MessageTag::Echo]);
                self.entity
                    .forbid([MessageTag::Version, MessageTag::LoginRequest]);
            }
            Phase::InGame { .. } => {
                self.entity.permit_only([
                    MessageTag::GameIncrementalSync,
                    MessageTag::LeaveGame,
                    MessageTag::Echo,
                ]);
                self.entity
                    .forbid([MessageTag::Version, MessageTag::LoginRequest]);
            }
        }
    }

    /// Sends a farewell alert, gives it one flush, and halts.
    fn refuse_and_halt(&mut self, text: String) {
        self.entity.send(&Message::Alert { text });
        let _ = self.entity.flush();
        self.entity.halt();
    }

    /// Implicit leave and logout when the connection ends for any reason.
    fn cleanup(&mut self) {
        if let Some(user) = self.username.take() {
            if let Ok(game_id) = self.state.sessions.leave_game(&user) {
                tracing::debug!(user = %user, id = %game_id, "implicit leave on close");
            }
            self.state.users.logout(&user);
            tracing::info!(user = %user, "logged out");
        }
    }
}

fn join_error(e: &SessionError) -> JoinError {
    match e {
        SessionError::ServerFull => JoinError::ServerFull,
        SessionError::GameDoesntExist(_) | SessionError::UnknownMap(_) => {
            JoinError::GameDoesntExist
        }
        SessionError::GameAlreadyRunning(_) => JoinError::GameAlreadyRunning,
        _ => JoinError::Other,
    }
}
