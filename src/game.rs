//! Core room logic and state management
//!
//! This module contains the main game struct and logic for running the
//! shared trivia room: admitting and removing players, the question
//! lifecycle, guess evaluation and scoring, game-master rotation, and the
//! append-only log of everything broadcast to the room.
//!
//! The room is sans-IO. Inbound transport events arrive through
//! [`Game::receive_message`] and [`Game::remove_player`], timed events
//! arrive through [`Game::receive_alarm`], and outbound notifications leave
//! through [`Tunnel`]s located by a `tunnel_finder` closure. Everything is
//! applied synchronously to one `&mut Game`; the crate spawns no threads
//! and holds no locks.

use std::{fmt::Debug, time::Duration};

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use web_time::SystemTime;

use super::{
    AlarmMessage,
    clock::{self, Clock, Tick, validate_duration},
    constants::{answer_text, player_name, question_text, round},
    names,
    player::{Id, Player, Roster},
    question::Question,
    session::Tunnel,
};

/// Represents the current phase of the room
///
/// The room alternates between waiting for a question and running a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum State {
    /// No round is active; a question may be posed
    #[display("waiting")]
    Waiting,
    /// A question is pending an answer or timeout
    #[display("in progress")]
    InProgress,
}

/// Configuration options for the room
///
/// These options affect round timing and scoring. The defaults match a
/// classic room: sixty-second rounds, ten points per correct guess.
#[serde_with::serde_as]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct Options {
    /// Length of a round before the question expires
    #[garde(custom(validate_duration::<{ round::MIN_DURATION_SECONDS }, { round::MAX_DURATION_SECONDS }>))]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub round_duration: Duration,
    /// Points awarded for a correct guess
    #[garde(skip)]
    pub points_awarded: u64,
}

impl Default for Options {
    /// Sixty-second rounds, ten points per correct guess
    fn default() -> Self {
        Self {
            round_duration: Duration::from_secs(round::DEFAULT_DURATION_SECONDS),
            points_awarded: round::DEFAULT_POINTS_AWARDED,
        }
    }
}

/// Messages received from connected clients
///
/// This enum categorizes the inbound events the transport maps onto room
/// operations. Disconnects are connection-level and arrive through
/// [`Game::remove_player`] instead.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum IncomingMessage {
    /// Request to join the room
    Join(#[garde(dive)] JoinRequest),
    /// Request to pose a question and open a round
    CreateQuestion(#[garde(dive)] CreateQuestionRequest),
    /// A guess at the active question
    GuessAnswer(#[garde(dive)] GuessRequest),
}

/// Payload of a join request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct JoinRequest {
    /// Requested display name
    #[garde(length(chars, max = player_name::MAX_LENGTH))]
    pub name: String,
}

/// Payload of a create-question request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    /// The question text to broadcast
    #[garde(length(chars, min = 1, max = question_text::MAX_LENGTH))]
    pub question: String,
    /// The expected answer
    #[garde(length(chars, min = 1, max = answer_text::MAX_LENGTH))]
    pub answer: String,
}

/// Payload of a guess
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GuessRequest {
    /// The guessed answer
    #[garde(length(chars, max = answer_text::MAX_LENGTH))]
    pub answer: String,
}

/// Payload of a `player_joined` notification
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct JoinData {
    /// The player who was admitted
    pub player: Player,
    /// The current game master (the new player themselves when they are
    /// the first to join)
    pub game_master: Option<Player>,
}

/// Notifications broadcast to connected clients
///
/// Serialized as `{ "name": ..., "message": ..., ... }` with snake_case
/// wire names; `message` is always a human-readable rendering, and
/// variant-specific fields carry the machine-readable data.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum UpdateMessage {
    /// A question was posed and a round opened
    QuestionCreated {
        /// Human-readable rendering with the question text
        message: String,
    },
    /// Per-second countdown tick
    Time {
        /// Human-readable rendering of the remaining time
        message: String,
        /// Seconds remaining before the question expires
        seconds_left: u64,
    },
    /// The round ran out of time
    TimeExpired {
        /// Human-readable rendering revealing the answer
        message: String,
    },
    /// A new game master was chosen
    NewGameMaster {
        /// Human-readable rendering with the chosen player's name
        message: String,
        /// Full roster snapshot in join order
        data: Vec<Player>,
    },
    /// A player submitted a guess
    Guess {
        /// Human-readable rendering of the guess
        message: String,
        /// Whether the guess matched the answer
        is_answer: bool,
    },
    /// A player was admitted to the room
    PlayerJoined {
        /// Human-readable rendering with the player's name
        message: String,
        /// The admitted player and the current game master
        data: JoinData,
    },
    /// A join attempt was rejected
    JoinError {
        /// Why the join was rejected
        message: String,
    },
    /// Informational broadcast, used for the scoreboard
    GeneralMessage {
        /// The broadcast text
        message: String,
    },
    /// A malformed payload was rejected at the transport boundary
    BadRequest {
        /// Why the payload was rejected
        message: String,
    },
}

impl UpdateMessage {
    /// Converts the notification to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// One entry of the room's append-only notification log
///
/// The log records every emitted notification in emission order, stamped at
/// creation. It exists for audit and replay; correctness never depends on
/// it.
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    /// When the notification was emitted
    pub at: SystemTime,
    /// The notification itself
    pub message: UpdateMessage,
}

/// The shared trivia room
///
/// One `Game` is constructed per process and lives for the process
/// lifetime. It owns the roster, the current question, the countdown
/// clock, and the notification log, and exposes the operations that
/// transport events are mapped onto.
pub struct Game {
    /// Players in join order, indexed by connection id
    roster: Roster,
    /// The current question; kept as "last asked" after a round ends
    question: Option<Question>,
    /// Current phase of the room
    state: State,
    /// Connection id of the current game master, if any
    game_master: Option<Id>,
    /// The countdown driving round expiration
    clock: Clock,
    /// Append-only log of every emitted notification
    events: Vec<EventRecord>,
    /// Round timing and scoring options
    options: Options,
    /// Random source for game-master selection, seedable for tests
    rng: fastrand::Rng,
}

impl Debug for Game {
    /// Custom debug implementation that avoids printing the whole roster
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("state", &self.state)
            .field("players", &self.roster.len())
            .finish_non_exhaustive()
    }
}

impl Default for Game {
    /// A room with default options and an OS-seeded random source
    fn default() -> Self {
        Self::new(Options::default())
    }
}

// Convenience methods
impl Game {
    /// Appends a notification to the log and delivers it to every player
    fn broadcast<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        message: UpdateMessage,
        tunnel_finder: F,
    ) {
        self.events.push(EventRecord {
            at: SystemTime::now(),
            message: message.clone(),
        });
        self.roster.announce(&message, tunnel_finder);
    }

    /// Appends a notification to the log and delivers it to one connection
    ///
    /// Used for rejections addressed to connections that may not be in the
    /// roster.
    fn send_to<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        id: Id,
        message: UpdateMessage,
        tunnel_finder: F,
    ) {
        self.events.push(EventRecord {
            at: SystemTime::now(),
            message: message.clone(),
        });
        self.roster.send_to(&message, id, tunnel_finder);
    }
}

impl Game {
    /// Creates a new room with the provided options
    ///
    /// # Examples
    ///
    /// ```rust
    /// use quizroom::game::{Game, Options};
    ///
    /// let game = Game::new(Options::default());
    /// assert_eq!(game.seconds_left(), 60);
    /// ```
    pub fn new(options: Options) -> Self {
        Self {
            roster: Roster::default(),
            question: None,
            state: State::Waiting,
            game_master: None,
            clock: Clock::new(options.round_duration),
            events: Vec::new(),
            options,
            rng: fastrand::Rng::new(),
        }
    }

    /// Creates a new room with a seeded random source
    ///
    /// Game-master selection is the only randomized decision, so a seeded
    /// room behaves deterministically.
    pub fn with_seed(options: Options, seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            ..Self::new(options)
        }
    }

    /// Current phase of the room
    pub fn state(&self) -> State {
        self.state
    }

    /// Seconds remaining in the active round, or the full round duration
    /// while waiting
    pub fn seconds_left(&self) -> u64 {
        self.clock.seconds_left()
    }

    /// The current game master, if any
    pub fn game_master(&self) -> Option<&Player> {
        self.game_master.and_then(|id| self.roster.get(id))
    }

    /// The current question; after a round ends this is the last one asked
    pub fn current_question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    /// Players in join order
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.roster.players()
    }

    /// Looks up a player by connection id
    pub fn player(&self, id: Id) -> Option<&Player> {
        self.roster.get(id)
    }

    /// The append-only log of every emitted notification, in emission order
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    // Operations

    /// Handles incoming messages from connected clients
    ///
    /// This is the transport entry point. Payloads are validated first; a
    /// malformed payload produces a `bad_request` notification to the
    /// sender and is never dispatched. Valid messages are routed to the
    /// corresponding operation.
    ///
    /// # Arguments
    ///
    /// * `sender` - Connection id of the client the message came from
    /// * `message` - The incoming message to process
    /// * `schedule_message` - Function to schedule delayed alarm delivery
    /// * `tunnel_finder` - Function to find tunnels for connections
    pub fn receive_message<
        T: Tunnel,
        F: Fn(Id) -> Option<T>,
        S: FnMut(AlarmMessage, Duration),
    >(
        &mut self,
        sender: Id,
        message: IncomingMessage,
        schedule_message: S,
        tunnel_finder: F,
    ) {
        log::debug!("handling {message:?} from {sender}");

        if let Err(report) = message.validate() {
            log::debug!("rejecting malformed payload from {sender}: {report}");
            self.send_to(
                sender,
                UpdateMessage::BadRequest {
                    message: report.to_string(),
                },
                tunnel_finder,
            );
            return;
        }

        match message {
            IncomingMessage::Join(JoinRequest { name }) => self.join(sender, &name, tunnel_finder),
            IncomingMessage::CreateQuestion(CreateQuestionRequest { question, answer }) => {
                self.create_question(&question, &answer, schedule_message, tunnel_finder);
            }
            IncomingMessage::GuessAnswer(GuessRequest { answer }) => {
                self.guess_answer(sender, &answer, tunnel_finder);
            }
        }
    }

    /// Admits a player to the room
    ///
    /// Validation gates the add: a join during an active round or with an
    /// invalid name is rejected with a `join_error` sent to the requesting
    /// connection only, and no player is created. On success the player is
    /// appended in join order, takes the game-master role if nobody holds
    /// it, and a `player_joined` notification is broadcast.
    pub fn join<T: Tunnel, F: Fn(Id) -> Option<T>>(&mut self, id: Id, name: &str, tunnel_finder: F) {
        if matches!(self.state, State::InProgress) {
            let seconds_left = self.clock.seconds_left();
            log::debug!("join rejected, round in progress with {seconds_left}s left");
            self.send_to(
                id,
                UpdateMessage::JoinError {
                    message: format!(
                        "a round is in progress, try again in {seconds_left} seconds"
                    ),
                },
                tunnel_finder,
            );
            return;
        }

        let name = match names::clean_name(name) {
            Ok(name) => name,
            Err(error) => {
                log::debug!("join rejected: {error}");
                self.send_to(
                    id,
                    UpdateMessage::JoinError {
                        message: error.to_string(),
                    },
                    tunnel_finder,
                );
                return;
            }
        };

        if let Err(error) = self.roster.add(Player::new(id, name.clone())) {
            log::warn!("join rejected for {id}: {error}");
            self.send_to(
                id,
                UpdateMessage::JoinError {
                    message: error.to_string(),
                },
                tunnel_finder,
            );
            return;
        }

        if self.game_master.is_none() {
            if let Some(player) = self.roster.get_mut(id) {
                player.set_game_master(true);
            }
            self.game_master = Some(id);
        }

        log::info!("{name} joined as {id}");

        let Some(player) = self.roster.get(id).cloned() else {
            return;
        };
        let game_master = self
            .game_master
            .and_then(|master| self.roster.get(master))
            .cloned();
        self.broadcast(
            UpdateMessage::PlayerJoined {
                message: format!("{name} just joined"),
                data: JoinData {
                    player,
                    game_master,
                },
            },
            tunnel_finder,
        );
    }

    /// Removes a disconnected player from the room
    ///
    /// If the departing player held the game-master role, a replacement is
    /// chosen immediately from the remaining roster; an emptied room leaves
    /// the role unset.
    pub fn remove_player<T: Tunnel, F: Fn(Id) -> Option<T>>(&mut self, id: Id, tunnel_finder: F) {
        let Some(player) = self.roster.remove(id) else {
            return;
        };
        log::info!("{} left the room", player.name());

        if player.is_game_master() {
            self.game_master = None;
            self.assign_game_master(true, tunnel_finder);
        }
    }

    /// Poses a question and opens a round
    ///
    /// A no-op while a round is already in progress, preventing overlapping
    /// rounds. Otherwise stores the question, broadcasts `question_created`,
    /// starts the countdown, and schedules the first tick alarm.
    pub fn create_question<T: Tunnel, F: Fn(Id) -> Option<T>, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        text: &str,
        answer: &str,
        mut schedule_message: S,
        tunnel_finder: F,
    ) {
        if matches!(self.state, State::InProgress) {
            log::debug!("ignoring question while a round is active");
            return;
        }

        // The state gate means the clock cannot be running here; a failed
        // start indicates a broken invariant and leaves the room untouched.
        let round = match self.clock.start() {
            Ok(round) => round,
            Err(error) => {
                log::error!("countdown failed to start: {error}");
                return;
            }
        };

        let question = Question::new(text, answer);
        self.broadcast(
            UpdateMessage::QuestionCreated {
                message: format!("Question: {}", question.text()),
            },
            tunnel_finder,
        );
        self.question = Some(question);
        self.state = State::InProgress;
        log::info!("round {round} started");

        schedule_message(
            clock::AlarmMessage::Tick { round }.into(),
            clock::TICK_INTERVAL,
        );
    }

    /// Evaluates a guess at the active question
    ///
    /// A no-op while no round is active; guesses from connections without a
    /// player are ignored. A mismatch is broadcast with `is_answer = false`
    /// and changes nothing. A match is broadcast with `is_answer = true`,
    /// awards the configured points to the guesser, stops the countdown,
    /// returns the room to waiting, and rotates the game-master role.
    pub fn guess_answer<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        id: Id,
        guess: &str,
        tunnel_finder: F,
    ) {
        if matches!(self.state, State::Waiting) {
            log::debug!("ignoring guess while no round is active");
            return;
        }

        let Some(name) = self.roster.get(id).map(|p| p.name().to_owned()) else {
            log::warn!("ignoring guess from unknown connection {id}");
            return;
        };

        let is_answer = self
            .question
            .as_ref()
            .is_some_and(|question| question.accepts(guess));

        if !is_answer {
            self.broadcast(
                UpdateMessage::Guess {
                    message: format!("{name} guessed {guess}"),
                    is_answer,
                },
                tunnel_finder,
            );
            return;
        }

        let points = self.options.points_awarded;
        self.broadcast(
            UpdateMessage::Guess {
                message: format!("{name} answered correctly, {points} points awarded"),
                is_answer,
            },
            &tunnel_finder,
        );
        if let Some(player) = self.roster.get_mut(id) {
            player.award(points);
        }
        self.clock.stop();
        self.state = State::Waiting;
        log::info!("round won by {name}");
        self.assign_game_master(false, &tunnel_finder);
    }

    /// Chooses a new game master uniformly at random from the roster
    ///
    /// Unless this is a retry-style reassignment (after a disconnect), the
    /// scoreboard is broadcast first. The previous holder's flag is cleared
    /// either way. An empty roster leaves the role unset and broadcasts
    /// nothing; there is deliberately no retry loop.
    pub fn assign_game_master<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        retry: bool,
        tunnel_finder: F,
    ) {
        if !retry {
            self.emit_scores(&tunnel_finder);
        }

        self.roster.clear_game_master();
        self.game_master = None;

        let Some(chosen) = self.roster.pick_random(&mut self.rng) else {
            log::debug!("no players left to take the game-master role");
            return;
        };
        if let Some(player) = self.roster.get_mut(chosen) {
            player.set_game_master(true);
        }
        self.game_master = Some(chosen);

        let Some(master) = self.roster.get(chosen).cloned() else {
            return;
        };
        log::info!("{} is the new game master", master.name());
        self.broadcast(
            UpdateMessage::NewGameMaster {
                message: format!("{} is the new game master", master.name()),
                data: self.roster.snapshot(),
            },
            tunnel_finder,
        );
    }

    /// Broadcasts the scoreboard as a single `general_message`
    ///
    /// Lists `name: score` per player in join order.
    pub fn emit_scores<T: Tunnel, F: Fn(Id) -> Option<T>>(&mut self, tunnel_finder: F) {
        let scores = self
            .roster
            .players()
            .map(|player| format!("{}: {}", player.name(), player.score()))
            .join("\n");
        self.broadcast(
            UpdateMessage::GeneralMessage {
                message: format!("Scoreboard:\n{scores}"),
            },
            tunnel_finder,
        );
    }

    /// Handles scheduled alarm messages for timed room events
    ///
    /// Each delivered tick either continues the countdown (broadcasting a
    /// `time` notification and scheduling the next tick), expires the round
    /// (broadcasting the final tick, `time_expired` with the revealed
    /// answer, and rotating the game master), or is discarded as stale
    /// because its round was already won or superseded.
    pub fn receive_alarm<T: Tunnel, F: Fn(Id) -> Option<T>, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        message: AlarmMessage,
        mut schedule_message: S,
        tunnel_finder: F,
    ) {
        match message {
            AlarmMessage::Clock(clock::AlarmMessage::Tick { round }) => {
                match self.clock.tick(round) {
                    Tick::Stale => {
                        log::debug!("discarding tick for finished round {round}");
                    }
                    Tick::Running { seconds_left } => {
                        self.broadcast(
                            UpdateMessage::Time {
                                message: format!("{seconds_left} seconds left"),
                                seconds_left,
                            },
                            tunnel_finder,
                        );
                        schedule_message(
                            clock::AlarmMessage::Tick { round }.into(),
                            clock::TICK_INTERVAL,
                        );
                    }
                    Tick::Expired => {
                        self.broadcast(
                            UpdateMessage::Time {
                                message: "0 seconds left".to_owned(),
                                seconds_left: 0,
                            },
                            &tunnel_finder,
                        );
                        let answer = self
                            .question
                            .as_ref()
                            .map(|question| question.answer().to_owned())
                            .unwrap_or_default();
                        self.broadcast(
                            UpdateMessage::TimeExpired {
                                message: format!("Time is up! The answer was {answer}"),
                            },
                            &tunnel_finder,
                        );
                        self.state = State::Waiting;
                        log::info!("round {round} expired");
                        self.assign_game_master(false, &tunnel_finder);
                    }
                }
            }
        }
    }
}
