use crate::classify::{Classifier, CollisionPhase, Contact};
use crate::config::EngineConfig;
use crate::error::RulesError;
use crate::player::PlayerRegistry;
use crate::score::ScoreAggregator;
use crate::turn::{Phase, TurnMachine};
use crate::validator::{self, RemovalQueue};
use crokinole_shared::body::{PieceId, PlayerId};
use crokinole_shared::protocol::{
    AddBodyMsg, CollisionMsg, GameMsg, GameStartedMsg, NoPiecesMsg, NoticeMsg, PlayerWire,
    PlayersStateMsg, RemoveBodyMsg, ScoreChangedMsg, Severity, WorldCmd, PROTOCOL_VERSION,
};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, HashSet};

/// Side effects produced by a state transition. The caller performs them;
/// the state layer itself never does I/O.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Command for the physics world.
    Command(WorldCmd),
    /// Notification for the presentation layer.
    Broadcast(GameMsg),
}

/// Board-lifecycle status of a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceStatus {
    /// In the rack, not yet in the physics world.
    Waiting,
    /// On the board, not yet settled.
    InFlight,
    /// On the board and at rest.
    Settled,
    /// Pulled from the board.
    Removed,
}

/// A piece record: ownership and status for a physics-world handle.
#[derive(Debug, Clone, Copy)]
pub struct Piece {
    pub owner: PlayerId,
    pub status: PieceStatus,
}

/// Central game state owned by the game loop task.
pub struct GameState {
    config: EngineConfig,
    registry: PlayerRegistry,
    pieces: BTreeMap<PieceId, Piece>,
    classifier: Classifier,
    turn: TurnMachine,
    removals: RemovalQueue,
    scores: ScoreAggregator,
    /// Contacts observed during the current settle window, in arrival order.
    settle_log: Vec<Contact>,
    /// Pieces that touched the boundary during the window.
    off_board: HashSet<PieceId>,
    rng: ChaCha8Rng,
    next_piece_id: u32,
}

impl GameState {
    pub fn new(config: EngineConfig) -> Self {
        use rand::SeedableRng;
        let rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        let classifier = Classifier::new(&config.rules);
        let turn = TurnMachine::new(config.rules.settle_debounce);

        Self {
            config,
            registry: PlayerRegistry::new(),
            pieces: BTreeMap::new(),
            classifier,
            turn,
            removals: RemovalQueue::new(),
            scores: ScoreAggregator::new(),
            settle_log: Vec::new(),
            off_board: HashSet::new(),
            rng,
            next_piece_id: 1,
        }
    }

    /// Start (or restart) a game: clear the board, cancel pending removals,
    /// deal fresh racks and draw the first player uniformly at random.
    pub fn start_game(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();

        // The previous game dies here, scheduled removals included.
        self.removals.clear();
        self.scores.reset();
        self.classifier.begin_window();
        self.settle_log.clear();
        self.off_board.clear();
        for (piece, record) in &self.pieces {
            if matches!(record.status, PieceStatus::InFlight | PieceStatus::Settled) {
                effects.push(Effect::Command(WorldCmd::RemoveBody(RemoveBodyMsg {
                    piece: *piece,
                })));
            }
        }
        self.pieces.clear();
        self.registry.reset();
        self.turn.reset();

        // Deal fresh racks.
        self.next_piece_id = 1;
        for owner in [PlayerId::P1, PlayerId::P2] {
            for _ in 0..self.config.rules.pieces_per_player {
                let piece = PieceId(self.next_piece_id);
                self.next_piece_id += 1;
                self.pieces.insert(
                    piece,
                    Piece {
                        owner,
                        status: PieceStatus::Waiting,
                    },
                );
                self.registry.get_mut(owner).rack.push_back(piece);
            }
        }

        // Uniform draw between the two players.
        let first = if self.rng.gen::<bool>() {
            PlayerId::P1
        } else {
            PlayerId::P2
        };
        self.registry.set_initial_turn(first);
        tracing::info!(player = %first, "game started");

        effects.push(Effect::Broadcast(GameMsg::GameStarted(GameStartedMsg {
            protocol_version: PROTOCOL_VERSION,
            config: self.config.rules,
            players: self.player_wires(),
        })));
        effects.extend(self.spawn_active_piece());
        effects
    }

    /// A collision pair began touching. Re-arms the quiescence window.
    pub fn collision_start(&mut self, msg: &CollisionMsg) -> Vec<Effect> {
        if self.turn.phase() != Phase::PieceInPlay {
            return Vec::new();
        }
        self.turn.rearm();
        self.record(CollisionPhase::Start, msg);
        Vec::new()
    }

    /// A collision pair is still touching this physics tick.
    pub fn collision_active(&mut self, msg: &CollisionMsg) -> Vec<Effect> {
        if self.turn.phase() != Phase::PieceInPlay {
            return Vec::new();
        }
        self.record(CollisionPhase::Active, msg);
        Vec::new()
    }

    /// A collision pair separated.
    pub fn collision_end(&mut self, msg: &CollisionMsg) -> Vec<Effect> {
        if self.turn.phase() != Phase::PieceInPlay {
            return Vec::new();
        }
        self.record(CollisionPhase::End, msg);
        Vec::new()
    }

    /// The active piece was dragged and let go. Releases by the non-active
    /// player or of a non-active piece are rejected as no-ops.
    pub fn drag_end(&mut self, piece: PieceId) -> Vec<Effect> {
        match self.turn.piece_released(piece) {
            Ok(()) => {
                self.classifier.begin_window();
                self.settle_log.clear();
                self.off_board.clear();
                tracing::debug!(piece = piece.0, "piece released");
            }
            Err(err) => {
                // Rejected silently toward the physics world.
                tracing::debug!(piece = piece.0, "release rejected: {}", err);
            }
        }
        Vec::new()
    }

    /// Rename a player. Names appear in turn notices.
    pub fn set_player_name(&mut self, player: PlayerId, name: String) -> Vec<Effect> {
        self.registry.get_mut(player).name = name;
        vec![self.players_state()]
    }

    /// Manual score correction from the presentation layer. The only path
    /// by which a score may decrease.
    pub fn adjust_score(&mut self, player: PlayerId, delta: i32) -> Vec<Effect> {
        let record = self.registry.get_mut(player);
        record.score += delta;
        let new_score = record.score;
        tracing::info!(player = %player, delta, "manual score correction");
        vec![Effect::Broadcast(GameMsg::ScoreChanged(ScoreChangedMsg {
            player,
            new_score,
        }))]
    }

    /// Advance time: count down scheduled removals and the settle window.
    pub fn tick(&mut self, dt: f64) -> Vec<Effect> {
        let mut effects = Vec::new();
        for piece in self.removals.tick(dt) {
            effects.extend(self.remove_piece(piece));
        }
        if self.turn.tick(dt) {
            effects.extend(self.resolve_turn());
        }
        effects
    }

    pub fn phase(&self) -> Phase {
        self.turn.phase()
    }

    pub fn active_piece(&self) -> Option<PieceId> {
        self.turn.active_piece()
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    pub fn piece_status(&self, piece: PieceId) -> Option<PieceStatus> {
        self.pieces.get(&piece).map(|record| record.status)
    }

    pub fn pending_removals(&self) -> usize {
        self.removals.len()
    }

    fn record(&mut self, phase: CollisionPhase, msg: &CollisionMsg) {
        match self.classifier.observe(phase, msg) {
            Ok(Some(contact)) => {
                if let Contact::Boundary { piece } = contact {
                    self.off_board.insert(piece);
                }
                self.settle_log.push(contact);
            }
            Ok(None) => {}
            Err(err) => tracing::trace!("{}", err),
        }
    }

    /// The settle window closed: judge the move, apply scores, hand over
    /// the turn.
    fn resolve_turn(&mut self) -> Vec<Effect> {
        self.turn.begin_resolution();
        let mut effects = Vec::new();
        let rules = self.config.rules;
        let log = std::mem::take(&mut self.settle_log);
        let mut off_board: Vec<PieceId> = std::mem::take(&mut self.off_board).into_iter().collect();
        off_board.sort();

        // Move validity: the released piece must not strike its own side
        // first.
        if let Some(released) = self.turn.active_piece() {
            let pieces = &self.pieces;
            let verdict = validator::validate(
                released,
                &log,
                |p| pieces.get(&p).map(|record| record.owner),
                self.registry.pieces_on_board(),
            );
            if !verdict.legal {
                if let Some(piece) = verdict.piece_to_remove {
                    self.removals.schedule(piece, rules.removal_grace);
                    let name = self.owner_name(piece);
                    tracing::info!(piece = piece.0, "illegal move: struck own piece first");
                    effects.push(notice(
                        format!("{} must strike an opponent's piece first", name),
                        Severity::Warn,
                    ));
                }
            }
        }

        // Scratches: off the board, pulled like an illegal piece.
        for piece in off_board {
            let gone = self
                .pieces
                .get(&piece)
                .map_or(true, |record| record.status == PieceStatus::Removed);
            if gone || self.removals.is_pending(piece) {
                continue;
            }
            self.removals.schedule(piece, rules.removal_grace);
            let name = self.owner_name(piece);
            tracing::info!(piece = piece.0, "scratch: piece off the board");
            effects.push(notice(
                format!("{} scratched: piece off the board", name),
                Severity::Warn,
            ));
        }

        // Scores apply only now, never mid-settle.
        let pieces = &self.pieces;
        let removals = &self.removals;
        let deltas = self.scores.resolve(
            &rules,
            &log,
            |p| pieces.get(&p).map(|record| record.owner),
            |p| {
                removals.is_pending(p)
                    || pieces
                        .get(&p)
                        .map_or(true, |record| record.status == PieceStatus::Removed)
            },
        );
        for (player, delta) in deltas {
            let record = self.registry.get_mut(player);
            record.score += delta as i32;
            let new_score = record.score;
            tracing::info!(player = %player, delta, new_score, "scored");
            effects.push(Effect::Broadcast(GameMsg::ScoreChanged(ScoreChangedMsg {
                player,
                new_score,
            })));
        }

        // The released piece has come to rest unless it is being pulled.
        if let Some(released) = self.turn.active_piece() {
            if !self.removals.is_pending(released) {
                if let Some(record) = self.pieces.get_mut(&released) {
                    if record.status == PieceStatus::InFlight {
                        record.status = PieceStatus::Settled;
                    }
                }
            }
        }

        // Hand over the turn.
        if self.registry.switch_turn().is_some() {
            effects.extend(self.spawn_active_piece());
        }
        effects
    }

    /// Move the active player's next piece from the rack onto the board.
    /// With an empty rack the turn still starts, and the gap is signalled
    /// explicitly rather than ignored.
    fn spawn_active_piece(&mut self) -> Vec<Effect> {
        let Some(active) = self.registry.active() else {
            return Vec::new();
        };
        let mut effects = Vec::new();
        let player = self.registry.get_mut(active);
        let name = player.name.clone();
        match player.rack.pop_front() {
            Some(piece) => {
                player.on_board.insert(piece);
                if let Some(record) = self.pieces.get_mut(&piece) {
                    record.status = PieceStatus::InFlight;
                }
                self.turn.begin_turn(Some(piece));
                tracing::info!(player = %active, piece = piece.0, "turn started");
                effects.push(Effect::Command(WorldCmd::AddBody(AddBodyMsg {
                    piece,
                    owner: active,
                })));
                effects.push(notice(
                    format!("It is now {}'s turn", name),
                    Severity::Info,
                ));
            }
            None => {
                self.turn.begin_turn(None);
                let err = RulesError::NoPiecesRemaining(active);
                tracing::warn!(player = %active, "{}", err);
                effects.push(notice(
                    format!("It is now {}'s turn", name),
                    Severity::Info,
                ));
                effects.push(Effect::Broadcast(GameMsg::NoPiecesRemaining(NoPiecesMsg {
                    player: active,
                })));
                effects.push(notice(
                    format!("{} has no pieces remaining", name),
                    Severity::Warn,
                ));
            }
        }
        effects.push(self.players_state());
        effects
    }

    /// Pull a piece whose grace delay elapsed. Idempotent.
    fn remove_piece(&mut self, piece: PieceId) -> Vec<Effect> {
        let Some(record) = self.pieces.get_mut(&piece) else {
            return Vec::new();
        };
        if record.status == PieceStatus::Removed {
            return Vec::new();
        }
        record.status = PieceStatus::Removed;
        let owner = record.owner;
        self.registry.get_mut(owner).on_board.remove(&piece);
        self.scores.forget(piece);
        tracing::info!(piece = piece.0, player = %owner, "piece removed from board");
        vec![
            Effect::Command(WorldCmd::RemoveBody(RemoveBodyMsg { piece })),
            self.players_state(),
        ]
    }

    fn owner_name(&self, piece: PieceId) -> String {
        self.pieces
            .get(&piece)
            .map(|record| self.registry.get(record.owner).name.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn player_wires(&self) -> Vec<PlayerWire> {
        [PlayerId::P1, PlayerId::P2]
            .into_iter()
            .map(|id| {
                let player = self.registry.get(id);
                PlayerWire {
                    id,
                    name: player.name.clone(),
                    turn: player.turn,
                    score: player.score,
                    pieces_remaining: player.rack.len() as u32,
                    pieces_on_board: player.on_board.len() as u32,
                }
            })
            .collect()
    }

    fn players_state(&self) -> Effect {
        Effect::Broadcast(GameMsg::PlayersState(PlayersStateMsg {
            players: self.player_wires(),
        }))
    }
}

fn notice(message: String, severity: Severity) -> Effect {
    Effect::Broadcast(GameMsg::Notice(NoticeMsg { message, severity }))
}
