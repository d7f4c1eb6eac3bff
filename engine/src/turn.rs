use crate::error::RulesError;
use crokinole_shared::body::PieceId;

/// Lifecycle phase of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No game started.
    Idle,
    /// Active player may aim and release their piece.
    PlayerTurnStart,
    /// Piece released, physics settling.
    PieceInPlay,
    /// Scoring and validity being computed.
    TurnResolution,
}

/// Turn state machine: owns the phase, the active piece and the quiescence
/// window that decides when a shot has settled.
#[derive(Debug)]
pub struct TurnMachine {
    phase: Phase,
    active_piece: Option<PieceId>,
    /// Seconds of quiet left before the settle window closes.
    quiescence: f64,
    settle_debounce: f64,
}

impl TurnMachine {
    pub fn new(settle_debounce: f64) -> Self {
        Self {
            phase: Phase::Idle,
            active_piece: None,
            quiescence: 0.0,
            settle_debounce,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn active_piece(&self) -> Option<PieceId> {
        self.active_piece
    }

    /// Back to `Idle`, dropping the active piece.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.active_piece = None;
        self.quiescence = 0.0;
    }

    /// Enter `PlayerTurnStart` with the given piece. `None` when the player
    /// has no pieces left: the turn still happens, nothing can be released.
    pub fn begin_turn(&mut self, piece: Option<PieceId>) {
        self.phase = Phase::PlayerTurnStart;
        self.active_piece = piece;
        self.quiescence = 0.0;
    }

    /// Handle a drag release. Valid only for the active piece while the
    /// turn awaits a release; anything else is an invalid turn action.
    pub fn piece_released(&mut self, piece: PieceId) -> Result<(), RulesError> {
        if self.phase != Phase::PlayerTurnStart || self.active_piece != Some(piece) {
            return Err(RulesError::InvalidTurnAction);
        }
        self.phase = Phase::PieceInPlay;
        self.quiescence = self.settle_debounce;
        Ok(())
    }

    /// A new collision start re-arms the quiescence window.
    pub fn rearm(&mut self) {
        if self.phase == Phase::PieceInPlay {
            self.quiescence = self.settle_debounce;
        }
    }

    /// Advance time. Returns true when the settle window just closed and the
    /// turn must be resolved.
    pub fn tick(&mut self, dt: f64) -> bool {
        if self.phase != Phase::PieceInPlay {
            return false;
        }
        self.quiescence -= dt;
        self.quiescence <= 0.0
    }

    /// Mark resolution in progress.
    pub fn begin_resolution(&mut self) {
        self.phase = Phase::TurnResolution;
    }
}
