use crokinole_shared::body::PlayerId;

/// Domain-level errors for turn and scoring workflows.
///
/// All of these are recoverable within the current game. Invalid actions are
/// rejected at the point of detection; there is no retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulesError {
    /// A release or action attempted out of turn or on a non-active piece.
    InvalidTurnAction,
    /// The player whose turn is starting has no pieces left to place.
    NoPiecesRemaining(PlayerId),
    /// A collision pair was already counted within the current settle window.
    DuplicateScoreContact,
}

impl std::fmt::Display for RulesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RulesError::InvalidTurnAction => write!(f, "action is not valid in the current turn"),
            RulesError::NoPiecesRemaining(player) => {
                write!(f, "player {} has no pieces remaining", player)
            }
            RulesError::DuplicateScoreContact => {
                write!(f, "collision pair already counted in this settle window")
            }
        }
    }
}

impl std::error::Error for RulesError {}
