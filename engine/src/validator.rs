use crate::classify::Contact;
use crokinole_shared::body::{PieceId, PlayerId};

/// Outcome of validating a released piece against the settle window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub legal: bool,
    /// Piece to pull from the board when the move was illegal.
    pub piece_to_remove: Option<PieceId>,
}

impl Verdict {
    fn legal() -> Self {
        Self {
            legal: true,
            piece_to_remove: None,
        }
    }

    fn illegal(piece: PieceId) -> Self {
        Self {
            legal: false,
            piece_to_remove: Some(piece),
        }
    }
}

/// Validate a released piece against the contacts observed while settling.
///
/// The released piece's first meaningful contact (zone, peg and boundary
/// contacts are not meaningful) must not be a piece owned by the shooter.
/// With fewer than two pieces on the board there is nothing to strike and
/// the rule does not apply.
pub fn validate(
    released: PieceId,
    contacts: &[Contact],
    owner_of: impl Fn(PieceId) -> Option<PlayerId>,
    pieces_on_board: usize,
) -> Verdict {
    if pieces_on_board < 2 {
        return Verdict::legal();
    }
    let Some(shooter) = owner_of(released) else {
        return Verdict::legal();
    };

    for contact in contacts {
        let other = match *contact {
            Contact::Pieces { a, b } if a == released => b,
            Contact::Pieces { a, b } if b == released => a,
            _ => continue,
        };
        return if owner_of(other) == Some(shooter) {
            Verdict::illegal(released)
        } else {
            Verdict::legal()
        };
    }

    Verdict::legal()
}

/// A removal counting down to its deadline.
#[derive(Debug, Clone)]
struct PendingRemoval {
    piece: PieceId,
    /// Time remaining before the piece is pulled (seconds)
    delay: f64,
}

/// Grace-delayed piece removals. Scheduling is idempotent and every pending
/// removal can be cancelled when the game resets.
#[derive(Debug, Default)]
pub struct RemovalQueue {
    pending: Vec<PendingRemoval>,
}

impl RemovalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `piece` for removal after `grace` seconds. Scheduling an
    /// already-pending piece is a no-op.
    pub fn schedule(&mut self, piece: PieceId, grace: f64) {
        if self.is_pending(piece) {
            return;
        }
        self.pending.push(PendingRemoval {
            piece,
            delay: grace,
        });
    }

    pub fn is_pending(&self, piece: PieceId) -> bool {
        self.pending.iter().any(|p| p.piece == piece)
    }

    /// Drop a single scheduled removal, e.g. when the piece was removed
    /// through another path.
    pub fn cancel(&mut self, piece: PieceId) {
        self.pending.retain(|p| p.piece != piece);
    }

    /// Drop every scheduled removal.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Advance time and return the pieces whose grace delay has elapsed.
    pub fn tick(&mut self, dt: f64) -> Vec<PieceId> {
        for removal in &mut self.pending {
            removal.delay -= dt;
        }
        let due: Vec<PieceId> = self
            .pending
            .iter()
            .filter(|p| p.delay <= 0.0)
            .map(|p| p.piece)
            .collect();
        self.pending.retain(|p| p.delay > 0.0);
        due
    }
}
