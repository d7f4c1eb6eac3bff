use crate::error::RulesError;
use crokinole_shared::body::{BodyTag, PieceId, Ring};
use crokinole_shared::config::RulesConfig;
use crokinole_shared::protocol::CollisionMsg;
use crokinole_shared::vec2;
use std::collections::HashSet;

/// Which physics notification delivered a collision pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionPhase {
    Start,
    Active,
    End,
}

/// A semantic contact derived from a raw collision pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// A piece resting in a scoring ring.
    Zone { piece: PieceId, ring: Ring },
    /// Two pieces striking each other.
    Pieces { a: PieceId, b: PieceId },
    /// A piece touching the table boundary, i.e. off the board.
    Boundary { piece: PieceId },
}

/// Classifies raw collision pairs into semantic contacts.
///
/// Contacts are deduplicated by pair identity within one settle window:
/// repeated `collision_active` notifications for the same pair count once.
pub struct Classifier {
    stillness_threshold: f64,
    center_capture_radius: f64,
    seen: HashSet<(BodyTag, BodyTag)>,
}

impl Classifier {
    pub fn new(config: &RulesConfig) -> Self {
        Self {
            stillness_threshold: config.stillness_threshold,
            center_capture_radius: config.center_capture_radius,
            seen: HashSet::new(),
        }
    }

    /// Open a fresh settle window, forgetting every pair seen so far.
    pub fn begin_window(&mut self) {
        self.seen.clear();
    }

    /// Classify a pair without recording it.
    pub fn classify(&self, phase: CollisionPhase, msg: &CollisionMsg) -> Option<Contact> {
        let piece_a = msg.a.as_piece();
        let piece_b = msg.b.as_piece();

        if let (Some(a), Some(b)) = (piece_a, piece_b) {
            // A strike only counts when the pair first touches.
            return match phase {
                CollisionPhase::Start => Some(Contact::Pieces { a, b }),
                _ => None,
            };
        }

        // One side must be a piece, the other a static body.
        let (piece, other, piece_pos, other_pos) = match (piece_a, piece_b) {
            (Some(p), None) => (p, msg.b, msg.pos_a, msg.pos_b),
            (None, Some(p)) => (p, msg.a, msg.pos_b, msg.pos_a),
            _ => return None,
        };

        match other {
            BodyTag::Boundary if phase == CollisionPhase::Start => {
                Some(Contact::Boundary { piece })
            }
            BodyTag::Ring { ring } if phase == CollisionPhase::Active => {
                // A piece merely passing through a zone at speed does not rest.
                if msg.rel_speed >= self.stillness_threshold {
                    return None;
                }
                if ring == Ring::Center
                    && vec2::distance(piece_pos, other_pos) >= self.center_capture_radius
                {
                    return None;
                }
                Some(Contact::Zone { piece, ring })
            }
            // Pegs and rails are world-side effects, not rule contacts.
            _ => None,
        }
    }

    /// Classify and record a pair. A pair already counted within the current
    /// settle window is rejected as a duplicate.
    pub fn observe(
        &mut self,
        phase: CollisionPhase,
        msg: &CollisionMsg,
    ) -> Result<Option<Contact>, RulesError> {
        let Some(contact) = self.classify(phase, msg) else {
            return Ok(None);
        };
        if !self.seen.insert(pair_key(msg.a, msg.b)) {
            return Err(RulesError::DuplicateScoreContact);
        }
        Ok(Some(contact))
    }
}

/// Canonical key for a pair, independent of reporting order.
fn pair_key(a: BodyTag, b: BodyTag) -> (BodyTag, BodyTag) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
