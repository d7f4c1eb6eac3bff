//! Identities and typed body tags crossing the engine boundary.
//!
//! The physics glue assigns a `BodyTag` to every body it creates and reports
//! collisions in terms of these tags, so the engine never inspects label
//! strings.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Opaque handle for a game piece body in the physics world.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct PieceId(pub u32);

/// One of the two players.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "lowercase")]
pub enum PlayerId {
    P1,
    P2,
}

impl PlayerId {
    /// The opposing player.
    pub fn other(self) -> Self {
        match self {
            PlayerId::P1 => PlayerId::P2,
            PlayerId::P2 => PlayerId::P1,
        }
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerId::P1 => write!(f, "p1"),
            PlayerId::P2 => write!(f, "p2"),
        }
    }
}

/// Scoring rings, outermost to innermost. Variant order matters: the derived
/// `Ord` ranks `Center` highest, and the innermost resting ring wins.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "snake_case")]
pub enum Ring {
    Outer,
    Middle,
    Inner,
    Center,
}

/// Typed tag carried by every body in the physics world.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BodyTag {
    /// Invisible table border. A piece touching it has left the board.
    Boundary,
    /// One of the eight center pegs.
    Peg,
    /// Decorative rail around the playing surface.
    Rails,
    /// A scoring ring sensor.
    Ring { ring: Ring },
    /// A player's game piece.
    Piece { piece: PieceId },
}

impl BodyTag {
    /// The piece id if this tag names a piece.
    pub fn as_piece(self) -> Option<PieceId> {
        match self {
            BodyTag::Piece { piece } => Some(piece),
            _ => None,
        }
    }
}
