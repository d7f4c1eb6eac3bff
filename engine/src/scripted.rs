//! Scripted physics world for demos and end-to-end tests.
//!
//! A deterministic stand-in for the real physics engine: given a plan for
//! the active piece's shot, it plays back the drag and collision event
//! sequence the engine would otherwise receive from the browser. It is a
//! timing state machine, not a simulation.

use crokinole_shared::body::{BodyTag, PieceId, PlayerId, Ring};
use crokinole_shared::protocol::{CollisionMsg, DragEndMsg, WorldCmd, WorldMsg};
use crokinole_shared::vec2::vec2;
use std::collections::VecDeque;

/// How a scripted shot should play out.
#[derive(Debug, Clone, Copy)]
pub enum ShotPlan {
    /// Glide to rest in a ring without touching anything.
    RestInRing(Ring),
    /// Strike another piece, then come to rest in a ring.
    StrikeThenRest { target: PieceId, ring: Ring },
    /// First contact is one of the shooter's own pieces.
    StrikeOwn { own: PieceId },
    /// Fly off the board.
    Scratch,
    /// Touch nothing and stop on bare board.
    Miss,
}

#[derive(Debug, Clone)]
struct TimedEvent {
    at: f64,
    msg: WorldMsg,
}

/// Plays back scripted shots against the engine's world-event channel.
#[derive(Debug, Default)]
pub struct ScriptedWorld {
    clock: f64,
    active: Option<(PieceId, PlayerId)>,
    on_board: Vec<(PieceId, PlayerId)>,
    queue: VecDeque<TimedEvent>,
}

impl ScriptedWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track body add/remove commands so shots can reference real pieces.
    pub fn observe(&mut self, cmd: &WorldCmd) {
        match cmd {
            WorldCmd::AddBody(msg) => {
                self.active = Some((msg.piece, msg.owner));
                self.on_board.push((msg.piece, msg.owner));
            }
            WorldCmd::RemoveBody(msg) => {
                self.on_board.retain(|(piece, _)| *piece != msg.piece);
                if self.active.map(|(piece, _)| piece) == Some(msg.piece) {
                    self.active = None;
                }
            }
        }
    }

    /// The piece most recently placed for a turn.
    pub fn active_piece(&self) -> Option<PieceId> {
        self.active.map(|(piece, _)| piece)
    }

    /// Owner of the piece most recently placed for a turn.
    pub fn active_owner(&self) -> Option<PlayerId> {
        self.active.map(|(_, owner)| owner)
    }

    /// Some on-board piece owned by `owner`, excluding the active piece.
    pub fn board_piece_of(&self, owner: PlayerId) -> Option<PieceId> {
        let active = self.active_piece();
        self.on_board
            .iter()
            .filter(|(piece, o)| *o == owner && Some(*piece) != active)
            .map(|(piece, _)| *piece)
            .next()
    }

    /// Queue the event sequence for the active piece's shot.
    pub fn play(&mut self, plan: ShotPlan) {
        let Some((piece, _)) = self.active else {
            return;
        };
        let t = self.clock;
        self.push(t, WorldMsg::DragEnd(DragEndMsg { piece }));
        match plan {
            ShotPlan::RestInRing(ring) => {
                self.push(t + 1.0, zone_contact(piece, ring));
            }
            ShotPlan::StrikeThenRest { target, ring } => {
                self.push(t + 0.3, piece_strike(piece, target));
                self.push(t + 1.2, zone_contact(piece, ring));
            }
            ShotPlan::StrikeOwn { own } => {
                self.push(t + 0.3, piece_strike(piece, own));
            }
            ShotPlan::Scratch => {
                self.push(t + 0.5, boundary_hit(piece));
            }
            ShotPlan::Miss => {}
        }
    }

    /// Advance time and drain the events that are due.
    pub fn tick(&mut self, dt: f64) -> Vec<WorldMsg> {
        self.clock += dt;
        let mut due = Vec::new();
        while let Some(event) = self.queue.front() {
            if event.at > self.clock {
                break;
            }
            if let Some(event) = self.queue.pop_front() {
                due.push(event.msg);
            }
        }
        due
    }

    fn push(&mut self, at: f64, msg: WorldMsg) {
        let idx = self
            .queue
            .iter()
            .position(|e| e.at > at)
            .unwrap_or(self.queue.len());
        self.queue.insert(idx, TimedEvent { at, msg });
    }
}

fn zone_contact(piece: PieceId, ring: Ring) -> WorldMsg {
    WorldMsg::CollisionActive(CollisionMsg {
        a: BodyTag::Ring { ring },
        b: BodyTag::Piece { piece },
        rel_speed: 0.05,
        pos_a: vec2(1020.0, 645.0),
        pos_b: vec2(1020.3, 645.1),
    })
}

fn piece_strike(a: PieceId, b: PieceId) -> WorldMsg {
    WorldMsg::CollisionStart(CollisionMsg {
        a: BodyTag::Piece { piece: a },
        b: BodyTag::Piece { piece: b },
        rel_speed: 3.0,
        pos_a: vec2(900.0, 600.0),
        pos_b: vec2(920.0, 610.0),
    })
}

fn boundary_hit(piece: PieceId) -> WorldMsg {
    WorldMsg::CollisionStart(CollisionMsg {
        a: BodyTag::Boundary,
        b: BodyTag::Piece { piece },
        rel_speed: 1.5,
        pos_a: vec2(1570.0, 645.0),
        pos_b: vec2(1560.0, 640.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crokinole_shared::protocol::AddBodyMsg;

    fn add(piece: u32, owner: PlayerId) -> WorldCmd {
        WorldCmd::AddBody(AddBodyMsg {
            piece: PieceId(piece),
            owner,
        })
    }

    #[test]
    fn observe_tracks_active_piece() {
        let mut world = ScriptedWorld::new();
        world.observe(&add(1, PlayerId::P1));
        assert_eq!(world.active_piece(), Some(PieceId(1)));
        assert_eq!(world.active_owner(), Some(PlayerId::P1));
        world.observe(&add(6, PlayerId::P2));
        assert_eq!(world.active_piece(), Some(PieceId(6)));
    }

    #[test]
    fn board_piece_lookup_excludes_the_active_piece() {
        let mut world = ScriptedWorld::new();
        world.observe(&add(1, PlayerId::P1));
        world.observe(&add(2, PlayerId::P1));
        assert_eq!(world.board_piece_of(PlayerId::P1), Some(PieceId(1)));
        assert_eq!(world.board_piece_of(PlayerId::P2), None);
    }

    #[test]
    fn shot_events_come_out_in_order() {
        let mut world = ScriptedWorld::new();
        world.observe(&add(1, PlayerId::P1));
        world.observe(&add(6, PlayerId::P2));
        world.play(ShotPlan::StrikeThenRest {
            target: PieceId(1),
            ring: Ring::Inner,
        });

        let first = world.tick(0.1);
        assert!(matches!(first.as_slice(), [WorldMsg::DragEnd(_)]));
        let second = world.tick(0.3);
        assert!(matches!(second.as_slice(), [WorldMsg::CollisionStart(_)]));
        let third = world.tick(1.0);
        assert!(matches!(third.as_slice(), [WorldMsg::CollisionActive(_)]));
        assert!(world.tick(5.0).is_empty());
    }

    #[test]
    fn miss_only_releases_the_piece() {
        let mut world = ScriptedWorld::new();
        world.observe(&add(1, PlayerId::P1));
        world.play(ShotPlan::Miss);
        let events = world.tick(2.0);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], WorldMsg::DragEnd(_)));
    }

    #[test]
    fn play_without_active_piece_is_a_noop() {
        let mut world = ScriptedWorld::new();
        world.play(ShotPlan::Scratch);
        assert!(world.tick(10.0).is_empty());
    }
}
