//! Integration tests for the rules engine.
//!
//! These tests spawn the real game loop task and drive it through its
//! channel surface, the way the physics world and the presentation layer
//! do. Time is virtual: the settle and grace windows elapse instantly.

use crokinole_engine::config::EngineConfig;
use crokinole_engine::game_loop::{run_game_loop, GameCommand};
use crokinole_shared::body::{BodyTag, PieceId, PlayerId, Ring};
use crokinole_shared::config::RulesConfig;
use crokinole_shared::protocol::{
    AddBodyMsg, CollisionMsg, DragEndMsg, GameMsg, SetPlayerNameMsg, Severity, UiMsg, WorldCmd,
    WorldMsg,
};
use crokinole_shared::vec2::vec2;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;

struct TestEngine {
    cmd_tx: mpsc::Sender<GameCommand>,
    world_rx: mpsc::Receiver<WorldCmd>,
    game_rx: broadcast::Receiver<GameMsg>,
}

fn test_config() -> EngineConfig {
    EngineConfig {
        tick_rate_hz: 60,
        rng_seed: 7,
        rules: RulesConfig {
            settle_debounce: 1.0,
            removal_grace: 2.0,
            ..RulesConfig::default()
        },
    }
}

fn start_engine(config: EngineConfig) -> TestEngine {
    let (cmd_tx, cmd_rx) = mpsc::channel::<GameCommand>(256);
    let (world_tx, world_rx) = mpsc::channel::<WorldCmd>(64);
    let (broadcast_tx, game_rx) = broadcast::channel::<GameMsg>(256);

    tokio::spawn(async move {
        run_game_loop(cmd_rx, world_tx, broadcast_tx, config).await;
    });

    TestEngine {
        cmd_tx,
        world_rx,
        game_rx,
    }
}

impl TestEngine {
    async fn send_ui(&self, msg: UiMsg) {
        self.cmd_tx
            .send(GameCommand::Ui(msg))
            .await
            .expect("game loop unavailable");
    }

    async fn send_world(&self, msg: WorldMsg) {
        self.cmd_tx
            .send(GameCommand::World(msg))
            .await
            .expect("game loop unavailable");
    }

    async fn next_world_cmd(&mut self) -> WorldCmd {
        timeout(Duration::from_secs(30), self.world_rx.recv())
            .await
            .expect("timed out waiting for a world command")
            .expect("world channel closed")
    }

    async fn next_add_body(&mut self) -> AddBodyMsg {
        loop {
            if let WorldCmd::AddBody(msg) = self.next_world_cmd().await {
                return msg;
            }
        }
    }

    async fn next_remove_body(&mut self) -> PieceId {
        loop {
            if let WorldCmd::RemoveBody(msg) = self.next_world_cmd().await {
                return msg.piece;
            }
        }
    }

    /// Collect world commands until the channel stays quiet for `quiet`.
    async fn drain_world(&mut self, quiet: Duration) -> Vec<WorldCmd> {
        let mut cmds = Vec::new();
        while let Ok(Some(cmd)) = timeout(quiet, self.world_rx.recv()).await {
            cmds.push(cmd);
        }
        cmds
    }

    /// Fail if anything arrives on the world channel within `window`.
    async fn expect_world_quiet(&mut self, window: Duration) {
        if let Ok(Some(cmd)) = timeout(window, self.world_rx.recv()).await {
            panic!("unexpected world command: {:?}", cmd);
        }
    }

    /// Scan broadcasts until `pick` matches one.
    async fn next_broadcast<F, T>(&mut self, mut pick: F) -> T
    where
        F: FnMut(&GameMsg) -> Option<T>,
    {
        timeout(Duration::from_secs(30), async {
            loop {
                match self.game_rx.recv().await {
                    Ok(msg) => {
                        if let Some(found) = pick(&msg) {
                            return found;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => {
                        panic!("broadcast channel closed")
                    }
                }
            }
        })
        .await
        .expect("timed out waiting for a broadcast")
    }

    async fn next_score_changed(&mut self) -> (PlayerId, i32) {
        self.next_broadcast(|msg| match msg {
            GameMsg::ScoreChanged(s) => Some((s.player, s.new_score)),
            _ => None,
        })
        .await
    }

    async fn next_warn_notice(&mut self) -> String {
        self.next_broadcast(|msg| match msg {
            GameMsg::Notice(n) if n.severity == Severity::Warn => Some(n.message.clone()),
            _ => None,
        })
        .await
    }
}

fn drag_end(piece: PieceId) -> WorldMsg {
    WorldMsg::DragEnd(DragEndMsg { piece })
}

fn strike(a: PieceId, b: PieceId) -> WorldMsg {
    WorldMsg::CollisionStart(CollisionMsg {
        a: BodyTag::Piece { piece: a },
        b: BodyTag::Piece { piece: b },
        rel_speed: 3.0,
        pos_a: vec2(900.0, 600.0),
        pos_b: vec2(920.0, 610.0),
    })
}

fn rest(piece: PieceId, ring: Ring) -> WorldMsg {
    WorldMsg::CollisionActive(CollisionMsg {
        a: BodyTag::Ring { ring },
        b: BodyTag::Piece { piece },
        rel_speed: 0.05,
        pos_a: vec2(1020.0, 645.0),
        pos_b: vec2(1020.3, 645.1),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn new_game_spawns_a_piece_and_announces_the_turn() {
    let mut engine = start_engine(test_config());
    engine.send_ui(UiMsg::NewGame).await;

    let started = engine
        .next_broadcast(|msg| match msg {
            GameMsg::GameStarted(s) => Some(s.clone()),
            _ => None,
        })
        .await;
    assert_eq!(started.protocol_version, 1);
    assert_eq!(started.players.len(), 2);

    let add = engine.next_add_body().await;
    assert!(
        started
            .players
            .iter()
            .any(|p| p.id == add.owner && p.turn),
        "spawned piece must belong to the player on turn"
    );

    let notice = engine
        .next_broadcast(|msg| match msg {
            GameMsg::Notice(n) => Some(n.message.clone()),
            _ => None,
        })
        .await;
    assert!(notice.contains("turn"));
}

#[tokio::test(start_paused = true)]
async fn legal_strike_resting_in_the_inner_ring_scores_fifteen() {
    let mut engine = start_engine(test_config());
    engine.send_ui(UiMsg::NewGame).await;

    // First shot: rest in the outer ring, nothing to strike yet.
    let first = engine.next_add_body().await;
    engine.send_world(drag_end(first.piece)).await;
    engine.send_world(rest(first.piece, Ring::Outer)).await;

    let second = engine.next_add_body().await;
    assert_ne!(second.owner, first.owner, "turn must switch");
    assert_eq!(engine.next_score_changed().await, (first.owner, 5));

    // Second shot: strike the opponent's piece, rest in the inner ring.
    engine.send_world(drag_end(second.piece)).await;
    engine.send_world(strike(second.piece, first.piece)).await;
    engine.send_world(rest(second.piece, Ring::Inner)).await;

    let third = engine.next_add_body().await;
    assert_eq!(third.owner, first.owner, "turn must switch back");
    assert_eq!(engine.next_score_changed().await, (second.owner, 15));
}

#[tokio::test(start_paused = true)]
async fn own_piece_first_contact_is_pulled_after_the_grace_delay() {
    let mut engine = start_engine(test_config());
    engine.send_ui(UiMsg::NewGame).await;

    // Two clean shots leave one piece per player on the board.
    let first = engine.next_add_body().await;
    engine.send_world(drag_end(first.piece)).await;
    engine.send_world(rest(first.piece, Ring::Outer)).await;

    let second = engine.next_add_body().await;
    engine.send_world(drag_end(second.piece)).await;
    engine.send_world(rest(second.piece, Ring::Outer)).await;

    // Third shot fouls: first contact is the shooter's own resting piece.
    let third = engine.next_add_body().await;
    assert_eq!(third.owner, first.owner);
    let released_at = tokio::time::Instant::now();
    engine.send_world(drag_end(third.piece)).await;
    engine.send_world(strike(third.piece, first.piece)).await;

    let notice = engine.next_warn_notice().await;
    assert!(notice.contains("opponent"));

    // The turn passes on immediately; the foul piece lingers until the
    // grace delay has elapsed, then is pulled.
    let fourth = engine.next_add_body().await;
    assert_eq!(fourth.owner, second.owner);
    let removed = engine.next_remove_body().await;
    assert_eq!(removed, third.piece);

    let waited = released_at.elapsed();
    let grace_plus_settle = Duration::from_millis(2900);
    assert!(
        waited >= grace_plus_settle,
        "piece pulled after {:?}, before settle + grace",
        waited
    );
}

#[tokio::test(start_paused = true)]
async fn out_of_turn_release_is_rejected_silently() {
    let mut engine = start_engine(test_config());
    engine.send_ui(UiMsg::NewGame).await;
    let first = engine.next_add_body().await;

    // Releasing a piece nobody holds does nothing, even well past the
    // settle window.
    engine.send_world(drag_end(PieceId(999))).await;
    engine.expect_world_quiet(Duration::from_secs(3)).await;

    // The real release still works afterwards.
    engine.send_world(drag_end(first.piece)).await;
    let second = engine.next_add_body().await;
    assert_ne!(second.owner, first.owner);
}

#[tokio::test(start_paused = true)]
async fn restarting_cancels_scheduled_removals() {
    let mut engine = start_engine(test_config());
    engine.send_ui(UiMsg::NewGame).await;

    let first = engine.next_add_body().await;
    engine.send_world(drag_end(first.piece)).await;
    engine.send_world(rest(first.piece, Ring::Outer)).await;

    let second = engine.next_add_body().await;
    engine.send_world(drag_end(second.piece)).await;
    engine.send_world(rest(second.piece, Ring::Outer)).await;

    let third = engine.next_add_body().await;
    engine.send_world(drag_end(third.piece)).await;
    engine.send_world(strike(third.piece, first.piece)).await;

    // Foul flagged; restart before the grace delay can elapse.
    engine.next_warn_notice().await;
    engine.send_ui(UiMsg::NewGame).await;

    // The restart clears the old board and spawns the new first piece.
    let cmds = engine.drain_world(Duration::from_millis(500)).await;
    assert!(
        cmds.iter()
            .any(|cmd| matches!(cmd, WorldCmd::RemoveBody(_))),
        "restart must clear the old board"
    );
    assert!(
        matches!(cmds.last(), Some(WorldCmd::AddBody(_))),
        "restart must spawn a fresh piece"
    );

    // The cancelled grace removal never fires.
    engine.expect_world_quiet(Duration::from_secs(5)).await;
}

#[tokio::test(start_paused = true)]
async fn manual_score_corrections_are_broadcast() {
    let mut engine = start_engine(test_config());
    engine.send_ui(UiMsg::NewGame).await;
    engine.next_add_body().await;

    engine
        .send_ui(UiMsg::AdjustScore(
            crokinole_shared::protocol::AdjustScoreMsg {
                player: PlayerId::P1,
                delta: -10,
            },
        ))
        .await;

    assert_eq!(engine.next_score_changed().await, (PlayerId::P1, -10));
}

#[tokio::test(start_paused = true)]
async fn turn_notices_use_display_names() {
    let mut engine = start_engine(test_config());
    engine
        .send_ui(UiMsg::SetPlayerName(SetPlayerNameMsg {
            player: PlayerId::P1,
            name: "Brooks".to_string(),
        }))
        .await;
    engine
        .send_ui(UiMsg::SetPlayerName(SetPlayerNameMsg {
            player: PlayerId::P2,
            name: "Ben".to_string(),
        }))
        .await;
    engine.send_ui(UiMsg::NewGame).await;

    let add = engine.next_add_body().await;
    let expected = match add.owner {
        PlayerId::P1 => "It is now Brooks's turn",
        PlayerId::P2 => "It is now Ben's turn",
    };
    let notice = engine
        .next_broadcast(|msg| match msg {
            GameMsg::Notice(n) if n.message.contains("turn") => Some(n.message.clone()),
            _ => None,
        })
        .await;
    assert_eq!(notice, expected);
}
