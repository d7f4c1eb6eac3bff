use crate::config::EngineConfig;
use crate::state::{Effect, GameState};
use crokinole_shared::protocol::{GameMsg, UiMsg, WorldCmd, WorldMsg};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Inbound events from the engine's two collaborators.
#[derive(Debug, Clone)]
pub enum GameCommand {
    /// Collision and drag notifications from the physics world.
    World(WorldMsg),
    /// Game-management requests from the presentation layer.
    Ui(UiMsg),
}

/// Run the main game loop. Owns all game state; one logical thread of
/// control, so handlers for a turn never interleave.
pub async fn run_game_loop(
    mut cmd_rx: mpsc::Receiver<GameCommand>,
    world_tx: mpsc::Sender<WorldCmd>,
    broadcast_tx: broadcast::Sender<GameMsg>,
    config: EngineConfig,
) {
    let mut state = GameState::new(config.clone());

    let tick_duration = Duration::from_secs_f64(1.0 / config.tick_rate_hz as f64);
    let mut tick_interval = tokio::time::interval(tick_duration);
    tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                let dt = 1.0 / config.tick_rate_hz as f64;
                let effects = state.tick(dt);
                dispatch(effects, &world_tx, &broadcast_tx).await;
            }

            Some(cmd) = cmd_rx.recv() => {
                let effects = match cmd {
                    GameCommand::World(WorldMsg::CollisionStart(msg)) => {
                        state.collision_start(&msg)
                    }
                    GameCommand::World(WorldMsg::CollisionActive(msg)) => {
                        state.collision_active(&msg)
                    }
                    GameCommand::World(WorldMsg::CollisionEnd(msg)) => {
                        state.collision_end(&msg)
                    }
                    GameCommand::World(WorldMsg::DragEnd(msg)) => {
                        state.drag_end(msg.piece)
                    }
                    GameCommand::Ui(UiMsg::NewGame) => {
                        tracing::info!("new game requested");
                        state.start_game()
                    }
                    GameCommand::Ui(UiMsg::SetPlayerName(msg)) => {
                        state.set_player_name(msg.player, msg.name)
                    }
                    GameCommand::Ui(UiMsg::AdjustScore(msg)) => {
                        state.adjust_score(msg.player, msg.delta)
                    }
                };
                dispatch(effects, &world_tx, &broadcast_tx).await;
            }

            else => break,
        }
    }

    tracing::info!("Game loop ended");
}

async fn dispatch(
    effects: Vec<Effect>,
    world_tx: &mpsc::Sender<WorldCmd>,
    broadcast_tx: &broadcast::Sender<GameMsg>,
) {
    for effect in effects {
        match effect {
            Effect::Command(cmd) => {
                if world_tx.send(cmd).await.is_err() {
                    tracing::warn!("physics world channel closed");
                }
            }
            Effect::Broadcast(msg) => {
                // No subscribers is fine; notifications are droppable.
                let _ = broadcast_tx.send(msg);
            }
        }
    }
}
