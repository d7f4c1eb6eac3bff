use crokinole_engine::config::EngineConfig;
use crokinole_engine::game_loop::{run_game_loop, GameCommand};
use crokinole_engine::scripted::{ScriptedWorld, ShotPlan};
use crokinole_shared::body::Ring;
use crokinole_shared::config::RulesConfig;
use crokinole_shared::protocol::{GameMsg, UiMsg, WorldCmd};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Number of scripted shots the demo plays before exiting.
const DEMO_SHOTS: u32 = 6;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    // Short windows keep the scripted demo brisk; everything else canonical.
    let config = EngineConfig {
        rules: RulesConfig {
            settle_debounce: 1.5,
            removal_grace: 1.5,
            ..RulesConfig::default()
        },
        ..EngineConfig::default()
    };

    // Validate configuration before starting
    if let Err(e) = config.validate() {
        eprintln!("Invalid engine configuration: {}", e);
        std::process::exit(1);
    }

    let (cmd_tx, cmd_rx) = mpsc::channel::<GameCommand>(256);
    let (world_tx, mut world_rx) = mpsc::channel::<WorldCmd>(64);
    let (broadcast_tx, mut game_rx) = broadcast::channel::<GameMsg>(64);

    // Spawn game loop
    let loop_config = config.clone();
    tokio::spawn(async move {
        run_game_loop(cmd_rx, world_tx, broadcast_tx, loop_config).await;
    });

    cmd_tx
        .send(GameCommand::Ui(UiMsg::NewGame))
        .await
        .expect("game loop unavailable");

    let mut world = ScriptedWorld::new();
    let mut shots = 0u32;
    let mut tick_interval = tokio::time::interval(Duration::from_millis(16));

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                for msg in world.tick(0.016) {
                    if cmd_tx.send(GameCommand::World(msg)).await.is_err() {
                        return;
                    }
                }
            }

            Some(cmd) = world_rx.recv() => {
                println!("world <- {}", serde_json::to_string(&cmd).unwrap());
                let is_spawn = matches!(cmd, WorldCmd::AddBody(_));
                world.observe(&cmd);
                if is_spawn {
                    if shots >= DEMO_SHOTS {
                        break;
                    }
                    shots += 1;
                    world.play(plan_for(shots, &world));
                }
            }

            result = game_rx.recv() => {
                match result {
                    Ok(msg) => {
                        println!("game  <- {}", serde_json::to_string(&msg).unwrap());
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("demo lagged by {} notifications", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    println!("demo finished after {} shots", DEMO_SHOTS);
}

/// A little variety: clean scores, a legal strike, a foul and a scratch.
fn plan_for(shot: u32, world: &ScriptedWorld) -> ShotPlan {
    match shot {
        1 => ShotPlan::RestInRing(Ring::Inner),
        2 => match world
            .active_owner()
            .and_then(|owner| world.board_piece_of(owner.other()))
        {
            Some(target) => ShotPlan::StrikeThenRest {
                target,
                ring: Ring::Middle,
            },
            None => ShotPlan::RestInRing(Ring::Middle),
        },
        3 => ShotPlan::RestInRing(Ring::Outer),
        4 => match world
            .active_owner()
            .and_then(|owner| world.board_piece_of(owner))
        {
            Some(own) => ShotPlan::StrikeOwn { own },
            None => ShotPlan::Miss,
        },
        5 => ShotPlan::Scratch,
        _ => ShotPlan::Miss,
    }
}
