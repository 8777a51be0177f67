mod config;
mod console;
mod persistence;
mod session;

use std::path::PathBuf;
use std::time::Duration;

use config::SandboxConfig;
use session::Session;
use tokio::io::AsyncBufReadExt;
use tracing::{info, warn};
use vox_rs_world::World;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = match SandboxConfig::load("sandbox.toml") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load sandbox.toml: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("VOX-RS sandbox v{} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "World: {}x{} (max height {}, seed {})",
        config.world.width, config.world.depth, config.world.max_height, config.world.seed
    );
    info!(
        "Simulation: {} fps, {:?}",
        config.simulation.frame_rate,
        config.timestep()
    );

    let params = config.terrain_params();
    let save_path = PathBuf::from(&config.world.save_path);
    let world = match persistence::load_world(&save_path, config.player_settings(), config.timestep())
    {
        Some(world) => {
            info!("Loaded world from {}", save_path.display());
            world
        }
        None => World::generate(&params, config.player_settings(), config.timestep()),
    };
    let mut session = Session::new(world, params, save_path, config.reach());
    info!(
        "{} blocks, player at {}. Type help for commands.",
        session.world().store().len(),
        session.world().state().position
    );

    // Console REPL: read lines from stdin
    let (console_tx, mut console_rx) = tokio::sync::mpsc::channel::<String>(32);
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    let frame_rate = config.simulation.frame_rate.max(1);
    let mut frame_interval =
        tokio::time::interval(Duration::from_secs_f64(1.0 / f64::from(frame_rate)));
    frame_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last_frame = tokio::time::Instant::now();

    let auto_save = config.world.auto_save_interval;
    let mut save_interval = tokio::time::interval(Duration::from_secs(auto_save.max(1)));
    save_interval.tick().await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            now = frame_interval.tick() => {
                let dt = now.duration_since(last_frame).as_secs_f32();
                last_frame = now;
                session.frame(dt);
            }
            Some(line) = console_rx.recv() => {
                let reply = session.handle_line(&line);
                for message in &reply.messages {
                    if reply.success {
                        info!("{message}");
                    } else {
                        warn!("{message}");
                    }
                }
                if reply.should_stop {
                    break;
                }
            }
            _ = save_interval.tick(), if auto_save > 0 => {
                session.save();
            }
            _ = &mut ctrl_c => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Saving world before shutdown...");
    session.save();
    info!("Sandbox shut down.");
}
