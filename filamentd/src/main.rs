//! filamentd - background training and LED rendering service
//!
//! Two independent timelines that only ever meet at the snapshot holder's
//! atomic swap:
//! - the trainer: one epoch over the ten-digit dataset, publish, cool down
//! - the render tick: snapshot → trace → channel frame → PWM frame → bus
//!
//! Storage locations:
//! - Linux: ~/.local/share/filament/
//! - Windows: %APPDATA%\filament\
//! - MacOS: ~/Library/Application Support/filament/

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use filament::layout::WireLayout;
use filament::trainer::{SnapshotCell, Trainer};

mod bus_dev;
mod checkpoint;
mod config;
mod paths;
mod render;
mod trainer_task;

use config::DaemonConfig;
use paths::AppPaths;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let paths = AppPaths::new()?;
    let config = DaemonConfig::load(&paths);
    info!(
        "filamentd starting ({:?} mode, {} Hz render, {} ms cooldown)",
        config.mode, config.render_hz, config.cooldown_ms
    );

    // The rig's pin assignment pins the hidden width; the config cannot
    // override what is soldered to the board.
    let layout = WireLayout::rig();
    let hidden_width = layout.hidden_width;
    if config.hidden_width != hidden_width {
        warn!(
            "config hidden_width {} does not match the rig's {}; using the rig",
            config.hidden_width, hidden_width
        );
    }

    let mut trainer = Trainer::new(
        hidden_width,
        config.seed,
        config.learning_rate,
        config.momentum,
    );
    match checkpoint::load(&paths) {
        Ok(Some(snapshot)) if snapshot.hidden_width() == hidden_width => {
            info!(
                "Restored weights from {}",
                paths.checkpoint_file().display()
            );
            trainer.restore(snapshot);
        }
        Ok(Some(_)) => warn!("Checkpoint hidden width mismatch; starting fresh"),
        Ok(None) => info!("No checkpoint; starting with fresh weights"),
        Err(e) => warn!("Could not load checkpoint: {}; starting fresh", e),
    }

    let cell = Arc::new(SnapshotCell::new(trainer.snapshot()));

    // Persist the latest published weights on Ctrl-C.
    {
        let cell = Arc::clone(&cell);
        let paths = paths.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                match checkpoint::save(&paths, &cell.load()) {
                    Ok(()) => info!("Ctrl-C: weights saved"),
                    Err(e) => error!("Ctrl-C save failed: {}", e),
                }
                std::process::exit(0);
            }
        });
    }

    // Training loop task.
    tokio::spawn(trainer_task::run(
        trainer,
        Arc::clone(&cell),
        Duration::from_millis(config.cooldown_ms),
    ));

    // Render loop; only a layout contract violation gets out of it.
    let bus = bus_dev::open(&config.spi_device);
    if let Err(e) = render::run(&config, layout, cell, bus).await {
        error!("render loop aborted: {}", e);
        return Err(e.into());
    }
    Ok(())
}
