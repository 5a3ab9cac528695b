//! The epoch/cooldown training loop.
//!
//! One epoch, publish, sleep, repeat, forever. The snapshot lock is never
//! held while an epoch computes; publication is a single swap.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::info;

use filament::trainer::{SnapshotCell, Trainer};

/// Epochs between progress log lines.
const LOG_EVERY: u64 = 300;

pub async fn run(mut trainer: Trainer, cell: Arc<SnapshotCell>, cooldown: Duration) {
    loop {
        trainer.begin_epoch();
        let (snapshot, loss) = trainer.run_epoch();
        cell.publish(snapshot);

        let epochs = trainer.epochs_completed();
        if epochs % LOG_EVERY == 0 {
            info!("epoch {}: loss {:.4}", epochs, loss);
        }

        time::sleep(cooldown).await;
    }
}
