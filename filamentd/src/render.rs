//! The render tick: snapshot → trace → channel frame → PWM frame → bus.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time;
use tracing::warn;

use filament::bus::PwmBus;
use filament::layout::{LayoutError, WireLayout};
use filament::signal::{self, DriftParams};
use filament::trace::ActivationTrace;
use filament::trainer::SnapshotCell;
use filament::{pwm, segments};

use crate::config::{DaemonConfig, DisplayMode};

/// Runs until the process halts. The only way out is a layout contract
/// violation, which must not be masked; transport failures are logged and
/// dropped, the next tick supplies a fresh frame.
pub async fn run(
    config: &DaemonConfig,
    layout: WireLayout,
    cell: Arc<SnapshotCell>,
    mut bus: Box<dyn PwmBus + Send>,
) -> Result<(), LayoutError> {
    let patterns: Vec<Vec<u8>> = segments::canonical_patterns()
        .map(|(_, bits)| bits.to_vec())
        .collect();
    let drift_pattern = match segments::encode(config.drift_digit) {
        Ok(bits) => bits,
        Err(e) => {
            warn!("configured drift digit rejected: {}; using 8", e);
            patterns[8].clone()
        }
    };

    // Animations run on the daemon's own clock, t = 0 at startup; the drift
    // parameters are derived once and reused every tick.
    let start = Instant::now();
    let drift = DriftParams::derive(0.0);

    let tick = Duration::from_millis(u64::from((1000 / config.render_hz.max(1)).max(1)));
    let dwell = config.dwell_ms.max(1);

    loop {
        time::sleep(tick).await;
        let t = start.elapsed().as_secs_f64();

        let channel_frame = match config.mode {
            DisplayMode::Live => {
                let digit = (start.elapsed().as_millis() as u64 / dwell) as usize % patterns.len();
                let trace = ActivationTrace::capture(&cell.load(), &patterns[digit]);
                layout.build_frame(&trace)?
            }
            DisplayMode::Drift => layout.segment_frame(&drift.apply(&drift_pattern, t))?,
            DisplayMode::Idle => signal::idle_sweep(layout.channel_count, t),
        };

        if let Err(e) = bus.transfer(&pwm::encode_frame(&channel_frame)) {
            warn!("frame dropped: {}", e);
        }
    }
}
