//! # filament
//!
//! Drives a chained 12-bit PWM LED rig (a seven-segment digit plus two banks
//! of indicator wires) from the live internal state of a tiny feed-forward
//! digit classifier, while the classifier's weights train continuously in the
//! background.
//!
//! The render path is pure computation: fetch the latest weight snapshot,
//! replay the forward pass keeping every per-wire contribution, map those
//! values onto the physical channel chain, and pack the result into the
//! driver chips' 12-bit wire format. The trainer runs on its own timeline and
//! only ever touches the render path at a single atomic snapshot swap.
//!
//! ## Quick Start
//!
//! ```
//! use filament::prelude::*;
//!
//! // Freshly initialized weights for the physical rig (hidden width 2).
//! let snapshot = WeightSnapshot::init(2, 42);
//! let layout = WireLayout::rig();
//!
//! // One render tick for the digit 3.
//! let pattern = segments::encode(3)?;
//! let trace = ActivationTrace::capture(&snapshot, &pattern);
//! let frame = layout.build_frame(&trace)?;
//! let wire = pwm::encode_frame(&frame);
//! assert_eq!(wire.len(), FRAME_BYTES);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`segments`]: digit ↔ seven-segment bit pattern codec
//! - [`signal`]: oscillators, drift and idle animations
//! - [`pwm`]: gamma correction, 12-bit quantization, bitstream packing
//! - [`network`]: dense weight matrices and elementwise maps
//! - [`trace`]: layer-by-layer activation capture for the display
//! - [`layout`]: physical wire layout mapping onto the channel chain
//! - [`trainer`]: incremental epoch trainer and the shared snapshot holder
//! - [`bus`]: the transport seam to the driver chain

#[path = "core/segments.rs"]
pub mod segments;

#[path = "core/signal.rs"]
pub mod signal;

#[path = "core/pwm.rs"]
pub mod pwm;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/network.rs"]
pub mod network;

#[path = "core/trace.rs"]
pub mod trace;

#[path = "core/layout.rs"]
pub mod layout;

#[path = "core/trainer.rs"]
pub mod trainer;

#[path = "core/bus.rs"]
pub mod bus;

/// Prelude module for convenient imports.
///
/// ```
/// use filament::prelude::*;
/// ```
pub mod prelude {
    pub use crate::bus::{BusError, PwmBus, RecordingBus, FRAME_BYTES};
    pub use crate::layout::{LayoutError, WireLayout, CHANNEL_COUNT};
    pub use crate::network::{Matrix, Weight, WeightSnapshot};
    pub use crate::pwm;
    pub use crate::segments::{self, DomainError, DIGIT_COUNT, SEGMENT_COUNT};
    pub use crate::signal::{self, DriftParams};
    pub use crate::trace::ActivationTrace;
    pub use crate::trainer::{SnapshotCell, Trainer, TrainerPhase};
}
