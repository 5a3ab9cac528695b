//! The transport seam between frame encoding and the physical driver chain.
//!
//! The core never talks to hardware. It defines the one-operation boundary
//! the render path writes through; device-backed implementations live with
//! the daemon, and tests use the in-memory recorder below.

use std::io;

use thiserror::Error;

use crate::layout::CHANNEL_COUNT;
use crate::pwm::PWM_BITS;

/// Bytes in one wire frame for the physical chain.
pub const FRAME_BYTES: usize = CHANNEL_COUNT * PWM_BITS / 8;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("frame is {got} bytes, the chain takes exactly {expected}")]
    FrameLength { expected: usize, got: usize },
    #[error("bus transfer failed: {0}")]
    Io(#[from] io::Error),
}

/// One blocking transfer of a packed PWM frame. No implicit retry: a dropped
/// frame is acceptable, the next render tick supplies a fresh one.
pub trait PwmBus {
    fn transfer(&mut self, frame: &[u8]) -> Result<(), BusError>;
}

/// Frame-length guard shared by implementations.
pub fn check_frame_len(frame: &[u8]) -> Result<(), BusError> {
    if frame.len() != FRAME_BYTES {
        return Err(BusError::FrameLength {
            expected: FRAME_BYTES,
            got: frame.len(),
        });
    }
    Ok(())
}

/// In-memory bus keeping every transferred frame. Test double.
#[derive(Debug, Default)]
pub struct RecordingBus {
    pub frames: Vec<Vec<u8>>,
}

impl PwmBus for RecordingBus {
    fn transfer(&mut self, frame: &[u8]) -> Result<(), BusError> {
        check_frame_len(frame)?;
        self.frames.push(frame.to_vec());
        Ok(())
    }
}
