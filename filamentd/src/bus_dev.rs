//! Device-backed bus implementations.

use std::fs::{File, OpenOptions};
use std::io::Write;

use tracing::{info, warn};

use filament::bus::{check_frame_len, BusError, PwmBus};

/// Writes packed frames to an SPI character device.
///
/// The kernel clocks a plain write() out the SPI pins; the driver chain
/// latches once the clock goes idle, so one full-frame write is one display
/// refresh. Frame length is checked here because a short write would leave
/// the shift register half-loaded.
pub struct SpiDevBus {
    device: File,
}

impl SpiDevBus {
    pub fn open(path: &str) -> std::io::Result<Self> {
        let device = OpenOptions::new().write(true).open(path)?;
        Ok(Self { device })
    }
}

impl PwmBus for SpiDevBus {
    fn transfer(&mut self, frame: &[u8]) -> Result<(), BusError> {
        check_frame_len(frame)?;
        self.device.write_all(frame)?;
        Ok(())
    }
}

/// Validates and discards frames. Keeps development hosts without the rig
/// running the full pipeline.
#[derive(Debug, Default)]
pub struct NullBus;

impl PwmBus for NullBus {
    fn transfer(&mut self, frame: &[u8]) -> Result<(), BusError> {
        check_frame_len(frame)?;
        Ok(())
    }
}

/// The configured device if it opens, otherwise the null bus.
pub fn open(device: &str) -> Box<dyn PwmBus + Send> {
    match SpiDevBus::open(device) {
        Ok(bus) => {
            info!("PWM chain on {}", device);
            Box::new(bus)
        }
        Err(e) => {
            warn!("{} unavailable ({}); frames will be discarded", device, e);
            Box::new(NullBus)
        }
    }
}
