//! Time-indexed oscillators for the demo and drift animations.
//!
//! Everything here is a pure function of explicitly supplied time. Callers
//! own the clock (the daemon passes seconds since its own start), which keeps
//! every animation reproducible in tests.

use crate::segments::SEGMENT_COUNT;

/// Smooth value in [-1, 1]: `sin(2π·(t·frequency + phase))`.
///
/// `phase` is measured in turns, so a phase of 0.25 leads by a quarter cycle.
pub fn oscillate(frequency: f64, phase: f64, t: f64) -> f64 {
    (std::f64::consts::TAU * (t * frequency + phase)).sin()
}

/// Slowest segment oscillator, in Hz.
const DRIFT_BASE_FREQ: f64 = 0.05;

/// Frequency spread between adjacent segments. Deliberately not a neat
/// ratio of the base, so segments never visibly re-synchronize.
const DRIFT_FREQ_STEP: f64 = 0.01723;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftSegment {
    pub frequency: f64,
    /// Phase in turns.
    pub phase: f64,
}

/// Per-segment oscillator parameters for one drift animation.
///
/// Derived once from the animation's start instant and reused every tick.
/// The phases are chosen so each oscillator's argument lands on a whole turn
/// at the start instant; the per-bit quarter-turn offset in [`apply`] then
/// pins the starting brightness at exactly the segment's bit value, so the
/// hand-off from a lit digit into drift is continuous.
///
/// [`apply`]: DriftParams::apply
#[derive(Debug, Clone, PartialEq)]
pub struct DriftParams {
    segments: [DriftSegment; SEGMENT_COUNT],
}

impl DriftParams {
    pub fn derive(start_time: f64) -> Self {
        let mut segments = [DriftSegment {
            frequency: 0.0,
            phase: 0.0,
        }; SEGMENT_COUNT];
        for (i, segment) in segments.iter_mut().enumerate() {
            let frequency = DRIFT_BASE_FREQ + DRIFT_FREQ_STEP * i as f64;
            segment.frequency = frequency;
            segment.phase = (-start_time * frequency).rem_euclid(1.0);
        }
        Self { segments }
    }

    /// Brightness per segment at time `t`, evolving away from `bits`.
    ///
    /// A 1 bit gets a quarter-turn offset (starts fully bright), a 0 bit
    /// none (starts dark); brightness is the rectified oscillator value.
    pub fn apply(&self, bits: &[u8], t: f64) -> Vec<f32> {
        debug_assert_eq!(bits.len(), SEGMENT_COUNT);
        self.segments
            .iter()
            .zip(bits)
            .map(|(segment, &bit)| {
                let offset = if bit != 0 { 0.25 } else { 0.0 };
                oscillate(segment.frequency, segment.phase + offset, t).abs() as f32
            })
            .collect()
    }

    pub fn segments(&self) -> &[DriftSegment] {
        &self.segments
    }
}

/// Idle animation: every channel breathes on its own frequency so the whole
/// chain shimmers without any network behind it.
pub fn idle_sweep(channel_count: usize, t: f64) -> Vec<f32> {
    (0..channel_count)
        .map(|channel| {
            let frequency = DRIFT_BASE_FREQ + 0.013 * channel as f64;
            oscillate(frequency, 0.0, t).abs() as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments;

    #[test]
    fn oscillate_stays_in_unit_range() {
        for i in 0..1000 {
            let t = i as f64 * 0.173;
            let v = oscillate(0.37, 0.1, t);
            assert!((-1.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn oscillate_peaks_a_quarter_cycle_in() {
        assert!((oscillate(1.0, 0.0, 0.25) - 1.0).abs() < 1e-12);
        assert!(oscillate(1.0, 0.0, 0.5).abs() < 1e-12);
        // Phase is in turns: a quarter-turn phase equals a quarter cycle of time.
        assert!((oscillate(1.0, 0.25, 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn drift_params_are_a_pure_function_of_start_time() {
        assert_eq!(DriftParams::derive(123.456), DriftParams::derive(123.456));
        assert_ne!(DriftParams::derive(1.0), DriftParams::derive(2.0));
    }

    #[test]
    fn drift_frequencies_are_spread_across_segments() {
        let params = DriftParams::derive(0.0);
        for (i, segment) in params.segments().iter().enumerate() {
            let expected = 0.05 + 0.01723 * i as f64;
            assert!((segment.frequency - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn drift_is_continuous_at_its_own_start_instant() {
        for digit in 0..10 {
            let bits = segments::encode(digit).unwrap();
            for &t0 in &[0.0, 0.4, 17.25, 1234.5678] {
                let params = DriftParams::derive(t0);
                let levels = params.apply(&bits, t0);
                for (level, &bit) in levels.iter().zip(&bits) {
                    assert!(
                        (level - bit as f32).abs() < 1e-5,
                        "digit {digit} t0 {t0}: level {level} vs bit {bit}"
                    );
                }
            }
        }
    }

    #[test]
    fn drift_levels_stay_in_brightness_range() {
        let bits = segments::encode(8).unwrap();
        let params = DriftParams::derive(3.0);
        for i in 0..500 {
            let t = 3.0 + i as f64 * 0.033;
            for level in params.apply(&bits, t) {
                assert!((0.0..=1.0).contains(&level));
            }
        }
    }

    #[test]
    fn idle_sweep_covers_every_channel() {
        let levels = idle_sweep(72, 1.5);
        assert_eq!(levels.len(), 72);
        assert!(levels.iter().all(|l| (0.0..=1.0).contains(l)));
    }
}
