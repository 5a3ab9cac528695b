//! Mapping activation traces onto the physical channel chain.
//!
//! The rig is three 24-channel constant-current drivers chained as one long
//! shift register. Each named region below is a block of physically adjacent
//! pins; the offsets are pin assignments, not tunables. The chain is wired
//! tail-first, so the whole frame is reversed before it leaves the mapper.

use thiserror::Error;

use crate::segments::SEGMENT_COUNT;
use crate::trace::ActivationTrace;

/// Driver chips on the chain.
pub const DRIVER_COUNT: usize = 3;

/// PWM channels per driver chip.
pub const CHANNELS_PER_DRIVER: usize = 24;

/// Total channels on the chain.
pub const CHANNEL_COUNT: usize = DRIVER_COUNT * CHANNELS_PER_DRIVER;

/// The activation pipeline and the wire layout have drifted out of sync.
/// Always a programming-contract violation; never masked by truncation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("{region} shape mismatch: layout expects {expected} values, trace carries {got}")]
    Shape {
        region: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{region} region [{offset}, {end}) exceeds the {channels}-channel chain")]
    Region {
        region: &'static str,
        offset: usize,
        end: usize,
        channels: usize,
    },
}

/// Named physical region start-offsets into the flat channel array.
///
/// The two connector blocks carry the output-layer products woven together
/// with the class probabilities: the weight-line wires and the output-line
/// wires share two adjacent connector blocks on the board, so the mapper
/// interleaves them per class and splits the sequence at the block boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireLayout {
    /// Total channels on the chain.
    pub channel_count: usize,
    /// Hidden units the trace must carry.
    pub hidden_width: usize,
    /// Segment-line region (7 channels), which is the digit itself.
    pub input_offset: usize,
    /// (segment, hidden unit) product region (7·H channels).
    pub product_offset: usize,
    /// One indicator channel per hidden unit.
    pub hidden_offsets: Vec<usize>,
    /// Start offsets of the two interleaved connector blocks.
    pub block_offsets: [usize; 2],
    /// Interleaved values routed to the first block; the rest take the second.
    pub block_split: usize,
}

impl WireLayout {
    /// Pin assignment of the physical rig.
    pub fn rig() -> Self {
        Self {
            channel_count: CHANNEL_COUNT,
            hidden_width: 2,
            input_offset: 0,
            product_offset: 8,
            hidden_offsets: vec![22, 23],
            block_offsets: [24, 40],
            block_split: 15,
        }
    }

    /// Map one activation trace onto the chain.
    ///
    /// Group scaling first (each activation group normalized independently),
    /// then the output interleave, then every region written at its offset
    /// into an all-zero frame, then the shift-register reversal. Every
    /// channel is written exactly once; untargeted channels stay dark.
    pub fn build_frame(&self, trace: &ActivationTrace) -> Result<Vec<f32>, LayoutError> {
        self.check(trace)?;
        let mut frame = vec![0.0f32; self.channel_count];

        // Input bits are already 0/1; no scaling.
        frame[self.input_offset..self.input_offset + trace.input.len()]
            .copy_from_slice(&trace.input);

        // Hidden products: min-max within the group.
        let products = min_max_scaled(&trace.hidden_products.data);
        frame[self.product_offset..self.product_offset + products.len()]
            .copy_from_slice(&products);

        // Hidden indicators: the rectifier is unbounded above, so a
        // saturating map rather than min-max.
        for (&offset, &act) in self.hidden_offsets.iter().zip(&trace.hidden_act) {
            frame[offset] = saturate(act);
        }

        // Output products woven with the class distribution, split across
        // the two connector blocks.
        let interleaved = self.interleave(trace);
        let (head, tail) = interleaved.split_at(self.block_split);
        frame[self.block_offsets[0]..self.block_offsets[0] + head.len()].copy_from_slice(head);
        frame[self.block_offsets[1]..self.block_offsets[1] + tail.len()].copy_from_slice(tail);

        // The chain is wired tail-first.
        frame.reverse();
        Ok(frame)
    }

    /// A frame lighting only the digit segments: the demo and drift path,
    /// which bypasses the network entirely.
    pub fn segment_frame(&self, levels: &[f32]) -> Result<Vec<f32>, LayoutError> {
        if levels.len() != SEGMENT_COUNT {
            return Err(LayoutError::Shape {
                region: "input",
                expected: SEGMENT_COUNT,
                got: levels.len(),
            });
        }
        self.check_region("input", self.input_offset, SEGMENT_COUNT)?;
        let mut frame = vec![0.0f32; self.channel_count];
        frame[self.input_offset..self.input_offset + levels.len()].copy_from_slice(levels);
        frame.reverse();
        Ok(frame)
    }

    /// Min-max scale the output products, then weave: per class, the H
    /// product wires followed by that class's probability wire.
    fn interleave(&self, trace: &ActivationTrace) -> Vec<f32> {
        let scaled = min_max_scaled(&trace.output_products.data);
        let classes = trace.class_count();
        let mut woven = Vec::with_capacity(scaled.len() + classes);
        for class in 0..classes {
            for unit in 0..self.hidden_width {
                woven.push(scaled[unit * classes + class]);
            }
            woven.push(trace.output[class]);
        }
        woven
    }

    fn check(&self, trace: &ActivationTrace) -> Result<(), LayoutError> {
        if trace.input.len() != SEGMENT_COUNT {
            return Err(LayoutError::Shape {
                region: "input",
                expected: SEGMENT_COUNT,
                got: trace.input.len(),
            });
        }
        if trace.hidden_width() != self.hidden_width
            || self.hidden_offsets.len() != self.hidden_width
        {
            return Err(LayoutError::Shape {
                region: "hidden",
                expected: self.hidden_width,
                got: trace.hidden_width(),
            });
        }
        let product_count = SEGMENT_COUNT * self.hidden_width;
        if trace.hidden_products.data.len() != product_count {
            return Err(LayoutError::Shape {
                region: "hidden products",
                expected: product_count,
                got: trace.hidden_products.data.len(),
            });
        }
        let classes = trace.class_count();
        let output_count = self.hidden_width * classes;
        if trace.output_products.data.len() != output_count {
            return Err(LayoutError::Shape {
                region: "output products",
                expected: output_count,
                got: trace.output_products.data.len(),
            });
        }
        let woven = output_count + classes;
        if self.block_split > woven {
            return Err(LayoutError::Shape {
                region: "interleave split",
                expected: woven,
                got: self.block_split,
            });
        }

        self.check_region("input", self.input_offset, SEGMENT_COUNT)?;
        self.check_region("hidden products", self.product_offset, product_count)?;
        for &offset in &self.hidden_offsets {
            self.check_region("hidden indicator", offset, 1)?;
        }
        self.check_region("connector block A", self.block_offsets[0], self.block_split)?;
        self.check_region(
            "connector block B",
            self.block_offsets[1],
            woven - self.block_split,
        )?;
        Ok(())
    }

    fn check_region(
        &self,
        region: &'static str,
        offset: usize,
        len: usize,
    ) -> Result<(), LayoutError> {
        let end = offset + len;
        if end > self.channel_count {
            return Err(LayoutError::Region {
                region,
                offset,
                end,
                channels: self.channel_count,
            });
        }
        Ok(())
    }
}

impl Default for WireLayout {
    fn default() -> Self {
        Self::rig()
    }
}

/// Min-max normalize a group to [0, 1]. A zero-range group maps to all-zero
/// rather than dividing by zero.
fn min_max_scaled(group: &[f32]) -> Vec<f32> {
    let Some(min) = group.iter().copied().reduce(f32::min) else {
        return Vec::new();
    };
    let max = group.iter().copied().fold(min, f32::max);
    let range = max - min;
    if range > 0.0 {
        group.iter().map(|&x| (x - min) / range).collect()
    } else {
        vec![0.0; group.len()]
    }
}

/// Saturating map for values unbounded above: x / (1 + x).
fn saturate(x: f32) -> f32 {
    x / (1.0 + x)
}
