//! PWM bitstream encoding for the driver chain: gamma correction, 12-bit
//! quantization, and bit packing into the wire frame.

/// Bits per channel in the drivers' grayscale registers.
pub const PWM_BITS: usize = 12;

/// Full-scale grayscale level.
pub const PWM_MAX: u16 = 4095;

/// Perceptual gamma. Linear duty cycle reads far brighter than intended
/// around the midpoint; 2.8 is the usual LED correction exponent.
const GAMMA: f32 = 2.8;

/// Quantization scale. Just under 4096 so an input of exactly 1.0 truncates
/// to 4095 instead of overflowing the 12-bit field.
const QUANT_SCALE: f64 = 4095.999_999_999_9;

/// Gamma-corrected brightness, clamped to [0, 1].
pub fn gamma(value: f32) -> f32 {
    value.clamp(0.0, 1.0).powf(GAMMA)
}

/// Truncating 12-bit quantization of a [0, 1] brightness.
///
/// The scale constant must be applied in f64: rounded to f32 it becomes
/// exactly 4096.0 and an input of 1.0 would overflow the field.
pub fn quantize(value: f32) -> u16 {
    (f64::from(value.clamp(0.0, 1.0)) * QUANT_SCALE) as u16
}

/// Concatenates 12-bit big-endian fields in input order. A trailing partial
/// byte is zero-padded on the low side.
pub fn pack_levels<I>(levels: I) -> Vec<u8>
where
    I: IntoIterator<Item = u16>,
{
    let mut out = Vec::new();
    let mut acc: u32 = 0;
    let mut pending: u32 = 0;
    for level in levels {
        acc = (acc << PWM_BITS) | u32::from(level & PWM_MAX);
        pending += PWM_BITS as u32;
        while pending >= 8 {
            pending -= 8;
            out.push((acc >> pending) as u8);
            acc &= (1u32 << pending) - 1;
        }
    }
    if pending > 0 {
        out.push((acc << (8 - pending)) as u8);
    }
    out
}

/// One brightness frame to wire bytes: clamp, gamma, quantize, pack, in
/// input order. Total function; the clamp makes bounds violations impossible.
pub fn encode_frame(values: &[f32]) -> Vec<u8> {
    pack_levels(values.iter().map(|&value| quantize(gamma(value))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_alternating_frame_packs_to_known_bytes() {
        let levels = [0.0f32, 1.0, 0.0, 1.0].iter().map(|&v| quantize(v));
        let frame = pack_levels(levels);
        // Four 12-bit fields: 000 FFF 000 FFF.
        assert_eq!(frame, vec![0x00, 0x0F, 0xFF, 0x00, 0x0F, 0xFF]);
    }

    #[test]
    fn quantize_hits_the_endpoints_exactly() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(1.0), PWM_MAX);
        assert_eq!(quantize(2.0), PWM_MAX);
        assert_eq!(quantize(-1.0), 0);
    }

    #[test]
    fn gamma_is_identity_at_the_extremes() {
        assert_eq!(quantize(gamma(0.0)), 0);
        assert_eq!(quantize(gamma(1.0)), PWM_MAX);
    }

    #[test]
    fn gamma_darkens_the_midrange() {
        let linear = quantize(0.5);
        let corrected = quantize(gamma(0.5));
        assert!(corrected < linear);
        assert!(corrected > 0);
    }

    #[test]
    fn packing_length_is_ceil_of_twelve_bits_per_level() {
        for count in 0..16 {
            let frame = pack_levels(std::iter::repeat(0u16).take(count));
            assert_eq!(frame.len(), (count * PWM_BITS).div_ceil(8));
        }
    }

    #[test]
    fn trailing_partial_byte_is_zero_padded_low() {
        assert_eq!(pack_levels([0xFFFu16]), vec![0xFF, 0xF0]);
        assert_eq!(pack_levels([0x801u16]), vec![0x80, 0x10]);
    }

    #[test]
    fn oversized_levels_are_masked_to_the_field_width() {
        assert_eq!(pack_levels([0xFFFFu16, 0]), vec![0xFF, 0xF0, 0x00]);
    }

    #[test]
    fn encode_frame_is_gamma_then_quantize_then_pack() {
        let frame = encode_frame(&[0.0, 1.0]);
        assert_eq!(frame, vec![0x00, 0x0F, 0xFF]);
    }
}
