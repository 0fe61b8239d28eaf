//! Model output denormalization
//!
//! The model emits gain and pan in [0, 1]. Gain was trained against a
//! -48..+12 dB range but is delivered on a -48..+6 dB normalized scale, so
//! the remap goes through dB explicitly and clamps at the +6 dB ceiling.

use serde::{Deserialize, Serialize};

use crate::MAX_TRACKS;

/// Lower edge of every gain range, in dB
pub const GAIN_FLOOR_DB: f32 = -48.0;

/// Width of the training gain range (-48..+12 dB)
pub const TRAINING_SPAN_DB: f32 = 60.0;

/// Width of the delivered gain range (-48..+6 dB)
pub const TARGET_SPAN_DB: f32 = 54.0;

/// Raw gain in [0, 1] → normalized gain in [0, 1] on the -48..+6 dB scale
pub fn denorm_gain(v: f32) -> f32 {
    let db_old = GAIN_FLOOR_DB + v * TRAINING_SPAN_DB;
    let g = (db_old - GAIN_FLOOR_DB) / TARGET_SPAN_DB;
    g.clamp(0.0, 1.0)
}

/// Raw pan in [0, 1] → pan in [-1, 1]
pub fn denorm_pan(v: f32) -> f32 {
    v * 2.0 - 1.0
}

/// Per-track parameters in delivery units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MixParams {
    pub gain: f32,
    pub pan: f32,
}

/// Split a raw output vector into per-track parameters.
///
/// Gains live at `raw[0..8]`, pans at `raw[8..16]`, index-aligned with the
/// input batch. Only the first `tracks` entries are returned; slots the
/// output doesn't cover are skipped.
pub fn denormalize(raw: &[f32], tracks: usize) -> Vec<MixParams> {
    (0..tracks.min(MAX_TRACKS))
        .filter_map(|i| {
            let gain = raw.get(i)?;
            let pan = raw.get(MAX_TRACKS + i)?;
            Some(MixParams {
                gain: denorm_gain(*gain),
                pan: denorm_pan(*pan),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gain_endpoints() {
        assert_relative_eq!(denorm_gain(0.0), 0.0);
        // +12 dB maps to 60/54 before the clamp
        assert_relative_eq!(denorm_gain(1.0), 1.0);
        // +6 dB is exactly the ceiling
        assert_relative_eq!(denorm_gain(0.9), 1.0, epsilon = 1e-6);
        assert_relative_eq!(denorm_gain(0.45), 27.0 / 54.0, epsilon = 1e-6);
    }

    #[test]
    fn test_gain_is_clamped_for_any_finite_input() {
        for v in [-1e30_f32, -5.0, -0.1, 1.5, 7.0, 1e30] {
            let g = denorm_gain(v);
            assert!((0.0..=1.0).contains(&g), "gain {g} for input {v}");
        }
    }

    #[test]
    fn test_pan_mapping() {
        assert_relative_eq!(denorm_pan(0.0), -1.0);
        assert_relative_eq!(denorm_pan(0.5), 0.0);
        assert_relative_eq!(denorm_pan(1.0), 1.0);
    }

    #[test]
    fn test_bounded_and_monotonic_on_unit_interval() {
        let mut prev_gain = f32::MIN;
        let mut prev_pan = f32::MIN;
        for step in 0..=1000 {
            let v = step as f32 / 1000.0;
            let g = denorm_gain(v);
            let p = denorm_pan(v);

            assert!((0.0..=1.0).contains(&g));
            assert!((-1.0..=1.0).contains(&p));
            assert!(g >= prev_gain);
            assert!(p >= prev_pan);

            prev_gain = g;
            prev_pan = p;
        }
    }

    #[test]
    fn test_denormalize_aligns_gain_and_pan() {
        let mut raw = vec![0.0; 16];
        raw[0] = 0.45;
        raw[1] = 0.0;
        raw[8] = 1.0;
        raw[9] = 0.25;

        let params = denormalize(&raw, 2);
        assert_eq!(params.len(), 2);
        assert_relative_eq!(params[0].gain, 0.5, epsilon = 1e-6);
        assert_relative_eq!(params[0].pan, 1.0);
        assert_relative_eq!(params[1].gain, 0.0);
        assert_relative_eq!(params[1].pan, -0.5);
    }

    #[test]
    fn test_denormalize_caps_at_batch_size() {
        let raw = vec![0.5; 32];
        assert_eq!(denormalize(&raw, 12).len(), MAX_TRACKS);
        // No pan slots present
        assert!(denormalize(&raw[..4], 8).is_empty());
    }
}
