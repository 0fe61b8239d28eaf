//! Feature tensor assembly
//!
//! Builds the four model inputs from a batch of stereo stems. Shapes are
//! validated here so a malformed batch never reaches the runtime.

use ndarray::{Array2, Array4, ArrayView1, s};

use crate::error::{MlError, MlResult};
use crate::vocab::{genre_code, instrument_code};
use crate::{MAX_TRACKS, NUM_CHANNELS};

/// One stem as seen by the builder
#[derive(Debug, Clone, Copy)]
pub struct StemInput<'a> {
    pub left: &'a [f32],
    pub right: &'a [f32],
    /// Stem name used for the instrument lookup
    pub instrument: &'a str,
}

/// Model inputs for one forward pass
#[derive(Debug, Clone)]
pub struct FeatureTensors {
    /// `genre`: int64 [1, 1]
    pub genre: Array2<i64>,
    /// `tracks`: float32 [1, T, 2, L]
    pub tracks: Array4<f32>,
    /// `instruments`: int64 [1, T]
    pub instruments: Array2<i64>,
    /// `valid_mask`: bool [1, T], currently always true
    pub valid_mask: Array2<bool>,
}

impl FeatureTensors {
    /// Tracks in the batch (T)
    pub fn num_tracks(&self) -> usize {
        self.tracks.shape()[1]
    }

    /// Samples per channel (L)
    pub fn window_len(&self) -> usize {
        self.tracks.shape()[3]
    }
}

/// Validating builder for [`FeatureTensors`]
#[derive(Debug, Clone)]
pub struct FeatureTensorBuilder {
    window_len: usize,
}

impl FeatureTensorBuilder {
    pub fn new(window_len: usize) -> Self {
        Self { window_len }
    }

    pub fn window_len(&self) -> usize {
        self.window_len
    }

    /// Assemble tensors for `genre` and `stems`, in stem order
    pub fn build(&self, genre: &str, stems: &[StemInput<'_>]) -> MlResult<FeatureTensors> {
        let num_tracks = stems.len();

        if num_tracks == 0 || num_tracks > MAX_TRACKS {
            return Err(MlError::InvalidInputShape {
                expected: format!("1..={MAX_TRACKS} tracks"),
                got: format!("{num_tracks} tracks"),
            });
        }

        let mut tracks = Array4::<f32>::zeros((1, num_tracks, NUM_CHANNELS, self.window_len));

        for (index, stem) in stems.iter().enumerate() {
            for (channel, samples) in [stem.left, stem.right].into_iter().enumerate() {
                if samples.len() != self.window_len {
                    return Err(MlError::InvalidInputShape {
                        expected: format!("{} samples per channel", self.window_len),
                        got: format!(
                            "{} samples in track {index} channel {channel}",
                            samples.len()
                        ),
                    });
                }
                tracks
                    .slice_mut(s![0, index, channel, ..])
                    .assign(&ArrayView1::from(samples));
            }
        }

        let codes: Vec<i64> = stems.iter().map(|s| instrument_code(s.instrument)).collect();
        let instruments = Array2::from_shape_vec((1, num_tracks), codes).map_err(|e| {
            MlError::InvalidInputShape {
                expected: format!("[1, {num_tracks}]"),
                got: e.to_string(),
            }
        })?;

        Ok(FeatureTensors {
            genre: Array2::from_elem((1, 1), genre_code(genre)),
            tracks,
            instruments,
            valid_mask: Array2::from_elem((1, num_tracks), true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stem<'a>(left: &'a [f32], right: &'a [f32], instrument: &'a str) -> StemInput<'a> {
        StemInput {
            left,
            right,
            instrument,
        }
    }

    #[test]
    fn test_shapes_and_layout() {
        let builder = FeatureTensorBuilder::new(3);
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        let c = [7.0, 8.0, 9.0];

        let tensors = builder
            .build("Rock", &[stem(&a, &b, "Vocal_Lead"), stem(&c, &c, "Drums_Kit")])
            .unwrap();

        assert_eq!(tensors.genre.shape(), &[1, 1]);
        assert_eq!(tensors.genre[[0, 0]], 6);
        assert_eq!(tensors.tracks.shape(), &[1, 2, 2, 3]);
        assert_eq!(tensors.num_tracks(), 2);
        assert_eq!(tensors.window_len(), 3);

        // batch, track, channel, sample
        assert_eq!(tensors.tracks[[0, 0, 0, 2]], 3.0);
        assert_eq!(tensors.tracks[[0, 0, 1, 0]], 4.0);
        assert_eq!(tensors.tracks[[0, 1, 1, 1]], 8.0);

        assert_eq!(tensors.instruments.as_slice().unwrap(), &[16, 8]);
        assert!(tensors.valid_mask.iter().all(|&v| v));
        assert_eq!(tensors.valid_mask.shape(), &[1, 2]);
    }

    #[test]
    fn test_unknown_genre_encodes_as_unknown() {
        let builder = FeatureTensorBuilder::new(1);
        let x = [0.0];
        let tensors = builder.build("Reggae", &[stem(&x, &x, "bass")]).unwrap();
        assert_eq!(tensors.genre[[0, 0]], 9);
    }

    #[test]
    fn test_empty_batch_is_shape_error() {
        let err = FeatureTensorBuilder::new(4).build("Pop", &[]).unwrap_err();
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_oversized_batch_is_shape_error() {
        let x = [0.0];
        let stems = vec![stem(&x, &x, "synth"); MAX_TRACKS + 1];
        let err = FeatureTensorBuilder::new(1).build("Pop", &stems).unwrap_err();
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_wrong_window_is_shape_error() {
        let short = [0.0; 2];
        let full = [0.0; 3];
        let err = FeatureTensorBuilder::new(3)
            .build("Jazz", &[stem(&full, &short, "keys")])
            .unwrap_err();
        assert!(matches!(err, MlError::InvalidInputShape { .. }));
    }
}
