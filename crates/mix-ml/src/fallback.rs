//! Deterministic mix presets
//!
//! Used in place of the model when no artifact is deployed. Gains are in
//! dB, pans in percent of full deflection (-100 = hard left). Slots follow
//! the fixed track order: vocal, guitar, bass, drums, piano, strings,
//! synth, percussion.

use crate::MAX_TRACKS;
use crate::vocab::Genre;

/// Fixed stereo spread, percent
pub const FALLBACK_PANS: [f32; MAX_TRACKS] = [-30.0, 30.0, 0.0, 0.0, -15.0, 15.0, -45.0, 45.0];

const CLASSICAL_GAINS: [f32; MAX_TRACKS] = [-4.0, -5.0, -3.0, -6.0, -2.0, -1.0, -6.0, -5.0];
const ELECTRONIC_GAINS: [f32; MAX_TRACKS] = [-3.0, -5.0, 0.0, -1.0, -5.0, -6.0, -2.0, -3.0];
const JAZZ_GAINS: [f32; MAX_TRACKS] = [-2.0, -3.0, -2.0, -4.0, -2.0, -4.0, -6.0, -5.0];
const MUSICAL_THEATRE_GAINS: [f32; MAX_TRACKS] = [-1.0, -4.0, -3.0, -4.0, -3.0, -2.0, -5.0, -5.0];
const POP_GAINS: [f32; MAX_TRACKS] = [-2.0, -3.0, -1.0, -2.0, -4.0, -5.0, -3.0, -4.0];
const RAP_GAINS: [f32; MAX_TRACKS] = [-1.0, -6.0, 0.0, -1.0, -5.0, -6.0, -3.0, -3.0];
const ROCK_GAINS: [f32; MAX_TRACKS] = [-2.0, -1.0, -2.0, -1.0, -5.0, -6.0, -5.0, -4.0];
const SINGER_SONGWRITER_GAINS: [f32; MAX_TRACKS] = [-1.0, -2.0, -4.0, -5.0, -3.0, -4.0, -6.0, -5.0];
const WORLD_FOLK_GAINS: [f32; MAX_TRACKS] = [-2.0, -2.0, -4.0, -5.0, -4.0, -3.0, -6.0, -2.0];

/// Gain preset for a genre label, in dB. Unrecognised genres get the Pop
/// preset.
pub fn fallback_gains(genre: &str) -> [f32; MAX_TRACKS] {
    match Genre::parse(genre) {
        Genre::Classical => CLASSICAL_GAINS,
        Genre::ElectronicFusion => ELECTRONIC_GAINS,
        Genre::Jazz => JAZZ_GAINS,
        Genre::MusicalTheatre => MUSICAL_THEATRE_GAINS,
        Genre::Rap => RAP_GAINS,
        Genre::Rock => ROCK_GAINS,
        Genre::SingerSongwriter => SINGER_SONGWRITER_GAINS,
        Genre::WorldFolk => WORLD_FOLK_GAINS,
        Genre::Pop | Genre::Unknown => POP_GAINS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_preset() {
        assert_eq!(
            fallback_gains("Pop"),
            [-2.0, -3.0, -1.0, -2.0, -4.0, -5.0, -3.0, -4.0]
        );
        assert_eq!(
            FALLBACK_PANS,
            [-30.0, 30.0, 0.0, 0.0, -15.0, 15.0, -45.0, 45.0]
        );
    }

    #[test]
    fn test_unknown_genre_uses_pop() {
        assert_eq!(fallback_gains("Reggae"), fallback_gains("Pop"));
        assert_eq!(fallback_gains(""), fallback_gains("Pop"));
        // Labels are case-sensitive
        assert_eq!(fallback_gains("rock"), fallback_gains("Pop"));
        assert_ne!(fallback_gains("Rock"), fallback_gains("Pop"));
    }

    #[test]
    fn test_every_known_genre_has_a_distinct_preset() {
        let known: Vec<Genre> = Genre::ALL.into_iter().filter(Genre::is_known).collect();
        for (i, a) in known.iter().enumerate() {
            for b in &known[i + 1..] {
                assert_ne!(fallback_gains(a.label()), fallback_gains(b.label()), "{a:?} vs {b:?}");
            }
        }
    }
}
