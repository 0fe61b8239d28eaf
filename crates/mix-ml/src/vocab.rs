//! Categorical vocabularies shared with the mix model
//!
//! Codes are part of the model contract: reordering either table silently
//! changes what the model sees.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// GENRE
// ═══════════════════════════════════════════════════════════════════════════════

/// Genre labels the model was trained on, in code order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Classical,
    ElectronicFusion,
    Jazz,
    MusicalTheatre,
    Pop,
    Rap,
    Rock,
    SingerSongwriter,
    WorldFolk,
    Unknown,
}

impl Genre {
    /// Every genre in code order
    pub const ALL: [Genre; 10] = [
        Genre::Classical,
        Genre::ElectronicFusion,
        Genre::Jazz,
        Genre::MusicalTheatre,
        Genre::Pop,
        Genre::Rap,
        Genre::Rock,
        Genre::SingerSongwriter,
        Genre::WorldFolk,
        Genre::Unknown,
    ];

    /// Label as exchanged with clients
    pub fn label(&self) -> &'static str {
        match self {
            Genre::Classical => "Classical",
            Genre::ElectronicFusion => "Electronic/Fusion",
            Genre::Jazz => "Jazz",
            Genre::MusicalTheatre => "Musical Theatre",
            Genre::Pop => "Pop",
            Genre::Rap => "Rap",
            Genre::Rock => "Rock",
            Genre::SingerSongwriter => "Singer/Songwriter",
            Genre::WorldFolk => "World/Folk",
            Genre::Unknown => "Unknown",
        }
    }

    /// Model input code
    pub fn code(&self) -> i64 {
        *self as i64
    }

    /// Look up a client label. Surrounding whitespace is ignored, the rest
    /// must match exactly; anything else is [`Genre::Unknown`].
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|g| g.label() == label)
            .unwrap_or(Genre::Unknown)
    }

    pub fn is_known(&self) -> bool {
        *self != Genre::Unknown
    }
}

/// Genre code for a raw label
pub fn genre_code(label: &str) -> i64 {
    Genre::parse(label).code()
}

// ═══════════════════════════════════════════════════════════════════════════════
// INSTRUMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Instrument category keys, in code order
pub const INSTRUMENT_KEYS: [&str; 18] = [
    "aux_perc",
    "bass",
    "brass",
    "drum",
    "fx",
    "guitar",
    "keys",
    "kick",
    "misc",
    "organ",
    "percussion",
    "room",
    "silence",
    "snare",
    "string",
    "synth",
    "vocal",
    "woodwind",
];

/// Catch-all category
pub const MISC_INSTRUMENT: &str = "misc";

/// Category key for a stem name: text before the first underscore,
/// lowercased. Unmatched prefixes fall back to `misc`.
pub fn instrument_key(name: &str) -> &'static str {
    let prefix = name.split('_').next().unwrap_or_default().to_lowercase();
    INSTRUMENT_KEYS
        .iter()
        .find(|&&key| key == prefix)
        .copied()
        .unwrap_or(MISC_INSTRUMENT)
}

/// Model input code for a stem name
pub fn instrument_code(name: &str) -> i64 {
    let key = instrument_key(name);
    INSTRUMENT_KEYS
        .iter()
        .position(|&k| k == key)
        .unwrap_or_default() as i64
}

/// Display labels for the fixed track slots
pub const SLOT_LABELS: [&str; 8] = [
    "Vocal",
    "Guitar",
    "Bass",
    "Drums",
    "Piano",
    "Strings",
    "Synth",
    "Percussion",
];

/// Label shown for slots past the fixed list
pub const OTHER_LABEL: &str = "Other";

/// Display label for a track slot
pub fn slot_label(index: usize) -> &'static str {
    SLOT_LABELS.get(index).copied().unwrap_or(OTHER_LABEL)
}
