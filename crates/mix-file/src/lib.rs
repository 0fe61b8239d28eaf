//! mix-file: stem discovery and decoding for the mix pipeline
//!
//! - Sample directory listing (stable, name-sorted)
//! - WAV decoding (via hound)
//! - AIFF / FLAC decoding (via symphonia)
//! - Fixed-length stereo windows fed to the tensor builder

mod audio_file;
mod error;
mod library;
mod loader;

pub use audio_file::*;
pub use error::*;
pub use library::*;
pub use loader::*;
