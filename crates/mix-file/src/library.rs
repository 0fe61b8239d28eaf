//! Sample directory listing
//!
//! The pipeline reads its stems from one flat directory. Listing order is
//! the file-name order so repeated jobs always see the same batch.

use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::{AudioFormat, FileResult};

/// One audio file available to the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleEntry {
    /// File name including extension
    pub name: String,
    /// Full path to the file
    pub path: PathBuf,
}

impl SampleEntry {
    /// File name without its extension
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }
}

/// Flat directory of stems
#[derive(Debug, Clone)]
pub struct SampleLibrary {
    root: PathBuf,
}

impl SampleLibrary {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All supported audio files directly inside the directory, sorted by
    /// file name. A missing directory is an empty library.
    pub fn list(&self) -> FileResult<Vec<SampleEntry>> {
        if !self.root.exists() {
            log::debug!("Sample directory {} does not exist", self.root.display());
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !AudioFormat::from_path(path).is_supported() {
                continue;
            }

            entries.push(SampleEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: path.to_path_buf(),
            });
        }

        Ok(entries)
    }

    /// The first `max` entries of [`SampleLibrary::list`]
    pub fn batch(&self, max: usize) -> FileResult<Vec<SampleEntry>> {
        let mut entries = self.list()?;
        if entries.len() > max {
            log::info!(
                "{} samples found, using the first {}",
                entries.len(),
                max
            );
            entries.truncate(max);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_list_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b_two.wav", "a_one.WAV", "notes.txt", "c_three.flac"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.wav")).unwrap();

        let library = SampleLibrary::new(dir.path());
        let names: Vec<String> = library.list().unwrap().into_iter().map(|e| e.name).collect();

        assert_eq!(names, vec!["a_one.WAV", "b_two.wav", "c_three.flac"]);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let library = SampleLibrary::new(dir.path().join("missing"));
        assert!(library.list().unwrap().is_empty());
    }

    #[test]
    fn test_batch_caps_count() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..10 {
            fs::write(dir.path().join(format!("track_{i:02}.wav")), b"").unwrap();
        }

        let batch = SampleLibrary::new(dir.path()).batch(8).unwrap();
        assert_eq!(batch.len(), 8);
        assert_eq!(batch[0].name, "track_00.wav");
        assert_eq!(batch[7].name, "track_07.wav");
    }

    #[test]
    fn test_entry_stem() {
        let entry = SampleEntry {
            name: "Vocal_Lead.wav".into(),
            path: PathBuf::from("/samples/Vocal_Lead.wav"),
        };
        assert_eq!(entry.stem(), "Vocal_Lead");
    }
}
