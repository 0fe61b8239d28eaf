//! Live job state
//!
//! One writer (the supervisor of the active job), any number of readers.
//! Readers only ever see cloned snapshots.

use parking_lot::RwLock;

use crate::error::{ErrorKind, JobError};
use crate::track::{JobStatus, MixSnapshot, ParameterScale, Track};

/// Unique job identifier
pub type JobId = u64;

#[derive(Debug, Default)]
struct MixJob {
    id: JobId,
    status: JobStatus,
    genre: Option<String>,
    tracks: Vec<Track>,
    error: Option<(ErrorKind, String)>,
    scale: Option<ParameterScale>,
}

/// Holds the latest track list and job status for polling
#[derive(Debug, Default)]
pub struct MixParameterStore {
    job: RwLock<MixJob>,
}

impl MixParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MixSnapshot {
        let job = self.job.read();
        MixSnapshot {
            job_id: job.id,
            status: job.status,
            is_processing: job.status == JobStatus::Processing,
            genre: job.genre.clone(),
            tracks: job.tracks.clone(),
            error: job.error.as_ref().map(|(_, message)| message.clone()),
            error_kind: job.error.as_ref().map(|(kind, _)| *kind),
            scale: job.scale,
        }
    }

    /// Genre of the live job, if any job has run
    pub fn genre(&self) -> Option<String> {
        self.job.read().genre.clone()
    }

    /// Start job `id`. Previous tracks stay visible until it finishes.
    pub(crate) fn begin(&self, id: JobId, genre: &str) {
        let mut job = self.job.write();
        job.id = id;
        job.status = JobStatus::Processing;
        job.genre = Some(genre.to_string());
        job.error = None;
    }

    /// Finish job `id` successfully. Ignored if `id` is no longer live.
    pub(crate) fn complete(&self, id: JobId, tracks: Vec<Track>, scale: ParameterScale) -> bool {
        let mut job = self.job.write();
        if job.id != id || job.status != JobStatus::Processing {
            return false;
        }
        job.status = JobStatus::Completed;
        job.tracks = tracks;
        job.scale = Some(scale);
        true
    }

    /// Fail job `id` with a degraded track list. Ignored if `id` is no
    /// longer live.
    pub(crate) fn fail(&self, id: JobId, error: &JobError, tracks: Vec<Track>) -> bool {
        let mut job = self.job.write();
        if job.id != id || job.status != JobStatus::Processing {
            return false;
        }
        job.status = JobStatus::Failed;
        job.tracks = tracks;
        job.error = Some((error.kind(), error.to_string()));
        job.scale = None;
        true
    }
}
