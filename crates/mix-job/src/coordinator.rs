//! Single-flight mix job coordination
//!
//! At most one pipeline runs at a time. A trigger claims the processing
//! flag, records the job in the store and hands the pipeline to a blocking
//! worker. A supervisor task waits for the worker (bounded by the job
//! timeout), writes the outcome to the store, resolves the ticket and
//! releases the flag. A timed-out job is published as failed right away,
//! but the flag stays claimed until its worker thread has returned. A
//! failed job still publishes the sample listing, with no parameters, so
//! clients can show what was attempted.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use mix_file::{SampleEntry, SampleLibrary};
use mix_ml::MAX_TRACKS;
use tokio::sync::oneshot;

use crate::backend::{MixBackend, MixPrediction, select_backend};
use crate::config::JobConfig;
use crate::error::{JobError, JobResult};
use crate::store::{JobId, MixParameterStore};
use crate::track::{MixSnapshot, Track, listing_tracks};

/// What the worker thread hands back to the supervisor
struct PipelineOutcome {
    samples: Vec<SampleEntry>,
    result: JobResult<MixPrediction>,
}

struct Inner {
    backend: Arc<dyn MixBackend>,
    library: SampleLibrary,
    store: MixParameterStore,
    processing: AtomicBool,
    next_id: AtomicU64,
    timeout: Option<Duration>,
}

impl Inner {
    /// Runs on a blocking thread
    fn run_pipeline(&self, genre: &str) -> PipelineOutcome {
        let samples = match self.library.batch(MAX_TRACKS) {
            Ok(samples) => samples,
            Err(e) => {
                return PipelineOutcome {
                    samples: Vec::new(),
                    result: Err(e.into()),
                };
            }
        };

        if samples.is_empty() {
            return PipelineOutcome {
                samples,
                result: Err(JobError::NoSamples),
            };
        }

        log::info!(
            "Mixing {} samples from {} for genre '{}' with {} backend",
            samples.len(),
            self.library.root().display(),
            genre,
            self.backend.name()
        );

        let result = self.backend.predict(genre, &samples);
        PipelineOutcome { samples, result }
    }

    /// Best-effort listing for jobs whose worker never reported back
    fn degraded_listing(&self) -> Vec<SampleEntry> {
        self.library.batch(MAX_TRACKS).unwrap_or_else(|e| {
            log::warn!("Could not list samples for failed job: {}", e);
            Vec::new()
        })
    }
}

/// Handle on a triggered job
#[derive(Debug)]
pub struct JobTicket {
    job_id: JobId,
    rx: oneshot::Receiver<MixSnapshot>,
}

impl JobTicket {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Wait for the job to reach a terminal state
    pub async fn wait(self) -> JobResult<MixSnapshot> {
        self.rx
            .await
            .map_err(|_| JobError::Worker("job supervisor exited without a result".into()))
    }
}

/// Owns the store and the processing flag. Cheap to clone.
#[derive(Clone)]
pub struct MixJobCoordinator {
    inner: Arc<Inner>,
}

impl MixJobCoordinator {
    pub fn new(backend: Arc<dyn MixBackend>, library: SampleLibrary, timeout: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                library,
                store: MixParameterStore::new(),
                processing: AtomicBool::new(false),
                next_id: AtomicU64::new(1),
                timeout,
            }),
        }
    }

    /// Coordinator with the backend chosen from the configured model path
    pub fn from_config(config: &JobConfig) -> Self {
        Self::new(
            select_backend(config.model_path.clone()),
            SampleLibrary::new(config.samples_dir.clone()),
            config.job_timeout(),
        )
    }

    pub fn backend_name(&self) -> &'static str {
        self.inner.backend.name()
    }

    pub fn is_processing(&self) -> bool {
        self.inner.processing.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> MixSnapshot {
        self.inner.store.snapshot()
    }

    /// Every sample in the library, not capped to a batch
    pub fn list_samples(&self) -> JobResult<Vec<SampleEntry>> {
        Ok(self.inner.library.list()?)
    }

    /// Start a job for `genre`. Must be called from within a tokio runtime.
    ///
    /// Fails with [`JobError::MissingGenre`] for a blank genre and with
    /// [`JobError::Conflict`] while another job is processing; neither
    /// touches the store.
    pub fn trigger(&self, genre: &str) -> JobResult<JobTicket> {
        let genre = genre.trim();
        if genre.is_empty() {
            return Err(JobError::MissingGenre);
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| JobError::Worker(e.to_string()))?;

        if self
            .inner
            .processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(JobError::Conflict {
                genre: self.inner.store.genre().unwrap_or_default(),
            });
        }

        let job_id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.store.begin(job_id, genre);
        log::info!("Mix job {} started (genre: {})", job_id, genre);

        let (tx, rx) = oneshot::channel();
        runtime.spawn(supervise(self.inner.clone(), job_id, genre.to_string(), tx));

        Ok(JobTicket { job_id, rx })
    }

    /// Current snapshot. When `genre` is given, differs from the live job's
    /// genre and nothing is processing, a job for it is started first.
    pub fn status(&self, genre: Option<&str>) -> MixSnapshot {
        let requested = genre.map(str::trim).filter(|g| !g.is_empty());

        if let Some(genre) = requested {
            let current = self.inner.store.genre();
            if !self.is_processing() && current.as_deref() != Some(genre) {
                match self.trigger(genre) {
                    Ok(ticket) => {
                        log::debug!("Status poll started mix job {}", ticket.job_id());
                    }
                    Err(JobError::Conflict { .. }) => {}
                    Err(e) => log::warn!("Could not start mix job from status poll: {}", e),
                }
            }
        }

        self.snapshot()
    }
}

async fn supervise(
    inner: Arc<Inner>,
    job_id: JobId,
    genre: String,
    tx: oneshot::Sender<MixSnapshot>,
) {
    let mut worker = {
        let inner = inner.clone();
        let genre = genre.clone();
        tokio::task::spawn_blocking(move || inner.run_pipeline(&genre))
    };

    // None: the time limit fired and the worker is still running
    let joined = match inner.timeout {
        Some(limit) => tokio::time::timeout(limit, &mut worker).await.ok(),
        None => Some((&mut worker).await),
    };

    let (outcome, orphan) = match joined {
        Some(Ok(outcome)) => (outcome, None),
        Some(Err(e)) => (
            PipelineOutcome {
                samples: inner.degraded_listing(),
                result: Err(JobError::Worker(e.to_string())),
            },
            None,
        ),
        None => {
            let limit = inner.timeout.unwrap_or_default();
            (
                PipelineOutcome {
                    samples: inner.degraded_listing(),
                    result: Err(JobError::Timeout { limit }),
                },
                Some(worker),
            )
        }
    };

    let mut tracks = listing_tracks(&outcome.samples);
    match outcome.result {
        Ok(prediction) => {
            for (track, params) in tracks.iter_mut().zip(&prediction.params) {
                track.gain = Some(params.gain);
                track.pan = Some(params.pan);
            }
            log_tracks(job_id, &tracks);
            inner.store.complete(job_id, tracks, prediction.scale);
        }
        Err(e) => {
            log::error!("Mix job {} failed: {}", job_id, e);
            inner.store.fail(job_id, &e, tracks);
        }
    }

    // Captured while the flag is still held, so no later job can replace it
    let snapshot = inner.store.snapshot();

    match orphan {
        None => {
            inner.processing.store(false, Ordering::Release);
            // Nobody waiting is fine
            let _ = tx.send(snapshot);
        }
        Some(orphan) => {
            let _ = tx.send(snapshot);
            log::warn!(
                "Mix job {} abandoned, waiting for its worker before accepting new jobs",
                job_id
            );
            if let Err(e) = orphan.await {
                log::warn!("Abandoned mix worker {} failed: {}", job_id, e);
            }
            inner.processing.store(false, Ordering::Release);
        }
    }
}

fn log_tracks(job_id: JobId, tracks: &[Track]) {
    for track in tracks {
        log::info!(
            "Job {} track {} ({}): gain={:?} pan={:?}",
            job_id,
            track.id,
            track.display_name,
            track.gain,
            track.pan
        );
    }
}
