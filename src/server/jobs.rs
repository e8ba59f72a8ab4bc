//! In-memory job tracking for the asynchronous generate API

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

use crate::orchestrator::GenerationMode;
use crate::styles::StylePreset;

/// Finished jobs kept for status and download before the oldest are dropped
pub const DEFAULT_FINISHED_JOB_LIMIT: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub job_id: String,
    pub prompt: String,
    pub style: StylePreset,
    pub mode: GenerationMode,
    pub target: String,
    pub status: JobStatus,
    pub result_path: Option<PathBuf>,
    pub error: Option<String>,
    pub notices: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub duration_seconds: Option<f64>,
}

impl Job {
    pub fn new(prompt: String, style: StylePreset, mode: GenerationMode, target: String) -> Self {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        Self {
            job_id: uuid[..8].to_string(),
            prompt,
            style,
            mode,
            target,
            status: JobStatus::Queued,
            result_path: None,
            error: None,
            notices: Vec::new(),
            created_at: Utc::now(),
            duration_seconds: None,
        }
    }
}

/// Thread-safe job table
///
/// Queued and running jobs are always kept; finished ones beyond
/// `finished_limit` are evicted oldest first on insert.
#[derive(Debug)]
pub struct JobStore {
    jobs: Mutex<HashMap<String, Job>>,
    finished_limit: usize,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::with_finished_limit(DEFAULT_FINISHED_JOB_LIMIT)
    }
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_finished_limit(finished_limit: usize) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            finished_limit,
        }
    }

    pub fn insert(&self, job: Job) -> String {
        let id = job.job_id.clone();
        let mut jobs = self.lock();
        jobs.insert(id.clone(), job);
        evict_finished(&mut jobs, self.finished_limit);
        id
    }

    pub fn get(&self, job_id: &str) -> Option<Job> {
        self.lock().get(job_id).cloned()
    }

    /// Apply `f` to the job if it exists
    pub fn update<F>(&self, job_id: &str, f: F)
    where
        F: FnOnce(&mut Job),
    {
        if let Some(job) = self.lock().get_mut(job_id) {
            f(job);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Job>> {
        // Poisoning is ignored: the map only holds plain data
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn evict_finished(jobs: &mut HashMap<String, Job>, limit: usize) {
    let mut finished: Vec<(DateTime<Utc>, String)> = jobs
        .values()
        .filter(|job| job.status.is_finished())
        .map(|job| (job.created_at, job.job_id.clone()))
        .collect();
    if finished.len() <= limit {
        return;
    }
    finished.sort();
    let excess = finished.len() - limit;
    for (_, id) in finished.into_iter().take(excess) {
        jobs.remove(&id);
    }
    debug!(evicted = excess, "dropped old finished jobs");
}
