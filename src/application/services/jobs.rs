//! Job listing, logs and configuration pass-throughs.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::error_ext::{ApiResultExt, IoResultExt};
use crate::application::ApplicationResult;
use crate::domain::{ConfigDocument, JobEntry, JobPath, JobStatus};
use crate::infrastructure::traits::{ApiResult, FileSystem, JenkinsApi};

/// Folder recursion depth used when listing below the root.
pub const NESTED_FOLDER_DEPTH: usize = 5;

/// One listed job, optionally enriched with its last build status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRow {
    pub entry: JobEntry,
    /// `None` when status was not requested or the entry is a folder.
    pub status: Option<JobStatus>,
}

/// Console output of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLog {
    pub number: u64,
    pub text: String,
}

/// Service for job-level operations.
pub struct JobService {
    api: Arc<dyn JenkinsApi>,
    fs: Arc<dyn FileSystem>,
}

impl JobService {
    /// Create a new job service.
    pub fn new(api: Arc<dyn JenkinsApi>, fs: Arc<dyn FileSystem>) -> Self {
        Self { api, fs }
    }

    /// List jobs under `path`.
    ///
    /// The root lists top-level entries only and applies no filtering. Any
    /// other path recurses into folders and keeps entries whose full name
    /// contains the path. With `with_status`, each job gets its last build
    /// fetched; a failed fetch marks only that row.
    pub fn list_jobs(
        &self,
        path: &JobPath,
        with_status: bool,
        filter: Option<&str>,
    ) -> ApplicationResult<Vec<JobRow>> {
        let depth = if path.is_root() { 0 } else { NESTED_FOLDER_DEPTH };
        debug!("list_jobs: path={}, depth={}", path, depth);

        let entries = self
            .api
            .get_jobs(depth)
            .with_operation(format!("list jobs under {path}"))?;

        let needle = path.to_string();
        let filter = filter.map(str::to_uppercase);
        let mut rows = Vec::new();

        for entry in entries {
            if !path.is_root() && !entry.fullname.contains(&needle) {
                continue;
            }

            let status = if with_status && !entry.is_folder() {
                Some(self.job_status(&entry))
            } else {
                None
            };

            if let (Some(wanted), true) = (&filter, with_status) {
                match &status {
                    Some(s) if s.label().contains(wanted.as_str()) => {}
                    _ => continue,
                }
            }

            rows.push(JobRow { entry, status });
        }

        debug!("list_jobs: {} rows", rows.len());
        Ok(rows)
    }

    /// Last build status of one job; errors become `FetchFailed`.
    pub fn job_status(&self, entry: &JobEntry) -> JobStatus {
        let job = JobPath::parse(&entry.fullname);
        match self.fetch_status(&job) {
            Ok(status) => status,
            Err(e) => {
                warn!("job_status: {} failed: {}", job, e);
                JobStatus::FetchFailed(e.to_string())
            }
        }
    }

    fn fetch_status(&self, job: &JobPath) -> ApiResult<JobStatus> {
        let info = self.api.get_job_info(job)?;
        let Some(last) = info.last_build else {
            return Ok(JobStatus::NeverBuilt);
        };
        let build = self.api.get_build_info(job, last.number)?;
        Ok(JobStatus::Built {
            result: build.result,
            timestamp_ms: build.timestamp_ms,
            duration_ms: build.duration_ms,
        })
    }

    /// Console output of `build`, or of the last build when none is given.
    ///
    /// Returns `None` when the job was never built.
    pub fn logs(&self, job: &JobPath, build: Option<u64>) -> ApplicationResult<Option<BuildLog>> {
        job.require_job()?;
        let number = match build {
            Some(n) => n,
            None => {
                let info = self
                    .api
                    .get_job_info(job)
                    .with_operation(format!("get job {job}"))?;
                match info.last_build {
                    Some(last) => last.number,
                    None => return Ok(None),
                }
            }
        };
        debug!("logs: job={}, build={}", job, number);

        let text = self
            .api
            .get_console_output(job, number)
            .with_operation(format!("get console output of {job} #{number}"))?;
        Ok(Some(BuildLog { number, text }))
    }

    pub fn config(&self, job: &JobPath) -> ApplicationResult<ConfigDocument> {
        job.require_job()?;
        let raw = self
            .api
            .get_job_config(job)
            .with_operation(format!("get config of {job}"))?;
        Ok(ConfigDocument::new(raw))
    }

    /// Fetch the configuration and write it to `output`.
    pub fn save_config(&self, job: &JobPath, output: &Path) -> ApplicationResult<()> {
        let document = self.config(job)?;
        self.fs.write(output, document.as_str()).writing(output)?;
        debug!("save_config: job={} -> {}", job, output.display());
        Ok(())
    }

    /// Replace the job configuration with the contents of `config_file`.
    pub fn update_config(&self, job: &JobPath, config_file: &Path) -> ApplicationResult<()> {
        job.require_job()?;
        let xml = self.fs.read_to_string(config_file).reading(config_file)?;
        self.api
            .reconfig_job(job, &xml)
            .with_operation(format!("update config of {job}"))
    }

    /// Create a job from the configuration in `config_file`.
    pub fn create(&self, job: &JobPath, config_file: &Path) -> ApplicationResult<()> {
        job.require_job()?;
        let xml = self.fs.read_to_string(config_file).reading(config_file)?;
        self.api
            .create_job(job, &xml)
            .with_operation(format!("create job {job}"))
    }

    pub fn copy(&self, source: &JobPath, target: &JobPath) -> ApplicationResult<()> {
        source.require_job()?;
        target.require_job()?;
        self.api
            .copy_job(source, target)
            .with_operation(format!("copy {source} to {target}"))
    }

    pub fn delete(&self, job: &JobPath) -> ApplicationResult<()> {
        job.require_job()?;
        self.api
            .delete_job(job)
            .with_operation(format!("delete job {job}"))
    }

    pub fn enable(&self, job: &JobPath) -> ApplicationResult<()> {
        job.require_job()?;
        self.api
            .enable_job(job)
            .with_operation(format!("enable job {job}"))
    }

    pub fn disable(&self, job: &JobPath) -> ApplicationResult<()> {
        job.require_job()?;
        self.api
            .disable_job(job)
            .with_operation(format!("disable job {job}"))
    }
}
