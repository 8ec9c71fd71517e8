//! I/O boundary traits for testability
//!
//! These traits abstract the remote server, the local filesystem and the
//! clock, allowing services to be tested with mock implementations.

use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::domain::{
    BuildInfo, BuildParams, ControllerInfo, ExecutorLoad, JobEntry, JobInfo, JobPath, Node,
    Plugin, QueueEntry, QueueItem, WhoAmI,
};

/// Failure talking to the remote server.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("authentication rejected by server (HTTP {status}) for {url}")]
    Unauthorized { status: u16, url: String },

    #[error("not found: {url}")]
    NotFound { url: String },

    #[error("server returned HTTP {status} for {url}: {body}")]
    Status { status: u16, url: String, body: String },

    #[error("cannot reach {url}: {message}")]
    Transport { url: String, message: String },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Result type for remote API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Remote automation server API.
///
/// Every method is exactly one logical request; nothing is cached or retried.
pub trait JenkinsApi: Send + Sync {
    /// All jobs, recursing into folders up to `folder_depth` levels.
    fn get_jobs(&self, folder_depth: usize) -> ApiResult<Vec<JobEntry>>;

    fn get_job_info(&self, job: &JobPath) -> ApiResult<JobInfo>;

    fn get_build_info(&self, job: &JobPath, number: u64) -> ApiResult<BuildInfo>;

    /// Submit a build and return the queue item id.
    fn build_job(&self, job: &JobPath, params: &BuildParams) -> ApiResult<u64>;

    fn get_queue_item(&self, id: u64) -> ApiResult<QueueItem>;

    fn get_console_output(&self, job: &JobPath, number: u64) -> ApiResult<String>;

    /// Raw `config.xml`.
    fn get_job_config(&self, job: &JobPath) -> ApiResult<String>;

    /// Replace `config.xml` with the given document.
    fn reconfig_job(&self, job: &JobPath, config_xml: &str) -> ApiResult<()>;

    fn create_job(&self, job: &JobPath, config_xml: &str) -> ApiResult<()>;

    fn copy_job(&self, source: &JobPath, target: &JobPath) -> ApiResult<()>;

    fn delete_job(&self, job: &JobPath) -> ApiResult<()>;

    fn enable_job(&self, job: &JobPath) -> ApiResult<()>;

    fn disable_job(&self, job: &JobPath) -> ApiResult<()>;

    fn get_plugins(&self) -> ApiResult<Vec<Plugin>>;

    fn get_nodes(&self) -> ApiResult<Vec<Node>>;

    fn get_queue(&self) -> ApiResult<Vec<QueueEntry>>;

    fn cancel_queue(&self, id: u64) -> ApiResult<()>;

    /// Root `api/json`, with the version taken from the `X-Jenkins` header.
    fn get_controller_info(&self) -> ApiResult<ControllerInfo>;

    fn get_whoami(&self) -> ApiResult<WhoAmI>;

    fn get_executor_load(&self) -> ApiResult<ExecutorLoad>;
}

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;
}

/// Time source for poll loops.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    /// Block the calling thread.
    fn sleep(&self, duration: Duration);
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }
}

/// Wall clock with blocking sleeps.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
