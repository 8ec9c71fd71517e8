//! Scripted test doubles for the I/O boundary traits.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use platter::config::{Credentials, Settings};
use platter::domain::{
    BuildInfo, BuildParams, BuildRef, BuildResult, ControllerInfo, Executable, ExecutorLoad,
    JobEntry, JobInfo, JobPath, Node, Plugin, QueueEntry, QueueItem, WhoAmI, FOLDER_CLASS,
};
use platter::infrastructure::di::ServiceContainer;
use platter::infrastructure::traits::{ApiError, ApiResult, Clock, FileSystem, JenkinsApi};

/// In-memory server. Poll sequences repeat their last element once drained.
#[derive(Default)]
pub struct MockJenkins {
    pub calls: Mutex<Vec<String>>,
    pub jobs: Vec<JobEntry>,
    pub job_infos: HashMap<String, JobInfo>,
    pub builds: Mutex<HashMap<(String, u64), VecDeque<BuildInfo>>>,
    pub queue_polls: Mutex<VecDeque<QueueItem>>,
    pub queue_id: u64,
    pub config: Mutex<Option<String>>,
    pub reconfigs: Mutex<Vec<(String, String)>>,
    pub console: HashMap<u64, String>,
    pub plugins: Vec<Plugin>,
    pub nodes: Vec<Node>,
    pub queue: Vec<QueueEntry>,
    pub fail_with: Option<ApiError>,
}

impl MockJenkins {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reconfigs(&self) -> Vec<(String, String)> {
        self.reconfigs.lock().unwrap().clone()
    }

    pub fn with_config(xml: &str) -> Self {
        Self {
            config: Mutex::new(Some(xml.to_string())),
            ..Default::default()
        }
    }

    pub fn push_queue_poll(&self, item: QueueItem) {
        self.queue_polls.lock().unwrap().push_back(item);
    }

    pub fn push_build_poll(&self, job: &str, info: BuildInfo) {
        self.builds
            .lock()
            .unwrap()
            .entry((job.to_string(), info.number))
            .or_default()
            .push_back(info);
    }

    fn record(&self, call: impl Into<String>) -> ApiResult<()> {
        self.calls.lock().unwrap().push(call.into());
        match &self.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn not_found(what: impl std::fmt::Display) -> ApiError {
        ApiError::NotFound {
            url: format!("mock://{what}"),
        }
    }
}

fn next<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

impl JenkinsApi for MockJenkins {
    fn get_jobs(&self, folder_depth: usize) -> ApiResult<Vec<JobEntry>> {
        self.record(format!("get_jobs {folder_depth}"))?;
        Ok(self
            .jobs
            .iter()
            .filter(|j| folder_depth > 0 || !j.fullname.contains('/'))
            .cloned()
            .collect())
    }

    fn get_job_info(&self, job: &JobPath) -> ApiResult<JobInfo> {
        self.record(format!("get_job_info {job}"))?;
        self.job_infos
            .get(&job.to_string())
            .cloned()
            .ok_or_else(|| Self::not_found(job))
    }

    fn get_build_info(&self, job: &JobPath, number: u64) -> ApiResult<BuildInfo> {
        self.record(format!("get_build_info {job} {number}"))?;
        let mut builds = self.builds.lock().unwrap();
        builds
            .get_mut(&(job.to_string(), number))
            .and_then(next)
            .ok_or_else(|| Self::not_found(format!("{job}/{number}")))
    }

    fn build_job(&self, job: &JobPath, params: &BuildParams) -> ApiResult<u64> {
        let rendered: Vec<String> = params
            .pairs()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        self.record(format!("build_job {job} {}", rendered.join("&")))?;
        Ok(self.queue_id)
    }

    fn get_queue_item(&self, id: u64) -> ApiResult<QueueItem> {
        self.record(format!("get_queue_item {id}"))?;
        let mut polls = self.queue_polls.lock().unwrap();
        next(&mut *polls).ok_or_else(|| Self::not_found(id))
    }

    fn get_console_output(&self, job: &JobPath, number: u64) -> ApiResult<String> {
        self.record(format!("get_console_output {job} {number}"))?;
        self.console
            .get(&number)
            .cloned()
            .ok_or_else(|| Self::not_found(number))
    }

    fn get_job_config(&self, job: &JobPath) -> ApiResult<String> {
        self.record(format!("get_job_config {job}"))?;
        self.config
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Self::not_found(job))
    }

    fn reconfig_job(&self, job: &JobPath, config_xml: &str) -> ApiResult<()> {
        self.record(format!("reconfig_job {job}"))?;
        self.reconfigs
            .lock()
            .unwrap()
            .push((job.to_string(), config_xml.to_string()));
        *self.config.lock().unwrap() = Some(config_xml.to_string());
        Ok(())
    }

    fn create_job(&self, job: &JobPath, config_xml: &str) -> ApiResult<()> {
        self.record(format!("create_job {job} {}", config_xml.len()))
    }

    fn copy_job(&self, source: &JobPath, target: &JobPath) -> ApiResult<()> {
        self.record(format!("copy_job {source} {target}"))
    }

    fn delete_job(&self, job: &JobPath) -> ApiResult<()> {
        self.record(format!("delete_job {job}"))
    }

    fn enable_job(&self, job: &JobPath) -> ApiResult<()> {
        self.record(format!("enable_job {job}"))
    }

    fn disable_job(&self, job: &JobPath) -> ApiResult<()> {
        self.record(format!("disable_job {job}"))
    }

    fn get_plugins(&self) -> ApiResult<Vec<Plugin>> {
        self.record("get_plugins")?;
        Ok(self.plugins.clone())
    }

    fn get_nodes(&self) -> ApiResult<Vec<Node>> {
        self.record("get_nodes")?;
        Ok(self.nodes.clone())
    }

    fn get_queue(&self) -> ApiResult<Vec<QueueEntry>> {
        self.record("get_queue")?;
        Ok(self.queue.clone())
    }

    fn cancel_queue(&self, id: u64) -> ApiResult<()> {
        self.record(format!("cancel_queue {id}"))
    }

    fn get_controller_info(&self) -> ApiResult<ControllerInfo> {
        self.record("get_controller_info")?;
        Ok(ControllerInfo {
            version: Some("2.452.1".to_string()),
            mode: Some("NORMAL".to_string()),
            use_crumbs: true,
            ..Default::default()
        })
    }

    fn get_whoami(&self) -> ApiResult<WhoAmI> {
        self.record("get_whoami")?;
        Ok(WhoAmI {
            id: "bot".to_string(),
            full_name: "Build Bot".to_string(),
        })
    }

    fn get_executor_load(&self) -> ApiResult<ExecutorLoad> {
        self.record("get_executor_load")?;
        Ok(ExecutorLoad {
            busy_executors: 1,
            total_executors: 4,
        })
    }
}

/// Clock that advances only when slept on.
pub struct FakeClock {
    start: Instant,
    elapsed: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.start + *self.elapsed.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) {
        *self.elapsed.lock().unwrap() += duration;
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Filesystem backed by a map; paths missing from it fail with `NotFound`.
#[derive(Default)]
pub struct MemoryFileSystem {
    pub files: Mutex<HashMap<PathBuf, String>>,
}

impl MemoryFileSystem {
    pub fn with_file(path: &str, content: &str) -> Self {
        let fs = Self::default();
        fs.files
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), content.to_string());
        fs
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(Path::new(path)).cloned()
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }
}

// ============================================================
// Builders
// ============================================================

pub fn job(fullname: &str) -> JobEntry {
    let name = fullname.rsplit('/').next().unwrap_or(fullname);
    JobEntry {
        class: "hudson.model.FreeStyleProject".to_string(),
        name: name.to_string(),
        fullname: fullname.to_string(),
        url: None,
        color: Some("blue".to_string()),
    }
}

pub fn folder(fullname: &str) -> JobEntry {
    JobEntry {
        class: FOLDER_CLASS.to_string(),
        color: None,
        ..job(fullname)
    }
}

pub fn job_info(last_build: Option<u64>) -> JobInfo {
    JobInfo {
        last_build: last_build.map(|number| BuildRef { number }),
    }
}

pub fn queued(id: u64) -> QueueItem {
    QueueItem {
        id,
        executable: None,
        cancelled: false,
        why: Some("Waiting for next available executor".to_string()),
    }
}

pub fn started(id: u64, number: u64) -> QueueItem {
    QueueItem {
        id,
        executable: Some(Executable { number }),
        cancelled: false,
        why: None,
    }
}

pub fn running(number: u64) -> BuildInfo {
    BuildInfo {
        number,
        building: true,
        result: None,
        duration_ms: 0,
        timestamp_ms: 1_700_000_000_000,
    }
}

pub fn finished(number: u64, result: &str, duration_ms: u64) -> BuildInfo {
    BuildInfo {
        building: false,
        result: Some(BuildResult::parse(result)),
        duration_ms,
        ..running(number)
    }
}

pub fn credentials() -> Credentials {
    Credentials {
        url: "https://ci.example.com".to_string(),
        username: "bot".to_string(),
        api_key: "token".to_string(),
    }
}

/// Container wired to the given doubles with zero poll intervals.
pub fn container(api: Arc<MockJenkins>, fs: Arc<MemoryFileSystem>) -> ServiceContainer {
    let mut settings = Settings::default();
    settings.poll.queue_interval_ms = 0;
    settings.poll.build_interval_ms = 0;
    ServiceContainer::with_deps(settings, credentials(), api, fs, Arc::new(FakeClock::new()))
}
