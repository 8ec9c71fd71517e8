//! Domain entities: core data structures

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::domain::error::DomainError;

/// Class name Jenkins reports for CloudBees folders.
pub const FOLDER_CLASS: &str = "com.cloudbees.hudson.plugins.folder.Folder";

/// Hierarchical job name, e.g. `team/service/deploy`.
///
/// Leading and trailing `/` are ignored; the empty path is the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct JobPath {
    segments: Vec<String>,
}

impl JobPath {
    /// The root of the job tree.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a `/`-delimited job path. Empty segments are dropped.
    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment (the short job name).
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Containing folder; the root for top-level jobs.
    pub fn parent(&self) -> JobPath {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    /// Same path, rejecting the root for operations that need a concrete job.
    pub fn require_job(&self) -> Result<&Self, DomainError> {
        if self.is_root() {
            return Err(DomainError::InvalidJobPath(
                "a job name is required, got the root path".to_string(),
            ));
        }
        Ok(self)
    }
}

impl fmt::Display for JobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("/")
        } else {
            f.write_str(&self.segments.join("/"))
        }
    }
}

/// A single build parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Number(n) => write!(f, "{n}"),
            ParamValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Build parameters, keyed by parameter name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildParams {
    values: BTreeMap<String, ParamValue>,
}

impl BuildParams {
    /// Parse a JSON object of scalar values.
    ///
    /// Anything other than an object, or any nested array/object/null value,
    /// is rejected.
    pub fn from_json(raw: &str) -> Result<Self, DomainError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| DomainError::InvalidParams(e.to_string()))?;
        let serde_json::Value::Object(map) = value else {
            return Err(DomainError::InvalidParams(
                "expected a JSON object of name/value pairs".to_string(),
            ));
        };

        let mut values = BTreeMap::new();
        for (name, value) in map {
            let value = match value {
                serde_json::Value::String(s) => ParamValue::Text(s),
                serde_json::Value::Number(n) => ParamValue::Number(n),
                serde_json::Value::Bool(b) => ParamValue::Bool(b),
                _ => return Err(DomainError::UnsupportedParamValue { name }),
            };
            values.insert(name, value);
        }
        Ok(Self { values })
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.values.insert(name.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Name/value pairs rendered as strings, in name order.
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }
}

/// Result code of a finished build. Unknown codes are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildResult {
    Success,
    Failure,
    Unstable,
    Aborted,
    NotBuilt,
    Other(String),
}

impl BuildResult {
    pub fn parse(code: &str) -> Self {
        match code {
            "SUCCESS" => Self::Success,
            "FAILURE" => Self::Failure,
            "UNSTABLE" => Self::Unstable,
            "ABORTED" => Self::Aborted,
            "NOT_BUILT" => Self::NotBuilt,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Unstable => "UNSTABLE",
            Self::Aborted => "ABORTED",
            Self::NotBuilt => "NOT_BUILT",
            Self::Other(code) => code,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BuildResult {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(Self::parse(&code))
    }
}

/// Build assigned to a queue item once it leaves the queue.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Executable {
    pub number: u64,
}

/// Snapshot of `queue/item/<id>/api/json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueueItem {
    pub id: u64,
    #[serde(default)]
    pub executable: Option<Executable>,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub why: Option<String>,
}

impl QueueItem {
    /// Build number, present only once an executor picked the item up.
    pub fn build_number(&self) -> Option<u64> {
        self.executable.as_ref().map(|e| e.number)
    }
}

/// Snapshot of `<job>/<number>/api/json`.
///
/// `building` has no default: a document without it cannot say the build ended.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub number: u64,
    pub building: bool,
    #[serde(default)]
    pub result: Option<BuildResult>,
    #[serde(default, rename = "duration")]
    pub duration_ms: u64,
    #[serde(default, rename = "timestamp")]
    pub timestamp_ms: i64,
}

/// Reference to a build inside a job document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildRef {
    pub number: u64,
}

/// Subset of `<job>/api/json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    #[serde(default)]
    pub last_build: Option<BuildRef>,
}

/// One row of the flattened job tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEntry {
    pub class: String,
    pub name: String,
    pub fullname: String,
    pub url: Option<String>,
    pub color: Option<String>,
}

impl JobEntry {
    pub fn is_folder(&self) -> bool {
        self.class == FOLDER_CLASS
    }
}

/// Status enrichment for one listed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Built {
        result: Option<BuildResult>,
        timestamp_ms: i64,
        duration_ms: u64,
    },
    NeverBuilt,
    FetchFailed(String),
}

impl JobStatus {
    /// Label used for display and `--filter` matching.
    pub fn label(&self) -> &str {
        match self {
            JobStatus::Built { result: Some(r), .. } => r.as_str(),
            JobStatus::Built { result: None, .. } => "UNKNOWN",
            JobStatus::NeverBuilt => "N/A",
            JobStatus::FetchFailed(_) => "ERROR",
        }
    }
}

/// Installed plugin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plugin {
    pub short_name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub long_name: String,
}

/// Build agent (Jenkins "computer").
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub offline: bool,
    #[serde(default)]
    pub num_executors: u32,
}

impl Node {
    /// Display name, with the controller's empty name shown as `master`.
    pub fn name(&self) -> &str {
        if self.display_name.is_empty() {
            "master"
        } else {
            &self.display_name
        }
    }
}

/// Task a queue entry is waiting to run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueueTask {
    #[serde(default)]
    pub name: String,
}

/// Entry of `queue/api/json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub id: u64,
    pub task: QueueTask,
    #[serde(default)]
    pub why: Option<String>,
    #[serde(default)]
    pub in_queue_since: i64,
}

/// Identity of the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoAmI {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub full_name: String,
}

/// Named view reference.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ViewRef {
    #[serde(default)]
    pub name: String,
}

/// Subset of the controller's root `api/json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerInfo {
    /// From the `X-Jenkins` response header, not the body.
    #[serde(skip)]
    pub version: Option<String>,
    pub mode: Option<String>,
    pub node_description: Option<String>,
    pub quieting_down: bool,
    pub slave_agent_port: Option<i64>,
    pub use_crumbs: bool,
    pub views: Vec<ViewRef>,
    pub primary_view: Option<ViewRef>,
}

/// Executor totals across all agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutorLoad {
    pub busy_executors: u32,
    pub total_executors: u32,
}

impl ExecutorLoad {
    pub fn idle(&self) -> u32 {
        self.total_executors.saturating_sub(self.busy_executors)
    }
}

/// Everything `info` shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    pub url: String,
    pub user: WhoAmI,
    pub username: String,
    pub controller: ControllerInfo,
    pub executors: ExecutorLoad,
}
