//! Blocking HTTP implementation of [`JenkinsApi`].
//!
//! One agent per process, basic authentication on every request, and a CSRF
//! crumb fetched lazily before the first POST.

use std::io::Read;
use std::sync::OnceLock;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, trace};
use url::Url;

use crate::config::Credentials;
use crate::domain::{
    BuildInfo, BuildParams, ControllerInfo, ExecutorLoad, JobEntry, JobInfo, JobPath, Node,
    Plugin, QueueEntry, QueueItem, WhoAmI,
};
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::traits::{ApiError, ApiResult, JenkinsApi};

/// User-Agent sent with every request
const USER_AGENT: &str = concat!("platter/", env!("CARGO_PKG_VERSION"));

/// Header carrying the server version
const VERSION_HEADER: &str = "X-Jenkins";

/// Longest error body kept in an [`ApiError::Status`]
const MAX_ERROR_BODY: usize = 200;

/// Fields requested for every node of the job tree
const JOB_FIELDS: &str = "_class,name,url,color";

/// CSRF protection token.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Crumb {
    crumb: String,
    crumb_request_field: String,
}

#[derive(Debug, Deserialize)]
struct JobNode {
    #[serde(rename = "_class", default)]
    class: String,
    name: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    jobs: Vec<JobNode>,
}

#[derive(Debug, Deserialize)]
struct JobList {
    #[serde(default)]
    jobs: Vec<JobNode>,
}

#[derive(Debug, Deserialize)]
struct PluginList {
    #[serde(default)]
    plugins: Vec<Plugin>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComputerSet {
    #[serde(default)]
    computer: Vec<Node>,
    #[serde(default)]
    busy_executors: u32,
    #[serde(default)]
    total_executors: u32,
}

#[derive(Debug, Deserialize)]
struct QueueList {
    #[serde(default)]
    items: Vec<QueueEntry>,
}

/// Jenkins client over `ureq`.
pub struct HttpJenkinsClient {
    agent: ureq::Agent,
    base: Url,
    authorization: String,
    crumb: OnceLock<Option<Crumb>>,
}

impl HttpJenkinsClient {
    /// Build a client for the given server; `timeout` of `None` disables request timeouts.
    pub fn new(credentials: &Credentials, timeout: Option<Duration>) -> InfraResult<Self> {
        let mut base = Url::parse(&credentials.url).map_err(|e| InfraError::InvalidUrl {
            url: credentials.url.clone(),
            message: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(InfraError::InvalidUrl {
                url: credentials.url.clone(),
                message: "not a hierarchical URL".to_string(),
            });
        }
        base.set_query(None);

        let mut builder = ureq::AgentBuilder::new().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let token = STANDARD.encode(format!("{}:{}", credentials.username, credentials.api_key));
        Ok(Self {
            agent: builder.build(),
            base,
            authorization: format!("Basic {token}"),
            crumb: OnceLock::new(),
        })
    }

    /// `<base>/job/<a>/job/<b>/<tail...>`; each segment is percent-encoded.
    fn endpoint(&self, job: Option<&JobPath>, tail: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            for segment in job.map(JobPath::segments).unwrap_or_default() {
                segments.push("job").push(segment);
            }
            segments.extend(tail);
        }
        url
    }

    fn send(&self, method: &str, url: &Url, body: Option<&str>) -> ApiResult<ureq::Response> {
        debug!("{} {}", method, url);
        let mut request = self
            .agent
            .request_url(method, url)
            .set("Authorization", &self.authorization);

        if method == "POST" {
            if let Some(crumb) = self.crumb()? {
                request = request.set(&crumb.crumb_request_field, &crumb.crumb);
            }
        }

        let result = match body {
            Some(xml) => request
                .set("Content-Type", "application/xml; charset=utf-8")
                .send_string(xml),
            None => request.call(),
        };
        result.map_err(|e| map_error(url, e))
    }

    fn get(&self, url: &Url) -> ApiResult<ureq::Response> {
        self.send("GET", url, None)
    }

    fn post(&self, url: &Url, body: Option<&str>) -> ApiResult<ureq::Response> {
        self.send("POST", url, body)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &Url) -> ApiResult<T> {
        self.get(url)?.into_json().map_err(|e| ApiError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn get_text(&self, url: &Url) -> ApiResult<String> {
        let mut text = String::new();
        self.get(url)?
            .into_reader()
            .read_to_string(&mut text)
            .map_err(|e| ApiError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(text)
    }

    /// Crumb for POST requests, fetched once. A 404 means CSRF protection is off.
    fn crumb(&self) -> ApiResult<Option<Crumb>> {
        if let Some(crumb) = self.crumb.get() {
            return Ok(crumb.clone());
        }
        let url = self.endpoint(None, &["crumbIssuer", "api", "json"]);
        let crumb = match self.get_json::<Crumb>(&url) {
            Ok(crumb) => Some(crumb),
            Err(ApiError::NotFound { .. }) => None,
            Err(e) => return Err(e),
        };
        trace!("crumb: enabled={}", crumb.is_some());
        Ok(self.crumb.get_or_init(|| crumb).clone())
    }
}

impl JenkinsApi for HttpJenkinsClient {
    fn get_jobs(&self, folder_depth: usize) -> ApiResult<Vec<JobEntry>> {
        let mut url = self.endpoint(None, &["api", "json"]);
        url.query_pairs_mut()
            .append_pair("tree", &jobs_tree(folder_depth));
        let list: JobList = self.get_json(&url)?;

        let mut entries = Vec::new();
        flatten_jobs(list.jobs, "", &mut entries);
        Ok(entries)
    }

    fn get_job_info(&self, job: &JobPath) -> ApiResult<JobInfo> {
        self.get_json(&self.endpoint(Some(job), &["api", "json"]))
    }

    fn get_build_info(&self, job: &JobPath, number: u64) -> ApiResult<BuildInfo> {
        let number = number.to_string();
        self.get_json(&self.endpoint(Some(job), &[&number, "api", "json"]))
    }

    fn build_job(&self, job: &JobPath, params: &BuildParams) -> ApiResult<u64> {
        let mut url = if params.is_empty() {
            self.endpoint(Some(job), &["build"])
        } else {
            self.endpoint(Some(job), &["buildWithParameters"])
        };
        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (name, value) in params.pairs() {
                query.append_pair(&name, &value);
            }
        }

        let response = self.post(&url, None)?;
        let location = response.header("Location").unwrap_or_default();
        parse_queue_id(location).ok_or_else(|| ApiError::Decode {
            url: url.to_string(),
            message: format!("no queue item in Location header '{location}'"),
        })
    }

    fn get_queue_item(&self, id: u64) -> ApiResult<QueueItem> {
        let id = id.to_string();
        self.get_json(&self.endpoint(None, &["queue", "item", &id, "api", "json"]))
    }

    fn get_console_output(&self, job: &JobPath, number: u64) -> ApiResult<String> {
        let number = number.to_string();
        self.get_text(&self.endpoint(Some(job), &[&number, "consoleText"]))
    }

    fn get_job_config(&self, job: &JobPath) -> ApiResult<String> {
        self.get_text(&self.endpoint(Some(job), &["config.xml"]))
    }

    fn reconfig_job(&self, job: &JobPath, config_xml: &str) -> ApiResult<()> {
        self.post(&self.endpoint(Some(job), &["config.xml"]), Some(config_xml))
            .map(|_| ())
    }

    fn create_job(&self, job: &JobPath, config_xml: &str) -> ApiResult<()> {
        let mut url = self.endpoint(Some(&job.parent()), &["createItem"]);
        url.query_pairs_mut()
            .append_pair("name", job.name().unwrap_or_default());
        self.post(&url, Some(config_xml)).map(|_| ())
    }

    fn copy_job(&self, source: &JobPath, target: &JobPath) -> ApiResult<()> {
        let mut url = self.endpoint(Some(&target.parent()), &["createItem"]);
        url.query_pairs_mut()
            .append_pair("name", target.name().unwrap_or_default())
            .append_pair("mode", "copy")
            .append_pair("from", &format!("/{source}"));
        self.post(&url, None).map(|_| ())
    }

    fn delete_job(&self, job: &JobPath) -> ApiResult<()> {
        self.post(&self.endpoint(Some(job), &["doDelete"]), None)
            .map(|_| ())
    }

    fn enable_job(&self, job: &JobPath) -> ApiResult<()> {
        self.post(&self.endpoint(Some(job), &["enable"]), None)
            .map(|_| ())
    }

    fn disable_job(&self, job: &JobPath) -> ApiResult<()> {
        self.post(&self.endpoint(Some(job), &["disable"]), None)
            .map(|_| ())
    }

    fn get_plugins(&self) -> ApiResult<Vec<Plugin>> {
        let mut url = self.endpoint(None, &["pluginManager", "api", "json"]);
        url.query_pairs_mut().append_pair("depth", "2");
        let list: PluginList = self.get_json(&url)?;
        Ok(list.plugins)
    }

    fn get_nodes(&self) -> ApiResult<Vec<Node>> {
        let set: ComputerSet = self.get_json(&self.endpoint(None, &["computer", "api", "json"]))?;
        Ok(set.computer)
    }

    fn get_queue(&self) -> ApiResult<Vec<QueueEntry>> {
        let list: QueueList = self.get_json(&self.endpoint(None, &["queue", "api", "json"]))?;
        Ok(list.items)
    }

    fn cancel_queue(&self, id: u64) -> ApiResult<()> {
        let mut url = self.endpoint(None, &["queue", "cancelItem"]);
        url.query_pairs_mut().append_pair("id", &id.to_string());
        // The server answers a successful cancel with a redirect to a page
        // that may not exist.
        match self.post(&url, None) {
            Ok(_) | Err(ApiError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn get_controller_info(&self) -> ApiResult<ControllerInfo> {
        let url = self.endpoint(None, &["api", "json"]);
        let response = self.get(&url)?;
        let version = response.header(VERSION_HEADER).map(str::to_string);
        let mut info: ControllerInfo = response.into_json().map_err(|e| ApiError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        info.version = version;
        Ok(info)
    }

    fn get_whoami(&self) -> ApiResult<WhoAmI> {
        self.get_json(&self.endpoint(None, &["me", "api", "json"]))
    }

    fn get_executor_load(&self) -> ApiResult<ExecutorLoad> {
        let set: ComputerSet = self.get_json(&self.endpoint(None, &["computer", "api", "json"]))?;
        Ok(ExecutorLoad {
            busy_executors: set.busy_executors,
            total_executors: set.total_executors,
        })
    }
}

/// `tree` query selecting jobs `folder_depth` folders deep.
fn jobs_tree(folder_depth: usize) -> String {
    let mut tree = format!("jobs[{JOB_FIELDS}]");
    for _ in 0..folder_depth {
        tree = format!("jobs[{JOB_FIELDS},{tree}]");
    }
    tree
}

fn flatten_jobs(nodes: Vec<JobNode>, prefix: &str, out: &mut Vec<JobEntry>) {
    for node in nodes {
        let fullname = if prefix.is_empty() {
            node.name.clone()
        } else {
            format!("{prefix}/{}", node.name)
        };
        out.push(JobEntry {
            class: node.class,
            name: node.name,
            fullname: fullname.clone(),
            url: node.url,
            color: node.color,
        });
        flatten_jobs(node.jobs, &fullname, out);
    }
}

/// Queue id from a `Location` header such as `https://ci/queue/item/42/`.
fn parse_queue_id(location: &str) -> Option<u64> {
    let re = Regex::new(r"/queue/item/(\d+)/?$").ok()?;
    re.captures(location)?.get(1)?.as_str().parse().ok()
}

fn map_error(url: &Url, error: ureq::Error) -> ApiError {
    let url = url.to_string();
    match error {
        ureq::Error::Status(status @ (401 | 403), _) => ApiError::Unauthorized { status, url },
        ureq::Error::Status(404, _) => ApiError::NotFound { url },
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            ApiError::Status {
                status,
                url,
                body: body.trim().chars().take(MAX_ERROR_BODY).collect(),
            }
        }
        ureq::Error::Transport(transport) => ApiError::Transport {
            url,
            message: transport.to_string(),
        },
    }
}
