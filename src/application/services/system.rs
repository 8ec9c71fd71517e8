//! Server-wide pass-throughs: plugins, nodes, queue and system information.

use std::sync::Arc;

use tracing::debug;

use crate::application::error_ext::ApiResultExt;
use crate::application::ApplicationResult;
use crate::domain::{Node, Plugin, QueueEntry, SystemInfo};
use crate::infrastructure::traits::JenkinsApi;

/// Service for controller-level operations.
pub struct SystemService {
    api: Arc<dyn JenkinsApi>,
    url: String,
    username: String,
}

impl SystemService {
    /// Create a new system service for the server at `url`, authenticated as `username`.
    pub fn new(api: Arc<dyn JenkinsApi>, url: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            api,
            url: url.into(),
            username: username.into(),
        }
    }

    pub fn plugins(&self) -> ApplicationResult<Vec<Plugin>> {
        let plugins = self.api.get_plugins().with_operation("list plugins")?;
        debug!("plugins: {}", plugins.len());
        Ok(plugins)
    }

    pub fn nodes(&self) -> ApplicationResult<Vec<Node>> {
        self.api.get_nodes().with_operation("list nodes")
    }

    /// Queued builds; an empty queue is a valid result.
    pub fn queue(&self) -> ApplicationResult<Vec<QueueEntry>> {
        self.api.get_queue().with_operation("list queue")
    }

    pub fn cancel_queue(&self, id: u64) -> ApplicationResult<()> {
        self.api
            .cancel_queue(id)
            .with_operation(format!("cancel queue item {id}"))
    }

    /// Controller settings, identity, version and executor load.
    pub fn info(&self) -> ApplicationResult<SystemInfo> {
        let user = self.api.get_whoami().with_operation("get current user")?;
        let controller = self
            .api
            .get_controller_info()
            .with_operation("get system information")?;
        let executors = self
            .api
            .get_executor_load()
            .with_operation("get executor load")?;

        Ok(SystemInfo {
            url: self.url.clone(),
            user,
            username: self.username.clone(),
            controller,
            executors,
        })
    }
}
