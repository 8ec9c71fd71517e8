//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{BranchService, BuildService, JobService, SystemService};
use crate::config::{Credentials, Settings};
use crate::infrastructure::error::InfraResult;
use crate::infrastructure::jenkins::HttpJenkinsClient;
use crate::infrastructure::traits::{Clock, FileSystem, JenkinsApi, RealFileSystem, SystemClock};

/// Container holding the server client and the I/O boundaries.
///
/// One container per invocation; services borrow its dependencies.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Resolved server credentials
    pub credentials: Credentials,

    /// Remote server client
    pub api: Arc<dyn JenkinsApi>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Time source for poll loops
    pub clock: Arc<dyn Clock>,
}

impl ServiceContainer {
    /// Create a new service container talking to the configured server.
    pub fn new(settings: Settings, credentials: Credentials) -> InfraResult<Self> {
        let api = HttpJenkinsClient::new(&credentials, settings.http.timeout())?;
        Ok(Self::with_deps(
            settings,
            credentials,
            Arc::new(api),
            Arc::new(RealFileSystem),
            Arc::new(SystemClock),
        ))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        credentials: Credentials,
        api: Arc<dyn JenkinsApi>,
        fs: Arc<dyn FileSystem>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            credentials,
            api,
            fs,
            clock,
        }
    }

    pub fn build_service(&self) -> BuildService {
        BuildService::new(
            Arc::clone(&self.api),
            Arc::clone(&self.clock),
            self.settings.poll.clone(),
        )
    }

    pub fn branch_service(&self) -> BranchService {
        BranchService::new(Arc::clone(&self.api))
    }

    pub fn job_service(&self) -> JobService {
        JobService::new(Arc::clone(&self.api), Arc::clone(&self.fs))
    }

    pub fn system_service(&self) -> SystemService {
        SystemService::new(
            Arc::clone(&self.api),
            self.credentials.url.clone(),
            self.credentials.username.clone(),
        )
    }
}
