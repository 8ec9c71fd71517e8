//! SCM branch read and replace
//!
//! Reads the branch specifier out of a job's `config.xml` and rewrites it by
//! literal substitution, writing the document back only when it changed.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::error_ext::ApiResultExt;
use crate::application::ApplicationResult;
use crate::domain::{BranchRewrite, ConfigDocument, JobPath};
use crate::infrastructure::traits::JenkinsApi;

/// What a branch replacement did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// The job has no branch specifier; nothing was written.
    NotFound,
    /// The document already carries the branch; nothing was written.
    Unchanged { branch: String },
    /// The document was rewritten and submitted.
    Replaced {
        old: String,
        new: String,
        occurrences: usize,
    },
}

/// Service for reading and replacing a job's SCM branch.
pub struct BranchService {
    api: Arc<dyn JenkinsApi>,
}

impl BranchService {
    /// Create a new branch service.
    pub fn new(api: Arc<dyn JenkinsApi>) -> Self {
        Self { api }
    }

    /// Current branch specifier, `None` when the job has none.
    pub fn get_branch(&self, job: &JobPath) -> ApplicationResult<Option<String>> {
        let document = self.fetch(job)?;
        let branch = document.branch()?;
        debug!("get_branch: job={}, branch={:?}", job, branch);
        Ok(branch)
    }

    /// Replace the branch specifier with `new_branch` (prefixed with `*/` if needed).
    pub fn replace_branch(
        &self,
        job: &JobPath,
        new_branch: &str,
    ) -> ApplicationResult<ReplaceOutcome> {
        let document = self.fetch(job)?;

        match document.rewrite_branch(new_branch)? {
            BranchRewrite::NotFound => {
                debug!("replace_branch: job={} has no branch specifier", job);
                Ok(ReplaceOutcome::NotFound)
            }
            BranchRewrite::Unchanged { branch } => {
                debug!("replace_branch: job={} already on {}", job, branch);
                Ok(ReplaceOutcome::Unchanged { branch })
            }
            BranchRewrite::Changed {
                old,
                new,
                occurrences,
                document,
            } => {
                if occurrences > 1 {
                    warn!(
                        "replace_branch: '{}' occurs {} times in {}; all were replaced",
                        old, occurrences, job
                    );
                }
                self.api
                    .reconfig_job(job, document.as_str())
                    .with_operation(format!("update config of {job}"))?;
                info!("replace_branch: job={} {} -> {}", job, old, new);
                Ok(ReplaceOutcome::Replaced {
                    old,
                    new,
                    occurrences,
                })
            }
        }
    }

    fn fetch(&self, job: &JobPath) -> ApplicationResult<ConfigDocument> {
        job.require_job()?;
        let raw = self
            .api
            .get_job_config(job)
            .with_operation(format!("get config of {job}"))?;
        Ok(ConfigDocument::new(raw))
    }
}
