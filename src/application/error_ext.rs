//! Error conversion helpers for remote calls and file I/O
//!
//! Provides extension traits for cleaner error handling with context.

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};
use crate::infrastructure::traits::ApiResult;

/// Extension trait for converting `ApiResult` to `ApplicationResult` with context.
pub trait ApiResultExt<T> {
    /// Name the operation a remote error belongs to.
    ///
    /// # Example
    /// ```ignore
    /// api.get_job_config(&job)
    ///     .with_operation(format!("get config of {job}"))?;
    /// ```
    fn with_operation(self, operation: impl Into<String>) -> ApplicationResult<T>;
}

impl<T> ApiResultExt<T> for ApiResult<T> {
    fn with_operation(self, operation: impl Into<String>) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::remote(operation, e))
    }
}

/// Extension trait for converting `io::Result` to `ApplicationResult` with a path.
pub trait IoResultExt<T> {
    fn reading(self, path: &Path) -> ApplicationResult<T>;

    fn writing(self, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn reading(self, path: &Path) -> ApplicationResult<T> {
        self.map_err(|source| ApplicationError::ReadFile {
            path: path.to_path_buf(),
            source,
        })
    }

    fn writing(self, path: &Path) -> ApplicationResult<T> {
        self.map_err(|source| ApplicationError::WriteFile {
            path: path.to_path_buf(),
            source,
        })
    }
}
