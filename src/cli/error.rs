//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::exitcode;
use crate::infrastructure::traits::ApiError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Usage(String),

    #[error("build #{number} of {job} finished with {result} in {duration}")]
    BuildUnsuccessful {
        job: String,
        number: u64,
        result: String,
        duration: String,
    },

    #[error("queue item {queue_id} was cancelled before it started")]
    Cancelled { queue_id: u64 },

    #[error("gave up waiting for {waiting_for}")]
    TimedOut { waiting_for: String },
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        ApplicationError::Domain(e).into()
    }
}

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => exitcode::USAGE,
            CliError::BuildUnsuccessful { .. } => exitcode::BUILD_UNSUCCESSFUL,
            CliError::Cancelled { .. } => exitcode::CANCELLED,
            CliError::TimedOut { .. } => exitcode::TEMPFAIL,
            CliError::Infra(e) => match e {
                InfraError::InvalidUrl { .. } => exitcode::CONFIG,
                InfraError::Io { .. } => exitcode::IOERR,
                InfraError::Application(e) => application_exit_code(e),
            },
        }
    }
}

fn application_exit_code(e: &ApplicationError) -> i32 {
    match e {
        ApplicationError::Domain(DomainError::InvalidJobPath(_)) => exitcode::USAGE,
        ApplicationError::Domain(_) => exitcode::DATAERR,
        ApplicationError::Remote { source, .. } => api_exit_code(source),
        ApplicationError::MissingCredentials { .. } | ApplicationError::Config { .. } => {
            exitcode::CONFIG
        }
        ApplicationError::ReadFile { .. } => exitcode::NOINPUT,
        ApplicationError::WriteFile { .. } => exitcode::CANTCREAT,
    }
}

fn api_exit_code(e: &ApiError) -> i32 {
    match e {
        ApiError::Unauthorized { .. } => exitcode::NOPERM,
        ApiError::Status { status, .. } if *status >= 500 => exitcode::UNAVAILABLE,
        ApiError::NotFound { .. } | ApiError::Status { .. } => exitcode::SOFTWARE,
        ApiError::Transport { .. } => exitcode::UNAVAILABLE,
        ApiError::Decode { .. } => exitcode::DATAERR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn remote(source: ApiError) -> CliError {
        ApplicationError::remote("op", source).into()
    }

    #[rstest]
    #[case(ApiError::Unauthorized { status: 401, url: "u".into() }, exitcode::NOPERM)]
    #[case(ApiError::Unauthorized { status: 403, url: "u".into() }, exitcode::NOPERM)]
    #[case(ApiError::NotFound { url: "u".into() }, exitcode::SOFTWARE)]
    #[case(ApiError::Status { status: 400, url: "u".into(), body: String::new() }, exitcode::SOFTWARE)]
    #[case(ApiError::Status { status: 503, url: "u".into(), body: String::new() }, exitcode::UNAVAILABLE)]
    #[case(ApiError::Transport { url: "u".into(), message: "refused".into() }, exitcode::UNAVAILABLE)]
    #[case(ApiError::Decode { url: "u".into(), message: "eof".into() }, exitcode::DATAERR)]
    fn given_remote_error_when_mapping_then_uses_sysexits(
        #[case] source: ApiError,
        #[case] expected: i32,
    ) {
        assert_eq!(remote(source).exit_code(), expected);
    }

    #[test]
    fn given_missing_credentials_when_mapping_then_config() {
        let err: CliError = ApplicationError::MissingCredentials {
            missing: "JENKINS_URL".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exitcode::CONFIG);
    }

    #[test]
    fn given_usage_errors_when_mapping_then_usage() {
        let misuse = CliError::Usage("command does not talk to the server".into());
        let root: CliError = DomainError::InvalidJobPath("root".into()).into();
        assert_eq!(misuse.exit_code(), exitcode::USAGE);
        assert_eq!(root.exit_code(), exitcode::USAGE);
    }

    #[test]
    fn given_bad_params_when_mapping_then_dataerr() {
        let err: CliError = DomainError::InvalidParams("expected object".into()).into();
        assert_eq!(err.exit_code(), exitcode::DATAERR);
    }

    #[test]
    fn given_wait_outcomes_when_mapping_then_distinct_codes() {
        let failed = CliError::BuildUnsuccessful {
            job: "foo/bar".into(),
            number: 7,
            result: "FAILURE".into(),
            duration: "1.0s".into(),
        };
        assert_eq!(failed.exit_code(), 1);
        assert_eq!(CliError::Cancelled { queue_id: 1 }.exit_code(), 3);
        assert_eq!(
            CliError::TimedOut {
                waiting_for: "queue item 1".into()
            }
            .exit_code(),
            exitcode::TEMPFAIL
        );
    }

    #[test]
    fn given_file_errors_when_mapping_then_noinput_and_cantcreat() {
        let read: CliError = ApplicationError::ReadFile {
            path: "in.xml".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
        .into();
        let write: CliError = ApplicationError::WriteFile {
            path: "out.xml".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        }
        .into();
        assert_eq!(read.exit_code(), exitcode::NOINPUT);
        assert_eq!(write.exit_code(), exitcode::CANTCREAT);
    }
}
