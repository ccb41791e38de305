// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::process::ExitCode;

/// CLI-specific error type with exit code mapping
#[derive(Debug)]
pub enum CliError {
    /// Invalid command-line arguments
    InvalidArgs(String),
    /// Media device or graph object not found
    NotFound(String),
    /// Device node exists but cannot be accessed
    PermissionDenied(String),
    /// The kernel rejected a link setup request
    LinkRejected(String),
    /// The topology kept changing during the read
    Unstable(String),
    /// General error from the mediactl library
    General(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::InvalidArgs(msg) => write!(f, "Invalid arguments: {}", msg),
            CliError::NotFound(msg) => write!(f, "Not found: {}", msg),
            CliError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            CliError::LinkRejected(msg) => write!(f, "Link setup rejected: {}", msg),
            CliError::Unstable(msg) => write!(f, "Topology unstable: {}", msg),
            CliError::General(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::InvalidArgs(_) => ExitCode::from(2),
            CliError::NotFound(_) => ExitCode::from(3),
            CliError::PermissionDenied(_) => ExitCode::from(4),
            CliError::LinkRejected(_) => ExitCode::from(5),
            CliError::Unstable(_) => ExitCode::from(6),
            CliError::General(_) => ExitCode::from(1),
        }
    }
}

/// Map mediactl::Error to CliError with appropriate exit codes
impl From<mediactl::Error> for CliError {
    fn from(err: mediactl::Error) -> Self {
        use mediactl::Error;

        match err {
            Error::DeviceNotFound(what) => CliError::NotFound(what),
            Error::NoDevnode { major, minor } => {
                CliError::NotFound(format!("no device node for ({}, {})", major, minor))
            }
            Error::UnknownObject(id) => CliError::NotFound(format!("no object with id {}", id)),

            Error::LinkSetup(io_err) => CliError::LinkRejected(io_err.to_string()),
            Error::TopologyChanged { .. } => CliError::Unstable(err.to_string()),

            Error::Io(io_err) => match io_err.kind() {
                std::io::ErrorKind::NotFound => {
                    CliError::NotFound(format!("device not found: {}", io_err))
                }
                std::io::ErrorKind::PermissionDenied => {
                    CliError::PermissionDenied(io_err.to_string())
                }
                _ => CliError::General(format!("I/O error: {}", io_err)),
            },

            Error::TypeMismatch { .. } | Error::Malformed(_) | Error::Utf8(_) => {
                CliError::General(err.to_string())
            }
        }
    }
}

/// Helper function to convert result to exit code
pub fn result_to_exit_code<T>(result: Result<T, CliError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CliError::InvalidArgs("test".into()).exit_code(),
            ExitCode::from(2)
        );
        assert_eq!(CliError::NotFound("test".into()).exit_code(), ExitCode::from(3));
        assert_eq!(
            CliError::PermissionDenied("test".into()).exit_code(),
            ExitCode::from(4)
        );
        assert_eq!(
            CliError::LinkRejected("test".into()).exit_code(),
            ExitCode::from(5)
        );
        assert_eq!(CliError::Unstable("test".into()).exit_code(), ExitCode::from(6));
        assert_eq!(CliError::General("test".into()).exit_code(), ExitCode::from(1));
    }

    #[test]
    fn test_error_display() {
        let err = CliError::NotFound("/dev/media9".to_string());
        assert_eq!(format!("{}", err), "Not found: /dev/media9");
    }

    #[test]
    fn test_library_error_mapping() {
        let err = CliError::from(mediactl::Error::DeviceNotFound("model imx8*".into()));
        assert!(matches!(err, CliError::NotFound(_)));

        let err = CliError::from(mediactl::Error::UnknownObject(42));
        assert_eq!(err.exit_code(), ExitCode::from(3));
    }
}
