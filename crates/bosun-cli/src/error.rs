//! CLI error types with exit code handling

use bosun_core::CoreError;
use bosun_kube::KubeError;
use bosun_logging::LoggingError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Invalid arguments or options
    #[error("{message}")]
    #[diagnostic(code(bosun::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Template could not be loaded or compiled
    #[error("Template error: {message}")]
    #[diagnostic(code(bosun::cli::template))]
    Template { message: String },

    #[error(transparent)]
    #[diagnostic(code(bosun::cli::flags))]
    Flags(#[from] CoreError),

    #[error(transparent)]
    #[diagnostic(code(bosun::cli::logging))]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    #[diagnostic(code(bosun::cli::cluster))]
    Kube(#[from] KubeError),

    #[error("Interrupted")]
    #[diagnostic(code(bosun::cli::interrupted))]
    Interrupted,
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage { .. } | CliError::Flags(_) | CliError::Logging(_) => {
                exit_codes::USAGE_ERROR
            }
            CliError::Template { .. } => exit_codes::TEMPLATE_ERROR,
            CliError::Kube(_) => exit_codes::CLUSTER_ERROR,
            CliError::Interrupted => exit_codes::INTERRUPTED,
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: None,
        }
    }

    pub fn usage_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn template(message: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::usage("bad").exit_code(), exit_codes::USAGE_ERROR);
        assert_eq!(
            CliError::template("broken").exit_code(),
            exit_codes::TEMPLATE_ERROR
        );
        assert_eq!(
            CliError::from(KubeError::Cluster("down".into())).exit_code(),
            exit_codes::CLUSTER_ERROR
        );
        assert_eq!(
            CliError::from(LoggingError::InvalidFormat("xml".into())).exit_code(),
            exit_codes::USAGE_ERROR
        );
        assert_eq!(CliError::Interrupted.exit_code(), exit_codes::INTERRUPTED);
    }

    #[test]
    fn test_messages_pass_through() {
        let err = CliError::from(KubeError::Hook("webhook cleanup failed".into()));
        assert_eq!(err.to_string(), "hook failed: webhook cleanup failed");
    }
}
