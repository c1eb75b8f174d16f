//! CLI error types with exit code handling
//!
//! Library errors are folded into one error type that knows which exit
//! code to use.

use miette::Diagnostic;
use policyedit_core::CoreError;
use policyedit_manifest::ManifestError;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Unknown policy or invalid policy value
    #[error("Policy error: {message}")]
    #[diagnostic(code(policyedit::cli::policy))]
    Policy {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Resource missing or defined more than once
    #[error("Lookup error: {message}")]
    #[diagnostic(code(policyedit::cli::lookup))]
    Lookup {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Manifest cannot be parsed or edited
    #[error("Manifest error: {message}")]
    #[diagnostic(code(policyedit::cli::manifest))]
    Manifest {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(policyedit::cli::io))]
    Io { message: String },

    /// Invalid command line input
    #[error("Usage error: {message}")]
    #[diagnostic(code(policyedit::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Policy { .. } => exit_codes::POLICY_ERROR,
            CliError::Lookup { .. } => exit_codes::LOOKUP_ERROR,
            CliError::Manifest { .. } => exit_codes::MANIFEST_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
        }
    }

    /// Create a usage error with help text
    pub fn usage_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidTagPattern { .. } => CliError::Policy {
                message: err.to_string(),
                help: Some(
                    "use glob:<pattern>, semver:<range>, regexp:<expression> or a literal tag"
                        .to_string(),
                ),
            },
            CoreError::UnknownPolicy { .. } => CliError::Policy {
                message: err.to_string(),
                help: Some("known policies: automated, locked, locked_msg, tag.<container>, tag_all".to_string()),
            },
            CoreError::InvalidResourceId { .. } => CliError::Usage {
                message: err.to_string(),
                help: Some("resources are written <namespace>:<kind>/<name>".to_string()),
            },
            CoreError::Io(e) => CliError::from(e),
            CoreError::Config { .. } | CoreError::Yaml(_) => CliError::Usage {
                message: err.to_string(),
                help: None,
            },
        }
    }
}

impl From<ManifestError> for CliError {
    fn from(err: ManifestError) -> Self {
        let help = err.help().map(|h| h.to_string());
        let message = err.to_string();
        match err {
            ManifestError::InvalidTagPattern { .. } => CliError::Policy { message, help },
            ManifestError::Core(core) => CliError::from(core),
            e if e.is_lookup_failure() => CliError::Lookup { message, help },
            ManifestError::NoContainersFound { .. } => CliError::Policy { message, help },
            _ => CliError::Manifest { message, help },
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
        let err = CliError::Policy {
            message: "x".to_string(),
            help: None,
        };
        assert_eq!(err.exit_code(), exit_codes::POLICY_ERROR);
        assert_eq!(
            CliError::usage_with_help("x", "y").exit_code(),
            exit_codes::USAGE_ERROR
        );
    }

    #[test]
    fn test_manifest_errors_map_to_exit_codes() {
        let resource = "default:deployment/web".parse().unwrap();
        let err = CliError::from(ManifestError::ResourceNotFound { resource });
        assert_eq!(err.exit_code(), exit_codes::LOOKUP_ERROR);
        assert!(matches!(err, CliError::Lookup { help: Some(_), .. }));

        let err = CliError::from(ManifestError::MalformedManifest {
            document: 0,
            message: "bad".to_string(),
        });
        assert_eq!(err.exit_code(), exit_codes::MANIFEST_ERROR);
    }

    #[test]
    fn test_unknown_policy_message() {
        let err = CliError::from("frozen".parse::<policyedit_core::Policy>().unwrap_err());
        insta::assert_snapshot!(err.to_string(), @r#"Policy error: unknown policy "frozen""#);
    }
}
