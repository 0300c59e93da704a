//! Typed errors for package resolution and installation.
//!
//! Orchestration code works with `anyhow::Result`; these types are wrapped
//! into it and can be recovered with `downcast_ref` where callers need to
//! branch on the failure kind (e.g. treating `NotFound` differently).

use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No package source knows about the name.
    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Failed to parse PKGBUILD: {0}")]
    Parse(#[from] ParseError),

    /// A collaborator process could not be started or exited unsuccessfully.
    #[error("{program} failed: {reason}")]
    Process { program: String, reason: String },

    /// The lookup service answered with an error envelope.
    #[error("AUR error: {0}")]
    Remote(String),

    /// A lookup or download never produced a usable answer.
    #[error("{action} for {name} failed")]
    Network {
        action: String,
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

impl Error {
    pub fn process(program: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::Process {
            program: program.into(),
            reason: reason.to_string(),
        }
    }

    pub fn network(
        action: impl Into<String>,
        name: impl Into<String>,
        source: anyhow::Error,
    ) -> Self {
        Error::Network {
            action: action.into(),
            name: name.into(),
            source: source.into(),
        }
    }
}

/// Failures while evaluating a recipe with the shell.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("could not start shell: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("broken pipe while writing recipe to shell: {0}")]
    Write(#[source] std::io::Error),

    #[error("failed to read shell output: {0}")]
    Read(#[source] std::io::Error),

    #[error("shell exited with {0}")]
    Exit(ExitStatus),

    #[error("Got bad ${field}: {value:?}")]
    BadNumber { field: &'static str, value: String },

    #[error("recipe has no target architecture")]
    NoArch,
}

/// Returns true if the error chain carries a [`Error::NotFound`].
pub fn is_not_found(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<Error>(), Some(Error::NotFound(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = Error::NotFound("foo".into());
        assert_eq!(err.to_string(), "Package not found: foo");
    }

    #[test]
    fn test_bad_number_names_field() {
        let err = ParseError::BadNumber {
            field: "pkgrel",
            value: "x".into(),
        };
        assert_eq!(err.to_string(), "Got bad $pkgrel: \"x\"");
    }

    #[test]
    fn test_is_not_found_through_context() {
        use anyhow::Context;

        let err: anyhow::Result<()> = Err(Error::NotFound("bar".into()).into());
        let err = err.context("resolving bar").unwrap_err();
        assert!(is_not_found(&err));

        let other = anyhow::anyhow!("something else");
        assert!(!is_not_found(&other));
    }

    #[test]
    fn test_network_keeps_cause_in_chain() {
        let err: anyhow::Error =
            Error::network("PKGBUILD download", "foo", anyhow::anyhow!("connection refused")).into();
        assert_eq!(
            format!("{:#}", err),
            "PKGBUILD download for foo failed: connection refused"
        );
        assert!(!is_not_found(&err));
    }
}
