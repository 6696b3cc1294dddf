//! Error types for the domain layer.
//!
//! Every public operation reports a single [`Error`]. Failures raised deep in
//! a call chain are re-wrapped with [`Error::within`] at each public boundary
//! so the caller sees one configuration-error family per operation, with the
//! original failure kept as the source.

use std::fmt;
use std::time::Duration;

use sparkdeck_api::types::ClusterState;
use sparkdeck_api::ApiError;
use sparkdeck_core::ClusterId;
use thiserror::Error;

/// A result type using the domain [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// The resource family a configuration error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Clusters and their lifecycle.
    Cluster,
    /// Jobs and job builders.
    Job,
    /// Job runs.
    Run,
    /// Libraries and their cluster associations.
    Library,
    /// Workspace objects such as notebooks.
    Workspace,
    /// Session construction and configuration.
    Session,
}

impl Family {
    /// Lowercase name used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cluster => "cluster",
            Self::Job => "job",
            Self::Run => "run",
            Self::Library => "library",
            Self::Workspace => "workspace",
            Self::Session => "session",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur in domain operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The platform could not be reached or answered with a non-success status.
    #[error("transport error: {0}")]
    Transport(#[from] ApiError),

    /// Invalid or inconsistent input, or a wrapped failure from a nested call.
    #[error("{family} configuration error: {message}")]
    Config {
        /// The family the failing operation belongs to.
        family: Family,
        /// What went wrong.
        message: String,
        /// The wrapped failure, if any.
        #[source]
        source: Option<Box<Error>>,
    },

    /// A required field was not supplied.
    #[error("{family} configuration error: required field `{field}` is missing")]
    MissingField {
        /// The family the field belongs to.
        family: Family,
        /// Wire name of the missing field.
        field: &'static str,
    },

    /// A record matches none of the supported job variants.
    #[error("{family} configuration error: unsupported job type: {detail}")]
    UnsupportedType {
        /// Job or run.
        family: Family,
        /// Which fields were populated.
        detail: String,
    },

    /// A lifecycle operation is not valid in the cluster's current state.
    #[error("cluster configuration error: cannot {operation} cluster {cluster_id} in state {state}")]
    InvalidState {
        /// The cluster the operation was attempted on.
        cluster_id: ClusterId,
        /// The state read just before the attempt.
        state: ClusterState,
        /// The rejected operation.
        operation: &'static str,
    },

    /// An embedded reference (notebook, script, file) could not be resolved.
    #[error("resource error: {message}")]
    Resource {
        /// What could not be resolved.
        message: String,
        /// The wrapped failure, if any.
        #[source]
        source: Option<Box<Error>>,
    },

    /// A local file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A wait helper gave up.
    #[error("timed out after {waited:?} waiting for {what}")]
    Timeout {
        /// What was being waited for.
        what: String,
        /// How long the helper waited.
        waited: Duration,
    },
}

impl Error {
    /// A configuration error with no wrapped cause.
    #[must_use]
    pub fn config(family: Family, message: impl Into<String>) -> Self {
        Self::Config {
            family,
            message: message.into(),
            source: None,
        }
    }

    /// A resource error with no wrapped cause.
    #[must_use]
    pub fn resource(message: impl Into<String>) -> Self {
        Self::Resource {
            message: message.into(),
            source: None,
        }
    }

    /// A resource error wrapping `source`.
    #[must_use]
    pub fn resource_caused_by(message: impl Into<String>, source: Self) -> Self {
        Self::Resource {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The configuration family this error belongs to, if it is one.
    #[must_use]
    pub const fn family(&self) -> Option<Family> {
        match self {
            Self::Config { family, .. }
            | Self::MissingField { family, .. }
            | Self::UnsupportedType { family, .. } => Some(*family),
            Self::InvalidState { .. } => Some(Family::Cluster),
            Self::Transport(_) | Self::Resource { .. } | Self::Io(_) | Self::Timeout { .. } => {
                None
            }
        }
    }

    /// Re-wrap this error as a configuration error of `family`.
    ///
    /// Errors that already belong to `family` are returned unchanged, so
    /// applying this at nested boundaries never stacks wrappers of the same
    /// family.
    #[must_use]
    pub fn within(self, family: Family) -> Self {
        if self.family() == Some(family) {
            return self;
        }
        Self::Config {
            family,
            message: self.to_string(),
            source: Some(Box::new(self)),
        }
    }

    /// The innermost wrapped error.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        let mut current = self;
        while let Self::Config {
            source: Some(inner),
            ..
        }
        | Self::Resource {
            source: Some(inner),
            ..
        } = current
        {
            current = &**inner;
        }
        current
    }

    /// The transport error at the root of this error, if any.
    #[must_use]
    pub fn transport(&self) -> Option<&ApiError> {
        match self.root_cause() {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_wraps_foreign_errors() {
        let err = Error::from(ApiError::Unauthorized).within(Family::Job);

        assert_eq!(err.family(), Some(Family::Job));
        assert!(matches!(err.root_cause(), Error::Transport(ApiError::Unauthorized)));
        assert!(err.to_string().starts_with("job configuration error"));
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn within_keeps_same_family() {
        let err = Error::MissingField {
            family: Family::Job,
            field: "notebook_task.notebook_path",
        }
        .within(Family::Job);

        assert!(matches!(err, Error::MissingField { .. }));
    }

    #[test]
    fn nested_wrapping_reaches_root() {
        let err = Error::resource_caused_by(
            "notebook /x not found",
            Error::from(ApiError::Status {
                status: 404,
                error_code: None,
                message: "missing".into(),
            }),
        )
        .within(Family::Workspace)
        .within(Family::Job);

        assert_eq!(err.family(), Some(Family::Job));
        assert!(err.transport().is_some_and(ApiError::is_not_found));
    }

    #[test]
    fn invalid_state_is_cluster_family() {
        let err = Error::InvalidState {
            cluster_id: "c-1".parse().unwrap(),
            state: ClusterState::Terminated,
            operation: "restart",
        };
        assert_eq!(err.family(), Some(Family::Cluster));
        assert_eq!(
            err.to_string(),
            "cluster configuration error: cannot restart cluster c-1 in state TERMINATED"
        );
    }
}
