//! Error types for the Galera operator

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while computing Galera configuration artifacts
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    // =========================================================================
    // Precondition Errors
    // =========================================================================
    /// Cluster configuration precondition not met
    #[error("Configuration error: {0}")]
    Config(String),

    /// Ordinal could not be derived from a pod name
    #[error("Invalid pod index in '{pod_name}': {reason}")]
    PodIndex { pod_name: String, reason: String },

    /// Pod has not been scheduled yet
    #[error("pod has no assigned node: {pod_name}")]
    NoAssignedNode { pod_name: String },

    // =========================================================================
    // Format Errors
    // =========================================================================
    /// Malformed option text
    #[error("Parse error: {0}")]
    Parse(String),

    /// SST method not recognized
    #[error("Unsupported SST method: {0}")]
    UnsupportedSst(String),

    // =========================================================================
    // Resolution Errors
    // =========================================================================
    /// DNS lookup failed
    #[error("DNS resolution failed for {host}: {reason}")]
    DnsResolution { host: String, reason: String },

    /// DNS lookup returned no IPv4 records
    #[error("No IPv4 address found for {host}")]
    NoIpv4Address { host: String },

    // =========================================================================
    // Strategy Errors
    // =========================================================================
    /// Declared update strategy is not supported
    #[error("unsupported update strategy type: {0}")]
    UnsupportedUpdateStrategy(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used by callers to pick a requeue policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Not ready yet, retry later
    Precondition,
    /// Configuration bug, surface on the resource status
    Format,
    /// Transient lookup failure, requeue with backoff
    Resolution,
    /// Fatal to the specific rollout decision
    Unsupported,
    /// API server, filesystem or serialization failure
    Infrastructure,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) | Error::PodIndex { .. } | Error::NoAssignedNode { .. } => {
                ErrorKind::Precondition
            }
            Error::Parse(_) | Error::UnsupportedSst(_) => ErrorKind::Format,
            Error::DnsResolution { .. } | Error::NoIpv4Address { .. } => ErrorKind::Resolution,
            Error::UnsupportedUpdateStrategy(_) => ErrorKind::Unsupported,
            Error::Kube(_) | Error::Io(_) | Error::Serialization(_) | Error::Internal(_) => {
                ErrorKind::Infrastructure
            }
        }
    }

    /// Whether the caller should requeue and try again later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Precondition | ErrorKind::Resolution | ErrorKind::Infrastructure
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::Parse("empty input".to_string()).to_string(),
            "Parse error: empty input"
        );
        assert!(Error::NoAssignedNode {
            pod_name: "mariadb-0".to_string()
        }
        .to_string()
        .contains("pod has no assigned node"));
        assert!(Error::UnsupportedUpdateStrategy("Never".to_string())
            .to_string()
            .contains("unsupported update strategy type"));
    }

    #[test]
    fn test_error_classification() {
        assert_eq!(
            Error::Config("at least one replica required".to_string()).kind(),
            ErrorKind::Precondition
        );
        assert_eq!(
            Error::UnsupportedSst("xtrabackup".to_string()).kind(),
            ErrorKind::Format
        );
        assert_eq!(
            Error::NoIpv4Address {
                host: "mariadb-0".to_string()
            }
            .kind(),
            ErrorKind::Resolution
        );
        assert_eq!(
            Error::UnsupportedUpdateStrategy(String::new()).kind(),
            ErrorKind::Unsupported
        );
    }

    #[test]
    fn test_retryable() {
        assert!(Error::NoAssignedNode {
            pod_name: "mariadb-1".to_string()
        }
        .is_retryable());
        assert!(Error::DnsResolution {
            host: "mariadb-1".to_string(),
            reason: "timeout".to_string()
        }
        .is_retryable());
        assert!(!Error::Parse("invalid input".to_string()).is_retryable());
        assert!(!Error::UnsupportedUpdateStrategy("Never".to_string()).is_retryable());
    }
}
