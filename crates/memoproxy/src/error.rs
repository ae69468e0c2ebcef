//! Error types for memoproxy

use thiserror::Error;

use crate::fingerprint::Fingerprint;

/// Boxed error raised by a subject or a cache backend
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for proxy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the proxy
#[derive(Debug, Error)]
pub enum Error {
    /// Subject or cache store missing at call time
    #[error("proxy is not configured: {}", missing_parts(.subject, .store))]
    NotConfigured {
        /// Subject is missing
        subject: bool,
        /// Cache store is missing
        store: bool,
    },

    /// Subject exposes operations reserved by the proxy
    #[error("methods {} are not allowed in the subject", .0.join(" "))]
    AmbiguousDispatch(Vec<String>),

    /// Forwarded call names an operation the subject does not expose
    #[error("method {method} does not exist on {type_name}")]
    UnknownMethod {
        /// Subject type identifier
        type_name: String,
        /// Requested operation
        method: String,
    },

    /// The subject raised an error or panicked during the call
    #[error("call to {type_name}::{method} failed")]
    SubjectInvocationFailed {
        /// Subject type identifier
        type_name: String,
        /// Invoked operation
        method: String,
        /// Original cause
        #[source]
        source: BoxError,
    },

    /// Fingerprint has no tracked hit count
    #[error("unknown fingerprint {0}")]
    UnknownFingerprint(Fingerprint),

    /// Cache backend failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Call descriptor could not be serialized for hashing
    #[error("failed to encode call descriptor: {0}")]
    Encode(#[from] serde_json::Error),
}

fn missing_parts(subject: &bool, store: &bool) -> &'static str {
    match (*subject, *store) {
        (true, true) => "subject and cache store not set",
        (true, false) => "subject not set",
        (false, true) => "cache store not set",
        (false, false) => "nothing missing",
    }
}

/// Errors reported by cache backends
#[derive(Debug, Error)]
pub enum StoreError {
    /// `has` reported the key but `get` found nothing
    #[error("cache entry {0} vanished between lookup and read")]
    Vanished(String),

    /// Stored bytes could not be decoded back into a value
    #[error("corrupt cache entry {key}: {source}")]
    Corrupt {
        /// Offending key
        key: String,
        /// Decoding failure
        #[source]
        source: serde_json::Error,
    },

    /// Backend-specific failure (I/O, SQL, network)
    #[error("cache backend error: {0}")]
    Backend(#[source] BoxError),
}

impl StoreError {
    /// Wrap any backend error
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }
}

/// Panic raised inside a subject call
#[derive(Debug, Error)]
#[error("subject panicked: {message}")]
pub struct SubjectPanic {
    /// Panic payload rendered as text
    pub message: String,
}

/// Positional argument missing or of the wrong type
#[derive(Debug, Error)]
pub enum ArgumentError {
    /// Fewer arguments than the operation needs
    #[error("missing argument {index}")]
    Missing {
        /// Zero-based position
        index: usize,
    },

    /// Argument present but of an unexpected type
    #[error("argument {index}: expected {expected}, got {found}")]
    Type {
        /// Zero-based position
        index: usize,
        /// Expected kind
        expected: &'static str,
        /// Actual kind
        found: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_configured_message() {
        let err = Error::NotConfigured {
            subject: true,
            store: false,
        };
        assert_eq!(err.to_string(), "proxy is not configured: subject not set");
    }

    #[test]
    fn test_ambiguous_dispatch_lists_names() {
        let err = Error::AmbiguousDispatch(vec!["call".into(), "store".into()]);
        assert!(err.to_string().contains("not allowed"));
        assert!(err.to_string().contains("call store"));
    }

    #[test]
    fn test_invocation_failure_keeps_source() {
        use std::error::Error as _;

        let err = Error::SubjectInvocationFailed {
            type_name: "Calc".into(),
            method: "div".into(),
            source: Box::new(SubjectPanic {
                message: "divide by zero".into(),
            }),
        };
        let source = err.source().unwrap();
        assert!(source.to_string().contains("divide by zero"));
    }
}
