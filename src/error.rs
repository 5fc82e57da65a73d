//! Error types for the telemetry client.
//!
//! Only construction-time misconfiguration is ever surfaced to callers; once
//! a [`Recorder`](crate::Recorder) is built, recording never fails loudly.
//! [`TransportError`] exists for the dispatch path and for custom
//! [`Transport`](crate::Transport) implementations; the worker logs it and
//! moves on.

/// Errors raised while building a recorder or one of its collaborators.
///
/// These are fatal and surface from constructors only. Nothing else in the
/// crate propagates errors to application code.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum BuildError {
    /// The source id that identifies the emitting component was empty.
    #[error("source id must not be empty")]
    EmptySourceId,
    /// The buffer capacity was not a positive integer.
    #[error("buffer capacity must be positive (got {given})")]
    InvalidCapacity {
        /// The rejected capacity value.
        given: usize,
    },
    /// The gag period for failure logging was zero.
    #[error("gag period must be positive")]
    InvalidGagPeriod,
    /// No transport and no endpoint were supplied to the builder.
    #[error("a transport or an endpoint URL must be provided")]
    MissingEndpoint,
    /// The endpoint URL could not be used as a transport target.
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// The endpoint as supplied by the caller or the config file.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The underlying HTTP client could not be constructed.
    #[error("failed to build http client: {reason}")]
    HttpClient {
        /// Error detail from the client library.
        reason: String,
    },
}

/// Errors signaled by a [`Transport`](crate::Transport).
///
/// The dispatch worker treats every variant identically: log (rate-gated)
/// and drop the invocation. There is no retry.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum TransportError {
    /// The HTTP request could not be performed (I/O, DNS, timeout, ...).
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("server responded {status} to POST {path}")]
    Status {
        /// HTTP status code of the response.
        status: u16,
        /// Request path the response belongs to.
        path: String,
    },
    /// The request path could not be joined onto the endpoint URL.
    #[error("invalid request path '{path}': {reason}")]
    Path {
        /// The offending path.
        path: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Errors from loading or validating a [`RecorderConfig`](crate::RecorderConfig).
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("config file {path} could not be read: {source}")]
    Io {
        /// Path of the file that was attempted.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config file was not valid JSON.
    #[error("config in {path} is not valid JSON: {source}")]
    Parse {
        /// Path of the offending file.
        path: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// The config parsed but failed validation.
    #[error("invalid config in {path}: {reason}")]
    Invalid {
        /// Origin of the config (file path or a caller-supplied label).
        path: String,
        /// What was wrong.
        reason: String,
    },
}

/// Errors from constructing an [`Event`](crate::Event).
///
/// The recorder facade swallows these (the malformed event is dropped with a
/// debug log); they are only visible when building events by hand.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EventError {
    /// Neither an input nor an output message id was given.
    #[error("event must reference at least one input or output message")]
    NoMessageIds,
    /// The source id was empty.
    #[error("source id must not be empty")]
    EmptySourceId,
}
