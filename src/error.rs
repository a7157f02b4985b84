//! Error types used by the giftwatch runtime and its collaborators.
//!
//! Per-creator failures never leave the creator's supervisor:
//! - [`ProbeError`] is folded into a negative liveness result;
//! - [`ConnectError`] / [`StreamError`] drive the connection state machine into backoff;
//! - [`StorageError`] / [`DeliveryError`] are logged by the gift sink and otherwise ignored.
//!
//! Only [`RuntimeError`] is returned from [`GiftMonitor::run`](crate::GiftMonitor::run).
//!
//! Every type exposes `as_label()`, a short stable snake_case label for logs.

use std::time::Duration;
use thiserror::Error;

use crate::core::TripReason;

/// # Errors produced by the monitor runtime itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The roster store could not be read at startup; nothing can be scanned.
    #[error("initial roster load failed: {source}")]
    Startup {
        /// Underlying roster store failure.
        #[source]
        source: RosterError,
    },

    /// OS signal listeners could not be registered.
    #[error("signal registration failed: {0}")]
    Signal(#[from] std::io::Error),

    /// The process watchdog decided the service is stagnant or too old.
    #[error("watchdog tripped: {reason}")]
    WatchdogTripped {
        /// Why the watchdog fired.
        reason: TripReason,
    },

    /// Supervisors did not drain within the grace period.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Creators whose supervisors were still running.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use giftwatch::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Startup { .. } => "runtime_startup",
            RuntimeError::Signal(_) => "runtime_signal",
            RuntimeError::WatchdogTripped { .. } => "runtime_watchdog_tripped",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// # Liveness probe failures.
///
/// Never propagated: the probe reports these as "not live".
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The probe did not answer within its budget.
    #[error("probe timed out after {timeout:?}")]
    Timeout {
        /// The probe timeout that was exceeded.
        timeout: Duration,
    },

    /// Network or platform failure.
    #[error("probe transport failure: {error}")]
    Transport {
        /// The underlying error message.
        error: String,
    },

    /// The platform answered with something unparseable.
    #[error("malformed probe response: {error}")]
    Malformed {
        /// The underlying error message.
        error: String,
    },
}

impl ProbeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProbeError::Timeout { .. } => "probe_timeout",
            ProbeError::Transport { .. } => "probe_transport",
            ProbeError::Malformed { .. } => "probe_malformed",
        }
    }
}

/// # Session open failures.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConnectError {
    /// The session did not open within the connect timeout.
    #[error("connect timed out after {timeout:?}")]
    Timeout {
        /// The connect timeout that was exceeded.
        timeout: Duration,
    },

    /// The platform refused the session (offline, rate limited, blocked).
    #[error("connect refused: {error}")]
    Refused {
        /// The underlying error message.
        error: String,
    },
}

impl ConnectError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use giftwatch::ConnectError;
    /// use std::time::Duration;
    ///
    /// let err = ConnectError::Timeout { timeout: Duration::from_secs(20) };
    /// assert_eq!(err.as_label(), "connect_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConnectError::Timeout { .. } => "connect_timeout",
            ConnectError::Refused { .. } => "connect_refused",
        }
    }
}

/// # Failures while reading an open session.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StreamError {
    /// The connection broke mid-stream.
    #[error("stream transport failure: {error}")]
    Transport {
        /// The underlying error message.
        error: String,
    },

    /// A frame could not be decoded into a domain event.
    #[error("stream decode failure: {error}")]
    Decode {
        /// The underlying error message.
        error: String,
    },
}

impl StreamError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StreamError::Transport { .. } => "stream_transport",
            StreamError::Decode { .. } => "stream_decode",
        }
    }
}

/// Persistence sink failure (best-effort dispatch).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("storage failed: {error}")]
pub struct StorageError {
    /// The underlying error message.
    pub error: String,
}

impl StorageError {
    /// Creates a storage error from any message.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        "storage_failed"
    }
}

/// Alert sink failure (best-effort dispatch).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("alert delivery failed: {error}")]
pub struct DeliveryError {
    /// The underlying error message.
    pub error: String,
}

impl DeliveryError {
    /// Creates a delivery error from any message.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        "delivery_failed"
    }
}

/// Roster store read failure.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RosterError {
    /// The store could not be reached or queried.
    #[error("roster store unavailable: {error}")]
    Unavailable {
        /// The underlying error message.
        error: String,
    },

    /// The store did not answer within the roster timeout.
    #[error("roster read timed out after {timeout:?}")]
    Timeout {
        /// The budget that was exceeded.
        timeout: Duration,
    },
}

impl RosterError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RosterError::Unavailable { .. } => "roster_unavailable",
            RosterError::Timeout { .. } => "roster_timeout",
        }
    }
}
