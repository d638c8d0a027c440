//! Error types used by subjects, registries, and delivery passes.
//!
//! This module defines three error types:
//!
//! - [`SubjectError`] — structural errors returned synchronously from
//!   `publish`/`subscribe` (the subject or its registry was closed).
//! - [`DeliveryError`] — per-target outcomes recorded in a
//!   [`DispatchResult`](crate::DispatchResult); never fatal to a pass.
//! - [`ReceiveError`] — the error a delivery target returns from its
//!   `receive` implementation.
//!
//! All types provide helper methods (`as_label`, `as_message`) for
//! logging/metrics sinks.

use std::time::Duration;
use thiserror::Error;

/// # Structural errors returned to publishers and subscribers.
///
/// These are fatal to the calling operation only: a closed subject rejects
/// new publishes and subscriptions, but in-flight passes always complete.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubjectError {
    /// Publish or subscribe was attempted after the subject was closed.
    #[error("subject '{subject}' is closed")]
    Closed {
        /// Name of the closed subject.
        subject: String,
    },

    /// A registry mutation was attempted after the owning subject closed
    /// its registry.
    #[error("registry of subject '{subject}' is closed")]
    RegistryClosed {
        /// Name of the subject that owns the registry.
        subject: String,
    },
}

impl SubjectError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use notibus::SubjectError;
    ///
    /// let err = SubjectError::Closed { subject: "config".into() };
    /// assert_eq!(err.as_label(), "subject_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SubjectError::Closed { .. } => "subject_closed",
            SubjectError::RegistryClosed { .. } => "registry_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SubjectError::Closed { subject } => format!("subject closed: {subject}"),
            SubjectError::RegistryClosed { subject } => {
                format!("registry closed: subject={subject}")
            }
        }
    }
}

/// # Per-target delivery outcomes.
///
/// Recorded in the [`DispatchResult`](crate::DispatchResult) of the target
/// that produced them. A delivery error never aborts the pass and never
/// propagates to the publisher or to other targets.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The target's `receive` returned an error.
    #[error("delivery failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The target's `receive` panicked; the panic was caught at the
    /// invocation boundary.
    #[error("target panicked: {reason}")]
    Panicked {
        /// Panic payload rendered as text.
        reason: String,
    },

    /// The invocation exceeded the per-delivery deadline.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// The pass was cancelled before this target's invocation was issued.
    #[error("pass cancelled before delivery")]
    Cancelled,
}

impl DeliveryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use notibus::DeliveryError;
    ///
    /// let err = DeliveryError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "delivery_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DeliveryError::Failed { .. } => "delivery_failed",
            DeliveryError::Panicked { .. } => "delivery_panicked",
            DeliveryError::Timeout { .. } => "delivery_timeout",
            DeliveryError::Cancelled => "delivery_cancelled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DeliveryError::Failed { error } => format!("failed: {error}"),
            DeliveryError::Panicked { reason } => format!("panicked: {reason}"),
            DeliveryError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            DeliveryError::Cancelled => "cancelled".to_string(),
        }
    }
}

/// Error returned by a delivery target's `receive` implementation.
///
/// Carries only a message; targets that need structured errors should log
/// or export them on their own side before returning.
///
/// # Example
/// ```
/// use notibus::ReceiveError;
///
/// let err = ReceiveError::new("display disconnected");
/// assert_eq!(err.to_string(), "display disconnected");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ReceiveError {
    message: String,
}

impl ReceiveError {
    /// Creates a new error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for ReceiveError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for ReceiveError {
    fn from(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
