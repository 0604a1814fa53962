#![forbid(unsafe_code)]

//! Errors for host-contract misuse.
//!
//! Structural hazards (leaks, double disposal, sources that never resolve)
//! are handled by construction and never surface here. These variants only
//! report a host driving the lifecycle out of order or a bad declaration.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReactiveError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    #[error("component is already mounted")]
    AlreadyMounted,

    #[error("component was unmounted; create a fresh instance to mount again")]
    Unmounted,

    #[error("tracked key declared more than once: {key}")]
    DuplicateKey { key: String },

    #[error("invalid rebuild policy: {value}")]
    InvalidPolicy { value: String },

    #[error("template error: {message}")]
    Template { message: String },
}

impl ReactiveError {
    #[must_use]
    pub fn duplicate(key: impl Into<String>) -> Self {
        Self::DuplicateKey { key: key.into() }
    }

    #[must_use]
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
        }
    }

    /// Whether the error comes from calling lifecycle events out of order.
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::AlreadyMounted | Self::Unmounted)
    }
}
