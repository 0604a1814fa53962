#![forbid(unsafe_code)]

//! Runtime configuration.
//!
//! Defaults are overridden by environment variables:
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `FTUI_REACTIVE_REBUILD` | `always`, `skip-unchanged` | `always` |

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::ReactiveError;

/// Environment variable selecting the [`RebuildPolicy`].
pub const REBUILD_ENV: &str = "FTUI_REACTIVE_REBUILD";

/// What to do with the reactive-input group when new inputs arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebuildPolicy {
    /// Drop and rebuild on every input replacement.
    #[default]
    Always,
    /// Keep the live group when every binding is unchanged (same source
    /// identity, equal static values).
    SkipUnchanged,
}

impl RebuildPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::SkipUnchanged => "skip-unchanged",
        }
    }
}

impl fmt::Display for RebuildPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RebuildPolicy {
    type Err = ReactiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "skip-unchanged" | "skip_unchanged" | "skip" => Ok(Self::SkipUnchanged),
            other => Err(ReactiveError::InvalidPolicy {
                value: other.to_string(),
            }),
        }
    }
}

/// Configuration shared by every component built with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReactiveConfig {
    pub rebuild_policy: RebuildPolicy,
}

impl ReactiveConfig {
    /// Defaults with environment overrides applied.
    ///
    /// Unparseable values are ignored with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(val) = env::var(REBUILD_ENV) {
            match val.parse() {
                Ok(policy) => config.rebuild_policy = policy,
                Err(err) => tracing::warn!(%err, "ignoring {REBUILD_ENV}"),
            }
        }
        config
    }

    #[must_use]
    pub fn with_rebuild_policy(mut self, policy: RebuildPolicy) -> Self {
        self.rebuild_policy = policy;
        self
    }
}
