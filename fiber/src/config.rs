//! Scheduler configuration.

use std::time::Duration;

/// Environment variable overriding [`SchedulerConfig::time_slice`], in milliseconds.
pub const TIME_SLICE_ENV: &str = "UNDERTOW_TIME_SLICE_MS";
/// Environment variable overriding [`SchedulerConfig::strict_hooks`].
pub const STRICT_HOOKS_ENV: &str = "UNDERTOW_STRICT_HOOKS";

/// Tunables of a [`Scheduler`](crate::Scheduler).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[must_use]
pub struct SchedulerConfig {
    time_slice: Duration,
    strict_hooks: bool,
    record_commits: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            time_slice: Duration::from_millis(5),
            strict_hooks: true,
            record_commits: true,
        }
    }
}

impl SchedulerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads overrides from the process environment.
    ///
    /// Unparsable values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup(TIME_SLICE_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(millis) => config.time_slice = Duration::from_millis(millis),
                Err(error) => {
                    tracing::warn!(target: "undertow::scheduler", %error, value = %raw, "ignoring {TIME_SLICE_ENV}");
                }
            }
        }
        if let Some(raw) = lookup(STRICT_HOOKS_ENV) {
            match parse_flag(&raw) {
                Some(flag) => config.strict_hooks = flag,
                None => {
                    tracing::warn!(target: "undertow::scheduler", value = %raw, "ignoring {STRICT_HOOKS_ENV}");
                }
            }
        }
        config
    }

    /// Sets the wall-clock budget of one work-loop invocation.
    pub const fn with_time_slice(mut self, time_slice: Duration) -> Self {
        self.time_slice = time_slice;
        self
    }

    /// Controls whether hook contract violations abort the render pass.
    ///
    /// When disabled, a mismatched slot is re-initialized and a warning is logged.
    pub const fn with_strict_hooks(mut self, strict: bool) -> Self {
        self.strict_hooks = strict;
        self
    }

    /// Controls whether commit reports list every touched unit.
    ///
    /// Counts are always kept.
    pub const fn with_record_commits(mut self, record: bool) -> Self {
        self.record_commits = record;
        self
    }

    /// Wall-clock budget of one work-loop invocation.
    #[must_use]
    pub const fn time_slice(&self) -> Duration {
        self.time_slice
    }

    /// Whether hook contract violations abort the render pass.
    #[must_use]
    pub const fn strict_hooks(&self) -> bool {
        self.strict_hooks
    }

    /// Whether commit reports list every touched unit.
    #[must_use]
    pub const fn record_commits(&self) -> bool {
        self.record_commits
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SchedulerConfig::new();
        assert_eq!(config.time_slice(), Duration::from_millis(5));
        assert!(config.strict_hooks());
        assert!(config.record_commits());
    }

    #[test]
    fn environment_overrides() {
        let config = SchedulerConfig::from_lookup(|name| match name {
            TIME_SLICE_ENV => Some("12".into()),
            STRICT_HOOKS_ENV => Some("off".into()),
            _ => None,
        });
        assert_eq!(config.time_slice(), Duration::from_millis(12));
        assert!(!config.strict_hooks());
    }

    #[test]
    fn invalid_environment_values_are_ignored() {
        let config = SchedulerConfig::from_lookup(|name| match name {
            TIME_SLICE_ENV => Some("soon".into()),
            STRICT_HOOKS_ENV => Some("maybe".into()),
            _ => None,
        });
        assert_eq!(config, SchedulerConfig::default());
    }
}
