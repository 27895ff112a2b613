//! Retry and failure-handling policies attached to a pipeline definition

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_retries() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    300
}

fn default_execution_timeout() -> u64 {
    7200
}

/// Per-run policy applied uniformly to the whole pipeline, not per stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema_gen", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub struct RetryPolicy {
    /// Number of re-attempts after a failed stage execution
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Delay between attempts in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,

    /// Upper bound for the whole run in seconds
    #[serde(default = "default_execution_timeout")]
    pub execution_timeout_seconds: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            retry_delay_seconds: default_retry_delay(),
            execution_timeout_seconds: default_execution_timeout(),
        }
    }
}

impl RetryPolicy {
    /// Total number of attempts a stage gets, the first one included.
    pub fn attempts(&self) -> u32 {
        self.retries + 1
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds)
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.execution_timeout_seconds)
    }
}

/// How a stage failure affects the rest of the run.
///
/// `Propagate` is the default: a failed stage aborts the run so later layers
/// never execute on top of a broken upstream layer. `Continue` suppresses
/// propagation and must be declared explicitly in the definition; it trades
/// the lineage guarantee for run completion and is logged loudly when used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema_gen", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Abort the run on the first stage failure
    #[default]
    Propagate,
    /// Record the failure and keep executing later stages
    Continue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retries, 2);
        assert_eq!(policy.retry_delay(), Duration::from_secs(300));
        assert_eq!(policy.execution_timeout(), Duration::from_secs(7200));
        assert_eq!(policy.attempts(), 3);
    }

    #[test]
    fn failure_mode_defaults_to_propagate() {
        assert_eq!(FailureMode::default(), FailureMode::Propagate);
    }
}
