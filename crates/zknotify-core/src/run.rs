use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

/// Read-only snapshot of a provisioning run, supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    pub node_name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Set when the run ended with an error.
    pub failure: Option<String>,
}

impl RunContext {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: Some(node_name.into()),
            ..Self::default()
        }
    }

    pub fn start_clock(&mut self) {
        self.start_time = Some(Utc::now());
        self.end_time = None;
    }

    pub fn stop_clock(&mut self) {
        self.end_time = Some(Utc::now());
    }

    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.failure = Some(message.into());
    }

    /// Known only once the run has both started and stopped.
    pub fn elapsed_time(&self) -> Option<Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.elapsed_time().is_some()
    }

    pub fn success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Which end of the run a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Start,
    End,
}

impl Phase {
    /// A missing run object or a run still in progress reports `Start`.
    pub fn select(run: Option<&RunContext>) -> Self {
        match run {
            Some(run) if run.is_completed() => Self::End,
            _ => Self::Start,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
        }
    }
}

/// The entry point a host calls once per run.
///
/// Hosts that have no run status to offer pass `None`.
pub trait RunHook {
    fn on_run_complete(&mut self, run: Option<&RunContext>) -> Result<(), NotifyError>;
}
