//! Structured observability events for the aggregation pipeline.
//!
//! Per-source failures are deliberately swallowed into empty result slots
//! (graceful degradation), so each swallowed error emits one of these events
//! to keep failures diagnosable from logs alone.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    SourceFetched {
        source: String,
        query: String,
        count: u32,
        from_cache: bool,
    },

    SourceFailed {
        source: String,
        query: String,
        error: String,
    },

    CacheWriteFailed {
        source: String,
        query: String,
        error: String,
    },
}

impl TelemetryEvent {
    /// Log the event as a structured tracing record under the `telemetry` target.
    pub fn emit(&self) {
        let payload = serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"));
        match self {
            TelemetryEvent::SourceFetched { .. } => {
                tracing::info!(target: "telemetry", event = %payload);
            }
            TelemetryEvent::SourceFailed { .. } | TelemetryEvent::CacheWriteFailed { .. } => {
                tracing::warn!(target: "telemetry", event = %payload);
            }
        }
    }
}
