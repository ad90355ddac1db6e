// ── Per-run output and its persisted form ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::metrics::{CategoryColor, Metrics};
use super::session::{ResultId, SessionId};

/// A single geolocation fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in meters, when the source reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
}

impl GeoPosition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m: None,
        }
    }
}

/// What one completed run hands to the sink.
///
/// `color` is always derived from `metrics` by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// 1-based run number within the sequence.
    pub run: u32,
    pub metrics: Metrics,
    pub color: CategoryColor,
    pub position: Option<GeoPosition>,
    pub recorded_at: DateTime<Utc>,
}

/// A sample as persisted by a [`ResultStore`](crate::store::ResultStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: ResultId,
    pub session_id: SessionId,
    pub metrics: Metrics,
    pub color: Option<CategoryColor>,
    pub position: Option<GeoPosition>,
    pub created_at: DateTime<Utc>,
}
