// ── Measurement values and their classification ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One complete probe cycle's measurements.
///
/// Produced whole by [`ProbeSuite::run_cycle`](crate::probes::ProbeSuite::run_cycle);
/// there is no partially populated form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Round-trip latency in milliseconds.
    pub ping_ms: f64,
    /// Mean download throughput in Mbps.
    pub download_mbps: f64,
    /// Upload throughput in Mbps.
    pub upload_mbps: f64,
    /// Page fetch time in milliseconds.
    pub browsing_ms: f64,
    /// Synthetic video Mean Opinion Score, 1.0 to 5.0.
    pub video_mos: f64,
}

/// Discrete quality bucket derived from [`Metrics`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QualityCategory {
    Excellent,
    Good,
    Fair,
    Poor,
}

/// Display color of a [`QualityCategory`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CategoryColor {
    Blue,
    Green,
    Yellow,
    Red,
}

impl CategoryColor {
    /// Hex value used for marker borders and badges.
    pub fn hex(self) -> &'static str {
        match self {
            Self::Blue => "#0EA5E9",
            Self::Green => "#22c55e",
            Self::Yellow => "#eab308",
            Self::Red => "#ef4444",
        }
    }
}
