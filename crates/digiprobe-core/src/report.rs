// ── Report views ──
//
// Shapes persisted results for map and trend-chart presentation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{CategoryColor, GeoPosition, Metrics, ResultId, ResultRecord};
use crate::quality::{OperatorGlyph, glyph_of};

/// Trend chart scale factor bringing MOS (1..5) near the Mbps/ms axes.
pub const MOS_TREND_SCALE: f64 = 20.0;

/// Download rate scoring 100 on the radar profile.
const RADAR_FULL_DOWNLOAD_MBPS: f64 = 10.0;
/// Upload rate scoring 100 on the radar profile.
const RADAR_FULL_UPLOAD_MBPS: f64 = 5.0;
/// Browse time cost per radar point.
const RADAR_BROWSE_MS_PER_POINT: f64 = 20.0;
const RADAR_FULL_MOS: f64 = 5.0;

/// One map pin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub id: ResultId,
    pub position: GeoPosition,
    pub operator_label: String,
    pub glyph: OperatorGlyph,
    pub color: Option<CategoryColor>,
    pub metrics: Metrics,
    pub radar: RadarProfile,
    pub timestamp: DateTime<Utc>,
}

/// Marker for `record`, or `None` when it carries no position.
pub fn map_marker(record: &ResultRecord, operator_label: &str) -> Option<MapMarker> {
    let position = record.position?;
    Some(MapMarker {
        id: record.id.clone(),
        position,
        operator_label: operator_label.to_owned(),
        glyph: glyph_of(operator_label),
        color: record.color,
        metrics: record.metrics,
        radar: radar_profile(&record.metrics),
        timestamp: record.created_at,
    })
}

pub fn map_markers(records: &[ResultRecord], operator_label: &str) -> Vec<MapMarker> {
    records
        .iter()
        .filter_map(|r| map_marker(r, operator_label))
        .collect()
}

/// Map center follows the most recent marker.
pub fn map_center(markers: &[MapMarker]) -> Option<GeoPosition> {
    markers.last().map(|m| m.position)
}

/// One point of the performance trend series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// `#1`, `#2`, ... in result order.
    pub label: String,
    pub ping: f64,
    pub download: f64,
    pub upload: f64,
    pub mos_scaled: f64,
}

pub fn trend_series(records: &[ResultRecord]) -> Vec<TrendPoint> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| TrendPoint {
            label: format!("#{}", i + 1),
            ping: r.metrics.ping_ms,
            download: r.metrics.download_mbps,
            upload: r.metrics.upload_mbps,
            mos_scaled: r.metrics.video_mos * MOS_TREND_SCALE,
        })
        .collect()
}

/// Per-axis 0..100 scores for a marker's performance radar.
///
/// Higher is better on every axis, so ping and browse time are inverted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadarProfile {
    pub ping: f64,
    pub download: f64,
    pub upload: f64,
    pub browse: f64,
    pub video: f64,
}

pub fn radar_profile(metrics: &Metrics) -> RadarProfile {
    RadarProfile {
        ping: (100.0 - metrics.ping_ms).max(0.0),
        download: (metrics.download_mbps / RADAR_FULL_DOWNLOAD_MBPS * 100.0).min(100.0),
        upload: (metrics.upload_mbps / RADAR_FULL_UPLOAD_MBPS * 100.0).min(100.0),
        browse: (100.0 - metrics.browsing_ms / RADAR_BROWSE_MS_PER_POINT).max(0.0),
        video: metrics.video_mos / RADAR_FULL_MOS * 100.0,
    }
}
