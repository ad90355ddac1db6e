// Store row shapes
//
// Column names follow the store's snake_case schema verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Insert payload for `test_sessions`.
#[derive(Debug, Clone, Serialize)]
pub struct NewSession {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub isp_name: Option<String>,
    pub public_ip: Option<String>,
    pub operator_label: String,
    /// `"static"` or `"drive"`.
    pub test_mode: String,
    pub activity: Option<String>,
    pub remark: Option<String>,
    pub poi_name: Option<String>,
}

/// A `test_sessions` row as returned by the store.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionRow {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub isp_name: Option<String>,
    #[serde(default)]
    pub public_ip: Option<String>,
    pub operator_label: String,
    pub test_mode: String,
    #[serde(default)]
    pub activity: Option<String>,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub poi_name: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert payload for `test_results`.
#[derive(Debug, Clone, Serialize)]
pub struct NewResult {
    pub session_id: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub ping: f64,
    pub download_speed: f64,
    pub upload_speed: f64,
    pub browsing_time: f64,
    pub video_mos: f64,
    /// `"blue"`, `"green"`, `"yellow"` or `"red"`.
    pub category_color: String,
}

/// A `test_results` row as returned by the store.
///
/// Metric columns are nullable in the schema, hence the options.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResultRow {
    pub id: String,
    pub session_id: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub ping: Option<f64>,
    #[serde(default)]
    pub download_speed: Option<f64>,
    #[serde(default)]
    pub upload_speed: Option<f64>,
    #[serde(default)]
    pub browsing_time: Option<f64>,
    #[serde(default)]
    pub video_mos: Option<f64>,
    #[serde(default)]
    pub category_color: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Error body returned by the store on failed requests.
#[derive(Debug, Deserialize)]
pub(crate) struct StoreErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}
