// ── Test configuration and session identity ──

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CoreError;

/// Measurement sequencing mode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TestMode {
    /// Fixed number of runs at one location.
    #[default]
    Static,
    /// Unbounded runs while moving, until stopped.
    Drive,
}

/// Operator and activity metadata for one run sequence.
///
/// Validated once before the sequence starts and shared immutably
/// (behind an `Arc`) for its whole duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestConfiguration {
    pub operator_label: String,
    pub test_mode: TestMode,
    #[serde(default)]
    pub activity: String,
    #[serde(default)]
    pub remark: String,
    /// Point of interest. Required for static tests.
    #[serde(default)]
    pub poi_name: String,
}

impl TestConfiguration {
    pub fn new(operator_label: impl Into<String>, test_mode: TestMode) -> Self {
        Self {
            operator_label: operator_label.into(),
            test_mode,
            activity: String::new(),
            remark: String::new(),
            poi_name: String::new(),
        }
    }

    pub fn with_activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = activity.into();
        self
    }

    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }

    pub fn with_poi(mut self, poi_name: impl Into<String>) -> Self {
        self.poi_name = poi_name.into();
        self
    }

    /// Check the operator label is present and that static tests name a POI.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.operator_label.trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "operator label must not be empty".into(),
            });
        }
        if self.test_mode == TestMode::Static && self.poi_name.trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "static tests require a point-of-interest name".into(),
            });
        }
        Ok(())
    }
}

/// Store-assigned session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store-assigned result identifier, used to correlate map markers and
/// list rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultId(String);

impl ResultId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public address and ISP as reported by an identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkIdentity {
    pub ip: String,
    pub isp: String,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
}

/// A persisted session row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub operator_label: String,
    pub test_mode: TestMode,
    pub isp_name: Option<String>,
    pub public_ip: Option<String>,
    pub activity: Option<String>,
    pub remark: Option<String>,
    pub poi_name: Option<String>,
    /// Cleared when the sequence that owns the session ends.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
