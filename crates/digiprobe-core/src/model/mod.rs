// ── Domain model ──

mod metrics;
mod sample;
mod session;

pub use metrics::{CategoryColor, Metrics, QualityCategory};
pub use sample::{GeoPosition, ResultRecord, Sample};
pub use session::{
    NetworkIdentity, ResultId, SessionId, SessionRecord, TestConfiguration, TestMode,
};
