//! Measurement orchestration and quality classification for DigiProbe.
//!
//! This crate owns the domain logic between `digiprobe-api` and the
//! command-line front end:
//!
//! - **[`Orchestrator`]**: finite-state sequencing of a test run
//!   (`Ready → Recording → Stopping → Saved`). Static sequences run five
//!   probe cycles at one spot; drive sequences loop until
//!   [`stop()`](Orchestrator::stop). State is observable through
//!   [`subscribe()`](Orchestrator::subscribe).
//!
//! - **[`ProbeSuite`]**: ping, download, upload, browse and a derived video
//!   MOS. Failed probes fall back to synthetic values drawn from an
//!   injectable [`RandomSource`].
//!
//! - **Quality classifier** ([`classify`], [`color_of`], [`glyph_of`]):
//!   pure rules mapping metrics to a category, color and marker glyph.
//!
//! - **[`SampleSink`]**: the ordered hand-off of samples and the completion
//!   signal. [`SessionRecorder`] persists them to a [`ResultStore`];
//!   [`ChannelSink`] turns them into a [`RunEvent`] channel.
//!
//! - **[`NetworkInfo`]**: public IP / ISP lookup with provider fallback.

pub mod config;
pub mod error;
pub mod geo;
pub mod identity;
pub mod model;
pub mod orchestrator;
pub mod probes;
pub mod quality;
pub mod random;
pub mod report;
pub mod sink;
pub mod store;
pub mod wake;

// ── Primary re-exports ──────────────────────────────────────────
pub use config::{ProbeEndpoints, RuntimeConfig, StoreConfig, TlsVerification};
pub use error::CoreError;
pub use geo::{FixedGeolocator, Geolocator, NoGeolocation};
pub use identity::{IdentityProvider, IdentityState, NetworkInfo};
pub use orchestrator::{Orchestrator, RunState, RunStatus, STATIC_RUN_COUNT};
pub use probes::{ProbeSuite, ProbeTransport};
pub use quality::{OperatorGlyph, classify, color_of, format_mos, format_ping, format_speed, glyph_of};
pub use random::{RandomSource, SequenceRandom, StdRandom};
pub use report::{MapMarker, RadarProfile, TrendPoint, radar_profile};
pub use sink::{ChannelSink, RunEvent, RunSummary, SampleSink};
pub use store::{MemoryStore, Notice, RemoteStore, ResultStore, SessionRecorder};
pub use wake::{NoWakeLock, WakeHold, WakeLock};

// ── Model re-exports ────────────────────────────────────────────
pub use model::{
    CategoryColor, GeoPosition, Metrics, NetworkIdentity, QualityCategory, ResultId, ResultRecord,
    Sample, SessionId, SessionRecord, TestConfiguration, TestMode,
};
