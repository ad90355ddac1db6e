// ── Geolocation ──

use std::time::Duration;

use futures_util::future::BoxFuture;
use tracing::debug;

use crate::model::GeoPosition;

/// How long a single position request may take.
pub const GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Single-shot position source. Implementations must not serve a cached
/// fix; `None` means unavailable or denied.
pub trait Geolocator: Send + Sync {
    fn current_position(&self) -> BoxFuture<'_, Option<GeoPosition>>;
}

/// Request a position, giving up after [`GEOLOCATION_TIMEOUT`].
pub async fn locate(geolocator: &dyn Geolocator) -> Option<GeoPosition> {
    if let Ok(position) = tokio::time::timeout(GEOLOCATION_TIMEOUT, geolocator.current_position()).await {
        position
    } else {
        debug!("geolocation timed out");
        None
    }
}

/// No positioning hardware: every request yields `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

impl Geolocator for NoGeolocation {
    fn current_position(&self) -> BoxFuture<'_, Option<GeoPosition>> {
        Box::pin(async { None })
    }
}

/// Reports the same position every time, e.g. coordinates given on the
/// command line for a static test.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator(pub GeoPosition);

impl Geolocator for FixedGeolocator {
    fn current_position(&self) -> BoxFuture<'_, Option<GeoPosition>> {
        let position = self.0;
        Box::pin(async move { Some(position) })
    }
}
