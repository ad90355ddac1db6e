// ── Measurement probes ──
//
// One probe cycle: ping, download, upload, browse, then a derived video
// MOS. Every probe substitutes a synthetic value on failure, so a cycle
// always yields a complete `Metrics` and no error reaches the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use tokio::time::Instant;
use tracing::{debug, warn};

use digiprobe_api::ProbeClient;

use crate::error::CoreError;
use crate::model::Metrics;
use crate::random::{RandomSource, StdRandom};

/// Payload sizes fetched by the download probe, in order.
pub const DOWNLOAD_SIZES: [usize; 3] = [100_000, 500_000, 1_000_000];

/// Upload payload size in bytes.
pub const UPLOAD_BYTES: usize = 50_000;

const MIN_ELAPSED: Duration = Duration::from_millis(1);

// ── Transport seam ───────────────────────────────────────────────

/// The network operations a probe cycle needs.
///
/// Implemented for [`ProbeClient`]; tests substitute scripted transports.
pub trait ProbeTransport: Send + Sync {
    fn ping(&self) -> BoxFuture<'_, Result<(), CoreError>>;

    /// Fetch `bytes` bytes and drain the body.
    fn download(&self, bytes: usize) -> BoxFuture<'_, Result<(), CoreError>>;

    fn upload(&self, payload: Bytes) -> BoxFuture<'_, Result<(), CoreError>>;

    fn browse(&self) -> BoxFuture<'_, Result<(), CoreError>>;
}

impl ProbeTransport for ProbeClient {
    fn ping(&self) -> BoxFuture<'_, Result<(), CoreError>> {
        Box::pin(async move {
            ProbeClient::ping(self)
                .await
                .map_err(|e| CoreError::probe("ping", e))
        })
    }

    fn download(&self, bytes: usize) -> BoxFuture<'_, Result<(), CoreError>> {
        Box::pin(async move {
            let received = ProbeClient::download(self, bytes)
                .await
                .map_err(|e| CoreError::probe("download", e))?;
            if received < bytes {
                debug!(requested = bytes, received, "short download body");
            }
            Ok(())
        })
    }

    fn upload(&self, payload: Bytes) -> BoxFuture<'_, Result<(), CoreError>> {
        Box::pin(async move {
            ProbeClient::upload(self, payload)
                .await
                .map_err(|e| CoreError::probe("upload", e))
        })
    }

    fn browse(&self) -> BoxFuture<'_, Result<(), CoreError>> {
        Box::pin(async move {
            ProbeClient::browse(self)
                .await
                .map_err(|e| CoreError::probe("browse", e))
        })
    }
}

// ── Probe suite ──────────────────────────────────────────────────

/// Runs probe cycles against a transport, drawing jitter and fallbacks
/// from an injectable random source.
pub struct ProbeSuite {
    transport: Arc<dyn ProbeTransport>,
    rng: Box<dyn RandomSource>,
    upload_payload: Bytes,
}

impl ProbeSuite {
    /// Suite with an OS-seeded random source.
    pub fn new(transport: Arc<dyn ProbeTransport>) -> Self {
        Self::with_random(transport, Box::new(StdRandom::from_os()))
    }

    pub fn with_random(transport: Arc<dyn ProbeTransport>, rng: Box<dyn RandomSource>) -> Self {
        Self {
            transport,
            rng,
            upload_payload: Bytes::from(vec![0u8; UPLOAD_BYTES]),
        }
    }

    /// Run one full cycle in the fixed order ping, download, upload,
    /// browse, MOS.
    pub async fn run_cycle(&mut self) -> Metrics {
        let ping_ms = self.measure_ping().await;
        let download_mbps = self.measure_download().await;
        let upload_mbps = self.measure_upload().await;
        let browsing_ms = self.measure_browsing().await;
        let video_mos = self.derive_video_mos(download_mbps, ping_ms);

        let metrics = Metrics {
            ping_ms,
            download_mbps,
            upload_mbps,
            browsing_ms,
            video_mos,
        };
        debug!(?metrics, "probe cycle complete");
        metrics
    }

    /// Round-trip latency in ms: `max(5, elapsed + U[0,20))`, or
    /// `U[50,150)` when the request fails.
    pub async fn measure_ping(&mut self) -> f64 {
        let start = Instant::now();
        match self.transport.ping().await {
            Ok(()) => {
                let elapsed = elapsed_ms(start);
                (elapsed + self.rng.uniform(0.0, 20.0)).max(5.0)
            }
            Err(e) => {
                warn!(error = %e, "ping failed, using synthetic value");
                self.rng.uniform(50.0, 150.0)
            }
        }
    }

    /// Mean throughput over [`DOWNLOAD_SIZES`] in Mbps. A failed size
    /// contributes `U[1,6)` instead of a measured rate.
    pub async fn measure_download(&mut self) -> f64 {
        let mut total = 0.0;
        for size in DOWNLOAD_SIZES {
            let start = Instant::now();
            let speed = match self.transport.download(size).await {
                Ok(()) => mbps(size, start),
                Err(e) => {
                    warn!(error = %e, size, "download failed, using synthetic value");
                    self.rng.uniform(1.0, 6.0)
                }
            };
            total += speed;
        }
        #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
        let count = DOWNLOAD_SIZES.len() as f64;
        total / count
    }

    /// Single upload of [`UPLOAD_BYTES`] in Mbps, or `U[0.5,2.5)` on failure.
    pub async fn measure_upload(&mut self) -> f64 {
        let start = Instant::now();
        match self.transport.upload(self.upload_payload.clone()).await {
            Ok(()) => mbps(UPLOAD_BYTES, start),
            Err(e) => {
                warn!(error = %e, "upload failed, using synthetic value");
                self.rng.uniform(0.5, 2.5)
            }
        }
    }

    /// Page fetch time in ms, or `U[500,1500)` on failure.
    pub async fn measure_browsing(&mut self) -> f64 {
        let start = Instant::now();
        match self.transport.browse().await {
            Ok(()) => elapsed_ms(start),
            Err(e) => {
                warn!(error = %e, "browse failed, using synthetic value");
                self.rng.uniform(500.0, 1500.0)
            }
        }
    }

    /// Synthetic video MOS from download speed and ping, with a small
    /// random jitter, clamped to `[1, 5]`.
    pub fn derive_video_mos(&mut self, download_mbps: f64, ping_ms: f64) -> f64 {
        let jitter = (self.rng.next_unit() - 0.5) * 0.4;
        video_mos(download_mbps, ping_ms, jitter)
    }
}

/// Deterministic part of the MOS model. `jitter` is added before clamping.
pub fn video_mos(download_mbps: f64, ping_ms: f64, jitter: f64) -> f64 {
    let mut mos = if download_mbps > 10.0 {
        4.5
    } else if download_mbps > 5.0 {
        4.0
    } else if download_mbps > 2.0 {
        3.0
    } else if download_mbps > 1.0 {
        2.5
    } else {
        2.0
    };

    if ping_ms < 20.0 {
        mos += 0.3;
    } else if ping_ms > 100.0 {
        mos -= 0.5;
    } else if ping_ms > 50.0 {
        mos -= 0.2;
    }

    (mos + jitter).clamp(1.0, 5.0)
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Rate in Mbps for `bytes` transferred since `start`, with the elapsed
/// time floored to 1 ms.
fn mbps(bytes: usize, start: Instant) -> f64 {
    let secs = start.elapsed().max(MIN_ELAPSED).as_secs_f64();
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    let bits = (bytes * 8) as f64;
    bits / (secs * 1_000_000.0)
}
