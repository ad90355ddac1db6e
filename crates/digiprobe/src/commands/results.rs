//! Session and result listings from the result store.

use std::cell::Cell;

use chrono::{DateTime, Local, Utc};
use tabled::Tabled;

use digiprobe_core::report::{self, MapMarker, RadarProfile, TrendPoint};
use digiprobe_core::{
    GeoPosition, ResultRecord, RuntimeConfig, SessionId, SessionRecord, classify, format_mos,
    format_ping, format_speed,
};

use crate::cli::{GlobalOpts, ResultsArgs, ResultsView};
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct ResultRow {
    #[tabled(rename = "#")]
    run: usize,
    #[tabled(rename = "Ping")]
    ping: String,
    #[tabled(rename = "Download")]
    download: String,
    #[tabled(rename = "Upload")]
    upload: String,
    #[tabled(rename = "Browse")]
    browse: String,
    #[tabled(rename = "MOS")]
    mos: String,
    #[tabled(rename = "Quality")]
    quality: String,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Time")]
    time: String,
}

impl ResultRow {
    pub fn new(run: usize, r: &ResultRecord) -> Self {
        Self {
            run,
            ping: format_ping(r.metrics.ping_ms),
            download: format_speed(r.metrics.download_mbps),
            upload: format_speed(r.metrics.upload_mbps),
            browse: format_ping(r.metrics.browsing_ms),
            mos: format_mos(r.metrics.video_mos),
            quality: classify(&r.metrics).to_string(),
            position: r.position.as_ref().map_or_else(|| "-".into(), format_position),
            time: local_time(r.created_at),
        }
    }
}

#[derive(Tabled)]
struct MarkerRow {
    #[tabled(rename = "Glyph")]
    glyph: char,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Color")]
    color: String,
    #[tabled(rename = "Download")]
    download: String,
    #[tabled(rename = "Radar P/D/U/B/V")]
    radar: String,
    #[tabled(rename = "Time")]
    time: String,
}

impl From<&MapMarker> for MarkerRow {
    fn from(m: &MapMarker) -> Self {
        Self {
            glyph: m.glyph.letter,
            position: format_position(&m.position),
            color: m
                .color
                .map_or_else(|| "-".into(), |c| format!("{c} ({})", c.hex())),
            download: format_speed(m.metrics.download_mbps),
            radar: format_radar(&m.radar),
            time: local_time(m.timestamp),
        }
    }
}

#[derive(Tabled)]
struct TrendRow {
    #[tabled(rename = "Run")]
    label: String,
    #[tabled(rename = "Ping (ms)")]
    ping: String,
    #[tabled(rename = "Down (Mbps)")]
    download: String,
    #[tabled(rename = "Up (Mbps)")]
    upload: String,
    #[tabled(rename = "MOS x20")]
    mos: String,
}

impl From<&TrendPoint> for TrendRow {
    fn from(p: &TrendPoint) -> Self {
        Self {
            label: p.label.clone(),
            ping: format!("{:.0}", p.ping),
            download: format!("{:.2}", p.download),
            upload: format!("{:.2}", p.upload),
            mos: format!("{:.0}", p.mos_scaled),
        }
    }
}

#[derive(Tabled)]
struct SessionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Operator")]
    operator: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "POI")]
    poi: String,
    #[tabled(rename = "ISP")]
    isp: String,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&SessionRecord> for SessionRow {
    fn from(s: &SessionRecord) -> Self {
        Self {
            id: s.id.to_string(),
            operator: s.operator_label.clone(),
            mode: s.test_mode.to_string(),
            poi: s.poi_name.clone().unwrap_or_default(),
            isp: s.isp_name.clone().unwrap_or_default(),
            active: if s.is_active { "yes" } else { "no" }.into(),
            created: local_time(s.created_at),
        }
    }
}

fn format_position(p: &GeoPosition) -> String {
    format!("{:.5}, {:.5}", p.latitude, p.longitude)
}

fn format_radar(r: &RadarProfile) -> String {
    format!(
        "{:.0}/{:.0}/{:.0}/{:.0}/{:.0}",
        r.ping, r.download, r.upload, r.browse, r.video
    )
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Render results as a numbered list.
pub fn render_results(records: &[ResultRecord], global: &GlobalOpts) -> Result<String, CliError> {
    let counter = Cell::new(0);
    output::render_list(
        &global.output,
        records,
        |r| {
            counter.set(counter.get() + 1);
            ResultRow::new(counter.get(), r)
        },
        |r| r.id.to_string(),
    )
}

fn require_remote(runtime: &RuntimeConfig) -> Result<(), CliError> {
    if runtime.store.is_none() {
        return Err(CliError::Validation {
            field: "store_url".into(),
            reason: "listing needs a remote result store; set store_url in your profile \
                     or pass --store-url"
                .into(),
        });
    }
    Ok(())
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle_results(
    runtime: &RuntimeConfig,
    args: ResultsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    require_remote(runtime)?;
    let store = runtime.result_store()?;
    let records = store.list_results(&SessionId::new(args.session)).await?;

    let out = match args.view {
        ResultsView::List => render_results(&records, global)?,
        ResultsView::Markers => {
            let markers = report::map_markers(&records, &args.operator);
            output::render_list(&global.output, &markers, |m| MarkerRow::from(m), |m| {
                m.id.to_string()
            })?
        }
        ResultsView::Trend => {
            let series = report::trend_series(&records);
            output::render_list(&global.output, &series, |p| TrendRow::from(p), |p| {
                p.label.clone()
            })?
        }
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle_sessions(
    runtime: &RuntimeConfig,
    limit: usize,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    require_remote(runtime)?;
    let store = runtime.result_store()?;
    let sessions = store.list_sessions(limit).await?;
    let out = output::render_list(&global.output, &sessions, |s| SessionRow::from(s), |s| {
        s.id.to_string()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use digiprobe_core::{CategoryColor, Metrics, ResultId};

    fn record(position: Option<GeoPosition>) -> ResultRecord {
        ResultRecord {
            id: ResultId::new("r-1"),
            session_id: SessionId::new("s-1"),
            metrics: Metrics {
                ping_ms: 12.4,
                download_mbps: 0.75,
                upload_mbps: 1.5,
                browsing_ms: 640.0,
                video_mos: 2.31,
            },
            color: Some(CategoryColor::Red),
            position,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 0).single().unwrap_or_default(),
        }
    }

    #[test]
    fn result_row_formats_metrics() {
        let row = ResultRow::new(3, &record(Some(GeoPosition::new(-7.78282, 110.36708))));
        assert_eq!(row.run, 3);
        assert_eq!(row.ping, "12 ms");
        assert_eq!(row.download, "750 Kbps");
        assert_eq!(row.upload, "1.50 Mbps");
        assert_eq!(row.mos, "2.3");
        assert_eq!(row.quality, "poor");
        assert_eq!(row.position, "-7.78282, 110.36708");
    }

    #[test]
    fn marker_row_shows_radar_scores() {
        let markers = report::map_markers(
            &[record(Some(GeoPosition::new(-7.78282, 110.36708)))],
            "Telkomsel",
        );
        let row = MarkerRow::from(&markers[0]);
        assert_eq!(row.glyph, 'T');
        // Download sits on a rounding tie, so only the other axes are pinned.
        assert!(row.radar.starts_with("88/"), "{}", row.radar);
        assert!(row.radar.ends_with("/30/68/46"), "{}", row.radar);
    }

    #[test]
    fn result_row_without_position() {
        assert_eq!(ResultRow::new(1, &record(None)).position, "-");
    }
}
