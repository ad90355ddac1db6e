//! `digiprobe run`: one measurement sequence recorded as a session.
//!
//! The terminal plays the presentation layer: a spinner follows the
//! orchestrator state, each saved result is printed as it lands, and Ctrl-C
//! stops the sequence the same way a stop button would.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use digiprobe_core::{
    FixedGeolocator, GeoPosition, Geolocator, IdentityState, NetworkIdentity, NoGeolocation,
    NoWakeLock, Notice, Orchestrator, ResultRecord, RunState, RunStatus, RuntimeConfig,
    STATIC_RUN_COUNT, SampleSink, SessionRecorder, TestConfiguration, TestMode, classify,
    format_mos, format_ping, format_speed,
};

use crate::cli::{GlobalOpts, ModeArg, RunArgs};
use crate::error::CliError;
use crate::output;

use super::results;

fn test_configuration(args: &RunArgs) -> TestConfiguration {
    let mode = match args.mode {
        ModeArg::Static => TestMode::Static,
        ModeArg::Drive => TestMode::Drive,
    };
    TestConfiguration::new(args.operator.clone(), mode)
        .with_activity(args.activity.clone())
        .with_remark(args.remark.clone())
        .with_poi(args.poi.clone().unwrap_or_default())
}

/// Parse `"LAT,LNG"` into a position.
fn parse_position(raw: &str) -> Result<GeoPosition, CliError> {
    let invalid = |reason: &str| CliError::Validation {
        field: "position".into(),
        reason: format!("{reason} (got '{raw}', expected LAT,LNG)"),
    };

    let (lat, lng) = raw.split_once(',').ok_or_else(|| invalid("missing comma"))?;
    let latitude: f64 = lat.trim().parse().map_err(|_| invalid("latitude is not a number"))?;
    let longitude: f64 = lng.trim().parse().map_err(|_| invalid("longitude is not a number"))?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(invalid("coordinates out of range"));
    }
    Ok(GeoPosition::new(latitude, longitude))
}

/// Resolve the network identity; a failed lookup is not fatal for a run.
async fn lookup_identity(runtime: &RuntimeConfig) -> Result<NetworkIdentity, CliError> {
    let info = runtime.network_info()?;
    match info.refetch().await {
        IdentityState::Ready(identity) => Ok(identity),
        IdentityState::Failed { message } => {
            warn!(%message, "recording session without network identity");
            Ok(NetworkIdentity::default())
        }
        IdentityState::Loading => Ok(NetworkIdentity::default()),
    }
}

fn spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Static sequences show progress against their fixed run count.
fn status_message(state: &RunState, mode: TestMode) -> String {
    match (state.status, mode) {
        (RunStatus::Recording, TestMode::Static) if state.loop_count > 0 => {
            format!("Recording {}/{STATIC_RUN_COUNT}", state.loop_count)
        }
        (RunStatus::Recording, TestMode::Drive) if state.loop_count > 0 => {
            format!("Recording #{}", state.loop_count)
        }
        (RunStatus::Recording, _) => "Recording".into(),
        (RunStatus::Stopping, _) => "Stopping".into(),
        (RunStatus::Saved, _) => "Saved".into(),
        (RunStatus::Ready, _) => "Ready".into(),
    }
}

fn sample_line(record: &ResultRecord, run: u32, colored: bool) -> String {
    let category = classify(&record.metrics);
    format!(
        "#{run:<3} ping {:>7}  down {:>11}  up {:>11}  browse {:>8}  mos {}  {}",
        format_ping(record.metrics.ping_ms),
        format_speed(record.metrics.download_mbps),
        format_speed(record.metrics.upload_mbps),
        format_ping(record.metrics.browsing_ms),
        format_mos(record.metrics.video_mos),
        output::paint(&category.to_string(), record.color, colored),
    )
}

fn report_notice(notice: &Notice, recorder: &SessionRecorder, bar: &ProgressBar, colored: bool) {
    let line = match notice {
        Notice::ResultSaved { run, result } => recorder
            .results()
            .iter()
            .find(|r| &r.id == result)
            .map(|r| sample_line(r, *run, colored)),
        Notice::SaveFailed { run, message } => Some(format!("#{run:<3} not saved: {message}")),
        Notice::SessionClosed { session, runs } => {
            Some(format!("Session {session} closed after {runs} run(s)"))
        }
        Notice::CloseFailed { session, message } => {
            Some(format!("Session {session} could not be closed: {message}"))
        }
    };
    if let Some(line) = line {
        bar.suspend(|| eprintln!("{line}"));
    }
}

pub async fn handle(
    runtime: &RuntimeConfig,
    args: RunArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let config = Arc::new(test_configuration(&args));
    config.validate()?;

    let geolocator: Arc<dyn Geolocator> = match args.position.as_deref() {
        Some(raw) => Arc::new(FixedGeolocator(parse_position(raw)?)),
        None => Arc::new(NoGeolocation),
    };

    let identity = if args.offline {
        NetworkIdentity::default()
    } else {
        lookup_identity(runtime).await?
    };

    let recorder = Arc::new(SessionRecorder::open(runtime.result_store()?, &config, &identity).await?);
    let orchestrator =
        Orchestrator::with_environment(runtime.probe_suite()?, geolocator, Arc::new(NoWakeLock));

    let mut notices = recorder.subscribe();
    let mut state_rx = orchestrator.subscribe();
    let sink: Arc<dyn SampleSink> = Arc::clone(&recorder) as Arc<dyn SampleSink>;
    if !orchestrator.start(Arc::clone(&config), sink).await? {
        return Err(CliError::OperationFailed {
            message: "a sequence is already running".into(),
        });
    }

    let colored = output::should_color(&global.color);
    let bar = spinner(global.quiet);
    if config.test_mode == TestMode::Drive {
        bar.suspend(|| eprintln!("Drive test running. Press Ctrl-C to stop."));
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            biased;

            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                bar.set_message("Stopping after the current run");
                orchestrator.stop().await;
            }

            notice = notices.recv() => match notice {
                Ok(notice) => report_notice(&notice, &recorder, &bar, colored),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "missed run notices"),
                Err(RecvError::Closed) => break,
            },

            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                bar.set_message(status_message(&state, config.test_mode));
                if !state.is_running && state.status == RunStatus::Saved {
                    break;
                }
            }
        }
    }

    // Completion is published before the sequence reports not-running.
    while let Ok(notice) = notices.try_recv() {
        report_notice(&notice, &recorder, &bar, colored);
    }
    bar.finish_and_clear();
    orchestrator.shutdown().await;

    let out = results::render_results(&recorder.results(), global)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_position() {
        let p = parse_position("-7.7828, 110.3671");
        assert!(matches!(p, Ok(ref p) if (p.latitude + 7.7828).abs() < 1e-9));
    }

    #[test]
    fn rejects_bad_positions() {
        for raw in ["", "-7.78", "abc,110", "-7.78,xyz", "95,10", "10,200"] {
            assert!(
                matches!(parse_position(raw), Err(CliError::Validation { .. })),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn static_run_takes_poi() {
        let args = RunArgs {
            operator: "Telkomsel".into(),
            mode: ModeArg::Static,
            poi: Some("Tugu Jogja".into()),
            activity: "streaming".into(),
            remark: String::new(),
            position: None,
            offline: true,
        };
        let config = test_configuration(&args);
        assert_eq!(config.test_mode, TestMode::Static);
        assert_eq!(config.poi_name, "Tugu Jogja");
        assert!(config.validate().is_ok());

        let missing_poi = RunArgs { poi: None, ..args };
        assert!(test_configuration(&missing_poi).validate().is_err());
    }

    #[test]
    fn status_message_follows_mode() {
        let state = RunState {
            status: RunStatus::Recording,
            loop_count: 3,
            current_metrics: None,
            is_running: true,
        };
        assert_eq!(status_message(&state, TestMode::Static), "Recording 3/5");
        assert_eq!(status_message(&state, TestMode::Drive), "Recording #3");

        let starting = RunState {
            loop_count: 0,
            ..state
        };
        assert_eq!(status_message(&starting, TestMode::Static), "Recording");
    }
}
