// Bridges orchestrator output to a result store

use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::BoxFuture;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::ResultStore;
use crate::error::CoreError;
use crate::model::{
    CategoryColor, NetworkIdentity, ResultId, ResultRecord, Sample, SessionId, TestConfiguration,
};
use crate::report::{self, MapMarker, TrendPoint};
use crate::sink::{RunSummary, SampleSink};

const NOTICE_CHANNEL_SIZE: usize = 64;

/// User-facing persistence outcome. None of these stop the sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice {
    ResultSaved { run: u32, result: ResultId },
    SaveFailed { run: u32, message: String },
    SessionClosed { session: SessionId, runs: u32 },
    CloseFailed { session: SessionId, message: String },
}

/// A [`SampleSink`] persisting every sample under one session.
///
/// Persisted results are kept for map markers and the trend series.
pub struct SessionRecorder {
    store: Arc<dyn ResultStore>,
    session: SessionId,
    operator_label: String,
    results: Mutex<Vec<ResultRecord>>,
    notices: broadcast::Sender<Notice>,
}

impl SessionRecorder {
    /// Create a session in `store` and a recorder for it.
    pub async fn open(
        store: Arc<dyn ResultStore>,
        config: &TestConfiguration,
        identity: &NetworkIdentity,
    ) -> Result<Self, CoreError> {
        let session = store.create_session(config, identity).await?;
        info!(session = %session, "test session opened");
        Ok(Self::new(store, session, config.operator_label.clone()))
    }

    /// Recorder for an existing session.
    pub fn new(
        store: Arc<dyn ResultStore>,
        session: SessionId,
        operator_label: impl Into<String>,
    ) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_SIZE);
        Self {
            store,
            session,
            operator_label: operator_label.into(),
            results: Mutex::new(Vec::new()),
            notices,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Results saved so far, in run order.
    pub fn results(&self) -> Vec<ResultRecord> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Color of the most recently saved result.
    pub fn current_color(&self) -> Option<CategoryColor> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .and_then(|r| r.color)
    }

    pub fn markers(&self) -> Vec<MapMarker> {
        report::map_markers(&self.results(), &self.operator_label)
    }

    pub fn trend(&self) -> Vec<TrendPoint> {
        report::trend_series(&self.results())
    }

    fn publish(&self, notice: Notice) {
        if self.notices.send(notice).is_err() {
            debug!("no notice subscribers");
        }
    }
}

impl SampleSink for SessionRecorder {
    fn on_sample(&self, sample: Sample) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            match self.store.append_result(&self.session, &sample).await {
                Ok(record) => {
                    let result = record.id.clone();
                    self.results
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(record);
                    debug!(run = sample.run, result = %result, "result saved");
                    self.publish(Notice::ResultSaved {
                        run: sample.run,
                        result,
                    });
                }
                Err(e) => {
                    warn!(run = sample.run, error = %e, "failed to save test result");
                    self.publish(Notice::SaveFailed {
                        run: sample.run,
                        message: e.to_string(),
                    });
                }
            }
        })
    }

    fn on_complete(&self, summary: RunSummary) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            match self.store.close_session(&self.session).await {
                Ok(()) => {
                    info!(session = %self.session, runs = summary.runs, "test completed and saved");
                    self.publish(Notice::SessionClosed {
                        session: self.session.clone(),
                        runs: summary.runs,
                    });
                }
                Err(e) => {
                    warn!(session = %self.session, error = %e, "failed to close session");
                    self.publish(Notice::CloseFailed {
                        session: self.session.clone(),
                        message: e.to_string(),
                    });
                }
            }
        })
    }
}
