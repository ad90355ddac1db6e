// In-process result store

use chrono::Utc;
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use uuid::Uuid;

use super::{ResultStore, non_empty};
use crate::error::CoreError;
use crate::model::{
    NetworkIdentity, ResultId, ResultRecord, Sample, SessionId, SessionRecord, TestConfiguration,
};

struct StoredSession {
    record: SessionRecord,
    results: Vec<ResultRecord>,
}

/// Keeps sessions and results in memory for the life of the process.
///
/// Used when no remote store is configured, and in tests.
#[derive(Default)]
pub struct MemoryStore {
    sessions: DashMap<SessionId, StoredSession>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions held.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn session(&self, id: &SessionId) -> Option<SessionRecord> {
        self.sessions.get(id).map(|s| s.record.clone())
    }

    fn not_found(id: &SessionId) -> CoreError {
        CoreError::SessionNotFound { id: id.to_string() }
    }
}

impl ResultStore for MemoryStore {
    fn create_session<'a>(
        &'a self,
        config: &'a TestConfiguration,
        identity: &'a NetworkIdentity,
    ) -> BoxFuture<'a, Result<SessionId, CoreError>> {
        Box::pin(async move {
            let id = SessionId::new(Uuid::new_v4().to_string());
            let record = SessionRecord {
                id: id.clone(),
                operator_label: config.operator_label.clone(),
                test_mode: config.test_mode,
                isp_name: non_empty(&identity.isp),
                public_ip: non_empty(&identity.ip),
                activity: non_empty(&config.activity),
                remark: non_empty(&config.remark),
                poi_name: non_empty(&config.poi_name),
                is_active: true,
                created_at: Utc::now(),
            };
            self.sessions.insert(
                id.clone(),
                StoredSession {
                    record,
                    results: Vec::new(),
                },
            );
            Ok(id)
        })
    }

    fn append_result<'a>(
        &'a self,
        session: &'a SessionId,
        sample: &'a Sample,
    ) -> BoxFuture<'a, Result<ResultRecord, CoreError>> {
        Box::pin(async move {
            let mut entry = self
                .sessions
                .get_mut(session)
                .ok_or_else(|| Self::not_found(session))?;
            let record = ResultRecord {
                id: ResultId::new(Uuid::new_v4().to_string()),
                session_id: session.clone(),
                metrics: sample.metrics,
                color: Some(sample.color),
                position: sample.position,
                created_at: Utc::now(),
            };
            entry.results.push(record.clone());
            Ok(record)
        })
    }

    fn close_session<'a>(&'a self, session: &'a SessionId) -> BoxFuture<'a, Result<(), CoreError>> {
        Box::pin(async move {
            let mut entry = self
                .sessions
                .get_mut(session)
                .ok_or_else(|| Self::not_found(session))?;
            entry.record.is_active = false;
            Ok(())
        })
    }

    fn list_results<'a>(
        &'a self,
        session: &'a SessionId,
    ) -> BoxFuture<'a, Result<Vec<ResultRecord>, CoreError>> {
        Box::pin(async move {
            self.sessions
                .get(session)
                .map(|s| s.results.clone())
                .ok_or_else(|| Self::not_found(session))
        })
    }

    fn list_sessions(&self, limit: usize) -> BoxFuture<'_, Result<Vec<SessionRecord>, CoreError>> {
        Box::pin(async move {
            let mut sessions: Vec<SessionRecord> =
                self.sessions.iter().map(|s| s.record.clone()).collect();
            sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            sessions.truncate(limit);
            Ok(sessions)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{CategoryColor, GeoPosition, Metrics, TestMode};

    fn sample(run: u32) -> Sample {
        Sample {
            run,
            metrics: Metrics {
                ping_ms: 18.0,
                download_mbps: 7.5,
                upload_mbps: 2.1,
                browsing_ms: 640.0,
                video_mos: 4.3,
            },
            color: CategoryColor::Blue,
            position: Some(GeoPosition::new(-6.2, 106.8)),
            recorded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let store = MemoryStore::new();
        let config = TestConfiguration::new("Telkomsel", TestMode::Static).with_poi("Monas");
        let identity = NetworkIdentity {
            ip: "203.0.113.9".into(),
            isp: "PT Telkomunikasi Selular".into(),
            ..NetworkIdentity::default()
        };

        let id = store.create_session(&config, &identity).await.unwrap();
        let created = store.session(&id).unwrap();
        assert!(created.is_active);
        assert_eq!(created.poi_name.as_deref(), Some("Monas"));
        assert_eq!(created.activity, None);

        store.append_result(&id, &sample(1)).await.unwrap();
        store.append_result(&id, &sample(2)).await.unwrap();
        let results = store.list_results(&id).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].color, Some(CategoryColor::Blue));

        store.close_session(&id).await.unwrap();
        assert!(!store.session(&id).unwrap().is_active);
    }

    #[tokio::test]
    async fn unknown_session_is_reported() {
        let store = MemoryStore::new();
        let missing = SessionId::new("nope");
        assert!(matches!(
            store.append_result(&missing, &sample(1)).await,
            Err(CoreError::SessionNotFound { .. })
        ));
        assert!(store.close_session(&missing).await.is_err());
    }

    #[tokio::test]
    async fn list_sessions_respects_limit() {
        let store = MemoryStore::new();
        let config = TestConfiguration::new("XL", TestMode::Drive);
        for _ in 0..3 {
            store
                .create_session(&config, &NetworkIdentity::default())
                .await
                .unwrap();
        }
        assert_eq!(store.list_sessions(2).await.unwrap().len(), 2);
        assert_eq!(store.session_count(), 3);
    }
}
