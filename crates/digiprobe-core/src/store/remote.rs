// Result store backed by the remote REST store

use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use digiprobe_api::{NewResult, NewSession, RecordsClient, ResultRow, SessionRow};

use super::{ResultStore, non_empty};
use crate::error::CoreError;
use crate::model::{
    CategoryColor, GeoPosition, Metrics, NetworkIdentity, ResultId, ResultRecord, Sample,
    SessionId, SessionRecord, TestConfiguration, TestMode,
};

/// Persists through [`RecordsClient`].
pub struct RemoteStore {
    client: RecordsClient,
    user_id: Option<String>,
}

impl RemoteStore {
    pub fn new(client: RecordsClient) -> Self {
        Self {
            client,
            user_id: None,
        }
    }

    /// Attribute new sessions to `user_id`.
    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn client(&self) -> &RecordsClient {
        &self.client
    }
}

impl ResultStore for RemoteStore {
    fn create_session<'a>(
        &'a self,
        config: &'a TestConfiguration,
        identity: &'a NetworkIdentity,
    ) -> BoxFuture<'a, Result<SessionId, CoreError>> {
        Box::pin(async move {
            let payload = NewSession {
                user_id: self.user_id.clone(),
                isp_name: non_empty(&identity.isp),
                public_ip: non_empty(&identity.ip),
                operator_label: config.operator_label.clone(),
                test_mode: config.test_mode.to_string(),
                activity: non_empty(&config.activity),
                remark: non_empty(&config.remark),
                poi_name: non_empty(&config.poi_name),
            };
            let row = self.client.create_session(&payload).await?;
            debug!(session = %row.id, "session created");
            Ok(SessionId::new(row.id))
        })
    }

    fn append_result<'a>(
        &'a self,
        session: &'a SessionId,
        sample: &'a Sample,
    ) -> BoxFuture<'a, Result<ResultRecord, CoreError>> {
        Box::pin(async move {
            let payload = new_result(session, sample);
            let row = self.client.append_result(&payload).await?;
            Ok(result_record(row))
        })
    }

    fn close_session<'a>(&'a self, session: &'a SessionId) -> BoxFuture<'a, Result<(), CoreError>> {
        Box::pin(async move {
            self.client.close_session(session.as_str()).await?;
            Ok(())
        })
    }

    fn list_results<'a>(
        &'a self,
        session: &'a SessionId,
    ) -> BoxFuture<'a, Result<Vec<ResultRecord>, CoreError>> {
        Box::pin(async move {
            let rows = self.client.list_results(session.as_str()).await?;
            Ok(rows.into_iter().map(result_record).collect())
        })
    }

    fn list_sessions(&self, limit: usize) -> BoxFuture<'_, Result<Vec<SessionRecord>, CoreError>> {
        Box::pin(async move {
            let limit = u32::try_from(limit).unwrap_or(u32::MAX);
            let rows = self.client.list_sessions(limit).await?;
            Ok(rows.into_iter().map(session_record).collect())
        })
    }
}

// ── Row conversion ───────────────────────────────────────────────

fn new_result(session: &SessionId, sample: &Sample) -> NewResult {
    let m = &sample.metrics;
    NewResult {
        session_id: session.to_string(),
        lat: sample.position.map(|p| p.latitude),
        lng: sample.position.map(|p| p.longitude),
        ping: m.ping_ms,
        download_speed: m.download_mbps,
        upload_speed: m.upload_mbps,
        browsing_time: m.browsing_ms,
        video_mos: m.video_mos,
        category_color: sample.color.to_string(),
    }
}

/// Null metric columns read back as zero; an unknown color as absent.
fn result_record(row: ResultRow) -> ResultRecord {
    let color = match row.category_color.as_deref() {
        Some(raw) => {
            let parsed = raw.parse::<CategoryColor>().ok();
            if parsed.is_none() {
                warn!(color = raw, result = %row.id, "unknown category color");
            }
            parsed
        }
        None => None,
    };
    let position = match (row.lat, row.lng) {
        (Some(latitude), Some(longitude)) => Some(GeoPosition::new(latitude, longitude)),
        _ => None,
    };

    ResultRecord {
        id: ResultId::new(row.id),
        session_id: SessionId::new(row.session_id),
        metrics: Metrics {
            ping_ms: row.ping.unwrap_or_default(),
            download_mbps: row.download_speed.unwrap_or_default(),
            upload_mbps: row.upload_speed.unwrap_or_default(),
            browsing_ms: row.browsing_time.unwrap_or_default(),
            video_mos: row.video_mos.unwrap_or_default(),
        },
        color,
        position,
        created_at: row.created_at,
    }
}

fn session_record(row: SessionRow) -> SessionRecord {
    let test_mode = row.test_mode.parse::<TestMode>().unwrap_or_else(|_| {
        warn!(mode = %row.test_mode, session = %row.id, "unknown test mode");
        TestMode::default()
    });

    SessionRecord {
        id: SessionId::new(row.id),
        operator_label: row.operator_label,
        test_mode,
        isp_name: row.isp_name,
        public_ip: row.public_ip,
        activity: row.activity,
        remark: row.remark,
        poi_name: row.poi_name,
        is_active: row.is_active,
        created_at: row.created_at,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;

    fn row() -> ResultRow {
        ResultRow {
            id: "r-1".into(),
            session_id: "s-1".into(),
            lat: Some(-7.8),
            lng: None,
            ping: Some(42.0),
            download_speed: None,
            upload_speed: Some(1.2),
            browsing_time: Some(800.0),
            video_mos: Some(3.1),
            category_color: Some("yellow".into()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn partial_coordinates_have_no_position() {
        let record = result_record(row());
        assert_eq!(record.position, None);
        assert!(record.metrics.download_mbps.abs() < f64::EPSILON);
        assert_eq!(record.color, Some(CategoryColor::Yellow));
    }

    #[test]
    fn unknown_color_is_dropped() {
        let mut raw = row();
        raw.category_color = Some("purple".into());
        assert_eq!(result_record(raw).color, None);
    }

    #[test]
    fn sample_maps_to_insert_payload() {
        let sample = Sample {
            run: 1,
            metrics: Metrics {
                ping_ms: 12.0,
                download_mbps: 9.0,
                upload_mbps: 3.0,
                browsing_ms: 410.0,
                video_mos: 4.4,
            },
            color: CategoryColor::Blue,
            position: Some(GeoPosition::new(1.5, 2.5)),
            recorded_at: Utc::now(),
        };
        let payload = new_result(&SessionId::new("s-9"), &sample);
        assert_eq!(payload.session_id, "s-9");
        assert_eq!(payload.lat, Some(1.5));
        assert_eq!(payload.lng, Some(2.5));
        assert_eq!(payload.category_color, "blue");
    }
}
