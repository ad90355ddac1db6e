// ── Session/result store ──
//
// Persistence contract for test sessions and their per-run results, with
// an in-process implementation and one backed by the remote REST store.

mod memory;
mod recorder;
mod remote;

pub use memory::MemoryStore;
pub use recorder::{Notice, SessionRecorder};
pub use remote::RemoteStore;

use futures_util::future::BoxFuture;

use crate::error::CoreError;
use crate::model::{
    NetworkIdentity, ResultRecord, Sample, SessionId, SessionRecord, TestConfiguration,
};

/// Where sessions and results are persisted.
pub trait ResultStore: Send + Sync {
    /// Open a session for one run sequence.
    fn create_session<'a>(
        &'a self,
        config: &'a TestConfiguration,
        identity: &'a NetworkIdentity,
    ) -> BoxFuture<'a, Result<SessionId, CoreError>>;

    /// Persist one sample under `session`.
    fn append_result<'a>(
        &'a self,
        session: &'a SessionId,
        sample: &'a Sample,
    ) -> BoxFuture<'a, Result<ResultRecord, CoreError>>;

    /// Mark `session` inactive.
    fn close_session<'a>(&'a self, session: &'a SessionId) -> BoxFuture<'a, Result<(), CoreError>>;

    /// Results of `session`, oldest first.
    fn list_results<'a>(
        &'a self,
        session: &'a SessionId,
    ) -> BoxFuture<'a, Result<Vec<ResultRecord>, CoreError>>;

    /// Most recent sessions, newest first.
    fn list_sessions(&self, limit: usize) -> BoxFuture<'_, Result<Vec<SessionRecord>, CoreError>>;
}

/// Empty strings are stored as absent.
fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
