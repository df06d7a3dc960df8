use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::widget::{IntakeWidget, WidgetView};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// One widget instance. Dropped when the session is closed or has sat idle
/// past the service timeout; nothing outlives it.
#[derive(Debug, Clone)]
pub struct IntakeSession {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub last_touched: DateTime<Utc>,
    pub widget: IntakeWidget,
}

impl IntakeSession {
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_touched = now;
    }

    /// True when the session has not changed since `cutoff`.
    pub fn is_idle_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_touched < cutoff
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            created_at: self.created_at,
            widget: self.widget.view(),
        }
    }
}

/// Serializable view of a session returned to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub widget: WidgetView,
}

/// Storage abstraction for live sessions so the service can be exercised in
/// isolation.
pub trait SessionStore: Send + Sync {
    fn insert(&self, session: IntakeSession) -> Result<IntakeSession, StoreError>;
    fn fetch(&self, id: &SessionId) -> Result<Option<IntakeSession>, StoreError>;
    /// Run `apply` against the stored session while holding it exclusively.
    fn modify<R>(
        &self,
        id: &SessionId,
        apply: impl FnOnce(&mut IntakeSession) -> R,
    ) -> Result<R, StoreError>;
    fn remove(&self, id: &SessionId) -> Result<(), StoreError>;
    /// Drop every session idle since `cutoff`, returning how many went.
    fn purge_idle(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session already exists")]
    Conflict,
    #[error("session not found")]
    NotFound,
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}
