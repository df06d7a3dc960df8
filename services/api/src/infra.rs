use availability_intake::config::IntakeConfig;
use availability_intake::intake::{
    IntakeSession, SessionId, SessionStore, SimulatedGateway, StoreError,
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local session store; sessions vanish on restart.
#[derive(Default, Clone)]
pub(crate) struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, IntakeSession>>>,
}

impl InMemorySessionStore {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionId, IntakeSession>>, StoreError> {
        self.sessions
            .lock()
            .map_err(|_| StoreError::Unavailable("session mutex poisoned".to_string()))
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().map(|guard| guard.len()).unwrap_or_default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, session: IntakeSession) -> Result<IntakeSession, StoreError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&session.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<IntakeSession>, StoreError> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn modify<R>(
        &self,
        id: &SessionId,
        apply: impl FnOnce(&mut IntakeSession) -> R,
    ) -> Result<R, StoreError> {
        let mut guard = self.lock()?;
        let session = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        Ok(apply(session))
    }

    fn remove(&self, id: &SessionId) -> Result<(), StoreError> {
        self.lock()?
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    fn purge_idle(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut guard = self.lock()?;
        let before = guard.len();
        guard.retain(|_, session| !session.is_idle_since(cutoff));
        Ok(before - guard.len())
    }
}

pub(crate) fn build_gateway(config: &IntakeConfig) -> SimulatedGateway {
    SimulatedGateway::new(config.gateway_latency, config.gateway_policy)
}
