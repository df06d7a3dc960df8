use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value;
use tokio::sync::Notify;

use crate::intake::domain::{AvailabilityOutcome, CheckerConfig};
use crate::intake::gateway::{AvailabilityGateway, GatewayError};
use crate::intake::repository::{IntakeSession, SessionId, SessionStore, StoreError};
use crate::intake::service::IntakeSessionService;

pub(super) const SAMPLE_ADDRESS: &str = "Av. Hernando de Aguirre 1133";

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    sessions: Arc<Mutex<HashMap<SessionId, IntakeSession>>>,
}

impl SessionStore for MemoryStore {
    fn insert(&self, session: IntakeSession) -> Result<IntakeSession, StoreError> {
        let mut guard = self.sessions.lock().expect("store mutex poisoned");
        if guard.contains_key(&session.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<IntakeSession>, StoreError> {
        let guard = self.sessions.lock().expect("store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn modify<R>(
        &self,
        id: &SessionId,
        apply: impl FnOnce(&mut IntakeSession) -> R,
    ) -> Result<R, StoreError> {
        let mut guard = self.sessions.lock().expect("store mutex poisoned");
        let session = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        Ok(apply(session))
    }

    fn remove(&self, id: &SessionId) -> Result<(), StoreError> {
        let mut guard = self.sessions.lock().expect("store mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(StoreError::NotFound)
    }

    fn purge_idle(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut guard = self.sessions.lock().expect("store mutex poisoned");
        let before = guard.len();
        guard.retain(|_, session| !session.is_idle_since(cutoff));
        Ok(before - guard.len())
    }
}

pub(super) struct UnavailableStore;

impl SessionStore for UnavailableStore {
    fn insert(&self, _session: IntakeSession) -> Result<IntakeSession, StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }

    fn fetch(&self, _id: &SessionId) -> Result<Option<IntakeSession>, StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }

    fn modify<R>(
        &self,
        _id: &SessionId,
        _apply: impl FnOnce(&mut IntakeSession) -> R,
    ) -> Result<R, StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }

    fn remove(&self, _id: &SessionId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }

    fn purge_idle(&self, _cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }
}

/// Gateway answering with a fixed result and counting calls.
pub(super) struct ScriptedGateway {
    answer: Result<AvailabilityOutcome, GatewayError>,
    calls: AtomicUsize,
}

impl ScriptedGateway {
    pub(super) fn answering(answer: Result<AvailabilityOutcome, GatewayError>) -> Self {
        Self {
            answer,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn eligible() -> Self {
        Self::answering(Ok(AvailabilityOutcome::Eligible))
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AvailabilityGateway for ScriptedGateway {
    async fn check_availability(
        &self,
        _address: &str,
    ) -> Result<AvailabilityOutcome, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

/// Gateway that holds every request until released.
pub(super) struct GatedGateway {
    release: Notify,
    calls: AtomicUsize,
    addresses: Mutex<Vec<String>>,
}

impl GatedGateway {
    pub(super) fn new() -> Self {
        Self {
            release: Notify::new(),
            calls: AtomicUsize::new(0),
            addresses: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn release(&self) {
        self.release.notify_one();
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn addresses(&self) -> Vec<String> {
        self.addresses.lock().expect("address mutex poisoned").clone()
    }
}

#[async_trait]
impl AvailabilityGateway for GatedGateway {
    async fn check_availability(
        &self,
        address: &str,
    ) -> Result<AvailabilityOutcome, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.addresses
            .lock()
            .expect("address mutex poisoned")
            .push(address.to_string());
        self.release.notified().await;
        Ok(AvailabilityOutcome::Eligible)
    }
}

pub(super) type TestService<G> = IntakeSessionService<MemoryStore, G>;

pub(super) fn build_service<G: AvailabilityGateway + 'static>(
    gateway: G,
) -> (Arc<TestService<G>>, MemoryStore, Arc<G>) {
    let store = MemoryStore::default();
    let gateway = Arc::new(gateway);
    let service = Arc::new(IntakeSessionService::new(
        Arc::new(store.clone()),
        gateway.clone(),
        CheckerConfig::default(),
    ));
    (service, store, gateway)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

pub(super) fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status code");
}

pub(super) async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
