use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::checker::{CheckTicket, ContactSubmission};
use super::domain::{CheckState, CheckerConfig, IntakeError};
use super::gateway::AvailabilityGateway;
use super::repository::{IntakeSession, SessionId, SessionSnapshot, SessionStore, StoreError};
use super::widget::{IntakeWidget, WidgetOptions};

/// Sessions untouched for this long are dropped by [`IntakeSessionService::expire_idle`].
pub const DEFAULT_SESSION_IDLE_SECS: u32 = 30 * 60;

/// Service composing the session store and the availability gateway.
pub struct IntakeSessionService<S, G> {
    store: Arc<S>,
    gateway: Arc<G>,
    config: CheckerConfig,
    idle_timeout: Duration,
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("session-{id:06}"))
}

/// A check that has been started; the gateway call runs on `handle`.
#[derive(Debug)]
pub struct PendingCheck {
    pub snapshot: SessionSnapshot,
    pub handle: JoinHandle<Result<CheckState, IntakeServiceError>>,
}

impl<S, G> IntakeSessionService<S, G>
where
    S: SessionStore + 'static,
    G: AvailabilityGateway + 'static,
{
    pub fn new(store: Arc<S>, gateway: Arc<G>, config: CheckerConfig) -> Self {
        Self {
            store,
            gateway,
            config,
            idle_timeout: Duration::seconds(i64::from(DEFAULT_SESSION_IDLE_SECS)),
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Open a new widget session.
    pub fn create(&self, options: WidgetOptions) -> Result<SessionSnapshot, IntakeServiceError> {
        let now = Utc::now();
        let session = IntakeSession {
            id: next_session_id(),
            created_at: now,
            last_touched: now,
            widget: IntakeWidget::new(options, self.config.clone()),
        };
        let stored = self.store.insert(session)?;
        info!(session = %stored.id.0, "intake session opened");
        Ok(stored.snapshot())
    }

    pub fn get(&self, id: &SessionId) -> Result<SessionSnapshot, IntakeServiceError> {
        let session = self.store.fetch(id)?.ok_or(StoreError::NotFound)?;
        Ok(session.snapshot())
    }

    /// Tear the session down; its form data goes with it.
    pub fn close(&self, id: &SessionId) -> Result<(), IntakeServiceError> {
        self.store.remove(id)?;
        info!(session = %id.0, "intake session closed");
        Ok(())
    }

    /// Drop every session nobody has touched within the idle timeout.
    pub fn expire_idle(&self) -> Result<usize, IntakeServiceError> {
        let cutoff = Utc::now() - self.idle_timeout;
        let expired = self.store.purge_idle(cutoff)?;
        if expired > 0 {
            info!(expired, "idle intake sessions expired");
        }
        Ok(expired)
    }

    pub fn edit_address(
        &self,
        id: &SessionId,
        address: String,
    ) -> Result<SessionSnapshot, IntakeServiceError> {
        self.apply(id, |session| {
            session.widget.checker_mut().edit_address(address)?;
            Ok(session.snapshot())
        })
    }

    pub fn use_location(&self, id: &SessionId) -> Result<SessionSnapshot, IntakeServiceError> {
        self.apply(id, |session| {
            session.widget.checker_mut().use_location()?;
            Ok(session.snapshot())
        })
    }

    pub fn set_apartment(
        &self,
        id: &SessionId,
        is_apartment: bool,
    ) -> Result<SessionSnapshot, IntakeServiceError> {
        self.apply(id, |session| {
            session.widget.checker_mut().set_apartment(is_apartment)?;
            Ok(session.snapshot())
        })
    }

    /// Move the session to `Checking` and run the gateway in the background.
    ///
    /// The session is not held while the gateway is awaited; the result is
    /// applied through the store once it arrives.
    pub fn start_check(&self, id: &SessionId) -> Result<PendingCheck, IntakeServiceError> {
        let (ticket, snapshot) = self.apply(id, |session| {
            let ticket = session.widget.checker_mut().submit_address()?;
            Ok((ticket, session.snapshot()))
        })?;

        let handle = tokio::spawn(resolve_in_background(
            Arc::clone(&self.store),
            Arc::clone(&self.gateway),
            id.clone(),
            ticket,
        ));

        Ok(PendingCheck { snapshot, handle })
    }

    pub fn edit_identity_number(
        &self,
        id: &SessionId,
        value: &str,
    ) -> Result<SessionSnapshot, IntakeServiceError> {
        self.apply(id, |session| {
            session.widget.checker_mut().edit_identity_number(value)?;
            Ok(session.snapshot())
        })
    }

    pub fn finalize_identity_number(
        &self,
        id: &SessionId,
    ) -> Result<SessionSnapshot, IntakeServiceError> {
        self.apply(id, |session| {
            session.widget.checker_mut().finalize_identity_number()?;
            Ok(session.snapshot())
        })
    }

    pub fn edit_phone_number(
        &self,
        id: &SessionId,
        value: &str,
    ) -> Result<SessionSnapshot, IntakeServiceError> {
        self.apply(id, |session| {
            session.widget.checker_mut().edit_phone_number(value)?;
            Ok(session.snapshot())
        })
    }

    pub fn reset(&self, id: &SessionId) -> Result<SessionSnapshot, IntakeServiceError> {
        self.apply(id, |session| {
            session.widget.checker_mut().reset()?;
            Ok(session.snapshot())
        })
    }

    pub fn toggle(&self, id: &SessionId) -> Result<SessionSnapshot, IntakeServiceError> {
        self.apply(id, |session| {
            session.widget.toggle();
            Ok(session.snapshot())
        })
    }

    /// Collect the contact data. Delivery downstream is not wired up yet.
    pub fn continue_with(&self, id: &SessionId) -> Result<ContactSubmission, IntakeServiceError> {
        self.apply(id, |session| session.widget.checker().contact_submission())
    }

    fn apply<R>(
        &self,
        id: &SessionId,
        operation: impl FnOnce(&mut IntakeSession) -> Result<R, IntakeError>,
    ) -> Result<R, IntakeServiceError> {
        Ok(self.store.modify(id, |session| {
            session.touch(Utc::now());
            operation(session)
        })??)
    }
}

async fn resolve_in_background<S, G>(
    store: Arc<S>,
    gateway: Arc<G>,
    session_id: SessionId,
    ticket: CheckTicket,
) -> Result<CheckState, IntakeServiceError>
where
    S: SessionStore,
    G: AvailabilityGateway,
{
    let result = gateway.check_availability(ticket.address()).await;
    let resolved = store.modify(&session_id, |session| {
        session.touch(Utc::now());
        session.widget.checker_mut().resolve(ticket, result)
    });

    match resolved {
        Ok(state) => Ok(state?),
        Err(err) => {
            warn!(session = %session_id.0, error = %err, "session gone before check resolved");
            Err(err.into())
        }
    }
}

/// Error raised by the intake session service.
#[derive(Debug, thiserror::Error)]
pub enum IntakeServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
