//! Availability intake: address eligibility check followed by RUT and mobile
//! phone collection.
//!
//! Identifier handling is split into pure leaves (`normalizer`, `format`,
//! `validation`) feeding the [`AvailabilityChecker`] state machine. The
//! [`IntakeWidget`] adds presentation visibility on top, and the session
//! service/router expose one widget per session over HTTP.

pub mod checker;
pub mod domain;
pub mod format;
pub mod gateway;
pub mod normalizer;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;
pub mod widget;

#[cfg(test)]
mod tests;

pub use checker::{AvailabilityChecker, CheckTicket, CheckerView, ContactSubmission};
pub use domain::{
    AvailabilityOutcome, CheckState, CheckerConfig, FieldKind, FormData, IntakeError, ResetPolicy,
    DEFAULT_PLAUSIBLE_ADDRESS_MIN_LEN, LOCATION_SHORTCUT_ADDRESS,
};
pub use format::{format_identity_number, format_phone_number};
pub use gateway::{AvailabilityGateway, GatewayError, SimulatedGateway, SimulatedPolicy};
pub use normalizer::{clean_identity_number, clean_phone_number, normalize_address};
pub use repository::{IntakeSession, SessionId, SessionSnapshot, SessionStore, StoreError};
pub use router::intake_router;
pub use service::{
    IntakeServiceError, IntakeSessionService, PendingCheck, DEFAULT_SESSION_IDLE_SECS,
};
pub use validation::{
    validate_identity_number, validate_phone_number, InvalidReason, MobileNumber, Rut,
    ValidationResult, ValidationView,
};
pub use widget::{IntakeWidget, WidgetOptions, WidgetView};
