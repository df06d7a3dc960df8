use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{
    AvailabilityOutcome, CheckState, CheckerConfig, FieldKind, FormData, IntakeError, ResetPolicy,
    LOCATION_SHORTCUT_ADDRESS,
};
use super::format::{format_identity_number, format_phone_number};
use super::gateway::{AvailabilityGateway, GatewayError};
use super::normalizer::normalize_address;
use super::validation::{
    validate_identity_number, validate_phone_number, MobileNumber, Rut, ValidationResult,
    ValidationView,
};

/// Single-use claim on the outcome of one checking episode.
///
/// Issued by [`AvailabilityChecker::submit_address`] and consumed by
/// [`AvailabilityChecker::resolve`].
#[derive(Debug)]
#[must_use = "a check ticket must be resolved or the checker stays in Checking"]
pub struct CheckTicket {
    episode: u64,
    address: String,
}

impl CheckTicket {
    /// Normalized address to hand to the gateway.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn episode(&self) -> u64 {
        self.episode
    }
}

/// State machine behind the availability widget.
///
/// Owns the form for one session. Every edit is normalized, formatted and
/// validated synchronously; the only asynchronous step is the gateway call
/// between [`submit_address`](Self::submit_address) and
/// [`resolve`](Self::resolve).
#[derive(Debug, Clone)]
pub struct AvailabilityChecker {
    config: CheckerConfig,
    state: CheckState,
    form: FormData,
    address_plausible: bool,
    validations: BTreeMap<FieldKind, ValidationResult>,
    episode: u64,
    outcome: Option<AvailabilityOutcome>,
    failure: Option<String>,
}

impl Default for AvailabilityChecker {
    fn default() -> Self {
        Self::new(CheckerConfig::default())
    }
}

impl AvailabilityChecker {
    pub fn new(config: CheckerConfig) -> Self {
        Self {
            config,
            state: CheckState::Initial,
            form: FormData::default(),
            address_plausible: false,
            validations: BTreeMap::new(),
            episode: 0,
            outcome: None,
            failure: None,
        }
    }

    pub fn state(&self) -> CheckState {
        self.state
    }

    pub fn form(&self) -> &FormData {
        &self.form
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    pub fn is_address_plausible(&self) -> bool {
        self.address_plausible
    }

    /// `None` until the field has been edited at least once.
    pub fn validation(&self, field: FieldKind) -> Option<ValidationResult> {
        self.validations.get(&field).copied()
    }

    pub fn validations(&self) -> &BTreeMap<FieldKind, ValidationResult> {
        &self.validations
    }

    pub fn outcome(&self) -> Option<AvailabilityOutcome> {
        self.outcome
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn edit_address(&mut self, text: impl Into<String>) -> Result<(), IntakeError> {
        self.require(CheckState::Initial, "edit_address")?;
        self.form.address = text.into();
        self.address_plausible = self.config.is_plausible_address(&self.form.address);
        Ok(())
    }

    /// Fill the address from the location shortcut. Same rules as a typed edit.
    pub fn use_location(&mut self) -> Result<(), IntakeError> {
        self.edit_address(LOCATION_SHORTCUT_ADDRESS)?;
        debug!("address filled from location shortcut");
        Ok(())
    }

    pub fn set_apartment(&mut self, is_apartment: bool) -> Result<(), IntakeError> {
        self.require(CheckState::Initial, "set_apartment")?;
        self.form.is_apartment = is_apartment;
        Ok(())
    }

    /// Start a checking episode.
    ///
    /// Rejected outside `Initial`, which includes a second submit while a
    /// check is already running: no ticket is issued and the state is left
    /// untouched.
    pub fn submit_address(&mut self) -> Result<CheckTicket, IntakeError> {
        self.require(CheckState::Initial, "submit_address")?;
        if !self.address_plausible {
            warn!("availability check requested for an implausible address");
            return Err(IntakeError::AddressNotPlausible);
        }

        self.episode += 1;
        self.state = CheckState::Checking;
        self.outcome = None;
        self.failure = None;
        info!(episode = self.episode, "availability check started");

        Ok(CheckTicket {
            episode: self.episode,
            address: normalize_address(&self.form.address),
        })
    }

    /// Apply the gateway's answer for the episode named by `ticket`.
    pub fn resolve(
        &mut self,
        ticket: CheckTicket,
        result: Result<AvailabilityOutcome, GatewayError>,
    ) -> Result<CheckState, IntakeError> {
        if ticket.episode != self.episode || self.state != CheckState::Checking {
            warn!(
                episode = ticket.episode,
                current = self.episode,
                state = self.state.label(),
                "discarding availability result for a stale episode"
            );
            return Err(IntakeError::StaleTicket {
                episode: ticket.episode,
            });
        }

        match result {
            Ok(outcome) => {
                self.state = match outcome {
                    AvailabilityOutcome::Eligible => CheckState::Available,
                    AvailabilityOutcome::NotEligible => CheckState::Unavailable,
                };
                self.outcome = Some(outcome);
            }
            Err(err) => {
                warn!(episode = self.episode, error = %err, "availability check failed");
                self.state = CheckState::Failed;
                self.failure = Some(err.to_string());
            }
        }

        info!(
            episode = self.episode,
            state = self.state.label(),
            "availability check resolved"
        );
        Ok(self.state)
    }

    /// Submit, await the gateway and resolve in one step.
    pub async fn check_availability<G>(&mut self, gateway: &G) -> Result<CheckState, IntakeError>
    where
        G: AvailabilityGateway + ?Sized,
    {
        let ticket = self.submit_address()?;
        let result = gateway.check_availability(ticket.address()).await;
        self.resolve(ticket, result)
    }

    pub fn edit_identity_number(&mut self, text: &str) -> Result<ValidationResult, IntakeError> {
        self.require_collecting("edit_identity_number")?;
        self.form.identity_number = format_identity_number(text);
        Ok(self.revalidate(FieldKind::IdentityNumber))
    }

    /// Blur handling for the RUT field.
    ///
    /// Formats once more and, when the value is valid, switches to the
    /// canonical form with an uppercase check character.
    pub fn finalize_identity_number(&mut self) -> Result<ValidationResult, IntakeError> {
        self.require_collecting("finalize_identity_number")?;
        self.form.identity_number = match Rut::parse(&self.form.identity_number) {
            Ok(rut) => rut.to_string(),
            Err(_) => format_identity_number(&self.form.identity_number),
        };
        Ok(self.revalidate(FieldKind::IdentityNumber))
    }

    pub fn edit_phone_number(&mut self, text: &str) -> Result<ValidationResult, IntakeError> {
        self.require_collecting("edit_phone_number")?;
        self.form.phone_number = format_phone_number(text);
        Ok(self.revalidate(FieldKind::PhoneNumber))
    }

    /// Return to `Initial` from a settled state. Rejected while checking since
    /// in-flight checks cannot be cancelled.
    pub fn reset(&mut self) -> Result<(), IntakeError> {
        if !self.state.is_settled() {
            return self.reject("reset");
        }

        self.state = CheckState::Initial;
        self.outcome = None;
        self.failure = None;
        if self.config.reset_policy == ResetPolicy::ClearEntries {
            self.form = FormData::default();
            self.validations.clear();
        }
        self.address_plausible = self.config.is_plausible_address(&self.form.address);
        info!(policy = ?self.config.reset_policy, "availability checker reset");
        Ok(())
    }

    /// Whether the "continue" action is offered: identifiers are being
    /// collected and both currently validate.
    pub fn continue_enabled(&self) -> bool {
        self.state.collects_identifiers()
            && FieldKind::ordered().iter().all(|field| {
                self.validation(*field)
                    .is_some_and(|result| result.is_valid())
            })
    }

    /// Data handed downstream when the person continues.
    pub fn contact_submission(&self) -> Result<ContactSubmission, IntakeError> {
        let Some(outcome) = self.outcome.filter(|_| self.state.collects_identifiers()) else {
            return Err(IntakeError::InvalidTransition {
                operation: "continue",
                state: self.state,
            });
        };
        if !self.continue_enabled() {
            return Err(IntakeError::ContinueDisabled);
        }

        let rut = Rut::parse(&self.form.identity_number)
            .map_err(|_| IntakeError::ContinueDisabled)?;
        let phone = MobileNumber::parse(&self.form.phone_number)
            .map_err(|_| IntakeError::ContinueDisabled)?;

        Ok(ContactSubmission {
            identity_number: rut.to_string(),
            phone_number: phone.to_string(),
            address: normalize_address(&self.form.address),
            is_apartment: self.form.is_apartment,
            outcome,
        })
    }

    pub fn view(&self) -> CheckerView {
        CheckerView {
            state: self.state,
            state_label: self.state.label(),
            form: self.form.clone(),
            address_plausible: self.address_plausible,
            validations: self
                .validations
                .iter()
                .map(|(field, result)| (*field, result.view()))
                .collect(),
            continue_enabled: self.continue_enabled(),
            outcome: self.outcome,
            failure: self.failure.clone(),
        }
    }

    fn revalidate(&mut self, field: FieldKind) -> ValidationResult {
        let result = match field {
            FieldKind::IdentityNumber => validate_identity_number(&self.form.identity_number),
            FieldKind::PhoneNumber => validate_phone_number(&self.form.phone_number),
        };
        debug!(
            field = field.label(),
            valid = result.is_valid(),
            reason = result.reason().map(|reason| reason.code()),
            "field revalidated"
        );
        self.validations.insert(field, result);
        result
    }

    fn require(&self, expected: CheckState, operation: &'static str) -> Result<(), IntakeError> {
        if self.state == expected {
            Ok(())
        } else {
            self.reject(operation)
        }
    }

    fn require_collecting(&self, operation: &'static str) -> Result<(), IntakeError> {
        if self.state.collects_identifiers() {
            Ok(())
        } else {
            self.reject(operation)
        }
    }

    fn reject(&self, operation: &'static str) -> Result<(), IntakeError> {
        warn!(operation, state = self.state.label(), "rejected checker operation");
        Err(IntakeError::InvalidTransition {
            operation,
            state: self.state,
        })
    }
}

/// Snapshot of the checker for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct CheckerView {
    pub state: CheckState,
    pub state_label: &'static str,
    pub form: FormData,
    pub address_plausible: bool,
    pub validations: BTreeMap<FieldKind, ValidationView>,
    pub continue_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<AvailabilityOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Collected contact data once both identifiers validate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactSubmission {
    pub identity_number: String,
    pub phone_number: String,
    pub address: String,
    pub is_apartment: bool,
    pub outcome: AvailabilityOutcome,
}
