use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::normalizer::address_length;

/// Addresses must be strictly longer than this before a check can start.
///
/// Placeholder for a real geocoding or coverage lookup.
pub const DEFAULT_PLAUSIBLE_ADDRESS_MIN_LEN: usize = 10;

/// Address filled in by the "use my location" shortcut until a real
/// geolocation source is wired in.
pub const LOCATION_SHORTCUT_ADDRESS: &str = "Av. Hernando de Aguirre 1133";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    Initial,
    Checking,
    Available,
    Unavailable,
    Failed,
}

impl CheckState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Initial => "Initial",
            Self::Checking => "Checking",
            Self::Available => "Available",
            Self::Unavailable => "Unavailable",
            Self::Failed => "Check Failed",
        }
    }

    /// States in which the identifier fields are shown and editable.
    pub const fn collects_identifiers(self) -> bool {
        matches!(self, Self::Available | Self::Unavailable)
    }

    /// States a reset may leave from.
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Available | Self::Unavailable | Self::Failed)
    }
}

/// Fields that carry their own validation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    IdentityNumber,
    PhoneNumber,
}

impl FieldKind {
    pub const fn ordered() -> [Self; 2] {
        [Self::IdentityNumber, Self::PhoneNumber]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::IdentityNumber => "RUT",
            Self::PhoneNumber => "Phone",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormData {
    pub address: String,
    pub is_apartment: bool,
    pub identity_number: String,
    pub phone_number: String,
}

impl FormData {
    pub(crate) fn clear_identifiers(&mut self) {
        self.identity_number.clear();
        self.phone_number.clear();
    }
}

/// Eligibility answer returned by an availability gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityOutcome {
    Eligible,
    NotEligible,
}

impl From<bool> for AvailabilityOutcome {
    fn from(eligible: bool) -> Self {
        if eligible {
            Self::Eligible
        } else {
            Self::NotEligible
        }
    }
}

/// What happens to entered text when the flow returns to `Initial`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    #[default]
    KeepEntries,
    ClearEntries,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reset policy '{0}'")]
pub struct UnknownResetPolicy(pub String);

impl FromStr for ResetPolicy {
    type Err = UnknownResetPolicy;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keep" | "keep_entries" => Ok(Self::KeepEntries),
            "clear" | "clear_entries" => Ok(Self::ClearEntries),
            _ => Err(UnknownResetPolicy(value.to_string())),
        }
    }
}

/// Tunables for one checker instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerConfig {
    pub plausible_address_min_len: usize,
    pub reset_policy: ResetPolicy,
}

impl CheckerConfig {
    pub fn is_plausible_address(&self, address: &str) -> bool {
        address_length(address) > self.plausible_address_min_len
    }
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            plausible_address_min_len: DEFAULT_PLAUSIBLE_ADDRESS_MIN_LEN,
            reset_policy: ResetPolicy::default(),
        }
    }
}

/// Operation rejected by the checker state machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("{operation} is not allowed in state {}", .state.label())]
    InvalidTransition {
        operation: &'static str,
        state: CheckState,
    },
    #[error("address is too short to check availability")]
    AddressNotPlausible,
    #[error("check ticket for episode {episode} is no longer current")]
    StaleTicket { episode: u64 },
    #[error("identity number and phone number must both be valid to continue")]
    ContinueDisabled,
}
