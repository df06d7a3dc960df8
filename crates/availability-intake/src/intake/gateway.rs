use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::AvailabilityOutcome;

/// Boundary to the service that decides whether an address is covered.
///
/// Implementations may take arbitrarily long; callers impose no timeout.
#[async_trait]
pub trait AvailabilityGateway: Send + Sync {
    async fn check_availability(&self, address: &str)
        -> Result<AvailabilityOutcome, GatewayError>;
}

/// The lookup itself failed, as opposed to answering "not eligible".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("availability service unavailable: {0}")]
    Unavailable(String),
    #[error("availability request rejected: {0}")]
    Rejected(String),
}

pub const DEFAULT_SIMULATED_LATENCY: Duration = Duration::from_millis(2000);

/// How the simulated gateway answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulatedPolicy {
    /// Coin flip per request.
    #[default]
    Random,
    AlwaysEligible,
    NeverEligible,
    AlwaysFail,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown gateway policy '{0}'")]
pub struct UnknownGatewayPolicy(pub String);

impl FromStr for SimulatedPolicy {
    type Err = UnknownGatewayPolicy;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "eligible" | "always_eligible" => Ok(Self::AlwaysEligible),
            "not_eligible" | "never_eligible" => Ok(Self::NeverEligible),
            "fail" | "always_fail" => Ok(Self::AlwaysFail),
            _ => Err(UnknownGatewayPolicy(value.to_string())),
        }
    }
}

/// Stand-in for the coverage lookup: waits, then answers per policy.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    latency: Duration,
    policy: SimulatedPolicy,
}

impl SimulatedGateway {
    pub fn new(latency: Duration, policy: SimulatedPolicy) -> Self {
        Self { latency, policy }
    }

    pub fn policy(&self) -> SimulatedPolicy {
        self.policy
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new(DEFAULT_SIMULATED_LATENCY, SimulatedPolicy::default())
    }
}

fn coin_flip() -> bool {
    rand::thread_rng().gen_bool(0.5)
}

#[async_trait]
impl AvailabilityGateway for SimulatedGateway {
    async fn check_availability(
        &self,
        address: &str,
    ) -> Result<AvailabilityOutcome, GatewayError> {
        debug!(
            latency_ms = self.latency.as_millis() as u64,
            policy = ?self.policy,
            "simulating availability lookup"
        );
        tokio::time::sleep(self.latency).await;

        match self.policy {
            SimulatedPolicy::Random => Ok(AvailabilityOutcome::from(coin_flip())),
            SimulatedPolicy::AlwaysEligible => Ok(AvailabilityOutcome::Eligible),
            SimulatedPolicy::NeverEligible => Ok(AvailabilityOutcome::NotEligible),
            SimulatedPolicy::AlwaysFail => Err(GatewayError::Unavailable(format!(
                "no coverage data for '{address}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_policies_answer_deterministically() {
        let eligible = SimulatedGateway::new(Duration::ZERO, SimulatedPolicy::AlwaysEligible);
        let never = SimulatedGateway::new(Duration::ZERO, SimulatedPolicy::NeverEligible);
        let failing = SimulatedGateway::new(Duration::ZERO, SimulatedPolicy::AlwaysFail);

        assert_eq!(
            eligible.check_availability("Av. Providencia 1234").await,
            Ok(AvailabilityOutcome::Eligible)
        );
        assert_eq!(
            never.check_availability("Av. Providencia 1234").await,
            Ok(AvailabilityOutcome::NotEligible)
        );
        assert!(matches!(
            failing.check_availability("Av. Providencia 1234").await,
            Err(GatewayError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn random_policy_always_resolves() {
        let gateway = SimulatedGateway::new(Duration::ZERO, SimulatedPolicy::Random);
        for _ in 0..16 {
            assert!(gateway.check_availability("Los Leones 77").await.is_ok());
        }
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!(
            "Eligible".parse::<SimulatedPolicy>(),
            Ok(SimulatedPolicy::AlwaysEligible)
        );
        assert_eq!(
            " always_fail ".parse::<SimulatedPolicy>(),
            Ok(SimulatedPolicy::AlwaysFail)
        );
        assert_eq!(
            "maybe".parse::<SimulatedPolicy>(),
            Err(UnknownGatewayPolicy("maybe".to_string()))
        );
    }
}
