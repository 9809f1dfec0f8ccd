//! Core runtime configuration.
//!
//! Configuration is resolved once at startup and passed into the scorer,
//! matcher and lifecycle services. Nothing in the core reads process-wide
//! state during request handling; that keeps behaviour consistent across
//! multi-threaded callers and test harnesses.
//!
//! All numeric defaults come from [`crate::constants`]. Overrides are
//! validated at construction so a bad weight set is rejected before any
//! scoring runs.

use crate::constants::{
    MATCH_WEIGHT_AVAILABILITY, MATCH_WEIGHT_IN_NETWORK, MATCH_WEIGHT_PROXIMITY,
    MATCH_WEIGHT_RATING, MATCH_WEIGHT_SPECIALTY, RISK_THRESHOLD_HIGH, RISK_THRESHOLD_MEDIUM,
    RISK_WEIGHT_AGE, RISK_WEIGHT_DIAGNOSIS, RISK_WEIGHT_GEOGRAPHY, RISK_WEIGHT_INSURANCE,
    RISK_WEIGHT_PRIOR_REFERRALS, RISK_WEIGHT_TIME_SINCE_DISCHARGE, WEIGHT_SUM_TOLERANCE,
};
use crate::error::{CoreError, CoreResult};

/// Relative weights of the six leakage-risk factors. Must sum to one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RiskWeights {
    pub age: f64,
    pub diagnosis_complexity: f64,
    pub time_since_discharge: f64,
    pub insurance_type: f64,
    pub geography: f64,
    pub prior_referrals: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            age: RISK_WEIGHT_AGE,
            diagnosis_complexity: RISK_WEIGHT_DIAGNOSIS,
            time_since_discharge: RISK_WEIGHT_TIME_SINCE_DISCHARGE,
            insurance_type: RISK_WEIGHT_INSURANCE,
            geography: RISK_WEIGHT_GEOGRAPHY,
            prior_referrals: RISK_WEIGHT_PRIOR_REFERRALS,
        }
    }
}

impl RiskWeights {
    fn components(&self) -> [f64; 6] {
        [
            self.age,
            self.diagnosis_complexity,
            self.time_since_discharge,
            self.insurance_type,
            self.geography,
            self.prior_referrals,
        ]
    }
}

/// Score thresholds for the Low/Medium/High risk bands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RiskThresholds {
    /// Scores at or above this are High.
    pub high: u8,
    /// Scores at or above this (and below `high`) are Medium.
    pub medium: u8,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high: RISK_THRESHOLD_HIGH,
            medium: RISK_THRESHOLD_MEDIUM,
        }
    }
}

/// Relative weights of the provider match criteria. Must sum to one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchWeights {
    pub in_network: f64,
    pub specialty: f64,
    pub proximity: f64,
    pub rating: f64,
    pub availability: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            in_network: MATCH_WEIGHT_IN_NETWORK,
            specialty: MATCH_WEIGHT_SPECIALTY,
            proximity: MATCH_WEIGHT_PROXIMITY,
            rating: MATCH_WEIGHT_RATING,
            availability: MATCH_WEIGHT_AVAILABILITY,
        }
    }
}

impl MatchWeights {
    fn components(&self) -> [f64; 5] {
        [
            self.in_network,
            self.specialty,
            self.proximity,
            self.rating,
            self.availability,
        ]
    }
}

/// How providers without geocoordinates participate in ranking.
///
/// The source behaviour was ambiguous, so this is an explicit policy rather
/// than a guess baked into the matcher.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnlocatedProviderPolicy {
    /// Unlocated providers are dropped only from distance-bounded queries
    /// (a `max_distance` filter cannot be verified against them); otherwise
    /// they stay eligible with a neutral proximity subscore.
    #[default]
    ExcludeWhenDistanceBounded,
    /// Unlocated providers are dropped from every ranking.
    AlwaysExclude,
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    risk_weights: RiskWeights,
    risk_thresholds: RiskThresholds,
    match_weights: MatchWeights,
    unlocated_provider_policy: UnlocatedProviderPolicy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            risk_weights: RiskWeights::default(),
            risk_thresholds: RiskThresholds::default(),
            match_weights: MatchWeights::default(),
            unlocated_provider_policy: UnlocatedProviderPolicy::default(),
        }
    }
}

impl CoreConfig {
    /// Create a `CoreConfig` with explicit overrides.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if either weight set does not sum to
    /// one, any weight is negative or non-finite, or the risk thresholds are
    /// not ordered `0 < medium < high <= 100`.
    pub fn new(
        risk_weights: RiskWeights,
        risk_thresholds: RiskThresholds,
        match_weights: MatchWeights,
        unlocated_provider_policy: UnlocatedProviderPolicy,
    ) -> CoreResult<Self> {
        validate_weight_set("risk weights", &risk_weights.components())?;
        validate_weight_set("match weights", &match_weights.components())?;

        if risk_thresholds.medium == 0
            || risk_thresholds.medium >= risk_thresholds.high
            || risk_thresholds.high > 100
        {
            return Err(CoreError::Validation(format!(
                "risk thresholds must satisfy 0 < medium < high <= 100, \
                 got medium={} high={}",
                risk_thresholds.medium, risk_thresholds.high
            )));
        }

        Ok(Self {
            risk_weights,
            risk_thresholds,
            match_weights,
            unlocated_provider_policy,
        })
    }

    pub fn risk_weights(&self) -> &RiskWeights {
        &self.risk_weights
    }

    pub fn risk_thresholds(&self) -> &RiskThresholds {
        &self.risk_thresholds
    }

    pub fn match_weights(&self) -> &MatchWeights {
        &self.match_weights
    }

    pub fn unlocated_provider_policy(&self) -> UnlocatedProviderPolicy {
        self.unlocated_provider_policy
    }
}

fn validate_weight_set(name: &str, weights: &[f64]) -> CoreResult<()> {
    for weight in weights {
        if !weight.is_finite() || *weight < 0.0 {
            return Err(CoreError::Validation(format!(
                "{name} must all be finite and non-negative, got {weight}"
            )));
        }
    }

    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(CoreError::Validation(format!(
            "{name} must sum to 1.0, got {sum}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = CoreConfig::default();
        CoreConfig::new(
            *cfg.risk_weights(),
            *cfg.risk_thresholds(),
            *cfg.match_weights(),
            cfg.unlocated_provider_policy(),
        )
        .expect("default weights and thresholds should validate");
    }

    #[test]
    fn test_rejects_weights_not_summing_to_one() {
        let mut weights = RiskWeights::default();
        weights.age += 0.1;

        let err = CoreConfig::new(
            weights,
            RiskThresholds::default(),
            MatchWeights::default(),
            UnlocatedProviderPolicy::default(),
        )
        .expect_err("weights summing to 1.1 should fail");

        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn test_rejects_negative_weight() {
        let weights = MatchWeights {
            in_network: -0.1,
            specialty: 0.35,
            proximity: 0.30,
            rating: 0.25,
            availability: 0.20,
        };

        let err = CoreConfig::new(
            RiskWeights::default(),
            RiskThresholds::default(),
            weights,
            UnlocatedProviderPolicy::default(),
        )
        .expect_err("negative weight should fail");

        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let err = CoreConfig::new(
            RiskWeights::default(),
            RiskThresholds {
                high: 40,
                medium: 70,
            },
            MatchWeights::default(),
            UnlocatedProviderPolicy::default(),
        )
        .expect_err("medium above high should fail");

        assert!(err.to_string().contains("medium < high"));
    }
}
