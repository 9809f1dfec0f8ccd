//! Leakage-risk scoring.
//!
//! The scorer estimates how likely a discharged patient is to disengage from
//! required follow-up care. Six factors are independently normalised to the
//! 0-100 range, combined as a fixed weighted sum and banded into Low, Medium
//! or High.
//!
//! Invariants:
//! - Deterministic: the same snapshot always produces the same assessment.
//! - Total: scoring a normalised snapshot never fails. Missing optional
//!   attributes degrade to a neutral mid-range value and the affected factor
//!   is reported in `defaulted`, so consumers can show reduced confidence.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::config::{CoreConfig, RiskThresholds, RiskWeights};
use crate::constants::{DIAGNOSIS_COMPLEXITY, RISK_FACTOR_NEUTRAL};
use crate::patient::PatientSnapshot;

/// The six inputs to the leakage-risk score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    Age,
    DiagnosisComplexity,
    TimeSinceDischarge,
    InsuranceType,
    Geography,
    PriorReferrals,
}

impl std::fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RiskFactor::Age => "age",
            RiskFactor::DiagnosisComplexity => "diagnosis complexity",
            RiskFactor::TimeSinceDischarge => "time since discharge",
            RiskFactor::InsuranceType => "insurance type",
            RiskFactor::Geography => "geography",
            RiskFactor::PriorReferrals => "prior referrals",
        };
        write!(f, "{name}")
    }
}

/// Risk band classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Bands a 0-100 score using the given thresholds.
    pub fn from_score(score: u8, thresholds: &RiskThresholds) -> Self {
        if score >= thresholds.high {
            RiskLevel::High
        } else if score >= thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        write!(f, "{name}")
    }
}

/// Per-factor normalised scores, each in 0-100.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FactorScores {
    pub age: u8,
    pub diagnosis_complexity: u8,
    pub time_since_discharge: u8,
    pub insurance_type: u8,
    pub geography: u8,
    pub prior_referrals: u8,
}

/// The result of scoring one patient snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    /// Weighted total in 0-100.
    pub score: u8,
    pub level: RiskLevel,
    pub factors: FactorScores,
    /// Factors that fell back to a neutral value because the snapshot was
    /// missing the underlying attribute.
    pub defaulted: BTreeSet<RiskFactor>,
}

/// Deterministic weighted-heuristic risk scorer.
#[derive(Clone, Debug)]
pub struct RiskScorer {
    weights: RiskWeights,
    thresholds: RiskThresholds,
}

impl RiskScorer {
    /// Creates a scorer from resolved configuration.
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            weights: *config.risk_weights(),
            thresholds: *config.risk_thresholds(),
        }
    }

    /// Scores a patient snapshot.
    ///
    /// Pure and total: never fails and never mutates the snapshot. Structural
    /// validation already happened when the snapshot was normalised.
    pub fn score(&self, patient: &PatientSnapshot) -> RiskAssessment {
        let mut defaulted = BTreeSet::new();
        let mut defaulting = |factor: RiskFactor| {
            defaulted.insert(factor);
            RISK_FACTOR_NEUTRAL
        };

        let age = match patient.age_years {
            Some(age) => age_factor(age),
            None => defaulting(RiskFactor::Age),
        };

        let diagnosis_complexity = match patient
            .diagnosis_category
            .as_deref()
            .and_then(complexity_for_category)
        {
            Some(complexity) => complexity,
            None => defaulting(RiskFactor::DiagnosisComplexity),
        };

        let time_since_discharge = discharge_factor(patient.days_since_discharge);

        let insurance_type = match patient.insurance_plan.as_ref() {
            Some(plan) => insurance_factor(plan.as_str()),
            None => defaulting(RiskFactor::InsuranceType),
        };

        let geography = match patient.nearest_in_network_km {
            Some(km) => geography_factor(km),
            None => defaulting(RiskFactor::Geography),
        };

        let prior_referrals = match patient.prior_disengagements {
            Some(count) => prior_referral_factor(count),
            None => defaulting(RiskFactor::PriorReferrals),
        };

        let factors = FactorScores {
            age,
            diagnosis_complexity,
            time_since_discharge,
            insurance_type,
            geography,
            prior_referrals,
        };

        let weighted = self.weights.age * f64::from(factors.age)
            + self.weights.diagnosis_complexity * f64::from(factors.diagnosis_complexity)
            + self.weights.time_since_discharge * f64::from(factors.time_since_discharge)
            + self.weights.insurance_type * f64::from(factors.insurance_type)
            + self.weights.geography * f64::from(factors.geography)
            + self.weights.prior_referrals * f64::from(factors.prior_referrals);

        let score = weighted.round().clamp(0.0, 100.0) as u8;
        let level = RiskLevel::from_score(score, &self.thresholds);

        debug!(
            patient_id = %patient.id,
            score,
            level = %level,
            defaulted = defaulted.len(),
            "computed leakage risk"
        );

        RiskAssessment {
            score,
            level,
            factors,
            defaulted,
        }
    }
}

/// Age banding: risk concentrates at the ends of the age range, where
/// transport, supervision and multimorbidity barriers are most common.
fn age_factor(age_years: u32) -> u8 {
    match age_years {
        0 => 80,
        1..=12 => 60,
        13..=17 => 45,
        18..=39 => 20,
        40..=64 => 40,
        65..=74 => 75,
        _ => 90,
    }
}

/// Complexity lookup for a lowercase diagnosis category. Unknown categories
/// return `None` so the caller can flag the factor as defaulted.
fn complexity_for_category(category: &str) -> Option<u8> {
    DIAGNOSIS_COMPLEXITY
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, complexity)| *complexity)
}

/// Disengagement risk grows as the follow-up window ages: a referral not
/// acted on within the first month is unlikely to be acted on at all.
fn discharge_factor(days_since_discharge: u32) -> u8 {
    match days_since_discharge {
        0..=3 => 20,
        4..=7 => 35,
        8..=14 => 55,
        15..=30 => 80,
        31..=60 => 90,
        _ => 100,
    }
}

/// Network breadth classification of the insurance plan name.
fn insurance_factor(plan: &str) -> u8 {
    let plan = plan.to_lowercase();
    if plan.contains("self-pay") || plan.contains("uninsured") || plan == "none" {
        95
    } else if plan.contains("medicaid") {
        85
    } else if plan.contains("marketplace") || plan.contains("exchange") {
        75
    } else if plan.contains("medicare") {
        55
    } else {
        25
    }
}

/// Care-desert indicator: distance to the nearest in-network facility.
fn geography_factor(nearest_in_network_km: f64) -> u8 {
    if nearest_in_network_km <= 10.0 {
        15
    } else if nearest_in_network_km <= 25.0 {
        35
    } else if nearest_in_network_km <= 50.0 {
        60
    } else if nearest_in_network_km <= 100.0 {
        80
    } else {
        95
    }
}

/// Saturating score for previously missed or cancelled referrals.
fn prior_referral_factor(count: u32) -> u8 {
    match count {
        0 => 10,
        1 => 40,
        2 => 65,
        3 => 80,
        _ => 95,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carelink_ids::PatientId;
    use carelink_types::NonEmptyText;

    fn scorer() -> RiskScorer {
        RiskScorer::new(&CoreConfig::default())
    }

    fn snapshot() -> PatientSnapshot {
        PatientSnapshot {
            id: PatientId::new(),
            age_years: Some(55),
            diagnosis: NonEmptyText::new("Type 2 diabetes").unwrap(),
            diagnosis_category: Some("endocrinology".into()),
            days_since_discharge: 5,
            insurance_plan: Some(NonEmptyText::new("Acme Commercial PPO").unwrap()),
            location: None,
            required_specialty: Some(NonEmptyText::new("endocrinology").unwrap()),
            prior_disengagements: Some(0),
            nearest_in_network_km: Some(8.0),
        }
    }

    #[test]
    fn test_score_is_deterministic() {
        let scorer = scorer();
        let patient = snapshot();
        assert_eq!(scorer.score(&patient), scorer.score(&patient));
    }

    #[test]
    fn test_score_stays_in_range_for_extremes() {
        let scorer = scorer();

        let mut worst = snapshot();
        worst.age_years = Some(90);
        worst.diagnosis_category = Some("cardiac surgery".into());
        worst.days_since_discharge = 120;
        worst.insurance_plan = Some(NonEmptyText::new("Uninsured self-pay").unwrap());
        worst.nearest_in_network_km = Some(250.0);
        worst.prior_disengagements = Some(6);

        let assessment = scorer.score(&worst);
        assert!(assessment.score <= 100);
        assert_eq!(assessment.level, RiskLevel::High);

        let mut best = snapshot();
        best.age_years = Some(30);
        best.diagnosis_category = Some("primary care".into());
        best.days_since_discharge = 1;
        let assessment = scorer.score(&best);
        assert_eq!(assessment.level, RiskLevel::Low);
    }

    #[test]
    fn test_level_bands_match_thresholds_exactly() {
        let thresholds = RiskThresholds::default();
        assert_eq!(RiskLevel::from_score(70, &thresholds), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(69, &thresholds), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(40, &thresholds), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(39, &thresholds), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0, &thresholds), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(100, &thresholds), RiskLevel::High);
    }

    #[test]
    fn test_elderly_complex_narrow_network_patient_scores_high() {
        // 72-year-old cardiology discharge on Medicaid, 20 days out, with no
        // geography or referral-history data on file.
        let mut patient = snapshot();
        patient.age_years = Some(72);
        patient.diagnosis_category = Some("cardiology".into());
        patient.days_since_discharge = 20;
        patient.insurance_plan = Some(NonEmptyText::new("Medicaid").unwrap());
        patient.nearest_in_network_km = None;
        patient.prior_disengagements = None;

        let assessment = scorer().score(&patient);
        assert!(
            assessment.score >= 70,
            "expected a high-band score, got {}",
            assessment.score
        );
        assert_eq!(assessment.level, RiskLevel::High);
        assert_eq!(assessment.factors.diagnosis_complexity, 80);
    }

    #[test]
    fn test_fully_populated_snapshot_defaults_nothing() {
        let assessment = scorer().score(&snapshot());
        assert!(assessment.defaulted.is_empty());
    }

    #[test]
    fn test_missing_optional_attributes_are_flagged_not_fatal() {
        let mut patient = snapshot();
        patient.age_years = None;
        patient.insurance_plan = None;
        patient.nearest_in_network_km = None;
        patient.prior_disengagements = None;
        patient.diagnosis_category = None;

        let assessment = scorer().score(&patient);
        assert_eq!(assessment.factors.age, RISK_FACTOR_NEUTRAL);
        assert_eq!(
            assessment.defaulted,
            [
                RiskFactor::Age,
                RiskFactor::DiagnosisComplexity,
                RiskFactor::InsuranceType,
                RiskFactor::Geography,
                RiskFactor::PriorReferrals,
            ]
            .into_iter()
            .collect()
        );
    }

    #[test]
    fn test_unknown_diagnosis_category_defaults_to_neutral() {
        let mut patient = snapshot();
        patient.diagnosis_category = Some("podiatry".into());

        let assessment = scorer().score(&patient);
        assert_eq!(assessment.factors.diagnosis_complexity, RISK_FACTOR_NEUTRAL);
        assert!(assessment.defaulted.contains(&RiskFactor::DiagnosisComplexity));
    }

    #[test]
    fn test_discharge_factor_never_decreases_with_elapsed_time() {
        let days = [0u32, 2, 5, 10, 20, 45, 90, 365];
        let factors: Vec<u8> = days.iter().map(|d| discharge_factor(*d)).collect();
        for pair in factors.windows(2) {
            assert!(pair[0] <= pair[1], "discharge factor must be monotonic");
        }
    }

    #[test]
    fn test_longer_gap_never_lowers_total_score() {
        let scorer = scorer();
        let mut early = snapshot();
        early.days_since_discharge = 2;
        let mut late = snapshot();
        late.days_since_discharge = 40;

        assert!(scorer.score(&late).score >= scorer.score(&early).score);
    }
}
