//! Default weights, thresholds and bands used by scoring and matching.
//!
//! Every tunable number in the core lives here under a name. The exact values
//! are heuristics; callers that need different behaviour override them through
//! [`CoreConfig`](crate::config::CoreConfig) rather than forking the tables.

/// Weight of the age factor in the leakage-risk score.
pub const RISK_WEIGHT_AGE: f64 = 0.15;
/// Weight of the diagnosis-complexity factor.
pub const RISK_WEIGHT_DIAGNOSIS: f64 = 0.25;
/// Weight of the time-since-discharge factor.
pub const RISK_WEIGHT_TIME_SINCE_DISCHARGE: f64 = 0.20;
/// Weight of the insurance-type factor.
pub const RISK_WEIGHT_INSURANCE: f64 = 0.15;
/// Weight of the geography (care-desert) factor.
pub const RISK_WEIGHT_GEOGRAPHY: f64 = 0.10;
/// Weight of the prior-referral-history factor.
pub const RISK_WEIGHT_PRIOR_REFERRALS: f64 = 0.15;

/// Scores at or above this are classified [`RiskLevel::High`](crate::risk::RiskLevel).
pub const RISK_THRESHOLD_HIGH: u8 = 70;
/// Scores at or above this (and below the high threshold) are `Medium`.
pub const RISK_THRESHOLD_MEDIUM: u8 = 40;

/// Neutral factor value substituted when an optional attribute is absent.
pub const RISK_FACTOR_NEUTRAL: u8 = 50;

/// Diagnosis-category complexity lookup, keyed by lowercase category.
///
/// Categories not listed here score [`RISK_FACTOR_NEUTRAL`] and are flagged
/// as defaulted.
pub const DIAGNOSIS_COMPLEXITY: &[(&str, u8)] = &[
    ("cardiac surgery", 90),
    ("oncology", 85),
    ("cardiology", 80),
    ("neurology", 75),
    ("pulmonology", 70),
    ("nephrology", 70),
    ("endocrinology", 60),
    ("orthopedics", 60),
    ("general surgery", 55),
    ("gastroenterology", 55),
    ("behavioral health", 50),
    ("dermatology", 35),
    ("primary care", 30),
];

/// Weight of in-network status in the provider match score.
pub const MATCH_WEIGHT_IN_NETWORK: f64 = 0.30;
/// Weight of specialty fit in the provider match score.
pub const MATCH_WEIGHT_SPECIALTY: f64 = 0.25;
/// Weight of proximity in the provider match score.
pub const MATCH_WEIGHT_PROXIMITY: f64 = 0.20;
/// Weight of the provider rating in the match score.
pub const MATCH_WEIGHT_RATING: f64 = 0.15;
/// Weight of availability recency in the match score.
pub const MATCH_WEIGHT_AVAILABILITY: f64 = 0.10;

/// Distance at which the proximity subscore bottoms out at zero.
pub const PROXIMITY_HORIZON_KM: f64 = 100.0;

/// Neutral subscore used when a match criterion cannot be evaluated
/// (no rating on file, unknown distance, unknown availability).
pub const MATCH_FACTOR_NEUTRAL: u8 = 50;

/// Default number of ranked providers returned when the caller does not
/// specify a limit.
pub const DEFAULT_MATCH_LIMIT: usize = 10;

/// Tolerance when validating that a weight set sums to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;
