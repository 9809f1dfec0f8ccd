//! Provider matching and ranking.
//!
//! Given a patient snapshot and a list of candidate providers, the matcher
//! produces a ranked, explained list: each candidate gets a composite match
//! score from in-network status, specialty fit, proximity, rating and
//! availability, and a human-readable explanation naming the concrete values
//! that drove the score.
//!
//! Ranking is fully deterministic: descending match score, ties broken by
//! higher rating, then shorter distance, then provider id.

use std::cmp::Ordering;

use carelink_types::Rating;
use serde::Serialize;
use tracing::debug;

use crate::config::{CoreConfig, MatchWeights, UnlocatedProviderPolicy};
use crate::constants::{DEFAULT_MATCH_LIMIT, MATCH_FACTOR_NEUTRAL, PROXIMITY_HORIZON_KM};
use crate::geo::great_circle_km;
use crate::patient::PatientSnapshot;
use crate::provider::ProviderSnapshot;

/// Caller-supplied filters and bounds for a ranking request.
#[derive(Clone, Copy, Debug)]
pub struct MatchOptions {
    /// Maximum number of ranked providers to return.
    pub limit: usize,
    /// Only return providers within this great-circle distance of the
    /// patient. Providers whose distance cannot be established are excluded
    /// when this is set.
    pub max_distance_km: Option<f64>,
    /// Only return providers rated at least this highly. Unrated providers
    /// are excluded when this is set.
    pub min_rating: Option<Rating>,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_MATCH_LIMIT,
            max_distance_km: None,
            min_rating: None,
        }
    }
}

/// One ranked candidate with its score breakdown inputs and explanation.
#[derive(Clone, Debug, Serialize)]
pub struct RankedProvider {
    pub provider: ProviderSnapshot,
    /// Composite score in 0-100.
    pub match_score: u8,
    /// Great-circle distance to the patient, when both sides have
    /// coordinates.
    pub distance_km: Option<f64>,
    pub in_network: bool,
    pub specialty_match: bool,
    /// Reproducible text naming the concrete values behind the score.
    pub explanation: String,
}

/// Multi-criterion provider ranking.
#[derive(Clone, Debug)]
pub struct ProviderMatcher {
    weights: MatchWeights,
    unlocated_policy: UnlocatedProviderPolicy,
}

impl ProviderMatcher {
    /// Creates a matcher from resolved configuration.
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            weights: *config.match_weights(),
            unlocated_policy: config.unlocated_provider_policy(),
        }
    }

    /// Ranks candidate providers for a patient.
    ///
    /// Pure over its inputs: candidates are read-only and two calls with the
    /// same snapshots and options return identical results. An empty
    /// candidate list yields an empty ranking.
    pub fn rank(
        &self,
        providers: &[ProviderSnapshot],
        patient: &PatientSnapshot,
        opts: &MatchOptions,
    ) -> Vec<RankedProvider> {
        let mut ranked: Vec<RankedProvider> = providers
            .iter()
            .filter_map(|provider| self.evaluate(provider, patient, opts))
            .collect();

        ranked.sort_by(compare_ranked);
        ranked.truncate(opts.limit);

        debug!(
            patient_id = %patient.id,
            candidates = providers.len(),
            returned = ranked.len(),
            "ranked providers"
        );

        ranked
    }

    /// Scores a single candidate, or filters it out per the options and the
    /// unlocated-provider policy.
    fn evaluate(
        &self,
        provider: &ProviderSnapshot,
        patient: &PatientSnapshot,
        opts: &MatchOptions,
    ) -> Option<RankedProvider> {
        if provider.location.is_none() {
            match self.unlocated_policy {
                UnlocatedProviderPolicy::AlwaysExclude => return None,
                UnlocatedProviderPolicy::ExcludeWhenDistanceBounded => {
                    if opts.max_distance_km.is_some() {
                        return None;
                    }
                }
            }
        }

        let distance_km = match (patient.location, provider.location) {
            (Some(from), Some(to)) => Some(great_circle_km(from, to)),
            _ => None,
        };

        if let Some(max) = opts.max_distance_km {
            match distance_km {
                Some(d) if d <= max => {}
                _ => return None,
            }
        }

        if let Some(min) = opts.min_rating {
            match provider.rating {
                Some(r) if r.value() >= min.value() => {}
                _ => return None,
            }
        }

        let in_network = patient
            .insurance_plan
            .as_ref()
            .map(|plan| provider.accepts_plan(plan.as_str()))
            .unwrap_or(false);

        let specialty_match = patient
            .required_specialty
            .as_ref()
            .map(|specialty| provider.offers_specialty(specialty.as_str()))
            .unwrap_or(false);

        let network_score: u8 = if in_network { 100 } else { 0 };
        let specialty_score: u8 = if specialty_match { 100 } else { 0 };
        let proximity_score = distance_km
            .map(proximity_subscore)
            .unwrap_or(MATCH_FACTOR_NEUTRAL);
        let rating_score = provider
            .rating
            .map(|r| (r.value() / Rating::MAX * 100.0).round() as u8)
            .unwrap_or(MATCH_FACTOR_NEUTRAL);
        let availability_score = provider
            .next_available_in_days
            .map(availability_subscore)
            .unwrap_or(MATCH_FACTOR_NEUTRAL);

        let weighted = self.weights.in_network * f64::from(network_score)
            + self.weights.specialty * f64::from(specialty_score)
            + self.weights.proximity * f64::from(proximity_score)
            + self.weights.rating * f64::from(rating_score)
            + self.weights.availability * f64::from(availability_score);

        let match_score = weighted.round().clamp(0.0, 100.0) as u8;

        let explanation = build_explanation(
            provider,
            patient,
            in_network,
            specialty_match,
            distance_km,
        );

        Some(RankedProvider {
            provider: provider.clone(),
            match_score,
            distance_km,
            in_network,
            specialty_match,
            explanation,
        })
    }
}

/// Proximity subscore: 100 at zero distance, falling linearly to 0 at the
/// horizon. Strictly non-increasing in distance.
fn proximity_subscore(distance_km: f64) -> u8 {
    let fraction = (1.0 - distance_km / PROXIMITY_HORIZON_KM).max(0.0);
    (fraction * 100.0).round() as u8
}

/// Availability subscore: sooner openings score higher.
fn availability_subscore(days: u32) -> u8 {
    match days {
        0..=1 => 100,
        2..=3 => 85,
        4..=7 => 70,
        8..=14 => 50,
        15..=30 => 30,
        _ => 10,
    }
}

fn build_explanation(
    provider: &ProviderSnapshot,
    patient: &PatientSnapshot,
    in_network: bool,
    specialty_match: bool,
    distance_km: Option<f64>,
) -> String {
    let mut parts = Vec::with_capacity(5);

    match patient.insurance_plan.as_ref() {
        Some(plan) if in_network => parts.push(format!("accepts {plan}")),
        Some(plan) => parts.push(format!("out of network for {plan}")),
        None => parts.push("no insurance plan on file".to_string()),
    }

    match patient.required_specialty.as_ref() {
        Some(specialty) if specialty_match => parts.push(format!("offers {specialty}")),
        Some(specialty) => parts.push(format!("does not list {specialty}")),
        None => parts.push("no required specialty specified".to_string()),
    }

    match distance_km {
        Some(km) => parts.push(format!("{km:.1} km away")),
        None => parts.push("distance unknown".to_string()),
    }

    match provider.rating {
        Some(rating) => parts.push(format!("rated {rating} of 5")),
        None => parts.push("no rating on file".to_string()),
    }

    match provider.next_available_in_days {
        Some(0) => parts.push("has openings today".to_string()),
        Some(1) => parts.push("next opening in 1 day".to_string()),
        Some(days) => parts.push(format!("next opening in {days} days")),
        None => parts.push("availability unknown".to_string()),
    }

    format!("{}: {}", provider.name, parts.join("; "))
}

/// Total order over ranked providers: match score descending, then rating
/// descending (unrated last), then distance ascending (unknown last), then
/// provider id.
fn compare_ranked(a: &RankedProvider, b: &RankedProvider) -> Ordering {
    b.match_score
        .cmp(&a.match_score)
        .then_with(|| rating_descending(a.provider.rating, b.provider.rating))
        .then_with(|| distance_ascending(a.distance_km, b.distance_km))
        .then_with(|| a.provider.id.cmp(&b.provider.id))
}

fn rating_descending(a: Option<Rating>, b: Option<Rating>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.value().total_cmp(&x.value()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn distance_ascending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
