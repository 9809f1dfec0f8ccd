//! Provider snapshots and their normalisation boundary.
//!
//! Candidate providers come from an external directory and are read-only
//! input to the matcher. Normalisation lowercases the set-valued attributes
//! (specialties, insurance plans) so matching is order- and
//! case-insensitive, and validates rating and coordinates once so ranking
//! never has to.

use std::collections::BTreeSet;

use carelink_ids::ProviderId;
use carelink_types::{GeoPoint, NonEmptyText, Rating};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::patient::location_from_parts;

/// Raw provider input as supplied by the external directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProvider {
    pub id: Option<String>,
    pub name: Option<String>,
    pub provider_type: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub accepted_insurance: Vec<String>,
    #[serde(default)]
    pub in_network_plans: Vec<String>,
    pub rating: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Days until the provider's next open appointment slot.
    pub next_available_in_days: Option<u32>,
}

/// A validated, immutable provider snapshot.
///
/// Set-valued attributes are stored as lowercase `BTreeSet`s: lookups are
/// case-insensitive and iteration order is deterministic, so concurrent
/// rankings over the same candidates always observe identical data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSnapshot {
    pub id: ProviderId,
    pub name: NonEmptyText,
    pub provider_type: Option<NonEmptyText>,
    pub specialties: BTreeSet<String>,
    pub accepted_insurance: BTreeSet<String>,
    pub in_network_plans: BTreeSet<String>,
    pub rating: Option<Rating>,
    pub location: Option<GeoPoint>,
    pub next_available_in_days: Option<u32>,
}

impl ProviderSnapshot {
    /// Normalises raw directory input into a validated snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] when the provider id or name is
    /// absent or malformed, the rating is off the 0-5 scale, or coordinates
    /// are half-supplied or out of range.
    pub fn normalise(raw: &RawProvider) -> CoreResult<Self> {
        let id = match raw.id.as_deref() {
            Some(value) => ProviderId::parse(value)
                .map_err(|e| CoreError::Validation(e.to_string()))?,
            None => return Err(CoreError::Validation("provider id is required".into())),
        };

        let name = match raw.name.as_deref() {
            Some(value) => NonEmptyText::new(value)
                .map_err(|_| CoreError::Validation("provider name cannot be blank".into()))?,
            None => return Err(CoreError::Validation("provider name is required".into())),
        };

        let rating = match raw.rating {
            Some(value) => Some(
                Rating::new(value).map_err(|e| CoreError::Validation(e.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            id,
            name,
            provider_type: raw
                .provider_type
                .as_deref()
                .and_then(|t| NonEmptyText::new(t).ok()),
            specialties: lowercase_set(&raw.specialties),
            accepted_insurance: lowercase_set(&raw.accepted_insurance),
            in_network_plans: lowercase_set(&raw.in_network_plans),
            rating,
            location: location_from_parts(raw.latitude, raw.longitude)?,
            next_available_in_days: raw.next_available_in_days,
        })
    }

    /// Normalises a JSON document from the directory.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for malformed JSON, plus everything
    /// [`normalise`](Self::normalise) rejects.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let raw: RawProvider = serde_json::from_str(json)
            .map_err(|e| CoreError::Validation(format!("malformed provider document: {e}")))?;
        Self::normalise(&raw)
    }

    /// Whether this provider takes the given insurance plan, either by
    /// accepting it directly or through an in-network arrangement.
    pub fn accepts_plan(&self, plan: &str) -> bool {
        let plan = plan.trim().to_lowercase();
        self.accepted_insurance.contains(&plan) || self.in_network_plans.contains(&plan)
    }

    /// Whether this provider lists the given specialty.
    pub fn offers_specialty(&self, specialty: &str) -> bool {
        self.specialties.contains(&specialty.trim().to_lowercase())
    }
}

fn lowercase_set(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_raw() -> RawProvider {
        RawProvider {
            id: Some(ProviderId::new().to_string()),
            name: Some("Riverside Cardiology Group".into()),
            provider_type: Some("Specialist clinic".into()),
            specialties: vec!["Cardiology".into(), " Internal Medicine ".into()],
            accepted_insurance: vec!["Medicaid".into()],
            in_network_plans: vec!["Blue Shield PPO".into()],
            rating: Some(4.5),
            latitude: Some(40.73),
            longitude: Some(-73.99),
            next_available_in_days: Some(3),
        }
    }

    #[test]
    fn test_normalise_lowercases_set_attributes() {
        let provider = ProviderSnapshot::normalise(&full_raw())
            .expect("full record should normalise");

        assert!(provider.specialties.contains("cardiology"));
        assert!(provider.specialties.contains("internal medicine"));
        assert!(provider.accepted_insurance.contains("medicaid"));
    }

    #[test]
    fn test_accepts_plan_is_case_insensitive_across_both_sets() {
        let provider = ProviderSnapshot::normalise(&full_raw())
            .expect("full record should normalise");

        assert!(provider.accepts_plan("MEDICAID"));
        assert!(provider.accepts_plan("blue shield ppo"));
        assert!(!provider.accepts_plan("Aetna HMO"));
    }

    #[test]
    fn test_offers_specialty_is_case_insensitive() {
        let provider = ProviderSnapshot::normalise(&full_raw())
            .expect("full record should normalise");

        assert!(provider.offers_specialty("Cardiology"));
        assert!(!provider.offers_specialty("Dermatology"));
    }

    #[test]
    fn test_normalise_rejects_missing_identity() {
        let mut raw = full_raw();
        raw.id = None;
        assert!(
            ProviderSnapshot::normalise(&raw).is_err(),
            "missing id should fail"
        );

        let mut raw = full_raw();
        raw.name = Some("   ".into());
        let err = ProviderSnapshot::normalise(&raw).expect_err("blank name should fail");
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_normalise_rejects_out_of_scale_rating() {
        let mut raw = full_raw();
        raw.rating = Some(5.5);
        let err = ProviderSnapshot::normalise(&raw).expect_err("rating above 5 should fail");
        assert!(err.to_string().contains("rating"));
    }

    #[test]
    fn test_normalise_tolerates_missing_optional_fields() {
        let raw = RawProvider {
            id: Some(ProviderId::new().to_string()),
            name: Some("Community Health Associates".into()),
            ..RawProvider::default()
        };

        let provider = ProviderSnapshot::normalise(&raw)
            .expect("minimal record should normalise");
        assert_eq!(provider.rating, None);
        assert_eq!(provider.location, None);
        assert!(provider.specialties.is_empty());
    }
}
