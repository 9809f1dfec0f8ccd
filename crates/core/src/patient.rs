//! Patient snapshots and their normalisation boundary.
//!
//! The external store owns patient records; the core only ever sees immutable
//! snapshots of them. All input passes through [`PatientSnapshot::normalise`]
//! exactly once, which validates the structurally required fields, derives
//! age and days-since-discharge against a caller-supplied reference date, and
//! leaves genuinely optional attributes as `None` for scoring to default.
//! Downstream code never re-validates patient data.

use carelink_ids::PatientId;
use carelink_types::{GeoPoint, NonEmptyText};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Raw patient input as supplied by the external store.
///
/// Everything that can be absent is optional here; this shape is a tolerant
/// reader and is never used past the normalisation boundary. Unknown fields
/// in the source document are ignored; the store record carries plenty the
/// core does not need.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPatient {
    pub id: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub diagnosis: Option<String>,
    pub diagnosis_category: Option<String>,
    pub discharge_date: Option<NaiveDate>,
    pub insurance_plan: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub required_specialty: Option<String>,
    pub missed_referrals: Option<u32>,
    pub cancelled_referrals: Option<u32>,
    /// Distance to the nearest in-network facility, in kilometres.
    pub nearest_in_network_km: Option<f64>,
}

/// A validated, immutable patient snapshot.
///
/// Derived fields (`age_years`, `days_since_discharge`) are computed at
/// normalisation time against the reference date the caller passed in, so
/// scoring the same snapshot always yields the same result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientSnapshot {
    pub id: PatientId,
    /// Whole years of age at the reference date; `None` when no birth date
    /// was supplied.
    pub age_years: Option<u32>,
    pub diagnosis: NonEmptyText,
    /// Lowercased diagnosis category used for the complexity lookup.
    pub diagnosis_category: Option<String>,
    /// Days elapsed between discharge and the reference date.
    pub days_since_discharge: u32,
    /// Insurance plan name, original casing preserved for display.
    pub insurance_plan: Option<NonEmptyText>,
    pub location: Option<GeoPoint>,
    /// Follow-up specialty the discharge plan requires.
    pub required_specialty: Option<NonEmptyText>,
    /// Combined count of previously missed and cancelled referrals; `None`
    /// when the store supplied neither count.
    pub prior_disengagements: Option<u32>,
    /// Distance to the nearest in-network facility, in kilometres.
    pub nearest_in_network_km: Option<f64>,
}

impl PatientSnapshot {
    /// Normalises raw store input into a validated snapshot.
    ///
    /// # Arguments
    ///
    /// * `raw` - The loosely-typed record read from the external store.
    /// * `as_of` - Reference date for deriving age and days since discharge.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] when a structurally required field
    /// (patient id, diagnosis, discharge date) is absent or malformed, when
    /// the birth or discharge date lies after `as_of`, or when coordinates
    /// are half-supplied or out of range. Missing *optional* attributes are
    /// not errors; they degrade to `None`.
    pub fn normalise(raw: &RawPatient, as_of: NaiveDate) -> CoreResult<Self> {
        let id = match raw.id.as_deref() {
            Some(value) => PatientId::parse(value)
                .map_err(|e| CoreError::Validation(e.to_string()))?,
            None => return Err(CoreError::Validation("patient id is required".into())),
        };

        let diagnosis = required_text(raw.diagnosis.as_deref(), "diagnosis")?;

        let discharge_date = raw
            .discharge_date
            .ok_or_else(|| CoreError::Validation("discharge date is required".into()))?;
        let days_since_discharge = (as_of - discharge_date).num_days();
        if days_since_discharge < 0 {
            return Err(CoreError::Validation(format!(
                "discharge date {discharge_date} is after the reference date {as_of}"
            )));
        }

        let age_years = match raw.birth_date {
            Some(birth_date) => Some(as_of.years_since(birth_date).ok_or_else(|| {
                CoreError::Validation(format!(
                    "birth date {birth_date} is after the reference date {as_of}"
                ))
            })?),
            None => None,
        };

        let prior_disengagements = match (raw.missed_referrals, raw.cancelled_referrals) {
            (None, None) => None,
            (missed, cancelled) => {
                Some(missed.unwrap_or(0).saturating_add(cancelled.unwrap_or(0)))
            }
        };

        if let Some(km) = raw.nearest_in_network_km {
            if !km.is_finite() || km < 0.0 {
                return Err(CoreError::Validation(format!(
                    "nearest in-network distance must be a non-negative number, got {km}"
                )));
            }
        }

        Ok(Self {
            id,
            age_years,
            diagnosis,
            diagnosis_category: raw
                .diagnosis_category
                .as_deref()
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty()),
            days_since_discharge: days_since_discharge as u32,
            insurance_plan: optional_text(raw.insurance_plan.as_deref()),
            location: location_from_parts(raw.latitude, raw.longitude)?,
            required_specialty: optional_text(raw.required_specialty.as_deref()),
            prior_disengagements,
            nearest_in_network_km: raw.nearest_in_network_km,
        })
    }

    /// Normalises a JSON document from the store.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for malformed JSON, plus everything
    /// [`normalise`](Self::normalise) rejects.
    pub fn from_json(json: &str, as_of: NaiveDate) -> CoreResult<Self> {
        let raw: RawPatient = serde_json::from_str(json)
            .map_err(|e| CoreError::Validation(format!("malformed patient document: {e}")))?;
        Self::normalise(&raw, as_of)
    }
}

/// Validates a required text field, rejecting absent or blank values.
fn required_text(value: Option<&str>, field: &str) -> CoreResult<NonEmptyText> {
    match value {
        Some(v) => NonEmptyText::new(v)
            .map_err(|_| CoreError::Validation(format!("{field} cannot be blank"))),
        None => Err(CoreError::Validation(format!("{field} is required"))),
    }
}

/// Keeps an optional text field only when it has content.
fn optional_text(value: Option<&str>) -> Option<NonEmptyText> {
    value.and_then(|v| NonEmptyText::new(v).ok())
}

/// Builds a location from separate coordinate fields.
///
/// Both coordinates absent means no location; exactly one present is
/// malformed input rather than missing data.
pub(crate) fn location_from_parts(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> CoreResult<Option<GeoPoint>> {
    match (latitude, longitude) {
        (None, None) => Ok(None),
        (Some(lat), Some(lon)) => GeoPoint::new(lat, lon)
            .map(Some)
            .map_err(|e| CoreError::Validation(e.to_string())),
        _ => Err(CoreError::Validation(
            "latitude and longitude must be supplied together".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carelink_ids::PatientId;

    fn reference_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).expect("valid date")
    }

    fn full_raw() -> RawPatient {
        RawPatient {
            id: Some(PatientId::new().to_string()),
            birth_date: NaiveDate::from_ymd_opt(1954, 2, 1),
            diagnosis: Some("Congestive heart failure".into()),
            diagnosis_category: Some("Cardiology".into()),
            discharge_date: NaiveDate::from_ymd_opt(2026, 2, 23),
            insurance_plan: Some("Medicaid".into()),
            latitude: Some(40.7128),
            longitude: Some(-74.0060),
            required_specialty: Some("cardiology".into()),
            missed_referrals: Some(1),
            cancelled_referrals: Some(1),
            nearest_in_network_km: Some(12.0),
        }
    }

    #[test]
    fn test_normalise_derives_age_and_days_since_discharge() {
        let snapshot = PatientSnapshot::normalise(&full_raw(), reference_date())
            .expect("full record should normalise");

        assert_eq!(snapshot.age_years, Some(72));
        assert_eq!(snapshot.days_since_discharge, 20);
        assert_eq!(snapshot.diagnosis_category.as_deref(), Some("cardiology"));
        assert_eq!(snapshot.prior_disengagements, Some(2));
        assert!(snapshot.location.is_some());
    }

    #[test]
    fn test_normalise_rejects_missing_required_fields() {
        let mut raw = full_raw();
        raw.id = None;
        let err = PatientSnapshot::normalise(&raw, reference_date())
            .expect_err("missing id should fail");
        assert!(err.to_string().contains("patient id"));

        let mut raw = full_raw();
        raw.diagnosis = None;
        let err = PatientSnapshot::normalise(&raw, reference_date())
            .expect_err("missing diagnosis should fail");
        assert!(err.to_string().contains("diagnosis"));

        let mut raw = full_raw();
        raw.discharge_date = None;
        let err = PatientSnapshot::normalise(&raw, reference_date())
            .expect_err("missing discharge date should fail");
        assert!(err.to_string().contains("discharge date"));
    }

    #[test]
    fn test_normalise_tolerates_missing_optional_fields() {
        let raw = RawPatient {
            id: Some(PatientId::new().to_string()),
            diagnosis: Some("Fractured hip".into()),
            discharge_date: NaiveDate::from_ymd_opt(2026, 3, 1),
            ..RawPatient::default()
        };

        let snapshot = PatientSnapshot::normalise(&raw, reference_date())
            .expect("minimal record should normalise");

        assert_eq!(snapshot.age_years, None);
        assert_eq!(snapshot.insurance_plan, None);
        assert_eq!(snapshot.location, None);
        assert_eq!(snapshot.prior_disengagements, None);
    }

    #[test]
    fn test_normalise_rejects_future_dates() {
        let mut raw = full_raw();
        raw.discharge_date = NaiveDate::from_ymd_opt(2026, 4, 1);
        let err = PatientSnapshot::normalise(&raw, reference_date())
            .expect_err("future discharge should fail");
        assert!(err.to_string().contains("after the reference date"));

        let mut raw = full_raw();
        raw.birth_date = NaiveDate::from_ymd_opt(2027, 1, 1);
        assert!(
            PatientSnapshot::normalise(&raw, reference_date()).is_err(),
            "future birth date should fail"
        );
    }

    #[test]
    fn test_normalise_rejects_half_supplied_coordinates() {
        let mut raw = full_raw();
        raw.longitude = None;
        let err = PatientSnapshot::normalise(&raw, reference_date())
            .expect_err("lone latitude should fail");
        assert!(err.to_string().contains("supplied together"));
    }

    #[test]
    fn test_single_referral_count_is_kept() {
        let mut raw = full_raw();
        raw.missed_referrals = Some(3);
        raw.cancelled_referrals = None;
        let snapshot = PatientSnapshot::normalise(&raw, reference_date())
            .expect("record should normalise");
        assert_eq!(snapshot.prior_disengagements, Some(3));
    }

    #[test]
    fn test_from_json_rejects_malformed_document() {
        let err = PatientSnapshot::from_json("{not json", reference_date())
            .expect_err("malformed JSON should fail");
        assert!(err.to_string().contains("malformed patient document"));
    }

    #[test]
    fn test_from_json_parses_store_document() {
        let id = PatientId::new();
        let json = format!(
            r#"{{
                "id": "{id}",
                "diagnosis": "COPD exacerbation",
                "diagnosis_category": "Pulmonology",
                "discharge_date": "2026-03-01",
                "insurance_plan": "Blue Shield PPO"
            }}"#
        );

        let snapshot = PatientSnapshot::from_json(&json, reference_date())
            .expect("document should normalise");
        assert_eq!(snapshot.id, id);
        assert_eq!(snapshot.days_since_discharge, 14);
        assert_eq!(
            snapshot.insurance_plan.as_ref().map(|p| p.as_str()),
            Some("Blue Shield PPO")
        );
    }
}
