//! Validated value types shared across the carelink workspace.
//!
//! Everything in this crate follows the same rule: once a value has been
//! constructed, it is known to be well-formed. Raw input is validated exactly
//! once at the boundary, so downstream code never re-checks ranges or
//! emptiness.

use serde::{Deserialize, Serialize};

/// Errors that can occur when creating validated value types.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// The input text was empty or contained only whitespace.
    #[error("text cannot be empty")]
    EmptyText,
    /// A rating was outside the supported scale or not a finite number.
    #[error("rating must be a finite value between 0 and 5, got {0}")]
    RatingOutOfRange(f64),
    /// A latitude was outside the valid range.
    #[error("latitude must be between -90 and 90 degrees, got {0}")]
    LatitudeOutOfRange(f64),
    /// A longitude was outside the valid range.
    #[error("longitude must be between -180 and 180 degrees, got {0}")]
    LongitudeOutOfRange(f64),
}

/// A string type that guarantees non-empty content.
///
/// Wraps a `String` that contains at least one non-whitespace character.
/// Leading and trailing whitespace is trimmed during construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed before validation.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::EmptyText`] if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TypesError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypesError::EmptyText);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A provider rating on the conventional 0 to 5 scale.
///
/// The scale matches what directory listings publish (for example `4.5`).
/// Construction rejects NaN, infinities and out-of-range values, so ordering
/// comparisons on the inner value are always meaningful.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Rating(f64);

impl Rating {
    /// Lowest value on the rating scale.
    pub const MIN: f64 = 0.0;
    /// Highest value on the rating scale.
    pub const MAX: f64 = 5.0;

    /// Creates a rating, validating it lies on the 0 to 5 scale.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::RatingOutOfRange`] if `value` is not finite or
    /// falls outside the scale.
    pub fn new(value: f64) -> Result<Self, TypesError> {
        if !value.is_finite() || !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(TypesError::RatingOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Returns the rating as a plain `f64`.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

impl Serialize for Rating {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Rating::new(value).map_err(serde::de::Error::custom)
    }
}

/// A geographic point with range-checked coordinates.
///
/// Latitude is in `[-90, 90]`, longitude in `[-180, 180]`, both in decimal
/// degrees. Non-finite values are rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Creates a geographic point from decimal-degree coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::LatitudeOutOfRange`] or
    /// [`TypesError::LongitudeOutOfRange`] if either coordinate is not finite
    /// or outside its valid range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, TypesError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(TypesError::LatitudeOutOfRange(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(TypesError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in decimal degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl Serialize for GeoPoint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        GeoPointWire {
            latitude: self.latitude,
            longitude: self.longitude,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GeoPoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = GeoPointWire::deserialize(deserializer)?;
        GeoPoint::new(wire.latitude, wire.longitude).map_err(serde::de::Error::custom)
    }
}

/// Wire shape for [`GeoPoint`] serialisation.
#[derive(Serialize, Deserialize)]
struct GeoPointWire {
    latitude: f64,
    longitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_text_trims_whitespace() {
        let text = NonEmptyText::new("  Cardiology  ").expect("should accept padded text");
        assert_eq!(text.as_str(), "Cardiology");
    }

    #[test]
    fn test_non_empty_text_rejects_empty_and_whitespace() {
        assert!(matches!(
            NonEmptyText::new("").expect_err("empty should fail"),
            TypesError::EmptyText
        ));
        assert!(matches!(
            NonEmptyText::new("   \t\n").expect_err("whitespace should fail"),
            TypesError::EmptyText
        ));
    }

    #[test]
    fn test_non_empty_text_deserialize_revalidates() {
        let err = serde_json::from_str::<NonEmptyText>("\"   \"")
            .expect_err("whitespace-only JSON string should fail");
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_rating_accepts_scale_bounds() {
        assert_eq!(Rating::new(0.0).expect("min should be valid").value(), 0.0);
        assert_eq!(Rating::new(5.0).expect("max should be valid").value(), 5.0);
        assert_eq!(Rating::new(4.5).expect("4.5 should be valid").value(), 4.5);
    }

    #[test]
    fn test_rating_rejects_out_of_range_and_non_finite() {
        assert!(Rating::new(-0.1).is_err(), "below scale should fail");
        assert!(Rating::new(5.1).is_err(), "above scale should fail");
        assert!(Rating::new(f64::NAN).is_err(), "NaN should fail");
        assert!(Rating::new(f64::INFINITY).is_err(), "infinity should fail");
    }

    #[test]
    fn test_rating_display_one_decimal() {
        let rating = Rating::new(4.0).expect("rating should be valid");
        assert_eq!(rating.to_string(), "4.0");
    }

    #[test]
    fn test_geo_point_validates_ranges() {
        assert!(GeoPoint::new(51.5, -0.12).is_ok());
        assert!(matches!(
            GeoPoint::new(90.1, 0.0).expect_err("latitude out of range"),
            TypesError::LatitudeOutOfRange(_)
        ));
        assert!(matches!(
            GeoPoint::new(0.0, -180.5).expect_err("longitude out of range"),
            TypesError::LongitudeOutOfRange(_)
        ));
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err(), "NaN should fail");
    }

    #[test]
    fn test_geo_point_deserialize_revalidates() {
        let ok: GeoPoint = serde_json::from_str(r#"{"latitude": 51.5, "longitude": -0.12}"#)
            .expect("valid coordinates should deserialize");
        assert_eq!(ok.latitude(), 51.5);

        let err = serde_json::from_str::<GeoPoint>(r#"{"latitude": 123.0, "longitude": 0.0}"#)
            .expect_err("invalid latitude should fail");
        assert!(err.to_string().contains("latitude"));
    }
}
