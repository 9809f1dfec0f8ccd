//! Strongly typed entity identifiers.
//!
//! The care coordination core handles three kinds of entities (patients,
//! providers and referrals), all of them identified by UUIDv4 values.
//! Passing bare `Uuid`s (or worse, `String`s) around makes it far too easy to
//! hand a patient identifier to an operation expecting a referral. Each entity
//! therefore gets its own newtype.
//!
//! Identifiers are accepted from outside the core only through [`parse`],
//! which validates the input, so once a typed id exists it is known to wrap a
//! well-formed UUID.
//!
//! [`parse`]: PatientId::parse

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use uuid::Uuid;

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// Invalid identifier input.
    #[error("invalid identifier: {0}")]
    Invalid(String),
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;

macro_rules! entity_id {
    ($(#[$outer:meta])* $name:ident) => {
        $(#[$outer])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Validates and parses an externally supplied identifier.
            ///
            /// # Errors
            ///
            /// Returns [`IdError::Invalid`] if `input` is not a valid UUID.
            pub fn parse(input: &str) -> IdResult<Self> {
                Uuid::parse_str(input).map(Self).map_err(|_| {
                    IdError::Invalid(format!(
                        "{} must be a valid UUID, got '{input}'",
                        stringify!($name)
                    ))
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.collect_str(&self.0.hyphenated())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

entity_id!(
    /// Identifier of a patient snapshot owned by the external store.
    PatientId
);

entity_id!(
    /// Identifier of a candidate provider in the directory.
    ProviderId
);

entity_id!(
    /// Identifier of a referral tracked by the lifecycle component.
    ReferralId
);
