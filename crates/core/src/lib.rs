//! # Carelink Core
//!
//! Core business logic for post-discharge care coordination.
//!
//! Three components do the real work:
//! - [`risk::RiskScorer`]: pure weighted-heuristic scoring of a patient's
//!   leakage risk (the likelihood of disengaging from required follow-up).
//! - [`matching::ProviderMatcher`]: pure multi-criterion ranking of
//!   candidate providers for a referral, with per-provider explanations.
//! - [`lifecycle::ReferralService`]: the referral state machine, with
//!   optimistic-concurrency guards and an append-only audit history.
//!
//! Everything else is boundary work: raw store snapshots are normalised once
//! ([`patient`], [`provider`]), persistence hides behind the
//! [`store::ReferralStore`] contract, and configuration is resolved once at
//! startup ([`config`]).
//!
//! **No transport concerns**: HTTP servers, notification delivery, and the
//! concrete database belong to the surrounding application. Lifecycle
//! operations return [`events::ReferralEvent`] values for an external
//! notifier to consume.

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod geo;
pub mod lifecycle;
pub mod matching;
pub mod patient;
pub mod provider;
pub mod referral;
pub mod risk;
pub mod store;

pub use carelink_ids::{IdError, PatientId, ProviderId, ReferralId};
pub use carelink_types::{GeoPoint, NonEmptyText, Rating, TypesError};

pub use config::{
    CoreConfig, MatchWeights, RiskThresholds, RiskWeights, UnlocatedProviderPolicy,
};
pub use error::{CoreError, CoreResult};
pub use events::{ReferralEvent, Transition};
pub use lifecycle::ReferralService;
pub use matching::{MatchOptions, ProviderMatcher, RankedProvider};
pub use patient::{PatientSnapshot, RawPatient};
pub use provider::{ProviderSnapshot, RawProvider};
pub use referral::{Actor, HistoryEntry, Referral, ReferralStatus};
pub use risk::{FactorScores, RiskAssessment, RiskFactor, RiskLevel, RiskScorer};
pub use store::{InMemoryReferralStore, ReferralStore, StoreError};
