//! Referral entities, lifecycle states and the audit history record.
//!
//! A referral links a patient to a specific provider for required follow-up
//! care and moves through a small, closed state machine:
//!
//! ```text
//! Needed -> Sent -> Scheduled -> Completed
//!             \        \
//!              +--------+-> Cancelled
//! ```
//!
//! `Completed` and `Cancelled` are terminal. Referrals are never deleted;
//! they only ever reach a terminal state, and every transition leaves one
//! immutable [`HistoryEntry`] behind.

use carelink_ids::{PatientId, ProviderId, ReferralId};
use carelink_types::NonEmptyText;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a referral.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
    /// Follow-up identified but nothing transmitted yet. Exists only as the
    /// `old_status` of a creation history entry; stored referrals are born
    /// in `Sent`.
    Needed,
    /// Transmitted to the provider.
    Sent,
    /// An appointment date is booked.
    Scheduled,
    /// The appointment took place.
    Completed,
    /// Abandoned; the patient may be referred again.
    Cancelled,
}

impl ReferralStatus {
    /// Whether this status ends the lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReferralStatus::Completed | ReferralStatus::Cancelled)
    }

    /// Whether the edge from `self` to `next` is on the legal edge set.
    pub fn can_transition_to(&self, next: ReferralStatus) -> bool {
        use ReferralStatus::*;
        matches!(
            (self, next),
            (Needed, Sent) | (Sent, Scheduled) | (Scheduled, Completed) | (Sent, Cancelled) | (Scheduled, Cancelled)
        )
    }
}

impl std::fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReferralStatus::Needed => "needed",
            ReferralStatus::Sent => "sent",
            ReferralStatus::Scheduled => "scheduled",
            ReferralStatus::Completed => "completed",
            ReferralStatus::Cancelled => "cancelled",
        };
        write!(f, "{name}")
    }
}

/// A tracked referral.
///
/// `version` is the optimistic-concurrency token: it starts at 1 when the
/// referral is created and increases by exactly one per successful
/// transition. A writer must present the version it last read; a stale
/// version can never overwrite a newer record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Referral {
    pub id: ReferralId,
    pub patient_id: PatientId,
    pub provider_id: ProviderId,
    /// The follow-up service the referral is for.
    pub service_type: NonEmptyText,
    pub status: ReferralStatus,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Appointment date, set when the referral is scheduled.
    pub scheduled_date: Option<NaiveDate>,
    /// Instant the referral was completed.
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<NonEmptyText>,
}

/// Immutable audit record of one status transition.
///
/// History entries are append-only: once written they are never updated or
/// deleted. `sequence` equals the referral version the transition produced,
/// so `(referral_id, sequence)` is a natural unique key and entries sort
/// oldest-first by sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub referral_id: ReferralId,
    pub sequence: u64,
    /// Status the referral held immediately before the transition.
    pub old_status: ReferralStatus,
    pub new_status: ReferralStatus,
    pub notes: Option<NonEmptyText>,
    /// Who performed the transition.
    pub actor: Actor,
    pub recorded_at: DateTime<Utc>,
}

/// The person or system performing a lifecycle operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// Full name, e.g. "Dana Whitfield".
    pub name: NonEmptyText,
    /// Professional role, e.g. "Care coordinator".
    pub role: NonEmptyText,
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.role)
    }
}
