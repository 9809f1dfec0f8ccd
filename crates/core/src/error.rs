use carelink_ids::{PatientId, ReferralId};

use crate::referral::ReferralStatus;
use crate::store::StoreError;

/// Errors surfaced by the care coordination core.
///
/// The taxonomy is deliberately small and maps onto how callers react:
/// validation and not-found errors are surfaced as-is, a conflict means the
/// patient already has an active referral, an invalid transition means the
/// caller's view of the lifecycle is wrong, and a concurrency conflict means
/// the caller should refetch the latest state before deciding whether to
/// retry.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Malformed or missing required input. Not retriable.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The referenced entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. `"referral"`.
        kind: &'static str,
        /// The identifier that failed to resolve.
        id: String,
    },

    /// The patient already has a referral that is not yet terminal.
    #[error("patient {patient_id} already has an active referral {referral_id}")]
    Conflict {
        patient_id: PatientId,
        referral_id: ReferralId,
    },

    /// The requested lifecycle edge is not legal from the current status.
    #[error("cannot {requested} a referral in status '{from}'")]
    InvalidTransition {
        /// Status the referral was in when the request arrived.
        from: ReferralStatus,
        /// The operation that was attempted, e.g. `"schedule"`.
        requested: &'static str,
    },

    /// The optimistic-concurrency check failed: the referral changed since
    /// the caller last read it.
    #[error(
        "referral {referral_id} was modified concurrently \
         (expected version {expected}, found {found})"
    )]
    ConcurrencyConflict {
        referral_id: ReferralId,
        expected: u64,
        found: u64,
    },

    /// The storage backend failed in a way that is not a domain conflict.
    #[error("store failure: {0}")]
    Store(#[source] StoreError),
}

/// Result alias used throughout the core.
pub type CoreResult<T> = std::result::Result<T, CoreError>;
