//! The referral persistence contract and an in-memory reference store.
//!
//! The core does not assume any particular database. It requires exactly the
//! semantics expressed by [`ReferralStore`]: atomic "insert unless the
//! patient already has an active referral", atomic "write iff the version is
//! unchanged" combined with the history append, and ordered history reads.
//! Durable backends implement this trait; [`InMemoryReferralStore`] is the
//! reference implementation used by tests and by embedders that do not need
//! durability.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use carelink_ids::{PatientId, ReferralId};

use crate::referral::{HistoryEntry, Referral};

/// Errors produced at the persistence boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The patient already has a non-terminal referral.
    #[error("patient {patient_id} already has an active referral {referral_id}")]
    ActiveReferralExists {
        patient_id: PatientId,
        referral_id: ReferralId,
    },

    /// The conditional write failed: the stored version differs from the one
    /// the writer read.
    #[error("referral {referral_id} version mismatch: expected {expected}, found {found}")]
    VersionConflict {
        referral_id: ReferralId,
        expected: u64,
        found: u64,
    },

    /// The referral does not exist in this store.
    #[error("unknown referral: {0}")]
    UnknownReferral(ReferralId),

    /// The backend itself failed (I/O, connectivity, poisoned lock).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Persistence contract for referrals and their history.
///
/// Implementations must make each method atomic with respect to the others:
/// in particular, `create` must check-and-insert in one step, and
/// `commit_transition` must compare the version, replace the record and
/// append the history entry in one step. The core performs no retries; a
/// conflict is returned to the caller as-is.
pub trait ReferralStore: Send + Sync {
    /// Reads a referral by id.
    fn get(&self, id: ReferralId) -> Result<Option<Referral>, StoreError>;

    /// Reads the patient's non-terminal referral, if one exists.
    fn active_for_patient(&self, patient_id: PatientId) -> Result<Option<Referral>, StoreError>;

    /// Inserts a new referral with its creation history entry, unless the
    /// patient already has an active referral.
    ///
    /// # Errors
    ///
    /// [`StoreError::ActiveReferralExists`] when the patient already has a
    /// non-terminal referral.
    fn create(&self, referral: &Referral, first_entry: &HistoryEntry) -> Result<(), StoreError>;

    /// Replaces a referral iff its stored version equals `expected_version`,
    /// appending the history entry in the same atomic step.
    ///
    /// # Errors
    ///
    /// [`StoreError::VersionConflict`] when the stored version differs,
    /// [`StoreError::UnknownReferral`] when the referral does not exist.
    /// On error nothing is written.
    fn commit_transition(
        &self,
        updated: &Referral,
        expected_version: u64,
        entry: &HistoryEntry,
    ) -> Result<(), StoreError>;

    /// Reads a referral's history entries oldest-first.
    fn history(&self, id: ReferralId) -> Result<Vec<HistoryEntry>, StoreError>;
}

#[derive(Default)]
struct StoreInner {
    referrals: HashMap<ReferralId, Referral>,
    history: HashMap<ReferralId, Vec<HistoryEntry>>,
}

/// Thread-safe in-memory implementation of [`ReferralStore`].
///
/// A single mutex guards both maps, so the active-referral check, the
/// version compare-and-swap and the history append each happen inside one
/// critical section.
#[derive(Default)]
pub struct InMemoryReferralStore {
    inner: Mutex<StoreInner>,
}

impl InMemoryReferralStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("store mutex poisoned".into()))
    }
}

impl ReferralStore for InMemoryReferralStore {
    fn get(&self, id: ReferralId) -> Result<Option<Referral>, StoreError> {
        Ok(self.lock()?.referrals.get(&id).cloned())
    }

    fn active_for_patient(&self, patient_id: PatientId) -> Result<Option<Referral>, StoreError> {
        Ok(self
            .lock()?
            .referrals
            .values()
            .find(|r| r.patient_id == patient_id && !r.status.is_terminal())
            .cloned())
    }

    fn create(&self, referral: &Referral, first_entry: &HistoryEntry) -> Result<(), StoreError> {
        let mut inner = self.lock()?;

        if let Some(active) = inner
            .referrals
            .values()
            .find(|r| r.patient_id == referral.patient_id && !r.status.is_terminal())
        {
            return Err(StoreError::ActiveReferralExists {
                patient_id: referral.patient_id,
                referral_id: active.id,
            });
        }

        inner.referrals.insert(referral.id, referral.clone());
        inner
            .history
            .entry(referral.id)
            .or_default()
            .push(first_entry.clone());
        Ok(())
    }

    fn commit_transition(
        &self,
        updated: &Referral,
        expected_version: u64,
        entry: &HistoryEntry,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;

        let current = inner
            .referrals
            .get(&updated.id)
            .ok_or(StoreError::UnknownReferral(updated.id))?;

        if current.version != expected_version {
            return Err(StoreError::VersionConflict {
                referral_id: updated.id,
                expected: expected_version,
                found: current.version,
            });
        }

        inner.referrals.insert(updated.id, updated.clone());
        inner
            .history
            .entry(updated.id)
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    fn history(&self, id: ReferralId) -> Result<Vec<HistoryEntry>, StoreError> {
        Ok(self.lock()?.history.get(&id).cloned().unwrap_or_default())
    }
}
