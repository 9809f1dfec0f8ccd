//! Referral lifecycle operations.
//!
//! [`ReferralService`] owns the guarded transitions of the referral state
//! machine. Every mutating operation follows the same shape: read the
//! current record, check the caller's version token, check the requested
//! edge, then hand the store an atomic conditional write of the updated
//! record plus exactly one history entry. A failed operation writes nothing.
//!
//! Concurrency is optimistic: callers pass the version they last read, and a
//! mismatch comes back as [`CoreError::ConcurrencyConflict`]. The service
//! never retries; the caller refetches the latest state and decides.

use carelink_ids::{PatientId, ProviderId, ReferralId};
use carelink_types::NonEmptyText;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use crate::error::{CoreError, CoreResult};
use crate::events::{ReferralEvent, Transition};
use crate::referral::{Actor, HistoryEntry, Referral, ReferralStatus};
use crate::store::{ReferralStore, StoreError};

/// Stateful component driving referrals through their lifecycle.
///
/// Generic over the persistence backend; see
/// [`InMemoryReferralStore`](crate::store::InMemoryReferralStore) for the
/// reference implementation.
pub struct ReferralService<S> {
    store: S,
}

impl<S: ReferralStore> ReferralService<S> {
    /// Creates a service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a referral for a patient and transmits it to the provider.
    ///
    /// The referral is born in `Sent` (transmission happens at creation) at
    /// version 1, with one history entry recording the `needed -> sent`
    /// transition.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Conflict`] if the patient already has a
    /// non-terminal referral.
    pub fn create_referral(
        &self,
        actor: &Actor,
        patient_id: PatientId,
        provider_id: ProviderId,
        service_type: NonEmptyText,
    ) -> CoreResult<ReferralEvent> {
        let now = Utc::now();
        let referral = Referral {
            id: ReferralId::new(),
            patient_id,
            provider_id,
            service_type,
            status: ReferralStatus::Sent,
            version: 1,
            created_at: now,
            updated_at: now,
            scheduled_date: None,
            completed_at: None,
            notes: None,
        };

        let entry = HistoryEntry {
            referral_id: referral.id,
            sequence: referral.version,
            old_status: ReferralStatus::Needed,
            new_status: ReferralStatus::Sent,
            notes: None,
            actor: actor.clone(),
            recorded_at: now,
        };

        self.store
            .create(&referral, &entry)
            .map_err(map_store_error)?;

        info!(
            referral_id = %referral.id,
            patient_id = %patient_id,
            provider_id = %provider_id,
            "referral created and sent"
        );

        Ok(ReferralEvent {
            referral,
            transition: Transition::Created,
        })
    }

    /// Books an appointment date. Legal only from `Sent`.
    pub fn schedule_referral(
        &self,
        actor: &Actor,
        referral_id: ReferralId,
        expected_version: u64,
        date: NaiveDate,
        notes: Option<NonEmptyText>,
    ) -> CoreResult<ReferralEvent> {
        self.transition(
            actor,
            referral_id,
            expected_version,
            "schedule",
            ReferralStatus::Scheduled,
            Transition::Scheduled,
            notes,
            |referral, _now| referral.scheduled_date = Some(date),
        )
    }

    /// Marks the appointment as having taken place. Legal only from
    /// `Scheduled`.
    pub fn complete_referral(
        &self,
        actor: &Actor,
        referral_id: ReferralId,
        expected_version: u64,
        notes: Option<NonEmptyText>,
    ) -> CoreResult<ReferralEvent> {
        self.transition(
            actor,
            referral_id,
            expected_version,
            "complete",
            ReferralStatus::Completed,
            Transition::Completed,
            notes,
            |referral, now| referral.completed_at = Some(now),
        )
    }

    /// Abandons the referral, freeing the patient to be referred again.
    /// Legal from `Sent` or `Scheduled`.
    pub fn cancel_referral(
        &self,
        actor: &Actor,
        referral_id: ReferralId,
        expected_version: u64,
        notes: Option<NonEmptyText>,
    ) -> CoreResult<ReferralEvent> {
        self.transition(
            actor,
            referral_id,
            expected_version,
            "cancel",
            ReferralStatus::Cancelled,
            Transition::Cancelled,
            notes,
            |_referral, _now| {},
        )
    }

    /// Reads a referral by id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown id.
    pub fn get_referral(&self, referral_id: ReferralId) -> CoreResult<Referral> {
        self.store
            .get(referral_id)
            .map_err(map_store_error)?
            .ok_or_else(|| not_found(referral_id))
    }

    /// Reads a referral's audit history, oldest entry first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown id.
    pub fn get_history(&self, referral_id: ReferralId) -> CoreResult<Vec<HistoryEntry>> {
        // Distinguish "no referral" from "referral with history".
        self.get_referral(referral_id)?;
        self.store.history(referral_id).map_err(map_store_error)
    }

    /// Reads the patient's current non-terminal referral, if any.
    pub fn active_referral_for(&self, patient_id: PatientId) -> CoreResult<Option<Referral>> {
        self.store
            .active_for_patient(patient_id)
            .map_err(map_store_error)
    }

    /// Shared guarded-transition path for all mutating operations except
    /// creation.
    #[allow(clippy::too_many_arguments)]
    fn transition(
        &self,
        actor: &Actor,
        referral_id: ReferralId,
        expected_version: u64,
        requested: &'static str,
        new_status: ReferralStatus,
        transition: Transition,
        notes: Option<NonEmptyText>,
        apply: impl FnOnce(&mut Referral, DateTime<Utc>),
    ) -> CoreResult<ReferralEvent> {
        let current = self
            .store
            .get(referral_id)
            .map_err(map_store_error)?
            .ok_or_else(|| not_found(referral_id))?;

        if current.version != expected_version {
            warn!(
                referral_id = %referral_id,
                expected = expected_version,
                found = current.version,
                "stale version on {requested}"
            );
            return Err(CoreError::ConcurrencyConflict {
                referral_id,
                expected: expected_version,
                found: current.version,
            });
        }

        if !current.status.can_transition_to(new_status) {
            warn!(
                referral_id = %referral_id,
                from = %current.status,
                "illegal {requested} request"
            );
            return Err(CoreError::InvalidTransition {
                from: current.status,
                requested,
            });
        }

        let now = Utc::now();
        let mut updated = current.clone();
        updated.status = new_status;
        updated.version = current.version + 1;
        updated.updated_at = now;
        if notes.is_some() {
            updated.notes = notes.clone();
        }
        apply(&mut updated, now);

        let entry = HistoryEntry {
            referral_id,
            sequence: updated.version,
            old_status: current.status,
            new_status,
            notes,
            actor: actor.clone(),
            recorded_at: now,
        };

        self.store
            .commit_transition(&updated, expected_version, &entry)
            .map_err(map_store_error)?;

        info!(
            referral_id = %referral_id,
            from = %current.status,
            to = %new_status,
            version = updated.version,
            "referral transitioned"
        );

        Ok(ReferralEvent {
            referral: updated,
            transition,
        })
    }
}

fn not_found(referral_id: ReferralId) -> CoreError {
    CoreError::NotFound {
        kind: "referral",
        id: referral_id.to_string(),
    }
}

/// Translates persistence-boundary errors into the core taxonomy.
fn map_store_error(err: StoreError) -> CoreError {
    match err {
        StoreError::ActiveReferralExists {
            patient_id,
            referral_id,
        } => CoreError::Conflict {
            patient_id,
            referral_id,
        },
        StoreError::VersionConflict {
            referral_id,
            expected,
            found,
        } => CoreError::ConcurrencyConflict {
            referral_id,
            expected,
            found,
        },
        StoreError::UnknownReferral(id) => not_found(id),
        err @ StoreError::Backend(_) => CoreError::Store(err),
    }
}
