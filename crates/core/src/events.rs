//! Domain events emitted by lifecycle operations.
//!
//! The core never calls into notification machinery. Every successful
//! lifecycle operation instead returns a [`ReferralEvent`] describing what
//! happened; an external notifier can subscribe to these at the call site
//! and deliver toasts, sounds or messages however it likes.

use serde::Serialize;

use crate::referral::Referral;

/// The kind of lifecycle change an event describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    /// A referral was created and transmitted.
    Created,
    /// An appointment was booked.
    Scheduled,
    /// The appointment took place.
    Completed,
    /// The referral was abandoned.
    Cancelled,
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Transition::Created => "created",
            Transition::Scheduled => "scheduled",
            Transition::Completed => "completed",
            Transition::Cancelled => "cancelled",
        };
        write!(f, "{name}")
    }
}

/// A successful lifecycle change: the updated referral plus what happened.
#[derive(Clone, Debug, Serialize)]
pub struct ReferralEvent {
    /// The referral as persisted after the change.
    pub referral: Referral,
    pub transition: Transition,
}
