use log::debug;
use parking_lot::Mutex;
use serde::Serialize;

use super::{InterviewError, Result};

/// Per-round view of the most recent generation call.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundStatus {
    Idle,
    Pending,
    Succeeded,
    Failed(InterviewError),
}

impl RoundStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, RoundStatus::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Round {
    Aptitude,
    Coding,
    Hr,
    Report,
}

/// Allows at most one outstanding generation call per round engine.
#[derive(Debug)]
pub struct CallSlot {
    round: Round,
    status: Mutex<RoundStatus>,
}

impl CallSlot {
    pub fn new(round: Round) -> Self {
        Self {
            round,
            status: Mutex::new(RoundStatus::Idle),
        }
    }

    pub fn status(&self) -> RoundStatus {
        self.status.lock().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.status.lock().is_pending()
    }

    /// Claim the slot, or fail with `Busy` if a call is outstanding.
    pub fn begin(&self) -> Result<InFlight<'_>> {
        let mut status = self.status.lock();
        if status.is_pending() {
            debug!("{:?} call rejected: one already in flight", self.round);
            return Err(InterviewError::Busy);
        }
        *status = RoundStatus::Pending;
        Ok(InFlight {
            slot: self,
            settled: false,
        })
    }
}

/// Held for the duration of a call. Dropping it unsettled (the awaiting future
/// was cancelled) frees the slot.
#[must_use]
pub struct InFlight<'a> {
    slot: &'a CallSlot,
    settled: bool,
}

impl InFlight<'_> {
    pub fn settle<T>(mut self, result: Result<T>) -> Result<T> {
        *self.slot.status.lock() = match &result {
            Ok(_) => RoundStatus::Succeeded,
            Err(err) => RoundStatus::Failed(err.clone()),
        };
        self.settled = true;
        result
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            *self.slot.status.lock() = RoundStatus::Idle;
        }
    }
}
