//! Transaction lifecycle bookkeeping shared by the backend adapters.
//!
//! Every adapter wraps exactly one native transaction (or snapshot, or
//! connection) and forwards state transitions through a [`Lifecycle`]:
//!
//! ```text
//! Active --commit--> Committed
//!    \----discard--> Discarded
//! ```
//!
//! Terminal states have no outgoing transitions. Reads, writes and seeks on a
//! terminal transaction fail with [`KvError::UseAfterEnd`], while repeated
//! `commit`/`discard` calls are no-ops.

use std::sync::{Mutex, MutexGuard, PoisonError};

use strum::{AsRefStr, Display};

use crate::error::{KvError, KvResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum TxnStatus {
    Active,
    Committed,
    Discarded,
}

#[derive(Debug)]
pub(crate) struct Lifecycle {
    status: TxnStatus,
    read_only: bool,
}

impl Lifecycle {
    pub(crate) fn new(read_only: bool) -> Self {
        Self {
            status: TxnStatus::Active,
            read_only,
        }
    }

    pub(crate) fn status(&self) -> TxnStatus {
        self.status
    }

    pub(crate) fn is_active(&self) -> bool {
        self.status == TxnStatus::Active
    }

    pub(crate) fn ensure_active(&self) -> KvResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(KvError::UseAfterEnd)
        }
    }

    /// Active and not read-only.
    pub(crate) fn ensure_writable(&self) -> KvResult<()> {
        self.ensure_active()?;
        if self.read_only {
            Err(KvError::ReadOnly)
        } else {
            Ok(())
        }
    }

    /// Move to a terminal state. Returns false if the transaction had already
    /// ended, in which case nothing changes.
    pub(crate) fn finish(&mut self, outcome: TxnStatus) -> bool {
        debug_assert_ne!(outcome, TxnStatus::Active);
        if !self.is_active() {
            return false;
        }
        self.status = outcome;
        true
    }
}

/// Lock a mutex, recovering the guard if a previous holder panicked.
///
/// The guarded state only ever moves forward through [`Lifecycle`], so a
/// poisoned lock still holds a consistent value.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
