//! Advisory cancellation and timeout signal passed to every operation.
//!
//! Stores check the context before calling into their engine and give up with
//! [`KvError::Cancelled`] once it has been cancelled or its deadline has
//! passed. An engine call that is already running is not interrupted, and a
//! cancelled write is only rolled back if the enclosing transaction is
//! discarded.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use kvspace::Context;
//!
//! let ctx = Context::with_timeout(Duration::from_secs(5));
//! assert!(!ctx.is_cancelled());
//!
//! let child = ctx.clone();
//! ctx.cancel();
//! assert!(child.is_cancelled());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{KvError, KvResult};

/// Clones share the cancellation flag and the deadline.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled on its own.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel this context and every clone of it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::Acquire) {
            return true;
        }
        matches!(self.deadline, Some(deadline) if Instant::now() >= deadline)
    }

    /// Fails with [`KvError::Cancelled`] if the operation should not start.
    pub fn check(&self) -> KvResult<()> {
        if self.is_cancelled() {
            Err(KvError::Cancelled)
        } else {
            Ok(())
        }
    }
}
