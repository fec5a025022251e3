//! Single-flight coordination of token refreshes.
//!
//! The first caller that needs a refresh becomes the leader and performs it.
//! Callers arriving while the leader is busy are queued in arrival order and
//! all receive the leader's outcome when it settles. The queue is drained
//! exactly once per refresh.
//!
//! Every successful refresh bumps an epoch. A caller that observed an older
//! epoch before sending its request already has a newer token available and
//! is told to replay instead of refreshing again.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::ApiError;

/// Result of a refresh: the new access token, or why there is none.
pub type RefreshOutcome = Result<String, ApiError>;

enum GateState {
    Idle,
    Refreshing(VecDeque<oneshot::Sender<RefreshOutcome>>),
}

struct Inner {
    state: GateState,
    epoch: u64,
    refreshes: u64,
}

/// Guarantees at most one refresh in flight per gate.
pub struct RefreshGate {
    inner: Mutex<Inner>,
}

/// What a caller should do after [`RefreshGate::enter`].
pub enum Ticket<'a> {
    /// Perform the refresh, then call [`Leader::settle`].
    Leader(Leader<'a>),
    /// Another caller is refreshing; wait for its outcome.
    Follower(Waiter),
    /// A refresh completed since the caller's epoch; replay with the
    /// current token.
    Superseded,
}

impl RefreshGate {
    /// Creates an idle gate.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: GateState::Idle,
                epoch: 0,
                refreshes: 0,
            }),
        }
    }

    /// Returns the current epoch. Read it before reading the access token
    /// that a request is sent with.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.inner.lock().epoch
    }

    /// Joins the refresh protocol for a request sent at `seen_epoch`.
    pub fn enter(&self, seen_epoch: u64) -> Ticket<'_> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        if let GateState::Refreshing(queue) = &mut inner.state {
            let (tx, rx) = oneshot::channel();
            queue.push_back(tx);
            return Ticket::Follower(Waiter(rx));
        }
        if inner.epoch != seen_epoch {
            return Ticket::Superseded;
        }

        inner.state = GateState::Refreshing(VecDeque::new());
        inner.refreshes += 1;
        Ticket::Leader(Leader {
            gate: self,
            settled: false,
        })
    }

    /// Returns true while a refresh is in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        matches!(self.inner.lock().state, GateState::Refreshing(_))
    }

    /// Number of callers waiting on the current refresh.
    #[must_use]
    pub fn waiting(&self) -> usize {
        match &self.inner.lock().state {
            GateState::Refreshing(queue) => queue.len(),
            GateState::Idle => 0,
        }
    }

    /// Number of refreshes started over the gate's lifetime.
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.inner.lock().refreshes
    }

    fn release(&self, outcome: Option<&RefreshOutcome>) -> usize {
        let queue = {
            let mut inner = self.inner.lock();
            if matches!(outcome, Some(Ok(_))) {
                inner.epoch += 1;
            }
            match std::mem::replace(&mut inner.state, GateState::Idle) {
                GateState::Refreshing(queue) => queue,
                GateState::Idle => VecDeque::new(),
            }
        };

        let released = queue.len();
        for waiter in queue {
            if let Some(outcome) = outcome {
                // The waiter may have been dropped; nothing to deliver then.
                let _ = waiter.send(outcome.clone());
            }
        }
        released
    }
}

impl Default for RefreshGate {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RefreshGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("RefreshGate")
            .field("refreshing", &matches!(inner.state, GateState::Refreshing(_)))
            .field("epoch", &inner.epoch)
            .field("refreshes", &inner.refreshes)
            .finish()
    }
}

/// Held by the caller performing the refresh.
///
/// Dropping it without settling returns the gate to idle and rejects every
/// waiter, so an abandoned refresh never leaves callers hanging.
pub struct Leader<'a> {
    gate: &'a RefreshGate,
    settled: bool,
}

impl Leader<'_> {
    /// Publishes the outcome to all waiters in arrival order and returns the
    /// gate to idle. Returns how many waiters were released.
    pub fn settle(mut self, outcome: &RefreshOutcome) -> usize {
        self.settled = true;
        self.gate.release(Some(outcome))
    }
}

impl Drop for Leader<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!("token refresh abandoned before completion");
            self.gate.release(None);
        }
    }
}

/// Receives the outcome of a refresh started by another caller.
pub struct Waiter(oneshot::Receiver<RefreshOutcome>);

impl Waiter {
    /// Waits for the leader to settle.
    ///
    /// # Errors
    ///
    /// Returns the refresh error, or `AuthorizationFailed` if the refresh was
    /// abandoned.
    pub async fn wait(self) -> RefreshOutcome {
        self.0.await.unwrap_or_else(|_| {
            Err(ApiError::AuthorizationFailed {
                message: "token refresh was abandoned".to_string(),
            })
        })
    }
}
