//! Request gating: debounce plus at-most-one-current-result.
//!
//! Every [`RequestGate::dispatch`] mints a new [`RequestToken`]. Only the
//! completion carrying the latest token may touch visible state; everything
//! else is dropped by the owner after a [`RequestGate::is_current`] check.
//!
//! ```text
//! dispatch(t=1, 300ms) ─┐ timer (aborted)
//! dispatch(t=2, 300ms) ─┴─ timer ── Started(2) ── op ── Finished(2)  ✓ applied
//! dispatch(t=3, 0ms)   ──────────── op ──────────────── Finished(3)  ✓ applied
//!                                                       Finished(2)  ✗ stale
//! ```
//!
//! Debounced dispatches sit in a timer task. A newer dispatch aborts that
//! timer outright, so only the last call in a burst ever runs. Once a timer
//! fires, the operation moves to its own detached task and is never aborted;
//! superseding it only suppresses its effect.
//!
//! Completions come back over a channel and are consumed on the owner's task
//! through [`RequestGate::next_event`], so the owner is the only thing that
//! ever mutates state.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Identifies one dispatch. Strictly increasing per gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// What the gate reports back to its owner.
#[derive(Debug)]
pub enum GateEvent<T> {
    /// A debounced dispatch's timer fired and its operation is now running.
    Started(RequestToken),
    /// An operation resolved. May be stale; check with `is_current`.
    Finished { token: RequestToken, output: T },
}

/// Counts spawned work that has not finished yet.
#[derive(Default)]
struct Outstanding {
    count: AtomicUsize,
    changed: Notify,
}

/// Held by every spawned task; dropped when the task ends or is aborted.
struct WorkGuard(Arc<Outstanding>);

impl WorkGuard {
    fn new(outstanding: &Arc<Outstanding>) -> Self {
        outstanding.count.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(outstanding))
    }
}

impl Drop for WorkGuard {
    fn drop(&mut self) {
        self.0.count.fetch_sub(1, Ordering::SeqCst);
        self.0.changed.notify_one();
    }
}

/// Serialises overlapping requests so only the freshest result is applied.
///
/// Must be used from within a Tokio runtime.
pub struct RequestGate<T> {
    current: u64,
    timer: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<GateEvent<T>>,
    rx: mpsc::UnboundedReceiver<GateEvent<T>>,
    outstanding: Arc<Outstanding>,
}

impl<T: Send + 'static> Default for RequestGate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> RequestGate<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            current: 0,
            timer: None,
            tx,
            rx,
            outstanding: Arc::new(Outstanding::default()),
        }
    }

    /// The most recently minted token.
    pub fn current(&self) -> RequestToken {
        RequestToken(self.current)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.current
    }

    /// True while a timer, operation or undelivered event is outstanding.
    pub fn has_outstanding(&self) -> bool {
        self.outstanding.count.load(Ordering::SeqCst) > 0 || !self.rx.is_empty()
    }

    /// Schedule `operation`, superseding everything dispatched before.
    ///
    /// With a zero `delay` the operation starts right away and no
    /// [`GateEvent::Started`] is sent; the caller knows it is running. With a
    /// non-zero `delay` it starts once `delay` passes without another
    /// dispatch.
    pub fn dispatch<F>(&mut self, delay: Duration, operation: F) -> RequestToken
    where
        F: Future<Output = T> + Send + 'static,
    {
        self.cancel_timer();
        self.current += 1;
        let token = RequestToken(self.current);
        let tx = self.tx.clone();
        let guard = WorkGuard::new(&self.outstanding);

        if delay.is_zero() {
            debug!("Dispatching request {} immediately", token.0);
            tokio::spawn(run(token, operation, tx, guard));
        } else {
            debug!("Scheduling request {} after {:?}", token.0, delay);
            self.timer = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                // Nothing below awaits, so an abort can no longer land.
                let _ = tx.send(GateEvent::Started(token));
                tokio::spawn(run(token, operation, tx, guard));
            }));
        }
        token
    }

    /// Supersede everything outstanding without dispatching anything new.
    ///
    /// Pending timers are cancelled; in-flight operations keep running but
    /// their completions will no longer be current.
    pub fn invalidate(&mut self) -> RequestToken {
        self.cancel_timer();
        self.current += 1;
        trace!("Invalidated requests up to {}", self.current);
        RequestToken(self.current)
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once nothing is outstanding and every event has been
    /// delivered. A hung operation keeps this pending forever.
    pub async fn next_event(&mut self) -> Option<GateEvent<T>> {
        loop {
            if let Ok(event) = self.rx.try_recv() {
                return Some(event);
            }
            if self.outstanding.count.load(Ordering::SeqCst) == 0 {
                // Tasks send before their guard drops; anything sent is visible now.
                return self.rx.try_recv().ok();
            }
            let changed = self.outstanding.changed.notified();
            tokio::select! {
                event = self.rx.recv() => return event,
                _ = changed => continue,
            }
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            if !timer.is_finished() {
                trace!("Cancelling debounce timer for request {}", self.current);
            }
            timer.abort();
        }
    }
}

impl<T> Drop for RequestGate<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

async fn run<T, F>(
    token: RequestToken,
    operation: F,
    tx: mpsc::UnboundedSender<GateEvent<T>>,
    guard: WorkGuard,
) where
    F: Future<Output = T>,
{
    let output = operation.await;
    let _ = tx.send(GateEvent::Finished { token, output });
    drop(guard);
}
