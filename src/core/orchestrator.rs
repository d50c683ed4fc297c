//! Subscription orchestration.
//!
//! [`compose`] starts several independent live subscriptions, keeps the latest
//! snapshot of each in its own slot, and re-runs a reducer over all slots on
//! every push. The derived value is published on a `tokio::sync::watch`
//! channel.
//!
//! Slots start out as `S::default()`, so the reducer runs (and publishes)
//! before every source has delivered; early values may undercount.
//! [`Composed::is_warm`] tells callers when every slot holds real data.
//! There is no ordering between sources, only per-source snapshot order.

use crate::store::{OnChange, Source, Unsubscribe};
use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::watch;
use tracing::{debug, trace};

struct Slots<S> {
    latest: Vec<S>,
    delivered: Vec<bool>,
    cancelled: bool,
}

/// Handle to a running composition.
///
/// Dropping the handle cancels it.
pub struct Composed<D> {
    derived: watch::Receiver<D>,
    unsubscribers: Mutex<Vec<Unsubscribe>>,
    close: Box<dyn Fn() + Send + Sync>,
    warm: Arc<AtomicUsize>,
    sources: usize,
}

impl<D> Composed<D> {
    /// Receiver for the derived state. Each reducer run replaces the value.
    #[must_use]
    pub fn derived(&self) -> watch::Receiver<D> {
        self.derived.clone()
    }

    /// Latest derived value.
    #[must_use]
    pub fn current(&self) -> D
    where
        D: Clone,
    {
        self.derived.borrow().clone()
    }

    /// Whether every source has delivered at least one snapshot.
    #[must_use]
    pub fn is_warm(&self) -> bool {
        self.warm.load(Ordering::Acquire) == self.sources
    }

    /// Stops the composition: every underlying subscription is torn down
    /// exactly once and no reducer run starts afterwards. Safe to call again.
    pub fn cancel(&self) {
        (self.close)();

        let pending: Vec<Unsubscribe> = self
            .unsubscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        if !pending.is_empty() {
            debug!(subscriptions = pending.len(), "Cancelling composition");
        }
        for unsubscribe in pending {
            unsubscribe();
        }
    }
}

impl<D> Drop for Composed<D> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Composes `sources` into one derived value computed by `reducer`.
///
/// The reducer sees one slot per source, in the order the sources were given.
pub fn compose<S, D, R>(sources: Vec<Source<S>>, reducer: R) -> Composed<D>
where
    S: Default + Send + 'static,
    D: Send + Sync + 'static,
    R: Fn(&[S]) -> D + Send + Sync + 'static,
{
    let count = sources.len();
    let slots = Arc::new(Mutex::new(Slots {
        latest: std::iter::repeat_with(S::default).take(count).collect(),
        delivered: vec![false; count],
        cancelled: false,
    }));
    let reducer = Arc::new(reducer);
    let warm = Arc::new(AtomicUsize::new(0));

    let initial = {
        let guard = slots.lock().unwrap_or_else(PoisonError::into_inner);
        reducer(&guard.latest)
    };
    let (sender, derived) = watch::channel(initial);
    let sender = Arc::new(sender);

    let mut unsubscribers = Vec::with_capacity(count);
    for (index, source) in sources.into_iter().enumerate() {
        let slots = Arc::clone(&slots);
        let reducer = Arc::clone(&reducer);
        let sender = Arc::clone(&sender);
        let warm = Arc::clone(&warm);

        let on_change: OnChange<S> = Box::new(move |snapshot: S| {
            let mut guard = slots.lock().unwrap_or_else(PoisonError::into_inner);
            if guard.cancelled {
                trace!(slot = index, "Dropping snapshot delivered after cancel");
                return;
            }
            guard.latest[index] = snapshot;
            if !guard.delivered[index] {
                guard.delivered[index] = true;
                warm.fetch_add(1, Ordering::AcqRel);
            }
            let next = reducer(&guard.latest);
            sender.send_replace(next);
        });

        unsubscribers.push(source(on_change));
    }

    let close_slots = Arc::clone(&slots);
    Composed {
        derived,
        unsubscribers: Mutex::new(unsubscribers),
        close: Box::new(move || {
            close_slots
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .cancelled = true;
        }),
        warm,
        sources: count,
    }
}
