//! Typed performance events and the listener bus that delivers them.
//!
//! Events are published after the state they describe has been updated, so a
//! listener that queries the monitor from inside its callback sees the new
//! values. The same events are also written to Bevy's [`Events`] queue by the
//! plugin systems, for consumers that prefer an `EventReader`.
//!
//! [`Events`]: bevy::ecs::event::Events

use bevy::{log::warn, prelude::Event};
use parking_lot::Mutex;
use serde::Serialize;
use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Weak},
};

use crate::{
    providers::HeapUsage,
    quality::{QualityChange, QualityTier},
    sampler::PerformanceLevel,
};

/// Everything the adaptive quality layer reports to its consumers.
#[derive(Event, Debug, Clone, PartialEq, Serialize)]
pub enum PerfEvent {
    /// A new FPS reading was flushed.
    Fps {
        fps: u32,
        average_fps: f32,
        level: PerformanceLevel,
        quality: QualityTier,
    },
    /// The rolling average dropped into the low band.
    PerformanceDegraded { average_fps: f32 },
    /// The rolling average dropped into the critical band.
    PerformanceCritical { average_fps: f32 },
    /// Heap usage crossed the warning threshold.
    MemoryWarning(HeapUsage),
    /// Heap usage crossed the critical threshold.
    MemoryCritical(HeapUsage),
    /// The active quality tier changed.
    QualityChanged(QualityChange),
    /// The rendering context was lost.
    ContextLost,
    /// The rendering context is usable again.
    ContextRestored,
    /// Every restore attempt failed; no further attempts will be made.
    ContextRestoreFailed { attempts: u32 },
    /// No rendering context could be created at all.
    NotSupported,
    /// The output surface was hidden; sampling is paused.
    SurfaceHidden,
    /// The output surface is visible again; sampling resumed.
    SurfaceVisible,
}

impl PerfEvent {
    /// Stable kebab-case name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            PerfEvent::Fps { .. } => "fps",
            PerfEvent::PerformanceDegraded { .. } => "performance-degraded",
            PerfEvent::PerformanceCritical { .. } => "performance-critical",
            PerfEvent::MemoryWarning(_) => "memory-warning",
            PerfEvent::MemoryCritical(_) => "memory-critical",
            PerfEvent::QualityChanged(_) => "quality-changed",
            PerfEvent::ContextLost => "webgl-context-lost",
            PerfEvent::ContextRestored => "webgl-context-restored",
            PerfEvent::ContextRestoreFailed { .. } => "webgl-restore-failed",
            PerfEvent::NotSupported => "webgl-not-supported",
            PerfEvent::SurfaceHidden => "surface-hidden",
            PerfEvent::SurfaceVisible => "surface-visible",
        }
    }
}

type Listener = Box<dyn FnMut(&PerfEvent) + Send>;

struct Slot {
    id: u64,
    listener: Arc<Mutex<Listener>>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    slots: Vec<Slot>,
}

impl Registry {
    fn contains(&self, id: u64) -> bool {
        self.slots.iter().any(|slot| slot.id == id)
    }
}

/// Observer registry for [`PerfEvent`]s.
///
/// Cloning the bus yields another handle to the same listener set.
#[derive(Clone, Default)]
pub struct PerfEventBus {
    registry: Arc<Mutex<Registry>>,
}

impl std::fmt::Debug for PerfEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerfEventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl PerfEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered until the returned
    /// [`Subscription`] is explicitly unsubscribed; dropping the handle does
    /// not remove it.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&PerfEvent) + Send + 'static,
    {
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.slots.push(Slot {
            id,
            listener: Arc::new(Mutex::new(Box::new(listener))),
        });

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver `event` to every registered listener.
    ///
    /// A listener that panics is logged and skipped; the remaining listeners
    /// still receive the event. Listeners removed while the event is being
    /// delivered do not receive it.
    pub fn publish(&self, event: &PerfEvent) {
        let snapshot: Vec<(u64, Arc<Mutex<Listener>>)> = {
            let registry = self.registry.lock();
            registry
                .slots
                .iter()
                .map(|slot| (slot.id, Arc::clone(&slot.listener)))
                .collect()
        };

        for (id, listener) in snapshot {
            if !self.registry.lock().contains(id) {
                continue;
            }
            // Held when a listener publishes from inside its own callback.
            let Some(mut callback) = listener.try_lock() else {
                warn!("skipping re-entrant delivery of {} to a busy listener", event.name());
                continue;
            };
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                let callback: &mut Listener = &mut callback;
                callback(event);
            }));
            if outcome.is_err() {
                warn!("{} listener panicked; continuing with remaining listeners", event.name());
            }
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.registry.lock().slots.len()
    }
}

/// Handle returned by [`PerfEventBus::subscribe`].
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Remove the listener. Idempotent, and safe to call from inside any
    /// listener, including the one being removed.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().slots.retain(|slot| slot.id != self.id);
        }
    }

    /// Whether the listener is still registered.
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.lock().contains(self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter(bus: &PerfEventBus) -> (Arc<AtomicUsize>, Subscription) {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        let subscription = bus.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (hits, subscription)
    }

    #[test]
    fn every_listener_receives_published_events() {
        let bus = PerfEventBus::new();
        let (a, _sa) = counter(&bus);
        let (b, _sb) = counter(&bus);

        bus.publish(&PerfEvent::ContextLost);
        bus.publish(&PerfEvent::ContextRestored);

        assert_eq!(a.load(Ordering::SeqCst), 2);
        assert_eq!(b.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let bus = PerfEventBus::new();
        let (hits, subscription) = counter(&bus);

        subscription.unsubscribe();
        subscription.unsubscribe();
        bus.publish(&PerfEvent::NotSupported);

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(!subscription.is_active());
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn panicking_listener_does_not_block_others() {
        let bus = PerfEventBus::new();
        let _faulty = bus.subscribe(|_| panic!("listener failure"));
        let (hits, _ok) = counter(&bus);

        bus.publish(&PerfEvent::SurfaceHidden);
        bus.publish(&PerfEvent::SurfaceVisible);

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(bus.listener_count(), 2);
    }

    #[test]
    fn listener_can_unsubscribe_itself_mid_notification() {
        let bus = PerfEventBus::new();
        let own: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let hits = Arc::new(AtomicUsize::new(0));

        let slot = Arc::clone(&own);
        let seen = Arc::clone(&hits);
        let subscription = bus.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            if let Some(me) = slot.lock().as_ref() {
                me.unsubscribe();
            }
        });
        *own.lock() = Some(subscription);

        bus.publish(&PerfEvent::ContextLost);
        bus.publish(&PerfEvent::ContextLost);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_removed_by_earlier_listener_is_skipped() {
        let bus = PerfEventBus::new();
        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let target = Arc::clone(&victim);
        let _remover = bus.subscribe(move |_| {
            if let Some(sub) = target.lock().as_ref() {
                sub.unsubscribe();
            }
        });
        let (hits, subscription) = counter(&bus);
        *victim.lock() = Some(subscription);

        bus.publish(&PerfEvent::ContextLost);
        bus.publish(&PerfEvent::ContextLost);

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(bus.listener_count(), 1);
    }

    #[test]
    fn subscription_outliving_bus_is_harmless() {
        let bus = PerfEventBus::new();
        let (_, subscription) = counter(&bus);
        drop(bus);

        subscription.unsubscribe();
        assert!(!subscription.is_active());
    }

    #[test]
    fn event_names_match_wire_names() {
        assert_eq!(PerfEvent::ContextLost.name(), "webgl-context-lost");
        assert_eq!(
            PerfEvent::PerformanceCritical { average_fps: 20.0 }.name(),
            "performance-critical"
        );
    }
}
