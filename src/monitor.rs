//! The composition root that ties sampling, selection and recovery together.
//!
//! [`PerformanceMonitor`] is built once by the plugin from the settings and the
//! classified device profile and lives as a Bevy resource. Every entry point
//! updates internal state first and then publishes the resulting events, so a
//! listener that reads the monitor back always sees the post-update values.

use bevy::{log::info, prelude::Resource};
use serde::Serialize;
use std::time::Duration;

use crate::{
    config::AdaptiveQualitySettings,
    device::DeviceProfile,
    events::{PerfEvent, PerfEventBus, Subscription},
    memory::MemoryMonitor,
    providers::{HeapProbe, HeapUsage},
    quality::{AdjustmentState, QualityPreset, QualitySelector, QualityTier, SceneRole},
    sampler::{FpsSample, FrameRateSampler, PerformanceLevel, PerformanceLevelTracker},
    watchdog::{ContextState, ContextWatchdog, RenderContext},
};

/// Owns the whole adaptive quality loop for one app.
#[derive(Resource, Debug)]
pub struct PerformanceMonitor {
    profile: DeviceProfile,
    sampler: FrameRateSampler,
    levels: PerformanceLevelTracker,
    selector: QualitySelector,
    memory: MemoryMonitor,
    watchdog: ContextWatchdog,
    bus: PerfEventBus,
    monitoring: bool,
    visible: bool,
}

impl PerformanceMonitor {
    pub fn new(settings: &AdaptiveQualitySettings, profile: DeviceProfile) -> Self {
        let selector = QualitySelector::new(settings.selector, profile.clone());
        info!(
            "device classified as {:?} ({} cores, {:.1} GB, mobile: {}, gpu: {:?}); starting at {}",
            profile.device_tier,
            profile.logical_cores,
            profile.approx_memory_gb,
            profile.is_mobile,
            profile.gpu_tier,
            selector.current_quality().label()
        );

        Self {
            sampler: FrameRateSampler::new(&settings.sampler),
            levels: PerformanceLevelTracker::new(&settings.sampler),
            selector,
            memory: MemoryMonitor::new(settings.memory),
            watchdog: ContextWatchdog::new(settings.watchdog),
            bus: PerfEventBus::new(),
            profile,
            monitoring: false,
            visible: true,
        }
    }

    /// Register a listener for every event this monitor publishes.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&PerfEvent) + Send + 'static,
    {
        self.bus.subscribe(listener)
    }

    /// The listener bus, for sharing with code that only needs to subscribe.
    pub fn bus(&self) -> &PerfEventBus {
        &self.bus
    }

    /// Begin frame sampling and memory checks. No-op when already running.
    pub fn start_monitoring(&mut self, now: Duration) -> bool {
        if self.monitoring {
            return false;
        }
        self.monitoring = true;
        if self.visible {
            self.sampler.start(now);
        }
        self.memory.start(now);
        true
    }

    /// Halt frame sampling and memory checks. Safe to call when stopped.
    pub fn stop_monitoring(&mut self) -> bool {
        let was_monitoring = self.monitoring;
        self.monitoring = false;
        self.sampler.stop();
        self.memory.stop();
        was_monitoring
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    /// Count one rendered frame, adjusting quality when a reading is flushed.
    pub fn record_frame(&mut self, now: Duration) -> Vec<PerfEvent> {
        let Some(reading) = self.sampler.record_frame(now) else {
            return Vec::new();
        };

        // Only a worsening level is reported; recoveries are silent.
        let previous = self.levels.level();
        let transition = self
            .levels
            .observe(reading.average_fps)
            .filter(|level| *level > previous);
        let change = self.selector.on_fps_sample(reading.average_fps, now);

        let mut events = vec![PerfEvent::Fps {
            fps: reading.fps,
            average_fps: reading.average_fps,
            level: self.levels.level(),
            quality: self.selector.current_quality(),
        }];
        match transition {
            Some(PerformanceLevel::Low) => events.push(PerfEvent::PerformanceDegraded {
                average_fps: reading.average_fps,
            }),
            Some(PerformanceLevel::Critical) => events.push(PerfEvent::PerformanceCritical {
                average_fps: reading.average_fps,
            }),
            Some(PerformanceLevel::High) | None => {}
        }
        if let Some(change) = change {
            info!(
                "quality {:?} from {} to {}",
                change.reason,
                change.from.label(),
                change.to.label()
            );
            events.push(PerfEvent::QualityChanged(change));
        }

        self.publish(events)
    }

    /// Run a heap probe if one is due.
    pub fn check_memory(&mut self, now: Duration, probe: &mut dyn HeapProbe) -> Vec<PerfEvent> {
        if !self.monitoring {
            return Vec::new();
        }
        let events = self.memory.poll(now, probe).into_iter().collect();
        self.publish(events)
    }

    /// Start watching a rendering context, or report that there is none.
    pub fn attach_context(
        &mut self,
        context: Option<&dyn RenderContext>,
        now: Duration,
    ) -> Vec<PerfEvent> {
        let events = self.watchdog.attach(context, now);
        self.publish(events)
    }

    /// Explicit loss signal from the host.
    pub fn context_lost(
        &mut self,
        now: Duration,
        context: &mut dyn RenderContext,
    ) -> Vec<PerfEvent> {
        let events = self.watchdog.context_lost(now, context);
        let events = self.degrade_on_loss(events, now);
        self.publish(events)
    }

    /// Explicit restore signal from the host.
    pub fn context_restored(&mut self, now: Duration) -> Vec<PerfEvent> {
        let events = self.watchdog.context_restored(now);
        self.publish(events)
    }

    /// Run due restore attempts and health checks.
    pub fn poll_context(
        &mut self,
        now: Duration,
        context: &mut dyn RenderContext,
    ) -> Vec<PerfEvent> {
        let events = self.watchdog.poll(now, context);
        let events = self.degrade_on_loss(events, now);
        self.publish(events)
    }

    /// Pause sampling while the output surface is hidden.
    ///
    /// Frames are not presented while hidden, so counting across the gap would
    /// produce a bogus low reading when the surface comes back.
    pub fn set_visible(&mut self, visible: bool, now: Duration) -> Vec<PerfEvent> {
        if visible == self.visible {
            return Vec::new();
        }
        self.visible = visible;

        let event = if visible {
            if self.monitoring {
                self.sampler.start(now);
            }
            PerfEvent::SurfaceVisible
        } else {
            self.sampler.stop();
            PerfEvent::SurfaceHidden
        };
        self.publish(vec![event])
    }

    /// Manual quality override.
    pub fn force_quality(&mut self, tier: QualityTier, now: Duration) -> Vec<PerfEvent> {
        let change = self.selector.force_quality(tier, now);
        self.publish(vec![PerfEvent::QualityChanged(change)])
    }

    /// Toggle automatic adjustment; disabling returns to the starting tier.
    pub fn set_adaptive(&mut self, enabled: bool) -> Vec<PerfEvent> {
        let events = self
            .selector
            .set_adaptive(enabled)
            .map(PerfEvent::QualityChanged)
            .into_iter()
            .collect();
        self.publish(events)
    }

    /// Copy of the active preset with device clamps applied.
    pub fn settings(&self) -> QualityPreset {
        self.selector.settings()
    }

    pub fn current_quality(&self) -> QualityTier {
        self.selector.current_quality()
    }

    pub fn tier_for_role(&self, role: SceneRole) -> QualityTier {
        self.selector.tier_for_role(role)
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn average_fps(&self) -> f32 {
        self.sampler.average_fps()
    }

    pub fn current_fps(&self) -> Option<u32> {
        self.sampler.current_fps()
    }

    pub fn performance_level(&self) -> PerformanceLevel {
        self.levels.level()
    }

    pub fn adjustment_state(&self) -> AdjustmentState {
        self.selector.adjustment_state()
    }

    pub fn context_state(&self) -> ContextState {
        self.watchdog.state()
    }

    /// Serializable snapshot of everything the monitor knows.
    pub fn report(&self) -> PerformanceReport {
        PerformanceReport {
            profile: self.profile.clone(),
            quality: self.current_quality(),
            settings: self.settings(),
            adjustment: self.adjustment_state(),
            adaptive: self.selector.is_adaptive(),
            monitoring: self.monitoring,
            current_fps: self.current_fps(),
            average_fps: self.average_fps(),
            level: self.performance_level(),
            fps_history: self.sampler.history().iter().copied().collect(),
            memory_history: self.memory.history().copied().collect(),
            context: self.context_state(),
        }
    }

    fn degrade_on_loss(&mut self, mut events: Vec<PerfEvent>, now: Duration) -> Vec<PerfEvent> {
        if events.contains(&PerfEvent::ContextLost) {
            if let Some(change) = self.selector.force_lowest(now) {
                events.push(PerfEvent::QualityChanged(change));
            }
        }
        events
    }

    fn publish(&self, events: Vec<PerfEvent>) -> Vec<PerfEvent> {
        for event in &events {
            self.bus.publish(event);
        }
        events
    }
}

/// Point-in-time snapshot produced by [`PerformanceMonitor::report`].
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub profile: DeviceProfile,
    pub quality: QualityTier,
    pub settings: QualityPreset,
    pub adjustment: AdjustmentState,
    pub adaptive: bool,
    pub monitoring: bool,
    pub current_fps: Option<u32>,
    pub average_fps: f32,
    pub level: PerformanceLevel,
    pub fps_history: Vec<FpsSample>,
    pub memory_history: Vec<HeapUsage>,
    pub context: ContextState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{device::GpuTier, error::ContextError, quality::ChangeReason};
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct BrokenContext;

    impl RenderContext for BrokenContext {
        fn check_health(&self) -> Result<(), ContextError> {
            Err(ContextError::Lost)
        }

        fn try_restore(&mut self) -> bool {
            false
        }
    }

    fn monitor() -> PerformanceMonitor {
        PerformanceMonitor::new(
            &AdaptiveQualitySettings::default(),
            DeviceProfile::new(8, 16.0, false, GpuTier::Unknown, 1.0),
        )
    }

    /// Feed `frames` evenly spaced frames across one second starting at `start_ms`.
    fn run_second(monitor: &mut PerformanceMonitor, start_ms: u64, frames: u64) -> Vec<PerfEvent> {
        (0..frames)
            .flat_map(|i| monitor.record_frame(Duration::from_millis(start_ms + i * 1000 / frames)))
            .collect()
    }

    #[test]
    fn slow_frames_downgrade_and_publish() {
        let mut monitor = monitor();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = monitor.subscribe(move |event| sink.lock().push(event.clone()));

        monitor.start_monitoring(Duration::ZERO);
        run_second(&mut monitor, 0, 20);
        let events = run_second(&mut monitor, 1000, 20);

        assert!(matches!(events[0], PerfEvent::Fps { fps: 20, .. }));
        assert!(events.contains(&PerfEvent::PerformanceCritical { average_fps: 20.0 }));
        assert!(events.iter().any(|e| matches!(
            e,
            PerfEvent::QualityChanged(change) if change.reason == ChangeReason::Downgrade
        )));
        assert_eq!(monitor.current_quality(), QualityTier::Medium);
        assert_eq!(*seen.lock(), events);
    }

    #[test]
    fn recovering_from_critical_is_not_reported_as_degraded() {
        let mut monitor = monitor();
        monitor.start_monitoring(Duration::ZERO);
        run_second(&mut monitor, 0, 20);
        let events = run_second(&mut monitor, 1000, 60);
        assert!(events.contains(&PerfEvent::PerformanceCritical { average_fps: 20.0 }));

        // History [20, 60] averages 40: Low, but better than Critical.
        let events = run_second(&mut monitor, 2000, 60);
        assert_eq!(monitor.performance_level(), PerformanceLevel::Low);
        assert!(matches!(events[0], PerfEvent::Fps { fps: 60, .. }));
        assert!(!events
            .iter()
            .any(|e| matches!(e, PerfEvent::PerformanceDegraded { .. })));
    }

    #[test]
    fn listener_observes_updated_state() {
        let mut monitor = monitor();
        let observed = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&observed);
        let _subscription = monitor.subscribe(move |event| {
            if let PerfEvent::QualityChanged(change) = event {
                *sink.lock() = Some(change.to);
            }
        });

        monitor.force_quality(QualityTier::Low, Duration::ZERO);
        assert_eq!(*observed.lock(), Some(monitor.current_quality()));
    }

    #[test]
    fn context_loss_forces_lowest_tier() {
        let mut monitor = monitor();
        let mut context = BrokenContext;
        monitor.attach_context(Some(&context), Duration::ZERO);

        let events = monitor.poll_context(Duration::from_secs(5), &mut context);

        assert_eq!(events[0], PerfEvent::ContextLost);
        assert_eq!(monitor.current_quality(), QualityTier::Minimal);
        assert!(matches!(
            &events[1],
            PerfEvent::QualityChanged(change) if change.reason == ChangeReason::ContextLoss
        ));
    }

    #[test]
    fn hidden_surface_pauses_sampling() {
        let mut monitor = monitor();
        monitor.start_monitoring(Duration::ZERO);
        run_second(&mut monitor, 0, 60);

        assert_eq!(
            monitor.set_visible(false, Duration::from_millis(1000)),
            vec![PerfEvent::SurfaceHidden]
        );
        assert!(monitor.record_frame(Duration::from_secs(30)).is_empty());
        assert_eq!(
            monitor.set_visible(true, Duration::from_secs(30)),
            vec![PerfEvent::SurfaceVisible]
        );
        assert!(monitor.set_visible(true, Duration::from_secs(30)).is_empty());

        let events = run_second(&mut monitor, 30_000, 60);
        assert!(events.is_empty());
        let events = run_second(&mut monitor, 31_000, 60);
        assert!(matches!(events[0], PerfEvent::Fps { fps: 60, .. }));
    }

    #[test]
    fn stop_monitoring_is_idempotent() {
        let mut monitor = monitor();
        assert!(!monitor.stop_monitoring());
        assert!(monitor.start_monitoring(Duration::ZERO));
        assert!(!monitor.start_monitoring(Duration::ZERO));
        assert!(monitor.stop_monitoring());
        assert!(!monitor.stop_monitoring());
        assert!(monitor.record_frame(Duration::from_secs(10)).is_empty());
    }

    #[test]
    fn report_serializes() {
        let mut monitor = monitor();
        monitor.start_monitoring(Duration::ZERO);
        run_second(&mut monitor, 0, 60);
        run_second(&mut monitor, 1000, 60);

        let json = serde_json::to_value(monitor.report()).unwrap();
        assert_eq!(json["quality"], "High");
        assert_eq!(json["fps_history"].as_array().unwrap().len(), 1);
        assert_eq!(json["context"], "Detached");
    }
}
