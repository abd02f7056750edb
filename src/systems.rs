//! Core Bevy systems for the adaptive quality layer.
//!
//! - start_monitoring: attaches the watchdog and starts sampling on startup
//! - track_window_visibility: pauses sampling while the window is occluded
//! - apply_quality_commands / handle_context_signals: host and UI requests
//! - sample_frames: counts frames and adjusts quality
//! - poll_render_context / poll_memory: timestamp-driven periodic work
//! - publish_diagnostics: mirrors the state into Bevy's diagnostics store

use bevy::{
    diagnostic::{DiagnosticPath, Diagnostics},
    ecs::{
        event::{EventReader, EventWriter},
        system::{Res, ResMut},
    },
    time::{Real, Time},
    window::WindowOccluded,
};

use crate::{
    config::AdaptiveQualitySettings,
    events::PerfEvent,
    monitor::PerformanceMonitor,
    resources::{ContextSignal, HeapProbeSlot, QualityCommand, RenderContextSlot},
};

/// Rolling average FPS as seen by the quality selector.
pub const AVERAGE_FPS: DiagnosticPath = DiagnosticPath::const_new("adaptive_quality/average_fps");

/// Ladder index of the active quality tier (0 is the most expensive).
pub const QUALITY_INDEX: DiagnosticPath =
    DiagnosticPath::const_new("adaptive_quality/quality_index");

/// Attach the registered rendering context and start monitoring.
pub fn start_monitoring(
    settings: Res<AdaptiveQualitySettings>,
    time: Res<Time<Real>>,
    context: Option<Res<RenderContextSlot>>,
    mut monitor: ResMut<PerformanceMonitor>,
    mut events: EventWriter<PerfEvent>,
) {
    let now = time.elapsed();
    if let Some(slot) = context {
        events.write_batch(monitor.attach_context(slot.context(), now));
    }
    if settings.monitor_on_startup {
        monitor.start_monitoring(now);
    }
}

/// Pause sampling while the primary window is occluded.
pub fn track_window_visibility(
    time: Res<Time<Real>>,
    mut occlusion: EventReader<WindowOccluded>,
    mut monitor: ResMut<PerformanceMonitor>,
    mut events: EventWriter<PerfEvent>,
) {
    for occluded in occlusion.read() {
        events.write_batch(monitor.set_visible(!occluded.occluded, time.elapsed()));
    }
}

/// Apply manual quality overrides requested by the app.
pub fn apply_quality_commands(
    time: Res<Time<Real>>,
    mut commands: EventReader<QualityCommand>,
    mut monitor: ResMut<PerformanceMonitor>,
    mut events: EventWriter<PerfEvent>,
) {
    for command in commands.read() {
        let emitted = match *command {
            QualityCommand::Force(tier) => monitor.force_quality(tier, time.elapsed()),
            QualityCommand::SetAdaptive(enabled) => monitor.set_adaptive(enabled),
        };
        events.write_batch(emitted);
    }
}

/// Forward explicit loss/restore notifications to the watchdog.
pub fn handle_context_signals(
    time: Res<Time<Real>>,
    mut signals: EventReader<ContextSignal>,
    mut context: Option<ResMut<RenderContextSlot>>,
    mut monitor: ResMut<PerformanceMonitor>,
    mut events: EventWriter<PerfEvent>,
) {
    let now = time.elapsed();
    for signal in signals.read() {
        let emitted = match signal {
            ContextSignal::Lost => match context.as_mut().and_then(|slot| slot.context_mut()) {
                Some(render_context) => monitor.context_lost(now, render_context),
                None => Vec::new(),
            },
            ContextSignal::Restored => monitor.context_restored(now),
        };
        events.write_batch(emitted);
    }
}

/// Count this frame; emits readings and quality changes once per interval.
pub fn sample_frames(
    time: Res<Time<Real>>,
    mut monitor: ResMut<PerformanceMonitor>,
    mut events: EventWriter<PerfEvent>,
) {
    events.write_batch(monitor.record_frame(time.elapsed()));
}

/// Run due restore attempts and health checks.
pub fn poll_render_context(
    time: Res<Time<Real>>,
    context: Option<ResMut<RenderContextSlot>>,
    mut monitor: ResMut<PerformanceMonitor>,
    mut events: EventWriter<PerfEvent>,
) {
    let Some(mut slot) = context else {
        return;
    };
    if let Some(render_context) = slot.context_mut() {
        events.write_batch(monitor.poll_context(time.elapsed(), render_context));
    }
}

/// Run a heap probe when one is due.
pub fn poll_memory(
    time: Res<Time<Real>>,
    mut probe: ResMut<HeapProbeSlot>,
    mut monitor: ResMut<PerformanceMonitor>,
    mut events: EventWriter<PerfEvent>,
) {
    events.write_batch(monitor.check_memory(time.elapsed(), probe.probe_mut()));
}

/// Mirror the monitor's state into Bevy diagnostics for HUDs and loggers.
pub fn publish_diagnostics(monitor: Res<PerformanceMonitor>, mut diagnostics: Diagnostics) {
    diagnostics.add_measurement(&AVERAGE_FPS, || f64::from(monitor.average_fps()));
    diagnostics.add_measurement(&QUALITY_INDEX, || monitor.current_quality().index() as f64);
}
