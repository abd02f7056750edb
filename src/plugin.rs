//! Core plugin implementation for bevy_adaptive_quality.
//!
//! This module contains the main [`AdaptiveQualityPlugin`], its setup logic and
//! the [`PerfMonitorAppExt`] helpers for wiring host adapters into an [`App`].

use bevy::{
    app::{App, Plugin, Startup, Update},
    diagnostic::{Diagnostic, RegisterDiagnostic},
    log::warn,
    prelude::IntoScheduleConfigs,
    window::{WindowOccluded, WindowPlugin},
};

use crate::{
    config::AdaptiveQualitySettings,
    device::{classify, DeviceProfile, GpuPatternTable},
    events::PerfEvent,
    monitor::PerformanceMonitor,
    providers::{HeapProbe, SystemHostSignals},
    resources::{ContextSignal, HeapProbeSlot, QualityCommand, RenderContextSlot},
    systems::{
        apply_quality_commands, handle_context_signals, poll_memory, poll_render_context,
        publish_diagnostics, sample_frames, start_monitoring, track_window_visibility,
        AVERAGE_FPS, QUALITY_INDEX,
    },
    watchdog::RenderContext,
};

/// Main plugin for adaptive rendering quality.
///
/// Classifies the device once while the app is built, inserts a
/// [`PerformanceMonitor`] resource and registers the systems that sample the
/// frame rate and walk the quality ladder.
///
/// # Example
///
/// ```no_run
/// use bevy::prelude::*;
/// use bevy_adaptive_quality::AdaptiveQualityPlugin;
///
/// let mut app = App::new();
/// app.add_plugins(DefaultPlugins);
/// app.add_plugins(AdaptiveQualityPlugin::default());
/// app.run();
/// ```
#[derive(Default)]
pub struct AdaptiveQualityPlugin {
    settings: AdaptiveQualitySettings,
    profile: Option<DeviceProfile>,
}

impl AdaptiveQualityPlugin {
    pub fn new(settings: AdaptiveQualitySettings) -> Self {
        Self {
            settings,
            profile: None,
        }
    }

    /// Skip host classification and use `profile` as-is.
    pub fn with_device_profile(mut self, profile: DeviceProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    fn effective_settings(&self) -> AdaptiveQualitySettings {
        match self.settings.validate() {
            Ok(()) => self.settings.clone(),
            Err(error) => {
                warn!("invalid adaptive quality settings, using defaults: {error}");
                AdaptiveQualitySettings::default()
            }
        }
    }
}

impl Plugin for AdaptiveQualityPlugin {
    fn build(&self, app: &mut App) {
        let settings = self.effective_settings();
        let profile = match &self.profile {
            Some(profile) => profile.clone(),
            None => {
                let patterns = settings
                    .patterns
                    .compile()
                    .unwrap_or_else(|_| GpuPatternTable::builtin());
                classify(&SystemHostSignals, &patterns)
            }
        };

        let monitor = PerformanceMonitor::new(&settings, profile);
        app.insert_resource(monitor)
            .insert_resource(settings)
            .add_event::<PerfEvent>()
            .add_event::<ContextSignal>()
            .add_event::<QualityCommand>()
            .register_diagnostic(Diagnostic::new(AVERAGE_FPS))
            .register_diagnostic(Diagnostic::new(QUALITY_INDEX));

        // Headless apps have no WindowPlugin to register the occlusion event
        if !app.is_plugin_added::<WindowPlugin>() {
            app.add_event::<WindowOccluded>();
        }

        if !app.world().contains_resource::<HeapProbeSlot>() {
            app.insert_resource(HeapProbeSlot::default());
        }

        app.add_systems(Startup, start_monitoring).add_systems(
            Update,
            (
                track_window_visibility,
                apply_quality_commands,
                handle_context_signals,
                sample_frames,
                poll_render_context,
                poll_memory,
                publish_diagnostics,
            )
                .chain(),
        );
    }
}

/// App extension methods for plugging host adapters in.
pub trait PerfMonitorAppExt {
    /// Let the watchdog observe `context`. Passing `None` records that the
    /// host could not create one, which is reported as
    /// [`PerfEvent::NotSupported`] on startup.
    fn watch_render_context<C: RenderContext>(&mut self, context: Option<C>) -> &mut Self;

    /// Replace the default process memory probe.
    fn set_heap_probe<P: HeapProbe>(&mut self, probe: P) -> &mut Self;
}

impl PerfMonitorAppExt for App {
    fn watch_render_context<C: RenderContext>(&mut self, context: Option<C>) -> &mut Self {
        let context = context.map(|c| Box::new(c) as Box<dyn RenderContext>);
        self.insert_resource(RenderContextSlot::new(context))
    }

    fn set_heap_probe<P: HeapProbe>(&mut self, probe: P) -> &mut Self {
        self.insert_resource(HeapProbeSlot::new(probe))
    }
}
