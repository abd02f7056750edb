//! Runtime resources and events used by the plugin systems.
//!
//! Host adapters are stored here as trait objects so the systems can hand
//! them to the [`PerformanceMonitor`](crate::PerformanceMonitor) each frame.

use bevy::prelude::{Event, Resource};

use crate::{
    providers::{HeapProbe, ProcessMemoryProbe},
    quality::QualityTier,
    watchdog::RenderContext,
};

/// The rendering context the watchdog observes.
///
/// Only present when the app opted in through
/// [`PerfMonitorAppExt::watch_render_context`](crate::PerfMonitorAppExt::watch_render_context).
/// An empty slot means the host tried and failed to create a context.
#[derive(Resource, Default)]
pub struct RenderContextSlot {
    context: Option<Box<dyn RenderContext>>,
}

impl RenderContextSlot {
    pub fn new(context: Option<Box<dyn RenderContext>>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> Option<&(dyn RenderContext + 'static)> {
        self.context.as_deref()
    }

    pub fn context_mut(&mut self) -> Option<&mut (dyn RenderContext + 'static)> {
        self.context.as_deref_mut()
    }
}

/// Heap introspection used by the memory monitor.
#[derive(Resource)]
pub struct HeapProbeSlot {
    probe: Box<dyn HeapProbe>,
}

impl HeapProbeSlot {
    pub fn new<P: HeapProbe>(probe: P) -> Self {
        Self {
            probe: Box::new(probe),
        }
    }

    pub fn probe_mut(&mut self) -> &mut dyn HeapProbe {
        self.probe.as_mut()
    }
}

impl Default for HeapProbeSlot {
    fn default() -> Self {
        Self::new(ProcessMemoryProbe::default())
    }
}

/// Loss and restore notifications written by host adapters.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSignal {
    /// The host reported the rendering context as lost.
    Lost,
    /// The host reported the rendering context as restored.
    Restored,
}

/// Requests from UI code to change quality outside the heuristic.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityCommand {
    /// Switch to a tier and reset automatic adjustment bookkeeping.
    Force(QualityTier),
    /// Enable or disable automatic adjustment.
    SetAdaptive(bool),
}
