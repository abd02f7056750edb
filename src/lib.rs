//! Device-adaptive rendering quality for Bevy apps.
//!
//! The crate classifies the host once at startup, picks a rung on a fixed
//! five-step quality ladder, and then walks that ladder up or down from the
//! measured frame rate. It also watches the rendering context for loss and
//! tries to restore it, and checks heap pressure on an interval.
//!
//! Everything is driven by the [`PerformanceMonitor`] resource. Apps read the
//! active [`QualityPreset`] from it and react to [`PerfEvent`]s, either as
//! regular Bevy events or through [`PerformanceMonitor::subscribe`].
//!
//! ```no_run
//! use bevy::prelude::*;
//! use bevy_adaptive_quality::{AdaptiveQualityPlugin, PerfEvent, PerformanceMonitor};
//!
//! fn react(mut events: EventReader<PerfEvent>, monitor: Res<PerformanceMonitor>) {
//!     for event in events.read() {
//!         if let PerfEvent::QualityChanged(change) = event {
//!             info!("now rendering at {}", change.to.label());
//!             let _shadows = monitor.settings().shadows;
//!         }
//!     }
//! }
//!
//! App::new()
//!     .add_plugins((DefaultPlugins, AdaptiveQualityPlugin::default()))
//!     .add_systems(Update, react)
//!     .run();
//! ```

mod config;
pub mod constants;
mod device;
mod error;
mod events;
mod memory;
mod monitor;
mod plugin;
mod providers;
mod quality;
mod resources;
mod sampler;
mod systems;
mod watchdog;

pub use config::{
    AdaptiveQualitySettings, MemorySettings, SamplerSettings, SelectorSettings, WatchdogSettings,
};
pub use device::{
    classify, AnimationBudget, DeviceProfile, DeviceTier, GpuPatternSet, GpuPatternTable, GpuTier,
    MobileClass,
};
pub use error::{ConfigError, ContextError};
pub use events::{PerfEvent, PerfEventBus, Subscription};
pub use memory::{MemoryMonitor, MemoryPressure};
pub use monitor::{PerformanceMonitor, PerformanceReport};
pub use plugin::{AdaptiveQualityPlugin, PerfMonitorAppExt};
pub use providers::{
    HeapProbe, HeapUsage, HostSignals, NoHeapProbe, ProbeSurface, ProcessMemoryProbe,
    StaticHostSignals, SystemHostSignals,
};
pub use quality::{
    adjusted_preset, initial_tier, AdjustmentState, AnimationQuality, AntialiasingMode,
    ChangeReason, QualityChange, QualityPreset, QualitySelector, QualityTier, SceneRole,
    QUALITY_LADDER,
};
pub use resources::{ContextSignal, HeapProbeSlot, QualityCommand, RenderContextSlot};
pub use sampler::{
    FpsHistory, FpsReading, FpsSample, FrameRateSampler, PerformanceLevel, PerformanceLevelTracker,
};
pub use systems::{AVERAGE_FPS, QUALITY_INDEX};
pub use watchdog::{ContextState, ContextWatchdog, RenderContext};
