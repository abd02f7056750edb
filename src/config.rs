//! Configuration structures for the bevy_adaptive_quality plugin.
//!
//! Every value defaults to the compiled-in constant of the same purpose in
//! [`crate::constants`]. Settings are fixed once the plugin is built; the
//! monitor does not pick up later edits to the resource.

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{constants::*, device::GpuPatternSet, error::ConfigError};

/// Main configuration resource for the adaptive quality layer.
///
/// # Example
/// ```rust
/// use bevy::prelude::*;
/// use bevy_adaptive_quality::{AdaptiveQualityPlugin, AdaptiveQualitySettings};
///
/// let mut settings = AdaptiveQualitySettings::default();
/// settings.selector.fps_threshold = 50.0;
///
/// App::new().add_plugins(AdaptiveQualityPlugin::new(settings));
/// ```
#[derive(Debug, Clone, PartialEq, Resource, Serialize, Deserialize)]
pub struct AdaptiveQualitySettings {
    /// Frame-rate sampling
    pub sampler: SamplerSettings,
    /// Ladder walking
    pub selector: SelectorSettings,
    /// Rendering context recovery
    pub watchdog: WatchdogSettings,
    /// Heap pressure checks
    pub memory: MemorySettings,
    /// GPU and user agent pattern tables
    pub patterns: GpuPatternSet,
    /// Start sampling as soon as the app starts
    pub monitor_on_startup: bool,
}

impl Default for AdaptiveQualitySettings {
    fn default() -> Self {
        Self {
            sampler: SamplerSettings::default(),
            selector: SelectorSettings::default(),
            watchdog: WatchdogSettings::default(),
            memory: MemorySettings::default(),
            patterns: GpuPatternSet::default(),
            monitor_on_startup: true,
        }
    }
}

impl AdaptiveQualitySettings {
    /// Check internal consistency, including that every pattern compiles.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sampler.validate()?;
        self.selector.validate()?;
        self.watchdog.validate()?;
        self.memory.validate()?;
        self.patterns.compile()?;
        Ok(())
    }
}

/// Frame-rate sampler configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplerSettings {
    /// Span over which frames are counted per reading
    pub interval: Duration,
    /// Readings kept for the rolling average
    pub history_capacity: usize,
    /// Average below which performance counts as degraded
    pub low_fps: f32,
    /// Average below which performance counts as critical
    pub critical_fps: f32,
    /// Average at which performance counts as healthy again
    pub healthy_fps: f32,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            interval: FPS_SAMPLE_INTERVAL,
            history_capacity: FPS_HISTORY_CAPACITY,
            low_fps: LOW_FPS,
            critical_fps: CRITICAL_FPS,
            healthy_fps: HEALTHY_FPS,
        }
    }
}

impl SamplerSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval { name: "fps sample" });
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::EmptyHistory { name: "fps" });
        }
        if !(self.critical_fps <= self.low_fps && self.low_fps <= self.healthy_fps) {
            return Err(ConfigError::Threshold {
                name: "performance level",
                detail: format!(
                    "expected critical ({}) <= low ({}) <= healthy ({})",
                    self.critical_fps, self.low_fps, self.healthy_fps
                ),
            });
        }
        Ok(())
    }
}

/// Quality selector configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectorSettings {
    /// Average FPS under which the ladder steps down
    pub fps_threshold: f32,
    /// Extra FPS above the threshold required to step back up
    pub upgrade_margin: f32,
    /// Minimum time between automatic adjustments
    pub cooldown: Duration,
    /// Ceiling on consecutive automatic downgrades
    pub max_downgrades: u32,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            fps_threshold: QUALITY_FPS_THRESHOLD,
            upgrade_margin: QUALITY_UPGRADE_MARGIN,
            cooldown: QUALITY_ADJUSTMENT_COOLDOWN,
            max_downgrades: MAX_CONSECUTIVE_DOWNGRADES,
        }
    }
}

impl SelectorSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fps_threshold > 0.0 && self.upgrade_margin >= 0.0) {
            return Err(ConfigError::Threshold {
                name: "fps_threshold",
                detail: format!(
                    "threshold {} must be positive and margin {} non-negative",
                    self.fps_threshold, self.upgrade_margin
                ),
            });
        }
        Ok(())
    }
}

/// Context-loss watchdog configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WatchdogSettings {
    /// Restore attempts before giving up
    pub max_restore_attempts: u32,
    /// Attempt `n` is made `n * restore_base_delay` after the previous one
    pub restore_base_delay: Duration,
    /// Interval between health checks while the context is available
    pub health_check_interval: Duration,
}

impl Default for WatchdogSettings {
    fn default() -> Self {
        Self {
            max_restore_attempts: MAX_RESTORE_ATTEMPTS,
            restore_base_delay: RESTORE_BASE_DELAY,
            health_check_interval: CONTEXT_HEALTH_CHECK_INTERVAL,
        }
    }
}

impl WatchdogSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.health_check_interval.is_zero() {
            return Err(ConfigError::ZeroInterval {
                name: "context health check",
            });
        }
        Ok(())
    }
}

/// Memory monitor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemorySettings {
    /// Interval between heap probes
    pub check_interval: Duration,
    /// Readings kept in the memory history
    pub history_capacity: usize,
    /// Usage (MB) above which a warning is raised
    pub warning_mb: f32,
    /// Usage (MB) above which memory is critical
    pub critical_mb: f32,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            check_interval: MEMORY_CHECK_INTERVAL,
            history_capacity: MEMORY_HISTORY_CAPACITY,
            warning_mb: MEMORY_WARNING_MB,
            critical_mb: MEMORY_CRITICAL_MB,
        }
    }
}

impl MemorySettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.check_interval.is_zero() {
            return Err(ConfigError::ZeroInterval { name: "memory check" });
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::EmptyHistory { name: "memory" });
        }
        if self.warning_mb > self.critical_mb {
            return Err(ConfigError::Threshold {
                name: "memory",
                detail: format!(
                    "warning ({} MB) exceeds critical ({} MB)",
                    self.warning_mb, self.critical_mb
                ),
            });
        }
        Ok(())
    }
}
