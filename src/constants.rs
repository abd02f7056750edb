//! Constants used throughout the bevy_adaptive_quality plugin.
//!
//! This module centralizes the compiled-in thresholds, cooldowns and fallback
//! values used by the classifier, sampler, selector and watchdog.

use std::time::Duration;

/// Logical core count assumed when the host does not report one
pub const DEFAULT_LOGICAL_CORES: u32 = 4;

/// Device memory (GB) assumed when the host does not report it
pub const DEFAULT_MEMORY_GB: f32 = 4.0;

/// Display pixel ratio assumed when the host does not report it
pub const DEFAULT_PIXEL_RATIO: f32 = 1.0;

/// Wall-clock span over which frames are counted before an FPS reading is produced
pub const FPS_SAMPLE_INTERVAL: Duration = Duration::from_millis(1000);

/// Number of FPS readings kept in the trailing history
pub const FPS_HISTORY_CAPACITY: usize = 30;

/// Average FPS reported before any reading has been taken
pub const ASSUMED_FPS: f32 = 60.0;

/// Average FPS below which performance is considered degraded
pub const LOW_FPS: f32 = 45.0;

/// Average FPS below which performance is considered critical
pub const CRITICAL_FPS: f32 = 30.0;

/// Average FPS at or above which performance is considered healthy again
pub const HEALTHY_FPS: f32 = 55.0;

/// Average FPS under which the selector steps down the ladder
pub const QUALITY_FPS_THRESHOLD: f32 = 55.0;

/// Margin above the threshold the average must exceed before stepping back up
pub const QUALITY_UPGRADE_MARGIN: f32 = 10.0;

/// Minimum time between two automatic quality adjustments
pub const QUALITY_ADJUSTMENT_COOLDOWN: Duration = Duration::from_millis(2000);

/// Ceiling on consecutive automatic downgrades
pub const MAX_CONSECUTIVE_DOWNGRADES: u32 = 3;

/// Pixel ratio cap applied to presets on mobile devices
pub const MOBILE_MAX_PIXEL_RATIO: f32 = 1.5;

/// Shadow map size cap applied to presets on mobile devices
pub const MOBILE_MAX_SHADOW_MAP_SIZE: u32 = 512;

/// Pixel ratio cap applied on high-density displays
pub const HIGH_DPI_MAX_PIXEL_RATIO: f32 = 2.0;

/// Restore attempts made after a context loss before giving up
pub const MAX_RESTORE_ATTEMPTS: u32 = 3;

/// Base delay between restore attempts; attempt `n` waits `n` times this
pub const RESTORE_BASE_DELAY: Duration = Duration::from_millis(2000);

/// Interval between rendering context health checks
pub const CONTEXT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_millis(5000);

/// Interval between heap usage probes
pub const MEMORY_CHECK_INTERVAL: Duration = Duration::from_millis(5000);

/// Number of heap usage readings kept in the trailing history
pub const MEMORY_HISTORY_CAPACITY: usize = 30;

/// Resident memory (MB) above which a memory warning is raised
pub const MEMORY_WARNING_MB: f32 = 1024.0;

/// Resident memory (MB) above which memory is considered critical
pub const MEMORY_CRITICAL_MB: f32 = 2048.0;

/// User agent fragments identifying a mobile browser
pub const MOBILE_USER_AGENT_PATTERN: &str =
    r"(?i)Android|webOS|iPhone|iPad|iPod|BlackBerry|IEMobile|Opera Mini";

/// Renderer fragments of high-end mobile GPUs
pub const HIGH_END_GPU_PATTERNS: &[&str] = &[
    r"adreno 6[4-9][0-9]",
    r"mali-g[7-9][0-9]",
    r"apple a1[2-9]",
    r"apple m[1-9]",
];

/// Renderer fragments of mid-range mobile GPUs
pub const MID_RANGE_GPU_PATTERNS: &[&str] = &[
    r"adreno [5-6][0-9][0-9]",
    r"mali-g[5-6][0-9]",
    r"apple a(8|9|1[0-9])",
];

/// Renderer fragments of low-end mobile GPUs
pub const LOW_END_GPU_PATTERNS: &[&str] = &[
    r"adreno [1-4][0-9][0-9]",
    r"mali-[4-5][0-9][0-9]",
    r"apple a[4-7]",
];
