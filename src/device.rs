//! One-shot device classification.
//!
//! [`classify`] reads static capability signals from the host once at startup
//! and folds them into an immutable [`DeviceProfile`]. Every signal has a
//! fallback, so classification cannot fail; a host without a usable rendering
//! probe simply ends up with [`GpuTier::Unknown`].

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    constants::*,
    error::ConfigError,
    providers::{HostSignals, ProbeSurface},
};

/// Coarse bucket derived from core count, memory and form factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeviceTier {
    /// Two cores or two gigabytes, or a modest mobile device
    VeryLow,
    /// Four cores or four gigabytes
    Low,
    /// Six cores or six gigabytes
    Medium,
    /// Anything above
    High,
}

impl DeviceTier {
    /// Apply the nested threshold rules to raw capability numbers.
    pub fn from_capabilities(logical_cores: u32, approx_memory_gb: f32, is_mobile: bool) -> Self {
        let very_low = logical_cores <= 2 || approx_memory_gb <= 2.0;
        let low = logical_cores <= 4 || approx_memory_gb <= 4.0;

        if very_low || (low && is_mobile) {
            DeviceTier::VeryLow
        } else if low {
            DeviceTier::Low
        } else if logical_cores <= 6 || approx_memory_gb <= 6.0 {
            DeviceTier::Medium
        } else {
            DeviceTier::High
        }
    }
}

/// Mobile sub-classification used when picking the starting preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MobileClass {
    /// At most four cores or three gigabytes
    LowEnd,
    /// At most six cores or six gigabytes
    MidRange,
    /// Anything above
    HighEnd,
}

impl MobileClass {
    /// Bucket a mobile device; the first matching rule wins.
    pub fn from_capabilities(logical_cores: u32, approx_memory_gb: f32) -> Self {
        if logical_cores <= 4 || approx_memory_gb <= 3.0 {
            MobileClass::LowEnd
        } else if logical_cores <= 6 || approx_memory_gb <= 6.0 {
            MobileClass::MidRange
        } else {
            MobileClass::HighEnd
        }
    }
}

/// GPU class guessed from the renderer name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GpuTier {
    Low,
    Medium,
    High,
    /// No renderer string, or no table matched it
    #[default]
    Unknown,
}

/// Immutable snapshot of the host's static capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Logical CPU cores
    pub logical_cores: u32,
    /// Approximate device memory in gigabytes
    pub approx_memory_gb: f32,
    /// Whether the host is a phone or tablet
    pub is_mobile: bool,
    /// GPU class guessed from the renderer string
    pub gpu_tier: GpuTier,
    /// Display pixel ratio
    pub pixel_ratio: f32,
    /// Tier derived from cores, memory and form factor
    pub device_tier: DeviceTier,
    /// Mobile sub-class, `None` on desktop
    pub mobile_class: Option<MobileClass>,
    /// Raw renderer string, kept for reports
    pub renderer: Option<String>,
}

impl DeviceProfile {
    /// Build a profile from already-resolved capability values.
    pub fn new(
        logical_cores: u32,
        approx_memory_gb: f32,
        is_mobile: bool,
        gpu_tier: GpuTier,
        pixel_ratio: f32,
    ) -> Self {
        Self {
            logical_cores,
            approx_memory_gb,
            is_mobile,
            gpu_tier,
            pixel_ratio,
            device_tier: DeviceTier::from_capabilities(logical_cores, approx_memory_gb, is_mobile),
            mobile_class: is_mobile
                .then(|| MobileClass::from_capabilities(logical_cores, approx_memory_gb)),
            renderer: None,
        }
    }

    /// Attach the renderer string the GPU tier was derived from.
    pub fn with_renderer(mut self, renderer: impl Into<String>) -> Self {
        self.renderer = Some(renderer.into());
        self
    }

    /// True for desktop-class hosts.
    pub fn is_desktop(&self) -> bool {
        !self.is_mobile
    }

    /// True for mobile hosts in the low-end bucket.
    pub fn is_low_end_mobile(&self) -> bool {
        self.mobile_class == Some(MobileClass::LowEnd)
    }

    /// Animation knobs for presentation code that does not go through the
    /// quality ladder (tweens, staggered reveals, CSS-like effects).
    pub fn animation_budget(&self) -> AnimationBudget {
        match self.device_tier {
            DeviceTier::VeryLow => AnimationBudget {
                animation_duration_secs: 0.2,
                stagger_delay_secs: 0.05,
                shadows: false,
                complex_animations: false,
                pixel_ratio: 0.75,
                target_frame_rate: 30,
                particles: false,
                blur: false,
                gradients: false,
            },
            DeviceTier::Low => AnimationBudget {
                animation_duration_secs: 0.4,
                stagger_delay_secs: 0.1,
                shadows: false,
                complex_animations: false,
                pixel_ratio: 1.0,
                target_frame_rate: 45,
                particles: false,
                blur: false,
                gradients: true,
            },
            DeviceTier::Medium | DeviceTier::High => AnimationBudget {
                animation_duration_secs: 0.6,
                stagger_delay_secs: 0.15,
                shadows: true,
                complex_animations: true,
                pixel_ratio: self.pixel_ratio.min(HIGH_DPI_MAX_PIXEL_RATIO),
                target_frame_rate: 60,
                particles: true,
                blur: true,
                gradients: true,
            },
        }
    }
}

/// Animation and effect limits derived from the device tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationBudget {
    pub animation_duration_secs: f32,
    pub stagger_delay_secs: f32,
    pub shadows: bool,
    pub complex_animations: bool,
    pub pixel_ratio: f32,
    pub target_frame_rate: u32,
    pub particles: bool,
    pub blur: bool,
    pub gradients: bool,
}

/// Pattern tables as plain data, so they can be versioned and overridden.
///
/// The built-in tables are hand-tuned against common mobile GPU names and
/// will drift as new hardware ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuPatternSet {
    /// Fragments identifying high-end GPUs
    pub high: Vec<String>,
    /// Fragments identifying mid-range GPUs
    pub medium: Vec<String>,
    /// Fragments identifying low-end GPUs
    pub low: Vec<String>,
    /// Pattern identifying a mobile user agent
    pub mobile_user_agent: String,
}

impl Default for GpuPatternSet {
    fn default() -> Self {
        let owned = |patterns: &[&str]| patterns.iter().map(|p| (*p).to_owned()).collect();
        Self {
            high: owned(HIGH_END_GPU_PATTERNS),
            medium: owned(MID_RANGE_GPU_PATTERNS),
            low: owned(LOW_END_GPU_PATTERNS),
            mobile_user_agent: MOBILE_USER_AGENT_PATTERN.to_owned(),
        }
    }
}

impl GpuPatternSet {
    /// Compile every pattern, reporting the first one that fails.
    pub fn compile(&self) -> Result<GpuPatternTable, ConfigError> {
        Ok(GpuPatternTable {
            high: compile_all(&self.high)?,
            medium: compile_all(&self.medium)?,
            low: compile_all(&self.low)?,
            mobile_user_agent: compile_one(&self.mobile_user_agent)?,
        })
    }
}

fn compile_one(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.to_owned(),
        source,
    })
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns.iter().map(|p| compile_one(p)).collect()
}

/// Compiled form of [`GpuPatternSet`].
#[derive(Debug, Clone)]
pub struct GpuPatternTable {
    high: Vec<Regex>,
    medium: Vec<Regex>,
    low: Vec<Regex>,
    mobile_user_agent: Regex,
}

impl GpuPatternTable {
    /// The compiled built-in tables.
    pub fn builtin() -> Self {
        GpuPatternSet::default()
            .compile()
            .expect("built-in device patterns are valid")
    }

    /// Match a renderer string against the high, medium and low tables in turn.
    pub fn gpu_tier(&self, renderer: &str) -> GpuTier {
        let normalized = normalize_renderer(renderer);
        let hit = |table: &[Regex]| table.iter().any(|re| re.is_match(&normalized));

        if hit(&self.high) {
            GpuTier::High
        } else if hit(&self.medium) {
            GpuTier::Medium
        } else if hit(&self.low) {
            GpuTier::Low
        } else {
            GpuTier::Unknown
        }
    }

    /// Whether a user agent string names a mobile browser.
    pub fn is_mobile_user_agent(&self, user_agent: &str) -> bool {
        self.mobile_user_agent.is_match(user_agent)
    }
}

impl Default for GpuPatternTable {
    fn default() -> Self {
        Self::builtin()
    }
}

// Vendors decorate names as "Adreno (TM) 640"; the tables match "adreno 640".
fn normalize_renderer(renderer: &str) -> String {
    renderer
        .to_lowercase()
        .replace("(tm)", "")
        .replace("(r)", "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Owns a probe surface for the duration of a query and releases it on drop.
struct ProbeGuard {
    surface: Box<dyn ProbeSurface>,
}

impl ProbeGuard {
    fn renderer_name(&self) -> Option<String> {
        self.surface.renderer_name()
    }
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        self.surface.release();
    }
}

fn query_renderer(signals: &dyn HostSignals) -> Option<String> {
    let guard = ProbeGuard {
        surface: signals.open_probe_surface()?,
    };
    guard.renderer_name().filter(|name| !name.trim().is_empty())
}

/// Read the host's capability signals once and classify the device.
pub fn classify(signals: &dyn HostSignals, patterns: &GpuPatternTable) -> DeviceProfile {
    let logical_cores = signals
        .logical_cores()
        .filter(|cores| *cores > 0)
        .unwrap_or(DEFAULT_LOGICAL_CORES);
    let approx_memory_gb = signals
        .memory_gb()
        .filter(|gb| gb.is_finite() && *gb > 0.0)
        .unwrap_or(DEFAULT_MEMORY_GB);
    let pixel_ratio = signals
        .pixel_ratio()
        .filter(|ratio| ratio.is_finite() && *ratio > 0.0)
        .unwrap_or(DEFAULT_PIXEL_RATIO);
    let is_mobile = cfg!(any(target_os = "android", target_os = "ios"))
        || signals
            .user_agent()
            .is_some_and(|ua| patterns.is_mobile_user_agent(&ua));

    let renderer = query_renderer(signals);
    let gpu_tier = renderer
        .as_deref()
        .map_or(GpuTier::Unknown, |name| patterns.gpu_tier(name));

    let profile =
        DeviceProfile::new(logical_cores, approx_memory_gb, is_mobile, gpu_tier, pixel_ratio);
    match renderer {
        Some(name) => profile.with_renderer(name),
        None => profile,
    }
}
