//! Quality preset ladder and the selector that walks it.
//!
//! The ladder is a fixed, compiled-in table ordered from most to least
//! expensive. At runtime the [`QualitySelector`] only moves an index along it;
//! device-specific clamps are applied to a working copy every time the index
//! changes, never to the table itself.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    config::SelectorSettings,
    constants::*,
    device::{DeviceProfile, GpuTier, MobileClass},
};

/// Named rung of the quality ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    Ultra,
    High,
    Medium,
    Low,
    Minimal,
}

impl QualityTier {
    /// Every tier, from most to least expensive.
    pub const ALL: [QualityTier; 5] = [
        QualityTier::Ultra,
        QualityTier::High,
        QualityTier::Medium,
        QualityTier::Low,
        QualityTier::Minimal,
    ];

    /// Position on the ladder; 0 is the most expensive rung.
    pub const fn index(self) -> usize {
        match self {
            QualityTier::Ultra => 0,
            QualityTier::High => 1,
            QualityTier::Medium => 2,
            QualityTier::Low => 3,
            QualityTier::Minimal => 4,
        }
    }

    /// Tier at a ladder position, clamped to the cheapest rung.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    /// Display name.
    pub fn label(self) -> &'static str {
        QUALITY_LADDER[self.index()].name
    }

    /// The unadjusted preset for this tier.
    pub fn preset(self) -> &'static QualityPreset {
        &QUALITY_LADDER[self.index()]
    }
}

/// Antialiasing technique requested by a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AntialiasingMode {
    Msaa,
    Fxaa,
    None,
}

/// How much animation work a preset allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationQuality {
    Full,
    Standard,
    Reduced,
    Minimal,
}

/// Rendering parameters for one rung of the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityPreset {
    /// Which rung this preset belongs to
    pub tier: QualityTier,
    /// Display name
    pub name: &'static str,
    /// Render target scale relative to the logical window size
    pub pixel_ratio: f32,
    /// Shadow map edge length in texels
    pub shadow_map_size: u32,
    /// Environment map edge length in texels
    pub environment_resolution: u32,
    pub shadows: bool,
    pub post_processing: bool,
    pub ssao: bool,
    pub bloom: bool,
    /// Fraction of the full particle budget, 0..=1
    pub particle_density: f32,
    pub antialiasing: AntialiasingMode,
    pub anisotropic_filtering: u8,
    pub animation: AnimationQuality,
}

/// The compiled-in ladder, most expensive first.
pub const QUALITY_LADDER: [QualityPreset; 5] = [
    QualityPreset {
        tier: QualityTier::Ultra,
        name: "Ultra",
        pixel_ratio: 2.0,
        shadow_map_size: 2048,
        environment_resolution: 512,
        shadows: true,
        post_processing: true,
        ssao: true,
        bloom: true,
        particle_density: 1.0,
        antialiasing: AntialiasingMode::Msaa,
        anisotropic_filtering: 16,
        animation: AnimationQuality::Full,
    },
    QualityPreset {
        tier: QualityTier::High,
        name: "High",
        pixel_ratio: 1.5,
        shadow_map_size: 1024,
        environment_resolution: 256,
        shadows: true,
        post_processing: true,
        ssao: false,
        bloom: true,
        particle_density: 0.8,
        antialiasing: AntialiasingMode::Fxaa,
        anisotropic_filtering: 8,
        animation: AnimationQuality::Full,
    },
    QualityPreset {
        tier: QualityTier::Medium,
        name: "Medium",
        pixel_ratio: 1.0,
        shadow_map_size: 512,
        environment_resolution: 128,
        shadows: true,
        post_processing: false,
        ssao: false,
        bloom: false,
        particle_density: 0.6,
        antialiasing: AntialiasingMode::Fxaa,
        anisotropic_filtering: 4,
        animation: AnimationQuality::Standard,
    },
    QualityPreset {
        tier: QualityTier::Low,
        name: "Low",
        pixel_ratio: 1.0,
        shadow_map_size: 256,
        environment_resolution: 64,
        shadows: false,
        post_processing: false,
        ssao: false,
        bloom: false,
        particle_density: 0.3,
        antialiasing: AntialiasingMode::None,
        anisotropic_filtering: 1,
        animation: AnimationQuality::Reduced,
    },
    QualityPreset {
        tier: QualityTier::Minimal,
        name: "Minimal",
        pixel_ratio: 0.75,
        shadow_map_size: 128,
        environment_resolution: 32,
        shadows: false,
        post_processing: false,
        ssao: false,
        bloom: false,
        particle_density: 0.1,
        antialiasing: AntialiasingMode::None,
        anisotropic_filtering: 1,
        animation: AnimationQuality::Minimal,
    },
];

const LOWEST_INDEX: usize = QUALITY_LADDER.len() - 1;

/// Part of the scene a recommendation is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SceneRole {
    /// Large focal element at the top of the page
    Hero,
    /// Repeated thumbnails or cards
    Gallery,
    /// Decorative backdrop
    Background,
    /// Elements that respond to pointer input
    Interactive,
}

/// Why the active tier changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeReason {
    /// Average FPS fell under the threshold
    Downgrade,
    /// Average FPS recovered above threshold plus margin
    Upgrade,
    /// Manual override
    Forced,
    /// The rendering context was lost
    ContextLoss,
    /// Adaptive mode was switched off
    Reset,
}

/// Record of a tier transition, with the settings now in effect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityChange {
    pub from: QualityTier,
    pub to: QualityTier,
    pub reason: ChangeReason,
    pub settings: QualityPreset,
}

/// Mutable bookkeeping of the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdjustmentState {
    /// Index into [`QUALITY_LADDER`]
    pub current_index: usize,
    /// When the last adjustment was made, relative to app start
    pub last_adjustment: Option<Duration>,
    /// Automatic downgrades not yet undone by an upgrade
    pub consecutive_downgrades: u32,
    /// Rungs skipped by a context-loss drop and not yet climbed back
    pub context_loss_rungs: u32,
}

/// Picks and adjusts the active quality preset.
#[derive(Debug, Clone)]
pub struct QualitySelector {
    settings: SelectorSettings,
    profile: DeviceProfile,
    initial: QualityTier,
    device_ceiling: usize,
    ceiling: usize,
    state: AdjustmentState,
    active: QualityPreset,
    adaptive: bool,
}

impl QualitySelector {
    /// Build a selector already seeded from `profile`.
    pub fn new(settings: SelectorSettings, profile: DeviceProfile) -> Self {
        let initial = initial_tier(&profile);
        Self {
            settings,
            active: adjusted_preset(initial, &profile),
            profile,
            initial,
            device_ceiling: initial.index(),
            ceiling: initial.index(),
            state: AdjustmentState {
                current_index: initial.index(),
                ..AdjustmentState::default()
            },
            adaptive: true,
        }
    }

    /// Re-seed from a device profile, discarding adjustment history.
    pub fn initialize(&mut self, profile: DeviceProfile) {
        let initial = initial_tier(&profile);
        self.profile = profile;
        self.initial = initial;
        self.device_ceiling = initial.index();
        self.ceiling = initial.index();
        self.state = AdjustmentState {
            current_index: initial.index(),
            ..AdjustmentState::default()
        };
        self.refresh_active();
    }

    /// Consume a rolling-average FPS reading and step the ladder if warranted.
    pub fn on_fps_sample(&mut self, average_fps: f32, now: Duration) -> Option<QualityChange> {
        if !self.adaptive || self.in_cooldown(now) {
            return None;
        }

        let index = self.state.current_index;
        let threshold = self.settings.fps_threshold;

        if average_fps < threshold
            && self.state.consecutive_downgrades < self.settings.max_downgrades
            && index < LOWEST_INDEX
        {
            self.state.consecutive_downgrades += 1;
            self.state.last_adjustment = Some(now);
            Some(self.move_to(index + 1, ChangeReason::Downgrade))
        } else if average_fps > threshold + self.settings.upgrade_margin
            && (self.state.context_loss_rungs > 0 || self.state.consecutive_downgrades > 0)
            && index > self.ceiling
        {
            if self.state.context_loss_rungs > 0 {
                self.state.context_loss_rungs -= 1;
            } else {
                self.state.consecutive_downgrades -= 1;
            }
            self.state.last_adjustment = Some(now);
            Some(self.move_to(index - 1, ChangeReason::Upgrade))
        } else {
            None
        }
    }

    /// Switch to `tier` regardless of the heuristic and restart its bookkeeping.
    pub fn force_quality(&mut self, tier: QualityTier, now: Duration) -> QualityChange {
        self.state.consecutive_downgrades = 0;
        self.state.context_loss_rungs = 0;
        self.state.last_adjustment = Some(now);
        self.ceiling = self.device_ceiling.min(tier.index());
        self.move_to(tier.index(), ChangeReason::Forced)
    }

    /// Drop straight to the cheapest preset, ignoring the cooldown.
    ///
    /// The skipped rungs are tracked apart from the bounded downgrade counter,
    /// so healthy frame rates can climb all the way back afterwards.
    pub fn force_lowest(&mut self, now: Duration) -> Option<QualityChange> {
        let index = self.state.current_index;
        self.state.last_adjustment = Some(now);
        if index == LOWEST_INDEX {
            return None;
        }

        self.state.context_loss_rungs += (LOWEST_INDEX - index) as u32;
        Some(self.move_to(LOWEST_INDEX, ChangeReason::ContextLoss))
    }

    /// Turn automatic adjustment on or off. Turning it off returns to the
    /// device's starting tier.
    pub fn set_adaptive(&mut self, enabled: bool) -> Option<QualityChange> {
        self.adaptive = enabled;
        if enabled {
            return None;
        }

        self.state.consecutive_downgrades = 0;
        self.state.context_loss_rungs = 0;
        self.ceiling = self.device_ceiling;
        let target = self.initial.index();
        (target != self.state.current_index).then(|| self.move_to(target, ChangeReason::Reset))
    }

    /// Whether automatic adjustment is enabled.
    pub fn is_adaptive(&self) -> bool {
        self.adaptive
    }

    /// Copy of the active preset with device clamps applied.
    pub fn settings(&self) -> QualityPreset {
        self.active
    }

    /// The active tier.
    pub fn current_quality(&self) -> QualityTier {
        QualityTier::from_index(self.state.current_index)
    }

    /// Tier picked for this device at initialization.
    pub fn initial_quality(&self) -> QualityTier {
        self.initial
    }

    /// Snapshot of the adjustment bookkeeping.
    pub fn adjustment_state(&self) -> AdjustmentState {
        self.state
    }

    /// Recommended tier for one part of the scene on this device.
    pub fn tier_for_role(&self, role: SceneRole) -> QualityTier {
        let mobile = self.profile.is_mobile;
        match role {
            SceneRole::Hero | SceneRole::Interactive if mobile => QualityTier::Medium,
            SceneRole::Hero | SceneRole::Interactive => QualityTier::High,
            SceneRole::Gallery if mobile => QualityTier::Low,
            SceneRole::Gallery => QualityTier::Medium,
            SceneRole::Background => QualityTier::Low,
        }
    }

    fn in_cooldown(&self, now: Duration) -> bool {
        self.state
            .last_adjustment
            .is_some_and(|last| now.saturating_sub(last) < self.settings.cooldown)
    }

    fn move_to(&mut self, index: usize, reason: ChangeReason) -> QualityChange {
        let from = self.current_quality();
        self.state.current_index = index.min(LOWEST_INDEX);
        self.refresh_active();
        QualityChange {
            from,
            to: self.current_quality(),
            reason,
            settings: self.active,
        }
    }

    fn refresh_active(&mut self) {
        self.active = adjusted_preset(self.current_quality(), &self.profile);
    }
}

/// Starting tier for a device.
pub fn initial_tier(profile: &DeviceProfile) -> QualityTier {
    if profile.is_desktop() {
        return if profile.logical_cores > 8 && profile.approx_memory_gb > 8.0 {
            QualityTier::Ultra
        } else {
            QualityTier::High
        };
    }

    // "Mid-range or below" is the overlapping cores <= 6 or memory <= 6 test,
    // which low-end phones pass too.
    match (profile.mobile_class, profile.gpu_tier) {
        (Some(MobileClass::HighEnd), GpuTier::High) => QualityTier::High,
        (Some(MobileClass::LowEnd | MobileClass::MidRange), GpuTier::Medium) => QualityTier::Medium,
        _ => QualityTier::Low,
    }
}

/// Working copy of a tier's preset with device clamps applied.
pub fn adjusted_preset(tier: QualityTier, profile: &DeviceProfile) -> QualityPreset {
    let mut preset = *tier.preset();

    if profile.is_mobile {
        preset.pixel_ratio = preset.pixel_ratio.min(MOBILE_MAX_PIXEL_RATIO);
        if preset.shadows {
            preset.shadow_map_size = preset.shadow_map_size.min(MOBILE_MAX_SHADOW_MAP_SIZE);
        }
        if profile.is_low_end_mobile() {
            preset.post_processing = false;
            preset.ssao = false;
            preset.bloom = false;
        }
    }

    if profile.pixel_ratio > HIGH_DPI_MAX_PIXEL_RATIO {
        preset.pixel_ratio = preset.pixel_ratio.min(HIGH_DPI_MAX_PIXEL_RATIO);
    }

    preset
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    fn desktop() -> DeviceProfile {
        DeviceProfile::new(8, 16.0, false, GpuTier::Unknown, 1.0)
    }

    fn selector(profile: DeviceProfile) -> QualitySelector {
        QualitySelector::new(SelectorSettings::default(), profile)
    }

    #[test]
    fn ladder_is_ordered_by_cost() {
        for (index, preset) in QUALITY_LADDER.iter().enumerate() {
            assert_eq!(preset.tier.index(), index);
        }
        for pair in QUALITY_LADDER.windows(2) {
            assert!(pair[0].shadow_map_size > pair[1].shadow_map_size);
            assert!(pair[0].particle_density > pair[1].particle_density);
        }
    }

    #[test]
    fn initial_tiers() {
        assert_eq!(initial_tier(&desktop()), QualityTier::High);
        assert_eq!(
            initial_tier(&DeviceProfile::new(16, 32.0, false, GpuTier::Unknown, 1.0)),
            QualityTier::Ultra
        );
        assert_eq!(
            initial_tier(&DeviceProfile::new(2, 2.0, false, GpuTier::Unknown, 1.0)),
            QualityTier::High
        );
        assert_eq!(
            initial_tier(&DeviceProfile::new(8, 8.0, true, GpuTier::High, 3.0)),
            QualityTier::High
        );
        assert_eq!(
            initial_tier(&DeviceProfile::new(6, 6.0, true, GpuTier::Medium, 3.0)),
            QualityTier::Medium
        );
        assert_eq!(
            initial_tier(&DeviceProfile::new(2, 2.0, true, GpuTier::High, 2.0)),
            QualityTier::Low
        );
        // Low-end phones with a medium GPU still start at Medium.
        assert_eq!(
            initial_tier(&DeviceProfile::new(4, 3.0, true, GpuTier::Medium, 2.0)),
            QualityTier::Medium
        );
        // High-end phones need a high-end GPU to start above Low.
        assert_eq!(
            initial_tier(&DeviceProfile::new(8, 8.0, true, GpuTier::Medium, 2.0)),
            QualityTier::Low
        );
    }

    #[test]
    fn low_fps_steps_down_once() {
        let mut selector = selector(desktop());
        let change = selector.on_fps_sample(40.0, SECOND).unwrap();

        assert_eq!(change.from, QualityTier::High);
        assert_eq!(change.to, QualityTier::Medium);
        assert_eq!(change.reason, ChangeReason::Downgrade);
        assert_eq!(selector.adjustment_state().consecutive_downgrades, 1);
        assert_eq!(selector.adjustment_state().last_adjustment, Some(SECOND));
    }

    #[test]
    fn cooldown_suppresses_second_adjustment() {
        let mut selector = selector(desktop());
        assert!(selector.on_fps_sample(40.0, SECOND).is_some());
        assert!(selector.on_fps_sample(40.0, SECOND + Duration::from_millis(1999)).is_none());
        assert_eq!(selector.current_quality(), QualityTier::Medium);
        assert!(selector.on_fps_sample(40.0, SECOND * 3).is_some());
        assert_eq!(selector.current_quality(), QualityTier::Low);
    }

    #[test]
    fn gradual_decline_downgrades_exactly_once() {
        let mut selector = selector(desktop());
        let changes: Vec<_> = [58.0, 57.0, 56.0, 55.0, 54.0]
            .into_iter()
            .enumerate()
            .filter_map(|(i, fps)| selector.on_fps_sample(fps, SECOND * (i as u32 + 10)))
            .collect();

        assert_eq!(changes.len(), 1);
        assert_eq!(selector.adjustment_state().consecutive_downgrades, 1);
    }

    #[test]
    fn burst_of_bad_samples_within_cooldown_downgrades_once() {
        let mut selector = selector(desktop());
        let start = SECOND * 10;
        let changes = [54.0, 53.0, 52.0, 51.0, 50.0]
            .into_iter()
            .enumerate()
            .filter(|(i, fps)| {
                selector
                    .on_fps_sample(*fps, start + Duration::from_millis(300 * *i as u64))
                    .is_some()
            })
            .count();
        assert_eq!(changes, 1);
    }

    #[test]
    fn downgrades_stop_at_ceiling() {
        let mut selector = selector(DeviceProfile::new(16, 32.0, false, GpuTier::Unknown, 1.0));
        for step in 0..10 {
            selector.on_fps_sample(10.0, SECOND * 3 * step);
        }
        assert_eq!(selector.adjustment_state().consecutive_downgrades, 3);
        assert_eq!(selector.current_quality(), QualityTier::Low);
    }

    #[test]
    fn recovery_climbs_back_to_device_ceiling_only() {
        let mut selector = selector(desktop());
        selector.on_fps_sample(40.0, SECOND * 0);
        selector.on_fps_sample(40.0, SECOND * 3);
        assert_eq!(selector.current_quality(), QualityTier::Low);

        let ups: Vec<_> = (2..8)
            .filter_map(|step| selector.on_fps_sample(70.0, SECOND * 3 * step))
            .collect();

        assert_eq!(ups.len(), 2);
        assert!(ups.iter().all(|c| c.reason == ChangeReason::Upgrade));
        assert_eq!(selector.current_quality(), QualityTier::High);
        assert_eq!(selector.adjustment_state().consecutive_downgrades, 0);
    }

    #[test]
    fn upgrade_needs_margin_above_threshold() {
        let mut selector = selector(desktop());
        selector.on_fps_sample(40.0, SECOND * 0);
        assert!(selector.on_fps_sample(65.0, SECOND * 3).is_none());
        assert!(selector.on_fps_sample(65.5, SECOND * 6).is_some());
    }

    #[test]
    fn index_stays_in_bounds_for_any_sequence() {
        let mut selector = selector(DeviceProfile::new(16, 32.0, false, GpuTier::Unknown, 1.0));
        let fps = [0.0, 120.0, 10.0, 10.0, 90.0, 5.0, 5.0, 5.0, 5.0, 200.0, 1.0, 80.0];
        for (step, value) in fps.iter().cycle().take(200).enumerate() {
            selector.on_fps_sample(*value, Duration::from_millis(700 * step as u64));
            let state = selector.adjustment_state();
            assert!(state.current_index < QUALITY_LADDER.len());
            assert!(state.consecutive_downgrades <= 3);
        }
    }

    #[test]
    fn force_quality_resets_counter() {
        let mut selector = selector(desktop());
        selector.on_fps_sample(40.0, SECOND * 0);
        selector.on_fps_sample(40.0, SECOND * 3);
        assert_eq!(selector.adjustment_state().consecutive_downgrades, 2);

        let change = selector.force_quality(QualityTier::Ultra, SECOND * 4);

        assert_eq!(change.reason, ChangeReason::Forced);
        assert_eq!(change.to, QualityTier::Ultra);
        assert_eq!(selector.adjustment_state().consecutive_downgrades, 0);
        assert_eq!(selector.adjustment_state().last_adjustment, Some(SECOND * 4));
        // The override counts as an adjustment for the cooldown.
        assert!(selector.on_fps_sample(10.0, SECOND * 5).is_none());
        assert!(selector.on_fps_sample(10.0, SECOND * 7).is_some());
    }

    #[test]
    fn force_lowest_bypasses_cooldown() {
        let mut selector = selector(desktop());
        selector.on_fps_sample(40.0, SECOND);
        let change = selector.force_lowest(SECOND + Duration::from_millis(10)).unwrap();

        assert_eq!(change.to, QualityTier::Minimal);
        assert_eq!(change.reason, ChangeReason::ContextLoss);
        assert_eq!(selector.adjustment_state().consecutive_downgrades, 1);
        assert_eq!(selector.adjustment_state().context_loss_rungs, 2);
        assert!(selector.force_lowest(SECOND * 2).is_none());
    }

    #[test]
    fn ultra_device_climbs_back_to_ultra_after_context_loss() {
        let mut selector = selector(DeviceProfile::new(16, 32.0, false, GpuTier::Unknown, 1.0));
        assert_eq!(selector.current_quality(), QualityTier::Ultra);
        selector.force_lowest(SECOND);

        let ups = (1..10)
            .filter_map(|step| selector.on_fps_sample(70.0, SECOND * 3 * step))
            .count();

        assert_eq!(ups, 4);
        assert_eq!(selector.current_quality(), QualityTier::Ultra);
        assert_eq!(
            selector.adjustment_state(),
            AdjustmentState {
                current_index: 0,
                last_adjustment: Some(SECOND * 12),
                ..AdjustmentState::default()
            }
        );
    }

    #[test]
    fn context_loss_recovery_also_undoes_earlier_downgrades() {
        let mut selector = selector(desktop());
        selector.on_fps_sample(40.0, SECOND);
        selector.force_lowest(SECOND * 2);

        for step in 1..10 {
            selector.on_fps_sample(70.0, SECOND * 3 * step);
        }
        assert_eq!(selector.current_quality(), QualityTier::High);
        assert_eq!(selector.adjustment_state().consecutive_downgrades, 0);
        assert_eq!(selector.adjustment_state().context_loss_rungs, 0);
    }

    #[test]
    fn mobile_clamps_apply_to_working_copy() {
        let profile = DeviceProfile::new(4, 3.0, true, GpuTier::Low, 3.0);
        let mut selector = selector(profile);
        let change = selector.force_quality(QualityTier::Ultra, SECOND);

        assert_eq!(change.settings.pixel_ratio, MOBILE_MAX_PIXEL_RATIO);
        assert_eq!(change.settings.shadow_map_size, MOBILE_MAX_SHADOW_MAP_SIZE);
        assert!(!change.settings.post_processing);
        assert!(!change.settings.bloom);
        assert!(!change.settings.ssao);
        assert_eq!(QUALITY_LADDER[0].pixel_ratio, 2.0);
        assert!(QUALITY_LADDER[0].post_processing);
    }

    #[test]
    fn high_dpi_desktop_caps_pixel_ratio() {
        let profile = DeviceProfile::new(16, 32.0, false, GpuTier::Unknown, 3.0);
        let preset = adjusted_preset(QualityTier::Ultra, &profile);
        assert_eq!(preset.pixel_ratio, 2.0);
        assert!(preset.ssao);
    }

    #[test]
    fn disabling_adaptive_mode_returns_to_initial_tier() {
        let mut selector = selector(desktop());
        selector.on_fps_sample(40.0, SECOND);
        let change = selector.set_adaptive(false).unwrap();

        assert_eq!(change.to, QualityTier::High);
        assert_eq!(change.reason, ChangeReason::Reset);
        assert!(selector.on_fps_sample(10.0, SECOND * 10).is_none());
        assert!(selector.set_adaptive(true).is_none());
        assert!(selector.on_fps_sample(10.0, SECOND * 20).is_some());
    }

    #[test]
    fn role_recommendations_depend_on_form_factor() {
        let desktop = selector(desktop());
        assert_eq!(desktop.tier_for_role(SceneRole::Hero), QualityTier::High);
        assert_eq!(desktop.tier_for_role(SceneRole::Gallery), QualityTier::Medium);

        let mobile = selector(DeviceProfile::new(8, 8.0, true, GpuTier::High, 2.0));
        assert_eq!(mobile.tier_for_role(SceneRole::Interactive), QualityTier::Medium);
        assert_eq!(mobile.tier_for_role(SceneRole::Background), QualityTier::Low);
    }

    #[test]
    fn reinitializing_discards_adjustment_history() {
        let mut selector = selector(desktop());
        selector.on_fps_sample(40.0, SECOND);
        assert_eq!(selector.adjustment_state().consecutive_downgrades, 1);

        selector.initialize(DeviceProfile::new(4, 3.0, true, GpuTier::Low, 3.0));
        assert_eq!(selector.current_quality(), QualityTier::Low);
        assert_eq!(
            selector.adjustment_state(),
            AdjustmentState {
                current_index: QualityTier::Low.index(),
                ..AdjustmentState::default()
            }
        );
        assert!(selector.settings().pixel_ratio <= 1.5);
    }
}
