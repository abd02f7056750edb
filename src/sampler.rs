//! Frame-rate sampling.
//!
//! The sampler is fed one call per rendered frame. It counts frames and,
//! whenever the configured interval has elapsed since the last flush, turns
//! the count into an FPS reading that is appended to a bounded history.

use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, time::Duration};

use crate::{config::SamplerSettings, constants::ASSUMED_FPS};

/// One flushed FPS measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FpsSample {
    /// When the reading was taken, relative to app start
    pub timestamp: Duration,
    /// Frames per second over the last interval
    pub fps: u32,
}

/// Fixed-capacity FIFO of recent FPS samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FpsHistory {
    samples: VecDeque<FpsSample>,
    capacity: usize,
}

impl FpsHistory {
    /// Create an empty history holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest when full.
    pub fn push(&mut self, sample: FpsSample) {
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Arithmetic mean of the retained samples.
    pub fn average(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: u64 = self.samples.iter().map(|s| u64::from(s.fps)).sum();
        Some(sum as f32 / self.samples.len() as f32)
    }

    /// Oldest-first iterator over the samples.
    pub fn iter(&self) -> impl Iterator<Item = &FpsSample> {
        self.samples.iter()
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<&FpsSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Instantaneous and rolling FPS produced at each flush.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FpsReading {
    pub fps: u32,
    pub average_fps: f32,
}

/// Counts frames and flushes them into FPS readings.
#[derive(Debug, Clone)]
pub struct FrameRateSampler {
    interval: Duration,
    running: bool,
    frame_count: u32,
    last_flush: Duration,
    history: FpsHistory,
}

impl FrameRateSampler {
    pub fn new(settings: &SamplerSettings) -> Self {
        Self {
            interval: settings.interval,
            running: false,
            frame_count: 0,
            last_flush: Duration::ZERO,
            history: FpsHistory::new(settings.history_capacity),
        }
    }

    /// Begin counting. Does nothing if already running.
    pub fn start(&mut self, now: Duration) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.frame_count = 0;
        self.last_flush = now;
        true
    }

    /// Stop counting. Safe to call when not running.
    pub fn stop(&mut self) -> bool {
        let was_running = self.running;
        self.running = false;
        self.frame_count = 0;
        was_running
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Account for one rendered frame at `now`.
    ///
    /// Returns a reading when the interval since the last flush has elapsed.
    /// The frame itself is counted towards the next interval.
    pub fn record_frame(&mut self, now: Duration) -> Option<FpsReading> {
        if !self.running {
            return None;
        }

        let delta = now.saturating_sub(self.last_flush);
        let reading = if delta >= self.interval {
            let delta_ms = delta.as_secs_f64() * 1000.0;
            let fps = (f64::from(self.frame_count) * 1000.0 / delta_ms).round() as u32;
            self.history.push(FpsSample { timestamp: now, fps });
            self.frame_count = 0;
            self.last_flush = now;
            Some(FpsReading {
                fps,
                average_fps: self.average_fps(),
            })
        } else {
            None
        };

        self.frame_count = self.frame_count.saturating_add(1);
        reading
    }

    /// Rolling average, or the assumed 60 FPS before the first reading.
    pub fn average_fps(&self) -> f32 {
        self.history.average().unwrap_or(ASSUMED_FPS)
    }

    /// Most recent instantaneous reading.
    pub fn current_fps(&self) -> Option<u32> {
        self.history.latest().map(|s| s.fps)
    }

    pub fn history(&self) -> &FpsHistory {
        &self.history
    }
}

/// Coarse health of the rolling frame rate, ordered from best to worst.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum PerformanceLevel {
    #[default]
    High,
    Low,
    Critical,
}

/// Tracks [`PerformanceLevel`] transitions from rolling averages.
#[derive(Debug, Clone)]
pub struct PerformanceLevelTracker {
    low_fps: f32,
    critical_fps: f32,
    healthy_fps: f32,
    level: PerformanceLevel,
}

impl PerformanceLevelTracker {
    pub fn new(settings: &SamplerSettings) -> Self {
        Self {
            low_fps: settings.low_fps,
            critical_fps: settings.critical_fps,
            healthy_fps: settings.healthy_fps,
            level: PerformanceLevel::High,
        }
    }

    /// Feed a rolling average; returns the new level only when it changed.
    ///
    /// Averages between the low and healthy thresholds keep the current level.
    pub fn observe(&mut self, average_fps: f32) -> Option<PerformanceLevel> {
        let next = if average_fps < self.critical_fps {
            PerformanceLevel::Critical
        } else if average_fps < self.low_fps {
            PerformanceLevel::Low
        } else if average_fps >= self.healthy_fps {
            PerformanceLevel::High
        } else {
            self.level
        };

        if next == self.level {
            return None;
        }
        self.level = next;
        Some(next)
    }

    pub fn level(&self) -> PerformanceLevel {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn sample(fps: u32) -> FpsSample {
        FpsSample {
            timestamp: Duration::ZERO,
            fps,
        }
    }

    #[test]
    fn history_evicts_oldest_first() {
        let mut history = FpsHistory::new(5);
        for fps in 1..=8 {
            history.push(sample(fps));
        }

        let kept: Vec<u32> = history.iter().map(|s| s.fps).collect();
        assert_eq!(kept, vec![4, 5, 6, 7, 8]);
        assert_eq!(history.len(), 5);
        assert_eq!(history.average(), Some(6.0));
    }

    #[test]
    fn empty_history_has_no_average() {
        assert_eq!(FpsHistory::new(3).average(), None);
    }

    #[test]
    fn sixty_frames_in_a_second_reads_sixty() {
        let mut sampler = FrameRateSampler::new(&SamplerSettings::default());
        sampler.start(ms(0));

        let mut readings = Vec::new();
        for frame in 0..=60u64 {
            if let Some(reading) = sampler.record_frame(ms(frame * 1000 / 60)) {
                readings.push(reading);
            }
        }

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].fps, 60);
        assert_eq!(readings[0].average_fps, 60.0);
    }

    #[test]
    fn fps_is_scaled_by_actual_delta() {
        let mut sampler = FrameRateSampler::new(&SamplerSettings::default());
        sampler.start(ms(0));
        for _ in 0..30 {
            assert!(sampler.record_frame(ms(500)).is_none());
        }
        let reading = sampler.record_frame(ms(1500)).unwrap();
        assert_eq!(reading.fps, 20);
    }

    #[test]
    fn start_is_idempotent() {
        let mut sampler = FrameRateSampler::new(&SamplerSettings::default());
        assert!(sampler.start(ms(0)));
        sampler.record_frame(ms(10));
        assert!(!sampler.start(ms(900)));
        // The second start did not move the flush point.
        assert!(sampler.record_frame(ms(1000)).is_some());
    }

    #[test]
    fn stopped_sampler_ignores_frames() {
        let mut sampler = FrameRateSampler::new(&SamplerSettings::default());
        assert!(!sampler.stop());
        sampler.start(ms(0));
        assert!(sampler.stop());
        assert!(!sampler.stop());
        assert!(sampler.record_frame(ms(5000)).is_none());
        assert!(sampler.history().is_empty());
    }

    #[test]
    fn average_defaults_before_first_reading() {
        let sampler = FrameRateSampler::new(&SamplerSettings::default());
        assert_eq!(sampler.average_fps(), ASSUMED_FPS);
        assert_eq!(sampler.current_fps(), None);
    }

    #[test]
    fn level_changes_only_on_transitions() {
        let mut tracker = PerformanceLevelTracker::new(&SamplerSettings::default());
        assert_eq!(tracker.observe(58.0), None);
        assert_eq!(tracker.observe(40.0), Some(PerformanceLevel::Low));
        assert_eq!(tracker.observe(42.0), None);
        assert_eq!(tracker.observe(25.0), Some(PerformanceLevel::Critical));
        assert_eq!(tracker.observe(50.0), None);
        assert_eq!(tracker.observe(56.0), Some(PerformanceLevel::High));
    }

    #[test]
    fn levels_order_by_severity() {
        assert!(PerformanceLevel::High < PerformanceLevel::Low);
        assert!(PerformanceLevel::Low < PerformanceLevel::Critical);
    }
}
