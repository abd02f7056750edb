//! Periodic heap pressure checks.

use serde::Serialize;
use std::{collections::VecDeque, time::Duration};

use crate::{
    config::MemorySettings,
    events::PerfEvent,
    providers::{HeapProbe, HeapUsage},
};

/// Severity of a heap reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MemoryPressure {
    Warning,
    Critical,
}

/// Probes heap usage on a fixed interval and keeps a short history.
#[derive(Debug, Clone)]
pub struct MemoryMonitor {
    settings: MemorySettings,
    next_check: Option<Duration>,
    history: VecDeque<HeapUsage>,
}

impl MemoryMonitor {
    pub fn new(settings: MemorySettings) -> Self {
        Self {
            settings,
            next_check: None,
            history: VecDeque::with_capacity(settings.history_capacity),
        }
    }

    /// Arm the monitor; the first probe runs on the next poll.
    pub fn start(&mut self, now: Duration) {
        if self.next_check.is_none() {
            self.next_check = Some(now);
        }
    }

    /// Disarm the monitor. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.next_check = None;
    }

    /// Probe if a check is due, returning the event to publish, if any.
    pub fn poll(&mut self, now: Duration, probe: &mut dyn HeapProbe) -> Option<PerfEvent> {
        let due = self.next_check.is_some_and(|at| now >= at);
        if !due {
            return None;
        }
        self.next_check = Some(now + self.settings.check_interval);

        let usage = probe.heap_usage()?;
        while self.history.len() >= self.settings.history_capacity.max(1) {
            self.history.pop_front();
        }
        self.history.push_back(usage);

        match self.classify(&usage)? {
            MemoryPressure::Critical => Some(PerfEvent::MemoryCritical(usage)),
            MemoryPressure::Warning => Some(PerfEvent::MemoryWarning(usage)),
        }
    }

    /// Pressure implied by a single reading.
    pub fn classify(&self, usage: &HeapUsage) -> Option<MemoryPressure> {
        if usage.used_mb > self.settings.critical_mb {
            Some(MemoryPressure::Critical)
        } else if usage.used_mb > self.settings.warning_mb {
            Some(MemoryPressure::Warning)
        } else {
            None
        }
    }

    /// Oldest-first heap readings.
    pub fn history(&self) -> impl Iterator<Item = &HeapUsage> {
        self.history.iter()
    }

    pub fn latest(&self) -> Option<&HeapUsage> {
        self.history.back()
    }
}
