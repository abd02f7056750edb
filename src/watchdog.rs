//! Rendering context loss detection and bounded recovery.
//!
//! The watchdog does not own a timer. Restore attempts and health checks are
//! stored as due timestamps and executed by [`ContextWatchdog::poll`], which
//! the plugin calls once per frame.

use bevy::log::{info, warn};
use serde::Serialize;
use std::time::Duration;

use crate::{config::WatchdogSettings, error::ContextError, events::PerfEvent};

/// Host rendering context observed by the watchdog.
pub trait RenderContext: Send + Sync + 'static {
    /// Cheap, side-effect-free query used as a liveness probe.
    fn check_health(&self) -> Result<(), ContextError>;

    /// Try to recreate the context. Returns `true` when it is usable again.
    fn try_restore(&mut self) -> bool;

    /// Stop the host from tearing the surface down on loss, so that it can
    /// be restored in place.
    fn prevent_default_teardown(&mut self) {}

    /// Human readable renderer description, for reports.
    fn describe(&self) -> Option<String> {
        None
    }
}

/// Where the watchdog is in the loss/restore lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContextState {
    /// No context has been attached yet.
    Detached,
    /// The host could not provide a context at all.
    Unsupported,
    /// The context is usable.
    Available,
    /// The context was lost; `attempts` restores have been tried so far.
    Lost {
        attempts: u32,
        #[serde(skip)]
        next_attempt_at: Duration,
    },
    /// Every restore attempt failed.
    Failed { attempts: u32 },
}

/// Tracks context health and schedules restore attempts.
#[derive(Debug, Clone)]
pub struct ContextWatchdog {
    settings: WatchdogSettings,
    state: ContextState,
    next_health_check: Option<Duration>,
}

impl ContextWatchdog {
    pub fn new(settings: WatchdogSettings) -> Self {
        Self {
            settings,
            state: ContextState::Detached,
            next_health_check: None,
        }
    }

    /// Start watching `context`, or report that none exists.
    pub fn attach(
        &mut self,
        context: Option<&dyn RenderContext>,
        now: Duration,
    ) -> Vec<PerfEvent> {
        match context {
            Some(context) => {
                if let Some(renderer) = context.describe() {
                    info!("watching rendering context: {renderer}");
                }
                self.state = ContextState::Available;
                self.next_health_check = Some(now + self.settings.health_check_interval);
                Vec::new()
            }
            None => {
                warn!("no rendering context available");
                self.state = ContextState::Unsupported;
                self.next_health_check = None;
                vec![PerfEvent::NotSupported]
            }
        }
    }

    /// Handle an explicit loss signal from the host.
    pub fn context_lost(
        &mut self,
        now: Duration,
        context: &mut dyn RenderContext,
    ) -> Vec<PerfEvent> {
        if self.state != ContextState::Available {
            return Vec::new();
        }
        context.prevent_default_teardown();
        warn!("rendering context lost");
        self.enter_lost(now)
    }

    /// Handle an explicit restore signal from the host.
    pub fn context_restored(&mut self, now: Duration) -> Vec<PerfEvent> {
        match self.state {
            ContextState::Lost { .. } | ContextState::Failed { .. } => {
                info!("rendering context restored by host");
                self.mark_available(now)
            }
            _ => Vec::new(),
        }
    }

    /// Run any restore attempt or health check that has come due.
    pub fn poll(&mut self, now: Duration, context: &mut dyn RenderContext) -> Vec<PerfEvent> {
        match self.state {
            ContextState::Available => {
                let due = self.next_health_check.is_some_and(|at| now >= at);
                if !due {
                    return Vec::new();
                }
                self.next_health_check = Some(now + self.settings.health_check_interval);
                match context.check_health() {
                    Ok(()) => Vec::new(),
                    Err(error) => {
                        warn!("rendering context health check failed: {error}");
                        self.enter_lost(now)
                    }
                }
            }
            ContextState::Lost {
                attempts,
                next_attempt_at,
            } if now >= next_attempt_at => {
                let attempts = attempts + 1;
                info!(
                    "attempting rendering context restore ({attempts}/{})",
                    self.settings.max_restore_attempts
                );
                if context.try_restore() {
                    return self.mark_available(now);
                }
                if attempts >= self.settings.max_restore_attempts {
                    warn!("giving up on rendering context after {attempts} restore attempts");
                    self.state = ContextState::Failed { attempts };
                    return vec![PerfEvent::ContextRestoreFailed { attempts }];
                }
                self.state = ContextState::Lost {
                    attempts,
                    next_attempt_at: now + self.backoff(attempts + 1),
                };
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    /// Whether the context can currently be rendered to.
    pub fn is_available(&self) -> bool {
        self.state == ContextState::Available
    }

    /// Restore attempts made since the last loss.
    pub fn attempts(&self) -> u32 {
        match self.state {
            ContextState::Lost { attempts, .. } | ContextState::Failed { attempts } => attempts,
            _ => 0,
        }
    }

    fn enter_lost(&mut self, now: Duration) -> Vec<PerfEvent> {
        self.next_health_check = None;
        if self.settings.max_restore_attempts == 0 {
            self.state = ContextState::Failed { attempts: 0 };
            return vec![
                PerfEvent::ContextLost,
                PerfEvent::ContextRestoreFailed { attempts: 0 },
            ];
        }
        self.state = ContextState::Lost {
            attempts: 0,
            next_attempt_at: now + self.backoff(1),
        };
        vec![PerfEvent::ContextLost]
    }

    fn mark_available(&mut self, now: Duration) -> Vec<PerfEvent> {
        self.state = ContextState::Available;
        self.next_health_check = Some(now + self.settings.health_check_interval);
        vec![PerfEvent::ContextRestored]
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.settings.restore_base_delay * attempt
    }
}
