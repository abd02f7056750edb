//! Host capability providers.
//!
//! The classifier and the memory monitor never talk to the platform directly.
//! They read through the traits in this module, so a browser bridge, a native
//! window backend or a test fixture can each supply their own signals. Every
//! method returns `Option`: a missing capability is not an error, the caller
//! falls back to a compiled-in default.

use serde::{Deserialize, Serialize};
use sysinfo::{MemoryRefreshKind, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

/// Static capability signals read once at startup.
///
/// # Example
/// ```rust
/// use bevy_adaptive_quality::HostSignals;
///
/// struct Kiosk;
///
/// impl HostSignals for Kiosk {
///     fn logical_cores(&self) -> Option<u32> {
///         Some(4)
///     }
///
///     fn memory_gb(&self) -> Option<f32> {
///         Some(8.0)
///     }
/// }
/// ```
pub trait HostSignals {
    /// Number of logical CPU cores.
    fn logical_cores(&self) -> Option<u32> {
        None
    }

    /// Approximate device memory in gigabytes.
    fn memory_gb(&self) -> Option<f32> {
        None
    }

    /// Browser user agent, when running behind one.
    fn user_agent(&self) -> Option<String> {
        None
    }

    /// Display pixel ratio.
    fn pixel_ratio(&self) -> Option<f32> {
        None
    }

    /// Create a throwaway rendering surface to query the GPU name.
    ///
    /// The classifier releases the surface as soon as the query returns.
    fn open_probe_surface(&self) -> Option<Box<dyn ProbeSurface>> {
        None
    }
}

/// Disposable rendering surface used only to read renderer strings.
pub trait ProbeSurface {
    /// Unmasked renderer name, e.g. `"Adreno (TM) 640"`.
    fn renderer_name(&self) -> Option<String>;

    /// Tear the surface down. Called exactly once.
    fn release(&mut self);
}

/// Fixed signal values, for overrides and tests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticHostSignals {
    pub logical_cores: Option<u32>,
    pub memory_gb: Option<f32>,
    pub user_agent: Option<String>,
    pub pixel_ratio: Option<f32>,
}

impl HostSignals for StaticHostSignals {
    fn logical_cores(&self) -> Option<u32> {
        self.logical_cores
    }

    fn memory_gb(&self) -> Option<f32> {
        self.memory_gb
    }

    fn user_agent(&self) -> Option<String> {
        self.user_agent.clone()
    }

    fn pixel_ratio(&self) -> Option<f32> {
        self.pixel_ratio
    }
}

/// Signals read from the running process and operating system.
///
/// Native builds have no user agent and no cheap throwaway GPU surface, so
/// the GPU tier stays unknown unless the app supplies its own provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHostSignals;

const BYTES_PER_GB: f32 = 1024.0 * 1024.0 * 1024.0;
const BYTES_PER_MB: f32 = 1024.0 * 1024.0;

impl HostSignals for SystemHostSignals {
    fn logical_cores(&self) -> Option<u32> {
        std::thread::available_parallelism()
            .ok()
            .and_then(|n| u32::try_from(n.get()).ok())
    }

    fn memory_gb(&self) -> Option<f32> {
        let system = System::new_with_specifics(
            RefreshKind::nothing().with_memory(MemoryRefreshKind::nothing().with_ram()),
        );
        match system.total_memory() {
            0 => None,
            bytes => Some(bytes as f32 / BYTES_PER_GB),
        }
    }
}

/// Heap usage snapshot, in megabytes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeapUsage {
    /// Memory currently in use
    pub used_mb: f32,
    /// Memory reserved by the allocator or runtime
    pub total_mb: f32,
    /// Hard limit, when the host exposes one
    pub limit_mb: Option<f32>,
}

/// Optional heap introspection.
pub trait HeapProbe: Send + Sync + 'static {
    /// Current usage, or `None` when the host cannot tell.
    fn heap_usage(&mut self) -> Option<HeapUsage>;
}

/// Resident memory of the current process, read through `sysinfo`.
pub struct ProcessMemoryProbe {
    system: System,
}

impl Default for ProcessMemoryProbe {
    fn default() -> Self {
        Self {
            system: System::new_with_specifics(RefreshKind::nothing()),
        }
    }
}

impl HeapProbe for ProcessMemoryProbe {
    fn heap_usage(&mut self) -> Option<HeapUsage> {
        let pid = sysinfo::get_current_pid().ok()?;
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            false,
            ProcessRefreshKind::nothing().with_memory(),
        );
        let process = self.system.process(pid)?;

        Some(HeapUsage {
            used_mb: process.memory() as f32 / BYTES_PER_MB,
            total_mb: process.virtual_memory() as f32 / BYTES_PER_MB,
            limit_mb: None,
        })
    }
}

/// Probe for hosts without heap introspection.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHeapProbe;

impl HeapProbe for NoHeapProbe {
    fn heap_usage(&mut self) -> Option<HeapUsage> {
        None
    }
}
