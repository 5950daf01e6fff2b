//! System resource sampling.
//!
//! The supervisor samples the monitor before stepping a tool down a quality
//! tier, and the manager folds the latest reading into the health report.

use crate::config::HealthSettings;
use crate::health::HealthStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, RefreshKind, System};
use tracing::debug;

/// One reading of system load, as percentages in 0-100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub disk_percent: f32,
    pub sampled_at: DateTime<Utc>,
}

impl ResourceSnapshot {
    pub fn new(cpu_percent: f32, memory_percent: f32, disk_percent: f32) -> Self {
        Self {
            cpu_percent,
            memory_percent,
            disk_percent,
            sampled_at: Utc::now(),
        }
    }

    /// Highest of the three usage figures.
    pub fn max_usage(&self) -> f32 {
        self.cpu_percent.max(self.memory_percent).max(self.disk_percent)
    }

    /// Classify this reading against the configured high-water marks.
    pub fn classify(&self, thresholds: &HealthSettings) -> HealthStatus {
        let peak = self.max_usage();
        if peak >= thresholds.resource_critical_percent {
            HealthStatus::Critical
        } else if peak >= thresholds.resource_warning_percent {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        }
    }

    /// Names and values of the resources at or above `percent`.
    pub fn over(&self, percent: f32) -> Vec<(&'static str, f32)> {
        [
            ("cpu", self.cpu_percent),
            ("memory", self.memory_percent),
            ("disk", self.disk_percent),
        ]
        .into_iter()
        .filter(|(_, v)| *v >= percent)
        .collect()
    }
}

/// Source of resource readings.
pub trait ResourceMonitor: Send + Sync {
    /// Take (or return a recent) reading. Must not block for long.
    fn sample(&self) -> ResourceSnapshot;
}

/// Monitor backed by `sysinfo`, caching readings for `min_interval`.
pub struct SystemResourceMonitor {
    state: Mutex<SystemState>,
    min_interval: Duration,
}

struct SystemState {
    system: System,
    disks: Disks,
    last: Option<(Instant, ResourceSnapshot)>,
}

impl SystemResourceMonitor {
    /// Create a monitor that refreshes at most every 500ms.
    pub fn new() -> Self {
        Self::with_interval(Duration::from_millis(500))
    }

    pub fn with_interval(min_interval: Duration) -> Self {
        let system = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::new().with_cpu_usage())
                .with_memory(MemoryRefreshKind::new().with_ram()),
        );

        Self {
            state: Mutex::new(SystemState {
                system,
                disks: Disks::new_with_refreshed_list(),
                last: None,
            }),
            min_interval,
        }
    }

    fn read(state: &mut SystemState) -> ResourceSnapshot {
        state.system.refresh_cpu_usage();
        state.system.refresh_memory();
        state.disks.refresh();

        let cpu = state.system.global_cpu_info().cpu_usage();

        let total_mem = state.system.total_memory();
        let memory = if total_mem == 0 {
            0.0
        } else {
            (state.system.used_memory() as f64 / total_mem as f64 * 100.0) as f32
        };

        // Report the fullest mounted disk; that is the one that fails first.
        let disk = state
            .disks
            .list()
            .iter()
            .filter(|d| d.total_space() > 0)
            .map(|d| {
                let used = d.total_space().saturating_sub(d.available_space());
                (used as f64 / d.total_space() as f64 * 100.0) as f32
            })
            .fold(0.0_f32, f32::max);

        ResourceSnapshot::new(cpu, memory, disk)
    }
}

impl Default for SystemResourceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceMonitor for SystemResourceMonitor {
    fn sample(&self) -> ResourceSnapshot {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some((at, snapshot)) = &state.last {
            if at.elapsed() < self.min_interval {
                return snapshot.clone();
            }
        }

        let snapshot = Self::read(&mut state);
        debug!(
            cpu = snapshot.cpu_percent,
            memory = snapshot.memory_percent,
            disk = snapshot.disk_percent,
            "Sampled system resources"
        );
        state.last = Some((Instant::now(), snapshot.clone()));
        snapshot
    }
}

/// Monitor returning a fixed reading that can be changed at runtime.
///
/// Used for deterministic runs and tests.
pub struct StaticResourceMonitor {
    snapshot: Mutex<ResourceSnapshot>,
}

impl StaticResourceMonitor {
    pub fn new(cpu_percent: f32, memory_percent: f32, disk_percent: f32) -> Self {
        Self {
            snapshot: Mutex::new(ResourceSnapshot::new(cpu_percent, memory_percent, disk_percent)),
        }
    }

    /// A monitor reporting an idle machine.
    pub fn idle() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn set(&self, cpu_percent: f32, memory_percent: f32, disk_percent: f32) {
        let mut guard = match self.snapshot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = ResourceSnapshot::new(cpu_percent, memory_percent, disk_percent);
    }
}

impl ResourceMonitor for StaticResourceMonitor {
    fn sample(&self) -> ResourceSnapshot {
        match self.snapshot.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
