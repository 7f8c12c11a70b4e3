//! Process resource metrics, logged after each exchange.

use parking_lot::Mutex;
use serde::Serialize;
use std::time::{Duration, Instant};
use sysinfo::{Pid, System};

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceMetrics {
    /// CPU usage of this process since the previous refresh (may exceed 100 on multi-core)
    pub cpu_percent: f32,
    pub memory_mb: f64,
    pub uptime: Duration,
}

pub struct PerformanceMonitor {
    system: Mutex<System>,
    pid: Option<Pid>,
    started_at: Instant,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        let pid = sysinfo::get_current_pid().ok();
        if pid.is_none() {
            tracing::warn!("Could not determine current pid, process metrics disabled");
        }
        Self {
            system: Mutex::new(System::new()),
            pid,
            started_at: Instant::now(),
        }
    }

    pub fn get_metrics(&self) -> PerformanceMetrics {
        let mut metrics = PerformanceMetrics {
            cpu_percent: 0.0,
            memory_mb: 0.0,
            uptime: self.started_at.elapsed(),
        };

        let Some(pid) = self.pid else {
            return metrics;
        };

        let mut sys = self.system.lock();
        if sys.refresh_process(pid) {
            if let Some(process) = sys.process(pid) {
                metrics.cpu_percent = process.cpu_usage();
                metrics.memory_mb = process.memory() as f64 / (1024.0 * 1024.0);
            }
        }
        metrics
    }

    pub fn log_metrics(&self) {
        let m = self.get_metrics();
        tracing::info!(
            cpu_percent = m.cpu_percent,
            memory_mb = m.memory_mb,
            uptime_secs = m.uptime.as_secs(),
            "Performance metrics"
        );
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_for_current_process() {
        let monitor = PerformanceMonitor::new();
        let metrics = monitor.get_metrics();
        assert!(metrics.cpu_percent >= 0.0);
        assert!(metrics.memory_mb >= 0.0);
    }
}
