//! Fleet statistics and the sink they are pushed to

use log::info;

/// Snapshot pushed whenever a vehicle spawns or parks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FleetStats {
    pub total_spawned: usize,
    pub parked_count: usize,
    /// Bays not occupied (total spots minus parked vehicles)
    pub free_spots: usize,
}

/// Receiver of stats refreshes (on-screen text, logs, test probes)
pub trait StatsSink: Send + Sync {
    fn publish(&mut self, stats: &FleetStats);
}

/// Logs every refresh at info level
#[derive(Debug, Default)]
pub struct LogStatsSink;

impl StatsSink for LogStatsSink {
    fn publish(&mut self, stats: &FleetStats) {
        info!(
            "Traffic: {} | Parked: {} | Free: {}",
            stats.total_spawned, stats.parked_count, stats.free_spots
        );
    }
}

