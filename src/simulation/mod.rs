//! Standalone parking simulation module
//!
//! This module contains all the core fleet and parking logic that can run
//! independently of the Bevy game engine. It can be tested via console
//! without needing to boot up the full game.

mod agent;
mod config;
mod fleet;
mod nav_mesh;
mod navigation;
mod parking;
mod pool;
mod scene;
mod stats;
mod types;

// Re-export public types for external use
pub use agent::{
    AgentSettings, AgentUpdateResult, FleetServices, TripPlan, Vehicle, VehicleAgent,
    VehicleState,
};
pub use config::{SimConfig, SpotSelection};
pub use fleet::FleetController;
pub use nav_mesh::{NavEdge, NavMesh};
pub use navigation::{KinematicNavigator, Navigator};
pub use parking::{OccupiedSpot, ParkingSpot, SpotIndicator, SpotRegistry, SpotReservation};
pub use pool::VehiclePool;
pub use scene::{Route, SceneLayout, SpotMarker};
pub use stats::{FleetStats, LogStatsSink, StatsSink};
pub use types::{
    Anchor, Position, SpotId, VehicleId, VehiclePrefab, VehicleType, ARRIVAL_POLL_INTERVAL,
    DEFAULT_STOPPING_DISTANCE,
};
