//! Load-time settings for a simulation run
//!
//! All values are fixed for the lifetime of a `FleetController`.

use anyhow::{bail, Result};

use super::types::{VehiclePrefab, VehicleType, DEFAULT_STOPPING_DISTANCE};

/// How a parking vehicle picks its bay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpotSelection {
    /// First unoccupied spot in registration order
    #[default]
    FirstFree,
    /// Free spot whose entry point is closest to the vehicle
    Nearest,
}

/// Simulation configuration
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Pool capacity; also the cap on simultaneously active vehicles
    pub max_vehicles: usize,
    /// Seconds between spawn attempts
    pub spawn_interval: f32,
    /// Chance that a parking-capable vehicle is assigned the parker role
    pub car_to_park_probability: f32,
    /// Cruise speed on the road and when leaving
    pub road_speed: f32,
    /// Speed while manoeuvring into a bay
    pub parking_speed: f32,
    /// Turn rate in degrees per second
    pub rotation_speed: f32,
    /// Dwell time in a bay before departing
    pub wait_time_before_leave: f32,
    /// Arrival threshold handed to each navigator
    pub stopping_distance: f32,
    pub spot_selection: SpotSelection,
    /// Templates the pool is filled from, picked uniformly per instance
    pub vehicle_prefabs: Vec<VehiclePrefab>,
    /// Opaque tags a parker may be given, picked uniformly
    pub parking_variants: Vec<String>,
    /// Seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_vehicles: 20,
            spawn_interval: 2.0,
            car_to_park_probability: 0.3,
            road_speed: 6.0,
            parking_speed: 2.0,
            rotation_speed: 120.0,
            wait_time_before_leave: 10.0,
            stopping_distance: DEFAULT_STOPPING_DISTANCE,
            spot_selection: SpotSelection::FirstFree,
            vehicle_prefabs: vec![
                VehiclePrefab::new("sedan", VehicleType::Car),
                VehiclePrefab::new("hatchback", VehicleType::Car),
                VehiclePrefab::new("truck", VehicleType::Truck),
            ],
            parking_variants: vec!["sedan".to_string(), "hatchback".to_string()],
            seed: None,
        }
    }
}

impl SimConfig {
    /// Check that every setting is usable
    pub fn validate(&self) -> Result<()> {
        if self.max_vehicles == 0 {
            bail!("max_vehicles must be at least 1");
        }
        if !(self.spawn_interval > 0.0) {
            bail!("spawn_interval must be positive, got {}", self.spawn_interval);
        }
        if !(0.0..=1.0).contains(&self.car_to_park_probability) {
            bail!(
                "car_to_park_probability must be within [0, 1], got {}",
                self.car_to_park_probability
            );
        }
        for (name, value) in [
            ("road_speed", self.road_speed),
            ("parking_speed", self.parking_speed),
            ("rotation_speed", self.rotation_speed),
        ] {
            if !(value > 0.0) {
                bail!("{} must be positive, got {}", name, value);
            }
        }
        if !(self.wait_time_before_leave >= 0.0) {
            bail!(
                "wait_time_before_leave must not be negative, got {}",
                self.wait_time_before_leave
            );
        }
        if !(self.stopping_distance >= 0.0) {
            bail!(
                "stopping_distance must not be negative, got {}",
                self.stopping_distance
            );
        }
        if self.vehicle_prefabs.is_empty() {
            bail!("at least one vehicle prefab is required");
        }
        Ok(())
    }
}
