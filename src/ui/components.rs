//! UI components and resources for linking Bevy entities to simulation state

use bevy::prelude::*;
use std::collections::HashMap;

use crate::simulation::{FleetController, KinematicNavigator, SpotId, VehicleId};

/// Resource wrapper for the fleet controller
#[derive(Resource)]
pub struct SimWorldResource(pub FleetController<KinematicNavigator>);

/// Pause toggle for the fixed-step simulation
#[derive(Resource, Default)]
pub struct SimulationControl {
    pub paused: bool,
}

/// Marker component for ground plane
#[derive(Component)]
pub struct Ground;

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Marker for entities synced from simulation
#[derive(Component)]
pub struct SimSynced;

/// Links a Bevy entity to a pooled simulation vehicle
#[derive(Component)]
pub struct VehicleLink(pub VehicleId);

/// Links a Bevy entity to a parking spot
#[derive(Component)]
pub struct SpotLink(pub SpotId);

/// The coloured lamp above a bay showing whether it is taken
#[derive(Component)]
pub struct SpotLamp;

/// Resource to track Bevy entities mapped to simulation entities
#[derive(Resource, Default)]
pub struct EntityMappings {
    pub vehicles: HashMap<VehicleId, Entity>,
    pub spots: HashMap<SpotId, Entity>,
}

/// Marker for the stats panel text lines
#[derive(Component)]
pub enum StatsText {
    Traffic,
    Parked,
    Free,
    Status,
}
