//! UI module that visualizes the simulation state using Bevy
//!
//! This module is purely for visualization - all simulation logic is in the `simulation` module.
//! The UI reads state from `FleetController` and renders it using Bevy's 3D graphics.

mod components;
mod input;
mod spawner;
mod sync;
mod world;

use bevy::prelude::*;

pub use components::{EntityMappings, SimWorldResource, SimulationControl};

use input::handle_input;
use spawner::spawn_initial_visuals;
use sync::{sync_vehicles, tick_simulation, update_spot_lamps, update_stats_text};
use world::{setup_stats_panel, setup_world};

/// Plugin to register all UI systems
///
/// Expects a `SimWorldResource` to be inserted before the app starts.
pub struct ParkingSimUIPlugin;

impl Plugin for ParkingSimUIPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EntityMappings>()
            .init_resource::<SimulationControl>()
            .add_systems(
                Startup,
                (
                    setup_world,
                    spawn_initial_visuals.after(setup_world),
                    setup_stats_panel,
                ),
            )
            .add_systems(FixedUpdate, tick_simulation)
            .add_systems(
                Update,
                (sync_vehicles, update_spot_lamps, update_stats_text, handle_input),
            );
    }
}
