//! Systems for syncing Bevy entities with simulation state

use bevy::prelude::*;

use super::components::{SimWorldResource, SimulationControl, SpotLamp, SpotLink, StatsText, VehicleLink};
use crate::simulation::SpotIndicator;

/// System to run simulation tick
pub fn tick_simulation(
    time: Res<Time>,
    control: Res<SimulationControl>,
    mut sim_world: ResMut<SimWorldResource>,
) {
    if control.paused {
        return;
    }
    sim_world.0.tick(time.delta_secs());
}

/// System to move vehicle bodies and hide the ones sitting in the pool
pub fn sync_vehicles(
    sim_world: Res<SimWorldResource>,
    mut vehicle_query: Query<(&VehicleLink, &mut Transform, &mut Visibility)>,
) {
    let world = &sim_world.0;

    for (link, mut transform, mut visibility) in vehicle_query.iter_mut() {
        let Some(vehicle) = world.vehicle(link.0) else {
            continue;
        };

        if !vehicle.is_active() {
            *visibility = Visibility::Hidden;
            continue;
        }

        let pose = vehicle.pose();
        transform.translation.x = pose.position.x;
        transform.translation.z = pose.position.z;
        transform.rotation = Quat::from_rotation_y(pose.yaw);
        *visibility = Visibility::Visible;
    }
}

/// System to colour each bay's lamp from its indicator
pub fn update_spot_lamps(
    sim_world: Res<SimWorldResource>,
    spot_query: Query<(&SpotLink, &Children)>,
    lamp_query: Query<&MeshMaterial3d<StandardMaterial>, With<SpotLamp>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (link, children) in spot_query.iter() {
        let Some(spot) = sim_world.0.spot(link.0) else {
            continue;
        };
        let color = match spot.indicator() {
            SpotIndicator::Free => Color::srgb(0.0, 1.0, 0.0),
            SpotIndicator::Occupied => Color::srgb(1.0, 0.0, 0.0),
        };

        for child in children.iter() {
            if let Ok(material_handle) = lamp_query.get(child) {
                if let Some(material) = materials.get_mut(&material_handle.0) {
                    material.base_color = color;
                }
            }
        }
    }
}

/// System to update the stats panel
pub fn update_stats_text(
    sim_world: Res<SimWorldResource>,
    control: Res<SimulationControl>,
    mut text_query: Query<(&StatsText, &mut Text)>,
) {
    let world = &sim_world.0;
    let stats = world.stats();

    for (kind, mut text) in text_query.iter_mut() {
        **text = match kind {
            StatsText::Traffic => format!("Traffic: {}", stats.total_spawned),
            StatsText::Parked => format!("Parked: {}", stats.parked_count),
            StatsText::Free => format!("Free: {}", stats.free_spots),
            StatsText::Status => format!(
                "{} | {:.0}s | {} on road, {} pooled",
                if control.paused { "Paused" } else { "Running" },
                world.time(),
                world.active_count(),
                world.pooled_count()
            ),
        };
    }
}
