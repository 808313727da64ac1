//! Systems for spawning visual entities from simulation state

use bevy::prelude::*;

use super::components::{EntityMappings, SimSynced, SimWorldResource, SpotLamp, SpotLink, VehicleLink};
use crate::simulation::{FleetController, KinematicNavigator, Position, VehicleType};

type Fleet = FleetController<KinematicNavigator>;

const ROAD_HEIGHT: f32 = 0.02;

/// System to create initial visual entities from simulation state
pub fn spawn_initial_visuals(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    sim_world: Res<SimWorldResource>,
    mut mappings: ResMut<EntityMappings>,
) {
    let world = &sim_world.0;

    spawn_road(&mut commands, &mut meshes, &mut materials, world);
    spawn_route_markers(&mut commands, &mut meshes, &mut materials, world);
    spawn_spots(&mut commands, &mut meshes, &mut materials, world, &mut mappings);
    spawn_vehicles(&mut commands, &mut meshes, &mut materials, world, &mut mappings);
}

fn spawn_road(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
    world: &Fleet,
) {
    const ROAD_WIDTH: f32 = 3.0;
    const LANE_WIDTH: f32 = 1.5;

    let road: Vec<Position> = std::iter::once(world.spawn_point().position)
        .chain(world.road_waypoints().iter().map(|a| a.position))
        .chain(std::iter::once(world.exit_point().position))
        .collect();
    for pair in road.windows(2) {
        spawn_segment_visual(
            commands,
            meshes,
            materials,
            &pair[0],
            &pair[1],
            ROAD_WIDTH,
            Color::srgb(0.2, 0.2, 0.2),
        );
    }

    // Lot access lanes: road to entrance, entrance to every bay
    if let Some(entry) = world.parking_entry_point() {
        let junction = road
            .iter()
            .min_by(|a, b| {
                a.distance(&entry.position)
                    .total_cmp(&b.distance(&entry.position))
            })
            .copied();
        if let Some(junction) = junction {
            spawn_segment_visual(
                commands,
                meshes,
                materials,
                &junction,
                &entry.position,
                LANE_WIDTH,
                Color::srgb(0.25, 0.25, 0.25),
            );
        }
        for spot in world.spots().iter() {
            spawn_segment_visual(
                commands,
                meshes,
                materials,
                &entry.position,
                &spot.entry_point().position,
                LANE_WIDTH,
                Color::srgb(0.25, 0.25, 0.25),
            );
        }
    }
}

/// Spawn a flat strip between two points
fn spawn_segment_visual(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
    start: &Position,
    end: &Position,
    width: f32,
    color: Color,
) {
    let length = start.distance(end);
    if length <= f32::EPSILON {
        return;
    }
    let midpoint = start.lerp(end, 0.5);
    let rotation = Quat::from_rotation_y(start.angle_to(end));

    commands.spawn((
        SimSynced,
        Mesh3d(meshes.add(Cuboid::new(width, ROAD_HEIGHT, length))),
        MeshMaterial3d(materials.add(color)),
        Transform::from_translation(Vec3::new(midpoint.x, ROAD_HEIGHT / 2.0, midpoint.z))
            .with_rotation(rotation),
    ));
}

/// Posts at the spawn point (green), exit (red) and lot entrance (yellow)
fn spawn_route_markers(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
    world: &Fleet,
) {
    const POST_SIZE: f32 = 0.8;
    const POST_HEIGHT: f32 = 2.0;

    let mut markers = vec![
        (world.spawn_point().position, Color::srgb(0.1, 0.8, 0.1)),
        (world.exit_point().position, Color::srgb(0.8, 0.1, 0.1)),
    ];
    if let Some(entry) = world.parking_entry_point() {
        markers.push((entry.position, Color::srgb(0.9, 0.8, 0.1)));
    }

    for (pos, color) in markers {
        commands.spawn((
            SimSynced,
            Mesh3d(meshes.add(Cuboid::new(POST_SIZE, POST_HEIGHT, POST_SIZE))),
            MeshMaterial3d(materials.add(color)),
            Transform::from_translation(Vec3::new(pos.x + 2.0, POST_HEIGHT / 2.0, pos.z - 2.0)),
        ));
    }
}

fn spawn_spots(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
    world: &Fleet,
    mappings: &mut ResMut<EntityMappings>,
) {
    const BAY_WIDTH: f32 = 3.2;
    const BAY_LENGTH: f32 = 4.5;
    const BAY_HEIGHT: f32 = 0.03;
    const LAMP_SIZE: f32 = 0.5;
    let bay_color = Color::srgb(0.35, 0.35, 0.4);

    for spot in world.spots().iter() {
        let anchor = spot.spot_anchor();
        let entity = commands
            .spawn((
                SimSynced,
                SpotLink(spot.id()),
                Mesh3d(meshes.add(Cuboid::new(BAY_WIDTH, BAY_HEIGHT, BAY_LENGTH))),
                MeshMaterial3d(materials.add(bay_color)),
                Transform::from_translation(Vec3::new(
                    anchor.position.x,
                    BAY_HEIGHT / 2.0,
                    anchor.position.z,
                ))
                .with_rotation(Quat::from_rotation_y(anchor.yaw)),
            ))
            .id();

        // Each bay gets its own material so the lamps can be recoloured independently
        commands.entity(entity).with_children(|parent| {
            parent.spawn((
                SpotLamp,
                Mesh3d(meshes.add(Cuboid::new(LAMP_SIZE, LAMP_SIZE, LAMP_SIZE))),
                MeshMaterial3d(materials.add(Color::srgb(0.0, 1.0, 0.0))),
                Transform::from_translation(Vec3::new(0.0, 1.5, BAY_LENGTH / 2.0)),
            ));
        });
        mappings.spots.insert(spot.id(), entity);
    }
}

/// Every pooled vehicle gets a body up front; sync toggles visibility
fn spawn_vehicles(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
    world: &Fleet,
    mappings: &mut ResMut<EntityMappings>,
) {
    for vehicle in world.vehicles() {
        let (width, height, length, color) = match vehicle.prefab().vehicle_type {
            VehicleType::Car => (1.6, 1.0, 3.0, Color::srgb(0.8, 0.2, 0.2)),
            VehicleType::Truck => (2.2, 1.8, 5.0, Color::srgb(0.2, 0.4, 0.8)),
        };
        let pose = vehicle.pose();

        let entity = commands
            .spawn((
                SimSynced,
                VehicleLink(vehicle.id()),
                Mesh3d(meshes.add(Cuboid::new(width, height, length))),
                MeshMaterial3d(materials.add(color)),
                Transform::from_translation(Vec3::new(
                    pose.position.x,
                    height / 2.0,
                    pose.position.z,
                ))
                .with_rotation(Quat::from_rotation_y(pose.yaw)),
                if vehicle.is_active() {
                    Visibility::Visible
                } else {
                    Visibility::Hidden
                },
            ))
            .id();
        mappings.vehicles.insert(vehicle.id(), entity);
    }
}
