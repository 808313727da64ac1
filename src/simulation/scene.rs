//! Scene description scanned at initialization
//!
//! A `SceneLayout` stands in for the level: it lists the parking-spot markers
//! (each with an optional `EntryPoint` child), the road route and the lot
//! entrance. The fleet controller reads it once and never touches it again.

use super::nav_mesh::NavMesh;
use super::types::{Anchor, Position};

/// A tagged parking-spot marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotMarker {
    /// Final pose of a parked vehicle
    pub anchor: Anchor,
    /// The marker's `EntryPoint` child, if it has one
    pub entry_point: Option<Anchor>,
}

impl SpotMarker {
    pub fn new(anchor: Anchor) -> Self {
        Self {
            anchor,
            entry_point: None,
        }
    }

    pub fn with_entry_point(mut self, entry_point: Anchor) -> Self {
        self.entry_point = Some(entry_point);
        self
    }
}

/// Shared, read-only route data handed to every vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    spawn_point: Anchor,
    road_waypoints: Vec<Anchor>,
    parking_entry: Option<Anchor>,
    exit_point: Anchor,
}

impl Route {
    pub fn new(
        spawn_point: Anchor,
        road_waypoints: Vec<Anchor>,
        parking_entry: Option<Anchor>,
        exit_point: Anchor,
    ) -> Self {
        Self {
            spawn_point,
            road_waypoints,
            parking_entry,
            exit_point,
        }
    }

    pub fn spawn_point(&self) -> Anchor {
        self.spawn_point
    }

    pub fn road_waypoints(&self) -> &[Anchor] {
        &self.road_waypoints
    }

    pub fn parking_entry(&self) -> Option<Anchor> {
        self.parking_entry
    }

    pub fn exit_point(&self) -> Anchor {
        self.exit_point
    }
}

/// Everything the simulation needs to know about the level
#[derive(Debug, Clone)]
pub struct SceneLayout {
    pub spawn_point: Anchor,
    pub road_waypoints: Vec<Anchor>,
    pub parking_entry: Option<Anchor>,
    pub exit_point: Anchor,
    pub spot_markers: Vec<SpotMarker>,
}

impl SceneLayout {
    /// All parking-spot markers, in scan order
    pub fn find_spot_markers(&self) -> &[SpotMarker] {
        &self.spot_markers
    }

    pub fn route(&self) -> Route {
        Route::new(
            self.spawn_point,
            self.road_waypoints.clone(),
            self.parking_entry,
            self.exit_point,
        )
    }

    /// A straight east-bound road with a parking lot on its north side
    ///
    /// Bays are laid out in rows of eight, each facing north, with its entry
    /// point four units south of the bay.
    pub fn demo(spot_count: usize) -> Self {
        const ROW_LENGTH: usize = 8;
        const BAY_WIDTH: f32 = 4.0;
        const ROW_SPACING: f32 = 10.0;

        let road_waypoints = [-30.0, -15.0, 0.0, 15.0, 30.0]
            .iter()
            .map(|&x| Anchor::at(x, 0.0).with_yaw(std::f32::consts::FRAC_PI_2))
            .collect();

        let spot_markers = (0..spot_count)
            .map(|i| {
                let row = (i / ROW_LENGTH) as f32;
                let col = (i % ROW_LENGTH) as f32;
                let x = (col - (ROW_LENGTH as f32 - 1.0) / 2.0) * BAY_WIDTH;
                let z = 16.0 + row * ROW_SPACING;
                SpotMarker::new(Anchor::at(x, z)).with_entry_point(Anchor::at(x, z - 4.0))
            })
            .collect();

        Self {
            spawn_point: Anchor::at(-45.0, 0.0).with_yaw(std::f32::consts::FRAC_PI_2),
            road_waypoints,
            parking_entry: Some(Anchor::at(0.0, 8.0)),
            exit_point: Anchor::at(45.0, 0.0),
            spot_markers,
        }
    }

    /// Navigation graph for this layout
    ///
    /// The road runs spawn → waypoints → exit. The lot entrance hangs off the
    /// road waypoint closest to it and fans out to every bay entry point.
    pub fn build_nav_mesh(&self) -> NavMesh {
        let mut mesh = NavMesh::new();

        let road: Vec<Position> = std::iter::once(self.spawn_point)
            .chain(self.road_waypoints.iter().copied())
            .chain(std::iter::once(self.exit_point))
            .map(|a| a.position)
            .collect();
        let road_nodes = mesh.connect_chain(&road);

        if let Some(entry) = self.parking_entry {
            let entry_node = mesh.add_node(entry.position);
            if let Some(&junction) = road_nodes.iter().min_by(|&&a, &&b| {
                let dist_a = mesh.position(a).map_or(f32::INFINITY, |p| p.distance(&entry.position));
                let dist_b = mesh.position(b).map_or(f32::INFINITY, |p| p.distance(&entry.position));
                dist_a
                    .partial_cmp(&dist_b)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }) {
                mesh.connect(junction, entry_node);
            }

            for marker in &self.spot_markers {
                let bay_entry = marker.entry_point.unwrap_or(marker.anchor);
                let bay_node = mesh.add_node(bay_entry.position);
                mesh.connect(entry_node, bay_node);
            }
        }

        mesh
    }
}
