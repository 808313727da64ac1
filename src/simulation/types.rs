//! Core types for the parking simulation
//!
//! These are standalone types that don't depend on Bevy.

/// Identifier of a vehicle instance (index into the fleet's vehicle arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(pub usize);

impl VehicleId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Identifier of a parking spot (index into the spot registry, scan order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpotId(pub usize);

impl SpotId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Type of vehicle in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleType {
    /// Passenger car, allowed to use the parking lot
    Car,
    /// Through traffic only
    Truck,
}

impl VehicleType {
    /// Whether vehicles of this type may be assigned the parker role
    pub fn can_park(self) -> bool {
        matches!(self, VehicleType::Car)
    }
}

/// Template a pooled vehicle is instantiated from
#[derive(Debug, Clone, PartialEq)]
pub struct VehiclePrefab {
    pub name: String,
    pub vehicle_type: VehicleType,
}

impl VehiclePrefab {
    pub fn new(name: impl Into<String>, vehicle_type: VehicleType) -> Self {
        Self {
            name: name.into(),
            vehicle_type,
        }
    }
}

/// A 3D position in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn lerp(&self, other: &Position, t: f32) -> Position {
        Position {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }

    /// Calculate the angle from this position to another (Y-axis rotation)
    pub fn angle_to(&self, other: &Position) -> f32 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        let direction_len = (dx * dx + dz * dz).sqrt();
        if direction_len > 0.0 {
            (dx / direction_len).atan2(dz / direction_len)
        } else {
            0.0
        }
    }

    /// Step towards `target` by at most `max_step`, never overshooting
    pub fn move_towards(&self, target: &Position, max_step: f32) -> Position {
        let distance = self.distance(target);
        if distance <= max_step || distance <= f32::EPSILON {
            *target
        } else {
            self.lerp(target, max_step / distance)
        }
    }
}

/// A spatial anchor: position plus heading around the Y axis (radians)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Anchor {
    pub position: Position,
    pub yaw: f32,
}

impl Anchor {
    pub fn new(position: Position, yaw: f32) -> Self {
        Self { position, yaw }
    }

    pub fn at(x: f32, z: f32) -> Self {
        Self::new(Position::new(x, 0.0, z), 0.0)
    }

    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self
    }
}

/// Cadence at which arrival is sampled, in simulated seconds
pub const ARRIVAL_POLL_INTERVAL: f32 = 0.1;

/// Default arrival threshold of a navigator
pub const DEFAULT_STOPPING_DISTANCE: f32 = 0.5;
