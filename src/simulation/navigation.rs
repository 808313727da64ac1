//! Navigation capability consumed by vehicle agents
//!
//! The agent only issues destination requests and samples progress; how a
//! vehicle actually gets there is up to the `Navigator` implementation.

use std::collections::VecDeque;
use std::f32::consts::{PI, TAU};
use std::sync::Arc;

use super::nav_mesh::NavMesh;
use super::types::{Anchor, Position, DEFAULT_STOPPING_DISTANCE};

/// Black-box steering backend attached to one vehicle
pub trait Navigator {
    /// Request a new destination; the path is computed asynchronously
    fn set_destination(&mut self, target: Position);

    /// A path computation is still in flight
    fn path_pending(&self) -> bool;

    /// Distance left along the current path
    fn remaining_distance(&self) -> f32;

    /// Arrival threshold
    fn stopping_distance(&self) -> f32;

    fn is_stopped(&self) -> bool;

    fn set_stopped(&mut self, stopped: bool);

    fn set_speed(&mut self, speed: f32);

    /// Turn rate in degrees per second
    fn set_angular_speed(&mut self, degrees_per_second: f32);

    /// Current transform of the vehicle
    fn pose(&self) -> Anchor;

    /// Teleport the vehicle, dropping any path in progress
    fn warp(&mut self, anchor: Anchor);

    /// Backend update, called once per simulation tick before the agent runs
    fn advance(&mut self, delta_secs: f32);

    /// No path pending and within the stopping distance of the destination
    fn has_arrived(&self) -> bool {
        !self.path_pending() && self.remaining_distance() <= self.stopping_distance()
    }
}

/// Navigator that follows `NavMesh` corners in straight segments
#[derive(Debug, Clone)]
pub struct KinematicNavigator {
    mesh: Arc<NavMesh>,
    pose: Anchor,
    destination: Option<Position>,
    corners: VecDeque<Position>,
    pending: bool,
    speed: f32,
    angular_speed: f32,
    stopping_distance: f32,
    stopped: bool,
}

impl KinematicNavigator {
    pub fn new(mesh: Arc<NavMesh>) -> Self {
        Self {
            mesh,
            pose: Anchor::default(),
            destination: None,
            corners: VecDeque::new(),
            pending: false,
            speed: 0.0,
            angular_speed: 0.0,
            stopping_distance: DEFAULT_STOPPING_DISTANCE,
            stopped: false,
        }
    }

    pub fn with_stopping_distance(mut self, stopping_distance: f32) -> Self {
        self.stopping_distance = stopping_distance;
        self
    }

    pub fn destination(&self) -> Option<Position> {
        self.destination
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn angular_speed(&self) -> f32 {
        self.angular_speed
    }

    fn turn_towards(&mut self, target: &Position, delta_secs: f32) {
        if self.pose.position.distance(target) <= f32::EPSILON {
            return;
        }
        let desired = self.pose.position.angle_to(target);
        let mut diff = (desired - self.pose.yaw) % TAU;
        if diff > PI {
            diff -= TAU;
        } else if diff < -PI {
            diff += TAU;
        }
        let max_turn = self.angular_speed.to_radians() * delta_secs;
        self.pose.yaw += diff.clamp(-max_turn, max_turn);
    }
}

impl Navigator for KinematicNavigator {
    fn set_destination(&mut self, target: Position) {
        self.destination = Some(target);
        self.corners.clear();
        self.pending = true;
    }

    fn path_pending(&self) -> bool {
        self.pending
    }

    fn remaining_distance(&self) -> f32 {
        if self.pending {
            return f32::INFINITY;
        }
        let mut total = 0.0;
        let mut last = self.pose.position;
        for corner in &self.corners {
            total += last.distance(corner);
            last = *corner;
        }
        total
    }

    fn stopping_distance(&self) -> f32 {
        self.stopping_distance
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn set_stopped(&mut self, stopped: bool) {
        self.stopped = stopped;
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    fn set_angular_speed(&mut self, degrees_per_second: f32) {
        self.angular_speed = degrees_per_second;
    }

    fn pose(&self) -> Anchor {
        self.pose
    }

    fn warp(&mut self, anchor: Anchor) {
        self.pose = anchor;
        self.destination = None;
        self.corners.clear();
        self.pending = false;
    }

    fn advance(&mut self, delta_secs: f32) {
        if self.pending {
            // Path computation takes one tick
            if let Some(destination) = self.destination {
                self.corners = self.mesh.find_path(&self.pose.position, &destination).into();
            }
            self.pending = false;
            return;
        }

        if self.stopped {
            return;
        }

        let mut budget = self.speed * delta_secs;
        while budget > 0.0 {
            let Some(corner) = self.corners.front().copied() else {
                break;
            };
            self.turn_towards(&corner, delta_secs);
            let distance = self.pose.position.distance(&corner);
            if distance <= budget {
                self.pose.position = corner;
                self.corners.pop_front();
                budget -= distance;
            } else {
                self.pose.position = self.pose.position.move_towards(&corner, budget);
                budget = 0.0;
            }
        }
    }
}
