//! Closed pool of reusable vehicle ids
//!
//! Every id lives in exactly one of the two collections: the FIFO queue of
//! inactive vehicles or the active list. Nothing is created after warm-up.

use log::warn;
use std::collections::VecDeque;

use super::types::VehicleId;

#[derive(Debug, Clone, Default)]
pub struct VehiclePool {
    pooled: VecDeque<VehicleId>,
    active: Vec<VehicleId>,
}

impl VehiclePool {
    /// Pool holding ids `0..capacity`, all inactive
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pooled: (0..capacity).map(VehicleId).collect(),
            active: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.pooled.len() + self.active.len()
    }

    pub fn pooled_len(&self) -> usize {
        self.pooled.len()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn active(&self) -> &[VehicleId] {
        &self.active
    }

    pub fn is_active(&self, id: VehicleId) -> bool {
        self.active.contains(&id)
    }

    /// Move the longest-waiting inactive vehicle to the active list
    pub fn checkout(&mut self) -> Option<VehicleId> {
        let id = self.pooled.pop_front()?;
        self.active.push(id);
        Some(id)
    }

    /// Move an active vehicle back to the end of the queue
    pub fn checkin(&mut self, id: VehicleId) {
        if let Some(index) = self.active.iter().position(|&a| a == id) {
            self.active.remove(index);
            self.pooled.push_back(id);
        } else {
            warn!("{:?} returned to the pool while not active", id);
        }
    }
}
