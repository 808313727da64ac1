//! Parking spot registry
//!
//! Spots are only mutated through the handle-consuming methods below, which
//! the fleet controller wraps. A `SpotReservation` can only be produced for a
//! spot that is neither occupied nor reserved, and is consumed by `occupy`;
//! the resulting `OccupiedSpot` is consumed by `free`. Neither handle can be
//! cloned, so a bay cannot be occupied or freed twice.

use ordered_float::OrderedFloat;

use super::scene::SpotMarker;
use super::types::{Anchor, Position, SpotId, VehicleId};

/// Visual state of the bay indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpotIndicator {
    Free,
    Occupied,
}

/// One physical parking bay
#[derive(Debug, Clone)]
pub struct ParkingSpot {
    id: SpotId,
    spot_anchor: Anchor,
    entry_point: Anchor,
    occupied_by: Option<VehicleId>,
    reserved_by: Option<VehicleId>,
    indicator: SpotIndicator,
}

impl ParkingSpot {
    fn from_marker(id: SpotId, marker: &SpotMarker) -> Self {
        Self {
            id,
            spot_anchor: marker.anchor,
            // Markers without an EntryPoint child are approached directly
            entry_point: marker.entry_point.unwrap_or(marker.anchor),
            occupied_by: None,
            reserved_by: None,
            indicator: SpotIndicator::Free,
        }
    }

    pub fn id(&self) -> SpotId {
        self.id
    }

    /// Final pose a parked vehicle is snapped to
    pub fn spot_anchor(&self) -> Anchor {
        self.spot_anchor
    }

    /// Point approached before the final alignment
    pub fn entry_point(&self) -> Anchor {
        self.entry_point
    }

    pub fn is_occupied(&self) -> bool {
        self.occupied_by.is_some()
    }

    pub fn occupied_by(&self) -> Option<VehicleId> {
        self.occupied_by
    }

    pub fn reserved_by(&self) -> Option<VehicleId> {
        self.reserved_by
    }

    /// Neither occupied nor promised to an approaching vehicle
    pub fn is_available(&self) -> bool {
        self.occupied_by.is_none() && self.reserved_by.is_none()
    }

    pub fn indicator(&self) -> SpotIndicator {
        self.indicator
    }
}

/// Claim on a free spot, held by a vehicle on its way into the bay
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct SpotReservation {
    spot: SpotId,
    vehicle: VehicleId,
}

impl SpotReservation {
    pub fn spot(&self) -> SpotId {
        self.spot
    }

    pub fn vehicle(&self) -> VehicleId {
        self.vehicle
    }
}

/// Proof that a vehicle currently holds a bay
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct OccupiedSpot {
    spot: SpotId,
    vehicle: VehicleId,
}

impl OccupiedSpot {
    pub fn spot(&self) -> SpotId {
        self.spot
    }

    pub fn vehicle(&self) -> VehicleId {
        self.vehicle
    }
}

/// Ordered set of known bays (order = scan order)
#[derive(Debug, Clone, Default)]
pub struct SpotRegistry {
    spots: Vec<ParkingSpot>,
}

impl SpotRegistry {
    pub fn from_markers<'a>(markers: impl IntoIterator<Item = &'a SpotMarker>) -> Self {
        let spots = markers
            .into_iter()
            .enumerate()
            .map(|(index, marker)| ParkingSpot::from_marker(SpotId(index), marker))
            .collect();
        Self { spots }
    }

    pub fn len(&self) -> usize {
        self.spots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spots.is_empty()
    }

    pub fn get(&self, id: SpotId) -> Option<&ParkingSpot> {
        self.spots.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParkingSpot> {
        self.spots.iter()
    }

    pub fn has_free(&self) -> bool {
        self.spots.iter().any(ParkingSpot::is_available)
    }

    pub fn free_count(&self) -> usize {
        self.spots.iter().filter(|s| s.is_available()).count()
    }

    pub fn occupied_count(&self) -> usize {
        self.spots.iter().filter(|s| s.is_occupied()).count()
    }

    /// First available spot in registration order
    pub fn first_free(&self) -> Option<SpotId> {
        self.spots.iter().find(|s| s.is_available()).map(|s| s.id)
    }

    /// Available spot whose entry point is closest to `position`
    pub fn nearest_free(&self, position: &Position) -> Option<SpotId> {
        self.spots
            .iter()
            .filter(|s| s.is_available())
            .min_by_key(|s| OrderedFloat(s.entry_point.position.distance(position)))
            .map(|s| s.id)
    }

    /// Promise an available spot to `vehicle`
    pub(crate) fn reserve(&mut self, id: SpotId, vehicle: VehicleId) -> Option<SpotReservation> {
        let spot = self.spots.get_mut(id.index())?;
        if !spot.is_available() {
            return None;
        }
        spot.reserved_by = Some(vehicle);
        Some(SpotReservation { spot: id, vehicle })
    }

    pub(crate) fn occupy(&mut self, reservation: SpotReservation) -> OccupiedSpot {
        let SpotReservation { spot: id, vehicle } = reservation;
        let spot = &mut self.spots[id.index()];
        spot.reserved_by = None;
        spot.occupied_by = Some(vehicle);
        spot.indicator = SpotIndicator::Occupied;
        OccupiedSpot { spot: id, vehicle }
    }

    pub(crate) fn free(&mut self, occupied: OccupiedSpot) {
        let spot = &mut self.spots[occupied.spot.index()];
        spot.occupied_by = None;
        spot.indicator = SpotIndicator::Free;
    }
}
