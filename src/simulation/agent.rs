//! Per-vehicle navigation state machine
//!
//! Standalone implementation that doesn't depend on Bevy. An agent never
//! moves itself: it hands destinations to its `Navigator` and samples
//! arrival every `ARRIVAL_POLL_INTERVAL` seconds. Exactly one wait is
//! outstanding at a time (`Leg`), so replacing the leg cancels the previous
//! wait and a pooled vehicle has nothing left to fire.

use std::sync::Arc;

use log::{debug, warn};

use super::config::SimConfig;
use super::navigation::Navigator;
use super::parking::{OccupiedSpot, ParkingSpot, SpotReservation};
use super::scene::Route;
use super::types::{Anchor, Position, SpotId, VehicleId, VehiclePrefab, ARRIVAL_POLL_INTERVAL};

/// Tolerance for accumulated tick time when comparing against intervals
const TIME_EPSILON: f32 = 1e-4;

/// Observable state of an active vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleState {
    OnRoad,
    MovingToParking,
    Parking,
    Parked,
    Leaving,
}

/// Role decided once at spawn
#[derive(Debug)]
pub enum TripPlan {
    /// Through traffic: follow the road waypoints, then exit
    Road,
    /// Detour into the lot. `spot` is `None` when no bay could be claimed,
    /// in which case the vehicle falls back to road following.
    Park {
        spot: Option<SpotReservation>,
        variant: Option<usize>,
    },
}

/// Result of an agent update indicating what the fleet should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentUpdateResult {
    Continue,
    /// The exit anchor was reached; the vehicle goes back to the pool
    ReachedExit,
}

/// Mutation points an agent may call back into
pub trait FleetServices {
    fn spot(&self, id: SpotId) -> Option<&ParkingSpot>;
    fn occupy_spot(&mut self, reservation: SpotReservation) -> OccupiedSpot;
    fn free_spot(&mut self, spot: OccupiedSpot);
}

/// Per-vehicle tuning copied out of the simulation config
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSettings {
    pub road_speed: f32,
    pub parking_speed: f32,
    pub rotation_speed: f32,
    pub wait_time_before_leave: f32,
}

impl From<&SimConfig> for AgentSettings {
    fn from(config: &SimConfig) -> Self {
        Self {
            road_speed: config.road_speed,
            parking_speed: config.parking_speed,
            rotation_speed: config.rotation_speed,
            wait_time_before_leave: config.wait_time_before_leave,
        }
    }
}

/// The single outstanding wait of an agent
#[derive(Debug)]
enum Leg {
    Idle,
    Waypoint,
    ParkingEntry(SpotReservation),
    SpotEntry(SpotReservation),
    Dwell { spot: OccupiedSpot, remaining: f32 },
    Exit,
}

#[derive(Debug)]
pub struct VehicleAgent {
    id: VehicleId,
    settings: AgentSettings,
    route: Option<Arc<Route>>,
    state: Option<VehicleState>,
    leg: Leg,
    since_poll: f32,
    waypoint_index: usize,
    should_park: bool,
    parking_variant: Option<usize>,
}

impl VehicleAgent {
    pub fn new(id: VehicleId, settings: AgentSettings) -> Self {
        Self {
            id,
            settings,
            route: None,
            state: None,
            leg: Leg::Idle,
            since_poll: 0.0,
            waypoint_index: 0,
            should_park: false,
            parking_variant: None,
        }
    }

    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// `None` while the vehicle sits in the pool
    pub fn state(&self) -> Option<VehicleState> {
        self.state
    }

    pub fn waypoint_index(&self) -> usize {
        self.waypoint_index
    }

    pub fn will_park(&self) -> bool {
        self.should_park
    }

    pub fn parking_variant(&self) -> Option<usize> {
        self.parking_variant
    }

    /// Spot the vehicle is heading into or occupying
    pub fn target_spot(&self) -> Option<SpotId> {
        match &self.leg {
            Leg::ParkingEntry(reservation) | Leg::SpotEntry(reservation) => {
                Some(reservation.spot())
            }
            Leg::Dwell { spot, .. } => Some(spot.spot()),
            _ => None,
        }
    }

    pub fn is_heading_to_exit(&self) -> bool {
        matches!(self.leg, Leg::Exit)
    }

    /// Begin a fresh activation with the role chosen at spawn
    pub fn start(&mut self, route: Arc<Route>, plan: TripPlan, nav: &mut impl Navigator) {
        self.route = Some(route);
        self.waypoint_index = 0;
        nav.set_speed(self.settings.road_speed);
        nav.set_angular_speed(self.settings.rotation_speed);

        match plan {
            TripPlan::Road => {
                self.should_park = false;
                self.parking_variant = None;
                self.follow_road_waypoints(nav);
            }
            TripPlan::Park { spot, variant } => {
                self.should_park = true;
                self.parking_variant = variant;
                self.find_parking_spot(spot, nav);
            }
        }
    }

    fn find_parking_spot(&mut self, spot: Option<SpotReservation>, nav: &mut impl Navigator) {
        let entry = self.route.as_ref().and_then(|r| r.parking_entry());
        match (spot, entry) {
            (Some(reservation), Some(entry)) => {
                debug!(
                    "{:?} heading to parking entry for {:?}",
                    self.id,
                    reservation.spot()
                );
                self.state = Some(VehicleState::MovingToParking);
                self.set_leg(nav, entry.position, Leg::ParkingEntry(reservation));
            }
            (Some(reservation), None) => {
                warn!(
                    "{:?} holds {:?} but the lot has no entry point",
                    self.id,
                    reservation.spot()
                );
                self.state = Some(VehicleState::MovingToParking);
                self.leg = Leg::ParkingEntry(reservation);
                self.since_poll = ARRIVAL_POLL_INTERVAL;
            }
            (None, _) => {
                debug!("{:?} found no free spot; staying on the road", self.id);
                self.follow_road_waypoints(nav);
            }
        }
    }

    fn follow_road_waypoints(&mut self, nav: &mut impl Navigator) {
        self.state = Some(VehicleState::OnRoad);
        nav.set_speed(self.settings.road_speed);
        self.waypoint_index = 0;

        match self.route_waypoint(0) {
            Some(first) => self.set_leg(nav, first.position, Leg::Waypoint),
            None => self.move_to_exit(nav),
        }
    }

    fn move_to_exit(&mut self, nav: &mut impl Navigator) {
        match self.route.as_ref().map(|r| r.exit_point()) {
            Some(exit) => self.set_leg(nav, exit.position, Leg::Exit),
            None => {
                warn!("{:?} has no route to leave by", self.id);
                self.leg = Leg::Exit;
            }
        }
    }

    fn route_waypoint(&self, index: usize) -> Option<Anchor> {
        self.route
            .as_ref()
            .and_then(|r| r.road_waypoints().get(index).copied())
    }

    fn set_leg(&mut self, nav: &mut impl Navigator, destination: Position, leg: Leg) {
        nav.set_destination(destination);
        self.leg = leg;
        // First arrival check happens on the next update
        self.since_poll = ARRIVAL_POLL_INTERVAL;
    }

    /// Advance timers and sample arrival
    pub fn update(
        &mut self,
        delta_secs: f32,
        nav: &mut impl Navigator,
        fleet: &mut impl FleetServices,
    ) -> AgentUpdateResult {
        if let Leg::Dwell { remaining, .. } = &mut self.leg {
            *remaining -= delta_secs;
            let expired = *remaining <= TIME_EPSILON;
            if expired {
                self.leave(nav, fleet);
            }
            return AgentUpdateResult::Continue;
        }
        if matches!(self.leg, Leg::Idle) {
            return AgentUpdateResult::Continue;
        }

        self.since_poll += delta_secs;
        if self.since_poll + TIME_EPSILON < ARRIVAL_POLL_INTERVAL {
            return AgentUpdateResult::Continue;
        }
        self.since_poll = 0.0;

        if !nav.has_arrived() {
            return AgentUpdateResult::Continue;
        }
        self.on_arrival(nav, fleet)
    }

    fn on_arrival(
        &mut self,
        nav: &mut impl Navigator,
        fleet: &mut impl FleetServices,
    ) -> AgentUpdateResult {
        match std::mem::replace(&mut self.leg, Leg::Idle) {
            Leg::Waypoint => {
                self.waypoint_index += 1;
                match self.route_waypoint(self.waypoint_index) {
                    Some(next) => self.set_leg(nav, next.position, Leg::Waypoint),
                    None => self.move_to_exit(nav),
                }
                AgentUpdateResult::Continue
            }
            Leg::ParkingEntry(reservation) => {
                self.start_parking(reservation, nav, &*fleet);
                AgentUpdateResult::Continue
            }
            Leg::SpotEntry(reservation) => {
                self.complete_parking(reservation, nav, fleet);
                AgentUpdateResult::Continue
            }
            Leg::Exit => {
                debug!("{:?} reached the exit", self.id);
                AgentUpdateResult::ReachedExit
            }
            leg @ (Leg::Idle | Leg::Dwell { .. }) => {
                self.leg = leg;
                AgentUpdateResult::Continue
            }
        }
    }

    fn start_parking(
        &mut self,
        reservation: SpotReservation,
        nav: &mut impl Navigator,
        fleet: &impl FleetServices,
    ) {
        self.state = Some(VehicleState::Parking);
        nav.set_speed(self.settings.parking_speed);

        match fleet.spot(reservation.spot()).map(ParkingSpot::entry_point) {
            Some(entry) => self.set_leg(nav, entry.position, Leg::SpotEntry(reservation)),
            None => {
                // Nothing to drive to; the next poll completes the manoeuvre in place
                self.leg = Leg::SpotEntry(reservation);
                self.since_poll = ARRIVAL_POLL_INTERVAL;
            }
        }
    }

    fn complete_parking(
        &mut self,
        reservation: SpotReservation,
        nav: &mut impl Navigator,
        fleet: &mut impl FleetServices,
    ) {
        self.state = Some(VehicleState::Parked);
        let occupied = fleet.occupy_spot(reservation);

        if let Some(anchor) = fleet.spot(occupied.spot()).map(ParkingSpot::spot_anchor) {
            nav.warp(anchor);
        }
        nav.set_stopped(true);

        debug!("{:?} parked in {:?}", self.id, occupied.spot());
        self.leg = Leg::Dwell {
            spot: occupied,
            remaining: self.settings.wait_time_before_leave,
        };
    }

    fn leave(&mut self, nav: &mut impl Navigator, fleet: &mut impl FleetServices) {
        let Leg::Dwell { spot, .. } = std::mem::replace(&mut self.leg, Leg::Idle) else {
            return;
        };

        self.state = Some(VehicleState::Leaving);
        debug!("{:?} leaving {:?}", self.id, spot.spot());
        fleet.free_spot(spot);
        nav.set_stopped(false);
        nav.set_speed(self.settings.road_speed);

        self.move_to_exit(nav);
    }

    /// Tear down every outstanding wait; the vehicle is going back to the pool
    pub fn reset(&mut self) {
        if self.target_spot().is_some() {
            warn!("{:?} deactivated while still holding a spot", self.id);
        }
        self.leg = Leg::Idle;
        self.state = None;
        self.since_poll = 0.0;
        self.waypoint_index = 0;
        self.should_park = false;
        self.parking_variant = None;
        self.route = None;
    }
}

/// A pooled vehicle instance: template, state machine and steering backend
#[derive(Debug)]
pub struct Vehicle<N> {
    id: VehicleId,
    prefab: VehiclePrefab,
    agent: VehicleAgent,
    nav: N,
}

impl<N: Navigator> Vehicle<N> {
    pub fn new(id: VehicleId, prefab: VehiclePrefab, settings: AgentSettings, mut nav: N) -> Self {
        nav.set_speed(settings.road_speed);
        nav.set_angular_speed(settings.rotation_speed);
        nav.set_stopped(true);
        Self {
            id,
            prefab,
            agent: VehicleAgent::new(id, settings),
            nav,
        }
    }

    pub fn id(&self) -> VehicleId {
        self.id
    }

    pub fn prefab(&self) -> &VehiclePrefab {
        &self.prefab
    }

    pub fn agent(&self) -> &VehicleAgent {
        &self.agent
    }

    pub fn navigator(&self) -> &N {
        &self.nav
    }

    pub fn pose(&self) -> Anchor {
        self.nav.pose()
    }

    pub fn state(&self) -> Option<VehicleState> {
        self.agent.state()
    }

    pub fn is_active(&self) -> bool {
        self.agent.state().is_some()
    }

    /// Place the vehicle at `spawn` and hand it its role
    pub(crate) fn activate(&mut self, spawn: Anchor, route: Arc<Route>, plan: TripPlan) {
        self.nav.warp(spawn);
        self.nav.set_stopped(false);
        self.agent.start(route, plan, &mut self.nav);
    }

    pub(crate) fn update(
        &mut self,
        delta_secs: f32,
        fleet: &mut impl FleetServices,
    ) -> AgentUpdateResult {
        self.nav.advance(delta_secs);
        self.agent.update(delta_secs, &mut self.nav, fleet)
    }

    pub(crate) fn deactivate(&mut self) {
        self.agent.reset();
        self.nav.set_stopped(true);
    }
}
