//! Fleet controller: vehicle pool, spot registry and spawn cadence
//!
//! This is the entry point for running the parking simulation without any
//! Bevy dependencies. All mutations happen synchronously inside `tick`.

use std::ops::Range;
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::agent::{
    AgentSettings, AgentUpdateResult, FleetServices, TripPlan, Vehicle, VehicleState,
};
use super::config::{SimConfig, SpotSelection};
use super::nav_mesh::NavMesh;
use super::navigation::{KinematicNavigator, Navigator};
use super::parking::{OccupiedSpot, ParkingSpot, SpotIndicator, SpotRegistry, SpotReservation};
use super::pool::VehiclePool;
use super::scene::{Route, SceneLayout};
use super::stats::{FleetStats, LogStatsSink, StatsSink};
use super::types::{Anchor, Position, SpotId, VehicleId, VehiclePrefab};

/// Owner of every shared mutable resource in a simulation run
pub struct FleetController<N: Navigator> {
    config: SimConfig,
    route: Arc<Route>,
    spots: SpotRegistry,
    pool: VehiclePool,

    /// Vehicle arena indexed by `VehicleId`; a slot is only empty while its
    /// vehicle is being stepped
    vehicles: Vec<Option<Vehicle<N>>>,

    /// Seconds accumulated towards the next spawn attempt
    spawn_timer: f32,

    /// Simulation time
    time: f32,

    total_spawned: usize,
    parked_count: usize,
    spawn_attempts: usize,
    spawn_skips: usize,

    /// Optional seeded RNG for reproducible simulations
    rng: Option<StdRng>,

    stats_sink: Box<dyn StatsSink>,
}

impl<N: Navigator> FleetController<N> {
    fn new_internal(
        config: SimConfig,
        layout: &SceneLayout,
        mut make_navigator: impl FnMut(VehicleId, &VehiclePrefab) -> N,
        stats_sink: Box<dyn StatsSink>,
    ) -> Result<Self> {
        config.validate().context("Invalid simulation config")?;

        let spots = SpotRegistry::from_markers(layout.find_spot_markers());
        info!("Parking spots: {}", spots.len());

        let mut controller = Self {
            route: Arc::new(layout.route()),
            spots,
            pool: VehiclePool::with_capacity(config.max_vehicles),
            vehicles: Vec::with_capacity(config.max_vehicles),
            spawn_timer: 0.0,
            time: 0.0,
            total_spawned: 0,
            parked_count: 0,
            spawn_attempts: 0,
            spawn_skips: 0,
            rng: config.seed.map(StdRng::seed_from_u64),
            stats_sink,
            config,
        };

        let settings = AgentSettings::from(&controller.config);
        for index in 0..controller.config.max_vehicles {
            let id = VehicleId(index);
            let prefab_index = controller
                .random_index(controller.config.vehicle_prefabs.len())
                .context("No vehicle prefabs configured")?;
            let prefab = controller.config.vehicle_prefabs[prefab_index].clone();
            let nav = make_navigator(id, &prefab);
            controller
                .vehicles
                .push(Some(Vehicle::new(id, prefab, settings, nav)));
        }
        debug!("Vehicle pool warmed up with {} vehicles", controller.vehicles.len());

        controller.refresh_stats();
        Ok(controller)
    }

    /// Create a controller that reports stats to the log
    pub fn new(
        config: SimConfig,
        layout: &SceneLayout,
        make_navigator: impl FnMut(VehicleId, &VehiclePrefab) -> N,
    ) -> Result<Self> {
        Self::new_internal(config, layout, make_navigator, Box::new(LogStatsSink))
    }

    /// Create a controller that reports stats to a custom sink
    pub fn with_stats_sink(
        config: SimConfig,
        layout: &SceneLayout,
        make_navigator: impl FnMut(VehicleId, &VehiclePrefab) -> N,
        stats_sink: Box<dyn StatsSink>,
    ) -> Result<Self> {
        Self::new_internal(config, layout, make_navigator, stats_sink)
    }

    /// Get a random value in the given range, using seeded RNG if available
    fn random_range(&mut self, range: Range<f32>) -> f32 {
        match &mut self.rng {
            Some(rng) => rng.random_range(range),
            None => rand::rng().random_range(range),
        }
    }

    /// Choose a random index below `len`, using seeded RNG if available
    fn random_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(match &mut self.rng {
            Some(rng) => rng.random_range(0..len),
            None => rand::rng().random_range(0..len),
        })
    }

    /// Main simulation tick
    pub fn tick(&mut self, delta_secs: f32) {
        self.time += delta_secs;
        self.update_spawner(delta_secs);
        self.update_vehicles(delta_secs);
    }

    /// Rate limiter plus capacity guard; a skipped attempt is not retried early
    ///
    /// At most one attempt per tick. A tick spanning several intervals does
    /// not leave a backlog behind: the timer restarts from zero instead.
    fn update_spawner(&mut self, delta_secs: f32) {
        self.spawn_timer += delta_secs;
        if self.spawn_timer + 1e-4 < self.config.spawn_interval {
            return;
        }
        self.spawn_timer -= self.config.spawn_interval;
        if self.spawn_timer + 1e-4 >= self.config.spawn_interval {
            self.spawn_timer = 0.0;
        }
        self.spawn_attempts += 1;

        if self.pool.pooled_len() > 0 && self.pool.active_len() < self.config.max_vehicles {
            self.spawn_vehicle();
        } else {
            self.spawn_skips += 1;
            debug!(
                "Spawn skipped at {:.1}s (pooled: {}, active: {}/{})",
                self.time,
                self.pool.pooled_len(),
                self.pool.active_len(),
                self.config.max_vehicles
            );
        }
    }

    /// Take a vehicle out of the pool and send it on its way
    ///
    /// Returns `None` without side effects when the pool is empty.
    ///
    /// Unlike the timed spawner this skips the `max_vehicles` check, so a
    /// direct call never waits on `spawn_interval`. The active count stays
    /// bounded anyway: the pool holds exactly `max_vehicles` vehicles and is
    /// never refilled past that.
    pub fn spawn_vehicle(&mut self) -> Option<VehicleId> {
        let id = self.pool.checkout()?;
        let mut vehicle = self.vehicles.get_mut(id.index())?.take()?;

        let spawn = self.route.spawn_point();
        let will_park = vehicle.prefab().vehicle_type.can_park()
            && self.random_range(0.0..1.0) < self.config.car_to_park_probability
            && self.route.parking_entry().is_some()
            && self.has_free_spots();

        let plan = if will_park {
            let variant = self.random_index(self.config.parking_variants.len());
            let spot = self
                .find_nearest_free_spot(&spawn.position)
                .and_then(|spot| self.reserve_spot(spot, id));
            TripPlan::Park { spot, variant }
        } else {
            TripPlan::Road
        };

        vehicle.activate(spawn, Arc::clone(&self.route), plan);
        debug!(
            "Spawned {:?} ({}) as {:?}{}",
            id,
            vehicle.prefab().name,
            vehicle.state(),
            if vehicle.agent().will_park() { ", parker" } else { "" }
        );
        self.vehicles[id.index()] = Some(vehicle);

        self.total_spawned += 1;
        self.refresh_stats();
        Some(id)
    }

    /// Update all active vehicles and process their results
    fn update_vehicles(&mut self, delta_secs: f32) {
        let active: Vec<VehicleId> = self.pool.active().to_vec();

        for id in active {
            // Take the vehicle out so it can call back into the controller
            let Some(mut vehicle) = self.vehicles.get_mut(id.index()).and_then(Option::take)
            else {
                continue;
            };
            let result = vehicle.update(delta_secs, self);
            self.vehicles[id.index()] = Some(vehicle);

            if result == AgentUpdateResult::ReachedExit {
                self.return_vehicle_to_pool(id);
            }
        }
    }

    /// First bay that is neither occupied nor promised to another vehicle
    ///
    /// With the default `FirstFree` selection this is a scan in registration
    /// order and `position` is ignored.
    pub fn find_nearest_free_spot(&self, position: &Position) -> Option<SpotId> {
        match self.config.spot_selection {
            SpotSelection::FirstFree => self.spots.first_free(),
            SpotSelection::Nearest => self.spots.nearest_free(position),
        }
    }

    /// Promise an available bay to `vehicle`
    pub fn reserve_spot(&mut self, spot: SpotId, vehicle: VehicleId) -> Option<SpotReservation> {
        self.spots.reserve(spot, vehicle)
    }

    /// Mark the reserved bay as occupied by the reserving vehicle
    pub fn occupy_spot(&mut self, reservation: SpotReservation) -> OccupiedSpot {
        let occupied = self.spots.occupy(reservation);
        self.parked_count += 1;
        info!("{:?} occupied {:?}", occupied.vehicle(), occupied.spot());
        self.refresh_stats();
        occupied
    }

    /// Release a bay. Stats are not refreshed here, only on spawn and occupy.
    pub fn free_spot(&mut self, spot: OccupiedSpot) {
        info!("{:?} freed {:?}", spot.vehicle(), spot.spot());
        self.spots.free(spot);
        self.parked_count = self.parked_count.saturating_sub(1);
    }

    fn return_vehicle_to_pool(&mut self, id: VehicleId) {
        if let Some(vehicle) = self.vehicles.get_mut(id.index()).and_then(Option::as_mut) {
            vehicle.deactivate();
        }
        self.pool.checkin(id);
        debug!("{:?} returned to the pool", id);
    }

    fn refresh_stats(&mut self) {
        let stats = self.stats();
        self.stats_sink.publish(&stats);
    }

    pub fn stats(&self) -> FleetStats {
        FleetStats {
            total_spawned: self.total_spawned,
            parked_count: self.parked_count,
            free_spots: self.spots.len().saturating_sub(self.parked_count),
        }
    }

    pub fn has_free_spots(&self) -> bool {
        self.spots.has_free()
    }

    /// Bays neither occupied nor reserved
    pub fn free_spot_count(&self) -> usize {
        self.spots.free_count()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    pub fn spawn_point(&self) -> Anchor {
        self.route.spawn_point()
    }

    pub fn road_waypoints(&self) -> &[Anchor] {
        self.route.road_waypoints()
    }

    pub fn parking_entry_point(&self) -> Option<Anchor> {
        self.route.parking_entry()
    }

    pub fn exit_point(&self) -> Anchor {
        self.route.exit_point()
    }

    pub fn spots(&self) -> &SpotRegistry {
        &self.spots
    }

    pub fn spot(&self, id: SpotId) -> Option<&ParkingSpot> {
        self.spots.get(id)
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle<N>> {
        self.vehicles.get(id.index()).and_then(Option::as_ref)
    }

    /// Every vehicle instance, pooled or active
    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle<N>> {
        self.vehicles.iter().flatten()
    }

    pub fn active_vehicles(&self) -> impl Iterator<Item = &Vehicle<N>> {
        self.pool.active().iter().filter_map(|&id| self.vehicle(id))
    }

    pub fn active_ids(&self) -> &[VehicleId] {
        self.pool.active()
    }

    pub fn active_count(&self) -> usize {
        self.pool.active_len()
    }

    pub fn pooled_count(&self) -> usize {
        self.pool.pooled_len()
    }

    pub fn parked_count(&self) -> usize {
        self.parked_count
    }

    pub fn total_spawned(&self) -> usize {
        self.total_spawned
    }

    /// Spawner ticks that fired, whether or not a vehicle came out
    pub fn spawn_attempts(&self) -> usize {
        self.spawn_attempts
    }

    /// Spawner ticks suppressed by an empty pool or a full active set
    pub fn spawn_skips(&self) -> usize {
        self.spawn_skips
    }

    /// Verify the pool and spot registry invariants
    pub fn check_invariants(&self) -> Result<()> {
        let max = self.config.max_vehicles;
        ensure!(
            self.pool.active_len() <= max,
            "{} active vehicles exceed the cap of {}",
            self.pool.active_len(),
            max
        );
        ensure!(
            self.pool.active_len() + self.pool.pooled_len() == max,
            "pool leak: {} active + {} pooled != {}",
            self.pool.active_len(),
            self.pool.pooled_len(),
            max
        );

        for vehicle in self.vehicles() {
            let active = self.pool.is_active(vehicle.id());
            ensure!(
                active == vehicle.is_active(),
                "{:?} pool membership disagrees with its state {:?}",
                vehicle.id(),
                vehicle.state()
            );
        }

        for spot in self.spots.iter() {
            let expected = if spot.is_occupied() {
                SpotIndicator::Occupied
            } else {
                SpotIndicator::Free
            };
            ensure!(
                spot.indicator() == expected,
                "{:?} indicator {:?} does not match occupancy",
                spot.id(),
                spot.indicator()
            );
            if let Some(holder) = spot.occupied_by() {
                ensure!(
                    self.vehicle(holder).and_then(|v| v.agent().target_spot()) == Some(spot.id()),
                    "{:?} is held by {:?}, which does not hold it",
                    spot.id(),
                    holder
                );
            }
        }

        let holders: Vec<SpotId> = self
            .active_vehicles()
            .filter_map(|v| v.agent().target_spot())
            .collect();
        for (i, spot) in holders.iter().enumerate() {
            ensure!(
                !holders[i + 1..].contains(spot),
                "{:?} is targeted by more than one vehicle",
                spot
            );
        }

        ensure!(
            self.parked_count == self.spots.occupied_count(),
            "parked count {} != occupied spots {}",
            self.parked_count,
            self.spots.occupied_count()
        );
        Ok(())
    }

    /// Print a summary of the fleet state
    pub fn print_summary(&self) {
        let stats = self.stats();
        println!("=== Parking Simulation Summary ===");
        println!("Time: {:.2}s", self.time);
        println!(
            "Vehicles: {} active, {} pooled (capacity {})",
            self.active_count(),
            self.pooled_count(),
            self.config.max_vehicles
        );
        println!(
            "Traffic: {} | Parked: {} | Free: {}",
            stats.total_spawned, stats.parked_count, stats.free_spots
        );
        println!(
            "Spawn attempts: {} ({} skipped)",
            self.spawn_attempts, self.spawn_skips
        );
        println!();

        println!("--- Spots ---");
        for spot in self.spots.iter() {
            match (spot.occupied_by(), spot.reserved_by()) {
                (Some(vehicle), _) => println!("  Spot {}: occupied by {:?}", spot.id().0, vehicle),
                (None, Some(vehicle)) => {
                    println!("  Spot {}: reserved for {:?}", spot.id().0, vehicle)
                }
                (None, None) => println!("  Spot {}: free", spot.id().0),
            }
        }

        if self.active_count() > 0 {
            println!("--- Active Vehicles ---");
            for vehicle in self.active_vehicles() {
                let pose = vehicle.pose();
                println!(
                    "  Vehicle {} ({}): state={:?}, position=({:.1}, {:.1}), waypoint={}",
                    vehicle.id().0,
                    vehicle.prefab().name,
                    vehicle.state(),
                    pose.position.x,
                    pose.position.z,
                    vehicle.agent().waypoint_index()
                );
            }
        }
    }

    /// Draw a visual map of the road, lot and vehicles in the terminal
    pub fn draw_map(&self) {
        let mut points: Vec<Position> = vec![self.spawn_point().position, self.exit_point().position];
        points.extend(self.road_waypoints().iter().map(|a| a.position));
        points.extend(self.parking_entry_point().map(|a| a.position));
        for spot in self.spots.iter() {
            points.push(spot.spot_anchor().position);
            points.push(spot.entry_point().position);
        }

        // Find bounds of the world
        let mut min_x = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut min_z = f32::INFINITY;
        let mut max_z = f32::NEG_INFINITY;
        for pos in &points {
            min_x = min_x.min(pos.x);
            max_x = max_x.max(pos.x);
            min_z = min_z.min(pos.z);
            max_z = max_z.max(pos.z);
        }

        // Add padding
        min_x -= 2.0;
        max_x += 2.0;
        min_z -= 2.0;
        max_z += 2.0;

        let scale = 1.0;
        let width = (((max_x - min_x) * scale) as usize).max(1);
        let height = (((max_z - min_z) * scale) as usize).max(1);
        let mut grid = vec![vec![' '; width]; height];

        // Helper to convert world coords to grid coords (north is up)
        let to_grid = |pos: &Position| -> (usize, usize) {
            let col = ((pos.x - min_x) * scale).max(0.0) as usize;
            let row = ((max_z - pos.z) * scale).max(0.0) as usize;
            (row.min(height - 1), col.min(width - 1))
        };

        let draw_line = |grid: &mut Vec<Vec<char>>, start: &Position, end: &Position| {
            let (start_row, start_col) = to_grid(start);
            let (end_row, end_col) = to_grid(end);

            // Simple line drawing (Bresenham-like)
            let dx = (end_col as i32 - start_col as i32).abs();
            let dy = (end_row as i32 - start_row as i32).abs();
            let sx = if start_col < end_col { 1 } else { -1 };
            let sy = if start_row < end_row { 1 } else { -1 };

            let mut err = dx - dy;
            let mut x = start_col as i32;
            let mut y = start_row as i32;

            loop {
                if x >= 0 && x < width as i32 && y >= 0 && y < height as i32 {
                    let cell = &mut grid[y as usize][x as usize];
                    if *cell == ' ' {
                        *cell = '·';
                    }
                }

                if x == end_col as i32 && y == end_row as i32 {
                    break;
                }

                let e2 = 2 * err;
                if e2 > -dy {
                    err -= dy;
                    x += sx;
                }
                if e2 < dx {
                    err += dx;
                    y += sy;
                }
            }
        };

        // Road
        let road: Vec<Position> = std::iter::once(self.spawn_point().position)
            .chain(self.road_waypoints().iter().map(|a| a.position))
            .chain(std::iter::once(self.exit_point().position))
            .collect();
        for pair in road.windows(2) {
            draw_line(&mut grid, &pair[0], &pair[1]);
        }

        // Lot access
        if let Some(entry) = self.parking_entry_point() {
            for spot in self.spots.iter() {
                draw_line(&mut grid, &entry.position, &spot.entry_point().position);
            }
        }

        for waypoint in self.road_waypoints() {
            let (row, col) = to_grid(&waypoint.position);
            grid[row][col] = '+';
        }
        if let Some(entry) = self.parking_entry_point() {
            let (row, col) = to_grid(&entry.position);
            grid[row][col] = 'E';
        }
        let (row, col) = to_grid(&self.spawn_point().position);
        grid[row][col] = 'S';
        let (row, col) = to_grid(&self.exit_point().position);
        grid[row][col] = 'X';

        for spot in self.spots.iter() {
            let (row, col) = to_grid(&spot.spot_anchor().position);
            grid[row][col] = if spot.is_occupied() {
                '#'
            } else if spot.reserved_by().is_some() {
                'r'
            } else {
                'P'
            };
        }

        // Draw moving vehicles; parked ones already show as '#'
        for vehicle in self.active_vehicles() {
            if vehicle.state() == Some(VehicleState::Parked) {
                continue;
            }
            let (row, col) = to_grid(&vehicle.pose().position);
            grid[row][col] = 'C';
        }

        println!("\n=== Lot Map ===");
        println!(
            "Legend: S=Spawn, X=Exit, +=Waypoint, E=Lot entry, P=Free spot, r=Reserved, #=Parked, C=Car"
        );
        println!();
        for row in &grid {
            let line: String = row.iter().collect();
            println!("{}", line.trim_end());
        }
        println!();
    }
}

impl<N: Navigator> FleetServices for FleetController<N> {
    fn spot(&self, id: SpotId) -> Option<&ParkingSpot> {
        self.spots.get(id)
    }

    fn occupy_spot(&mut self, reservation: SpotReservation) -> OccupiedSpot {
        FleetController::occupy_spot(self, reservation)
    }

    fn free_spot(&mut self, spot: OccupiedSpot) {
        FleetController::free_spot(self, spot)
    }
}

impl FleetController<KinematicNavigator> {
    /// Controller over the demo lot with `spot_count` bays
    pub fn create_demo(config: SimConfig, spot_count: usize) -> Result<Self> {
        Self::from_layout(config, &SceneLayout::demo(spot_count))
    }

    /// Controller whose vehicles steer over the layout's navigation graph
    pub fn from_layout(config: SimConfig, layout: &SceneLayout) -> Result<Self> {
        let mesh: Arc<NavMesh> = Arc::new(layout.build_nav_mesh());
        let stopping_distance = config.stopping_distance;
        Self::new(config, layout, |_, _| {
            KinematicNavigator::new(Arc::clone(&mesh)).with_stopping_distance(stopping_distance)
        })
    }
}
