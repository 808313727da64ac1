use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use parking_sim::simulation::{FleetController, SimConfig, SpotSelection};

#[derive(Parser)]
#[command(name = "parking_sim")]
#[command(about = "Traffic and parking lot simulation with optional UI")]
struct Cli {
    /// Run with the Bevy game engine UI
    #[arg(long)]
    ui: bool,

    /// Number of simulation ticks to run in headless mode
    #[arg(long, default_value = "1000")]
    ticks: u32,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.1")]
    delta: f32,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Number of bays in the demo lot
    #[arg(long, default_value = "12")]
    spots: usize,

    /// Pool capacity
    #[arg(long, default_value = "20")]
    max_vehicles: usize,

    /// Seconds between spawn attempts
    #[arg(long, default_value = "2.0")]
    spawn_interval: f32,

    /// Chance that a car decides to park
    #[arg(long, default_value = "0.3")]
    park_probability: f32,

    #[arg(long, default_value = "6.0")]
    road_speed: f32,

    #[arg(long, default_value = "2.0")]
    parking_speed: f32,

    /// Turn rate in degrees per second
    #[arg(long, default_value = "120.0")]
    rotation_speed: f32,

    /// Seconds a parked car stays before leaving
    #[arg(long, default_value = "10.0")]
    dwell: f32,

    /// Distance at which a destination counts as reached
    #[arg(long, default_value = "0.5")]
    stopping_distance: f32,

    /// Park in the bay closest to the vehicle instead of the first free one
    #[arg(long)]
    nearest_spot: bool,

    /// Wall-clock pause between printed seconds in headless mode
    #[arg(long, default_value = "0")]
    pace_ms: u64,
}

impl Cli {
    fn sim_config(&self) -> SimConfig {
        SimConfig {
            max_vehicles: self.max_vehicles,
            spawn_interval: self.spawn_interval,
            car_to_park_probability: self.park_probability,
            road_speed: self.road_speed,
            parking_speed: self.parking_speed,
            rotation_speed: self.rotation_speed,
            wait_time_before_leave: self.dwell,
            stopping_distance: self.stopping_distance,
            spot_selection: if self.nearest_spot {
                SpotSelection::Nearest
            } else {
                SpotSelection::FirstFree
            },
            seed: self.seed,
            ..SimConfig::default()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.sim_config();

    if cli.ui {
        #[cfg(feature = "ui")]
        {
            return run_with_ui(config, cli.spots);
        }
        #[cfg(not(feature = "ui"))]
        {
            eprintln!("Error: UI feature is not enabled. Rebuild with --features ui");
            std::process::exit(1);
        }
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,parking_sim=info"),
    )
    .init();
    run_headless(config, cli.spots, cli.ticks, cli.delta, cli.pace_ms)
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(config: SimConfig, spots: usize, ticks: u32, delta: f32, pace_ms: u64) -> Result<()> {
    anyhow::ensure!(delta > 0.0, "--delta must be positive, got {}", delta);

    println!("Running parking simulation in headless mode...");
    println!("Ticks: {}, Delta: {}s", ticks, delta);

    // Calculate how many ticks equal 1 second of simulation time
    let ticks_per_second = ((1.0 / delta).ceil() as u32).max(1);
    println!("Running {} ticks per second (simulated time)", ticks_per_second);
    println!();

    let mut world = FleetController::create_demo(config, spots)
        .context("Failed to build the demo parking lot")?;

    println!("Initial state:");
    world.print_summary();
    world.draw_map();
    println!();

    let mut tick = 0;
    while tick < ticks {
        // Run ticks_per_second ticks (or remaining ticks if fewer)
        let ticks_to_run = ticks_per_second.min(ticks - tick);

        for _ in 0..ticks_to_run {
            tick += 1;
            world.tick(delta);
        }
        world
            .check_invariants()
            .with_context(|| format!("Invariant violated after tick {}", tick))?;

        println!(
            "--- After tick {} ({:.1}s simulated time) ---",
            tick,
            tick as f32 * delta
        );
        world.print_summary();
        world.draw_map();
        println!();

        if pace_ms > 0 && tick < ticks {
            std::thread::sleep(std::time::Duration::from_millis(pace_ms));
        }
    }

    println!("=== Final State ===");
    world.print_summary();
    world.draw_map();

    let stats = world.stats();
    info!("=== SIMULATION COMPLETE ===");
    info!("Elapsed time: {:.2}s", world.time());
    info!("Total vehicles spawned: {}", stats.total_spawned);
    info!("Parked vehicles: {}", stats.parked_count);
    info!("Free spots: {}", stats.free_spots);
    info!("Active vehicles: {}", world.active_count());
    info!("Pooled vehicles: {}", world.pooled_count());
    Ok(())
}

#[cfg(feature = "ui")]
fn run_with_ui(config: SimConfig, spots: usize) -> Result<()> {
    use bevy::log::LogPlugin;
    use bevy::prelude::*;
    use parking_sim::ui::{ParkingSimUIPlugin, SimWorldResource};

    let world = FleetController::create_demo(config, spots)
        .context("Failed to build the demo parking lot")?;

    println!("Starting Parking Sim UI...");
    println!();
    println!("Controls:");
    println!("  Space  - Pause / resume");
    println!("  ESC    - Exit");
    println!();

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(LogPlugin {
                    filter: "warn,parking_sim=debug".to_string(),
                    level: bevy::log::Level::DEBUG,
                    ..default()
                })
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Parking Sim".into(),
                        resolution: (1280, 720).into(),
                        ..default()
                    }),
                    ..default()
                }),
        )
        .insert_resource(SimWorldResource(world))
        .add_plugins(ParkingSimUIPlugin)
        .run();
    Ok(())
}
