// Tangent bug navigation of a simulated drone
//
// usage: tangent_bug [config.yaml]

use std::env;
use std::fs;
use std::process;

use log::{error, info};

use tangent_bug::aerial_navigation::{
    SimObstacle, SimulatedDrone, SimulationConfig, TangentBug, TangentBugConfig,
};
use tangent_bug::utils::Visualizer;
use tangent_bug::{NavigationResult, Pose2D, Vec2};

const OUTPUT_DIR: &str = "img/aerial_navigation";

fn load_config() -> NavigationResult<TangentBugConfig> {
    match env::args().nth(1) {
        Some(path) => {
            info!("loading configuration from {}", path);
            TangentBugConfig::from_yaml_file(path)
        }
        None => Ok(TangentBugConfig {
            realtime: false,
            max_cycles: Some(50_000),
            ..Default::default()
        }),
    }
}

fn run() -> NavigationResult<()> {
    let config = load_config()?;
    let start = Pose2D::origin();
    let goal = Vec2::new(100.0, 0.0);
    let obstacles = vec![
        SimObstacle::wall((40.0, -12.0), (40.0, 12.0)),
        SimObstacle::wall((40.0, 12.0), (30.0, 12.0)),
        SimObstacle::circle(72.0, -6.0, 4.0),
    ];
    let sim_config = SimulationConfig {
        time_step: config.time_step,
        range_noise_std: 0.02,
        clutter_per_scan: 8,
        settle_cycles: 3,
        ..Default::default()
    };
    let drone = SimulatedDrone::new(start, obstacles, sim_config)?;

    let mut planner = TangentBug::new(drone, config, goal)?;
    let report = planner.run()?;
    println!(
        "{:?} after {} cycles, {} mode switches",
        report.outcome, report.cycles, report.mode_switches
    );

    let memory = planner.context().memory().points();
    let drone = planner.into_vehicle();

    fs::create_dir_all(OUTPUT_DIR)?;
    let mut vis = Visualizer::new();
    vis.set_title("Tangent Bug")
        .plot_obstacles(drone.obstacles())
        .plot_memory(&memory)
        .plot_trajectory(drone.trajectory())
        .plot_start(start.position)
        .plot_goal(goal)
        .plot_drone(&drone.pose(), 2.0);
    let output = format!("{}/tangent_bug.png", OUTPUT_DIR);
    vis.save_png(&output, 800, 600)?;
    println!("Plot saved to {}", output);
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        error!("{}", e);
        process::exit(1);
    }
}
