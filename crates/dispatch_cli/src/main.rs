use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dispatch_core::generator::{random_location_in_disc, SyntheticDriverGenerator};
use dispatch_core::sink::InMemoryAssignmentSink;
use dispatch_core::{
    distance_meters, Coordinate, DispatchCoordinator, DispatchError, EngineConfig, MatchResult,
    RideRequest, VehicleCapability, VehicleClass,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::runtime::Handle;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "dispatch",
    about = "Driver matching and dispatch engine",
    long_about = "Runs synthetic ride requests through the dispatch engine and\n\
                  computes great-circle distances between coordinates."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch a batch of concurrent synthetic ride requests against one shared pool
    Simulate {
        /// Number of ride requests to dispatch
        #[arg(long, default_value_t = 20)]
        requests: u64,
        /// Seed for request generation
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Probability (0.0–1.0) that a request needs an XL vehicle
        #[arg(long, default_value_t = 0.25)]
        xl_ratio: f64,
        /// Probability (0.0–1.0) that a request travels with a pet
        #[arg(long, default_value_t = 0.2)]
        pet_ratio: f64,
        /// JSON engine config (pool cap, batch size, generator settings)
        #[arg(long, env = "DISPATCH_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Great-circle distance in meters between two "lat,lon" coordinates
    Distance {
        #[arg(value_parser = parse_coordinate)]
        from: Coordinate,
        #[arg(value_parser = parse_coordinate)]
        to: Coordinate,
    },
}

fn parse_coordinate(raw: &str) -> Result<Coordinate, String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lon\", got {raw:?}"))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("latitude: {e}"))?;
    let lon: f64 = lon.trim().parse().map_err(|e| format!("longitude: {e}"))?;
    Coordinate::new(lat, lon).map_err(|e| e.to_string())
}

// ── Commands ───────────────────────────────────────────────────────

/// Outcome counts of one `simulate` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SimulationSummary {
    assigned: usize,
    unmatched: usize,
    recorded: usize,
    pool_size: usize,
}

async fn simulate(
    requests: u64,
    seed: u64,
    xl_ratio: f64,
    pet_ratio: f64,
    config: Option<PathBuf>,
) -> Result<SimulationSummary, DispatchError> {
    let engine = match config {
        Some(path) => EngineConfig::from_json_file(&path)?,
        None => EngineConfig::default(),
    };
    if !(0.0..=1.0).contains(&xl_ratio) || !(0.0..=1.0).contains(&pet_ratio) {
        return Err(DispatchError::Config(
            "xl-ratio and pet-ratio must be in [0, 1]".into(),
        ));
    }

    let generator = SyntheticDriverGenerator::new(engine.generator)?;
    let coordinator = Arc::new(DispatchCoordinator::new(engine.dispatch, Box::new(generator))?);
    let sink = Arc::new(InMemoryAssignmentSink::new());

    let mut rng = StdRng::seed_from_u64(seed);
    let mut tasks = Vec::with_capacity(requests as usize);
    for ride_id in 1..=requests {
        let class = if rng.gen_bool(xl_ratio) {
            VehicleClass::Xl
        } else {
            VehicleClass::Regular
        };
        let pickup = random_location_in_disc(
            &mut rng,
            engine.generator.centre,
            engine.generator.radius_meters,
        );
        let request = RideRequest::new(
            ride_id,
            pickup,
            VehicleCapability::new(class, rng.gen_bool(pet_ratio)),
        )
        .with_rider(ride_id);

        let coordinator = coordinator.clone();
        let sink = sink.clone();
        let runtime = Handle::current();
        // Growth holds the pool mutex while generating a batch, so keep it off the async workers.
        tasks.push(tokio::task::spawn_blocking(move || {
            let result = runtime.block_on(coordinator.dispatch_and_report(&request, sink.as_ref()));
            (request, result)
        }));
    }

    let (mut assigned, mut unmatched) = (0usize, 0usize);
    for task in tasks {
        let Ok((request, result)) = task.await else {
            error!("dispatch task panicked");
            continue;
        };
        match result? {
            MatchResult::Assigned { driver } => {
                assigned += 1;
                info!(
                    ride_id = request.id,
                    driver_id = driver.id,
                    driver = %driver.display_name,
                    plate = %driver.license_plate,
                    vehicle = %driver.vehicle_description,
                    class = driver.capability.vehicle_class.as_str(),
                    pickup_meters = distance_meters(driver.location, request.pickup).round(),
                    "assigned"
                );
            }
            MatchResult::NoneAvailable | MatchResult::Cancelled => {
                unmatched += 1;
                info!(
                    ride_id = request.id,
                    class = request.required_capability.vehicle_class.as_str(),
                    pet_friendly = request.required_capability.pet_friendly,
                    "no driver available"
                );
            }
        }
    }

    let summary = SimulationSummary {
        assigned,
        unmatched,
        recorded: sink.assignments().len(),
        pool_size: coordinator.pool().len(),
    };
    info!(
        assigned,
        unmatched,
        recorded = summary.recorded,
        pool_size = summary.pool_size,
        pool_cap = coordinator.config().pool_cap,
        batch_size = coordinator.config().growth_batch_size,
        still_available = coordinator.available_drivers().len(),
        "simulation complete"
    );
    Ok(summary)
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Simulate {
            requests,
            seed,
            xl_ratio,
            pet_ratio,
            config,
        } => simulate(requests, seed, xl_ratio, pet_ratio, config)
            .await
            .map(|_| ()),
        Commands::Distance { from, to } => {
            println!("{:.1}", distance_meters(from, to));
            Ok(())
        }
    };

    if let Err(e) = outcome {
        error!(error = %e, "dispatch failed");
        exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_coordinate_pairs() {
        let c = parse_coordinate("43.6532, -79.3832").expect("valid");
        assert_eq!(c.latitude, 43.6532);
        assert_eq!(c.longitude, -79.3832);

        assert!(parse_coordinate("43.6532").is_err());
        assert!(parse_coordinate("100,0").is_err());
        assert!(parse_coordinate("north,west").is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn simulation_records_every_assignment() {
        let summary = simulate(30, 7, 0.5, 0.2, None).await.expect("simulate");

        assert_eq!(summary.assigned + summary.unmatched, 30);
        assert_eq!(summary.recorded, summary.assigned);
        assert!(summary.assigned > 0);
        assert!(summary.pool_size <= 100);
    }

    #[tokio::test]
    async fn out_of_range_ratios_are_rejected() {
        assert!(matches!(
            simulate(1, 0, 1.5, 0.0, None).await,
            Err(DispatchError::Config(_))
        ));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
