use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ride_core::config::RideConfig;
use ride_core::error::ConfigError;
use ride_core::controller::{DriverSession, PassengerSession, SessionController};
use ride_core::ecs::RideStatus;
use ride_core::suggest::{wants_suggestions, DestinationSuggester};
use ride_core::telemetry::SessionSnapshot;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Give up on a status that takes longer than this much virtual time.
const MAX_WAIT_MS: u64 = 300_000;

#[derive(Debug, Error)]
enum CliError {
    #[error("could not load config: {0}")]
    Config(#[from] ConfigError),

    #[error("{action} was rejected in {status:?}")]
    Rejected {
        action: &'static str,
        status: RideStatus,
    },

    #[error("gave up waiting for {0:?}")]
    Timeout(RideStatus),

    #[error("no request arrived")]
    NoRequest,
}

#[derive(Parser)]
#[command(
    name = "ride-sim",
    about = "Drive a simulated ride from the passenger or the driver side",
    long_about = "Runs one ride through its lifecycle on a virtual clock and prints\n\
                  a line for every status change."
)]
struct Cli {
    /// JSON file overriding the default delays and coordinates
    #[arg(long, env = "RIDE_SIM_CONFIG")]
    config: Option<PathBuf>,
    /// Print each snapshot as JSON instead of a summary line
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Book, ride and rate as a passenger
    Passenger {
        /// Ride option id
        #[arg(long, default_value = "eco")]
        option: String,
        /// Saved place to ride to (Home, Office, Central Mall)
        #[arg(long)]
        place: Option<String>,
        /// Stars given after the ride (1-5)
        #[arg(long, default_value_t = 5)]
        rating: u8,
        /// Free-text destination search, e.g. "coffee near me?"
        #[arg(long)]
        query: Option<String>,
        /// Pick drivers from the seeded roster instead of the fixed driver
        #[arg(long)]
        seeded: bool,
    },
    /// Go online, take a request and complete the trip as a driver
    Driver {
        /// Requests to decline before accepting one
        #[arg(long, default_value_t = 0)]
        declines: u32,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "ride simulation failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => RideConfig::load(path)?,
        None => RideConfig::default(),
    };
    match cli.command {
        Commands::Passenger {
            option,
            place,
            rating,
            query,
            seeded,
        } => run_passenger(
            config,
            &option,
            place.as_deref(),
            rating,
            query.as_deref(),
            seeded,
            cli.json,
        ),
        Commands::Driver { declines } => run_driver(config, declines, cli.json),
    }
}

/// Prints a line whenever the observed status changes.
struct Reporter {
    json: bool,
    last: Option<RideStatus>,
}

impl Reporter {
    fn new(json: bool) -> Self {
        Self { json, last: None }
    }

    fn observe(&mut self, snapshot: &SessionSnapshot) {
        if self.last == Some(snapshot.status) {
            return;
        }
        self.last = Some(snapshot.status);
        if self.json {
            match serde_json::to_string(snapshot) {
                Ok(line) => println!("{line}"),
                Err(err) => warn!(error = %err, "snapshot not serializable"),
            }
            return;
        }
        let driver = snapshot
            .driver
            .as_ref()
            .map(|d| format!(" driver={} ({})", d.actor.name, d.vehicle.plate))
            .unwrap_or_default();
        println!(
            "[{:>7} ms] {:?}{} fare=${:.2}",
            snapshot.now_ms, snapshot.status, driver, snapshot.fare_total
        );
    }
}

/// Advances time one tick at a time until `status` is reached.
fn wait_for<C: SessionController>(
    session: &mut C,
    reporter: &mut Reporter,
    status: RideStatus,
    tick_ms: u64,
) -> Result<(), CliError> {
    let deadline = session.now().saturating_add(MAX_WAIT_MS);
    while session.snapshot().status != status {
        if session.now() >= deadline {
            return Err(CliError::Timeout(status));
        }
        session.advance_by(tick_ms);
        reporter.observe(&session.snapshot());
    }
    Ok(())
}

fn step<C: SessionController>(
    session: &mut C,
    reporter: &mut Reporter,
    accepted: bool,
    action: &'static str,
) -> Result<(), CliError> {
    reporter.observe(&session.snapshot());
    if accepted {
        Ok(())
    } else {
        Err(CliError::Rejected {
            action,
            status: session.snapshot().status,
        })
    }
}

fn run_passenger(
    config: RideConfig,
    option: &str,
    place: Option<&str>,
    rating: u8,
    query: Option<&str>,
    seeded: bool,
    json: bool,
) -> Result<(), CliError> {
    if let Some(query) = query.filter(|q| wants_suggestions(q)) {
        for suggestion in DestinationSuggester::without_provider().suggest(query) {
            info!(%suggestion, "destination suggestion");
        }
    }

    let mut passenger = if seeded {
        PassengerSession::seeded(config)
    } else {
        PassengerSession::with_config(config)
    };
    let tick = config.move_tick_ms.max(1);
    let mut reporter = Reporter::new(json);
    reporter.observe(&passenger.snapshot());

    let chosen = match place {
        Some(name) => passenger.choose_place(name),
        None => passenger.choose_destination(config.passenger_destination),
    };
    step(&mut passenger, &mut reporter, chosen, "choosing a destination")?;
    let confirmed = passenger.confirm_ride(option);
    step(&mut passenger, &mut reporter, confirmed, "confirming the ride")?;
    wait_for(&mut passenger, &mut reporter, RideStatus::ArrivedPickup, tick)?;
    let boarded = passenger.confirm_boarding();
    step(&mut passenger, &mut reporter, boarded, "boarding")?;
    wait_for(&mut passenger, &mut reporter, RideStatus::Completed, tick)?;
    let rated = passenger.submit_rating(rating);
    step(&mut passenger, &mut reporter, rated, "rating")?;

    let telemetry = passenger.telemetry();
    info!(
        transitions = telemetry.transitions.len(),
        sweep_ticks = telemetry.sweep_ticks,
        stale_events_dropped = telemetry.stale_events_dropped,
        "passenger ride finished"
    );
    Ok(())
}

fn run_driver(config: RideConfig, declines: u32, json: bool) -> Result<(), CliError> {
    let mut driver = DriverSession::with_config(config);
    let mut reporter = Reporter::new(json);
    reporter.observe(&driver.snapshot());

    let online = driver.toggle_online();
    step(&mut driver, &mut reporter, online, "going online")?;
    let wait = config.request_arrival_ms.max(1);
    for declined in 0..=declines {
        let deadline = driver.now().saturating_add(MAX_WAIT_MS);
        while driver.snapshot().pending_request.is_none() {
            if driver.now() >= deadline {
                return Err(CliError::NoRequest);
            }
            driver.advance_by(wait);
        }
        if let Some(request) = driver.snapshot().pending_request {
            info!(
                at_ms = driver.now(),
                pickup = %request.pickup_label,
                fare = request.fare_quote,
                "incoming request"
            );
        }
        if declined < declines {
            let ok = driver.decline_request();
            step(&mut driver, &mut reporter, ok, "declining")?;
        }
    }

    let accepted = driver.accept_request();
    step(&mut driver, &mut reporter, accepted, "accepting")?;
    let arrived = driver.arrived();
    step(&mut driver, &mut reporter, arrived, "arriving")?;
    let started = driver.start_trip();
    step(&mut driver, &mut reporter, started, "starting the trip")?;
    let completed = driver.complete_trip();
    step(&mut driver, &mut reporter, completed, "completing the trip")?;

    info!(
        requests = driver.telemetry().requests_generated,
        payout = driver.snapshot().fare_total,
        "driver shift finished"
    );
    Ok(())
}
