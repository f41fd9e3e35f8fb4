use std::{fs::OpenOptions, path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracker::{
    clock::SystemClock,
    notifier::LogNotifier,
    sample_source::{ReplaySource, SimulatedWalk},
    session_runner::SessionRunner,
    svg_canvas::SvgCanvas,
    tracker_state::{TrackerConfig, TrackerState},
};
use workout_tracker_data_management::{gpx_util::read_gpx_samples, DataManager};
use workout_tracker_lib::{clock::Clock, geo_point::GeoPoint};

const LOG_FILE: &str = "tracker.log";

#[derive(Parser)]
#[command(name = "Tracker")]
#[command(about = "Tracks a workout from a recorded or simulated route", long_about = None)]
struct Cli {
    /// Replay this GPX track instead of simulating a walk
    #[arg(long)]
    gpx: Option<PathBuf>,

    /// How much faster than real time samples are delivered
    #[arg(long, default_value_t = 10.)]
    speedup: f64,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 800.)]
    width: f64,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 600.)]
    height: f64,

    /// Status refresh interval. 0 disables it
    #[arg(long, default_value_t = 1000)]
    tick_ms: u64,

    /// Directory holding the saved workouts. Defaults to data/ in the project root
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Write the final route drawing to this SVG file
    #[arg(long)]
    svg: Option<PathBuf>,

    #[arg(long, default_value_t = 56.1572)]
    sim_lat: f64,

    #[arg(long, default_value_t = 10.2107)]
    sim_lon: f64,

    #[arg(long, default_value_t = 150.)]
    sim_radius: f64,

    #[arg(long, default_value_t = 10.)]
    sim_speed: f64,

    #[arg(long, default_value_t = 120)]
    sim_samples: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => DataManager::default_data_dir()?,
    };
    std::fs::create_dir_all(&data_dir)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join(LOG_FILE))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=trace,workout_tracker_data_management=info", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        .init();

    let clock = Arc::new(SystemClock::default());

    let samples = match &cli.gpx {
        Some(path) => {
            tracing::info!("Replaying {:?}", path);
            read_gpx_samples(path)?
        },
        None => {
            tracing::info!("Simulating a walk around {:.4},{:.4}", cli.sim_lat, cli.sim_lon);
            SimulatedWalk {
                center: GeoPoint::new(cli.sim_lat, cli.sim_lon),
                radius_m: cli.sim_radius,
                speed_kmh: cli.sim_speed,
                interval_ms: 1000,
                sample_count: cli.sim_samples,
                start_ms: clock.now_ms(),
            }
            .samples()
        },
    };
    if samples.is_empty() {
        anyhow::bail!("No timestamped samples to track");
    }

    let state = Arc::new(TrackerState {
        data_manager: DataManager::start(&data_dir).await?,
        clock,
        notifier: Arc::new(LogNotifier),
        config: TrackerConfig {
            tick_interval: (cli.tick_ms > 0).then(|| Duration::from_millis(cli.tick_ms)),
            ..Default::default()
        },
    });

    let source = ReplaySource::new(samples, cli.speedup);
    let finished = source.finished();
    let mut runner = SessionRunner::new(state, source, SvgCanvas::new(cli.width, cli.height));
    runner.start()?;

    let handle = runner.handle();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted, stopping"),
            _ = finished.notified() => tracing::info!("Track finished, stopping"),
        }
        handle.stop();
    });

    let Some(outcome) = runner.run().await? else {
        return Ok(());
    };

    println!("{}", outcome.summary);
    if let Some(index) = outcome.saved_index {
        println!("Saved as workout {}", index);
    }

    if let Some(path) = &cli.svg {
        std::fs::write(path, runner.surface().to_svg()?)?;
        tracing::info!("Route drawn to {:?}", path);
    }

    Ok(())
}
