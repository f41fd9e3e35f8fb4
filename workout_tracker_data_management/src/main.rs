use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workout_tracker_data_management::DataManager;
use workout_tracker_lib::workout::{format_duration, DEFAULT_KCAL_PER_KM};

#[derive(Parser)]
#[command(name = "WorkoutData")]
#[command(about = "A CLI to inspect saved workouts", long_about = None)]
struct Cli {
    /// Directory holding the saved workouts. Defaults to data/ in the project root
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all saved workouts
    List,
    /// Print the summary and route of a workout
    Show { index: usize },
    /// Write the route of a workout to a GPX file
    ExportGpx { index: usize, out: PathBuf },
}

// CLI for manual data operations
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=trace,workout_tracker_data_management=trace", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => DataManager::default_data_dir()?,
    };
    let data_manager = DataManager::start(data_dir).await?;

    match &cli.command {
        Commands::List => {
            let workouts = data_manager.get_workouts().await?;
            if workouts.is_empty() {
                println!("No saved workouts");
            }
            for (index, workout) in workouts.iter().enumerate() {
                println!(
                    "{}\t{}\t{:.2} km\t{}",
                    index,
                    workout.timestamp_iso,
                    workout.distance_meters / 1000.,
                    format_duration(workout.duration_ms)
                );
            }
        },
        Commands::Show { index } => {
            let workout = data_manager.get_workout(*index).await?;
            println!("{}", workout.timestamp_iso);
            println!("{}", workout.summary(DEFAULT_KCAL_PER_KM));
            for point in &workout.route {
                println!("{:.6}\t{:.6}", point.latitude, point.longitude);
            }
        },
        Commands::ExportGpx { index, out } => {
            data_manager.export_gpx(*index, out).await?;
            println!("Success!");
        },
    }

    Ok(())
}
