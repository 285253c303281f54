use chrono::Utc;
use clap::Parser;
use skill_rating::{
    args::{Args, Command},
    database::db::DbClient,
    model::{error::RatingError, orchestrator::RatingUpdater}
};
use tracing::{error, info};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // A missing .env file is fine, the environment may already be set
    let _ = dotenv::dotenv();
    let args = Args::parse();

    init_tracing(&args.log_level);

    let client = match DbClient::connect(&args.connection_string).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            error!("Application cannot start without a valid database connection");
            std::process::exit(1);
        }
    };

    let updater = RatingUpdater::new(client);

    if let Err(e) = run(&updater, args.command).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn init_tracing(log_level: &str) {
    let indicatif_layer = IndicatifLayer::new();

    tracing_subscriber::registry()
        .with(EnvFilter::new(log_level))
        .with(tracing_subscriber::fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .init();
}

async fn run(updater: &RatingUpdater<DbClient>, command: Command) -> Result<(), RatingError> {
    match command {
        Command::Replay => {
            let summary = updater.replay_all(Utc::now().fixed_offset()).await?;
            if !summary.failures.is_empty() {
                error!("{} player recomputes failed during replay", summary.failures.len());
            }
        }
        Command::RecomputeSet { set_id } => {
            let report = updater.recompute_set(set_id, Utc::now().fixed_offset()).await?;
            info!(
                "Set {}: {} players updated, {} failed",
                report.set_id,
                report.updated.len(),
                report.failures.len()
            );
        }
        Command::RecomputePlayer { user_id, set_id } => {
            let result = updater
                .recompute_player(user_id, set_id, Utc::now().fixed_offset())
                .await?;
            info!(
                "Player {}: {:.4} -> {:.4}",
                user_id,
                result.previous_rating,
                result.new_rating()
            );
        }
        Command::Predict { team1, team2 } => {
            let prediction = updater.predict_match(&team1, &team2).await?;
            match serde_json::to_string_pretty(&prediction) {
                Ok(json) => println!("{}", json),
                Err(e) => error!("Failed to serialize prediction: {}", e)
            }
        }
    }

    Ok(())
}
