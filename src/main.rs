use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::Instrument;

use gourmet_recommender::{
    services::{
        providers::{
            GmailNotifier, GooglePlacesClient, GoogleRoutesClient, GoogleSheetsClient,
            RecommendationSink, SiteDataPublisher,
        },
        travel::TravelEstimator,
        Recommender, RunSettings,
    },
    store::{HistoryStore, TravelCache},
    telemetry::{self, RunId},
    AppError, Config,
};

/// Weekly restaurant recommender
#[derive(Parser)]
#[command(name = "gourmet-recommender", about = "Pick this week's restaurants")]
struct Cli {
    /// Build the selection and print it as JSON without recording or publishing it.
    #[arg(long)]
    dry_run: bool,
}

fn build_recommender(config: &Config) -> Result<Recommender, AppError> {
    let timeout = Duration::from_secs(config.http_timeout_secs);

    let places = GooglePlacesClient::new(
        config.google_api_key.clone(),
        config.places_api_url.clone(),
        timeout,
    )?;
    let routes = GoogleRoutesClient::new(
        config.google_api_key.clone(),
        config.routes_api_url.clone(),
        timeout,
    )?;

    let travel_cache = TravelCache::open(
        config.travel_cache_path(),
        TravelEstimator::new(Arc::new(routes)),
        config.utc_offset(),
    );
    let mut history = HistoryStore::new(
        config.visited_path(),
        config.history_path(),
        config.archive_path(),
    );

    let mut sinks: Vec<Arc<dyn RecommendationSink>> = vec![Arc::new(SiteDataPublisher::new(
        &config.site_data_dir,
        config.visited_path(),
    ))];

    match (&config.spreadsheet_id, &config.sheets_access_token) {
        (Some(spreadsheet_id), Some(token)) if config.sheets_enabled() => {
            let sheets = Arc::new(GoogleSheetsClient::new(
                config.sheets_api_url.clone(),
                spreadsheet_id.clone(),
                config.worksheet_name.clone(),
                token.clone(),
                timeout,
            )?);
            history = history.with_remote(sheets.clone());
            sinks.push(sheets);
        }
        _ => tracing::info!("Spreadsheet sync disabled"),
    }

    match (&config.email_recipient, &config.gmail_access_token) {
        (Some(recipient), Some(token)) if config.email_enabled() => {
            let gmail = GmailNotifier::new(
                config.gmail_api_url.clone(),
                token.clone(),
                recipient.clone(),
                timeout,
            )?
            .with_sender(config.email_sender.clone())
            .with_subject_template(config.email_subject_template.clone())
            .with_site_url(config.site_base_url.clone());
            sinks.push(Arc::new(gmail));
        }
        _ => tracing::warn!("Email recipient not configured, weekly mail disabled"),
    }

    let recommender = sinks.into_iter().fold(
        Recommender::new(
            Arc::new(places),
            travel_cache,
            history,
            RunSettings::from_config(config),
        ),
        Recommender::with_sink,
    );

    Ok(recommender)
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing::info!(
        origin = %config.origin(),
        queries = ?config.search_queries,
        data_dir = %config.data_dir,
        "Configuration loaded"
    );

    let mut recommender = build_recommender(&config)?;
    let week = recommender.run(cli.dry_run).await?;

    if cli.dry_run {
        let json = serde_json::to_string_pretty(&week).context("Failed to render selection")?;
        println!("{}", json);
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    telemetry::init_tracing();
    let cli = Cli::parse();

    let run_id = RunId::new();
    let span = run_id.span(cli.dry_run);

    match run(&cli).instrument(span).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e.downcast_ref::<AppError>().map(AppError::exit_code).unwrap_or(1);
            tracing::error!(run_id = %run_id, error = %e, "Weekly run failed");
            ExitCode::from(code)
        }
    }
}
