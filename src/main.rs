use clap::Parser;
use log::info;
use petple::{
    cli::{Cli, Commands},
    config::load_configuration,
    daemon::Daemon,
    db,
    ingest::{PetClinicLoader, SeoulOpenApi},
    log::init_logging,
    tasks::WeatherCrawlJob,
    weather::WeatherCrawler,
};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    init_logging()?;

    let mut config = load_configuration(&cli.config, cli.profile.as_deref())?;
    cli.command.apply_overrides(&mut config);

    match cli.command {
        Commands::Serve { .. } => Daemon::new(config).run().await,
        Commands::LoadPetClinics { start, end, .. } => {
            let db_pool = db::init_db(&config.database_path)?;
            let loader = PetClinicLoader::new(SeoulOpenApi::new(&config.seoul_open_api), db_pool);

            let loaded = loader.load_window(start, end).await?;
            info!(start = start, end = end, stored = loaded.clinics.len(); "Pet clinic window loaded");

            println!("{}", serde_json::to_string_pretty(&loaded.clinics)?);
            println!(
                "Stored {} of {} fetched rows",
                loaded.clinics.len(),
                loaded.rows_fetched
            );
            Ok(())
        },
        Commands::CrawlWeather { location, .. } => {
            let location = location.unwrap_or_else(|| config.weather.location.clone());
            let db_pool = db::init_db(&config.database_path)?;
            let crawler = WeatherCrawler::new(&config.weather)?;

            let (report, id) = WeatherCrawlJob::new(crawler, db_pool, &location).crawl_once().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            println!("Stored as snapshot #{id}");
            Ok(())
        },
    }
}
