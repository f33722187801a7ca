use std::path::PathBuf;

use clap::{Parser, Subcommand, command};
use sqlx::{Pool, Postgres, pool};
use tracing_subscriber::EnvFilter;

use parana_civic_api::etl::importers::{council_seats, elections, meta, officers, parties, stats, territories};
use parana_civic_api::etl::report::BatchReport;
use parana_civic_api::etl::resolver::NameCollisionPolicy;
use parana_civic_api::model::config::{Config, DatabaseType, LoggingConfig};

/**
 * Command-line arguments for the import tool.
 */
#[derive(Parser, Debug)]
#[command(version, about = "Imports civic source files into the database", long_about = None)]
struct ImportArguments {
    /**
     * Path to the configuration file.
     */
    #[arg(short, long)]
    config_file: String,
    #[command(subcommand)]
    command: ImportCommand,
}

/**
 * One subcommand per source file kind. Each run is idempotent per natural
 * key; rerunning after a partial failure is the recovery path.
 */
#[derive(Subcommand, Debug)]
enum ImportCommand {
    /**
     * Imports territories and their member municipalities from a JSON file.
     */
    Territories {
        #[arg(long)]
        file: PathBuf,
    },
    /**
     * Imports the party master list from a CSV file.
     */
    Parties {
        #[arg(long)]
        file: PathBuf,
    },
    /**
     * Imports the elected officers of one election cycle.
     */
    Officers {
        #[arg(long)]
        parties_file: Option<PathBuf>,
        #[arg(long)]
        mayors_file: Option<PathBuf>,
        #[arg(long)]
        vices_file: Option<PathBuf>,
        #[arg(long)]
        councillors_file: Option<PathBuf>,
        #[arg(long, default_value_t = 2024)]
        election_year: i32,
        #[arg(long, value_enum, default_value = "use-oldest")]
        on_name_collision: NameCollisionPolicy,
    },
    /**
     * Imports yearly population and/or electorate statistics.
     */
    Stats {
        #[arg(long)]
        population_file: Option<PathBuf>,
        #[arg(long)]
        electorate_file: Option<PathBuf>,
    },
    /**
     * Imports council seat counts per municipality and year.
     */
    CouncilSeats {
        #[arg(long)]
        file: PathBuf,
    },
    /**
     * Imports historical election results.
     */
    Elections {
        #[arg(long)]
        file: PathBuf,
    },
    /**
     * Imports municipality metadata. Update-only.
     */
    Meta {
        #[arg(long)]
        file: PathBuf,
    },
}

/**
 * Main entry point for the import tool. Setup failures (unreadable config,
 * unreachable database, missing mandatory file) exit non-zero; completed runs
 * exit zero even when rows were skipped, the report carries the details.
 */
#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = ImportArguments::parse();

    let config = get_config(&args.config_file)?;

    init_tracing(&config.logging)?;

    let connection_pool = connect(&config).await?;
    sqlx::migrate!("./sqlx-postgresql-migration/migrations")
        .run(&connection_pool)
        .await
        .map_err(|err| std::io::Error::other(format!("Failed to run migrations: {err}")))?;
    let mut connection = connection_pool.acquire().await.map_err(|err| std::io::Error::other(format!("Failed to acquire connection: {err}")))?;

    let report: BatchReport = match args.command {
        ImportCommand::Territories { file } => territories::run(&mut connection, &file).await,
        ImportCommand::Parties { file } => parties::run(&mut connection, &file).await,
        ImportCommand::Officers { parties_file, mayors_file, vices_file, councillors_file, election_year, on_name_collision } => {
            let files = officers::OfficerFiles { parties: parties_file, mayors: mayors_file, vices: vices_file, councillors: councillors_file };
            officers::run(&mut connection, &files, election_year, on_name_collision).await
        }
        ImportCommand::Stats { population_file, electorate_file } => run_stats(&mut connection, population_file, electorate_file).await,
        ImportCommand::CouncilSeats { file } => council_seats::run(&mut connection, &file).await,
        ImportCommand::Elections { file } => elections::run(&mut connection, &file).await,
        ImportCommand::Meta { file } => meta::run(&mut connection, &file).await,
    }
    .map_err(|err| std::io::Error::other(format!("Import failed: {err}")))?;

    println!("{report}");
    completion_result(&report)
}

/**
 * Translates a finished run into the process exit status. Row-level skips
 * leave the run successful; counted fatal errors do not.
 */
fn completion_result(report: &BatchReport) -> std::io::Result<()> {
    if report.errors > 0 {
        return Err(std::io::Error::other(format!("Import {} finished with {} error(s)", report.label, report.errors)));
    }
    Ok(())
}

/**
 * Runs the population and electorate imports that were requested, merging
 * their reports.
 */
async fn run_stats(
    connection: &mut sqlx::PgConnection,
    population_file: Option<PathBuf>,
    electorate_file: Option<PathBuf>,
) -> Result<BatchReport, parana_civic_api::model::apperror::ApplicationError> {
    let mut report = BatchReport::new("stats");
    if let Some(file) = population_file {
        report.absorb(stats::run(connection, &file, stats::StatKind::Population).await?);
    }
    if let Some(file) = electorate_file {
        report.absorb(stats::run(connection, &file, stats::StatKind::Electorate).await?);
    }
    Ok(report)
}

/**
 * Connects to the database described by the configuration.
 */
async fn connect(config: &Config) -> Result<Pool<Postgres>, std::io::Error> {
    match config.clone().database.db_type {
        DatabaseType::Postgresql { connection_string, max_connections, min_connections, acquire_timeout, acquire_slow_threshold, idle_timeout, max_lifetime } => pool::PoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(std::time::Duration::from_millis(acquire_timeout))
            .acquire_slow_threshold(std::time::Duration::from_millis(acquire_slow_threshold))
            .idle_timeout(std::time::Duration::from_millis(idle_timeout))
            .max_lifetime(std::time::Duration::from_millis(max_lifetime))
            .connect(connection_string.as_str())
            .await
            .map_err(|err| std::io::Error::other(format!("Failed to create database pool: {err}"))),
    }
}

/**
 * Initializes logging from the logging configuration.
 */
fn init_tracing(logging: &LoggingConfig) -> Result<(), std::io::Error> {
    let mut env_filter = EnvFilter::from_default_env();
    for directive in &logging.directives {
        env_filter = env_filter.add_directive(directive.parse().map_err(|err| std::io::Error::other(format!("Invalid logging directive '{directive}': {err}")))?);
    }
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(logging.target)
        .with_thread_ids(logging.thread_ids)
        .with_thread_names(logging.thread_names)
        .with_line_number(logging.line_number)
        .with_level(logging.level)
        .with_ansi(logging.ansi)
        .init();
    Ok(())
}

/**
 * Reads the configuration from the specified file.
 */
fn get_config(config_file: &str) -> Result<Config, std::io::Error> {
    let config_str: String = std::fs::read_to_string(config_file).map_err(|err| std::io::Error::other(format!("Failed to read config file: {err}")))?;
    let config: Config = toml::from_str(&config_str).map_err(|err| std::io::Error::other(format!("Failed to parse config file: {err}")))?;
    Ok(config)
}

#[cfg(test)]
mod test {
    use super::*;
    use parana_civic_api::etl::report::RowOutcome;

    #[test]
    fn test_completion_succeeds_with_only_skips() {
        let mut report = BatchReport::new("stats");
        report.record("4104808/2024", RowOutcome::Created);
        report.record("9999999/2024", RowOutcome::Skipped("Municipality not found".to_string()));
        assert!(completion_result(&report).is_ok());
    }

    #[test]
    fn test_completion_fails_when_storage_errors_were_counted() {
        let mut report = BatchReport::new("stats");
        report.record("4104808/2024", RowOutcome::Created);
        report.record("4106902/2024", RowOutcome::Failed("Failed to query stats row: connection closed".to_string()));
        assert!(completion_result(&report).is_err());
    }
}
