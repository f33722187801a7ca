use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgConnection;

use crate::etl::importers::record_row_error;
use crate::etl::parser;
use crate::etl::report::{BatchReport, RowOutcome};
use crate::etl::resolver::EntityResolver;
use crate::etl::upsert::{UpsertCoordinator, UpsertOutcome};
use crate::model::apperror::ApplicationError;
use crate::model::models::ElectionResultAttributes;

const DEFAULT_OFFICE: &str = "DEPUTADO ESTADUAL";
const DEFAULT_STATE: &str = "PR";

/**
 * One row of a historical election-result export. Older exports omit the
 * round, office and vote columns; those default at import time.
 */
#[derive(Debug, Deserialize)]
pub struct ElectionResultRow {
    pub ibge_code: i64,
    pub year: i32,
    #[serde(default)]
    pub round: Option<i32>,
    #[serde(default)]
    pub office: Option<String>,
    pub candidate_name: String,
    #[serde(default)]
    pub candidate_number: Option<i32>,
    #[serde(default)]
    pub party_sigla: Option<String>,
    #[serde(default)]
    pub party_name: Option<String>,
    #[serde(default)]
    pub votes: Option<i64>,
    #[serde(default)]
    pub percent_valid: Option<Decimal>,
}

/**
 * Imports historical election results. Rows are keyed on
 * (year, office, municipality, candidate name); re-imports update vote
 * counts and party snapshots in place. Party fields are snapshots of the
 * affiliation at that election, not links into the party table.
 *
 * # Arguments
 * `connection`: The database connection for the run.
 * `path`: The CSV file to import.
 */
pub async fn run(connection: &mut PgConnection, path: &Path) -> Result<BatchReport, ApplicationError> {
    let mut report = BatchReport::new("elections");
    let rows = parser::read_csv_file::<ElectionResultRow>(path)?;
    tracing::info!("Importing {} election result rows from {}", rows.len(), path.display());
    let resolver = EntityResolver::new();
    let coordinator = UpsertCoordinator::new();

    for row in rows {
        let row = match row {
            Ok(row) => row,
            Err(error) => {
                record_row_error(&mut report, "(unparsed)", error);
                continue;
            }
        };
        let key = format!("{}/{}/{}", row.ibge_code, row.year, row.candidate_name);
        if row.candidate_name.is_empty() {
            report.record(&key, RowOutcome::Skipped("Missing candidate name".to_string()));
            continue;
        }
        match import_result_row(connection, &resolver, &coordinator, &row).await {
            Ok(outcome) => report.record(&key, outcome.into()),
            Err(error) => record_row_error(&mut report, &key, error),
        }
    }
    Ok(report)
}

async fn import_result_row(
    connection: &mut PgConnection,
    resolver: &EntityResolver,
    coordinator: &UpsertCoordinator,
    row: &ElectionResultRow,
) -> Result<UpsertOutcome, ApplicationError> {
    let municipality = resolver.resolve_municipality(connection, row.ibge_code).await?;
    let attributes = ElectionResultAttributes {
        municipality_id: municipality.id,
        year: row.year,
        round: row.round.unwrap_or(1),
        office: row.office.clone().filter(|office| !office.is_empty()).unwrap_or_else(|| DEFAULT_OFFICE.to_string()),
        state: DEFAULT_STATE.to_string(),
        candidate_name: row.candidate_name.clone(),
        candidate_number: row.candidate_number,
        party_sigla: row.party_sigla.clone().filter(|sigla| !sigla.is_empty()),
        party_name: row.party_name.clone().filter(|name| !name.is_empty()),
        votes: row.votes.unwrap_or(0),
        percent_valid: row.percent_valid,
    };
    coordinator.apply_election_result(connection, &attributes).await
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_full_row_parses() {
        let input = "ibge_code,year,round,office,candidate_name,candidate_number,party_sigla,party_name,votes,percent_valid\n\
                     4118402,2022,1,GOVERNADOR,CARLOS MASSA,44,PSD,Partido Social Democrático,4592,61.23\n";
        let rows: Vec<Result<ElectionResultRow, ApplicationError>> = parser::read_csv(input.as_bytes()).unwrap();
        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.year, 2022);
        assert_eq!(row.office.as_deref(), Some("GOVERNADOR"));
        assert_eq!(row.votes, Some(4592));
        assert_eq!(row.percent_valid, Some(Decimal::new(6123, 2)));
    }

    #[test]
    fn test_minimal_row_defaults_apply_downstream() {
        let input = "ibge_code,year,candidate_name\n4118402,2018,REQUIÃO\n";
        let rows: Vec<Result<ElectionResultRow, ApplicationError>> = parser::read_csv(input.as_bytes()).unwrap();
        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.round, None);
        assert_eq!(row.office, None);
        assert_eq!(row.votes, None);
    }

    #[test]
    fn test_missing_candidate_name_column_is_row_level() {
        let input = "ibge_code,year\n4118402,2018\n";
        let rows: Vec<Result<ElectionResultRow, ApplicationError>> = parser::read_csv(input.as_bytes()).unwrap();
        assert!(rows[0].is_err());
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use crate::dao::elections::ElectionsDao;
    use crate::model::models::MunicipalityAttributes;
    use sqlx::PgPool;
    use std::io::Write;
    use std::path::PathBuf;

    #[sqlx::test]
    async fn test_reimport_updates_votes_in_place() {
        let pool = init_db().await;
        let mut connection = pool.acquire().await.unwrap();
        let coordinator = UpsertCoordinator::new();
        let (municipality_id, _) =
            coordinator.apply_municipality(&mut connection, &MunicipalityAttributes { ibge_code: 4118402, name: "Paranhos".to_string(), territory_id: None }).await.unwrap();

        let first = write_temp_file("first", "ibge_code,year,candidate_name,votes\n4118402,2022,CARLOS MASSA,4500\n");
        let report = run(&mut connection, &first).await.unwrap();
        assert_eq!(report.created, 1);

        let second = write_temp_file("second", "ibge_code,year,candidate_name,votes\n4118402,2022,CARLOS MASSA,4592\n");
        let report = run(&mut connection, &second).await.unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.created, 0);

        let history = ElectionsDao::new().get_voting_history(&mut connection, "CARLOS MASSA", Some(municipality_id)).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].votes, 4592);
    }

    fn write_temp_file(label: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("elections_test_{label}_{}.csv", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    /**
     * Initialize the database connection pool.
     */
    async fn init_db() -> PgPool {
        dotenv::from_filename("./sqlx-postgresql-migration/.env-test").ok();
        let pool = PgPool::connect(dotenv::var("DATABASE_URL").unwrap().as_str()).await.unwrap();
        sqlx::migrate!("./sqlx-postgresql-migration/migrations").run(&pool).await.unwrap();
        pool
    }
}
