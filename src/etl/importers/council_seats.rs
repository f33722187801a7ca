use std::path::Path;

use serde::Deserialize;
use sqlx::PgConnection;

use crate::etl::importers::record_row_error;
use crate::etl::parser;
use crate::etl::report::BatchReport;
use crate::etl::resolver::EntityResolver;
use crate::etl::upsert::UpsertCoordinator;
use crate::model::apperror::ApplicationError;
use crate::model::models::CouncilSeatsAttributes;

/**
 * One row of a council-composition file: the number of seats a municipal
 * council holds for a reference year.
 */
#[derive(Debug, Deserialize)]
pub struct CouncilSeatsRow {
    pub ibge_code: i64,
    pub year: i32,
    pub seats: i32,
}

/**
 * Imports council seat counts, one row per (municipality, year).
 *
 * # Arguments
 * `connection`: The database connection for the run.
 * `path`: The CSV file to import.
 */
pub async fn run(connection: &mut PgConnection, path: &Path) -> Result<BatchReport, ApplicationError> {
    let mut report = BatchReport::new("council-seats");
    let rows = parser::read_csv_file::<CouncilSeatsRow>(path)?;
    tracing::info!("Importing {} council seat rows from {}", rows.len(), path.display());
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
        let key = format!("{}/{}", row.ibge_code, row.year);
        let result = async {
            let municipality = resolver.resolve_municipality(connection, row.ibge_code).await?;
            let attributes = CouncilSeatsAttributes { municipality_id: municipality.id, reference_year: row.year, seats: row.seats };
            coordinator.apply_council_seats(connection, &attributes).await
        }
        .await;
        match result {
            Ok(outcome) => report.record(&key, outcome.into()),
            Err(error) => record_row_error(&mut report, &key, error),
        }
    }
    Ok(report)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_council_seats_row_parses() {
        let input = "ibge_code,year,seats\n4104808,2024,21\n";
        let rows: Vec<Result<CouncilSeatsRow, ApplicationError>> = parser::read_csv(input.as_bytes()).unwrap();
        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.ibge_code, 4104808);
        assert_eq!(row.seats, 21);
    }
}
