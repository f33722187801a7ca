use std::path::Path;

use serde::Deserialize;
use sqlx::PgConnection;

use crate::etl::importers::record_row_error;
use crate::etl::parser;
use crate::etl::report::BatchReport;
use crate::etl::resolver::EntityResolver;
use crate::etl::upsert::{UpsertCoordinator, UpsertOutcome};
use crate::model::apperror::ApplicationError;
use crate::model::models::StatsAttributes;

/**
 * Which statistic an input file carries. Population and electorate arrive
 * from independent sources and are merged into the same yearly row.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Population,
    Electorate,
}

/**
 * One row of a yearly statistic file. The value column is named after the
 * statistic in the source exports.
 */
#[derive(Debug, Deserialize)]
pub struct StatRow {
    pub ibge_code: i64,
    pub year: i32,
    #[serde(alias = "population", alias = "electorate")]
    pub value: i64,
}

/**
 * Imports one yearly statistic file, merging values into the statistics row
 * per (municipality, year). Re-importing the other statistic for the same
 * year updates the row in place and never clears the field it does not carry.
 *
 * # Arguments
 * `connection`: The database connection for the run.
 * `path`: The CSV file to import.
 * `kind`: Which statistic the file carries.
 */
pub async fn run(connection: &mut PgConnection, path: &Path, kind: StatKind) -> Result<BatchReport, ApplicationError> {
    let label = match kind {
        StatKind::Population => "population",
        StatKind::Electorate => "electorate",
    };
    let mut report = BatchReport::new(label);
    let rows = parser::read_csv_file::<StatRow>(path)?;
    tracing::info!("Importing {} {} rows from {}", rows.len(), label, path.display());
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
        match import_stat_row(connection, &resolver, &coordinator, &row, kind).await {
            Ok(outcome) => report.record(&key, outcome.into()),
            Err(error) => record_row_error(&mut report, &key, error),
        }
    }
    Ok(report)
}

async fn import_stat_row(
    connection: &mut PgConnection,
    resolver: &EntityResolver,
    coordinator: &UpsertCoordinator,
    row: &StatRow,
    kind: StatKind,
) -> Result<UpsertOutcome, ApplicationError> {
    let municipality = resolver.resolve_municipality(connection, row.ibge_code).await?;
    let attributes = StatsAttributes {
        municipality_id: municipality.id,
        reference_year: row.year,
        population: if kind == StatKind::Population { Some(row.value) } else { None },
        electorate: if kind == StatKind::Electorate { Some(row.value) } else { None },
    };
    coordinator.apply_stats(connection, &attributes).await
}
