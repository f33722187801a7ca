use std::path::Path;

use serde::Deserialize;
use sqlx::PgConnection;

use crate::etl::importers::record_row_error;
use crate::etl::parser;
use crate::etl::report::{BatchReport, RowOutcome};
use crate::etl::upsert::{UpsertCoordinator, UpsertOutcome};
use crate::model::apperror::ApplicationError;
use crate::model::models::MunicipalityAttributes;

/**
 * One entry of the municipality/territory source file: a JSON array of
 * municipalities with their tourist-territory names.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerritoryRow {
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub cod_ibge: Option<i64>,
    #[serde(default)]
    pub territorio: Option<String>,
}

/**
 * Imports municipalities and their tourist territories from a JSON file.
 * Territories are upserted by name, municipalities by IBGE code; rows without
 * a code or name are skipped and counted.
 *
 * # Arguments
 * `connection`: The database connection for the run.
 * `path`: Path to the JSON source file.
 *
 * # Returns
 * The batch report, or an `ApplicationError` when the file cannot be read.
 */
pub async fn run(connection: &mut PgConnection, path: &Path) -> Result<BatchReport, ApplicationError> {
    let rows: Vec<TerritoryRow> = parser::read_json_file(path)?;
    tracing::info!("Importing {} municipality/territory rows from {}", rows.len(), path.display());
    let coordinator = UpsertCoordinator::new();
    let mut report = BatchReport::new("territories");

    for row in rows {
        let Some(name) = row.nome.as_deref().map(str::trim).filter(|name| !name.is_empty()) else {
            report.record("(unnamed)", RowOutcome::Skipped("Missing municipality name".to_string()));
            continue;
        };
        let Some(ibge_code) = row.cod_ibge else {
            report.record(name, RowOutcome::Skipped("Missing IBGE code".to_string()));
            continue;
        };

        let territory_id = match upsert_territory(&coordinator, connection, row.territorio.as_deref(), &mut report).await {
            Ok(territory_id) => territory_id,
            Err(error) => {
                record_row_error(&mut report, name, error);
                continue;
            }
        };

        let attributes = MunicipalityAttributes { ibge_code, name: name.to_string(), territory_id };
        match coordinator.apply_municipality(connection, &attributes).await {
            Ok((_, outcome)) => report.record(&ibge_code.to_string(), outcome.into()),
            Err(error) => record_row_error(&mut report, &ibge_code.to_string(), error),
        }
    }
    Ok(report)
}

/**
 * Upserts the territory named by the row, if any, and counts its creation.
 */
async fn upsert_territory(coordinator: &UpsertCoordinator, connection: &mut PgConnection, territory: Option<&str>, report: &mut BatchReport) -> Result<Option<i64>, ApplicationError> {
    let Some(territory_name) = territory.map(str::trim).filter(|name| !name.is_empty()) else {
        return Ok(None);
    };
    let (territory_id, outcome) = coordinator.apply_territory(connection, territory_name).await?;
    if outcome == UpsertOutcome::Created {
        report.record(territory_name, outcome.into());
    }
    Ok(Some(territory_id))
}
