use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use sqlx::PgConnection;

use crate::etl::importers::record_row_error;
use crate::etl::parser;
use crate::etl::report::BatchReport;
use crate::etl::resolver::EntityResolver;
use crate::etl::upsert::{UpsertCoordinator, UpsertOutcome};
use crate::model::apperror::{ApplicationError, ErrorType};
use crate::model::models::{MunicipalityMetaAttributes, Tier};

/**
 * One row of a municipality enrichment file. Every column besides the IBGE
 * code is optional; absent columns leave the stored value untouched.
 */
#[derive(Debug, Deserialize)]
pub struct MetaRow {
    pub ibge_code: i64,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub crest_url: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
}

/**
 * Imports municipality metadata. Update-only: rows for unknown IBGE codes
 * are skipped and counted, never created, since identity comes from the
 * territory import.
 *
 * # Arguments
 * `connection`: The database connection for the run.
 * `path`: The CSV file to import.
 */
pub async fn run(connection: &mut PgConnection, path: &Path) -> Result<BatchReport, ApplicationError> {
    let mut report = BatchReport::new("meta");
    let rows = parser::read_csv_file::<MetaRow>(path)?;
    tracing::info!("Importing {} municipality metadata rows from {}", rows.len(), path.display());
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
        let key = row.ibge_code.to_string();
        match import_meta_row(connection, &resolver, &coordinator, &row).await {
            Ok(outcome) => report.record(&key, outcome.into()),
            Err(error) => record_row_error(&mut report, &key, error),
        }
    }
    Ok(report)
}

async fn import_meta_row(
    connection: &mut PgConnection,
    resolver: &EntityResolver,
    coordinator: &UpsertCoordinator,
    row: &MetaRow,
) -> Result<UpsertOutcome, ApplicationError> {
    let tier = match row.tier.as_deref().map(str::trim).filter(|tier| !tier.is_empty()) {
        Some(raw) => Some(Tier::from_str(raw).map_err(|_| ApplicationError::new(ErrorType::Validation, format!("Unknown tier '{raw}'")))?),
        None => None,
    };
    let municipality = resolver.resolve_municipality(connection, row.ibge_code).await?;
    let meta = MunicipalityMetaAttributes {
        state: row.state.clone().filter(|state| !state.is_empty()),
        latitude: row.latitude,
        longitude: row.longitude,
        crest_url: row.crest_url.clone().filter(|crest_url| !crest_url.is_empty()),
        tier,
    };
    coordinator.apply_municipality_meta(connection, municipality.id, &meta).await
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_meta_row_with_sparse_columns() {
        let input = "ibge_code,tier\n4104808,GOLD\n";
        let rows: Vec<Result<MetaRow, ApplicationError>> = parser::read_csv(input.as_bytes()).unwrap();
        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.tier.as_deref(), Some("GOLD"));
        assert_eq!(row.latitude, None);
    }

    #[test]
    fn test_full_meta_row() {
        let input = "ibge_code,state,latitude,longitude,crest_url,tier\n4104808,PR,-24.9555,-53.4552,https://example.org/cascavel.png,silver\n";
        let rows: Vec<Result<MetaRow, ApplicationError>> = parser::read_csv(input.as_bytes()).unwrap();
        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.state.as_deref(), Some("PR"));
        assert_eq!(row.latitude, Some(-24.9555));
        assert_eq!(row.tier.as_deref(), Some("silver"));
    }
}
