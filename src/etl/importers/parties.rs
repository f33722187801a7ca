use std::path::Path;

use serde::Deserialize;
use sqlx::PgConnection;

use crate::etl::importers::record_row_error;
use crate::etl::parser;
use crate::etl::report::{BatchReport, RowOutcome};
use crate::etl::upsert::UpsertCoordinator;
use crate::model::apperror::ApplicationError;
use crate::model::models::PartyAttributes;

/**
 * One row of the party master file: `sigla,name,tse_number,color_hex`.
 */
#[derive(Debug, Deserialize)]
pub struct PartyRow {
    pub sigla: String,
    pub name: String,
    #[serde(default)]
    pub tse_number: Option<i32>,
    #[serde(default)]
    pub color_hex: Option<String>,
}

/**
 * Imports the party master list from a CSV file, upserting by acronym.
 * Party imports are authoritative for the fields they carry.
 */
pub async fn run(connection: &mut PgConnection, path: &Path) -> Result<BatchReport, ApplicationError> {
    let rows = parser::read_csv_file::<PartyRow>(path)?;
    tracing::info!("Importing {} party rows from {}", rows.len(), path.display());
    let coordinator = UpsertCoordinator::new();
    let mut report = BatchReport::new("parties");

    for row in rows {
        let row = match row {
            Ok(row) => row,
            Err(error) => {
                record_row_error(&mut report, "(unparsed)", error);
                continue;
            }
        };
        if row.sigla.is_empty() || row.name.is_empty() {
            report.record(&row.sigla, RowOutcome::Skipped("Missing party acronym or name".to_string()));
            continue;
        }
        let attributes = PartyAttributes { sigla: row.sigla.clone(), name: row.name, tse_number: row.tse_number, color_hex: row.color_hex };
        match coordinator.apply_party(connection, &attributes).await {
            Ok((_, outcome)) => report.record(&row.sigla, outcome.into()),
            Err(error) => record_row_error(&mut report, &row.sigla, error),
        }
    }
    Ok(report)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_party_row_parsing() {
        let input = "sigla,name,tse_number,color_hex\nPT,Partido dos Trabalhadores,13,\n";
        let rows: Vec<Result<PartyRow, ApplicationError>> = parser::read_csv(input.as_bytes()).unwrap();
        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.sigla, "PT");
        assert_eq!(row.tse_number, Some(13));
        assert_eq!(row.color_hex, None);
    }

    #[test]
    fn test_party_row_without_optional_columns() {
        let input = "sigla,name\nNOVO,Partido Novo\n";
        let rows: Vec<Result<PartyRow, ApplicationError>> = parser::read_csv(input.as_bytes()).unwrap();
        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.tse_number, None);
    }
}
