use std::path::{Path, PathBuf};

use serde::Deserialize;
use sqlx::PgConnection;

use crate::dao::officials::OfficialsDao;
use crate::etl::importers::{parties, record_row_error};
use crate::etl::parser;
use crate::etl::report::{BatchReport, RowOutcome};
use crate::etl::resolver::{EntityResolver, NameCollisionPolicy, PersonMatch};
use crate::etl::upsert::UpsertCoordinator;
use crate::model::apperror::ApplicationError;
use crate::model::models::{MandateAttributes, Office};

/**
 * One row of an elected-officer file: `ibge,name,party,photo_url` plus an
 * optional seat number for council members.
 */
#[derive(Debug, Deserialize)]
pub struct OfficerRow {
    pub ibge: i64,
    pub name: String,
    #[serde(default)]
    pub party: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub seat_number: Option<i32>,
}

/**
 * Source files for one officer import run. Each file is optional; a run may
 * import a single office kind.
 */
#[derive(Debug, Default)]
pub struct OfficerFiles {
    pub parties: Option<PathBuf>,
    pub mayors: Option<PathBuf>,
    pub vices: Option<PathBuf>,
    pub councillors: Option<PathBuf>,
}

/**
 * Imports the elected officers of one election cycle. Municipal mandates
 * begin the January after the election, so the start year is the election
 * year plus one and the cycle spans four years.
 *
 * The mandate upsert is idempotent on (municipality, office, person,
 * election year); re-running a corrected file updates affiliations instead of
 * duplicating mandates. Party affiliation is authoritative per run.
 *
 * # Arguments
 * `connection`: The database connection for the run.
 * `files`: The officer source files; a party master file may be imported first.
 * `election_year`: The election cycle being imported.
 * `policy`: How to treat ambiguous person-name matches.
 */
pub async fn run(connection: &mut PgConnection, files: &OfficerFiles, election_year: i32, policy: NameCollisionPolicy) -> Result<BatchReport, ApplicationError> {
    let mut report = BatchReport::new("officers");
    if let Some(parties_file) = &files.parties {
        report.absorb(parties::run(connection, parties_file).await?);
    }
    let sections = [(Office::Mayor, &files.mayors), (Office::ViceMayor, &files.vices), (Office::CouncilMember, &files.councillors)];
    for (office, path) in sections {
        if let Some(path) = path {
            import_office_file(connection, path, office, election_year, policy, &mut report).await?;
        }
    }
    Ok(report)
}

/**
 * Imports one officer file for a single office kind.
 */
async fn import_office_file(
    connection: &mut PgConnection,
    path: &Path,
    office: Office,
    election_year: i32,
    policy: NameCollisionPolicy,
    report: &mut BatchReport,
) -> Result<(), ApplicationError> {
    let rows = parser::read_csv_file::<OfficerRow>(path)?;
    tracing::info!("Importing {} {} rows from {}", rows.len(), office, path.display());
    let resolver = EntityResolver::new();
    let coordinator = UpsertCoordinator::new();

    for row in rows {
        let row = match row {
            Ok(row) => row,
            Err(error) => {
                record_row_error(report, "(unparsed)", error);
                continue;
            }
        };
        let key = format!("{}:{}", row.ibge, row.name);
        if row.name.is_empty() {
            report.record(&key, RowOutcome::Skipped("Missing officer name".to_string()));
            continue;
        }
        if let Err(error) = import_officer_row(connection, &resolver, &coordinator, &row, office, election_year, policy, report).await {
            record_row_error(report, &key, error);
        }
    }
    Ok(())
}

/**
 * Resolves and upserts one officer row. Errors bubble to the caller where
 * they become counted row outcomes.
 */
#[allow(clippy::too_many_arguments)]
async fn import_officer_row(
    connection: &mut PgConnection,
    resolver: &EntityResolver,
    coordinator: &UpsertCoordinator,
    row: &OfficerRow,
    office: Office,
    election_year: i32,
    policy: NameCollisionPolicy,
    report: &mut BatchReport,
) -> Result<(), ApplicationError> {
    let key = format!("{}:{}", row.ibge, row.name);
    let municipality = resolver.resolve_municipality(connection, row.ibge).await?;

    let party_id = match row.party.as_deref().map(str::trim).filter(|sigla| !sigla.is_empty()) {
        Some(sigla) => {
            let resolution = resolver.resolve_or_vivify_party(connection, sigla, None).await?;
            if resolution.vivified {
                report.record_stub_created(sigla);
            }
            Some(resolution.party_id)
        }
        None => None,
    };

    let officials_dao = OfficialsDao::new();
    let photo_url = row.photo_url.as_deref().filter(|photo_url| !photo_url.is_empty());
    let person_id = match resolver.resolve_person(connection, &row.name).await? {
        PersonMatch::NoMatch => officials_dao.add_person(connection, &row.name, photo_url).await?,
        PersonMatch::Exact(person_id) => {
            if let Some(photo_url) = photo_url {
                officials_dao.set_person_photo_if_missing(connection, person_id, photo_url).await?;
            }
            person_id
        }
        PersonMatch::Ambiguous(candidates) => match policy {
            NameCollisionPolicy::UseOldest => {
                report.record_name_collision(&row.name, candidates.len(), "kept oldest");
                candidates[0]
            }
            NameCollisionPolicy::SkipRow => {
                report.record_name_collision(&row.name, candidates.len(), "row skipped");
                report.record(&key, RowOutcome::Skipped("Ambiguous person name".to_string()));
                return Ok(());
            }
        },
    };

    let start_year = election_year + 1;
    let attributes = MandateAttributes {
        municipality_id: municipality.id,
        person_id,
        party_id,
        office,
        election_year,
        start_year,
        end_year: Some(start_year + 3),
        seat_number: if office == Office::CouncilMember { row.seat_number } else { None },
        legislature: Some(format!("{}-{}", start_year, start_year + 3)),
    };
    let outcome = coordinator.apply_mandate(connection, &attributes).await?;
    report.record(&key, outcome.into());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_officer_row_without_seat_column() {
        let input = "ibge,name,party,photo_url\n4104808,JOÃO DA SILVA,PT,\n";
        let rows: Vec<Result<OfficerRow, ApplicationError>> = parser::read_csv(input.as_bytes()).unwrap();
        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.ibge, 4104808);
        assert_eq!(row.party.as_deref(), Some("PT"));
        assert_eq!(row.seat_number, None);
    }

    #[test]
    fn test_councillor_row_with_seat() {
        let input = "ibge,name,party,photo_url,seat_number\n4104808,MARIA SOUZA,PSD,,7\n";
        let rows: Vec<Result<OfficerRow, ApplicationError>> = parser::read_csv(input.as_bytes()).unwrap();
        assert_eq!(rows[0].as_ref().unwrap().seat_number, Some(7));
    }
}
