use sqlx::PgConnection;

use crate::dao::{elections::ElectionsDao, municipality::MunicipalityDao, officials::OfficialsDao};
use crate::model::{
    apperror::ApplicationError,
    models::{CouncilSeatsAttributes, ElectionResultAttributes, MandateAttributes, MunicipalityAttributes, MunicipalityMetaAttributes, PartyAttributes, StatsAttributes},
};

/**
 * Explicit create-vs-update signal returned by every upsert operation.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/**
 * Applies resolved attributes to the store, deciding create-vs-update per
 * natural key. All operations are idempotent: rerunning a file yields
 * updates, never duplicates.
 */
pub struct UpsertCoordinator {
    municipality_dao: MunicipalityDao,
    officials_dao: OfficialsDao,
    elections_dao: ElectionsDao,
}

impl UpsertCoordinator {
    /**
     * Creates a new instance of `UpsertCoordinator`.
     */
    pub fn new() -> Self {
        UpsertCoordinator { municipality_dao: MunicipalityDao::new(), officials_dao: OfficialsDao::new(), elections_dao: ElectionsDao::new() }
    }

    /**
     * Upserts a territory by its unique name.
     *
     * # Returns
     * The territory id and whether it was created.
     */
    pub async fn apply_territory(&self, connection: &mut PgConnection, name: &str) -> Result<(i64, UpsertOutcome), ApplicationError> {
        if let Some(id) = self.municipality_dao.find_territory_by_name(connection, name).await? {
            return Ok((id, UpsertOutcome::Updated));
        }
        let id = self.municipality_dao.add_territory(connection, name).await?;
        Ok((id, UpsertOutcome::Created))
    }

    /**
     * Upserts a municipality by IBGE code. An existing municipality keeps its
     * code and gets its name refreshed; a `None` territory leaves the stored
     * link untouched.
     */
    pub async fn apply_municipality(&self, connection: &mut PgConnection, attributes: &MunicipalityAttributes) -> Result<(i64, UpsertOutcome), ApplicationError> {
        if let Some(existing) = self.municipality_dao.find_by_code(connection, attributes.ibge_code).await? {
            self.municipality_dao.update_municipality(connection, existing.id, &attributes.name, attributes.territory_id).await?;
            return Ok((existing.id, UpsertOutcome::Updated));
        }
        let id = self.municipality_dao.add_municipality(connection, attributes).await?;
        Ok((id, UpsertOutcome::Created))
    }

    /**
     * Applies enrichment attributes to an existing municipality. Update-only:
     * an unknown code is a row-level `NotFound`.
     */
    pub async fn apply_municipality_meta(&self, connection: &mut PgConnection, municipality_id: i64, meta: &MunicipalityMetaAttributes) -> Result<UpsertOutcome, ApplicationError> {
        self.municipality_dao.update_meta(connection, municipality_id, meta).await?;
        Ok(UpsertOutcome::Updated)
    }

    /**
     * Upserts a party by acronym. Party imports are authoritative: the
     * incoming attributes replace the stored ones.
     */
    pub async fn apply_party(&self, connection: &mut PgConnection, attributes: &PartyAttributes) -> Result<(i64, UpsertOutcome), ApplicationError> {
        if let Some(existing) = self.officials_dao.find_party_by_sigla(connection, &attributes.sigla).await? {
            self.officials_dao.update_party(connection, existing.id, attributes).await?;
            return Ok((existing.id, UpsertOutcome::Updated));
        }
        let id = self.officials_dao.add_party(connection, attributes).await?;
        Ok((id, UpsertOutcome::Created))
    }

    /**
     * Upserts a mandate on its natural key
     * (municipality, office, person, election year). A re-import refreshes
     * the party affiliation and cycle fields instead of duplicating the row.
     */
    pub async fn apply_mandate(&self, connection: &mut PgConnection, attributes: &MandateAttributes) -> Result<UpsertOutcome, ApplicationError> {
        if let Some(mandate_id) = self.officials_dao.find_mandate(connection, attributes.municipality_id, attributes.office, attributes.person_id, attributes.election_year).await? {
            self.officials_dao.update_mandate(connection, mandate_id, attributes).await?;
            return Ok(UpsertOutcome::Updated);
        }
        self.officials_dao.add_mandate(connection, attributes).await?;
        Ok(UpsertOutcome::Created)
    }

    /**
     * Upserts a statistics row per (municipality, year). Population and
     * electorate arrive from independent files, so incoming values are merged
     * over the stored row: an absent field never clobbers a populated one.
     */
    pub async fn apply_stats(&self, connection: &mut PgConnection, attributes: &StatsAttributes) -> Result<UpsertOutcome, ApplicationError> {
        if let Some((row_id, population, electorate)) = self.municipality_dao.find_stats_row(connection, attributes.municipality_id, attributes.reference_year).await? {
            let (population, electorate) = merge_stats((population, electorate), (attributes.population, attributes.electorate));
            self.municipality_dao.update_stats_row(connection, row_id, population, electorate).await?;
            return Ok(UpsertOutcome::Updated);
        }
        self.municipality_dao.add_stats_row(connection, attributes).await?;
        Ok(UpsertOutcome::Created)
    }

    /**
     * Upserts the configured council seats per (municipality, year).
     */
    pub async fn apply_council_seats(&self, connection: &mut PgConnection, attributes: &CouncilSeatsAttributes) -> Result<UpsertOutcome, ApplicationError> {
        if let Some(row_id) = self.municipality_dao.find_council_seats_row(connection, attributes.municipality_id, attributes.reference_year).await? {
            self.municipality_dao.update_council_seats_row(connection, row_id, attributes.seats).await?;
            return Ok(UpsertOutcome::Updated);
        }
        self.municipality_dao.add_council_seats_row(connection, attributes).await?;
        Ok(UpsertOutcome::Created)
    }

    /**
     * Upserts an election result on its natural key
     * (year, office, municipality, candidate name). The second import for the
     * same key replaces votes and party snapshot fields.
     */
    pub async fn apply_election_result(&self, connection: &mut PgConnection, attributes: &ElectionResultAttributes) -> Result<UpsertOutcome, ApplicationError> {
        if let Some(result_id) = self.elections_dao.find_result(connection, attributes.year, &attributes.office, attributes.municipality_id, &attributes.candidate_name).await? {
            self.elections_dao.update_result(connection, result_id, attributes).await?;
            return Ok(UpsertOutcome::Updated);
        }
        self.elections_dao.add_result(connection, attributes).await?;
        Ok(UpsertOutcome::Created)
    }
}

/**
 * Merges an incoming (population, electorate) pair over the stored one.
 * Incoming values win; absent incoming fields keep the stored values.
 */
fn merge_stats(existing: (Option<i64>, Option<i64>), incoming: (Option<i64>, Option<i64>)) -> (Option<i64>, Option<i64>) {
    (incoming.0.or(existing.0), incoming.1.or(existing.1))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_merge_keeps_populated_field_when_incoming_is_null() {
        // A population-only file must not null out a stored electorate.
        assert_eq!(merge_stats((None, Some(50000)), (Some(100000), None)), (Some(100000), Some(50000)));
    }

    #[test]
    fn test_merge_incoming_value_wins() {
        assert_eq!(merge_stats((None, Some(50000)), (None, Some(50500))), (None, Some(50500)));
    }

    #[test]
    fn test_merge_both_absent_stays_absent() {
        assert_eq!(merge_stats((None, None), (None, None)), (None, None));
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use crate::model::models::Office;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_stats_second_import_updates_in_place() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let coordinator = UpsertCoordinator::new();
        let (municipality_id, _) =
            coordinator.apply_municipality(&mut transaction, &MunicipalityAttributes { ibge_code: 4104808, name: "Cascavel".to_string(), territory_id: None }).await.unwrap();

        let first = StatsAttributes { municipality_id, reference_year: 2024, population: None, electorate: Some(50000) };
        assert_eq!(coordinator.apply_stats(&mut transaction, &first).await.unwrap(), UpsertOutcome::Created);
        let second = StatsAttributes { electorate: Some(50500), ..first };
        assert_eq!(coordinator.apply_stats(&mut transaction, &second).await.unwrap(), UpsertOutcome::Updated);

        let (_, population, electorate) = MunicipalityDao::new().find_stats_row(&mut transaction, municipality_id, 2024).await.unwrap().unwrap();
        assert_eq!(population, None);
        assert_eq!(electorate, Some(50500));
        transaction.rollback().await.unwrap(); // Rollback the transaction to avoid leaving test data in the database
    }

    #[sqlx::test]
    async fn test_partial_stats_import_preserves_other_field() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let coordinator = UpsertCoordinator::new();
        let (municipality_id, _) =
            coordinator.apply_municipality(&mut transaction, &MunicipalityAttributes { ibge_code: 4106902, name: "Curitiba".to_string(), territory_id: None }).await.unwrap();

        coordinator.apply_stats(&mut transaction, &StatsAttributes { municipality_id, reference_year: 2024, population: None, electorate: Some(50000) }).await.unwrap();
        coordinator.apply_stats(&mut transaction, &StatsAttributes { municipality_id, reference_year: 2024, population: Some(100000), electorate: None }).await.unwrap();

        let (_, population, electorate) = MunicipalityDao::new().find_stats_row(&mut transaction, municipality_id, 2024).await.unwrap().unwrap();
        assert_eq!(population, Some(100000));
        assert_eq!(electorate, Some(50000));
        transaction.rollback().await.unwrap(); // Rollback the transaction to avoid leaving test data in the database
    }

    #[sqlx::test]
    async fn test_mandate_reimport_is_idempotent() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let coordinator = UpsertCoordinator::new();
        let officials_dao = crate::dao::officials::OfficialsDao::new();
        let (municipality_id, _) =
            coordinator.apply_municipality(&mut transaction, &MunicipalityAttributes { ibge_code: 4104808, name: "Cascavel".to_string(), territory_id: None }).await.unwrap();
        let person_id = officials_dao.add_person(&mut transaction, "JOÃO DA SILVA", None).await.unwrap();
        let attributes = MandateAttributes {
            municipality_id,
            person_id,
            party_id: None,
            office: Office::Mayor,
            election_year: 2024,
            start_year: 2025,
            end_year: None,
            seat_number: None,
            legislature: None,
        };
        assert_eq!(coordinator.apply_mandate(&mut transaction, &attributes).await.unwrap(), UpsertOutcome::Created);
        assert_eq!(coordinator.apply_mandate(&mut transaction, &attributes).await.unwrap(), UpsertOutcome::Updated);
        transaction.rollback().await.unwrap(); // Rollback the transaction to avoid leaving test data in the database
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
