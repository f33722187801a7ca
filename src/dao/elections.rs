use rust_decimal::Decimal;
use sqlx::PgConnection;
use tracing::{Instrument, instrument};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{ElectionResultAttributes, ElectionResultType},
};

/**
 * Database response type for an election result joined with its municipality.
 */
pub type QueryElectionResultDbResp = (i64, i32, i32, String, String, i64, String, String, Option<i32>, Option<String>, Option<String>, i64, Option<Decimal>);

/**
 * SQL query to retrieve an election result id by its natural key
 * (year, office, municipality, candidate name).
 */
const QUERY_RESULT_BY_KEY: &str = "SELECT id FROM election_result WHERE year = $1 AND office = $2 AND municipality_id = $3 AND candidate_name = $4";

/**
 * SQL query to add a new election result.
 */
const ADD_RESULT: &str = "INSERT INTO election_result (year, round, office, state, municipality_id, candidate_name, candidate_number, party_sigla, party_name, votes, percent_valid, inserted_at, updated_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, now(), now()) RETURNING id";

/**
 * SQL query replacing the mutable fields of an existing election result.
 */
const UPDATE_RESULT: &str = "UPDATE election_result SET round = $1, candidate_number = $2, party_sigla = $3, party_name = $4, votes = $5, percent_valid = $6, updated_at = now() WHERE id = $7";

/**
 * SQL query for the historical voting series of a candidate-name filter,
 * optionally scoped to one municipality. Years ascend; within a year the
 * leading result surfaces first.
 */
const QUERY_VOTING_HISTORY: &str = "SELECT e.id, e.year, e.round, e.office, e.state, m.ibge_code, m.name, e.candidate_name, e.candidate_number, e.party_sigla, e.party_name, e.votes, e.percent_valid \
     FROM election_result e JOIN municipality m ON e.municipality_id = m.id \
     WHERE e.candidate_name ILIKE '%' || $1 || '%' AND ($2::bigint IS NULL OR e.municipality_id = $2) \
     ORDER BY e.year ASC, e.votes DESC";

impl From<QueryElectionResultDbResp> for ElectionResultType {
    fn from(row: QueryElectionResultDbResp) -> Self {
        ElectionResultType {
            id: row.0,
            year: row.1,
            round: row.2,
            office: row.3,
            state: row.4,
            ibge_code: row.5,
            municipality_name: row.6,
            candidate_name: row.7,
            candidate_number: row.8,
            party_sigla: row.9,
            party_name: row.10,
            votes: row.11,
            percent_valid: row.12,
        }
    }
}

/**
 * DAO for historical election result database operations.
 */
pub struct ElectionsDao {}

impl ElectionsDao {
    /**
     * Creates a new instance of `ElectionsDao`.
     */
    pub fn new() -> Self {
        ElectionsDao {}
    }

    /**
     * Retrieves an election result id by its natural key.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn find_result(&self, connection: &mut PgConnection, year: i32, office: &str, municipality_id: i64, candidate_name: &str) -> Result<Option<i64>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<(i64,)> = sqlx::query_as(QUERY_RESULT_BY_KEY)
            .bind(year)
            .bind(office)
            .bind(municipality_id)
            .bind(candidate_name)
            .fetch_optional(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to query election result by key: {err}")))?;
        Ok(result.map(|row| row.0))
    }

    /**
     * Adds a new election result and returns its generated id.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn add_result(&self, transaction: &mut PgConnection, attributes: &ElectionResultAttributes) -> Result<i64, ApplicationError> {
        let span = tracing::Span::current();
        let row: (i64,) = sqlx::query_as(ADD_RESULT)
            .bind(attributes.year)
            .bind(attributes.round)
            .bind(&attributes.office)
            .bind(&attributes.state)
            .bind(attributes.municipality_id)
            .bind(&attributes.candidate_name)
            .bind(attributes.candidate_number)
            .bind(&attributes.party_sigla)
            .bind(&attributes.party_name)
            .bind(attributes.votes)
            .bind(attributes.percent_valid)
            .fetch_one(transaction)
            .instrument(span)
            .await
            .map_err(|err| super::handle_database_error(err.as_database_error()))?;
        Ok(row.0)
    }

    /**
     * Replaces the mutable fields of an existing election result.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn update_result(&self, transaction: &mut PgConnection, result_id: i64, attributes: &ElectionResultAttributes) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(UPDATE_RESULT)
            .bind(attributes.round)
            .bind(attributes.candidate_number)
            .bind(&attributes.party_sigla)
            .bind(&attributes.party_name)
            .bind(attributes.votes)
            .bind(attributes.percent_valid)
            .bind(result_id)
            .execute(transaction)
            .instrument(span)
            .await
            .map_err(|err| super::handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            tracing::debug!("Election result with id {} not found for update", result_id);
            return Err(ApplicationError::new(ErrorType::NotFound, "Election result not found".to_string()));
        }
        Ok(())
    }

    /**
     * Retrieves the historical voting series for a candidate-name filter,
     * optionally scoped to one municipality.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_voting_history(&self, connection: &mut PgConnection, candidate_filter: &str, municipality_id: Option<i64>) -> Result<Vec<ElectionResultType>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryElectionResultDbResp> = sqlx::query_as(QUERY_VOTING_HISTORY)
            .bind(super::escape_like_fragment(candidate_filter))
            .bind(municipality_id)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to query voting history: {err}")))?;
        Ok(results.into_iter().map(ElectionResultType::from).collect())
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use crate::dao::municipality::MunicipalityDao;
    use crate::model::models::MunicipalityAttributes;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_result_upsert_cycle_and_history_order() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let elections_dao = ElectionsDao::new();
        let municipality_dao = MunicipalityDao::new();
        let municipality_id =
            municipality_dao.add_municipality(&mut transaction, &MunicipalityAttributes { ibge_code: 4104808, name: "Cascavel".to_string(), territory_id: None }).await.unwrap();
        let mut attributes = ElectionResultAttributes {
            municipality_id,
            year: 2018,
            round: 1,
            office: "DEPUTADO ESTADUAL".to_string(),
            state: "PR".to_string(),
            candidate_name: "LEONALDO PARANHOS".to_string(),
            candidate_number: Some(45123),
            party_sigla: Some("PSC".to_string()),
            party_name: None,
            votes: 30000,
            percent_valid: None,
        };
        let result_id = elections_dao.add_result(&mut transaction, &attributes).await.unwrap();
        attributes.votes = 31000;
        elections_dao.update_result(&mut transaction, result_id, &attributes).await.unwrap();
        attributes.year = 2022;
        let _ = elections_dao.add_result(&mut transaction, &attributes).await.unwrap();

        let history = elections_dao.get_voting_history(&mut transaction, "paranhos", None).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].year, 2018);
        assert_eq!(history[0].votes, 31000);
        assert_eq!(history[1].year, 2022);

        let scoped = elections_dao.get_voting_history(&mut transaction, "paranhos", Some(municipality_id)).await.unwrap();
        assert_eq!(scoped.len(), 2);

        let wildcard = elections_dao.get_voting_history(&mut transaction, "%", None).await.unwrap();
        assert!(wildcard.is_empty());
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
