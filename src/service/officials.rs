use sqlx::{Pool, Postgres};

use crate::{
    dao::{municipality::MunicipalityDao, officials::OfficialsDao},
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{AuthoritiesType, AuthorityMatchType, Office, PartyType},
    },
};

/**
 * Shortest accepted name-search query.
 */
const SEARCH_MIN_QUERY_LENGTH: usize = 2;
/**
 * Maximum number of name-search hits returned.
 */
const SEARCH_RESULT_CAP: i64 = 20;

/**
 * Represents the service for elected officials and parties.
 */
pub struct OfficialsService {
    /**
     * The DAO for officials operations.
     */
    officials_dao: OfficialsDao,
    /**
     * The DAO for municipality lookups.
     */
    municipality_dao: MunicipalityDao,
    /**
     * Optional connection pool for database operations. Optional for test purposes until we have a better way to mock the database.
     */
    connection_pool: Option<Pool<Postgres>>,
}

impl OfficialsService {
    /**
     * Creates a new instance of `OfficialsService`.
     *
     * # Arguments
     * `officials_dao`: The DAO for officials operations.
     * `municipality_dao`: The DAO for municipality lookups.
     * `connection_pool`: Optional connection pool for database operations.
     *
     * # Returns
     * A new instance of `OfficialsService`.
     */
    pub fn new(officials_dao: OfficialsDao, municipality_dao: MunicipalityDao, connection_pool: Option<Pool<Postgres>>) -> Self {
        OfficialsService { officials_dao, municipality_dao, connection_pool }
    }

    /**
     * Retrieves the authorities of a municipality for one election cycle,
     * partitioned by office. An unknown IBGE code is not found; a known code
     * with no recorded mandates yields empty partitions.
     *
     * # Arguments
     * `ibge_code`: The IBGE code of the municipality.
     * `election_year`: The election cycle.
     *
     * # Returns
     * A Result containing the partitioned authorities or an `ApplicationError`.
     */
    pub async fn get_authorities(&self, ibge_code: i64, election_year: i32) -> Result<AuthoritiesType, ApplicationError> {
        let mut connection = self.acquire().await?;
        let municipality = self
            .municipality_dao
            .find_by_code(&mut connection, ibge_code)
            .await?
            .ok_or_else(|| ApplicationError::new(ErrorType::NotFound, format!("Municipality not found for IBGE code {ibge_code}")))?;
        let authorities = self.officials_dao.get_authorities(&mut connection, municipality.id, election_year).await?;

        let mut result = AuthoritiesType { mayor: None, vice_mayor: None, council_members: Vec::new() };
        for authority in authorities {
            match authority.office {
                Office::Mayor => result.mayor = Some(authority),
                Office::ViceMayor => result.vice_mayor = Some(authority),
                Office::CouncilMember => result.council_members.push(authority),
            }
        }
        Ok(result)
    }

    /**
     * Searches officials by case-insensitive substring on the full name.
     * Queries shorter than two characters return an empty list without
     * touching the store; hits are capped and ordered by name.
     *
     * # Arguments
     * `query`: The name fragment to search for.
     *
     * # Returns
     * A Result containing the matched officials or an `ApplicationError`.
     */
    pub async fn search_authorities(&self, query: &str) -> Result<Vec<AuthorityMatchType>, ApplicationError> {
        let query = query.trim();
        if query.chars().count() < SEARCH_MIN_QUERY_LENGTH {
            return Ok(Vec::new());
        }
        let mut connection = self.acquire().await?;
        self.officials_dao.search_authorities(&mut connection, query, SEARCH_RESULT_CAP).await
    }

    /**
     * Retrieves all parties ordered by acronym.
     *
     * # Returns
     * A Result containing the parties or an `ApplicationError`.
     */
    pub async fn get_party_list(&self) -> Result<Vec<PartyType>, ApplicationError> {
        let mut connection = self.acquire().await?;
        self.officials_dao.get_party_list(&mut connection).await
    }

    /**
     * Acquires a connection from the pool.
     */
    async fn acquire(&self) -> Result<sqlx::pool::PoolConnection<Postgres>, ApplicationError> {
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        connection_pool.acquire().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire connection: {err}")))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_search_below_minimum_length_returns_empty() {
        let service = OfficialsService::new(OfficialsDao::new(), MunicipalityDao::new(), None);
        assert!(service.search_authorities("a").await.unwrap().is_empty());
        assert!(service.search_authorities("  a  ").await.unwrap().is_empty());
        assert!(service.search_authorities("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_at_minimum_length_requires_database() {
        let service = OfficialsService::new(OfficialsDao::new(), MunicipalityDao::new(), None);
        let error = service.search_authorities("jo").await.unwrap_err();
        assert_eq!(error.error_type, ErrorType::DatabaseError);
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use crate::model::models::MunicipalityAttributes;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_authorities_unknown_code_differs_from_empty_partitions() {
        let pool = init_db().await;
        let municipality_dao = MunicipalityDao::new();
        let mut connection = pool.acquire().await.unwrap();
        let municipality_id =
            municipality_dao.add_municipality(&mut connection, &MunicipalityAttributes { ibge_code: 4198902, name: "Porto Rico".to_string(), territory_id: None }).await.unwrap();
        drop(connection);

        let service = OfficialsService::new(OfficialsDao::new(), MunicipalityDao::new(), Some(pool.clone()));
        let error = service.get_authorities(9999999, 2024).await.unwrap_err();
        assert_eq!(error.error_type, ErrorType::NotFound);

        let authorities = service.get_authorities(4198902, 2024).await.unwrap();
        assert!(authorities.mayor.is_none());
        assert!(authorities.vice_mayor.is_none());
        assert!(authorities.council_members.is_empty());

        sqlx::query("DELETE FROM municipality WHERE id = $1").bind(municipality_id).execute(&pool).await.unwrap(); // Remove committed test data
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
