use sqlx::{Pool, Postgres};

use crate::{
    dao::municipality::MunicipalityDao,
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{MunicipalityEnrichedType, MunicipalityType, OverviewType, TerritoryType},
    },
};

/**
 * Represents the service for municipality and territory reads.
 */
pub struct MunicipalityService {
    /**
     * The DAO for municipality operations.
     */
    municipality_dao: MunicipalityDao,
    /**
     * Optional connection pool for database operations. Optional for test purposes until we have a better way to mock the database.
     */
    connection_pool: Option<Pool<Postgres>>,
}

impl MunicipalityService {
    /**
     * Creates a new instance of `MunicipalityService`.
     *
     * # Arguments
     * `municipality_dao`: The DAO for municipality operations.
     * `connection_pool`: Optional connection pool for database operations.
     *
     * # Returns
     * A new instance of `MunicipalityService`.
     */
    pub fn new(municipality_dao: MunicipalityDao, connection_pool: Option<Pool<Postgres>>) -> Self {
        MunicipalityService { municipality_dao, connection_pool }
    }

    /**
     * Retrieves municipalities ordered by name, enriched with territory name
     * and the most recent population and electorate.
     *
     * # Arguments
     * `territory_id`: Optional territory filter.
     * `limit`: Optional cap on the number of rows.
     *
     * # Returns
     * A Result containing the enriched municipalities or an `ApplicationError`.
     */
    pub async fn get_municipality_list(&self, territory_id: Option<i64>, limit: Option<i64>) -> Result<Vec<MunicipalityEnrichedType>, ApplicationError> {
        let mut connection = self.acquire().await?;
        self.municipality_dao.list_enriched(&mut connection, territory_id, limit).await
    }

    /**
     * Retrieves one municipality by its internal id.
     *
     * # Arguments
     * `id`: The internal id of the municipality.
     *
     * # Returns
     * A Result containing the municipality or an `ApplicationError`.
     */
    pub async fn get_municipality(&self, id: i64) -> Result<MunicipalityType, ApplicationError> {
        let mut connection = self.acquire().await?;
        self.municipality_dao
            .find_by_id(&mut connection, id)
            .await?
            .ok_or_else(|| ApplicationError::new(ErrorType::NotFound, format!("Municipality not found for id {id}")))
    }

    /**
     * Retrieves the overview of a municipality by IBGE code: identity plus
     * the most recent population, electorate and council-seat snapshots.
     * An unknown code is not found; a known code with no recorded statistics
     * yields an overview with empty snapshots.
     *
     * # Arguments
     * `ibge_code`: The IBGE code of the municipality.
     *
     * # Returns
     * A Result containing the overview or an `ApplicationError`.
     */
    pub async fn get_overview(&self, ibge_code: i64) -> Result<OverviewType, ApplicationError> {
        let mut connection = self.acquire().await?;
        let municipality = self
            .municipality_dao
            .find_by_code(&mut connection, ibge_code)
            .await?
            .ok_or_else(|| ApplicationError::new(ErrorType::NotFound, format!("Municipality not found for IBGE code {ibge_code}")))?;
        let population = self.municipality_dao.latest_population(&mut connection, municipality.id).await?;
        let electorate = self.municipality_dao.latest_electorate(&mut connection, municipality.id).await?;
        let council_seats = self.municipality_dao.latest_council_seats(&mut connection, municipality.id).await?;
        Ok(OverviewType { id: municipality.id, ibge_code: municipality.ibge_code, name: municipality.name, population, electorate, council_seats })
    }

    /**
     * Retrieves all territories with their member municipalities.
     *
     * # Returns
     * A Result containing the territories or an `ApplicationError`.
     */
    pub async fn get_territories(&self) -> Result<Vec<TerritoryType>, ApplicationError> {
        let mut connection = self.acquire().await?;
        self.municipality_dao.list_territories(&mut connection).await
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

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use crate::model::models::MunicipalityAttributes;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_overview_without_stats_has_empty_snapshots() {
        let pool = init_db().await;
        let municipality_dao = MunicipalityDao::new();
        let mut connection = pool.acquire().await.unwrap();
        let municipality_id =
            municipality_dao.add_municipality(&mut connection, &MunicipalityAttributes { ibge_code: 4198901, name: "Vila Alta".to_string(), territory_id: None }).await.unwrap();
        drop(connection);

        let service = MunicipalityService::new(MunicipalityDao::new(), Some(pool.clone()));
        let overview = service.get_overview(4198901).await.unwrap();
        assert_eq!(overview.id, municipality_id);
        assert!(overview.population.is_none());
        assert!(overview.electorate.is_none());
        assert!(overview.council_seats.is_none());

        sqlx::query("DELETE FROM municipality WHERE id = $1").bind(municipality_id).execute(&pool).await.unwrap(); // Remove committed test data
    }

    #[sqlx::test]
    async fn test_overview_for_unknown_code_is_not_found() {
        let pool = init_db().await;
        let service = MunicipalityService::new(MunicipalityDao::new(), Some(pool));
        let error = service.get_overview(9999999).await.unwrap_err();
        assert_eq!(error.error_type, ErrorType::NotFound);
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
