use sqlx::PgConnection;
use tracing::{Instrument, instrument};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{MunicipalityAttributes, MunicipalityEnrichedType, MunicipalityMetaAttributes, MunicipalityType, StatSnapshotType, TerritoryType},
};

/**
 * Database response type for querying a municipality with its territory.
 */
pub type QueryMunicipalityDbResp = (i64, i64, String, String, Option<f64>, Option<f64>, Option<String>, Option<String>, Option<i64>, Option<String>);

/**
 * Database response type for the enriched municipality list: the municipality
 * columns followed by the most recent population and electorate.
 */
pub type QueryMunicipalityEnrichedDbResp = (i64, i64, String, String, Option<f64>, Option<f64>, Option<String>, Option<String>, Option<i64>, Option<String>, Option<i64>, Option<i64>);

/**
 * Database response type for a statistics row per (municipality, year).
 */
pub type QueryStatsRowDbResp = (i64, Option<i64>, Option<i64>);

/**
 * SQL query to retrieve a municipality by its IBGE code. Lookup is an exact
 * numeric match.
 */
const QUERY_MUNICIPALITY_BY_CODE: &str = "SELECT m.id, m.ibge_code, m.name, m.state, m.latitude, m.longitude, m.crest_url, m.tier, m.territory_id, t.name \
     FROM municipality m LEFT JOIN territory t ON m.territory_id = t.id WHERE m.ibge_code = $1";

/**
 * SQL query to retrieve a municipality by its internal id.
 */
const QUERY_MUNICIPALITY_BY_ID: &str = "SELECT m.id, m.ibge_code, m.name, m.state, m.latitude, m.longitude, m.crest_url, m.tier, m.territory_id, t.name \
     FROM municipality m LEFT JOIN territory t ON m.territory_id = t.id WHERE m.id = $1";

/**
 * SQL query for the enriched municipality list. The two subselects pick the
 * most recent year that actually carries the respective statistic.
 */
const QUERY_MUNICIPALITY_LIST_ENRICHED: &str = "SELECT m.id, m.ibge_code, m.name, m.state, m.latitude, m.longitude, m.crest_url, m.tier, m.territory_id, t.name, \
     (SELECT s.population FROM municipality_stats s WHERE s.municipality_id = m.id AND s.population IS NOT NULL ORDER BY s.reference_year DESC LIMIT 1), \
     (SELECT s.electorate FROM municipality_stats s WHERE s.municipality_id = m.id AND s.electorate IS NOT NULL ORDER BY s.reference_year DESC LIMIT 1) \
     FROM municipality m LEFT JOIN territory t ON m.territory_id = t.id \
     WHERE ($1::bigint IS NULL OR m.territory_id = $1) \
     ORDER BY m.name \
     LIMIT $2";

/**
 * SQL query to add a new municipality.
 */
const ADD_MUNICIPALITY: &str = "INSERT INTO municipality (ibge_code, name, territory_id, inserted_at, updated_at) VALUES ($1, $2, $3, now(), now()) RETURNING id";

/**
 * SQL query to update the name and territory of a municipality. The IBGE code
 * is immutable once assigned.
 */
const UPDATE_MUNICIPALITY: &str = "UPDATE municipality SET name = $1, territory_id = COALESCE($2, territory_id), updated_at = now() WHERE id = $3";

/**
 * SQL query applying optional enrichment fields. Nulls never overwrite
 * previously populated values.
 */
const UPDATE_MUNICIPALITY_META: &str = "UPDATE municipality SET state = COALESCE($1, state), latitude = COALESCE($2, latitude), longitude = COALESCE($3, longitude), \
     crest_url = COALESCE($4, crest_url), tier = COALESCE($5, tier), updated_at = now() WHERE id = $6";

/**
 * SQL query to retrieve a territory id by its unique name.
 */
const QUERY_TERRITORY_BY_NAME: &str = "SELECT id FROM territory WHERE name = $1";

/**
 * SQL query to add a new territory.
 */
const ADD_TERRITORY: &str = "INSERT INTO territory (name, inserted_at) VALUES ($1, now()) RETURNING id";

/**
 * SQL query listing territories with their member municipalities.
 */
const QUERY_TERRITORY_MEMBERS: &str = "SELECT t.id, t.name, m.id, m.ibge_code, m.name, m.state, m.latitude, m.longitude, m.crest_url, m.tier, m.territory_id \
     FROM territory t LEFT JOIN municipality m ON m.territory_id = t.id \
     ORDER BY t.name, m.name";

/**
 * SQL queries for the most recent snapshot of each statistic kind.
 */
const QUERY_LATEST_POPULATION: &str = "SELECT reference_year, population FROM municipality_stats WHERE municipality_id = $1 AND population IS NOT NULL ORDER BY reference_year DESC LIMIT 1";
const QUERY_LATEST_ELECTORATE: &str = "SELECT reference_year, electorate FROM municipality_stats WHERE municipality_id = $1 AND electorate IS NOT NULL ORDER BY reference_year DESC LIMIT 1";
const QUERY_LATEST_COUNCIL_SEATS: &str = "SELECT reference_year, seats FROM council_seats WHERE municipality_id = $1 ORDER BY reference_year DESC LIMIT 1";

/**
 * SQL queries for the per (municipality, year) statistics row.
 */
const QUERY_STATS_ROW: &str = "SELECT id, population, electorate FROM municipality_stats WHERE municipality_id = $1 AND reference_year = $2";
const ADD_STATS_ROW: &str = "INSERT INTO municipality_stats (municipality_id, reference_year, population, electorate, inserted_at, updated_at) VALUES ($1, $2, $3, $4, now(), now())";
const UPDATE_STATS_ROW: &str = "UPDATE municipality_stats SET population = $1, electorate = $2, updated_at = now() WHERE id = $3";

/**
 * SQL queries for the per (municipality, year) council seats row.
 */
const QUERY_COUNCIL_SEATS_ROW: &str = "SELECT id FROM council_seats WHERE municipality_id = $1 AND reference_year = $2";
const ADD_COUNCIL_SEATS_ROW: &str = "INSERT INTO council_seats (municipality_id, reference_year, seats, inserted_at, updated_at) VALUES ($1, $2, $3, now(), now())";
const UPDATE_COUNCIL_SEATS_ROW: &str = "UPDATE council_seats SET seats = $1, updated_at = now() WHERE id = $2";

impl From<QueryMunicipalityDbResp> for MunicipalityType {
    fn from(row: QueryMunicipalityDbResp) -> Self {
        MunicipalityType { id: row.0, ibge_code: row.1, name: row.2, state: row.3, latitude: row.4, longitude: row.5, crest_url: row.6, tier: row.7, territory_id: row.8, territory_name: row.9 }
    }
}

impl From<QueryMunicipalityEnrichedDbResp> for MunicipalityEnrichedType {
    fn from(row: QueryMunicipalityEnrichedDbResp) -> Self {
        MunicipalityEnrichedType {
            municipality: MunicipalityType { id: row.0, ibge_code: row.1, name: row.2, state: row.3, latitude: row.4, longitude: row.5, crest_url: row.6, tier: row.7, territory_id: row.8, territory_name: row.9 },
            population: row.10,
            electorate: row.11,
        }
    }
}

/**
 * DAO for municipality, territory and statistics database operations.
 */
pub struct MunicipalityDao {}

impl MunicipalityDao {
    /**
     * Creates a new instance of `MunicipalityDao`.
     */
    pub fn new() -> Self {
        MunicipalityDao {}
    }

    /**
     * Retrieves a municipality by its IBGE code.
     *
     * # Arguments
     * `connection`: The database connection.
     * `ibge_code`: The national statistical code.
     *
     * # Returns
     * A Result containing the municipality if present, or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn find_by_code(&self, connection: &mut PgConnection, ibge_code: i64) -> Result<Option<MunicipalityType>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryMunicipalityDbResp> = sqlx::query_as(QUERY_MUNICIPALITY_BY_CODE)
            .bind(ibge_code)
            .fetch_optional(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to query municipality by code: {err}")))?;
        Ok(result.map(MunicipalityType::from))
    }

    /**
     * Retrieves a municipality by its internal id.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn find_by_id(&self, connection: &mut PgConnection, id: i64) -> Result<Option<MunicipalityType>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryMunicipalityDbResp> = sqlx::query_as(QUERY_MUNICIPALITY_BY_ID)
            .bind(id)
            .fetch_optional(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to query municipality by id: {err}")))?;
        Ok(result.map(MunicipalityType::from))
    }

    /**
     * Retrieves the municipality list ordered by name, optionally filtered by
     * territory and capped, enriched with the most recent population and
     * electorate values.
     *
     * # Arguments
     * `connection`: The database connection.
     * `territory_id`: Optional territory filter.
     * `limit`: Optional cap on the number of rows.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn list_enriched(&self, connection: &mut PgConnection, territory_id: Option<i64>, limit: Option<i64>) -> Result<Vec<MunicipalityEnrichedType>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryMunicipalityEnrichedDbResp> = sqlx::query_as(QUERY_MUNICIPALITY_LIST_ENRICHED)
            .bind(territory_id)
            .bind(limit)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to query enriched municipality list: {err}")))?;
        Ok(results.into_iter().map(MunicipalityEnrichedType::from).collect())
    }

    /**
     * Adds a new municipality.
     *
     * # Returns
     * A Result containing the generated id or an `ApplicationError`.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn add_municipality(&self, transaction: &mut PgConnection, attributes: &MunicipalityAttributes) -> Result<i64, ApplicationError> {
        let span = tracing::Span::current();
        let row: (i64,) = sqlx::query_as(ADD_MUNICIPALITY)
            .bind(attributes.ibge_code)
            .bind(&attributes.name)
            .bind(attributes.territory_id)
            .fetch_one(transaction)
            .instrument(span)
            .await
            .map_err(|err| super::handle_database_error(err.as_database_error()))?;
        Ok(row.0)
    }

    /**
     * Updates the name and territory link of an existing municipality.
     * A `None` territory leaves the stored value untouched.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn update_municipality(&self, transaction: &mut PgConnection, id: i64, name: &str, territory_id: Option<i64>) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(UPDATE_MUNICIPALITY)
            .bind(name)
            .bind(territory_id)
            .bind(id)
            .execute(transaction)
            .instrument(span)
            .await
            .map_err(|err| super::handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            tracing::debug!("Municipality with id {} not found for update", id);
            return Err(ApplicationError::new(ErrorType::NotFound, "Municipality not found".to_string()));
        }
        Ok(())
    }

    /**
     * Applies optional enrichment attributes to an existing municipality.
     * Absent fields never overwrite populated columns.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn update_meta(&self, transaction: &mut PgConnection, id: i64, meta: &MunicipalityMetaAttributes) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(UPDATE_MUNICIPALITY_META)
            .bind(&meta.state)
            .bind(meta.latitude)
            .bind(meta.longitude)
            .bind(&meta.crest_url)
            .bind(meta.tier.map(|tier| tier.as_str()))
            .bind(id)
            .execute(transaction)
            .instrument(span)
            .await
            .map_err(|err| super::handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            tracing::debug!("Municipality with id {} not found for meta update", id);
            return Err(ApplicationError::new(ErrorType::NotFound, "Municipality not found".to_string()));
        }
        Ok(())
    }

    /**
     * Retrieves a territory id by its unique name.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn find_territory_by_name(&self, connection: &mut PgConnection, name: &str) -> Result<Option<i64>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<(i64,)> = sqlx::query_as(QUERY_TERRITORY_BY_NAME)
            .bind(name)
            .fetch_optional(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to query territory by name: {err}")))?;
        Ok(result.map(|row| row.0))
    }

    /**
     * Adds a new territory and returns its generated id.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn add_territory(&self, transaction: &mut PgConnection, name: &str) -> Result<i64, ApplicationError> {
        let span = tracing::Span::current();
        let row: (i64,) = sqlx::query_as(ADD_TERRITORY)
            .bind(name)
            .fetch_one(transaction)
            .instrument(span)
            .await
            .map_err(|err| super::handle_database_error(err.as_database_error()))?;
        Ok(row.0)
    }

    /**
     * Retrieves all territories with their member municipalities, both
     * ordered by name.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn list_territories(&self, connection: &mut PgConnection) -> Result<Vec<TerritoryType>, ApplicationError> {
        let span = tracing::Span::current();
        type Row = (i64, String, Option<i64>, Option<i64>, Option<String>, Option<String>, Option<f64>, Option<f64>, Option<String>, Option<String>, Option<i64>);
        let rows: Vec<Row> = sqlx::query_as(QUERY_TERRITORY_MEMBERS)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to query territory list: {err}")))?;
        let mut territories: Vec<TerritoryType> = Vec::new();
        for row in rows {
            if territories.last().map(|territory: &TerritoryType| territory.id) != Some(row.0) {
                territories.push(TerritoryType { id: row.0, name: row.1.clone(), municipalities: Vec::new() });
            }
            // The left join yields a null municipality id for empty territories.
            if let (Some(id), Some(ibge_code), Some(name), Some(state)) = (row.2, row.3, row.4.clone(), row.5.clone()) {
                if let Some(territory) = territories.last_mut() {
                    territory.municipalities.push(MunicipalityType {
                        id,
                        ibge_code,
                        name,
                        state,
                        latitude: row.6,
                        longitude: row.7,
                        crest_url: row.8,
                        tier: row.9,
                        territory_id: row.10,
                        territory_name: Some(row.1.clone()),
                    });
                }
            }
        }
        Ok(territories)
    }

    /**
     * Retrieves the most recent population snapshot for a municipality, i.e.
     * the greatest reference year whose row actually has a population value.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn latest_population(&self, connection: &mut PgConnection, municipality_id: i64) -> Result<Option<StatSnapshotType>, ApplicationError> {
        Self::latest_snapshot(connection, QUERY_LATEST_POPULATION, municipality_id).await
    }

    /**
     * Retrieves the most recent electorate snapshot for a municipality.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn latest_electorate(&self, connection: &mut PgConnection, municipality_id: i64) -> Result<Option<StatSnapshotType>, ApplicationError> {
        Self::latest_snapshot(connection, QUERY_LATEST_ELECTORATE, municipality_id).await
    }

    /**
     * Retrieves the most recent configured council seats for a municipality.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn latest_council_seats(&self, connection: &mut PgConnection, municipality_id: i64) -> Result<Option<StatSnapshotType>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<(i32, i32)> = sqlx::query_as(QUERY_LATEST_COUNCIL_SEATS)
            .bind(municipality_id)
            .fetch_optional(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to query latest council seats: {err}")))?;
        Ok(result.map(|row| StatSnapshotType { reference_year: row.0, value: i64::from(row.1) }))
    }

    async fn latest_snapshot(connection: &mut PgConnection, query: &str, municipality_id: i64) -> Result<Option<StatSnapshotType>, ApplicationError> {
        let result: Option<(i32, i64)> = sqlx::query_as(query)
            .bind(municipality_id)
            .fetch_optional(connection)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to query latest statistic snapshot: {err}")))?;
        Ok(result.map(|row| StatSnapshotType { reference_year: row.0, value: row.1 }))
    }

    /**
     * Retrieves the statistics row for (municipality, year) if present.
     *
     * # Returns
     * The row id with its population and electorate values.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn find_stats_row(&self, connection: &mut PgConnection, municipality_id: i64, reference_year: i32) -> Result<Option<QueryStatsRowDbResp>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryStatsRowDbResp> = sqlx::query_as(QUERY_STATS_ROW)
            .bind(municipality_id)
            .bind(reference_year)
            .fetch_optional(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to query statistics row: {err}")))?;
        Ok(result)
    }

    /**
     * Adds a new statistics row for (municipality, year).
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn add_stats_row(&self, transaction: &mut PgConnection, attributes: &crate::model::models::StatsAttributes) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        sqlx::query(ADD_STATS_ROW)
            .bind(attributes.municipality_id)
            .bind(attributes.reference_year)
            .bind(attributes.population)
            .bind(attributes.electorate)
            .execute(transaction)
            .instrument(span)
            .await
            .map_err(|err| super::handle_database_error(err.as_database_error()))?;
        Ok(())
    }

    /**
     * Replaces the population and electorate of an existing statistics row.
     * Callers are expected to have merged incoming values over the stored
     * ones beforehand.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn update_stats_row(&self, transaction: &mut PgConnection, row_id: i64, population: Option<i64>, electorate: Option<i64>) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(UPDATE_STATS_ROW)
            .bind(population)
            .bind(electorate)
            .bind(row_id)
            .execute(transaction)
            .instrument(span)
            .await
            .map_err(|err| super::handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            tracing::debug!("Statistics row with id {} not found for update", row_id);
            return Err(ApplicationError::new(ErrorType::NotFound, "Statistics row not found".to_string()));
        }
        Ok(())
    }

    /**
     * Retrieves the council seats row id for (municipality, year) if present.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn find_council_seats_row(&self, connection: &mut PgConnection, municipality_id: i64, reference_year: i32) -> Result<Option<i64>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<(i64,)> = sqlx::query_as(QUERY_COUNCIL_SEATS_ROW)
            .bind(municipality_id)
            .bind(reference_year)
            .fetch_optional(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to query council seats row: {err}")))?;
        Ok(result.map(|row| row.0))
    }

    /**
     * Adds a new council seats row.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn add_council_seats_row(&self, transaction: &mut PgConnection, attributes: &crate::model::models::CouncilSeatsAttributes) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        sqlx::query(ADD_COUNCIL_SEATS_ROW)
            .bind(attributes.municipality_id)
            .bind(attributes.reference_year)
            .bind(attributes.seats)
            .execute(transaction)
            .instrument(span)
            .await
            .map_err(|err| super::handle_database_error(err.as_database_error()))?;
        Ok(())
    }

    /**
     * Updates the configured seats of an existing council seats row.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn update_council_seats_row(&self, transaction: &mut PgConnection, row_id: i64, seats: i32) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(UPDATE_COUNCIL_SEATS_ROW)
            .bind(seats)
            .bind(row_id)
            .execute(transaction)
            .instrument(span)
            .await
            .map_err(|err| super::handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            tracing::debug!("Council seats row with id {} not found for update", row_id);
            return Err(ApplicationError::new(ErrorType::NotFound, "Council seats row not found".to_string()));
        }
        Ok(())
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use crate::model::models::{CouncilSeatsAttributes, StatsAttributes};
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_add_then_find_municipality_by_code() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let dao = MunicipalityDao::new();
        let attributes = MunicipalityAttributes { ibge_code: 4104808, name: "Cascavel".to_string(), territory_id: None };
        let id = dao.add_municipality(&mut transaction, &attributes).await.unwrap();
        let found = dao.find_by_code(&mut transaction, 4104808).await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.name, "Cascavel");
        assert!(found.territory_name.is_none());
        transaction.rollback().await.unwrap(); // Rollback the transaction to avoid leaving test data in the database
    }

    #[sqlx::test]
    async fn test_find_by_code_absent_is_none() {
        let pool = init_db().await;
        let mut connection = pool.acquire().await.unwrap();
        let dao = MunicipalityDao::new();
        let found = dao.find_by_code(&mut connection, 9999999).await.unwrap();
        assert!(found.is_none());
    }

    #[sqlx::test]
    async fn test_stats_row_lifecycle() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let dao = MunicipalityDao::new();
        let municipality_id =
            dao.add_municipality(&mut transaction, &MunicipalityAttributes { ibge_code: 4106902, name: "Curitiba".to_string(), territory_id: None }).await.unwrap();
        let attributes = StatsAttributes { municipality_id, reference_year: 2024, population: None, electorate: Some(50000) };
        dao.add_stats_row(&mut transaction, &attributes).await.unwrap();
        let (row_id, population, electorate) = dao.find_stats_row(&mut transaction, municipality_id, 2024).await.unwrap().unwrap();
        assert_eq!(population, None);
        assert_eq!(electorate, Some(50000));
        dao.update_stats_row(&mut transaction, row_id, Some(100000), Some(50500)).await.unwrap();
        let latest = dao.latest_electorate(&mut transaction, municipality_id).await.unwrap().unwrap();
        assert_eq!(latest, StatSnapshotType { reference_year: 2024, value: 50500 });
        transaction.rollback().await.unwrap(); // Rollback the transaction to avoid leaving test data in the database
    }

    #[sqlx::test]
    async fn test_council_seats_row_lifecycle() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let dao = MunicipalityDao::new();
        let municipality_id =
            dao.add_municipality(&mut transaction, &MunicipalityAttributes { ibge_code: 4101408, name: "Apucarana".to_string(), territory_id: None }).await.unwrap();
        dao.add_council_seats_row(&mut transaction, &CouncilSeatsAttributes { municipality_id, reference_year: 2025, seats: 15 }).await.unwrap();
        let row_id = dao.find_council_seats_row(&mut transaction, municipality_id, 2025).await.unwrap().unwrap();
        dao.update_council_seats_row(&mut transaction, row_id, 17).await.unwrap();
        let latest = dao.latest_council_seats(&mut transaction, municipality_id).await.unwrap().unwrap();
        assert_eq!(latest.value, 17);
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
