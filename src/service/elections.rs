use sqlx::{Pool, Postgres};

use crate::{
    dao::{elections::ElectionsDao, municipality::MunicipalityDao},
    model::{
        apperror::{ApplicationError, ErrorType},
        models::ElectionResultType,
    },
};

/**
 * Represents the service for historical election results.
 */
pub struct ElectionsService {
    /**
     * The DAO for election result operations.
     */
    elections_dao: ElectionsDao,
    /**
     * The DAO for municipality lookups.
     */
    municipality_dao: MunicipalityDao,
    /**
     * Optional connection pool for database operations. Optional for test purposes until we have a better way to mock the database.
     */
    connection_pool: Option<Pool<Postgres>>,
}

impl ElectionsService {
    /**
     * Creates a new instance of `ElectionsService`.
     *
     * # Arguments
     * `elections_dao`: The DAO for election result operations.
     * `municipality_dao`: The DAO for municipality lookups.
     * `connection_pool`: Optional connection pool for database operations.
     *
     * # Returns
     * A new instance of `ElectionsService`.
     */
    pub fn new(elections_dao: ElectionsDao, municipality_dao: MunicipalityDao, connection_pool: Option<Pool<Postgres>>) -> Self {
        ElectionsService { elections_dao, municipality_dao, connection_pool }
    }

    /**
     * Retrieves the voting history of a candidate by case-insensitive
     * substring match, optionally scoped to one municipality by IBGE code.
     * Ordered by year ascending, then votes descending.
     *
     * # Arguments
     * `candidate`: The candidate name fragment.
     * `ibge_code`: Optional IBGE code to scope the history to.
     *
     * # Returns
     * A Result containing the election results or an `ApplicationError`.
     */
    pub async fn get_voting_history(&self, candidate: &str, ibge_code: Option<i64>) -> Result<Vec<ElectionResultType>, ApplicationError> {
        let Some(connection_pool) = &self.connection_pool else {
            return Err(ApplicationError::new(ErrorType::DatabaseError, "No database connection available".to_string()));
        };
        let mut connection = connection_pool
            .acquire()
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire connection: {err}")))?;
        let municipality_id = match ibge_code {
            Some(ibge_code) => {
                let municipality = self
                    .municipality_dao
                    .find_by_code(&mut connection, ibge_code)
                    .await?
                    .ok_or_else(|| ApplicationError::new(ErrorType::NotFound, format!("Municipality not found for IBGE code {ibge_code}")))?;
                Some(municipality.id)
            }
            None => None,
        };
        self.elections_dao.get_voting_history(&mut connection, candidate, municipality_id).await
    }
}
