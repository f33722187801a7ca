use std::str::FromStr;

use sqlx::PgConnection;
use tracing::{Instrument, instrument};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{AuthorityMatchType, AuthorityType, MandateAttributes, Office, PartyAttributes, PartySnapshotType, PartyType},
};

/**
 * Database response type for querying a party.
 */
pub type QueryPartyDbResp = (i64, String, String, Option<i32>, Option<String>);

/**
 * Database response type for a mandate joined with its person and party.
 */
pub type QueryAuthorityDbResp = (i64, String, Option<i32>, Option<String>, String, Option<String>, Option<String>, Option<String>, Option<String>);

/**
 * Database response type for a name-search hit: the authority columns
 * followed by the municipality.
 */
pub type QueryAuthorityMatchDbResp = (i64, String, Option<i32>, Option<String>, String, Option<String>, Option<String>, Option<String>, Option<String>, i64, String, i64);

/**
 * SQL query to retrieve a party by its unique acronym.
 */
const QUERY_PARTY_BY_SIGLA: &str = "SELECT id, sigla, name, tse_number, color_hex FROM party WHERE sigla = $1";

/**
 * SQL query to retrieve all parties ordered by acronym.
 */
const QUERY_PARTY_LIST: &str = "SELECT id, sigla, name, tse_number, color_hex FROM party ORDER BY sigla";

/**
 * SQL query to add a new party.
 */
const ADD_PARTY: &str = "INSERT INTO party (sigla, name, tse_number, color_hex, inserted_at, updated_at) VALUES ($1, $2, $3, $4, now(), now()) RETURNING id";

/**
 * SQL query replacing the attributes of an existing party. Party imports are
 * authoritative for the fields they carry.
 */
const UPDATE_PARTY: &str = "UPDATE party SET name = $1, tse_number = $2, color_hex = $3, updated_at = now() WHERE id = $4";

/**
 * SQL query to retrieve people by exact full-name match, oldest first.
 */
const QUERY_PEOPLE_BY_NAME: &str = "SELECT id, photo_url FROM person WHERE full_name = $1 ORDER BY id";

/**
 * SQL query to add a new person.
 */
const ADD_PERSON: &str = "INSERT INTO person (full_name, photo_url, inserted_at, updated_at) VALUES ($1, $2, now(), now()) RETURNING id";

/**
 * SQL query to set a person's photo only when none is stored yet.
 */
const UPDATE_PERSON_PHOTO_IF_MISSING: &str = "UPDATE person SET photo_url = $1, updated_at = now() WHERE id = $2 AND photo_url IS NULL";

/**
 * SQL query to retrieve a mandate id by its natural key.
 */
const QUERY_MANDATE_BY_KEY: &str = "SELECT id FROM mandate WHERE municipality_id = $1 AND office = $2 AND person_id = $3 AND election_year = $4";

/**
 * SQL query to add a new mandate.
 */
const ADD_MANDATE: &str = "INSERT INTO mandate (municipality_id, person_id, party_id, office, election_year, start_year, end_year, seat_number, legislature, inserted_at, updated_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now(), now()) RETURNING id";

/**
 * SQL query updating the mutable attributes of an existing mandate. The
 * party affiliation is authoritative per import run.
 */
const UPDATE_MANDATE: &str = "UPDATE mandate SET party_id = $1, start_year = $2, end_year = $3, seat_number = $4, legislature = $5, updated_at = now() WHERE id = $6";

/**
 * SQL query for the authorities of one municipality and election cycle.
 * Council members come out ordered seat-number first, nulls last, person name
 * as the stable tiebreak.
 */
const QUERY_AUTHORITIES: &str = "SELECT md.id, md.office, md.seat_number, md.legislature, p.full_name, p.photo_url, pa.sigla, pa.name, pa.color_hex \
     FROM mandate md JOIN person p ON md.person_id = p.id LEFT JOIN party pa ON md.party_id = pa.id \
     WHERE md.municipality_id = $1 AND md.election_year = $2 \
     ORDER BY md.seat_number ASC NULLS LAST, p.full_name ASC";

/**
 * SQL query for the case-insensitive name search across all mandates.
 */
const QUERY_SEARCH_AUTHORITIES: &str = "SELECT md.id, md.office, md.seat_number, md.legislature, p.full_name, p.photo_url, pa.sigla, pa.name, pa.color_hex, m.id, m.name, m.ibge_code \
     FROM mandate md JOIN person p ON md.person_id = p.id LEFT JOIN party pa ON md.party_id = pa.id JOIN municipality m ON md.municipality_id = m.id \
     WHERE p.full_name ILIKE '%' || $1 || '%' \
     ORDER BY p.full_name ASC \
     LIMIT $2";

impl From<QueryPartyDbResp> for PartyType {
    fn from(row: QueryPartyDbResp) -> Self {
        PartyType { id: row.0, sigla: row.1, name: row.2, tse_number: row.3, color_hex: row.4 }
    }
}

impl TryFrom<QueryAuthorityDbResp> for AuthorityType {
    type Error = ApplicationError;

    fn try_from(row: QueryAuthorityDbResp) -> Result<Self, Self::Error> {
        let party = match (row.6, row.7) {
            (Some(sigla), Some(name)) => Some(PartySnapshotType { sigla, name, color_hex: row.8 }),
            _ => None,
        };
        Ok(AuthorityType { mandate_id: row.0, office: Office::from_str(&row.1)?, seat_number: row.2, legislature: row.3, full_name: row.4, photo_url: row.5, party })
    }
}

/**
 * DAO for party, person and mandate database operations.
 */
pub struct OfficialsDao {}

impl OfficialsDao {
    /**
     * Creates a new instance of `OfficialsDao`.
     */
    pub fn new() -> Self {
        OfficialsDao {}
    }

    /**
     * Retrieves a party by its acronym.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn find_party_by_sigla(&self, connection: &mut PgConnection, sigla: &str) -> Result<Option<PartyType>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryPartyDbResp> = sqlx::query_as(QUERY_PARTY_BY_SIGLA)
            .bind(sigla)
            .fetch_optional(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to query party by acronym: {err}")))?;
        Ok(result.map(PartyType::from))
    }

    /**
     * Retrieves all parties ordered by acronym.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_party_list(&self, connection: &mut PgConnection) -> Result<Vec<PartyType>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryPartyDbResp> = sqlx::query_as(QUERY_PARTY_LIST)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to query party list: {err}")))?;
        Ok(results.into_iter().map(PartyType::from).collect())
    }

    /**
     * Adds a new party and returns its generated id.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn add_party(&self, transaction: &mut PgConnection, attributes: &PartyAttributes) -> Result<i64, ApplicationError> {
        let span = tracing::Span::current();
        let row: (i64,) = sqlx::query_as(ADD_PARTY)
            .bind(&attributes.sigla)
            .bind(&attributes.name)
            .bind(attributes.tse_number)
            .bind(&attributes.color_hex)
            .fetch_one(transaction)
            .instrument(span)
            .await
            .map_err(|err| super::handle_database_error(err.as_database_error()))?;
        Ok(row.0)
    }

    /**
     * Replaces the attributes of an existing party.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn update_party(&self, transaction: &mut PgConnection, id: i64, attributes: &PartyAttributes) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(UPDATE_PARTY)
            .bind(&attributes.name)
            .bind(attributes.tse_number)
            .bind(&attributes.color_hex)
            .bind(id)
            .execute(transaction)
            .instrument(span)
            .await
            .map_err(|err| super::handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            tracing::debug!("Party with id {} not found for update", id);
            return Err(ApplicationError::new(ErrorType::NotFound, "Party not found".to_string()));
        }
        Ok(())
    }

    /**
     * Retrieves all people with the given exact full name, oldest first.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn find_people_by_name(&self, connection: &mut PgConnection, full_name: &str) -> Result<Vec<(i64, Option<String>)>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<(i64, Option<String>)> = sqlx::query_as(QUERY_PEOPLE_BY_NAME)
            .bind(full_name)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to query people by name: {err}")))?;
        Ok(results)
    }

    /**
     * Adds a new person and returns its generated id.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn add_person(&self, transaction: &mut PgConnection, full_name: &str, photo_url: Option<&str>) -> Result<i64, ApplicationError> {
        let span = tracing::Span::current();
        let row: (i64,) = sqlx::query_as(ADD_PERSON)
            .bind(full_name)
            .bind(photo_url)
            .fetch_one(transaction)
            .instrument(span)
            .await
            .map_err(|err| super::handle_database_error(err.as_database_error()))?;
        Ok(row.0)
    }

    /**
     * Sets a person's photo when none is stored yet. A stored photo is never
     * overwritten by a later import.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn set_person_photo_if_missing(&self, transaction: &mut PgConnection, person_id: i64, photo_url: &str) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        sqlx::query(UPDATE_PERSON_PHOTO_IF_MISSING)
            .bind(photo_url)
            .bind(person_id)
            .execute(transaction)
            .instrument(span)
            .await
            .map_err(|err| super::handle_database_error(err.as_database_error()))?;
        Ok(())
    }

    /**
     * Retrieves a mandate id by its natural key
     * (municipality, office, person, election year).
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn find_mandate(&self, connection: &mut PgConnection, municipality_id: i64, office: Office, person_id: i64, election_year: i32) -> Result<Option<i64>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<(i64,)> = sqlx::query_as(QUERY_MANDATE_BY_KEY)
            .bind(municipality_id)
            .bind(office.as_str())
            .bind(person_id)
            .bind(election_year)
            .fetch_optional(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to query mandate by key: {err}")))?;
        Ok(result.map(|row| row.0))
    }

    /**
     * Adds a new mandate and returns its generated id.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn add_mandate(&self, transaction: &mut PgConnection, attributes: &MandateAttributes) -> Result<i64, ApplicationError> {
        let span = tracing::Span::current();
        let row: (i64,) = sqlx::query_as(ADD_MANDATE)
            .bind(attributes.municipality_id)
            .bind(attributes.person_id)
            .bind(attributes.party_id)
            .bind(attributes.office.as_str())
            .bind(attributes.election_year)
            .bind(attributes.start_year)
            .bind(attributes.end_year)
            .bind(attributes.seat_number)
            .bind(&attributes.legislature)
            .fetch_one(transaction)
            .instrument(span)
            .await
            .map_err(|err| super::handle_database_error(err.as_database_error()))?;
        Ok(row.0)
    }

    /**
     * Updates the mutable attributes of an existing mandate.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn update_mandate(&self, transaction: &mut PgConnection, mandate_id: i64, attributes: &MandateAttributes) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(UPDATE_MANDATE)
            .bind(attributes.party_id)
            .bind(attributes.start_year)
            .bind(attributes.end_year)
            .bind(attributes.seat_number)
            .bind(&attributes.legislature)
            .bind(mandate_id)
            .execute(transaction)
            .instrument(span)
            .await
            .map_err(|err| super::handle_database_error(err.as_database_error()))?;
        if result.rows_affected() == 0 {
            tracing::debug!("Mandate with id {} not found for update", mandate_id);
            return Err(ApplicationError::new(ErrorType::NotFound, "Mandate not found".to_string()));
        }
        Ok(())
    }

    /**
     * Retrieves the authorities of one municipality and election cycle.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_authorities(&self, connection: &mut PgConnection, municipality_id: i64, election_year: i32) -> Result<Vec<AuthorityType>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryAuthorityDbResp> = sqlx::query_as(QUERY_AUTHORITIES)
            .bind(municipality_id)
            .bind(election_year)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to query authorities: {err}")))?;
        results.into_iter().map(AuthorityType::try_from).collect()
    }

    /**
     * Case-insensitive substring search on person full name across all
     * mandates, ordered by name and capped.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn search_authorities(&self, connection: &mut PgConnection, query: &str, limit: i64) -> Result<Vec<AuthorityMatchType>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryAuthorityMatchDbResp> = sqlx::query_as(QUERY_SEARCH_AUTHORITIES)
            .bind(super::escape_like_fragment(query))
            .bind(limit)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to search authorities: {err}")))?;
        results
            .into_iter()
            .map(|row| {
                let authority = AuthorityType::try_from((row.0, row.1, row.2, row.3, row.4, row.5, row.6, row.7, row.8))?;
                Ok(AuthorityMatchType { authority, municipality_id: row.9, municipality_name: row.10, ibge_code: row.11 })
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_authority_try_from_maps_office_and_party() {
        let row: QueryAuthorityDbResp =
            (7, "MAYOR".to_string(), None, Some("2025-2028".to_string()), "JOÃO DA SILVA".to_string(), None, Some("PT".to_string()), Some("Partido dos Trabalhadores".to_string()), Some("#cc0000".to_string()));
        let authority = AuthorityType::try_from(row).unwrap();
        assert_eq!(authority.office, Office::Mayor);
        let party = authority.party.unwrap();
        assert_eq!(party.sigla, "PT");
        assert_eq!(party.color_hex.as_deref(), Some("#cc0000"));
    }

    #[test]
    fn test_authority_try_from_without_party() {
        let row: QueryAuthorityDbResp = (8, "COUNCIL_MEMBER".to_string(), Some(3), None, "MARIA SOUZA".to_string(), None, None, None, None);
        let authority = AuthorityType::try_from(row).unwrap();
        assert!(authority.party.is_none());
        assert_eq!(authority.seat_number, Some(3));
    }

    #[test]
    fn test_authority_try_from_rejects_unknown_office() {
        let row: QueryAuthorityDbResp = (9, "SENATOR".to_string(), None, None, "X".to_string(), None, None, None, None);
        assert!(AuthorityType::try_from(row).is_err());
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
    async fn test_party_upsert_cycle() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let dao = OfficialsDao::new();
        let attributes = PartyAttributes { sigla: "PT".to_string(), name: "Partido dos Trabalhadores".to_string(), tse_number: Some(13), color_hex: None };
        let id = dao.add_party(&mut transaction, &attributes).await.unwrap();
        let updated = PartyAttributes { color_hex: Some("#cc0000".to_string()), ..attributes };
        dao.update_party(&mut transaction, id, &updated).await.unwrap();
        let found = dao.find_party_by_sigla(&mut transaction, "PT").await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.color_hex.as_deref(), Some("#cc0000"));
        transaction.rollback().await.unwrap(); // Rollback the transaction to avoid leaving test data in the database
    }

    #[sqlx::test]
    async fn test_mandate_natural_key_lookup() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let officials_dao = OfficialsDao::new();
        let municipality_dao = MunicipalityDao::new();
        let municipality_id =
            municipality_dao.add_municipality(&mut transaction, &MunicipalityAttributes { ibge_code: 4104808, name: "Cascavel".to_string(), territory_id: None }).await.unwrap();
        let person_id = officials_dao.add_person(&mut transaction, "JOÃO DA SILVA", None).await.unwrap();
        let attributes = MandateAttributes {
            municipality_id,
            person_id,
            party_id: None,
            office: Office::Mayor,
            election_year: 2024,
            start_year: 2025,
            end_year: Some(2028),
            seat_number: None,
            legislature: Some("2025-2028".to_string()),
        };
        let mandate_id = officials_dao.add_mandate(&mut transaction, &attributes).await.unwrap();
        let found = officials_dao.find_mandate(&mut transaction, municipality_id, Office::Mayor, person_id, 2024).await.unwrap();
        assert_eq!(found, Some(mandate_id));
        let absent = officials_dao.find_mandate(&mut transaction, municipality_id, Office::ViceMayor, person_id, 2024).await.unwrap();
        assert!(absent.is_none());
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
