use clap::ValueEnum;
use sqlx::PgConnection;

use crate::dao::{municipality::MunicipalityDao, officials::OfficialsDao};
use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{MunicipalityType, PartyAttributes},
};

/**
 * Result of resolving a person by exact full-name match. Multiple people may
 * legitimately share a name, so ambiguity is an explicit outcome rather than
 * a silent first pick.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonMatch {
    NoMatch,
    Exact(i64),
    Ambiguous(Vec<i64>),
}

/**
 * Policy for ambiguous person-name matches. Overridable per run; the
 * collision is surfaced in the batch report either way.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NameCollisionPolicy {
    /**
     * Continue with the person created first.
     */
    UseOldest,
    /**
     * Skip the row and leave the decision to the operator.
     */
    SkipRow,
}

/**
 * Result of resolving a party acronym.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyResolution {
    pub party_id: i64,
    /**
     * True when a stub was created because the acronym was unknown.
     */
    pub vivified: bool,
}

/**
 * Maps natural keys from source rows to stored entities.
 */
pub struct EntityResolver {
    municipality_dao: MunicipalityDao,
    officials_dao: OfficialsDao,
}

impl EntityResolver {
    /**
     * Creates a new instance of `EntityResolver`.
     */
    pub fn new() -> Self {
        EntityResolver { municipality_dao: MunicipalityDao::new(), officials_dao: OfficialsDao::new() }
    }

    /**
     * Resolves a municipality by exact IBGE code match. Absence is the most
     * common row-level error across imports; the error names the offending
     * code so the batch report can list it.
     */
    pub async fn resolve_municipality(&self, connection: &mut PgConnection, ibge_code: i64) -> Result<MunicipalityType, ApplicationError> {
        self.municipality_dao
            .find_by_code(connection, ibge_code)
            .await?
            .ok_or_else(|| ApplicationError::new(ErrorType::NotFound, format!("Municipality not found for IBGE code {ibge_code}")))
    }

    /**
     * Resolves a party by acronym, creating a stub when unknown. The stub
     * carries the acronym as a placeholder display name until a later
     * authoritative party import corrects it.
     *
     * # Arguments
     * `tse_number`: Optional electoral code carried into a created stub.
     */
    pub async fn resolve_or_vivify_party(&self, connection: &mut PgConnection, sigla: &str, tse_number: Option<i32>) -> Result<PartyResolution, ApplicationError> {
        if let Some(party) = self.officials_dao.find_party_by_sigla(connection, sigla).await? {
            return Ok(PartyResolution { party_id: party.id, vivified: false });
        }
        let stub = PartyAttributes { sigla: sigla.to_string(), name: sigla.to_string(), tse_number, color_hex: None };
        let party_id = self.officials_dao.add_party(connection, &stub).await?;
        Ok(PartyResolution { party_id, vivified: true })
    }

    /**
     * Resolves a person by exact full-name match. Candidates come back
     * oldest-first; the caller decides ambiguous cases via
     * `NameCollisionPolicy`.
     */
    pub async fn resolve_person(&self, connection: &mut PgConnection, full_name: &str) -> Result<PersonMatch, ApplicationError> {
        let candidates = self.officials_dao.find_people_by_name(connection, full_name).await?;
        Ok(match candidates.len() {
            0 => PersonMatch::NoMatch,
            1 => PersonMatch::Exact(candidates[0].0),
            _ => PersonMatch::Ambiguous(candidates.into_iter().map(|candidate| candidate.0).collect()),
        })
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_resolve_municipality_absent_is_not_found() {
        let pool = init_db().await;
        let mut connection = pool.acquire().await.unwrap();
        let resolver = EntityResolver::new();
        let error = resolver.resolve_municipality(&mut connection, 9999999).await.unwrap_err();
        assert_eq!(error.error_type, ErrorType::NotFound);
        assert!(error.message.contains("9999999"));
    }

    #[sqlx::test]
    async fn test_party_vivification_counts_once() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let resolver = EntityResolver::new();
        let first = resolver.resolve_or_vivify_party(&mut transaction, "NOVO", Some(30)).await.unwrap();
        assert!(first.vivified);
        let second = resolver.resolve_or_vivify_party(&mut transaction, "NOVO", None).await.unwrap();
        assert!(!second.vivified);
        assert_eq!(first.party_id, second.party_id);
        transaction.rollback().await.unwrap(); // Rollback the transaction to avoid leaving test data in the database
    }

    #[sqlx::test]
    async fn test_resolve_person_reports_ambiguity_oldest_first() {
        let pool = init_db().await;
        let mut transaction = pool.begin().await.unwrap();
        let resolver = EntityResolver::new();
        let officials_dao = OfficialsDao::new();
        assert_eq!(resolver.resolve_person(&mut transaction, "JOÃO DA SILVA").await.unwrap(), PersonMatch::NoMatch);
        let first = officials_dao.add_person(&mut transaction, "JOÃO DA SILVA", None).await.unwrap();
        assert_eq!(resolver.resolve_person(&mut transaction, "JOÃO DA SILVA").await.unwrap(), PersonMatch::Exact(first));
        let second = officials_dao.add_person(&mut transaction, "JOÃO DA SILVA", None).await.unwrap();
        assert_eq!(resolver.resolve_person(&mut transaction, "JOÃO DA SILVA").await.unwrap(), PersonMatch::Ambiguous(vec![first, second]));
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
