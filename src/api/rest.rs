use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{
        AuthoritiesType, AuthorityMatchType, AuthorityType, ElectionResultType, MunicipalityEnrichedType, MunicipalityType, OverviewType, PartySnapshotType, PartyType,
        StatSnapshotType, TerritoryType,
    },
};

/***************** Municipality models *********************/

/**
 * Query parameters for listing municipalities.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityListQuery {
    pub territory_id: Option<i64>,
    pub limit: Option<i64>,
}

/**
 * Response structure for listing municipalities.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityListResponse {
    /**
     * A vector of municipalities enriched with their latest statistics.
     */
    municipalities: Vec<MunicipalityListElement>,
}

impl From<Vec<MunicipalityEnrichedType>> for MunicipalityListResponse {
    fn from(municipalities: Vec<MunicipalityEnrichedType>) -> Self {
        MunicipalityListResponse { municipalities: municipalities.into_iter().map(MunicipalityListElement::from).collect() }
    }
}

/**
 * One municipality in the list response, enriched with the most recent
 * population and electorate.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityListElement {
    #[serde(flatten)]
    municipality: MunicipalityElement,
    population: Option<i64>,
    electorate: Option<i64>,
}

impl From<MunicipalityEnrichedType> for MunicipalityListElement {
    fn from(enriched: MunicipalityEnrichedType) -> Self {
        MunicipalityListElement { municipality: MunicipalityElement::from(enriched.municipality), population: enriched.population, electorate: enriched.electorate }
    }
}

/**
 * A municipality as carried by API responses. IBGE codes cross the wire as
 * decimal strings.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityElement {
    /**
     * The internal identifier of the municipality.
     */
    id: i64,
    /**
     * The IBGE code of the municipality, as a decimal string.
     */
    ibge_code: String,
    /**
     * The name of the municipality.
     */
    name: String,
    /**
     * The two-letter state code.
     */
    state: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    crest_url: Option<String>,
    tier: Option<String>,
    territory_id: Option<i64>,
    territory_name: Option<String>,
}

impl From<MunicipalityType> for MunicipalityElement {
    fn from(municipality: MunicipalityType) -> Self {
        MunicipalityElement {
            id: municipality.id,
            ibge_code: municipality.ibge_code.to_string(),
            name: municipality.name,
            state: municipality.state,
            latitude: municipality.latitude,
            longitude: municipality.longitude,
            crest_url: municipality.crest_url,
            tier: municipality.tier,
            territory_id: municipality.territory_id,
            territory_name: municipality.territory_name,
        }
    }
}

/***************** Overview models *********************/

/**
 * Response structure for the municipality overview: identity plus the most
 * recent statistic snapshots. Absent statistics serialize as null.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    id: i64,
    ibge_code: String,
    name: String,
    population: Option<StatSnapshotElement>,
    electorate: Option<StatSnapshotElement>,
    council_seats: Option<StatSnapshotElement>,
}

impl From<OverviewType> for OverviewResponse {
    fn from(overview: OverviewType) -> Self {
        OverviewResponse {
            id: overview.id,
            ibge_code: overview.ibge_code.to_string(),
            name: overview.name,
            population: overview.population.map(StatSnapshotElement::from),
            electorate: overview.electorate.map(StatSnapshotElement::from),
            council_seats: overview.council_seats.map(StatSnapshotElement::from),
        }
    }
}

/**
 * A statistic value together with the year it refers to.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatSnapshotElement {
    reference_year: i32,
    value: i64,
}

impl From<StatSnapshotType> for StatSnapshotElement {
    fn from(snapshot: StatSnapshotType) -> Self {
        StatSnapshotElement { reference_year: snapshot.reference_year, value: snapshot.value }
    }
}

/***************** Authorities models *********************/

/**
 * Query parameters for the authorities endpoint.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthoritiesQuery {
    pub election_year: Option<i32>,
}

/**
 * Response structure for the authorities of a municipality, partitioned by
 * office.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthoritiesResponse {
    mayor: Option<AuthorityElement>,
    vice_mayor: Option<AuthorityElement>,
    council_members: Vec<AuthorityElement>,
}

impl From<AuthoritiesType> for AuthoritiesResponse {
    fn from(authorities: AuthoritiesType) -> Self {
        AuthoritiesResponse {
            mayor: authorities.mayor.map(AuthorityElement::from),
            vice_mayor: authorities.vice_mayor.map(AuthorityElement::from),
            council_members: authorities.council_members.into_iter().map(AuthorityElement::from).collect(),
        }
    }
}

/**
 * One elected official as carried by API responses.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorityElement {
    mandate_id: i64,
    full_name: String,
    photo_url: Option<String>,
    office: String,
    party: Option<PartySnapshotElement>,
    legislature: Option<String>,
    seat_number: Option<i32>,
}

impl From<AuthorityType> for AuthorityElement {
    fn from(authority: AuthorityType) -> Self {
        AuthorityElement {
            mandate_id: authority.mandate_id,
            full_name: authority.full_name,
            photo_url: authority.photo_url,
            office: authority.office.to_string(),
            party: authority.party.map(PartySnapshotElement::from),
            legislature: authority.legislature,
            seat_number: authority.seat_number,
        }
    }
}

/**
 * Denormalized party fields as carried by authorities and search hits.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartySnapshotElement {
    sigla: String,
    name: String,
    color_hex: Option<String>,
}

impl From<PartySnapshotType> for PartySnapshotElement {
    fn from(party: PartySnapshotType) -> Self {
        PartySnapshotElement { sigla: party.sigla, name: party.name, color_hex: party.color_hex }
    }
}

/***************** Search models *********************/

/**
 * Query parameters for the official name search.
 */
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/**
 * Response structure for the official name search.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthoritySearchResponse {
    results: Vec<AuthorityMatchElement>,
}

impl From<Vec<AuthorityMatchType>> for AuthoritySearchResponse {
    fn from(matches: Vec<AuthorityMatchType>) -> Self {
        AuthoritySearchResponse { results: matches.into_iter().map(AuthorityMatchElement::from).collect() }
    }
}

/**
 * One name-search hit, including the municipality the mandate belongs to.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorityMatchElement {
    #[serde(flatten)]
    authority: AuthorityElement,
    municipality_id: i64,
    municipality_name: String,
    ibge_code: String,
}

impl From<AuthorityMatchType> for AuthorityMatchElement {
    fn from(hit: AuthorityMatchType) -> Self {
        AuthorityMatchElement {
            authority: AuthorityElement::from(hit.authority),
            municipality_id: hit.municipality_id,
            municipality_name: hit.municipality_name,
            ibge_code: hit.ibge_code.to_string(),
        }
    }
}

/***************** Territory and party models *********************/

/**
 * Response structure for listing territories.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerritoryListResponse {
    territories: Vec<TerritoryElement>,
}

impl From<Vec<TerritoryType>> for TerritoryListResponse {
    fn from(territories: Vec<TerritoryType>) -> Self {
        TerritoryListResponse { territories: territories.into_iter().map(TerritoryElement::from).collect() }
    }
}

/**
 * One tourist territory with its member municipalities.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerritoryElement {
    id: i64,
    name: String,
    municipalities: Vec<MunicipalityElement>,
}

impl From<TerritoryType> for TerritoryElement {
    fn from(territory: TerritoryType) -> Self {
        TerritoryElement { id: territory.id, name: territory.name, municipalities: territory.municipalities.into_iter().map(MunicipalityElement::from).collect() }
    }
}

/**
 * Response structure for listing parties.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyListResponse {
    parties: Vec<PartyElement>,
}

impl From<Vec<PartyType>> for PartyListResponse {
    fn from(parties: Vec<PartyType>) -> Self {
        PartyListResponse { parties: parties.into_iter().map(PartyElement::from).collect() }
    }
}

/**
 * One political party as carried by API responses.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyElement {
    id: i64,
    sigla: String,
    name: String,
    tse_number: Option<i32>,
    color_hex: Option<String>,
}

impl From<PartyType> for PartyElement {
    fn from(party: PartyType) -> Self {
        PartyElement { id: party.id, sigla: party.sigla, name: party.name, tse_number: party.tse_number, color_hex: party.color_hex }
    }
}

/***************** Election history models *********************/

/**
 * Query parameters for the voting history endpoint.
 */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub candidate: Option<String>,
    pub ibge_code: Option<String>,
}

/**
 * Response structure for the voting history of a candidate.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    history: Vec<ElectionResultElement>,
}

impl From<Vec<ElectionResultType>> for HistoryResponse {
    fn from(results: Vec<ElectionResultType>) -> Self {
        HistoryResponse { history: results.into_iter().map(ElectionResultElement::from).collect() }
    }
}

/**
 * One historical election result row.
 */
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionResultElement {
    id: i64,
    year: i32,
    round: i32,
    office: String,
    state: String,
    ibge_code: String,
    municipality_name: String,
    candidate_name: String,
    candidate_number: Option<i32>,
    party_sigla: Option<String>,
    party_name: Option<String>,
    votes: i64,
    percent_valid: Option<Decimal>,
}

impl From<ElectionResultType> for ElectionResultElement {
    fn from(result: ElectionResultType) -> Self {
        ElectionResultElement {
            id: result.id,
            year: result.year,
            round: result.round,
            office: result.office,
            state: result.state,
            ibge_code: result.ibge_code.to_string(),
            municipality_name: result.municipality_name,
            candidate_name: result.candidate_name,
            candidate_number: result.candidate_number,
            party_sigla: result.party_sigla,
            party_name: result.party_name,
            votes: result.votes,
            percent_valid: result.percent_valid,
        }
    }
}

/***************** Error models *********************/

/**
 * Custom error response for the application.
 */
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /**
     * The error code associated with the error type.
     */
    pub code: u16,
    /**
     * A human-readable message describing the error.
     */
    pub message: String,
}

impl ResponseError for ApplicationError {
    /**
     * Generates an error response for the application error.
     */
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse { code: get_error_code(&self.error_type), message: self.message.clone() };
        HttpResponse::build(get_statuscode(&self.error_type.clone())).json(&error_response)
    }
}

/**
* Maps application errors to HTTP status codes.
*
* # Arguments
* `application_error`: The type of error that occurred.
*
* # Returns
* The corresponding HTTP status code.
*/
fn get_statuscode(application_error: &ErrorType) -> StatusCode {
    match application_error {
        ErrorType::NotFound => StatusCode::NOT_FOUND,
        ErrorType::Validation | ErrorType::Parse => StatusCode::BAD_REQUEST,
        ErrorType::ConstraintViolation => StatusCode::CONFLICT,
        ErrorType::Initialization | ErrorType::DatabaseError | ErrorType::Application => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/**
 * Maps application errors to error codes.
 *
 * # Arguments
 * `application_error`: The type of error that occurred.
 *
 * # Returns
 * The corresponding error code.
 */
fn get_error_code(application_error: &ErrorType) -> u16 {
    match application_error {
        ErrorType::Initialization => 1001,
        ErrorType::NotFound => 1002,
        ErrorType::DatabaseError => 1003,
        ErrorType::Validation => 1004,
        ErrorType::Parse => 1005,
        ErrorType::ConstraintViolation => 1006,
        ErrorType::Application => 1099,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::models::Office;

    #[test]
    fn test_error_mapping() {
        assert_eq!(get_statuscode(&ErrorType::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(get_statuscode(&ErrorType::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(get_statuscode(&ErrorType::Parse), StatusCode::BAD_REQUEST);
        assert_eq!(get_statuscode(&ErrorType::ConstraintViolation), StatusCode::CONFLICT);
        assert_eq!(get_statuscode(&ErrorType::DatabaseError), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_ibge_code_serializes_as_string() {
        let overview = OverviewType { id: 1, ibge_code: 4104808, name: "Cascavel".to_string(), population: None, electorate: None, council_seats: None };
        let json = serde_json::to_value(OverviewResponse::from(overview)).unwrap();
        assert_eq!(json["ibgeCode"], serde_json::json!("4104808"));
        assert!(json["population"].is_null());
    }

    #[test]
    fn test_authority_element_camel_case() {
        let authority = AuthorityType {
            mandate_id: 7,
            full_name: "MARIA SOUZA".to_string(),
            photo_url: None,
            office: Office::CouncilMember,
            party: Some(PartySnapshotType { sigla: "PSD".to_string(), name: "Partido Social Democrático".to_string(), color_hex: None }),
            legislature: Some("2025-2028".to_string()),
            seat_number: Some(3),
        };
        let json = serde_json::to_value(AuthorityElement::from(authority)).unwrap();
        assert_eq!(json["fullName"], serde_json::json!("MARIA SOUZA"));
        assert_eq!(json["office"], serde_json::json!("COUNCIL_MEMBER"));
        assert_eq!(json["seatNumber"], serde_json::json!(3));
        assert_eq!(json["party"]["sigla"], serde_json::json!("PSD"));
    }
}
