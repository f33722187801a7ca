use actix_web::{
    HttpRequest, HttpResponse, get,
    web::{self, Path},
};
use tracing::{Instrument, instrument};

use crate::{
    api::{
        rest::{
            AuthoritiesQuery, AuthoritiesResponse, AuthoritySearchResponse, HistoryQuery, HistoryResponse, MunicipalityElement, MunicipalityListQuery,
            MunicipalityListResponse, OverviewResponse, PartyListResponse, SearchQuery, TerritoryListResponse,
        },
        state::AppState,
    },
    model::apperror::{ApplicationError, ErrorType},
};

/**
 * Election cycle assumed when the client does not name one.
 */
const DEFAULT_ELECTION_YEAR: i32 = 2024;

/**
 * Endpoint to retrieve municipalities ordered by name, optionally filtered
 * by territory and capped.
 */
#[instrument(skip(http_request, app_state), fields(service = "listMunicipalities", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/municipalities")]
pub async fn municipalities_list(http_request: HttpRequest, query: web::Query<MunicipalityListQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let municipalities = app_state.municipality_service.get_municipality_list(query.territory_id, query.limit).instrument(span).await?;
    Ok(HttpResponse::Ok().json(MunicipalityListResponse::from(municipalities)))
}

/**
 * Endpoint to retrieve one municipality by internal id.
 */
#[instrument(skip(http_request, app_state), fields(service = "getMunicipality", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/municipalities/{municipalityId}")]
pub async fn municipality_get(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let municipality_id = path.into_inner();
    let municipality = app_state.municipality_service.get_municipality(municipality_id).instrument(span).await?;
    Ok(HttpResponse::Ok().json(MunicipalityElement::from(municipality)))
}

/**
 * Endpoint to retrieve the overview of a municipality by IBGE code.
 */
#[instrument(skip(http_request, app_state), fields(service = "getOverview", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/municipalities/code/{ibgeCode}/overview")]
pub async fn municipality_overview(path: Path<String>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let ibge_code = parse_ibge_code(&path.into_inner())?;
    let overview = app_state.municipality_service.get_overview(ibge_code).instrument(span).await?;
    Ok(HttpResponse::Ok().json(OverviewResponse::from(overview)))
}

/**
 * Endpoint to retrieve the authorities of a municipality by IBGE code,
 * partitioned by office.
 */
#[instrument(skip(http_request, app_state), fields(service = "getAuthorities", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/municipalities/code/{ibgeCode}/authorities")]
pub async fn municipality_authorities(
    path: Path<String>,
    query: web::Query<AuthoritiesQuery>,
    http_request: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let ibge_code = parse_ibge_code(&path.into_inner())?;
    let election_year = query.election_year.unwrap_or(DEFAULT_ELECTION_YEAR);
    let authorities = app_state.officials_service.get_authorities(ibge_code, election_year).instrument(span).await?;
    Ok(HttpResponse::Ok().json(AuthoritiesResponse::from(authorities)))
}

/**
 * Endpoint to search elected officials by name fragment.
 */
#[instrument(skip(http_request, app_state), fields(service = "searchAuthorities", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/authorities/search")]
pub async fn authorities_search(query: web::Query<SearchQuery>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let matches = app_state.officials_service.search_authorities(query.q.as_deref().unwrap_or_default()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(AuthoritySearchResponse::from(matches)))
}

/**
 * Endpoint to retrieve the voting history of a candidate, optionally scoped
 * to one municipality.
 */
#[instrument(skip(http_request, app_state), fields(service = "getVotingHistory", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/elections/history")]
pub async fn elections_history(query: web::Query<HistoryQuery>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let candidate = query.candidate.as_deref().map(str::trim).filter(|candidate| !candidate.is_empty()).ok_or_else(|| ApplicationError::new(ErrorType::Validation, "Missing candidate parameter".to_string()))?;
    let ibge_code = match query.ibge_code.as_deref() {
        Some(raw) => Some(parse_ibge_code(raw)?),
        None => None,
    };
    let history = app_state.elections_service.get_voting_history(candidate, ibge_code).instrument(span).await?;
    Ok(HttpResponse::Ok().json(HistoryResponse::from(history)))
}

/**
 * Endpoint to retrieve territories with their member municipalities.
 */
#[instrument(skip(http_request, app_state), fields(service = "listTerritories", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/territories")]
pub async fn territories_list(http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let territories = app_state.municipality_service.get_territories().instrument(span).await?;
    Ok(HttpResponse::Ok().json(TerritoryListResponse::from(territories)))
}

/**
 * Endpoint to retrieve parties ordered by acronym.
 */
#[instrument(skip(http_request, app_state), fields(service = "listParties", trace_id = get_trace_id(&http_request), result))]
#[get("/api/services/v1_0/parties")]
pub async fn parties_list(http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let parties = app_state.officials_service.get_party_list().instrument(span).await?;
    Ok(HttpResponse::Ok().json(PartyListResponse::from(parties)))
}

/**
 * Parses an IBGE code from its wire form, a decimal string.
 */
fn parse_ibge_code(raw: &str) -> Result<i64, ApplicationError> {
    raw.trim().parse::<i64>().map_err(|_| ApplicationError::new(ErrorType::Validation, format!("Invalid IBGE code '{raw}'")))
}

/**
 * Retrieves the trace ID from the HTTP request headers.
 */
fn get_trace_id(http_request: &HttpRequest) -> String {
    http_request.headers().get("X-Trace-ID").and_then(|v| v.to_str().ok().map(std::string::ToString::to_string)).unwrap_or_default()
}
