use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::model::apperror::{ApplicationError, ErrorType};

/**
 * Elected office held by a mandate.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Office {
    Mayor,
    ViceMayor,
    CouncilMember,
}

impl Office {
    /**
     * Storage representation of the office.
     */
    pub fn as_str(&self) -> &'static str {
        match self {
            Office::Mayor => "MAYOR",
            Office::ViceMayor => "VICE_MAYOR",
            Office::CouncilMember => "COUNCIL_MEMBER",
        }
    }
}

impl FromStr for Office {
    type Err = ApplicationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "MAYOR" => Ok(Office::Mayor),
            "VICE_MAYOR" => Ok(Office::ViceMayor),
            "COUNCIL_MEMBER" => Ok(Office::CouncilMember),
            other => Err(ApplicationError::new(ErrorType::Validation, format!("Unknown office: {other}"))),
        }
    }
}

impl fmt::Display for Office {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/**
 * Tourism tier classification of a municipality.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Gold,
    Silver,
    Bronze,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Gold => "GOLD",
            Tier::Silver => "SILVER",
            Tier::Bronze => "BRONZE",
        }
    }
}

impl FromStr for Tier {
    type Err = ApplicationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "GOLD" => Ok(Tier::Gold),
            "SILVER" => Ok(Tier::Silver),
            "BRONZE" => Ok(Tier::Bronze),
            other => Err(ApplicationError::new(ErrorType::Validation, format!("Unknown tier: {other}"))),
        }
    }
}

/**
 * A municipality with its optional tourist territory.
 */
#[derive(Debug, Clone)]
pub struct MunicipalityType {
    pub id: i64,
    pub ibge_code: i64,
    pub name: String,
    pub state: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub crest_url: Option<String>,
    pub tier: Option<String>,
    pub territory_id: Option<i64>,
    pub territory_name: Option<String>,
}

/**
 * A municipality enriched with its most recent statistics.
 */
#[derive(Debug, Clone)]
pub struct MunicipalityEnrichedType {
    pub municipality: MunicipalityType,
    pub population: Option<i64>,
    pub electorate: Option<i64>,
}

/**
 * A tourist territory with its member municipalities.
 */
#[derive(Debug, Clone)]
pub struct TerritoryType {
    pub id: i64,
    pub name: String,
    pub municipalities: Vec<MunicipalityType>,
}

/**
 * A political party.
 */
#[derive(Debug, Clone)]
pub struct PartyType {
    pub id: i64,
    pub sigla: String,
    pub name: String,
    pub tse_number: Option<i32>,
    pub color_hex: Option<String>,
}

/**
 * Denormalized party fields as carried by mandates and search results.
 */
#[derive(Debug, Clone)]
pub struct PartySnapshotType {
    pub sigla: String,
    pub name: String,
    pub color_hex: Option<String>,
}

/**
 * One elected official within a single municipality.
 */
#[derive(Debug, Clone)]
pub struct AuthorityType {
    pub mandate_id: i64,
    pub full_name: String,
    pub photo_url: Option<String>,
    pub office: Office,
    pub party: Option<PartySnapshotType>,
    pub legislature: Option<String>,
    pub seat_number: Option<i32>,
}

/**
 * Authorities of a municipality for one election cycle, partitioned by office.
 */
#[derive(Debug, Clone)]
pub struct AuthoritiesType {
    pub mayor: Option<AuthorityType>,
    pub vice_mayor: Option<AuthorityType>,
    pub council_members: Vec<AuthorityType>,
}

/**
 * A name-search hit, including the municipality the mandate belongs to.
 */
#[derive(Debug, Clone)]
pub struct AuthorityMatchType {
    pub authority: AuthorityType,
    pub municipality_id: i64,
    pub municipality_name: String,
    pub ibge_code: i64,
}

/**
 * A single statistic snapshot: the value and the year it refers to.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatSnapshotType {
    pub reference_year: i32,
    pub value: i64,
}

/**
 * Denormalized overview of a municipality: identity plus the most recent
 * population, electorate and council-seat snapshots. Absent statistics stay
 * `None`; they never fail the lookup.
 */
#[derive(Debug, Clone)]
pub struct OverviewType {
    pub id: i64,
    pub ibge_code: i64,
    pub name: String,
    pub population: Option<StatSnapshotType>,
    pub electorate: Option<StatSnapshotType>,
    pub council_seats: Option<StatSnapshotType>,
}

/**
 * One historical election result row for a candidate in a municipality.
 */
#[derive(Debug, Clone)]
pub struct ElectionResultType {
    pub id: i64,
    pub year: i32,
    pub round: i32,
    pub office: String,
    pub state: String,
    pub ibge_code: i64,
    pub municipality_name: String,
    pub candidate_name: String,
    pub candidate_number: Option<i32>,
    pub party_sigla: Option<String>,
    pub party_name: Option<String>,
    pub votes: i64,
    pub percent_valid: Option<Decimal>,
}

/***************** Import attribute types *********************/

/**
 * Attributes for creating or updating a municipality from the territory file.
 */
#[derive(Debug, Clone)]
pub struct MunicipalityAttributes {
    pub ibge_code: i64,
    pub name: String,
    pub territory_id: Option<i64>,
}

/**
 * Optional enrichment attributes applied to an existing municipality.
 * `None` fields never overwrite stored values.
 */
#[derive(Debug, Clone, Default)]
pub struct MunicipalityMetaAttributes {
    pub state: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub crest_url: Option<String>,
    pub tier: Option<Tier>,
}

/**
 * Attributes for upserting a party by acronym.
 */
#[derive(Debug, Clone)]
pub struct PartyAttributes {
    pub sigla: String,
    pub name: String,
    pub tse_number: Option<i32>,
    pub color_hex: Option<String>,
}

/**
 * Attributes for upserting a mandate. The natural key is
 * (municipality, office, person, election year).
 */
#[derive(Debug, Clone)]
pub struct MandateAttributes {
    pub municipality_id: i64,
    pub person_id: i64,
    pub party_id: Option<i64>,
    pub office: Office,
    pub election_year: i32,
    pub start_year: i32,
    pub end_year: Option<i32>,
    pub seat_number: Option<i32>,
    pub legislature: Option<String>,
}

/**
 * Attributes for upserting a statistics row per (municipality, year).
 * Population and electorate arrive from independent source files.
 */
#[derive(Debug, Clone)]
pub struct StatsAttributes {
    pub municipality_id: i64,
    pub reference_year: i32,
    pub population: Option<i64>,
    pub electorate: Option<i64>,
}

/**
 * Attributes for upserting the configured council seats per (municipality, year).
 */
#[derive(Debug, Clone)]
pub struct CouncilSeatsAttributes {
    pub municipality_id: i64,
    pub reference_year: i32,
    pub seats: i32,
}

/**
 * Attributes for upserting an election result row. Party fields are
 * snapshots taken at import time, not live references.
 */
#[derive(Debug, Clone)]
pub struct ElectionResultAttributes {
    pub municipality_id: i64,
    pub year: i32,
    pub round: i32,
    pub office: String,
    pub state: String,
    pub candidate_name: String,
    pub candidate_number: Option<i32>,
    pub party_sigla: Option<String>,
    pub party_name: Option<String>,
    pub votes: i64,
    pub percent_valid: Option<Decimal>,
}
