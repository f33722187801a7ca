use crate::service::{elections::ElectionsService, municipality::MunicipalityService, officials::OfficialsService};

/**
* Represents the application state shared across the Actix web application.
*/
pub struct AppState {
    /**
     * The service for municipality and territory reads.
     */
    pub municipality_service: MunicipalityService,
    /**
     * The service for elected officials and parties.
     */
    pub officials_service: OfficialsService,
    /**
     * The service for historical election results.
     */
    pub elections_service: ElectionsService,
}

/**
 * Creates a new instance of `AppState`.
 *
 * # Arguments
 * `municipality_service`: The service for municipality and territory reads.
 * `officials_service`: The service for elected officials and parties.
 * `elections_service`: The service for historical election results.
 */
impl AppState {
    pub fn new(municipality_service: MunicipalityService, officials_service: OfficialsService, elections_service: ElectionsService) -> Self {
        AppState { municipality_service, officials_service, elections_service }
    }
}
