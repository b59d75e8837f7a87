use utoipa::OpenApi;

use super::{city, covid, forex, hospital, ticket, travel};

#[derive(OpenApi)]
#[openapi(
    info(title = "travelscope", description = "City, health, travel and currency lookups"),
    paths(
        city::get_city_by_full_text_search,
        city::get_city_by_city_name,
        city::get_city_by_cid,
        hospital::get_hospitals_by_proximity,
        hospital::get_hospitals_by_cid,
        travel::get_airports_by_cid,
        travel::get_airports_by_city_name,
        travel::get_flights_by_airport_and_date,
        travel::get_flights_by_airport_beyond_date,
        covid::get_latest_entry_by_alpha3,
        covid::get_month_with_highest_new_cases_by_year,
        forex::get_forex_by_date,
        ticket::get_ticket_by_user_id_and_year_month,
        ticket::post_ticket,
    ),
    tags(
        (name = "City", description = "City search"),
        (name = "Hospital", description = "Hospitals near a city"),
        (name = "Travel", description = "Airports and flights"),
        (name = "Covid", description = "COVID-19 statistics per country"),
        (name = "Forex", description = "Cached currency conversion rates"),
        (name = "Ticket", description = "Purchased tickets"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_endpoint_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/city/search",
            "/api/city/{cid}",
            "/api/hospital/proximity",
            "/api/travel/flights/on-date",
            "/api/covid/peak-month",
            "/api/forex",
            "/api/ticket",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
