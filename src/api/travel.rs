use std::collections::HashSet;

use actix_web::{get, web, HttpResponse};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info};
use sea_orm::sea_query::{extension::postgres::PgExpr, Expr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Statement,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::database::model::{airport, city, country};
use crate::database::sql::{contains_pattern, sphere_distance};
use crate::error::{ApiError, ApiResult};

/// Upper bound on the combined in-city and nearby airport list.
pub const AIRPORT_LIMIT: usize = 10;
const NEAREST_AIRPORTS: u64 = 3;
const AIRPORT_NAME_LIMIT: u64 = 25;
const UPCOMING_FLIGHT_LIMIT: u64 = 25;

const FLIGHT_TICKET: &str = "SELECT f.fid, f.depart_date_time, f.arrive_date_time, \
     a1.iata AS origin_iata, a1.airport_name AS origin_airport_name, \
     a2.iata AS dest_iata, a2.airport_name AS dest_airport_name, f.price_usd \
     FROM flight f \
     JOIN airport a1 ON f.origin_airport = a1.icao \
     JOIN airport a2 ON f.dest_airport = a2.icao \
     WHERE f.origin_airport = $1 AND f.dest_airport = $2";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, FromQueryResult)]
#[serde(rename_all = "camelCase")]
pub struct AirportWithCity {
    pub icao: String,
    pub iata: Option<String>,
    pub airport_name: String,
    pub city_name: String,
    pub country_name: String,
}

/// A bookable flight as listed on the flights page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, FromQueryResult)]
#[serde(rename_all = "camelCase")]
pub struct FlightTicket {
    pub fid: i32,
    pub depart_date_time: NaiveDateTime,
    pub arrive_date_time: NaiveDateTime,
    pub origin_iata: Option<String>,
    pub origin_airport_name: String,
    pub dest_iata: Option<String>,
    pub dest_airport_name: String,
    pub price_usd: f64,
}

pub fn validate_icao(code: &str) -> ApiResult<String> {
    let code = code.trim();
    if code.len() == 4 && code.bytes().all(|b| b.is_ascii_alphanumeric()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(ApiError::validation(format!("'{code}' is not an ICAO airport code")))
    }
}

/// In-city airports first, then the nearest ones, without duplicates.
pub fn merge_airports(in_city: Vec<airport::Model>, nearest: Vec<airport::Model>) -> Vec<airport::Model> {
    let mut seen = HashSet::new();
    in_city
        .into_iter()
        .chain(nearest)
        .filter(|a| seen.insert(a.icao.clone()))
        .take(AIRPORT_LIMIT)
        .collect()
}

/// Commercial airports serving a city: those located in it plus the closest few by distance.
pub async fn airports_by_cid<C: ConnectionTrait>(db: &C, cid: i64) -> ApiResult<Vec<airport::Model>> {
    let in_city = airport::Entity::find()
        .filter(airport::Column::Cid.eq(cid))
        .filter(airport::Column::Iata.is_not_null())
        .order_by_asc(airport::Column::AirportName)
        .all(db)
        .await?;

    let distance = sphere_distance("c", "a");
    let nearest = airport::Entity::find()
        .from_raw_sql(Statement::from_sql_and_values(
            db.get_database_backend(),
            format!(
                "SELECT a.icao, a.iata, a.airport_name, a.latitude, a.longitude, a.cid \
                 FROM airport a, city c \
                 WHERE c.cid = $1 AND a.iata IS NOT NULL \
                 ORDER BY {distance} \
                 LIMIT {NEAREST_AIRPORTS}"
            ),
            [cid.into()],
        ))
        .all(db)
        .await?;

    Ok(merge_airports(in_city, nearest))
}

pub async fn airports_by_city_name<C: ConnectionTrait>(
    db: &C,
    city_name: &str,
) -> ApiResult<Vec<AirportWithCity>> {
    if city_name.trim().is_empty() {
        return Ok(Vec::new());
    }

    let airports = airport::Entity::find()
        .select_only()
        .column(airport::Column::Icao)
        .column(airport::Column::Iata)
        .column(airport::Column::AirportName)
        .column_as(city::Column::CityName, "city_name")
        .column_as(country::Column::CountryName, "country_name")
        .join(JoinType::InnerJoin, airport::Relation::City.def())
        .join(JoinType::InnerJoin, city::Relation::Country.def())
        .filter(Expr::col((city::Entity, city::Column::CityName)).ilike(contains_pattern(city_name)))
        .filter(airport::Column::Iata.is_not_null())
        .order_by_asc(city::Column::CityName)
        .order_by_asc(airport::Column::AirportName)
        .limit(AIRPORT_NAME_LIMIT)
        .into_model::<AirportWithCity>()
        .all(db)
        .await?;
    Ok(airports)
}

/// Flights on the route departing on `date`, earliest first.
pub async fn flights_on_date<C: ConnectionTrait>(
    db: &C,
    origin_icao: &str,
    dest_icao: &str,
    date: NaiveDate,
) -> ApiResult<Vec<FlightTicket>> {
    let origin = validate_icao(origin_icao)?;
    let dest = validate_icao(dest_icao)?;

    let flights = FlightTicket::find_by_statement(Statement::from_sql_and_values(
        db.get_database_backend(),
        format!("{FLIGHT_TICKET} AND f.depart_date_time::date = $3 ORDER BY f.depart_date_time"),
        [origin.into(), dest.into(), date.into()],
    ))
    .all(db)
    .await?;
    Ok(flights)
}

/// Up to 25 flights on the route departing at or after `from`, earliest first.
pub async fn flights_from<C: ConnectionTrait>(
    db: &C,
    origin_icao: &str,
    dest_icao: &str,
    from: NaiveDateTime,
) -> ApiResult<Vec<FlightTicket>> {
    let origin = validate_icao(origin_icao)?;
    let dest = validate_icao(dest_icao)?;

    let flights = FlightTicket::find_by_statement(Statement::from_sql_and_values(
        db.get_database_backend(),
        format!(
            "{FLIGHT_TICKET} AND f.depart_date_time >= $3 \
             ORDER BY f.depart_date_time LIMIT {UPCOMING_FLIGHT_LIMIT}"
        ),
        [origin.into(), dest.into(), from.into()],
    ))
    .all(db)
    .await?;
    Ok(flights)
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AirportsByCidParams {
    /// City id
    pub cid: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AirportsByNameParams {
    #[serde(default)]
    pub city_name: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FlightsOnDateParams {
    pub origin_airport_icao: String,
    pub destination_airport_icao: String,
    /// Departure day, YYYY-MM-DD
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FlightsFromDateParams {
    pub origin_airport_icao: String,
    pub destination_airport_icao: String,
    /// Earliest departure, YYYY-MM-DDTHH:MM:SS
    pub date: NaiveDateTime,
}

#[utoipa::path(
    get,
    path = "/api/travel/airports/by-city",
    tag = "Travel",
    params(AirportsByCidParams),
    responses(
        (status = 200, description = "Airports in or near the city, at most 10", body = Vec<airport::Model>),
        (status = 500, description = "Server error"),
    )
)]
#[get("/airports/by-city")]
pub async fn get_airports_by_cid(
    db: web::Data<DatabaseConnection>,
    qp: web::Query<AirportsByCidParams>,
) -> ApiResult<HttpResponse> {
    let airports = airports_by_cid(db.get_ref(), qp.cid).await?;
    debug!("Airports near cid={}: {}", qp.cid, airports.len());
    Ok(HttpResponse::Ok().json(airports))
}

#[utoipa::path(
    get,
    path = "/api/travel/airports/by-city-name",
    tag = "Travel",
    params(AirportsByNameParams),
    responses(
        (status = 200, description = "Commercial airports of matching cities, at most 25", body = Vec<AirportWithCity>),
        (status = 500, description = "Server error"),
    )
)]
#[get("/airports/by-city-name")]
pub async fn get_airports_by_city_name(
    db: web::Data<DatabaseConnection>,
    qp: web::Query<AirportsByNameParams>,
) -> ApiResult<HttpResponse> {
    let airports = airports_by_city_name(db.get_ref(), &qp.city_name).await?;
    Ok(HttpResponse::Ok().json(airports))
}

#[utoipa::path(
    get,
    path = "/api/travel/flights/on-date",
    tag = "Travel",
    params(FlightsOnDateParams),
    responses(
        (status = 200, description = "Flights departing that day, earliest first", body = Vec<FlightTicket>),
        (status = 400, description = "Malformed airport code or date"),
        (status = 500, description = "Server error"),
    )
)]
#[get("/flights/on-date")]
pub async fn get_flights_by_airport_and_date(
    db: web::Data<DatabaseConnection>,
    qp: web::Query<FlightsOnDateParams>,
) -> ApiResult<HttpResponse> {
    debug!(
        "Flights request: {} -> {} on {}",
        qp.origin_airport_icao, qp.destination_airport_icao, qp.date
    );
    let flights = flights_on_date(
        db.get_ref(),
        &qp.origin_airport_icao,
        &qp.destination_airport_icao,
        qp.date,
    )
    .await?;
    info!(
        "Flights {} -> {} on {}: {}",
        qp.origin_airport_icao,
        qp.destination_airport_icao,
        qp.date,
        flights.len()
    );
    Ok(HttpResponse::Ok().json(flights))
}

#[utoipa::path(
    get,
    path = "/api/travel/flights/from-date",
    tag = "Travel",
    params(FlightsFromDateParams),
    responses(
        (status = 200, description = "Next flights on the route, at most 25", body = Vec<FlightTicket>),
        (status = 400, description = "Malformed airport code or date"),
        (status = 500, description = "Server error"),
    )
)]
#[get("/flights/from-date")]
pub async fn get_flights_by_airport_beyond_date(
    db: web::Data<DatabaseConnection>,
    qp: web::Query<FlightsFromDateParams>,
) -> ApiResult<HttpResponse> {
    let flights = flights_from(
        db.get_ref(),
        &qp.origin_airport_icao,
        &qp.destination_airport_icao,
        qp.date,
    )
    .await?;
    Ok(HttpResponse::Ok().json(flights))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/travel")
            .service(get_airports_by_cid)
            .service(get_airports_by_city_name)
            .service(get_flights_by_airport_and_date)
            .service(get_flights_by_airport_beyond_date),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::collections::BTreeMap;

    fn airport(icao: &str, iata: &str) -> airport::Model {
        airport::Model {
            icao: icao.to_string(),
            iata: Some(iata.to_string()),
            airport_name: format!("{icao} International"),
            latitude: 0.0,
            longitude: 0.0,
            cid: None,
        }
    }

    fn flight_row(fid: i32, depart: &str) -> BTreeMap<&'static str, Value> {
        let depart = NaiveDateTime::parse_from_str(depart, "%Y-%m-%d %H:%M").unwrap();
        BTreeMap::from([
            ("fid", Value::from(fid)),
            ("depart_date_time", Value::from(depart)),
            ("arrive_date_time", Value::from(depart + chrono::Duration::hours(6))),
            ("origin_iata", Value::from(Some("SIN".to_string()))),
            ("origin_airport_name", Value::from("Singapore Changi")),
            ("dest_iata", Value::from(Some("PEK".to_string()))),
            ("dest_airport_name", Value::from("Beijing Capital")),
            ("price_usd", Value::from(412.5)),
        ])
    }

    #[::core::prelude::v1::test]
    fn merge_prefers_city_airports_and_dedups() {
        let merged = merge_airports(
            vec![airport("WSSS", "SIN"), airport("WSSL", "XSP")],
            vec![airport("WSSS", "SIN"), airport("WMKJ", "JHB"), airport("WIDD", "BTH")],
        );
        let codes: Vec<_> = merged.iter().map(|a| a.icao.as_str()).collect();
        assert_eq!(codes, ["WSSS", "WSSL", "WMKJ", "WIDD"]);
    }

    #[::core::prelude::v1::test]
    fn merge_caps_at_limit() {
        let in_city = (0..12).map(|i| airport(&format!("K{i:03}"), "XXX")).collect();
        assert_eq!(merge_airports(in_city, vec![]).len(), AIRPORT_LIMIT);
    }

    #[::core::prelude::v1::test]
    fn icao_codes_are_normalized() {
        assert_eq!(validate_icao(" wsss ").unwrap(), "WSSS");
        assert!(validate_icao("SIN").is_err());
        assert!(validate_icao("").is_err());
        assert!(validate_icao("WS-S").is_err());
    }

    #[actix_web::test]
    async fn flights_on_date_filters_by_route_and_day() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                flight_row(7, "2022-10-01 08:15"),
                flight_row(3, "2022-10-01 23:40"),
            ]])
            .into_connection();

        let date = NaiveDate::from_ymd_opt(2022, 10, 1).unwrap();
        let flights = flights_on_date(&db, "wsss", "ZBAA", date).await.unwrap();
        assert_eq!(flights.len(), 2);
        assert!(flights.iter().all(|f| f.depart_date_time.date() == date));
        assert!(flights.windows(2).all(|w| w[0].depart_date_time <= w[1].depart_date_time));

        let stmt = format!("{:?}", db.into_transaction_log()[0]);
        assert!(stmt.contains("f.depart_date_time::date = $3"));
        assert!(stmt.contains("ORDER BY f.depart_date_time"));
        assert!(stmt.contains("\"WSSS\""));
        assert!(stmt.contains("\"ZBAA\""));
    }

    #[actix_web::test]
    async fn upcoming_flights_are_capped() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![flight_row(1, "2022-10-02 10:00")]])
            .into_connection();

        let from = NaiveDate::from_ymd_opt(2022, 10, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let flights = flights_from(&db, "WSSS", "ZBAA", from).await.unwrap();
        assert_eq!(flights[0].origin_iata.as_deref(), Some("SIN"));

        let stmt = format!("{:?}", db.into_transaction_log()[0]);
        assert!(stmt.contains("f.depart_date_time >= $3"));
        assert!(stmt.contains("LIMIT 25"));
    }

    #[actix_web::test]
    async fn blank_city_name_returns_no_airports() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        assert!(airports_by_city_name(&db, "").await.unwrap().is_empty());
        assert!(db.into_transaction_log().is_empty());
    }

    #[actix_web::test]
    async fn airports_by_cid_runs_both_lookups() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![airport("WSSS", "SIN")]])
            .append_query_results([vec![airport("WSSS", "SIN"), airport("WMKJ", "JHB")]])
            .into_connection();

        let airports = airports_by_cid(&db, 1702341327).await.unwrap();
        assert_eq!(airports.len(), 2);
        assert_eq!(db.into_transaction_log().len(), 2);
    }

    #[actix_web::test]
    async fn bad_icao_is_bad_request() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .configure(init_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/travel/flights/on-date?originAirportIcao=SIN&destinationAirportIcao=ZBAA&date=2022-10-01")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
