use actix_web::{get, web, HttpResponse};
use log::{debug, info};
use sea_orm::sea_query::{extension::postgres::PgExpr, Expr};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    Statement,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::database::model::city;
use crate::database::sql::{contains_pattern, prefix_tsquery, CITY_DOCUMENT};
use crate::error::ApiResult;
use crate::flag::flag_emoji;

pub const SEARCH_LIMIT: u64 = 25;

const CITY_WITH_COUNTRY: &str = "SELECT c.cid, c.city_name, c.latitude, c.longitude, c.population, c.capital, \
     c.alpha3, n.alpha2, n.country_name, n.currency \
     FROM city c JOIN country n ON n.alpha3 = c.alpha3";

#[derive(Debug, FromQueryResult)]
struct CityRow {
    cid: i64,
    city_name: String,
    latitude: f64,
    longitude: f64,
    population: Option<i64>,
    capital: bool,
    alpha3: String,
    alpha2: String,
    country_name: String,
    currency: Option<String>,
}

/// A city joined with its country, as shown in search results and on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CityWithCountry {
    pub cid: i64,
    pub city_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub population: Option<i64>,
    pub capital: bool,
    pub alpha3: String,
    pub alpha2: String,
    pub country_name: String,
    pub currency: Option<String>,
    /// Regional-indicator flag derived from `alpha2`
    pub flag: Option<String>,
}

impl From<CityRow> for CityWithCountry {
    fn from(row: CityRow) -> Self {
        let flag = flag_emoji(&row.alpha2);
        Self {
            cid: row.cid,
            city_name: row.city_name,
            latitude: row.latitude,
            longitude: row.longitude,
            population: row.population,
            capital: row.capital,
            alpha3: row.alpha3,
            alpha2: row.alpha2,
            country_name: row.country_name,
            currency: row.currency,
            flag,
        }
    }
}

/// Full-text search over city name, country name and alpha-3 code, best match first.
pub async fn search_cities<C: ConnectionTrait>(db: &C, query: &str) -> ApiResult<Vec<CityWithCountry>> {
    let Some(tsquery) = prefix_tsquery(query) else {
        return Ok(Vec::new());
    };

    let sql = format!(
        "{CITY_WITH_COUNTRY} \
         WHERE {CITY_DOCUMENT} @@ to_tsquery('simple', $1) \
         ORDER BY ts_rank({CITY_DOCUMENT}, to_tsquery('simple', $1)) DESC, c.population DESC NULLS LAST \
         LIMIT {SEARCH_LIMIT}"
    );
    let rows = CityRow::find_by_statement(Statement::from_sql_and_values(
        db.get_database_backend(),
        sql,
        [tsquery.into()],
    ))
    .all(db)
    .await?;

    Ok(rows.into_iter().map(CityWithCountry::from).collect())
}

pub async fn cities_by_name<C: ConnectionTrait>(db: &C, city_name: &str) -> ApiResult<Vec<city::Model>> {
    if city_name.trim().is_empty() {
        return Ok(Vec::new());
    }

    let cities = city::Entity::find()
        .filter(Expr::col((city::Entity, city::Column::CityName)).ilike(contains_pattern(city_name)))
        .order_by_asc(city::Column::CityName)
        .all(db)
        .await?;
    Ok(cities)
}

pub async fn city_by_cid<C: ConnectionTrait>(db: &C, cid: i64) -> ApiResult<Option<CityWithCountry>> {
    let row = CityRow::find_by_statement(Statement::from_sql_and_values(
        db.get_database_backend(),
        format!("{CITY_WITH_COUNTRY} WHERE c.cid = $1"),
        [cid.into()],
    ))
    .one(db)
    .await?;

    Ok(row.map(CityWithCountry::from))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQueryParams {
    /// Free text; blank returns an empty list
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CityNameQueryParams {
    #[serde(default)]
    pub city_name: String,
}

#[utoipa::path(
    get,
    path = "/api/city/search",
    tag = "City",
    params(SearchQueryParams),
    responses(
        (status = 200, description = "Cities ranked by relevance, at most 25", body = Vec<CityWithCountry>),
        (status = 500, description = "Server error"),
    )
)]
#[get("/search")]
pub async fn get_city_by_full_text_search(
    db: web::Data<DatabaseConnection>,
    qp: web::Query<SearchQueryParams>,
) -> ApiResult<HttpResponse> {
    debug!("City search request: query={:?}", qp.query);
    let cities = search_cities(db.get_ref(), &qp.query).await?;
    info!("City search {:?} matched {} cities", qp.query, cities.len());
    Ok(HttpResponse::Ok().json(cities))
}

#[utoipa::path(
    get,
    path = "/api/city/by-name",
    tag = "City",
    params(CityNameQueryParams),
    responses(
        (status = 200, description = "Cities whose name contains the text", body = Vec<city::Model>),
        (status = 500, description = "Server error"),
    )
)]
#[get("/by-name")]
pub async fn get_city_by_city_name(
    db: web::Data<DatabaseConnection>,
    qp: web::Query<CityNameQueryParams>,
) -> ApiResult<HttpResponse> {
    let cities = cities_by_name(db.get_ref(), &qp.city_name).await?;
    debug!("City name lookup {:?} returned {} rows", qp.city_name, cities.len());
    Ok(HttpResponse::Ok().json(cities))
}

#[utoipa::path(
    get,
    path = "/api/city/{cid}",
    tag = "City",
    params(("cid" = i64, Path, description = "City id")),
    responses(
        (status = 200, description = "The city with its country, or null", body = Option<CityWithCountry>),
        (status = 500, description = "Server error"),
    )
)]
#[get("/{cid}")]
pub async fn get_city_by_cid(
    db: web::Data<DatabaseConnection>,
    cid: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let city = city_by_cid(db.get_ref(), cid.into_inner()).await?;
    Ok(HttpResponse::Ok().json(city))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/city")
            .service(get_city_by_full_text_search)
            .service(get_city_by_city_name)
            .service(get_city_by_cid),
    );
}
