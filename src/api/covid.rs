use actix_web::{get, web, HttpResponse};
use log::debug;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, Statement,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::database::model::covid;
use crate::error::{ApiError, ApiResult};

/// First year with reported cases.
pub const FIRST_YEAR: i32 = 2020;

/// Month with the highest average of daily new cases in a year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, FromQueryResult)]
#[serde(rename_all = "camelCase")]
pub struct CovidHistory {
    /// English month name, e.g. "January"
    pub month: String,
    pub daily_average: f64,
}

/// Upper-cased alpha-3 code, `None` when blank.
pub fn normalize_alpha3(alpha3: &str) -> ApiResult<Option<String>> {
    let code = alpha3.trim();
    if code.chars().count() > 3 {
        return Err(ApiError::validation("alpha3 must be at most 3 characters"));
    }
    if code.is_empty() {
        return Ok(None);
    }
    Ok(Some(code.to_uppercase()))
}

pub async fn latest_entry<C: ConnectionTrait>(db: &C, alpha3: &str) -> ApiResult<Option<covid::Model>> {
    let Some(alpha3) = normalize_alpha3(alpha3)? else {
        return Ok(None);
    };

    let entry = covid::Entity::find()
        .filter(covid::Column::Alpha3.eq(alpha3))
        .order_by_desc(covid::Column::EntryDate)
        .one(db)
        .await?;
    Ok(entry)
}

/// Ties on the average go to the earlier month.
pub async fn peak_month<C: ConnectionTrait>(
    db: &C,
    alpha3: &str,
    year: i32,
) -> ApiResult<Option<CovidHistory>> {
    if year < FIRST_YEAR {
        return Err(ApiError::validation(format!("year must be {FIRST_YEAR} or later")));
    }
    let Some(alpha3) = normalize_alpha3(alpha3)? else {
        return Ok(None);
    };

    let history = CovidHistory::find_by_statement(Statement::from_sql_and_values(
        db.get_database_backend(),
        "SELECT TRIM(TO_CHAR(c.entry_date, 'Month')) AS month, \
         ROUND(AVG(c.new_case_no))::float8 AS daily_average \
         FROM covid c JOIN country n ON n.alpha3 = c.alpha3 \
         WHERE n.alpha3 = $1 AND EXTRACT(YEAR FROM c.entry_date) = $2 \
         GROUP BY EXTRACT(MONTH FROM c.entry_date), TRIM(TO_CHAR(c.entry_date, 'Month')) \
         ORDER BY AVG(c.new_case_no) DESC, EXTRACT(MONTH FROM c.entry_date) \
         LIMIT 1",
        [alpha3.into(), year.into()],
    ))
    .one(db)
    .await?;
    Ok(history)
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LatestQueryParams {
    /// ISO alpha-3 country code
    #[serde(default)]
    pub alpha3: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeakMonthQueryParams {
    /// ISO alpha-3 country code
    #[serde(default)]
    pub alpha3: String,
    /// Calendar year, 2020 or later
    pub year: i32,
}

#[utoipa::path(
    get,
    path = "/api/covid/latest",
    tag = "Covid",
    params(LatestQueryParams),
    responses(
        (status = 200, description = "Most recent daily entry, or null", body = Option<covid::Model>),
        (status = 400, description = "Malformed country code"),
        (status = 500, description = "Server error"),
    )
)]
#[get("/latest")]
pub async fn get_latest_entry_by_alpha3(
    db: web::Data<DatabaseConnection>,
    qp: web::Query<LatestQueryParams>,
) -> ApiResult<HttpResponse> {
    let entry = latest_entry(db.get_ref(), &qp.alpha3).await?;
    debug!("Latest covid entry for {:?}: {:?}", qp.alpha3, entry.as_ref().map(|e| e.entry_date));
    Ok(HttpResponse::Ok().json(entry))
}

#[utoipa::path(
    get,
    path = "/api/covid/peak-month",
    tag = "Covid",
    params(PeakMonthQueryParams),
    responses(
        (status = 200, description = "Month with the highest daily average, or null", body = Option<CovidHistory>),
        (status = 400, description = "Malformed country code or year"),
        (status = 500, description = "Server error"),
    )
)]
#[get("/peak-month")]
pub async fn get_month_with_highest_new_cases_by_year(
    db: web::Data<DatabaseConnection>,
    qp: web::Query<PeakMonthQueryParams>,
) -> ApiResult<HttpResponse> {
    let history = peak_month(db.get_ref(), &qp.alpha3, qp.year).await?;
    Ok(HttpResponse::Ok().json(history))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/covid")
            .service(get_latest_entry_by_alpha3)
            .service(get_month_with_highest_new_cases_by_year),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::collections::BTreeMap;

    #[::core::prelude::v1::test]
    fn alpha3_normalization() {
        assert_eq!(normalize_alpha3("sgp").unwrap().as_deref(), Some("SGP"));
        assert_eq!(normalize_alpha3("  ").unwrap(), None);
        assert!(normalize_alpha3("SGPX").is_err());
    }

    #[actix_web::test]
    async fn latest_entry_is_most_recent() {
        let newest = covid::Model {
            alpha3: "SGP".to_string(),
            entry_date: NaiveDate::from_ymd_opt(2022, 10, 31).unwrap(),
            new_case_no: 1_873,
            total_case_no: 2_066_153,
            new_death_no: 2,
            total_death_no: 1_657,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![newest.clone()]])
            .into_connection();

        assert_eq!(latest_entry(&db, "sgp").await.unwrap(), Some(newest));
        let stmt = format!("{:?}", db.into_transaction_log()[0]);
        assert!(stmt.contains("entry_date"));
        assert!(stmt.contains("DESC"));
    }

    #[actix_web::test]
    async fn blank_country_is_null_without_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        assert_eq!(latest_entry(&db, "").await.unwrap(), None);
        assert_eq!(peak_month(&db, "", 2021).await.unwrap(), None);
        assert!(db.into_transaction_log().is_empty());
    }

    #[actix_web::test]
    async fn peak_month_picks_top_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![BTreeMap::from([
                ("month", Value::from("March")),
                ("daily_average", Value::from(15_023.0)),
            ])]])
            .into_connection();

        let peak = peak_month(&db, "SGP", 2022).await.unwrap().unwrap();
        assert_eq!(
            peak,
            CovidHistory {
                month: "March".to_string(),
                daily_average: 15_023.0
            }
        );

        let stmt = format!("{:?}", db.into_transaction_log()[0]);
        assert!(stmt.contains("ORDER BY AVG(c.new_case_no) DESC, EXTRACT(MONTH FROM c.entry_date)"));
        assert!(stmt.contains("LIMIT 1"));
    }

    #[actix_web::test]
    async fn no_data_for_year_is_null() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
            .into_connection();
        assert_eq!(peak_month(&db, "SGP", 2021).await.unwrap(), None);
    }

    #[actix_web::test]
    async fn years_before_2020_are_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .configure(init_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/covid/peak-month?alpha3=SGP&year=2019")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
