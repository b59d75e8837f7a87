use actix_web::{get, web, HttpResponse};
use log::{debug, info, warn};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, Statement,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::database::model::hospital;
use crate::database::sql::sphere_distance;
use crate::error::{ApiError, ApiResult};

pub const MIN_RADIUS_M: f64 = 5_000.0;
pub const MAX_RADIUS_M: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, FromQueryResult)]
#[serde(rename_all = "camelCase")]
pub struct HospitalProximity {
    pub hid: i32,
    pub hospital_name: String,
    pub address: String,
    pub phone: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub cid: i64,
    /// Kilometers from the city center, truncated to 2 decimals
    pub distance: f64,
}

pub fn validate_radius(radius: f64) -> ApiResult<()> {
    if (MIN_RADIUS_M..=MAX_RADIUS_M).contains(&radius) {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "radius must be between {MIN_RADIUS_M} and {MAX_RADIUS_M} meters"
        )))
    }
}

/// Hospitals strictly within `radius` meters of the city's coordinates, nearest first.
///
/// The reported distance is truncated rather than rounded so it never exceeds
/// `radius / 1000`.
pub async fn hospitals_by_proximity<C: ConnectionTrait>(
    db: &C,
    cid: i64,
    radius: f64,
) -> ApiResult<Vec<HospitalProximity>> {
    validate_radius(radius)?;

    let distance = sphere_distance("c", "h");
    let sql = format!(
        "SELECT h.hid, h.hospital_name, h.address, h.phone, h.latitude, h.longitude, h.cid, \
         FLOOR({distance} / 10) / 100 AS distance \
         FROM hospital h, city c \
         WHERE c.cid = $1 AND {distance} < $2 \
         ORDER BY {distance}, h.hid"
    );
    let hospitals = HospitalProximity::find_by_statement(Statement::from_sql_and_values(
        db.get_database_backend(),
        sql,
        [cid.into(), radius.into()],
    ))
    .all(db)
    .await?;
    Ok(hospitals)
}

pub async fn hospitals_by_cid<C: ConnectionTrait>(db: &C, cid: i64) -> ApiResult<Vec<hospital::Model>> {
    let hospitals = hospital::Entity::find()
        .filter(hospital::Column::Cid.eq(cid))
        .order_by_asc(hospital::Column::HospitalName)
        .all(db)
        .await?;
    Ok(hospitals)
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProximityQueryParams {
    /// City id
    pub cid: i64,
    /// Search radius in meters, 5000..=100000
    pub radius: f64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CidQueryParams {
    /// City id
    pub cid: i64,
}

#[utoipa::path(
    get,
    path = "/api/hospital/proximity",
    tag = "Hospital",
    params(ProximityQueryParams),
    responses(
        (status = 200, description = "Hospitals within the radius, nearest first", body = Vec<HospitalProximity>),
        (status = 400, description = "Radius out of range"),
        (status = 500, description = "Server error"),
    )
)]
#[get("/proximity")]
pub async fn get_hospitals_by_proximity(
    db: web::Data<DatabaseConnection>,
    qp: web::Query<ProximityQueryParams>,
) -> ApiResult<HttpResponse> {
    debug!("Hospital proximity request: cid={} radius={}", qp.cid, qp.radius);
    let hospitals = hospitals_by_proximity(db.get_ref(), qp.cid, qp.radius)
        .await
        .inspect_err(|e| {
            if let ApiError::Validation(msg) = e {
                warn!("Rejected hospital proximity request: {}", msg);
            }
        })?;
    info!(
        "Hospital proximity: cid={} radius={}m found={}",
        qp.cid,
        qp.radius,
        hospitals.len()
    );
    Ok(HttpResponse::Ok().json(hospitals))
}

#[utoipa::path(
    get,
    path = "/api/hospital/by-city",
    tag = "Hospital",
    params(CidQueryParams),
    responses(
        (status = 200, description = "Hospitals registered in the city", body = Vec<hospital::Model>),
        (status = 500, description = "Server error"),
    )
)]
#[get("/by-city")]
pub async fn get_hospitals_by_cid(
    db: web::Data<DatabaseConnection>,
    qp: web::Query<CidQueryParams>,
) -> ApiResult<HttpResponse> {
    let hospitals = hospitals_by_cid(db.get_ref(), qp.cid).await?;
    Ok(HttpResponse::Ok().json(hospitals))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/hospital")
            .service(get_hospitals_by_proximity)
            .service(get_hospitals_by_cid),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    fn hospital(hid: i32, distance: f64) -> HospitalProximity {
        HospitalProximity {
            hid,
            hospital_name: format!("Hospital {hid}"),
            address: "1 Jalan Bukit Merah".to_string(),
            phone: None,
            latitude: 1.28,
            longitude: 103.83,
            cid: 1702341327,
            distance,
        }
    }

    #[::core::prelude::v1::test]
    fn radius_bounds_are_inclusive() {
        assert!(validate_radius(5_000.0).is_ok());
        assert!(validate_radius(100_000.0).is_ok());
        assert!(validate_radius(4_999.0).is_err());
        assert!(validate_radius(100_001.0).is_err());
        assert!(validate_radius(f64::NAN).is_err());
    }

    #[actix_web::test]
    async fn out_of_range_radius_never_queries() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = hospitals_by_proximity(&db, 1, 200_000.0).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(db.into_transaction_log().is_empty());
    }

    #[actix_web::test]
    async fn proximity_query_truncates_and_filters_strictly() {
        let rows = vec![
            hospital(3, 0.42),
            hospital(1, 2.5),
            hospital(2, 4.99),
        ];
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([rows
                .iter()
                .map(|h| {
                    std::collections::BTreeMap::from([
                        ("hid", Value::from(h.hid)),
                        ("hospital_name", Value::from(h.hospital_name.clone())),
                        ("address", Value::from(h.address.clone())),
                        ("phone", Value::from(h.phone.clone())),
                        ("latitude", Value::from(h.latitude)),
                        ("longitude", Value::from(h.longitude)),
                        ("cid", Value::from(h.cid)),
                        ("distance", Value::from(h.distance)),
                    ])
                })
                .collect::<Vec<_>>()])
            .into_connection();

        let found = hospitals_by_proximity(&db, 1702341327, 5_000.0).await.unwrap();
        assert_eq!(found, rows);

        let sql = format!("{:?}", db.into_transaction_log()[0]);
        assert!(sql.contains("/ 10) / 100 AS distance"));
        assert!(sql.contains("< $2"));
        assert!(sql.contains("LEAST(1.0,"));
    }

    #[actix_web::test]
    async fn endpoint_rejects_small_radius() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .configure(init_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/hospital/proximity?cid=1&radius=100")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
