use actix_web::{web, Error, HttpRequest, HttpResponse};
use chrono::Datelike;
use log::{debug, warn};
use minijinja::context;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::api::city::city_by_cid;
use crate::api::covid::{latest_entry, peak_month, FIRST_YEAR};
use crate::api::forex::{forex_by_date, RateSource};
use crate::api::hospital::{hospitals_by_proximity, MAX_RADIUS_M, MIN_RADIUS_M};
use crate::api::travel::{airports_by_cid, flights_from};
use crate::config::Config;
use crate::templates::render_template;

use super::flights::with_durations;

const DEFAULT_RADIUS_KM: u32 = 5;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Hospital search radius in kilometers
    pub radius: Option<u32>,
    pub year: Option<i32>,
}

/// Slider value in km, kept inside the range the hospital search accepts.
pub fn clamp_radius_km(radius: Option<u32>) -> u32 {
    let min = (MIN_RADIUS_M / 1000.0) as u32;
    let max = (MAX_RADIUS_M / 1000.0) as u32;
    radius.unwrap_or(DEFAULT_RADIUS_KM).clamp(min, max)
}

/// Selected covid year, defaulting to and capped at `latest`.
pub fn pick_year(requested: Option<i32>, latest: i32) -> i32 {
    let latest = latest.max(FIRST_YEAR);
    requested.unwrap_or(latest).clamp(FIRST_YEAR, latest)
}

pub async fn city_dashboard(
    req: HttpRequest,
    path: web::Path<i64>,
    qp: web::Query<DashboardQuery>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    rates: web::Data<dyn RateSource>,
) -> Result<HttpResponse, Error> {
    let cid = path.into_inner();
    let db = db.get_ref();

    let Some(city) = city_by_cid(db, cid).await? else {
        return super::not_found(req).await;
    };

    let radius_km = clamp_radius_km(qp.radius);
    let (latest, hospitals, airports) = tokio::join!(
        latest_entry(db, &city.alpha3),
        hospitals_by_proximity(db, cid, f64::from(radius_km) * 1000.0),
        airports_by_cid(db, cid),
    );
    let latest = latest?;
    let hospitals = hospitals?;
    let airports = airports?;

    let latest_year = latest
        .as_ref()
        .map(|e| e.entry_date.year())
        .unwrap_or_else(|| config.today().year());
    let year = pick_year(qp.year, latest_year);
    let years: Vec<i32> = (FIRST_YEAR..=latest_year.max(FIRST_YEAR)).collect();

    let now = config.now();
    let home = config.home_airport.as_str();
    let destination = airports.iter().find(|a| a.icao != home);
    let forex = async {
        match city.currency.as_deref() {
            Some(against) => forex_by_date(db, rates.get_ref(), now.date(), &config.home_currency, against).await,
            None => Ok(None),
        }
    };
    let flights = async {
        match destination {
            Some(airport) => flights_from(db, home, &airport.icao, now).await,
            None => Ok(Vec::new()),
        }
    };
    let (peak, forex, flights) = tokio::join!(peak_month(db, &city.alpha3, year), forex, flights);
    let peak = peak?;
    let forex = forex.unwrap_or_else(|e| {
        warn!("Dashboard forex for {} skipped: {}", city.city_name, e);
        None
    });
    let flights = with_durations(flights?);

    debug!(
        "Dashboard {}: {} hospitals within {}km, {} airports, {} flights",
        city.city_name,
        hospitals.len(),
        radius_km,
        airports.len(),
        flights.len()
    );

    let page = render_template(
        "city",
        context! {
            title => city.city_name.clone(),
            city,
            latest,
            peak,
            year,
            years,
            radius_km,
            hospitals,
            airports,
            destination,
            home_airport => home,
            flights,
            forex,
            home_currency => config.home_currency.clone(),
            today => now.date(),
        },
    )?;
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_is_clamped_to_slider_range() {
        assert_eq!(clamp_radius_km(None), 5);
        assert_eq!(clamp_radius_km(Some(1)), 5);
        assert_eq!(clamp_radius_km(Some(42)), 42);
        assert_eq!(clamp_radius_km(Some(500)), 100);
    }

    #[test]
    fn year_defaults_to_latest() {
        assert_eq!(pick_year(None, 2022), 2022);
        assert_eq!(pick_year(Some(2021), 2022), 2021);
        assert_eq!(pick_year(Some(2019), 2022), 2020);
        assert_eq!(pick_year(Some(2030), 2022), 2022);
        assert_eq!(pick_year(None, 2018), 2020);
    }

    #[actix_web::test]
    async fn hospital_map_gets_city_centre_and_markers() {
        let resp = render_template(
            "city",
            context! {
                title => "Singapore",
                city => context! {
                    cid => 1702341327_i64,
                    cityName => "Singapore",
                    countryName => "Singapore",
                    alpha3 => "SGP",
                    latitude => 1.3521,
                    longitude => 103.8198,
                },
                years => vec![2022],
                year => 2022,
                radius_km => 5,
                hospitals => vec![context! {
                    hospitalName => "Outram Clinic",
                    address => "1 Hospital Drive",
                    latitude => 1.2795,
                    longitude => 103.8342,
                    distance => 1.11,
                }],
            },
        )
        .unwrap();
        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let html = String::from_utf8_lossy(&body);

        assert!(html.contains("leaflet.js"));
        assert!(html.contains(r#"id="hospital-map" data-lat="1.3521" data-lon="103.8198""#));
        assert!(html.contains(r#"data-lat="1.2795" data-lon="103.8342" data-name="Outram Clinic""#));
        assert!(html.contains(r#"data-distance="1.11""#));
    }
}
