use actix_web::http::StatusCode;
use actix_web::{web, Error, HttpResponse};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, warn};
use minijinja::context;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::api::travel::{flights_on_date, FlightTicket};
use crate::config::Config;
use crate::error::ApiError;
use crate::templates::render_with_status;

/// Raw form fields; empty inputs arrive as empty strings.
#[derive(Debug, Deserialize)]
pub struct FlightSearch {
    /// Origin ICAO
    pub from: Option<String>,
    /// Destination ICAO
    pub to: Option<String>,
    pub depart: Option<String>,
    #[serde(rename = "return")]
    pub return_date: Option<String>,
}

fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// `None` for a blank field, an error message for a malformed date.
pub fn parse_form_date(field: &Option<String>) -> Result<Option<NaiveDate>, String> {
    non_blank(field)
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("'{s}' is not a YYYY-MM-DD date")))
        .transpose()
}

#[derive(Debug, Serialize)]
pub struct FlightRow {
    #[serde(flatten)]
    pub flight: FlightTicket,
    pub duration: String,
}

/// Flight time as `"Xh MM"`, e.g. `"6h 05"`.
pub fn flight_duration(depart: NaiveDateTime, arrive: NaiveDateTime) -> String {
    let minutes = (arrive - depart).num_minutes().max(0);
    format!("{}h {:02}", minutes / 60, minutes % 60)
}

pub fn with_durations(flights: Vec<FlightTicket>) -> Vec<FlightRow> {
    flights
        .into_iter()
        .map(|flight| FlightRow {
            duration: flight_duration(flight.depart_date_time, flight.arrive_date_time),
            flight,
        })
        .collect()
}

async fn search_round_trip(
    db: &DatabaseConnection,
    from: &str,
    to: &str,
    depart: NaiveDate,
    return_date: Option<NaiveDate>,
) -> Result<(Vec<FlightTicket>, Vec<FlightTicket>), ApiError> {
    let outbound = flights_on_date(db, from, to, depart).await?;
    let inbound = match return_date {
        Some(back) => flights_on_date(db, to, from, back).await?,
        None => Vec::new(),
    };
    Ok((outbound, inbound))
}

pub async fn flights(
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    qp: web::Query<FlightSearch>,
) -> Result<HttpResponse, Error> {
    let search = qp.into_inner();
    let from = non_blank(&search.from);
    let to = non_blank(&search.to);

    let mut outbound = Vec::new();
    let mut inbound = Vec::new();
    let mut error = None;

    let dates = parse_form_date(&search.depart).and_then(|d| Ok((d, parse_form_date(&search.return_date)?)));
    match dates {
        Ok((Some(depart), return_date)) => {
            if let (Some(from), Some(to)) = (from, to) {
                debug!("Flight search {} -> {} on {} (return {:?})", from, to, depart, return_date);
                match search_round_trip(db.get_ref(), from, to, depart, return_date).await {
                    Ok((out, back)) => {
                        outbound = out;
                        inbound = back;
                    }
                    Err(ApiError::Validation(msg)) => error = Some(msg),
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok((None, _)) => {}
        Err(msg) => error = Some(msg),
    }
    if let Some(msg) = &error {
        warn!("Rejected flight search: {}", msg);
    }

    let status = if error.is_some() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    render_with_status(
        status,
        "flights",
        context! {
            title => "Flights",
            search => context! {
                from => from.unwrap_or(config.home_airport.as_str()),
                to => to.unwrap_or_default(),
                depart => non_blank(&search.depart),
                return_date => non_blank(&search.return_date),
            },
            today => config.today(),
            outbound => with_durations(outbound),
            inbound => with_durations(inbound),
            error,
        },
    )
}
