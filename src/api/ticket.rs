use actix_web::{get, post, web, HttpResponse};
use chrono::{Months, NaiveDate, NaiveDateTime};
use log::{debug, info};
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult, Set, Statement};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::database::model::ticket_buy::{self, TicketClass};
use crate::error::{ApiError, ApiResult};
use crate::seat::is_valid_seat;
use crate::session::SessionUser;

/// A purchased ticket with its flight, airports and traveler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, FromQueryResult)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub origin_iata: Option<String>,
    pub origin_airport_name: String,
    pub dest_iata: Option<String>,
    pub dest_airport_name: String,
    pub first_name: String,
    pub last_name: String,
    pub fid: i32,
    pub depart_date_time: NaiveDateTime,
    pub arrive_date_time: NaiveDateTime,
    pub price_usd: f64,
    pub class: TicketClass,
    pub seat_no: Option<String>,
}

/// `[first instant of the month, first instant of the next month)` for a `YYYY-MM` string.
pub fn month_bounds(year_month: &str) -> ApiResult<(NaiveDateTime, NaiveDateTime)> {
    let invalid = || ApiError::validation(format!("'{year_month}' is not a YYYY-MM month"));

    let ym = year_month.trim();
    if ym.len() != 7 {
        return Err(invalid());
    }
    let start = NaiveDate::parse_from_str(&format!("{ym}-01"), "%Y-%m-%d").map_err(|_| invalid())?;
    let end = start.checked_add_months(Months::new(1)).ok_or_else(invalid)?;
    Ok((start.and_time(Default::default()), end.and_time(Default::default())))
}

pub async fn tickets_by_user_and_month<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    year_month: &str,
) -> ApiResult<Vec<Ticket>> {
    let (start, end) = month_bounds(year_month)?;
    if user_id.trim().is_empty() {
        return Ok(Vec::new());
    }

    let tickets = Ticket::find_by_statement(Statement::from_sql_and_values(
        db.get_database_backend(),
        "SELECT ao.iata AS origin_iata, ao.airport_name AS origin_airport_name, \
         ad.iata AS dest_iata, ad.airport_name AS dest_airport_name, \
         p.first_name, p.last_name, f.fid, f.depart_date_time, f.arrive_date_time, f.price_usd, \
         tb.class, tb.seat_no \
         FROM ticket_buy tb \
         JOIN flight f ON tb.fid = f.fid \
         JOIN airport ao ON f.origin_airport = ao.icao \
         JOIN airport ad ON f.dest_airport = ad.icao \
         JOIN passenger p ON tb.pid = p.pid \
         WHERE tb.uid = $1 AND f.depart_date_time >= $2 AND f.depart_date_time < $3 \
         ORDER BY f.depart_date_time",
        [user_id.into(), start.into(), end.into()],
    ))
    .all(db)
    .await?;
    Ok(tickets)
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    pub pid: i32,
    pub fid: i32,
    pub class: TicketClass,
    /// Assigned later by the seat allocation job when absent
    pub seat_no: Option<String>,
}

/// Records a ticket purchase for `user_id`. A second purchase for the same user, passenger and
/// flight conflicts.
pub async fn buy_ticket<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    ticket: NewTicket,
) -> ApiResult<ticket_buy::Model> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::validation("userId is required"));
    }
    let seat_no = match ticket.seat_no.as_deref().map(str::trim) {
        Some(seat) if !is_valid_seat(seat) => {
            return Err(ApiError::validation(format!("'{seat}' is not a seat")));
        }
        Some(seat) => Some(seat.to_string()),
        None => None,
    };

    let model = ticket_buy::Model {
        uid: user_id.to_string(),
        pid: ticket.pid,
        fid: ticket.fid,
        seat_no,
        class: ticket.class,
    };
    ticket_buy::Entity::insert(ticket_buy::ActiveModel {
        uid: Set(model.uid.clone()),
        pid: Set(model.pid),
        fid: Set(model.fid),
        seat_no: Set(model.seat_no.clone()),
        class: Set(model.class),
    })
    .exec_without_returning(db)
    .await
    .map_err(|e| ApiError::from_insert(e, "ticket"))?;

    Ok(model)
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TicketQueryParams {
    pub user_id: String,
    /// Departure month, YYYY-MM
    pub year_month: String,
}

#[utoipa::path(
    get,
    path = "/api/ticket",
    tag = "Ticket",
    params(TicketQueryParams),
    responses(
        (status = 200, description = "Tickets departing in the month, earliest first", body = Vec<Ticket>),
        (status = 400, description = "Malformed month"),
        (status = 500, description = "Server error"),
    )
)]
#[get("")]
pub async fn get_ticket_by_user_id_and_year_month(
    db: web::Data<DatabaseConnection>,
    qp: web::Query<TicketQueryParams>,
) -> ApiResult<HttpResponse> {
    let tickets = tickets_by_user_and_month(db.get_ref(), &qp.user_id, &qp.year_month).await?;
    debug!("Tickets for {} in {}: {}", qp.user_id, qp.year_month, tickets.len());
    Ok(HttpResponse::Ok().json(tickets))
}

#[utoipa::path(
    post,
    path = "/api/ticket",
    tag = "Ticket",
    request_body = NewTicket,
    params(("x-user-id" = String, Header, description = "Signed-in user the ticket is charged to")),
    responses(
        (status = 201, description = "Ticket purchased", body = ticket_buy::Model),
        (status = 400, description = "Malformed ticket"),
        (status = 401, description = "No signed-in user"),
        (status = 409, description = "Passenger already holds a ticket for this flight"),
        (status = 500, description = "Server error"),
    )
)]
#[post("")]
pub async fn post_ticket(
    SessionUser(user_id): SessionUser,
    db: web::Data<DatabaseConnection>,
    req: web::Json<NewTicket>,
) -> ApiResult<HttpResponse> {
    let ticket = buy_ticket(db.get_ref(), &user_id, req.into_inner()).await?;
    info!("Ticket bought: uid={} pid={} fid={}", ticket.uid, ticket.pid, ticket.fid);
    Ok(HttpResponse::Created().json(ticket))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/ticket")
            .service(get_ticket_by_user_id_and_year_month)
            .service(post_ticket),
    );
}
