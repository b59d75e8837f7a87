use actix_web::http::StatusCode;
use actix_web::{web, Error, HttpResponse};
use log::{debug, warn};
use minijinja::context;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::api::ticket::tickets_by_user_and_month;
use crate::config::Config;
use crate::error::ApiError;
use crate::session::SessionUser;
use crate::templates::render_with_status;

#[derive(Debug, Deserialize)]
pub struct TicketsQuery {
    /// YYYY-MM, defaults to the current month
    pub month: Option<String>,
}

pub async fn tickets(
    user: Option<SessionUser>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    qp: web::Query<TicketsQuery>,
) -> Result<HttpResponse, Error> {
    let Some(SessionUser(user_id)) = user else {
        return render_with_status(
            StatusCode::UNAUTHORIZED,
            "401",
            context! {
                title => "Sign in required",
                message => "Sign in to see the tickets you bought.",
            },
        );
    };

    let month = qp
        .month
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| config.today().format("%Y-%m").to_string());

    let (tickets, error, status) = match tickets_by_user_and_month(db.get_ref(), &user_id, &month).await {
        Ok(tickets) => (tickets, None, StatusCode::OK),
        Err(ApiError::Validation(msg)) => {
            warn!("Rejected tickets month {:?}: {}", month, msg);
            (Vec::new(), Some(msg), StatusCode::BAD_REQUEST)
        }
        Err(e) => return Err(e.into()),
    };
    debug!("Tickets page for {} in {}: {}", user_id, month, tickets.len());

    render_with_status(
        status,
        "tickets",
        context! {
            title => "My tickets",
            month,
            tickets,
            error,
        },
    )
}
