use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Error, HttpRequest};
use log::debug;
use minijinja::context;

pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, Error> {
    debug!("No page for {}", req.path());
    crate::templates::render_with_status(
        StatusCode::NOT_FOUND,
        "404",
        context! {
            title => "Page not found",
            message => "The page you are looking for has departed or never existed.",
        },
    )
}
