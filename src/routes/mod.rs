mod city;
mod flights;
mod index;
mod not_found;
mod tickets;

pub use city::city_dashboard;
pub use flights::flights;
pub use index::index;
pub use not_found::not_found;
pub use tickets::tickets;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use actix_web::{http::StatusCode, test, web, App};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn config() -> Config {
        Config {
            database_url: "postgres://localhost/travel".to_string(),
            bind_addr: "127.0.0.1:8080".parse().unwrap(),
            forex_api_url: "http://localhost".to_string(),
            forex_api_key: None,
            static_dir: "web/static".to_string(),
            timezone: chrono_tz::Asia::Singapore,
            home_airport: "WSSS".to_string(),
            home_currency: "SGD".to_string(),
        }
    }

    #[actix_web::test]
    async fn unknown_paths_render_404_page() {
        let app = test::init_service(App::new().default_service(web::route().to(not_found))).await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/nowhere").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = test::read_body(resp).await;
        assert!(String::from_utf8_lossy(&body).contains("Page not found"));
    }

    #[actix_web::test]
    async fn tickets_page_requires_session() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(config()))
                .route("/tickets", web::get().to(tickets)),
        )
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/tickets").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn flights_page_reports_bad_airport_codes() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(config()))
                .route("/flights", web::get().to(flights)),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/flights?from=SIN&to=ZBAA&depart=2022-10-05&return=")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = test::read_body(resp).await;
        assert!(String::from_utf8_lossy(&body).contains("not an ICAO airport code"));
    }
}
