use actix_cors::Cors;
use actix_files as fs;
use actix_web::{web, App, HttpServer, middleware};
use clap::Parser;
use env_logger::Env;
use log::{error, info};
use dotenvy::dotenv;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::io;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use travelscope::api::forex::{ExchangeRateHost, RateSource};
use travelscope::api::{self, city, covid, forex, hospital, ticket, travel};
use travelscope::config::{Args, Command, Config};
use travelscope::{migration, routes, seed};

fn fatal<E: std::fmt::Display>(what: &'static str) -> impl FnOnce(E) -> io::Error {
    move |e| {
        error!("{}: {}", what, e);
        io::Error::other(format!("{what}: {e}"))
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables from .env if present
    dotenv().ok();

    // Initialize logger (RUST_LOG overrides default if set)
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.config;

    let db = Database::connect(&config.database_url)
        .await
        .map_err(fatal("Failed to connect to database"))?;

    // Run pending migrations (idempotent)
    migration::Migrator::up(&db, None)
        .await
        .map_err(fatal("Failed to run database migrations"))?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(db, config).await,
        Command::Migrate => {
            info!("Migrations applied");
            Ok(())
        }
        Command::Seed { seed, task } => {
            let mut rng = seed::rng(seed);
            seed::run(&db, task, &mut rng)
                .await
                .map_err(fatal("Seeding failed"))
        }
    }
}

async fn serve(db: DatabaseConnection, config: Config) -> io::Result<()> {
    let rates: Arc<dyn RateSource> = Arc::new(ExchangeRateHost::new(
        config.forex_api_url.clone(),
        config.forex_api_key.clone(),
    ));
    let rates = web::Data::from(rates);
    let bind_addr = config.bind_addr;
    let static_dir = config.static_dir.clone();
    let config = web::Data::new(config);
    let db = web::Data::new(db);

    info!("Server running at http://{}", bind_addr);
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Compress::default())
            // Log each incoming request with status, time, and size
            .wrap(middleware::Logger::new("%a \"%r\" %s %b %T"))
            // Share DB connection pool with handlers
            .app_data(db.clone())
            .app_data(config.clone())
            .app_data(rates.clone())
            .service(
                fs::Files::new("/static", &static_dir)
                    .prefer_utf8(true)
                    .use_etag(true)
                    .use_last_modified(true)
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", api::openapi::ApiDoc::openapi()),
            )
            .route("/", web::get().to(routes::index))
            .route("/city/{cid}", web::get().to(routes::city_dashboard))
            .route("/flights", web::get().to(routes::flights))
            .route("/tickets", web::get().to(routes::tickets))
            .service(web::scope("/api")
                .wrap(Cors::permissive())
                .wrap(middleware::NormalizePath::trim())
                .configure(city::init_routes)
                .configure(hospital::init_routes)
                .configure(travel::init_routes)
                .configure(covid::init_routes)
                .configure(forex::init_routes)
                .configure(ticket::init_routes)
            )
            .default_service(web::route().to(routes::not_found))
    })
    .bind(bind_addr)?
    .run()
    .await
}
