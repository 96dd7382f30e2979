pub mod application;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

/// Runtime configuration shared with the handlers.
#[derive(Clone)]
pub struct AppConfig {
    /// When set, an admin copy of every order/registration notification is
    /// queued alongside the customer's.
    pub admin_email: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::catalog::create_product,
        handlers::catalog::create_variant,
        handlers::catalog::get_product,
        handlers::catalog::list_products,
        handlers::orders::create_order,
        handlers::orders::get_order,
        handlers::orders::list_orders,
        handlers::events::create_event,
        handlers::events::get_event,
        handlers::events::list_events,
        handlers::events::register,
        handlers::events::list_registrations,
    ),
    components(schemas(
        handlers::catalog::CreateProductRequest,
        handlers::catalog::CreateVariantRequest,
        handlers::catalog::ProductResponse,
        handlers::catalog::VariantResponse,
        handlers::catalog::ListProductsResponse,
        handlers::orders::AddressDto,
        handlers::orders::CheckoutLineRequest,
        handlers::orders::CheckoutRequest,
        handlers::orders::OrderLineResponse,
        handlers::orders::OrderResponse,
        handlers::orders::ListOrdersResponse,
        handlers::events::CreateEventRequest,
        handlers::events::RegisterRequest,
        handlers::events::EventResponse,
        handlers::events::RegistrationResponse,
        handlers::events::ListEventsResponse,
    ))
)]
struct ApiDoc;

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    config: AppConfig,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config.clone()))
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
            .service(
                web::scope("/products")
                    .route("", web::post().to(handlers::catalog::create_product))
                    .route("", web::get().to(handlers::catalog::list_products))
                    .route("/{id}", web::get().to(handlers::catalog::get_product))
                    .route("/{id}/variants", web::post().to(handlers::catalog::create_variant)),
            )
            .service(
                web::scope("/orders")
                    .route("", web::post().to(handlers::orders::create_order))
                    .route("", web::get().to(handlers::orders::list_orders))
                    .route("/{id}", web::get().to(handlers::orders::get_order)),
            )
            .service(
                web::scope("/events")
                    .route("", web::post().to(handlers::events::create_event))
                    .route("", web::get().to(handlers::events::list_events))
                    .route("/{id}", web::get().to(handlers::events::get_event))
                    .route(
                        "/{id}/registrations",
                        web::post().to(handlers::events::register),
                    )
                    .route(
                        "/{id}/registrations",
                        web::get().to(handlers::events::list_registrations),
                    ),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
