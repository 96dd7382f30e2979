use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use shop_service::infrastructure::{LogMailer, OutboxDispatcher};
use shop_service::{build_server, create_pool, run_migrations, AppConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .expect("PORT must be a valid number");
    let admin_email = env::var("ADMIN_EMAIL").ok().filter(|s| !s.trim().is_empty());
    let poll_secs: u64 = env::var("OUTBOX_POLL_SECS")
        .unwrap_or_else(|_| "5".to_string())
        .parse()
        .expect("OUTBOX_POLL_SECS must be a valid number");

    let pool = create_pool(&database_url);
    run_migrations(&pool);

    let dispatcher = OutboxDispatcher::new(pool.clone(), LogMailer);
    std::thread::spawn(move || dispatcher.run(Duration::from_secs(poll_secs)));

    log::info!("Starting server at http://{}:{}", host, port);

    build_server(pool, AppConfig { admin_email }, &host, port)?.await
}
