use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, App, HttpServer};
use log::info;

use taskdesk::config::Config;
use taskdesk::email::LogMailer;
use taskdesk::store::PgStore;
use taskdesk::AppState;

fn to_io_error<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> io::Error {
    move |e| io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(to_io_error("invalid configuration"))?;

    let store = PgStore::connect(&config.database_url)
        .await
        .map_err(to_io_error("failed to connect to database"))?;
    store
        .migrate()
        .await
        .map_err(to_io_error("failed to run migrations"))?;

    let state = AppState::new(&config, Arc::new(store), Arc::new(LogMailer));

    info!("Starting Taskdesk server at {}", config.server_url());
    HttpServer::new(move || {
        let state = state.clone();
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .configure(move |cfg| state.configure(cfg))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
