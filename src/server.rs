use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use std::path::{Path, PathBuf};

use map_harvest_lib::api::{self, AppState};
use map_harvest_lib::{logger, Config};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    logger::init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let state = AppState::from_config(&config).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    let state = web::Data::new(state);

    let static_dir = config
        .server
        .static_dir
        .clone()
        .filter(|dir| Path::new(dir).is_dir());
    if let Some(dir) = &static_dir {
        log::info!("Serving frontend from {}", dir);
    }

    let allow_any_origin = config.server.allow_any_origin;
    log::info!("Starting Web Server at http://{}:{}", config.server.host, config.server.port);

    HttpServer::new(move || {
        let cors = if allow_any_origin {
            Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
        } else {
            Cors::default().allow_any_method().allow_any_header()
        };

        let app = App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(api::configure);

        match &static_dir {
            Some(dir) => app.service(actix_files::Files::new("/", dir).index_file("index.html")),
            None => app,
        }
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
