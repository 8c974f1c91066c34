use std::{error::Error, sync::Arc};

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use fitreg_api::{
    auth::TokenIssuer,
    config::{Config, PhotoStorage},
    AppState,
};
use fitreg_db::{
    account::AccountRepositoryImpl,
    connection::Connection,
    photo::{DirectoryPhotoStore, PhotoStore, SqlitePhotoStore},
    profile::ProfileRepositoryImpl,
};
use log::info;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
    log4rs::init_file("log4rs.yml", Default::default())?;

    let config = Config::load()?;

    info!("Connecting to database");
    let conn = Connection::establish(&config.database_url).await?;

    let photos: Arc<dyn PhotoStore> = match config.photo_storage {
        PhotoStorage::Directory => Arc::new(DirectoryPhotoStore::open(&config.photo_dir).await?),
        PhotoStorage::Database => {
            info!("Storing photos in database");
            Arc::new(SqlitePhotoStore::new(conn.clone()))
        }
    };
    let state = web::Data::new(
        AppState::new(
            Arc::new(AccountRepositoryImpl::new(conn.clone())),
            Arc::new(ProfileRepositoryImpl::new(conn.clone())),
            photos,
            TokenIssuer::new(&config.jwt_secret, config.token_ttl),
        )
        .with_export_dir(config.export_dir.clone()),
    );

    info!("Listening on {}:{}", config.bind_address, config.port);
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(fitreg_api::configure)
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
