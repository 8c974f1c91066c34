pub mod accounts;
pub mod photos;
pub mod profiles;

use actix_web::web;

use crate::error::ApiError;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|e, _| ApiError::InvalidInput(e.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|e, _| ApiError::InvalidInput(e.to_string()).into()),
    )
    .service(accounts::register_account)
    .service(accounts::login)
    .service(accounts::current_session)
    .service(profiles::register_profile)
    .service(profiles::latest_profile)
    .service(profiles::export_profiles)
    .service(photos::get_photo);
}
