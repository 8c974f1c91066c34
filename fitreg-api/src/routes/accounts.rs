use actix_web::{get, post, web, HttpRequest, HttpResponse};
use fitreg_model::account::NewAccount;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{self, Claims},
    error::ApiError,
    state::AppState,
};

#[derive(Deserialize)]
pub struct RegisterAccount {
    pub email: String,
    #[serde(default)]
    pub username: String,
    pub password: String,
}

#[post("/accounts")]
pub async fn register_account(
    state: web::Data<AppState>,
    body: web::Json<RegisterAccount>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let account = NewAccount {
        email: body.email.trim().to_owned(),
        username: body.username,
        password: body.password,
    };
    account
        .validate()
        .map_err(|e| ApiError::InvalidInput(e.to_owned()))?;

    debug!("Registering account {}", account.email);
    let password_hash = auth::hash_password(&account.password)?;
    let account_id = state
        .accounts
        .create_account(&account.email, &account.username, &password_hash)
        .await?;

    info!("Registered account {}", account_id);
    Ok(HttpResponse::Created().json(json!({
        "message": "account registered",
        "account_id": account_id,
    })))
}

#[derive(Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[post("/sessions")]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<Login>,
) -> Result<HttpResponse, ApiError> {
    let Some(account) = state.accounts.find_by_email(body.email.trim()).await? else {
        warn!("Login attempt for unknown account");
        return Err(ApiError::InvalidInput("account not found".to_owned()));
    };

    if !auth::verify_password(&body.password, &account.password_hash)? {
        warn!("Invalid credentials for account {}", account.id);
        return Err(ApiError::InvalidInput("invalid credentials".to_owned()));
    }

    let token = state.tokens.issue(&account)?;
    info!("Account {} logged in", account.id);
    Ok(HttpResponse::Ok().json(json!({
        "message": "login successful",
        "token": token,
    })))
}

#[get("/sessions/current")]
pub async fn current_session(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<web::Json<Claims>, ApiError> {
    Ok(web::Json(state.tokens.verify_request(&req)?))
}
