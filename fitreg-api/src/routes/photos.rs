use actix_web::{get, web, HttpResponse};

use crate::{error::ApiError, state::AppState};

#[get("/photos/{key}")]
pub async fn get_photo(
    state: web::Data<AppState>,
    key: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let photo = state
        .photos
        .fetch(&key)
        .await?
        .ok_or(ApiError::NotFound("photo not found"))?;

    Ok(HttpResponse::Ok()
        .content_type(photo.format.content_type())
        .body(photo.data))
}
