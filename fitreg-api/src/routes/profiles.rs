use std::{collections::HashMap, path::Path};

use actix_multipart::Multipart;
use actix_web::{get, http::header, post, web, HttpResponse};
use fitreg_model::{
    photo::NewPhoto,
    profile::{self, NewProfile, Profile, ProfileDetails},
};
use futures_util::TryStreamExt;
use log::{debug, error, info, warn};
use serde::Deserialize;

use crate::{
    error::ApiError,
    export::{self, ALL_PROFILES_FILE},
    state::AppState,
};

const PHOTO_FIELD: &str = "photo";

pub const MAX_TEXT_FIELD_BYTES: usize = 4 * 1024;
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_FORM_BYTES: usize = MAX_PHOTO_BYTES + 64 * 1024;

/// File part of a submission, as uploaded.
struct PhotoPart {
    file_name: Option<String>,
    content_type: String,
    data: Vec<u8>,
}

impl PhotoPart {
    fn into_photo(self) -> Result<NewPhoto, ApiError> {
        Ok(NewPhoto {
            file_name: self.file_name,
            format: self.content_type.parse()?,
            data: self.data,
        })
    }
}

/// Text fields and the optional photo of a profile submission.
struct ProfileForm {
    fields: HashMap<String, String>,
    photo: Option<PhotoPart>,
}

impl ProfileForm {
    async fn read(mut payload: Multipart) -> Result<Self, ApiError> {
        let mut fields = HashMap::new();
        let mut photo = None;
        let mut total = 0;

        while let Some(mut field) = payload.try_next().await? {
            let name = field.name().unwrap_or_default().to_owned();
            let content_type = field.content_type().map(|mime| mime.essence_str().to_owned());
            let file_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_owned);

            let limit = if name == PHOTO_FIELD {
                MAX_PHOTO_BYTES
            } else {
                MAX_TEXT_FIELD_BYTES
            };
            let mut data = Vec::new();
            while let Some(chunk) = field.try_next().await? {
                total += chunk.len();
                if total > MAX_FORM_BYTES {
                    return Err(ApiError::PayloadTooLarge(format!(
                        "form exceeds {} bytes",
                        MAX_FORM_BYTES
                    )));
                }
                if data.len() + chunk.len() > limit {
                    return Err(ApiError::PayloadTooLarge(format!(
                        "{} exceeds {} bytes",
                        name, limit
                    )));
                }
                data.extend_from_slice(&chunk);
            }

            if name == PHOTO_FIELD {
                // Browsers send an empty part when no file was picked.
                if data.is_empty() {
                    continue;
                }
                photo = Some(PhotoPart {
                    file_name,
                    content_type: content_type.unwrap_or_default(),
                    data,
                });
            } else {
                let value = String::from_utf8(data)
                    .map_err(|_| ApiError::InvalidInput(format!("{} is not valid text", name)))?;
                fields.insert(name, value);
            }
        }

        Ok(Self { fields, photo })
    }

    fn text(&self, name: &str) -> Result<String, ApiError> {
        self.fields
            .get(name)
            .map(|value| value.trim().to_owned())
            .ok_or_else(|| ApiError::InvalidInput(format!("missing field {}", name)))
    }

    fn number(&self, name: &str) -> Result<f64, ApiError> {
        let value = self.text(name)?;
        value
            .parse()
            .map_err(|_| ApiError::InvalidInput(format!("{} is not a number: {}", name, value)))
    }

    fn into_profile(self) -> Result<(NewProfile, Option<PhotoPart>), ApiError> {
        let birth_date = self.text("birth_date")?;
        let details = ProfileDetails {
            first_name: self.text("first_name")?,
            last_name: self.text("last_name")?,
            weight_kg: self.number("weight_kg")?,
            height_cm: self.number("height_cm")?,
            birth_date: profile::parse_birth_date(&birth_date).map_err(|e| {
                ApiError::InvalidInput(format!("invalid birth_date {}: {}", birth_date, e))
            })?,
            sex: self.text("sex")?.parse()?,
            activity_level: self.text("activity_level")?,
            goal: self.text("goal")?,
            exercise_frequency: self.text("exercise_frequency")?,
        };
        let email = self.text("email")?;

        Ok((NewProfile { email, details }, self.photo))
    }
}

#[post("/profiles")]
pub async fn register_profile(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let (new_profile, photo) = ProfileForm::read(payload).await?.into_profile()?;
    let metrics = new_profile.details.evaluate()?;
    debug!("Computed {} for {}", metrics, new_profile.email);

    let Some(account) = state.accounts.find_by_email(&new_profile.email).await? else {
        return Err(ApiError::NotFound("account not found"));
    };

    let photo = match photo {
        Some(part) => Some(state.photos.store(part.into_photo()?).await?),
        None => None,
    };

    let profile = match state
        .profiles
        .store_profile(account.id, new_profile.details, metrics, photo.clone())
        .await
    {
        Ok(profile) => profile,
        Err(e) => {
            if let Some(key) = &photo {
                discard_photo(&state, key).await;
            }
            return Err(e.into());
        }
    };
    info!(
        "Registered profile {} for account {}",
        profile.id, profile.account_id
    );

    if let Some(directory) = &state.export_dir {
        export_snapshots(&state, directory, &profile).await;
    }

    Ok(HttpResponse::Created().json(profile))
}

async fn discard_photo(state: &AppState, key: &str) {
    if let Err(e) = state.photos.delete(key).await {
        warn!("Failed to remove orphaned photo {}: {}", key, e);
    }
}

/// Refreshes the CSV snapshots. The profile is already stored at this point,
/// so failures are only logged.
async fn export_snapshots(state: &AppState, directory: &Path, latest: &Profile) {
    let result = match state.profiles.fetch_profiles().await {
        Ok(all) => export::write_snapshots(directory, latest, &all)
            .await
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    if let Err(e) = result {
        error!("Failed to export profiles to {}: {}", directory.display(), e);
    }
}

#[derive(Deserialize)]
pub struct LatestQuery {
    pub email: Option<String>,
}

#[get("/profiles/latest")]
pub async fn latest_profile(
    state: web::Data<AppState>,
    query: web::Query<LatestQuery>,
) -> Result<web::Json<Profile>, ApiError> {
    let email = query
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .ok_or_else(|| ApiError::InvalidInput("email is required".to_owned()))?;

    let Some(account) = state.accounts.find_by_email(email).await? else {
        return Err(ApiError::NotFound("account not found"));
    };

    state
        .profiles
        .latest_profile(account.id)
        .await?
        .map(web::Json)
        .ok_or(ApiError::NotFound("profile not found"))
}

#[get("/profiles/export")]
pub async fn export_profiles(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let profiles = state.profiles.fetch_profiles().await?;
    let csv = export::profiles_to_csv(&profiles)?;
    info!("Exporting {} profiles", profiles.len());

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", ALL_PROFILES_FILE),
        ))
        .body(csv))
}
