use std::{
    path::Path,
    sync::atomic::{AtomicU64, Ordering},
};

use fitreg_model::profile::Profile;
use log::info;
use serde::{Deserialize, Serialize};

pub const LATEST_PROFILE_FILE: &str = "latest_profile.csv";
pub const ALL_PROFILES_FILE: &str = "all_profiles.csv";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("writing export file failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One line of the profile export. Numeric metrics are written as
/// preformatted text so the file carries the display precision.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportRow {
    pub account_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub birth_date: String,
    pub sex: String,
    pub activity_level: String,
    pub goal: String,
    pub exercise_frequency: String,
    pub body_mass_index: String,
    pub lean_body_mass: String,
    pub lean_body_mass_percentage: String,
    pub has_photo: u8,
    pub photo: String,
}

impl From<&Profile> for ExportRow {
    fn from(profile: &Profile) -> Self {
        let details = &profile.details;
        Self {
            account_id: profile.account_id,
            first_name: details.first_name.clone(),
            last_name: details.last_name.clone(),
            weight_kg: details.weight_kg,
            height_cm: details.height_cm,
            birth_date: details.birth_date.format("%Y-%m-%d").to_string(),
            sex: details.sex.to_string(),
            activity_level: details.activity_level.clone(),
            goal: details.goal.clone(),
            exercise_frequency: details.exercise_frequency.clone(),
            body_mass_index: format!("{:.2}", profile.metrics.body_mass_index),
            lean_body_mass: format!("{:.3}", profile.metrics.lean_body_mass),
            lean_body_mass_percentage: format!("{:.2}", profile.metrics.lean_body_mass_percentage),
            has_photo: profile.has_photo() as u8,
            photo: profile.photo.clone().unwrap_or_default(),
        }
    }
}

/// Serializes profiles as CSV. The header is written even when there are no
/// profiles.
pub fn profiles_to_csv(profiles: &[Profile]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for profile in profiles {
        writer.serialize(ExportRow::from(profile))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

pub fn rows_from_csv(data: &[u8]) -> Result<Vec<ExportRow>, ExportError> {
    let rows = csv::Reader::from_reader(data)
        .deserialize()
        .collect::<Result<Vec<ExportRow>, _>>()?;
    Ok(rows)
}

const HEADER: [&str; 15] = [
    "account_id",
    "first_name",
    "last_name",
    "weight_kg",
    "height_cm",
    "birth_date",
    "sex",
    "activity_level",
    "goal",
    "exercise_frequency",
    "body_mass_index",
    "lean_body_mass",
    "lean_body_mass_percentage",
    "has_photo",
    "photo",
];

/// Overwrites the snapshot files in `directory`: one holding just `latest`,
/// one holding every profile.
pub async fn write_snapshots(
    directory: &Path,
    latest: &Profile,
    all: &[Profile],
) -> Result<(), ExportError> {
    tokio::fs::create_dir_all(directory).await?;
    replace_file(
        directory,
        LATEST_PROFILE_FILE,
        &profiles_to_csv(std::slice::from_ref(latest))?,
    )
    .await?;
    replace_file(directory, ALL_PROFILES_FILE, &profiles_to_csv(all)?).await?;
    info!(
        "Exported {} profiles to {}",
        all.len(),
        directory.display()
    );
    Ok(())
}

/// Writes into a uniquely named sibling first, then renames it over `name`,
/// so readers and concurrent writers never see a partial file.
async fn replace_file(directory: &Path, name: &str, contents: &[u8]) -> std::io::Result<()> {
    static NEXT: AtomicU64 = AtomicU64::new(0);

    let temp = directory.join(format!(
        ".{}.{}.{}.tmp",
        name,
        std::process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    ));
    if let Err(e) = tokio::fs::write(&temp, contents).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(e);
    }
    tokio::fs::rename(&temp, directory.join(name)).await
}
