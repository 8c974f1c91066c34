use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use fitreg_model::{
    account::AccountId,
    biometrics::{BiometricResult, Sex},
    profile::{Profile, ProfileDetails},
};
use log::debug;

use crate::{connection::Connection, Error, Result};

const SELECT_PROFILE: &str = "SELECT id, account_id, first_name, last_name, weight_kg, height_cm,
    birth_date, sex, activity_level, goal, exercise_frequency, body_mass_index, lean_body_mass,
    lean_body_mass_percentage, photo, registered_at FROM profiles";

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: i64,
    account_id: i64,
    first_name: String,
    last_name: String,
    weight_kg: f64,
    height_cm: f64,
    birth_date: String,
    sex: i64,
    activity_level: String,
    goal: String,
    exercise_frequency: String,
    body_mass_index: f64,
    lean_body_mass: f64,
    lean_body_mass_percentage: f64,
    photo: Option<String>,
    registered_at: i64,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = Error;

    fn try_from(row: ProfileRow) -> Result<Self> {
        let sex: Sex = num::FromPrimitive::from_i64(row.sex)
            .ok_or_else(|| Error::Corrupted(format!("profile {}: sex {}", row.id, row.sex)))?;
        let birth_date = NaiveDate::parse_from_str(&row.birth_date, "%Y-%m-%d").map_err(|e| {
            Error::Corrupted(format!("profile {}: birth date: {}", row.id, e))
        })?;
        let registered_at = DateTime::<Utc>::from_timestamp_millis(row.registered_at)
            .ok_or_else(|| Error::Corrupted(format!("profile {}: timestamp", row.id)))?;

        Ok(Self {
            id: row.id,
            account_id: row.account_id,
            details: ProfileDetails {
                first_name: row.first_name,
                last_name: row.last_name,
                weight_kg: row.weight_kg,
                height_cm: row.height_cm,
                birth_date,
                sex,
                activity_level: row.activity_level,
                goal: row.goal,
                exercise_frequency: row.exercise_frequency,
            },
            metrics: BiometricResult::from_parts(
                row.body_mass_index,
                row.lean_body_mass,
                row.lean_body_mass_percentage,
            ),
            photo: row.photo,
            registered_at,
        })
    }
}

#[mockall::automock]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn store_profile(
        &self,
        account_id: AccountId,
        details: ProfileDetails,
        metrics: BiometricResult,
        photo: Option<String>,
    ) -> Result<Profile>;
    /// Most recently registered profile of the account; ties go to the
    /// later insert.
    async fn latest_profile(&self, account_id: AccountId) -> Result<Option<Profile>>;
    async fn fetch_profiles(&self) -> Result<Vec<Profile>>;
}

#[derive(Clone)]
pub struct ProfileRepositoryImpl {
    connection: Connection,
}

impl ProfileRepositoryImpl {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl ProfileRepository for ProfileRepositoryImpl {
    async fn store_profile(
        &self,
        account_id: AccountId,
        details: ProfileDetails,
        metrics: BiometricResult,
        photo: Option<String>,
    ) -> Result<Profile> {
        // Stored with millisecond precision.
        let now = Utc::now();
        let registered_at =
            DateTime::<Utc>::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now);

        let mut conn = self.connection.lock().await;
        debug!("Storing profile for account {}", account_id);
        let result = sqlx::query(
            "INSERT INTO profiles (account_id, first_name, last_name, weight_kg, height_cm,
                birth_date, sex, activity_level, goal, exercise_frequency, body_mass_index,
                lean_body_mass, lean_body_mass_percentage, photo, registered_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(account_id)
        .bind(&details.first_name)
        .bind(&details.last_name)
        .bind(details.weight_kg)
        .bind(details.height_cm)
        .bind(details.birth_date.format("%Y-%m-%d").to_string())
        .bind(details.sex as i64)
        .bind(&details.activity_level)
        .bind(&details.goal)
        .bind(&details.exercise_frequency)
        .bind(metrics.body_mass_index)
        .bind(metrics.lean_body_mass)
        .bind(metrics.lean_body_mass_percentage)
        .bind(&photo)
        .bind(registered_at.timestamp_millis())
        .execute(&mut *conn)
        .await?;

        Ok(Profile {
            id: result.last_insert_rowid(),
            account_id,
            details,
            metrics,
            photo,
            registered_at,
        })
    }

    async fn latest_profile(&self, account_id: AccountId) -> Result<Option<Profile>> {
        let query = format!(
            "{} WHERE account_id = ? ORDER BY registered_at DESC, id DESC LIMIT 1",
            SELECT_PROFILE
        );
        let mut conn = self.connection.lock().await;
        let row: Option<ProfileRow> = sqlx::query_as(&query)
            .bind(account_id)
            .fetch_optional(&mut *conn)
            .await?;

        row.map(Profile::try_from).transpose()
    }

    async fn fetch_profiles(&self) -> Result<Vec<Profile>> {
        let query = format!("{} ORDER BY id", SELECT_PROFILE);
        let mut conn = self.connection.lock().await;
        let rows: Vec<ProfileRow> = sqlx::query_as(&query)
            .fetch_all(&mut *conn)
            .await?;
        debug!("Fetched {} profiles", rows.len());

        rows.into_iter().map(Profile::try_from).collect()
    }
}
