use chrono::{DateTime, NaiveDate, Utc};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    account::AccountId,
    biometrics::{self, BiometricInput, BiometricResult, Sex},
};

pub type ProfileId = i64;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProfileDetails {
    pub first_name: String,
    pub last_name: String,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub birth_date: NaiveDate,
    pub sex: Sex,
    pub activity_level: String,
    pub goal: String,
    pub exercise_frequency: String,
}

impl ProfileDetails {
    pub fn biometric_input(&self) -> biometrics::Result<BiometricInput> {
        BiometricInput::new(self.weight_kg, self.height_cm, self.sex)
    }

    pub fn evaluate(&self) -> biometrics::Result<BiometricResult> {
        biometrics::evaluate(&self.biometric_input()?)
    }
}

/// Profile submitted for the account registered under `email`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProfile {
    pub email: String,
    pub details: ProfileDetails,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Profile {
    pub id: ProfileId,
    pub account_id: AccountId,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub details: ProfileDetails,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub metrics: BiometricResult,
    pub photo: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl Profile {
    pub fn has_photo(&self) -> bool {
        self.photo.is_some()
    }
}

/// Accepts `YYYY-MM-DD`, ignoring any time part after a `T` separator.
pub fn parse_birth_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    let date = value.trim().split('T').next().unwrap_or_default();
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
}
