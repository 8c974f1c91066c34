#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub type AccountId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl NewAccount {
    /// Checks the fields that must be present before an account is created.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            Err("email and password are required")
        } else if !self.email.contains('@') {
            Err("invalid email address")
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub username: String,
    pub password_hash: String,
}
