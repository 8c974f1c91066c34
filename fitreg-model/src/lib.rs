pub mod account;
pub mod biometrics;
pub mod photo;
pub mod profile;
