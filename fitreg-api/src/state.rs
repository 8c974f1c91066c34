use std::{path::PathBuf, sync::Arc};

use fitreg_db::{
    account::AccountRepository, photo::PhotoStore, profile::ProfileRepository,
};

use crate::auth::TokenIssuer;

pub struct AppState {
    pub accounts: Arc<dyn AccountRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub photos: Arc<dyn PhotoStore>,
    pub tokens: TokenIssuer,
    pub export_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        profiles: Arc<dyn ProfileRepository>,
        photos: Arc<dyn PhotoStore>,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            accounts,
            profiles,
            photos,
            tokens,
            export_dir: None,
        }
    }

    pub fn with_export_dir(mut self, export_dir: Option<PathBuf>) -> Self {
        self.export_dir = export_dir;
        self
    }
}
