use std::sync::Arc;

use config::Config;
use database::Repositories;
use infrastructure::{Mailer, MediaHost};
use services::{CredentialStore, TokenStore};

pub mod config;
pub mod database;
pub mod error;
pub mod infrastructure;
pub mod middleware;
pub mod models;
pub mod result;
pub mod routes;
pub mod services;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repos: Repositories,
    pub mailer: Arc<dyn Mailer>,
    pub media: Arc<dyn MediaHost>,
}

impl AppState {
    pub fn new(
        config: Config,
        repos: Repositories,
        mailer: Arc<dyn Mailer>,
        media: Arc<dyn MediaHost>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            repos,
            mailer,
            media,
        }
    }

    pub fn credentials(&self) -> CredentialStore {
        CredentialStore::new(self.repos.users.clone(), self.config.bcrypt_cost)
    }

    pub fn tokens(&self) -> TokenStore {
        TokenStore::new(self.repos.tokens.clone(), self.config.verification_token_ttl())
    }
}
