use std::sync::Arc;

use actix_web::web;

use crate::accounts::Accounts;
use crate::auth::{Authenticator, PasswordHasher};
use crate::config::Config;
use crate::email::Mailer;
use crate::error::AppError;
use crate::routes;
use crate::store::Store;

/// Everything the HTTP layer shares between workers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub authenticator: Authenticator,
    pub accounts: Accounts,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn Store>, mailer: Arc<dyn Mailer>) -> Self {
        let authenticator = Authenticator::from_config(store.clone(), config);
        let accounts = Accounts::new(
            store.clone(),
            authenticator.clone(),
            PasswordHasher::new(config.bcrypt_cost),
            mailer,
            config.mail_from.clone(),
        );
        Self {
            store,
            authenticator,
            accounts,
        }
    }

    /// Registers app data, extractor settings and every route.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::from(self.store.clone()))
            .app_data(web::Data::new(self.authenticator.clone()))
            .app_data(web::Data::new(self.accounts.clone()))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::BadRequest(err.to_string()).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                AppError::BadRequest(err.to_string()).into()
            }));
        routes::config(cfg);
    }
}
