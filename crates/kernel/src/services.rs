//! Handles shared by every request handler.

use std::sync::Arc;

use anyhow::Context;
use bookshelf_authz::JwtAuthenticator;
use bookshelf_cache::SharedCache;
use bookshelf_db::Db;

use crate::settings::Settings;

/// Cheaply clonable bundle of the store, cache, and token authenticator.
#[derive(Clone)]
pub struct Services {
    pub settings: Arc<Settings>,
    pub db: Db,
    pub cache: SharedCache,
    pub auth: JwtAuthenticator,
}

impl Services {
    pub fn new(settings: Settings, db: Db, cache: SharedCache, auth: JwtAuthenticator) -> Self {
        Self {
            settings: Arc::new(settings),
            db,
            cache,
            auth,
        }
    }

    /// Open the database and build the cache and authenticator from settings.
    pub async fn connect(settings: Settings) -> anyhow::Result<Self> {
        let db = bookshelf_db::connect(&settings.database)
            .await
            .with_context(|| "failed to connect to database")?;
        let cache = bookshelf_cache::build(&settings.cache);
        let auth = JwtAuthenticator::from_settings(&settings.auth);

        Ok(Self::new(settings, db, cache, auth))
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("environment", &self.settings.environment)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}
