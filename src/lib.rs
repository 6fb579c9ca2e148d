//! Bookshelf application library
//!
//! Wires the authors, books and users modules onto the kernel and exposes
//! [`App`] for the server binary, the CLI and the integration tests.

pub mod fixtures;
pub mod modules;
pub mod utils;

use anyhow::Context;
use axum::Router;
use bookshelf_kernel::{InitCtx, ModuleRegistry, Services, Settings};

/// Registry holding every project module in mount order.
pub fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);
    registry
}

/// A migrated, initialized application ready to serve.
pub struct App {
    pub registry: ModuleRegistry,
    pub services: Services,
}

impl App {
    /// Connect shared services, apply migrations and initialize modules.
    pub async fn bootstrap(settings: Settings) -> anyhow::Result<Self> {
        let registry = registry();
        let services = Services::connect(settings).await?;

        registry
            .migrate(&services.db)
            .await
            .with_context(|| "failed to migrate database")?;
        registry.init_modules(&InitCtx::new(&services)).await?;

        tracing::info!(
            modules = registry.module_count(),
            env = ?services.settings.environment,
            "bookshelf bootstrap complete"
        );
        Ok(Self { registry, services })
    }

    /// The full HTTP router, without binding a listener.
    pub fn router(&self) -> Router {
        bookshelf_http::build_router(&self.registry, &self.services)
    }

    /// Run the HTTP server until a shutdown signal arrives.
    pub async fn serve(&self) -> anyhow::Result<()> {
        let ctx = InitCtx::new(&self.services);
        self.registry.start_modules(&ctx).await?;

        let served = bookshelf_http::start_server(&self.registry, &self.services).await;

        self.registry.stop_modules().await?;
        served
    }
}
