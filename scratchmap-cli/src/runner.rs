//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and service assembly
//! to reduce duplication across command handlers.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use scratchmap::backend::DockerBackend;
use scratchmap::composite::Compositor;
use scratchmap::config::ConfigFile;
use scratchmap::country::CountryRegistry;
use scratchmap::fetch::{AsyncReqwestClient, TileFetcher};
use scratchmap::generator::ScratchMapGenerator;
use scratchmap::handler::{MessageTemplates, MessagingEndpoint, RequestHandler};
use scratchmap::logging::{init_logging, LoggingGuard};
use scratchmap::style::StyleStore;

use crate::error::CliError;

/// The request handler wired to the real render backend and tile server.
pub type ServiceHandler<M> =
    RequestHandler<DockerBackend<AsyncReqwestClient>, TileFetcher<AsyncReqwestClient>, M>;

/// Options shared by every command.
pub struct RunnerOptions {
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    pub fn new(options: RunnerOptions) -> Result<Self, CliError> {
        let config = match &options.config {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };

        let logging_guard =
            init_logging(&config.logging.file, options.verbose).map_err(CliError::LoggingInit)?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("Scratchmap v{}", scratchmap::VERSION);
        info!("Scratchmap CLI: {} command", command);
    }

    pub fn load_registry(&self) -> Result<CountryRegistry, CliError> {
        Ok(CountryRegistry::load(&self.config.data.countries_path)?)
    }

    pub fn style_store(&self) -> StyleStore {
        let style = &self.config.style;
        StyleStore::new(&style.path, &style.backup_path, style.overlay_paint())
    }

    /// Assemble the request handler for `endpoint`.
    ///
    /// Loads the static data, computes the tile grid and prepares the style
    /// store, so any leftover overlays are gone before the first request.
    pub async fn create_handler<M: MessagingEndpoint>(
        &self,
        endpoint: M,
    ) -> Result<ServiceHandler<M>, CliError> {
        let config = &self.config;

        let registry = self.load_registry()?;
        let messages = MessageTemplates::load(&config.data.messages_path)?;

        let grid = config.map.grid()?;
        info!(
            zoom = grid.zoom(),
            tiles_x = grid.count_x(),
            tiles_y = grid.count_y(),
            "Tile grid computed"
        );

        let store = self.style_store();
        if store.prepare(&registry).await? {
            warn!(path = %store.path().display(), "Restored style left over from an earlier run");
        }

        let http_client = AsyncReqwestClient::with_timeout(config.fetch.timeout_secs)?;
        let backend = DockerBackend::new(
            http_client.clone(),
            &config.backend.docker_endpoint,
            &config.backend.container_name,
            &config.backend.reload_signal,
        );
        let tiles = TileFetcher::new(
            http_client,
            &config.backend.base_url,
            config.fetch.retry_policy(),
        );
        let compositor = Compositor::new(config.map.tile_size, &config.output.path)
            .with_max_concurrent(config.fetch.max_concurrent);

        let generator = ScratchMapGenerator::new(
            Arc::new(registry),
            store,
            backend,
            tiles,
            compositor,
            Arc::new(grid),
        );

        info!(
            container = %config.backend.container_name,
            on_failure = %config.service.on_failure,
            "Service ready"
        );

        Ok(RequestHandler::new(
            Arc::new(generator),
            endpoint,
            Arc::new(messages),
            config.service.on_failure,
        ))
    }
}
