use std::sync::Arc;

use fieldservice::{FieldServiceApi, HttpFieldService};

use crate::config::BoardConfig;
use crate::error::Result;
use crate::services::{AppServices, PollSchedule};

/// Application state shared by frontend backends (HTTP server, CLI).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BoardConfig>,
    pub services: AppServices,
}

impl AppState {
    /// Validates `config` and connects to the field-service API it names.
    pub fn new(config: BoardConfig) -> Result<Self> {
        config.validate()?;
        let api = HttpFieldService::new(config.client_settings())?;
        Self::with_api(config, Arc::new(api))
    }

    /// Builds state over any `FieldServiceApi`, e.g. an in-memory fake.
    pub fn with_api(config: BoardConfig, api: Arc<dyn FieldServiceApi>) -> Result<Self> {
        let services = AppServices::new(&config, api)?;
        Ok(Self {
            config: Arc::new(config),
            services,
        })
    }

    pub fn poll_schedule(&self) -> Result<PollSchedule> {
        PollSchedule::from_config(&self.config)
    }
}
