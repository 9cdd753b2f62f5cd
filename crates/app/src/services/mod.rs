mod dashboard;
mod poller;
mod settings;

use std::sync::Arc;

use fieldservice::FieldServiceApi;

use crate::config::BoardConfig;
use crate::error::Result;

pub use dashboard::DashboardService;
pub use poller::{PollSchedule, spawn_poller};
pub use settings::{CategorySetting, SettingsService, SettingsSnapshot};

type SharedConfig = Arc<BoardConfig>;

/// Service registry for app-level operations.
#[derive(Clone)]
pub struct AppServices {
    pub dashboard: DashboardService,
    pub settings: SettingsService,
}

impl AppServices {
    pub fn new(config: &BoardConfig, api: Arc<dyn FieldServiceApi>) -> Result<Self> {
        let shared = Arc::new(config.clone());
        Ok(Self {
            dashboard: DashboardService::new(api, shared.clone())?,
            settings: SettingsService::new(shared),
        })
    }
}
