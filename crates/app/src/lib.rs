pub mod app;
pub mod config;
pub mod error;
pub mod services;
pub mod util;

pub use app::AppState;
pub use config::BoardConfig;
pub use error::{ApiError, AppError, Result};
pub use services::{
    AppServices, CategorySetting, DashboardService, PollSchedule, SettingsSnapshot, spawn_poller,
};
pub use util::time::parse_clock;
