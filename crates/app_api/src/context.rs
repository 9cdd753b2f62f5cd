use std::path::PathBuf;

use board_app::AppState;

#[derive(Clone)]
pub struct AppContext {
    pub app_state: AppState,
    pub config_path: Option<PathBuf>,
}
