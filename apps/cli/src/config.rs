use std::fs;
use std::path::PathBuf;

use board_app::BoardConfig;

const CONFIG_DIR_NAME: &str = "schedule-board";
const CONFIG_FILE_NAME: &str = "config.toml";

const TEMPLATE_HEADER: &str = "\
# Schedule board configuration.
#
# Fill in [api] tenant, client_id and client_secret (or set
# SCHEDULE_BOARD_TENANT, SCHEDULE_BOARD_CLIENT_ID, SCHEDULE_BOARD_CLIENT_SECRET
# and SCHEDULE_BOARD_APP_KEY), then add one table per tracked category:
#
# [categories.L1_No_Op]
# tag_id = 123456
# target = 3

";

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: BoardConfig,
    pub paths: ConfigPaths,
    pub created: bool,
}

/// Reads the config file, writing a template first if it does not exist.
pub fn load_or_create(override_path: Option<PathBuf>) -> Result<ConfigLoad, String> {
    let file = match override_path {
        Some(path) => path,
        None => config_dir()?.join(CONFIG_FILE_NAME),
    };
    let paths = ConfigPaths { file };

    if paths.file.exists() {
        let config = BoardConfig::load(&paths.file).map_err(|err| err.to_string())?;
        return Ok(ConfigLoad {
            config,
            paths,
            created: false,
        });
    }

    if let Some(dir) = paths.file.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .map_err(|err| format!("create config dir {}: {}", dir.display(), err))?;
    }
    let config = BoardConfig::default();
    let body = config.to_toml_string().map_err(|err| err.to_string())?;
    fs::write(&paths.file, format!("{TEMPLATE_HEADER}{body}"))
        .map_err(|err| format!("write config {}: {}", paths.file.display(), err))?;

    Ok(ConfigLoad {
        config,
        paths,
        created: true,
    })
}

fn config_dir() -> Result<PathBuf, String> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME))
        .ok_or_else(|| "could not resolve a config directory".to_string())
}
