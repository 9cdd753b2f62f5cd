use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CategorySettingResponse {
    pub name: String,
    pub tag_id: i64,
    pub target: i64,
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub tenant: String,
    pub base_url: String,
    pub has_app_key: bool,
    pub timezone: String,
    pub group_by_technician: bool,
    pub celebrate: bool,
    pub job_batch_limit: usize,
    pub categories: Vec<CategorySettingResponse>,
    pub poll_interval_secs: u64,
    pub weekdays_only: bool,
    pub active_from: Option<String>,
    pub active_until: Option<String>,
    pub config_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}
