use chrono::NaiveTime;

use crate::error::Result;
use crate::services::SharedConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySetting {
    pub name: String,
    pub tag_id: i64,
    pub target: i64,
}

/// Non-secret view of the active configuration.
#[derive(Debug, Clone)]
pub struct SettingsSnapshot {
    pub tenant: String,
    pub base_url: String,
    pub has_app_key: bool,
    pub timezone: String,
    pub group_by_technician: bool,
    pub celebrate: bool,
    pub job_batch_limit: usize,
    pub categories: Vec<CategorySetting>,
    pub poll_interval_secs: u64,
    pub weekdays_only: bool,
    pub active_from: Option<NaiveTime>,
    pub active_until: Option<NaiveTime>,
}

#[derive(Clone)]
pub struct SettingsService {
    config: SharedConfig,
}

impl SettingsService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    pub fn get(&self) -> Result<SettingsSnapshot> {
        let config = &self.config;
        let (active_from, active_until) = config.active_hours()?;
        let definition = config.category_definition()?;
        let targets = config.targets()?;
        let categories = definition
            .iter()
            .map(|(category, tag_id)| CategorySetting {
                name: category.as_str().to_string(),
                tag_id,
                target: targets.target_for(category),
            })
            .collect();
        Ok(SettingsSnapshot {
            tenant: config.api.tenant.clone(),
            base_url: config.api.base_url.clone(),
            has_app_key: config
                .api
                .app_key
                .as_deref()
                .is_some_and(|key| !key.trim().is_empty()),
            timezone: config.timezone()?.name().to_string(),
            group_by_technician: config.board.group_by_technician,
            celebrate: config.board.celebrate,
            job_batch_limit: config.board.job_batch_limit,
            categories,
            poll_interval_secs: config.poll.interval_secs,
            weekdays_only: config.poll.weekdays_only,
            active_from,
            active_until,
        })
    }
}
