use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use board_core::{Category, CategoryDefinition, Targets};
use chrono::NaiveTime;
use chrono_tz::Tz;
use fieldservice::{ClientSettings, RetryPolicy};
use pipeline::{DEFAULT_JOB_BATCH_LIMIT, PipelineOptions};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::util::time::parse_clock;

pub const DEFAULT_PORT: u16 = 3845;
pub const MAX_PAGE_SIZE: u32 = 500;

pub const ENV_CLIENT_ID: &str = "SCHEDULE_BOARD_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "SCHEDULE_BOARD_CLIENT_SECRET";
pub const ENV_APP_KEY: &str = "SCHEDULE_BOARD_APP_KEY";
pub const ENV_TENANT: &str = "SCHEDULE_BOARD_TENANT";

/// Whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub board: BoardOptions,
    /// Keyed by category name (`L1_Op`, `L2_No_Op`, ...).
    pub categories: BTreeMap<String, CategoryConfig>,
    pub poll: PollConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub auth_url: String,
    pub base_url: String,
    pub tenant: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
    pub page_size: u32,
    pub max_pages: u32,
    pub appointment_statuses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift_title_contains: Option<String>,
    pub timeout_secs: u64,
    pub retry: RetryConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            auth_url: "https://auth.servicetitan.io/connect/token".to_string(),
            base_url: "https://api.servicetitan.io".to_string(),
            tenant: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            app_key: None,
            page_size: 100,
            max_pages: 10,
            appointment_statuses: vec![
                "Scheduled".to_string(),
                "Dispatched".to_string(),
                "Working".to_string(),
            ],
            shift_type: Some("Normal".to_string()),
            shift_title_contains: None,
            timeout_secs: 30,
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            initial_backoff_ms: policy.initial_backoff_ms,
            max_backoff_ms: policy.max_backoff_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardOptions {
    pub timezone: String,
    pub job_batch_limit: usize,
    pub group_by_technician: bool,
    pub celebrate: bool,
}

impl Default for BoardOptions {
    fn default() -> Self {
        Self {
            timezone: "America/New_York".to_string(),
            job_batch_limit: DEFAULT_JOB_BATCH_LIMIT,
            group_by_technician: false,
            celebrate: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub tag_id: i64,
    #[serde(default)]
    pub target: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_secs: u64,
    pub weekdays_only: bool,
    /// Local `HH:MM`; ticks before this time are skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_from: Option<String>,
    /// Local `HH:MM`; ticks at or after this time are skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_until: Option<String>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            weekdays_only: false,
            active_from: None,
            active_until: None,
        }
    }
}

impl BoardConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|err| AppError::Config(err.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|err| AppError::Config(format!("{}: {}", path.display(), err)))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|err| AppError::Config(err.to_string()))
    }

    /// Replaces credentials and tenant with values from the environment when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(value) = lookup(ENV_CLIENT_ID) {
            self.api.client_id = value;
        }
        if let Some(value) = lookup(ENV_CLIENT_SECRET) {
            self.api.client_secret = value;
        }
        if let Some(value) = lookup(ENV_APP_KEY) {
            self.api.app_key = Some(value);
        }
        if let Some(value) = lookup(ENV_TENANT) {
            self.api.tenant = value;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(AppError::Config(message));

        if self.api.tenant.trim().is_empty() {
            return invalid("api.tenant is required".to_string());
        }
        if self.api.client_id.trim().is_empty() || self.api.client_secret.trim().is_empty() {
            return invalid("api.client_id and api.client_secret are required".to_string());
        }
        if self.api.page_size == 0 || self.api.page_size > MAX_PAGE_SIZE {
            return invalid(format!(
                "api.page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            ));
        }
        if self.board.job_batch_limit == 0 {
            return invalid("board.job_batch_limit must be at least 1".to_string());
        }
        self.timezone()?;
        let definition = self.category_definition()?;
        if definition.is_empty() {
            return invalid("at least one [categories.<name>] table is required".to_string());
        }
        self.targets()?;
        for (tag_id, categories) in definition.shared_tags() {
            let names: Vec<&str> = categories.iter().map(Category::as_str).collect();
            tracing::warn!(tag_id, categories = ?names, "categories share one tag id");
        }
        if self.poll.interval_secs == 0 {
            return invalid("poll.interval_secs must be at least 1".to_string());
        }
        if let (Some(from), Some(until)) = self.active_hours()? {
            if from >= until {
                return invalid("poll.active_from must be earlier than poll.active_until".to_string());
            }
        }
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz> {
        Tz::from_str(self.board.timezone.trim()).map_err(|_| {
            AppError::Config(format!("unknown timezone {:?}", self.board.timezone))
        })
    }

    pub fn category_definition(&self) -> Result<CategoryDefinition> {
        let mut definition = CategoryDefinition::new();
        let mut seen: BTreeMap<Category, &str> = BTreeMap::new();
        for (name, entry) in &self.categories {
            let category = parse_category(name)?;
            if let Some(previous) = seen.insert(category, name.as_str()) {
                return Err(AppError::Config(format!(
                    "categories.{} and categories.{} both name {}",
                    previous,
                    name,
                    category.as_str()
                )));
            }
            if entry.tag_id <= 0 {
                return Err(AppError::Config(format!(
                    "categories.{}.tag_id must be positive",
                    name
                )));
            }
            definition.insert(category, entry.tag_id);
        }
        Ok(definition)
    }

    pub fn targets(&self) -> Result<Targets> {
        let mut targets = Targets::new();
        for (name, entry) in &self.categories {
            if entry.target < 0 {
                return Err(AppError::Config(format!(
                    "categories.{}.target must not be negative",
                    name
                )));
            }
            targets.insert(parse_category(name)?, entry.target);
        }
        Ok(targets)
    }

    pub fn active_hours(&self) -> Result<(Option<NaiveTime>, Option<NaiveTime>)> {
        let from = self.poll.active_from.as_deref().map(parse_clock).transpose()?;
        let until = self.poll.active_until.as_deref().map(parse_clock).transpose()?;
        Ok((from, until))
    }

    pub fn client_settings(&self) -> ClientSettings {
        let non_empty = |value: &Option<String>| {
            value
                .as_ref()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        ClientSettings {
            auth_url: self.api.auth_url.clone(),
            base_url: self.api.base_url.clone(),
            tenant: self.api.tenant.trim().to_string(),
            client_id: self.api.client_id.clone(),
            client_secret: self.api.client_secret.clone(),
            app_key: non_empty(&self.api.app_key),
            page_size: self.api.page_size,
            max_pages: self.api.max_pages,
            appointment_statuses: self.api.appointment_statuses.clone(),
            shift_type: non_empty(&self.api.shift_type),
            shift_title_contains: non_empty(&self.api.shift_title_contains),
            timeout: Duration::from_secs(self.api.timeout_secs.max(1)),
            retry: RetryPolicy {
                max_attempts: self.api.retry.max_attempts,
                initial_backoff_ms: self.api.retry.initial_backoff_ms,
                max_backoff_ms: self.api.retry.max_backoff_ms,
            },
        }
    }

    pub fn pipeline_options(&self) -> Result<PipelineOptions> {
        let mut options =
            PipelineOptions::new(self.category_definition()?, self.targets()?, self.timezone()?);
        options.job_batch_limit = self.board.job_batch_limit;
        options.group_by_technician = self.board.group_by_technician;
        Ok(options)
    }
}

fn parse_category(name: &str) -> Result<Category> {
    Category::from_str(name).map_err(|err| AppError::Config(format!("categories.{}: {}", name, err)))
}
