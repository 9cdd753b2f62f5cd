use std::time::Duration;

use async_trait::async_trait;
use board_core::{
    Appointment, DayWindow, JobTags, PollIssue, TechnicianAssignment, TechnicianShift,
};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::auth::{OAuthClient, TokenCache, truncate_body};
use crate::records::{AppointmentRecord, AssignmentRecord, JobRecord, Page, ShiftRecord};
use crate::retry::{RetryPolicy, send_with_retry};
use crate::types::{FetchError, Result};

const APP_KEY_HEADER: &str = "ST-App-Key";

/// Appointments for one window plus the records that had to be skipped.
#[derive(Debug, Clone, Default)]
pub struct AppointmentBatch {
    pub appointments: Vec<Appointment>,
    pub issues: Vec<PollIssue>,
}

#[derive(Debug, Clone, Default)]
pub struct ShiftBatch {
    pub shifts: Vec<TechnicianShift>,
    pub issues: Vec<PollIssue>,
}

/// Read side of the field-service API consumed by the pipeline.
#[async_trait]
pub trait FieldServiceApi: Send + Sync {
    /// Appointments with `window.start <= start < window.end`.
    async fn fetch_appointments(&self, window: &DayWindow) -> Result<AppointmentBatch>;

    /// Jobs for `job_ids`. Unknown ids are simply absent from the result.
    async fn fetch_jobs(&self, job_ids: &[i64]) -> Result<Vec<JobTags>>;

    async fn fetch_assignments(&self, appointment_ids: &[i64]) -> Result<Vec<TechnicianAssignment>>;

    async fn fetch_shifts(&self, window: &DayWindow) -> Result<ShiftBatch>;
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub auth_url: String,
    pub base_url: String,
    pub tenant: String,
    pub client_id: String,
    pub client_secret: String,
    pub app_key: Option<String>,
    pub page_size: u32,
    pub max_pages: u32,
    pub appointment_statuses: Vec<String>,
    pub shift_type: Option<String>,
    pub shift_title_contains: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

/// `FieldServiceApi` over HTTP with a cached client-credentials token.
pub struct HttpFieldService {
    http: reqwest::Client,
    settings: ClientSettings,
    tokens: TokenCache<OAuthClient>,
}

impl HttpFieldService {
    pub fn new(settings: ClientSettings) -> std::result::Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|source| FetchError::Transport {
                endpoint: "client",
                source,
            })?;
        let oauth = OAuthClient::new(
            http.clone(),
            settings.auth_url.clone(),
            settings.client_id.clone(),
            settings.client_secret.clone(),
        );
        Ok(Self {
            http,
            settings,
            tokens: TokenCache::new(oauth),
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn tokens(&self) -> &TokenCache<OAuthClient> {
        &self.tokens
    }

    fn url(&self, module: &str, resource: &str) -> String {
        format!(
            "{}/{}/v2/tenant/{}/{}",
            self.settings.base_url.trim_end_matches('/'),
            module,
            self.settings.tenant,
            resource
        )
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Page<T>> {
        let token = self.tokens.get_token().await?;
        let mut request = self.http.get(url).bearer_auth(token).query(query);
        if let Some(app_key) = self.settings.app_key.as_deref() {
            request = request.header(APP_KEY_HEADER, app_key);
        }

        let response = send_with_retry(request, &self.settings.retry, endpoint).await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Transport { endpoint, source })?;
        if status == StatusCode::UNAUTHORIZED {
            self.tokens.invalidate().await;
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint,
                status: status.as_u16(),
                body: truncate_body(&body),
            }
            .into());
        }
        serde_json::from_str(&body).map_err(|err| {
            FetchError::Decode {
                endpoint,
                message: err.to_string(),
            }
            .into()
        })
    }

    /// Walks `page=1..` while the server reports more, up to `max_pages`.
    async fn collect_pages<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: &str,
        query: Vec<(&str, String)>,
    ) -> Result<Vec<T>> {
        let mut records = Vec::new();
        let max_pages = self.settings.max_pages.max(1);
        for page in 1..=max_pages {
            let mut paged = query.clone();
            paged.push(("page", page.to_string()));
            paged.push(("pageSize", self.settings.page_size.to_string()));
            let response: Page<T> = self.get_page(endpoint, url, &paged).await?;
            records.extend(response.data);
            if !response.has_more {
                return Ok(records);
            }
        }
        tracing::warn!(endpoint, max_pages, "stopped paging before the last page");
        Ok(records)
    }
}

#[async_trait]
impl FieldServiceApi for HttpFieldService {
    async fn fetch_appointments(&self, window: &DayWindow) -> Result<AppointmentBatch> {
        let url = self.url("jpm", "appointments");
        let mut query = vec![
            ("startsOnOrAfter", format_instant(window.start)),
            ("startsBefore", format_instant(window.end)),
        ];
        if !self.settings.appointment_statuses.is_empty() {
            query.push(("status", self.settings.appointment_statuses.join(",")));
        }
        let records: Vec<AppointmentRecord> =
            self.collect_pages("appointments", &url, query).await?;

        let mut batch = AppointmentBatch::default();
        for record in records {
            let id = record.id;
            match record.into_appointment() {
                Ok(appointment) => batch.appointments.push(appointment),
                Err(err) => {
                    tracing::warn!(appointment_id = id, error = %err, "skipping appointment");
                    batch.issues.push(PollIssue {
                        record: format!("appointment {}", id),
                        message: err.to_string(),
                    });
                }
            }
        }
        tracing::debug!(
            window = %window.label,
            count = batch.appointments.len(),
            "fetched appointments"
        );
        Ok(batch)
    }

    async fn fetch_jobs(&self, job_ids: &[i64]) -> Result<Vec<JobTags>> {
        if job_ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.url("jpm", "jobs");
        let query = [
            ("ids", join_ids(job_ids)),
            ("pageSize", job_ids.len().to_string()),
        ];
        let page: Page<JobRecord> = self.get_page("jobs", &url, &query).await?;
        Ok(page.data.into_iter().map(JobRecord::into_tags).collect())
    }

    async fn fetch_assignments(&self, appointment_ids: &[i64]) -> Result<Vec<TechnicianAssignment>> {
        if appointment_ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.url("dispatch", "appointment-assignments");
        let query = [
            ("appointmentIds", join_ids(appointment_ids)),
            ("pageSize", appointment_ids.len().max(1).to_string()),
        ];
        let page: Page<AssignmentRecord> =
            self.get_page("appointment-assignments", &url, &query).await?;
        Ok(page
            .data
            .into_iter()
            .map(AssignmentRecord::into_assignment)
            .collect())
    }

    async fn fetch_shifts(&self, window: &DayWindow) -> Result<ShiftBatch> {
        let url = self.url("dispatch", "technician-shifts");
        let mut query = vec![
            ("startsOnOrAfter", format_instant(window.start)),
            ("endsOnOrBefore", format_instant(window.end)),
        ];
        if let Some(shift_type) = self.settings.shift_type.as_ref() {
            query.push(("shiftType", shift_type.clone()));
        }
        if let Some(title) = self.settings.shift_title_contains.as_ref() {
            query.push(("titleContains", title.clone()));
        }
        let records: Vec<ShiftRecord> = self
            .collect_pages("technician-shifts", &url, query)
            .await?;

        let mut batch = ShiftBatch::default();
        for record in records {
            let technician_id = record.technician_id;
            match record.into_shift() {
                Ok(shift) => batch.shifts.push(shift),
                Err(err) => {
                    tracing::warn!(technician_id, error = %err, "skipping shift");
                    batch.issues.push(PollIssue {
                        record: format!("shift for technician {}", technician_id),
                        message: err.to_string(),
                    });
                }
            }
        }
        Ok(batch)
    }
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
