use board_app::{AppError, Result};
use board_core::{DashboardSnapshot, DayCard, DayLabel};
use chrono::NaiveTime;

use crate::{AppContext, CategorySettingResponse, DayRequest, OkResponse, SettingsResponse};

fn parse_day_label(value: &str) -> Result<DayLabel> {
    let value = value.trim();
    DayLabel::ALL
        .into_iter()
        .find(|label| label.as_str().eq_ignore_ascii_case(value))
        .ok_or_else(|| AppError::InvalidInput(format!("unsupported day {}", value)))
}

/// Latest board; the first call runs a pass.
pub async fn dashboard(ctx: &AppContext) -> Result<DashboardSnapshot> {
    Ok(ctx.app_state.services.dashboard.snapshot().await)
}

pub async fn refresh(ctx: &AppContext) -> Result<DashboardSnapshot> {
    Ok(ctx.app_state.services.dashboard.refresh().await)
}

pub async fn day(ctx: &AppContext, req: DayRequest) -> Result<DayCard> {
    let label = parse_day_label(&req.label)?;
    let snapshot = ctx.app_state.services.dashboard.snapshot().await;
    snapshot
        .day(label)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("no card for {}", label)))
}

pub fn settings_get(ctx: &AppContext) -> Result<SettingsResponse> {
    let snapshot = ctx.app_state.services.settings.get()?;
    let clock = |time: Option<NaiveTime>| time.map(|t| t.format("%H:%M").to_string());
    Ok(SettingsResponse {
        tenant: snapshot.tenant,
        base_url: snapshot.base_url,
        has_app_key: snapshot.has_app_key,
        timezone: snapshot.timezone,
        group_by_technician: snapshot.group_by_technician,
        celebrate: snapshot.celebrate,
        job_batch_limit: snapshot.job_batch_limit,
        categories: snapshot
            .categories
            .into_iter()
            .map(|category| CategorySettingResponse {
                name: category.name,
                tag_id: category.tag_id,
                target: category.target,
            })
            .collect(),
        poll_interval_secs: snapshot.poll_interval_secs,
        weekdays_only: snapshot.weekdays_only,
        active_from: clock(snapshot.active_from),
        active_until: clock(snapshot.active_until),
        config_path: ctx
            .config_path
            .as_ref()
            .map(|path| path.to_string_lossy().to_string()),
    })
}

pub fn ok() -> OkResponse {
    OkResponse { ok: true }
}
