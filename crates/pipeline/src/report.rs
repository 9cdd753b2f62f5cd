use std::collections::BTreeMap;

use board_core::{
    Category, CategoryMetric, DashboardSnapshot, DayCard, DayLabel, DayWindow, MetricTable,
    TechnicianKey, TechnicianRow, compare,
};
use chrono::{DateTime, Utc};

use crate::calendar::weekday_name;
use crate::cycle::{CycleOutput, PipelineOptions};

/// Row label for counts that could not be tied to a technician.
pub const UNKNOWN_TECHNICIAN: &str = "Unknown";
/// Name shown for an on-shift technician the assignments never named.
pub const UNNAMED_TECHNICIAN: &str = "Unknown Tech";

pub fn build_snapshot(
    output: &CycleOutput,
    options: &PipelineOptions,
    generated_at: DateTime<Utc>,
) -> DashboardSnapshot {
    let categories = options.categories.categories();
    let days = output
        .buckets
        .iter()
        .map(|window| {
            let metrics = category_metrics(Some(&output.table), window.label, options);
            let technicians = if options.group_by_technician {
                technician_rows(output, window.label, &categories)
            } else {
                Vec::new()
            };
            day_card(window, metrics, technicians)
        })
        .collect();

    DashboardSnapshot {
        generated_at,
        timezone: options.timezone.name().to_string(),
        days,
        warning: None,
        issues: output.issues.clone(),
        celebrations: Vec::new(),
    }
}

/// Snapshot shown when a pass failed: every count is zero and `warning`
/// carries the reason.
pub fn zeroed_snapshot(
    buckets: &[DayWindow; 3],
    options: &PipelineOptions,
    generated_at: DateTime<Utc>,
    warning: String,
) -> DashboardSnapshot {
    let days = buckets
        .iter()
        .map(|window| day_card(window, category_metrics(None, window.label, options), Vec::new()))
        .collect();
    DashboardSnapshot {
        generated_at,
        timezone: options.timezone.name().to_string(),
        days,
        warning: Some(warning),
        issues: Vec::new(),
        celebrations: Vec::new(),
    }
}

fn day_card(window: &DayWindow, metrics: Vec<CategoryMetric>, technicians: Vec<TechnicianRow>) -> DayCard {
    let weekday = weekday_name(window.date);
    let title = match window.label {
        DayLabel::Today => "Today".to_string(),
        _ => weekday.clone(),
    };
    DayCard {
        label: window.label,
        date: window.date,
        weekday,
        title,
        window_start: window.start,
        window_end: window.end,
        metrics,
        technicians,
    }
}

fn category_metrics(
    table: Option<&MetricTable>,
    label: DayLabel,
    options: &PipelineOptions,
) -> Vec<CategoryMetric> {
    options
        .categories
        .categories()
        .into_iter()
        .map(|category| {
            let observed = table.map(|t| t.total(category, label)).unwrap_or(0);
            let target = options.targets.target_for(category);
            let comparison = compare(i64::from(observed), target);
            CategoryMetric {
                category,
                observed,
                target,
                delta: comparison.delta,
                met: comparison.met,
            }
        })
        .collect()
}

fn technician_rows(output: &CycleOutput, label: DayLabel, categories: &[Category]) -> Vec<TechnicianRow> {
    let counts_for = |key: TechnicianKey| -> BTreeMap<Category, u32> {
        categories
            .iter()
            .map(|category| (*category, output.table.count(Some(key), *category, label)))
            .collect()
    };

    let mut rows: Vec<TechnicianRow> = output
        .roster
        .get(&label)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .map(|technician_id| TechnicianRow {
            technician_id: Some(*technician_id),
            name: output
                .technician_names
                .get(technician_id)
                .cloned()
                .unwrap_or_else(|| UNNAMED_TECHNICIAN.to_string()),
            counts: counts_for(TechnicianKey::Known(*technician_id)),
        })
        .collect();

    let unknown = counts_for(TechnicianKey::Unknown);
    if unknown.values().any(|count| *count > 0) {
        rows.push(TechnicianRow {
            technician_id: None,
            name: UNKNOWN_TECHNICIAN.to_string(),
            counts: unknown,
        });
    }
    rows
}
