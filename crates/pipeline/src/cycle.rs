use std::collections::{BTreeMap, HashMap};

use board_core::{
    Appointment, CategoryDefinition, DayLabel, DayWindow, JobTags, MetricTable, PollIssue, Targets,
    TechnicianAssignment, TechnicianShift,
};
use chrono::NaiveDate;
use chrono_tz::Tz;
use fieldservice::{FieldServiceApi, Result, ShiftBatch};

use crate::aggregate::{AssignmentIndex, aggregate};
use crate::calendar::compute_buckets;
use crate::enrich::{DEFAULT_JOB_BATCH_LIMIT, fetch_job_tags};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub categories: CategoryDefinition,
    pub targets: Targets,
    pub timezone: Tz,
    pub job_batch_limit: usize,
    pub group_by_technician: bool,
}

impl PipelineOptions {
    pub fn new(categories: CategoryDefinition, targets: Targets, timezone: Tz) -> Self {
        Self {
            categories,
            targets,
            timezone,
            job_batch_limit: DEFAULT_JOB_BATCH_LIMIT,
            group_by_technician: false,
        }
    }
}

/// Everything one polling pass produced, before it is shaped for display.
#[derive(Debug, Clone)]
pub struct CycleOutput {
    pub buckets: [DayWindow; 3],
    pub table: MetricTable,
    /// Technicians on shift per day, in first-seen order.
    pub roster: BTreeMap<DayLabel, Vec<i64>>,
    pub technician_names: BTreeMap<i64, String>,
    pub issues: Vec<PollIssue>,
    pub appointment_count: usize,
}

#[derive(Debug, Default)]
struct BucketData {
    appointments: Vec<Appointment>,
    job_tags: HashMap<i64, JobTags>,
    assignments: Vec<TechnicianAssignment>,
    shifts: Vec<TechnicianShift>,
    issues: Vec<PollIssue>,
}

async fn fetch_bucket(
    api: &dyn FieldServiceApi,
    window: &DayWindow,
    options: &PipelineOptions,
) -> Result<BucketData> {
    let batch = api.fetch_appointments(window).await?;
    let job_ids: Vec<i64> = batch.appointments.iter().map(|a| a.job_id).collect();
    let job_tags = fetch_job_tags(api, &job_ids, options.job_batch_limit).await?;

    let (assignments, shifts) = if options.group_by_technician {
        let appointment_ids: Vec<i64> = batch.appointments.iter().map(|a| a.id).collect();
        tokio::try_join!(
            api.fetch_assignments(&appointment_ids),
            api.fetch_shifts(window)
        )?
    } else {
        (Vec::new(), ShiftBatch::default())
    };

    let mut issues = batch.issues;
    issues.extend(shifts.issues);
    Ok(BucketData {
        appointments: batch.appointments,
        job_tags,
        assignments,
        shifts: shifts.shifts,
        issues,
    })
}

/// Runs one full pass: bucket, fetch, enrich and aggregate.
///
/// The three day windows are fetched concurrently. Any auth or fetch error
/// aborts the whole pass; records that failed to parse are reported in
/// `issues` and otherwise skipped.
pub async fn run_cycle(
    api: &dyn FieldServiceApi,
    options: &PipelineOptions,
    today: NaiveDate,
) -> Result<CycleOutput> {
    let buckets = compute_buckets(today, &options.timezone);
    let [first, second, third] = &buckets;
    let (first_data, second_data, third_data) = tokio::try_join!(
        fetch_bucket(api, first, options),
        fetch_bucket(api, second, options),
        fetch_bucket(api, third, options),
    )?;

    let mut data = [first_data, second_data, third_data];
    let mut index = AssignmentIndex::default();
    for bucket in &mut data {
        index.extend(std::mem::take(&mut bucket.assignments));
    }
    let technicians = options.group_by_technician.then_some(&index);

    // Each bucket is counted against its own job lookup so the batch cap
    // holds per day.
    let mut table = MetricTable::new();
    let mut roster = BTreeMap::new();
    let mut issues = Vec::new();
    let mut appointment_count = 0;
    let mut job_count = 0;
    for (window, bucket) in buckets.iter().zip(data) {
        table.merge(aggregate(
            &bucket.appointments,
            &bucket.job_tags,
            &options.categories,
            std::slice::from_ref(window),
            &options.timezone,
            technicians,
        ));
        appointment_count += bucket.appointments.len();
        job_count += bucket.job_tags.len();
        issues.extend(bucket.issues);

        let mut on_shift: Vec<i64> = Vec::new();
        for shift in bucket.shifts {
            if !on_shift.contains(&shift.technician_id) {
                on_shift.push(shift.technician_id);
            }
        }
        roster.insert(window.label, on_shift);
    }

    tracing::info!(
        appointments = appointment_count,
        jobs = job_count,
        issues = issues.len(),
        "poll cycle aggregated"
    );

    Ok(CycleOutput {
        buckets,
        table,
        roster,
        technician_names: index.names(),
        issues,
        appointment_count,
    })
}
