mod aggregate;
mod calendar;
mod celebrate;
mod cycle;
mod enrich;
mod report;

pub use aggregate::{AssignmentIndex, aggregate, bucket_for};
pub use calendar::{
    WINDOW_MINUTES, add_business_days, compute_buckets, day_window, is_weekend, local_to_utc,
    weekday_name,
};
pub use celebrate::CelebrationTracker;
pub use cycle::{CycleOutput, PipelineOptions, run_cycle};
pub use enrich::{DEFAULT_JOB_BATCH_LIMIT, distinct_job_ids, fetch_job_tags};
pub use report::{UNKNOWN_TECHNICIAN, UNNAMED_TECHNICIAN, build_snapshot, zeroed_snapshot};
