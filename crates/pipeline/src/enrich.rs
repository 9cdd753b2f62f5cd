use std::collections::{HashMap, HashSet};

use board_core::JobTags;
use fieldservice::{FieldServiceApi, Result};

/// Upper bound on job ids sent in one lookup.
pub const DEFAULT_JOB_BATCH_LIMIT: usize = 50;

/// First `limit` distinct ids, in the order they were first seen.
pub fn distinct_job_ids(job_ids: &[i64], limit: usize) -> Vec<i64> {
    let mut seen = HashSet::new();
    job_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .take(limit)
        .collect()
}

/// Looks up tags for at most `batch_limit` distinct jobs.
///
/// Every requested id is present in the result; jobs the server did not
/// return map to an empty tag set. Jobs past the cap are left out entirely
/// and contribute no tags.
pub async fn fetch_job_tags(
    api: &dyn FieldServiceApi,
    job_ids: &[i64],
    batch_limit: usize,
) -> Result<HashMap<i64, JobTags>> {
    let requested = distinct_job_ids(job_ids, batch_limit);
    let distinct = job_ids.iter().collect::<HashSet<_>>().len();
    if distinct > requested.len() {
        tracing::debug!(
            distinct,
            batch_limit,
            "job lookup capped; remaining jobs are not enriched"
        );
    }

    let mut tags: HashMap<i64, JobTags> = requested
        .iter()
        .map(|id| (*id, JobTags::empty(*id)))
        .collect();
    if requested.is_empty() {
        return Ok(tags);
    }
    for job in api.fetch_jobs(&requested).await? {
        if let Some(slot) = tags.get_mut(&job.job_id) {
            *slot = job;
        }
    }
    Ok(tags)
}
