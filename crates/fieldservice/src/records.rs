use std::collections::BTreeSet;

use board_core::{Appointment, JobTags, TechnicianAssignment, TechnicianShift};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::types::ParseError;

/// Paged list envelope shared by every data endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRecord {
    pub id: i64,
    pub job_id: i64,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl AppointmentRecord {
    pub fn into_appointment(self) -> Result<Appointment, ParseError> {
        let scheduled_start = required_timestamp("start", self.start.as_deref())?;
        Ok(Appointment {
            id: self.id,
            job_id: self.job_id,
            scheduled_start,
            status: self.status,
            assigned_technician_id: None,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: i64,
    #[serde(default)]
    pub tag_type_ids: Vec<i64>,
}

impl JobRecord {
    pub fn into_tags(self) -> JobTags {
        JobTags {
            job_id: self.id,
            tag_ids: self.tag_type_ids.into_iter().collect::<BTreeSet<_>>(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecord {
    pub appointment_id: i64,
    pub technician_id: i64,
    #[serde(default)]
    pub technician_name: Option<String>,
}

impl AssignmentRecord {
    pub fn into_assignment(self) -> TechnicianAssignment {
        TechnicianAssignment {
            appointment_id: self.appointment_id,
            technician_id: self.technician_id,
            technician_name: self.technician_name.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftRecord {
    pub technician_id: i64,
    #[serde(default)]
    pub start: Option<String>,
}

impl ShiftRecord {
    pub fn into_shift(self) -> Result<TechnicianShift, ParseError> {
        let start = required_timestamp("shift start", self.start.as_deref())?;
        Ok(TechnicianShift {
            technician_id: self.technician_id,
            start,
        })
    }
}

fn required_timestamp(
    field: &'static str,
    value: Option<&str>,
) -> Result<DateTime<Utc>, ParseError> {
    match value {
        Some(value) => parse_timestamp(field, value),
        None => Err(ParseError {
            field,
            value: String::new(),
            message: "missing value".to_string(),
        }),
    }
}

/// Parses an RFC 3339 timestamp; values without an offset are read as UTC.
pub fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, ParseError> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|err| ParseError {
            field,
            value: value.to_string(),
            message: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_missing_data_to_empty() {
        let page: Page<AppointmentRecord> =
            serde_json::from_str(r#"{"page":1,"pageSize":100}"#).expect("page");
        assert!(page.data.is_empty());
        assert!(!page.has_more);
    }

    #[test]
    fn appointment_record_parses_camel_case_fields() {
        let page: Page<AppointmentRecord> = serde_json::from_str(
            r#"{"page":1,"hasMore":true,"data":[{"id":1,"jobId":10,"start":"2024-06-03T15:00:00Z","status":"Scheduled","extra":"ignored"}]}"#,
        )
        .expect("page");
        assert!(page.has_more);
        let appointment = page.data[0].clone().into_appointment().expect("appointment");
        assert_eq!(appointment.job_id, 10);
        assert_eq!(appointment.status.as_deref(), Some("Scheduled"));
        assert_eq!(
            appointment.scheduled_start.to_rfc3339(),
            "2024-06-03T15:00:00+00:00"
        );
    }

    #[test]
    fn timestamps_without_offset_are_utc() {
        let parsed = parse_timestamp("start", "2024-06-03T15:00:00.25").expect("naive");
        assert_eq!(parsed.to_rfc3339(), "2024-06-03T15:00:00.250+00:00");
        let offset = parse_timestamp("start", "2024-06-03T08:00:00-07:00").expect("offset");
        assert_eq!(offset.to_rfc3339(), "2024-06-03T15:00:00+00:00");
    }

    #[test]
    fn bad_timestamp_reports_field_and_value() {
        let err = parse_timestamp("start", "not-a-date").expect_err("invalid");
        assert_eq!(err.field, "start");
        assert_eq!(err.value, "not-a-date");
    }

    #[test]
    fn null_or_missing_start_fails_only_that_record() {
        let page: Page<AppointmentRecord> = serde_json::from_str(
            r#"{"data":[{"id":1,"jobId":10,"start":"2024-06-03T15:00:00Z"},{"id":2,"jobId":11,"start":null},{"id":3,"jobId":12}]}"#,
        )
        .expect("page");
        assert_eq!(page.data.len(), 3);

        let results: Vec<_> = page
            .data
            .into_iter()
            .map(AppointmentRecord::into_appointment)
            .collect();
        assert_eq!(results[0].as_ref().expect("valid").id, 1);
        let err = results[1].as_ref().expect_err("null start");
        assert_eq!(err.field, "start");
        assert!(results[2].is_err());

        let shift: ShiftRecord =
            serde_json::from_str(r#"{"technicianId":5,"start":null}"#).expect("shift");
        assert_eq!(shift.into_shift().expect_err("null").field, "shift start");
    }

    #[test]
    fn job_record_deduplicates_tags() {
        let job: JobRecord =
            serde_json::from_str(r#"{"id":10,"tagTypeIds":[69,70,69]}"#).expect("job");
        let tags = job.into_tags();
        assert_eq!(tags.tag_ids.len(), 2);
        assert!(tags.has_tag(70));
    }
}
