#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Mutex;

use async_trait::async_trait;
use board_core::{
    Appointment, Category, CategoryDefinition, DayWindow, JobTags, PollIssue, Targets,
    TechnicianAssignment, TechnicianShift,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use fieldservice::{
    AppointmentBatch, AuthError, FetchError, FieldServiceApi, Result, ShiftBatch,
};
use pipeline::PipelineOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Auth,
    Appointments,
    Jobs,
}

#[derive(Default)]
pub struct FakeApi {
    pub appointments: Vec<Appointment>,
    pub jobs: Vec<JobTags>,
    pub assignments: Vec<TechnicianAssignment>,
    pub shifts: Vec<TechnicianShift>,
    pub broken: Vec<PollIssue>,
    pub failure: Option<Failure>,
    pub job_requests: Mutex<Vec<Vec<i64>>>,
    pub windows: Mutex<Vec<DayWindow>>,
}

#[async_trait]
impl FieldServiceApi for FakeApi {
    async fn fetch_appointments(&self, window: &DayWindow) -> Result<AppointmentBatch> {
        match self.failure {
            Some(Failure::Auth) => {
                return Err(AuthError::Rejected {
                    status: 401,
                    body: "invalid_client".to_string(),
                }
                .into());
            }
            Some(Failure::Appointments) => {
                return Err(FetchError::Status {
                    endpoint: "appointments",
                    status: 500,
                    body: "boom".to_string(),
                }
                .into());
            }
            _ => {}
        }
        self.windows.lock().expect("lock").push(*window);
        let appointments = self
            .appointments
            .iter()
            .filter(|a| window.contains(a.scheduled_start))
            .cloned()
            .collect();
        let issues = if window.label == board_core::DayLabel::Today {
            self.broken.clone()
        } else {
            Vec::new()
        };
        Ok(AppointmentBatch {
            appointments,
            issues,
        })
    }

    async fn fetch_jobs(&self, job_ids: &[i64]) -> Result<Vec<JobTags>> {
        if self.failure == Some(Failure::Jobs) {
            return Err(FetchError::Decode {
                endpoint: "jobs",
                message: "expected value".to_string(),
            }
            .into());
        }
        self.job_requests.lock().expect("lock").push(job_ids.to_vec());
        Ok(self
            .jobs
            .iter()
            .filter(|job| job_ids.contains(&job.job_id))
            .cloned()
            .collect())
    }

    async fn fetch_assignments(&self, appointment_ids: &[i64]) -> Result<Vec<TechnicianAssignment>> {
        Ok(self
            .assignments
            .iter()
            .filter(|a| appointment_ids.contains(&a.appointment_id))
            .cloned()
            .collect())
    }

    async fn fetch_shifts(&self, window: &DayWindow) -> Result<ShiftBatch> {
        Ok(ShiftBatch {
            shifts: self
                .shifts
                .iter()
                .filter(|s| window.contains(s.start))
                .cloned()
                .collect(),
            issues: Vec::new(),
        })
    }
}

pub fn ts(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .expect("ts")
        .with_timezone(&Utc)
}

pub fn appointment(id: i64, job_id: i64, start: &str) -> Appointment {
    Appointment {
        id,
        job_id,
        scheduled_start: ts(start),
        status: Some("Scheduled".to_string()),
        assigned_technician_id: None,
    }
}

pub fn job(job_id: i64, tags: &[i64]) -> JobTags {
    JobTags {
        job_id,
        tag_ids: tags.iter().copied().collect::<BTreeSet<_>>(),
    }
}

pub fn assignment(appointment_id: i64, technician_id: i64, name: &str) -> TechnicianAssignment {
    TechnicianAssignment {
        appointment_id,
        technician_id,
        technician_name: name.to_string(),
    }
}

pub fn shift(technician_id: i64, start: &str) -> TechnicianShift {
    TechnicianShift {
        technician_id,
        start: ts(start),
    }
}

pub fn options(tz: Tz) -> PipelineOptions {
    PipelineOptions::new(
        CategoryDefinition::new()
            .with(Category::L1Op, 38473266)
            .with(Category::L1NoOp, 74799391)
            .with(Category::L2NoOp, 69)
            .with(Category::L3NoOp, 70),
        Targets::new()
            .with(Category::L1NoOp, 3)
            .with(Category::L2NoOp, 5)
            .with(Category::L3NoOp, 3),
        tz,
    )
}
