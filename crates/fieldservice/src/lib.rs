mod auth;
mod client;
mod records;
mod retry;
mod types;

pub use auth::{
    Credential, CredentialSource, OAuthClient, SAFETY_MARGIN_SECS, TokenCache, TokenGrant,
};
pub use client::{AppointmentBatch, ClientSettings, FieldServiceApi, HttpFieldService, ShiftBatch};
pub use records::{
    AppointmentRecord, AssignmentRecord, JobRecord, Page, ShiftRecord, parse_timestamp,
};
pub use retry::{RetryDecision, RetryPolicy, retry_decision_for_status, retry_delay, send_with_retry};
pub use types::{AuthError, FetchError, FieldServiceError, ParseError, Result};
