use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct EmptyRequest {}

#[derive(Debug, Deserialize)]
pub struct DayRequest {
    /// `today`, `next_business_day` or `second_business_day`.
    pub label: String,
}
