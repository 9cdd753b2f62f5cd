use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Op / No-Op level a job can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "L1_Op")]
    L1Op,
    #[serde(rename = "L1_No_Op")]
    L1NoOp,
    #[serde(rename = "L2_Op")]
    L2Op,
    #[serde(rename = "L2_No_Op")]
    L2NoOp,
    #[serde(rename = "L3_Op")]
    L3Op,
    #[serde(rename = "L3_No_Op")]
    L3NoOp,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::L1Op,
        Category::L1NoOp,
        Category::L2Op,
        Category::L2NoOp,
        Category::L3Op,
        Category::L3NoOp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::L1Op => "L1_Op",
            Category::L1NoOp => "L1_No_Op",
            Category::L2Op => "L2_Op",
            Category::L2NoOp => "L2_No_Op",
            Category::L3Op => "L3_Op",
            Category::L3NoOp => "L3_No_Op",
        }
    }

    /// Human label used on the board, e.g. "L3 No Op".
    pub fn display_name(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown category {}", value))
    }
}

/// One of the three tracked days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayLabel {
    Today,
    NextBusinessDay,
    SecondBusinessDay,
}

impl DayLabel {
    pub const ALL: [DayLabel; 3] = [
        DayLabel::Today,
        DayLabel::NextBusinessDay,
        DayLabel::SecondBusinessDay,
    ];

    pub fn index(&self) -> usize {
        match self {
            DayLabel::Today => 0,
            DayLabel::NextBusinessDay => 1,
            DayLabel::SecondBusinessDay => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayLabel::Today => "today",
            DayLabel::NextBusinessDay => "next_business_day",
            DayLabel::SecondBusinessDay => "second_business_day",
        }
    }
}

impl fmt::Display for DayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked calendar day and its query window in UTC.
///
/// `start` is local midnight and `end` is local 23:59 of `date`, so the last
/// minute of the day falls outside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub label: DayLabel,
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub job_id: i64,
    pub scheduled_start: DateTime<Utc>,
    pub status: Option<String>,
    pub assigned_technician_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTags {
    pub job_id: i64,
    pub tag_ids: BTreeSet<i64>,
}

impl JobTags {
    pub fn empty(job_id: i64) -> Self {
        Self {
            job_id,
            tag_ids: BTreeSet::new(),
        }
    }

    pub fn has_tag(&self, tag_id: i64) -> bool {
        self.tag_ids.contains(&tag_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicianAssignment {
    pub appointment_id: i64,
    pub technician_id: i64,
    pub technician_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicianShift {
    pub technician_id: i64,
    pub start: DateTime<Utc>,
}

/// Category to tag id mapping. Always external configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryDefinition {
    tags: BTreeMap<Category, i64>,
}

impl CategoryDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: Category, tag_id: i64) -> Self {
        self.insert(category, tag_id);
        self
    }

    pub fn insert(&mut self, category: Category, tag_id: i64) {
        self.tags.insert(category, tag_id);
    }

    pub fn tag_for(&self, category: Category) -> Option<i64> {
        self.tags.get(&category).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, i64)> + '_ {
        self.tags.iter().map(|(category, tag_id)| (*category, *tag_id))
    }

    pub fn categories(&self) -> Vec<Category> {
        self.tags.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Tag ids claimed by more than one category.
    pub fn shared_tags(&self) -> Vec<(i64, Vec<Category>)> {
        let mut by_tag: BTreeMap<i64, Vec<Category>> = BTreeMap::new();
        for (category, tag_id) in self.iter() {
            by_tag.entry(tag_id).or_default().push(category);
        }
        by_tag
            .into_iter()
            .filter(|(_, categories)| categories.len() > 1)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Targets {
    targets: BTreeMap<Category, i64>,
}

impl Targets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: Category, target: i64) -> Self {
        self.targets.insert(category, target);
        self
    }

    pub fn insert(&mut self, category: Category, target: i64) {
        self.targets.insert(category, target);
    }

    pub fn target_for(&self, category: Category) -> i64 {
        self.targets.get(&category).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnicianKey {
    Known(i64),
    Unknown,
}

type MetricKey = (Option<TechnicianKey>, Category, DayLabel);

/// Counts per (optional technician, category, day). Rebuilt every pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricTable {
    counts: BTreeMap<MetricKey, u32>,
}

impl MetricTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, group: Option<TechnicianKey>, category: Category, day: DayLabel) {
        *self.counts.entry((group, category, day)).or_insert(0) += 1;
    }

    pub fn count(&self, group: Option<TechnicianKey>, category: Category, day: DayLabel) -> u32 {
        self.counts
            .get(&(group, category, day))
            .copied()
            .unwrap_or(0)
    }

    /// Adds every count in `other` to this table.
    pub fn merge(&mut self, other: MetricTable) {
        for (key, count) in other.counts {
            *self.counts.entry(key).or_insert(0) += count;
        }
    }

    /// Count for a category and day across every group.
    pub fn total(&self, category: Category, day: DayLabel) -> u32 {
        self.counts
            .iter()
            .filter(|((_, c, d), _)| *c == category && *d == day)
            .map(|(_, count)| *count)
            .sum()
    }

    pub fn groups(&self) -> BTreeSet<Option<TechnicianKey>> {
        self.counts.keys().map(|(group, _, _)| *group).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub delta: i64,
    pub met: bool,
}

pub fn compare(observed: i64, target: i64) -> Comparison {
    let delta = target.saturating_sub(observed);
    Comparison {
        delta,
        met: delta <= 0,
    }
}

/// Non-fatal problem seen while polling, e.g. an unparsable record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollIssue {
    pub record: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMetric {
    pub category: Category,
    pub observed: u32,
    pub target: i64,
    pub delta: i64,
    pub met: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicianRow {
    pub technician_id: Option<i64>,
    pub name: String,
    pub counts: BTreeMap<Category, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCard {
    pub label: DayLabel,
    pub date: NaiveDate,
    pub weekday: String,
    pub title: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub metrics: Vec<CategoryMetric>,
    pub technicians: Vec<TechnicianRow>,
}

impl DayCard {
    pub fn metric(&self, category: Category) -> Option<&CategoryMetric> {
        self.metrics.iter().find(|metric| metric.category == category)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Celebration {
    pub category: Category,
    pub label: DayLabel,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    pub timezone: String,
    pub days: Vec<DayCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub issues: Vec<PollIssue>,
    pub celebrations: Vec<Celebration>,
}

impl DashboardSnapshot {
    pub fn day(&self, label: DayLabel) -> Option<&DayCard> {
        self.days.iter().find(|card| card.label == label)
    }
}
