use std::collections::{BTreeMap, HashMap};

use board_core::{
    Appointment, CategoryDefinition, DayLabel, DayWindow, JobTags, MetricTable, TechnicianAssignment,
    TechnicianKey,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Appointment id to assigned technician. The first assignment seen wins.
#[derive(Debug, Clone, Default)]
pub struct AssignmentIndex {
    by_appointment: HashMap<i64, TechnicianAssignment>,
}

impl AssignmentIndex {
    pub fn new(assignments: impl IntoIterator<Item = TechnicianAssignment>) -> Self {
        let mut index = Self::default();
        index.extend(assignments);
        index
    }

    pub fn extend(&mut self, assignments: impl IntoIterator<Item = TechnicianAssignment>) {
        for assignment in assignments {
            self.by_appointment
                .entry(assignment.appointment_id)
                .or_insert(assignment);
        }
    }

    pub fn get(&self, appointment_id: i64) -> Option<&TechnicianAssignment> {
        self.by_appointment.get(&appointment_id)
    }

    pub fn technician_for(&self, appointment: &Appointment) -> TechnicianKey {
        self.get(appointment.id)
            .map(|assignment| assignment.technician_id)
            .or(appointment.assigned_technician_id)
            .map(TechnicianKey::Known)
            .unwrap_or(TechnicianKey::Unknown)
    }

    /// Non-empty technician names keyed by technician id.
    pub fn names(&self) -> BTreeMap<i64, String> {
        let mut names = BTreeMap::new();
        for assignment in self.by_appointment.values() {
            let name = assignment.technician_name.trim();
            if !name.is_empty() {
                names
                    .entry(assignment.technician_id)
                    .or_insert_with(|| name.to_string());
            }
        }
        names
    }

    pub fn len(&self) -> usize {
        self.by_appointment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_appointment.is_empty()
    }
}

/// Bucket whose local date equals the instant's date in `tz`, if the instant
/// also falls inside that bucket's window.
pub fn bucket_for(instant: DateTime<Utc>, buckets: &[DayWindow], tz: &Tz) -> Option<DayLabel> {
    let local_date = instant.with_timezone(tz).date_naive();
    buckets
        .iter()
        .find(|window| window.date == local_date && window.contains(instant))
        .map(|window| window.label)
}

/// Counts appointments per category and day, optionally per technician.
///
/// An appointment counts once toward every category whose tag its job
/// carries. Appointments outside every bucket, or whose job has no tags,
/// contribute nothing. The result does not depend on input order.
pub fn aggregate(
    appointments: &[Appointment],
    job_tags: &HashMap<i64, JobTags>,
    categories: &CategoryDefinition,
    buckets: &[DayWindow],
    tz: &Tz,
    technicians: Option<&AssignmentIndex>,
) -> MetricTable {
    let mut table = MetricTable::new();
    for appointment in appointments {
        let Some(label) = bucket_for(appointment.scheduled_start, buckets, tz) else {
            continue;
        };
        let Some(tags) = job_tags.get(&appointment.job_id) else {
            continue;
        };
        let group = technicians.map(|index| index.technician_for(appointment));
        for (category, tag_id) in categories.iter() {
            if tags.has_tag(tag_id) {
                table.increment(group, category, label);
            }
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use board_core::Category;
    use chrono::NaiveDate;

    use super::*;
    use crate::calendar::compute_buckets;

    fn ts(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("ts")
            .with_timezone(&Utc)
    }

    fn appointment(id: i64, job_id: i64, start: &str) -> Appointment {
        Appointment {
            id,
            job_id,
            scheduled_start: ts(start),
            status: None,
            assigned_technician_id: None,
        }
    }

    fn tags(job_id: i64, ids: &[i64]) -> (i64, JobTags) {
        (
            job_id,
            JobTags {
                job_id,
                tag_ids: ids.iter().copied().collect::<BTreeSet<_>>(),
            },
        )
    }

    fn monday_buckets() -> [DayWindow; 3] {
        let monday = NaiveDate::from_ymd_opt(2024, 6, 3).expect("date");
        compute_buckets(monday, &Tz::UTC)
    }

    fn definition() -> CategoryDefinition {
        CategoryDefinition::new()
            .with(Category::L1NoOp, 74799391)
            .with(Category::L2Op, 38473266)
            .with(Category::L3NoOp, 70)
    }

    #[test]
    fn counts_tagged_appointment_in_its_bucket() {
        let appointments = vec![appointment(1, 10, "2024-06-03T15:00:00Z")];
        let job_tags = HashMap::from([tags(10, &[74799391])]);
        let table = aggregate(
            &appointments,
            &job_tags,
            &definition(),
            &monday_buckets(),
            &Tz::UTC,
            None,
        );
        assert_eq!(table.count(None, Category::L1NoOp, DayLabel::Today), 1);
        assert_eq!(table.count(None, Category::L2Op, DayLabel::Today), 0);
        assert_eq!(table.total(Category::L1NoOp, DayLabel::NextBusinessDay), 0);
    }

    #[test]
    fn one_appointment_counts_toward_every_matching_category() {
        let appointments = vec![appointment(1, 10, "2024-06-04T09:00:00Z")];
        let job_tags = HashMap::from([tags(10, &[74799391, 70, 5])]);
        let table = aggregate(
            &appointments,
            &job_tags,
            &definition(),
            &monday_buckets(),
            &Tz::UTC,
            None,
        );
        let day = DayLabel::NextBusinessDay;
        assert_eq!(table.count(None, Category::L1NoOp, day), 1);
        assert_eq!(table.count(None, Category::L3NoOp, day), 1);
        assert_eq!(table.count(None, Category::L2Op, day), 0);
    }

    #[test]
    fn appointments_outside_every_bucket_are_ignored() {
        let appointments = vec![
            appointment(1, 10, "2024-06-02T15:00:00Z"),
            appointment(2, 10, "2024-06-03T23:59:30Z"),
            appointment(3, 10, "2024-06-07T10:00:00Z"),
        ];
        let job_tags = HashMap::from([tags(10, &[74799391])]);
        let table = aggregate(
            &appointments,
            &job_tags,
            &definition(),
            &monday_buckets(),
            &Tz::UTC,
            None,
        );
        assert!(table.is_empty());
    }

    #[test]
    fn untagged_or_unknown_jobs_contribute_nothing() {
        let appointments = vec![
            appointment(1, 10, "2024-06-03T09:00:00Z"),
            appointment(2, 11, "2024-06-03T10:00:00Z"),
        ];
        let job_tags = HashMap::from([tags(10, &[])]);
        let table = aggregate(
            &appointments,
            &job_tags,
            &definition(),
            &monday_buckets(),
            &Tz::UTC,
            None,
        );
        assert!(table.is_empty());
    }

    #[test]
    fn order_of_appointments_does_not_change_counts() {
        let mut appointments = vec![
            appointment(1, 10, "2024-06-03T09:00:00Z"),
            appointment(2, 11, "2024-06-04T10:00:00Z"),
            appointment(3, 10, "2024-06-05T11:00:00Z"),
            appointment(4, 12, "2024-06-03T12:00:00Z"),
        ];
        let job_tags = HashMap::from([
            tags(10, &[74799391]),
            tags(11, &[38473266, 70]),
            tags(12, &[70]),
        ]);
        let buckets = monday_buckets();
        let forward = aggregate(
            &appointments,
            &job_tags,
            &definition(),
            &buckets,
            &Tz::UTC,
            None,
        );
        appointments.reverse();
        appointments.swap(0, 2);
        let shuffled = aggregate(
            &appointments,
            &job_tags,
            &definition(),
            &buckets,
            &Tz::UTC,
            None,
        );
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn local_date_decides_the_bucket() {
        // 02:00Z on Tuesday is still Monday evening in Chicago.
        let tz = Tz::America__Chicago;
        let monday = NaiveDate::from_ymd_opt(2024, 6, 3).expect("date");
        let buckets = compute_buckets(monday, &tz);
        assert_eq!(
            bucket_for(ts("2024-06-04T02:00:00Z"), &buckets, &tz),
            Some(DayLabel::Today)
        );
        assert_eq!(
            bucket_for(ts("2024-06-04T06:00:00Z"), &buckets, &tz),
            Some(DayLabel::NextBusinessDay)
        );
    }

    #[test]
    fn grouping_uses_assignment_then_appointment_then_unknown() {
        let mut direct = appointment(2, 10, "2024-06-03T10:00:00Z");
        direct.assigned_technician_id = Some(8);
        let appointments = vec![
            appointment(1, 10, "2024-06-03T09:00:00Z"),
            direct,
            appointment(3, 10, "2024-06-03T11:00:00Z"),
        ];
        let index = AssignmentIndex::new(vec![TechnicianAssignment {
            appointment_id: 1,
            technician_id: 7,
            technician_name: "Dana".to_string(),
        }]);
        let job_tags = HashMap::from([tags(10, &[74799391])]);
        let table = aggregate(
            &appointments,
            &job_tags,
            &definition(),
            &monday_buckets(),
            &Tz::UTC,
            Some(&index),
        );
        let today = DayLabel::Today;
        let l1 = Category::L1NoOp;
        assert_eq!(table.count(Some(TechnicianKey::Known(7)), l1, today), 1);
        assert_eq!(table.count(Some(TechnicianKey::Known(8)), l1, today), 1);
        assert_eq!(table.count(Some(TechnicianKey::Unknown), l1, today), 1);
        assert_eq!(table.total(l1, today), 3);
        assert_eq!(table.count(None, l1, today), 0);
    }

    #[test]
    fn first_assignment_wins_and_names_skip_blanks() {
        let index = AssignmentIndex::new(vec![
            TechnicianAssignment {
                appointment_id: 1,
                technician_id: 7,
                technician_name: "Dana".to_string(),
            },
            TechnicianAssignment {
                appointment_id: 1,
                technician_id: 9,
                technician_name: "Lee".to_string(),
            },
            TechnicianAssignment {
                appointment_id: 2,
                technician_id: 11,
                technician_name: "  ".to_string(),
            },
        ]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(1).map(|a| a.technician_id), Some(7));
        let names = index.names();
        assert_eq!(names.get(&7).map(String::as_str), Some("Dana"));
        assert!(!names.contains_key(&11));
    }
}
