use std::collections::HashSet;

use board_core::{Category, Celebration, DayCard, DayLabel};
use chrono::NaiveDate;

/// Remembers which (category, day) targets were already announced today.
///
/// The memory is cleared the first time it is consulted on a new local date,
/// so each target can be celebrated at most once per day.
#[derive(Debug, Clone, Default)]
pub struct CelebrationTracker {
    date: Option<NaiveDate>,
    announced: HashSet<(Category, DayLabel)>,
}

impl CelebrationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Targets newly met in `days`, as seen on `local_date`.
    pub fn observe(&mut self, local_date: NaiveDate, days: &[DayCard]) -> Vec<Celebration> {
        if self.date != Some(local_date) {
            self.announced.clear();
            self.date = Some(local_date);
        }
        let mut fresh = Vec::new();
        for card in days {
            for metric in card.metrics.iter().filter(|metric| metric.met) {
                if self.announced.insert((metric.category, card.label)) {
                    fresh.push(Celebration {
                        category: metric.category,
                        label: card.label,
                        date: card.date,
                    });
                }
            }
        }
        fresh
    }

    pub fn is_announced(&self, category: Category, label: DayLabel) -> bool {
        self.announced.contains(&(category, label))
    }
}
