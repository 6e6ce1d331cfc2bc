use chrono::{NaiveDate, NaiveDateTime};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::scheduler::CompletedTaskRecord;
use crate::shop::{ItemCategory, PurchaseRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectiveType {
    FinishTwoTasksToday,
    FeedPet,
    MakePetHappy,
}

impl ObjectiveType {
    pub const ALL: [ObjectiveType; 3] = [
        ObjectiveType::FinishTwoTasksToday,
        ObjectiveType::FeedPet,
        ObjectiveType::MakePetHappy,
    ];

    pub fn description(self) -> &'static str {
        match self {
            ObjectiveType::FinishTwoTasksToday => "Finish two tasks today",
            ObjectiveType::FeedPet => "Buy your pet some food",
            ObjectiveType::MakePetHappy => "Treat your pet to an accessory or background",
        }
    }

    /// Evaluate against same-day history. `today` is a local calendar date.
    pub fn is_satisfied(
        self,
        today: NaiveDate,
        completed: &[CompletedTaskRecord],
        purchases: &[PurchaseRecord],
    ) -> bool {
        let bought_today = |wanted: &[ItemCategory]| {
            purchases
                .iter()
                .filter(|p| p.timestamp.date() == today)
                .any(|p| wanted.contains(&p.item.category()))
        };
        match self {
            ObjectiveType::FinishTwoTasksToday => {
                completed
                    .iter()
                    .filter(|r| r.completed_at.date() == today)
                    .count()
                    >= 2
            }
            ObjectiveType::FeedPet => bought_today(&[ItemCategory::Food]),
            ObjectiveType::MakePetHappy => {
                bought_today(&[ItemCategory::Accessory, ItemCategory::Background])
            }
        }
    }
}

impl std::fmt::Display for ObjectiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectiveType::FinishTwoTasksToday => write!(f, "finish_two_tasks_today"),
            ObjectiveType::FeedPet => write!(f, "feed_pet"),
            ObjectiveType::MakePetHappy => write!(f, "make_pet_happy"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyObjective {
    pub objective_type: ObjectiveType,
    pub assigned_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveOutcome {
    Claimed { at: NaiveDateTime },
    Missed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveRecord {
    pub objective: DailyObjective,
    pub outcome: ObjectiveOutcome,
}

/// One daily meta-goal at a time, with an append-only history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectiveTracker {
    current: Option<DailyObjective>,
    history: Vec<ObjectiveRecord>,
}

impl ObjectiveTracker {
    pub fn new(current: Option<DailyObjective>, history: Vec<ObjectiveRecord>) -> Self {
        Self { current, history }
    }

    pub fn current(&self) -> Option<&DailyObjective> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &[ObjectiveRecord] {
        &self.history
    }

    fn has_objective_for(&self, today: NaiveDate) -> bool {
        self.current.map_or(false, |o| o.assigned_date == today)
            || self.history.iter().any(|r| {
                r.objective.assigned_date == today
                    && matches!(r.outcome, ObjectiveOutcome::Claimed { .. })
            })
    }

    /// Archive a stale objective as missed and draw a fresh one for today.
    /// No-op if the current objective is already today's.
    pub fn assign_new<R: Rng>(&mut self, today: NaiveDate, rng: &mut R) -> Option<&DailyObjective> {
        if let Some(current) = self.current {
            if current.assigned_date == today {
                return self.current.as_ref();
            }
            self.history.push(ObjectiveRecord {
                objective: current,
                outcome: ObjectiveOutcome::Missed,
            });
            self.current = None;
        }
        let objective_type = ObjectiveType::ALL[rng.gen_range(0..ObjectiveType::ALL.len())];
        self.current = Some(DailyObjective {
            objective_type,
            assigned_date: today,
        });
        info!(objective = %objective_type, date = %today, "objective assigned");
        self.current.as_ref()
    }

    /// Ensure exactly one objective exists for `today`: a stale one is missed,
    /// and a new one is drawn unless today's was already claimed.
    pub fn check_in<R: Rng>(&mut self, today: NaiveDate, rng: &mut R) -> Option<&DailyObjective> {
        if self.has_objective_for(today) {
            return self.current.as_ref();
        }
        self.assign_new(today, rng)
    }

    /// Archive the current objective as claimed. The caller checks the predicate.
    pub fn complete(&mut self, now: NaiveDateTime) -> Option<ObjectiveRecord> {
        let objective = self.current.take()?;
        let record = ObjectiveRecord {
            objective,
            outcome: ObjectiveOutcome::Claimed { at: now },
        };
        self.history.push(record);
        info!(objective = %objective.objective_type, "objective claimed");
        Some(record)
    }

    pub fn is_current_satisfied(
        &self,
        now: NaiveDateTime,
        completed: &[CompletedTaskRecord],
        purchases: &[PurchaseRecord],
    ) -> bool {
        self.current
            .map_or(false, |o| o.objective_type.is_satisfied(now.date(), completed, purchases))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::Habit;
    use crate::inventory::Accessory;
    use crate::shop::{Food, ShopItem};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn at(d: u32, hour: u32) -> NaiveDateTime {
        day(d).and_hms_opt(hour, 0, 0).unwrap()
    }

    fn completion(d: u32, hour: u32) -> CompletedTaskRecord {
        CompletedTaskRecord {
            id: Uuid::new_v4(),
            source_task_id: Uuid::new_v4(),
            habit: Habit::Jobs,
            completed_at: at(d, hour),
        }
    }

    fn purchase(item: ShopItem, d: u32) -> PurchaseRecord {
        PurchaseRecord {
            id: Uuid::new_v4(),
            item,
            timestamp: at(d, 12),
            coins_cost: item.cost(),
        }
    }

    #[test]
    fn test_two_tasks_flips_on_second_completion() {
        let goal = ObjectiveType::FinishTwoTasksToday;
        let mut completed = vec![completion(3, 22)];
        assert!(!goal.is_satisfied(day(4), &completed, &[]));

        completed.insert(0, completion(4, 9));
        assert!(!goal.is_satisfied(day(4), &completed, &[]));

        completed.insert(0, completion(4, 10));
        assert!(goal.is_satisfied(day(4), &completed, &[]));

        completed.insert(0, completion(4, 11));
        assert!(goal.is_satisfied(day(4), &completed, &[]));
    }

    #[test]
    fn test_purchase_predicates() {
        let food = vec![purchase(ShopItem::Food(Food::Pills), 4)];
        let hat = vec![purchase(ShopItem::Accessory(Accessory::Fedora), 4)];
        assert!(ObjectiveType::FeedPet.is_satisfied(day(4), &[], &food));
        assert!(!ObjectiveType::FeedPet.is_satisfied(day(5), &[], &food));
        assert!(!ObjectiveType::FeedPet.is_satisfied(day(4), &[], &hat));
        assert!(ObjectiveType::MakePetHappy.is_satisfied(day(4), &[], &hat));
        assert!(!ObjectiveType::MakePetHappy.is_satisfied(day(4), &[], &food));
    }

    #[test]
    fn test_assign_new_archives_stale() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut tracker = ObjectiveTracker::default();
        tracker.assign_new(day(4), &mut rng);
        let first = *tracker.current().unwrap();

        // Same day is a no-op.
        tracker.assign_new(day(4), &mut rng);
        assert_eq!(*tracker.current().unwrap(), first);
        assert!(tracker.history().is_empty());

        tracker.assign_new(day(5), &mut rng);
        assert_eq!(tracker.current().unwrap().assigned_date, day(5));
        assert_eq!(tracker.history().len(), 1);
        assert_eq!(tracker.history()[0].outcome, ObjectiveOutcome::Missed);
    }

    #[test]
    fn test_complete_archives_and_clears() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut tracker = ObjectiveTracker::default();
        tracker.assign_new(day(4), &mut rng);
        let record = tracker.complete(at(4, 18)).unwrap();
        assert_eq!(record.outcome, ObjectiveOutcome::Claimed { at: at(4, 18) });
        assert!(tracker.current().is_none());
        assert!(tracker.complete(at(4, 19)).is_none());
    }

    #[test]
    fn test_check_in_one_objective_per_day() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut tracker = ObjectiveTracker::default();
        tracker.check_in(day(4), &mut rng);
        tracker.complete(at(4, 12));

        // Already claimed today: nothing new.
        assert!(tracker.check_in(day(4), &mut rng).is_none());

        // Skipped day 5 entirely; day 6 still gets exactly one.
        let next = *tracker.check_in(day(6), &mut rng).unwrap();
        assert_eq!(next.assigned_date, day(6));
        tracker.check_in(day(6), &mut rng);
        assert_eq!(tracker.history().len(), 1);
    }
}
