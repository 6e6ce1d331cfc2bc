use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::TaskError;
use crate::habit::Habit;
use crate::pet::PetStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitTask {
    pub id: Uuid,
    pub habit: Habit,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

impl HabitTask {
    pub fn new(habit: Habit, now: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            habit,
            created_at: now,
            expires_at: end_of_day(now),
        }
    }

    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTaskRecord {
    pub id: Uuid,
    pub source_task_id: Uuid,
    pub habit: Habit,
    pub completed_at: NaiveDateTime,
}

/// Last second of the calendar day containing `now`.
fn end_of_day(now: NaiveDateTime) -> NaiveDateTime {
    let next_midnight = now.date().and_time(NaiveTime::MIN) + Duration::days(1);
    next_midnight - Duration::seconds(1)
}

/// Generates and retires per-habit tasks against the wall clock.
///
/// Per habit: no task, then a pending task once its window opens and no
/// cooldown applies, then back to no task on completion (cooldown until the
/// window closes) or on expiry at the end of the day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskScheduler {
    pending: Vec<HabitTask>,
    completed: Vec<CompletedTaskRecord>,
    cooldowns: HashMap<Habit, NaiveDateTime>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        pending: Vec<HabitTask>,
        completed: Vec<CompletedTaskRecord>,
        cooldowns: HashMap<Habit, NaiveDateTime>,
    ) -> Self {
        let mut completed = completed;
        completed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Self {
            pending,
            completed,
            cooldowns,
        }
    }

    pub fn pending(&self) -> &[HabitTask] {
        &self.pending
    }

    /// Completion history, newest first.
    pub fn completed(&self) -> &[CompletedTaskRecord] {
        &self.completed
    }

    pub fn cooldowns(&self) -> &HashMap<Habit, NaiveDateTime> {
        &self.cooldowns
    }

    pub fn cooldown_until(&self, habit: Habit) -> Option<NaiveDateTime> {
        self.cooldowns.get(&habit).copied()
    }

    pub fn in_cooldown(&self, habit: Habit, now: NaiveDateTime) -> bool {
        self.cooldowns.get(&habit).map_or(false, |until| *until > now)
    }

    pub fn find(&self, task_id: Uuid) -> Option<&HabitTask> {
        self.pending.iter().find(|t| t.id == task_id)
    }

    fn has_live_task(&self, habit: Habit, now: NaiveDateTime) -> bool {
        self.pending
            .iter()
            .any(|t| t.habit == habit && !t.is_expired(now))
    }

    /// Create tasks for habits whose window is open, then drop expired ones.
    /// Returns the tasks created by this tick.
    pub fn tick(&mut self, now: NaiveDateTime) -> Vec<HabitTask> {
        let mut created = Vec::new();

        for habit in Habit::ALL {
            if !habit.is_active_at(now) {
                continue;
            }
            if self.has_live_task(habit, now) || self.in_cooldown(habit, now) {
                continue;
            }
            let task = HabitTask::new(habit, now);
            info!(habit = %habit, task_id = %task.id, "task created");
            self.pending.push(task.clone());
            created.push(task);
        }

        let before = self.pending.len();
        self.pending.retain(|t| !t.is_expired(now));
        let purged = before - self.pending.len();
        if purged > 0 {
            debug!(purged, "expired tasks removed");
        }

        created
    }

    /// Complete a pending task and apply the habit's stat rewards to `status`.
    pub fn complete(
        &mut self,
        task_id: Uuid,
        now: NaiveDateTime,
        status: &mut PetStatus,
    ) -> Result<CompletedTaskRecord, TaskError> {
        let idx = self
            .pending
            .iter()
            .position(|t| t.id == task_id && !t.is_expired(now))
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
        let task = self.pending.remove(idx);

        let record = CompletedTaskRecord {
            id: Uuid::new_v4(),
            source_task_id: task.id,
            habit: task.habit,
            completed_at: now,
        };
        self.completed.insert(0, record.clone());

        if let Some(end) = task.habit.window_end(now) {
            self.cooldowns.insert(task.habit, end);
        }

        let rewards = task.habit.rewards();
        status.apply_delta(rewards.happiness, rewards.health, rewards.hunger);

        info!(habit = %task.habit, task_id = %task.id, "task completed");
        Ok(record)
    }

    /// Completions whose timestamp falls on the same calendar day as `now`.
    pub fn completed_on(&self, now: NaiveDateTime) -> usize {
        let today = now.date();
        self.completed
            .iter()
            .filter(|r| r.completed_at.date() == today)
            .count()
    }

    /// Drop pending tasks and cooldowns. History is kept.
    pub fn clear_active(&mut self) {
        self.pending.clear();
        self.cooldowns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    fn tasks_for(scheduler: &TaskScheduler, habit: Habit) -> Vec<&HabitTask> {
        scheduler.pending().iter().filter(|t| t.habit == habit).collect()
    }

    #[test]
    fn test_inactive_window_creates_nothing() {
        let mut scheduler = TaskScheduler::new();
        // 07:30 has only exercise and shower open.
        scheduler.tick(at(4, 7, 30, 0));
        assert!(tasks_for(&scheduler, Habit::Water).is_empty());
        assert!(tasks_for(&scheduler, Habit::Jobs).is_empty());
        assert!(tasks_for(&scheduler, Habit::Sleep).is_empty());
        assert_eq!(tasks_for(&scheduler, Habit::Shower).len(), 1);
    }

    #[test]
    fn test_no_duplicate_pending_task() {
        let mut scheduler = TaskScheduler::new();
        scheduler.tick(at(4, 10, 0, 0));
        scheduler.tick(at(4, 10, 30, 0));
        scheduler.tick(at(4, 11, 0, 0));
        assert_eq!(tasks_for(&scheduler, Habit::Jobs).len(), 1);
        assert_eq!(tasks_for(&scheduler, Habit::Outside).len(), 1);
    }

    #[test]
    fn test_task_expires_at_end_of_day() {
        let task = HabitTask::new(Habit::Jobs, at(4, 9, 15, 0));
        assert_eq!(task.expires_at, at(4, 23, 59, 59));
        assert!(!task.is_expired(at(4, 23, 59, 59)));
        assert!(task.is_expired(at(5, 0, 0, 0)));
    }

    #[test]
    fn test_water_cooldown_example() {
        let mut scheduler = TaskScheduler::new();
        let mut status = PetStatus::new(50, 50, 50);

        let created = scheduler.tick(at(4, 8, 0, 0));
        let water = created.iter().find(|t| t.habit == Habit::Water).unwrap().clone();

        scheduler.complete(water.id, at(4, 8, 0, 0), &mut status).unwrap();
        assert_eq!(scheduler.cooldown_until(Habit::Water), Some(at(4, 8, 1, 0)));

        scheduler.tick(at(4, 8, 0, 30));
        assert!(tasks_for(&scheduler, Habit::Water).is_empty());

        scheduler.tick(at(4, 10, 0, 0));
        assert_eq!(tasks_for(&scheduler, Habit::Water).len(), 1);
    }

    #[test]
    fn test_cooldown_blocks_until_window_end() {
        let mut scheduler = TaskScheduler::new();
        let mut status = PetStatus::new(50, 50, 50);
        scheduler.tick(at(4, 9, 5, 0));
        let jobs = tasks_for(&scheduler, Habit::Jobs)[0].id;
        scheduler.complete(jobs, at(4, 9, 10, 0), &mut status).unwrap();

        assert_eq!(scheduler.cooldown_until(Habit::Jobs), Some(at(4, 12, 0, 0)));
        scheduler.tick(at(4, 11, 59, 0));
        assert!(tasks_for(&scheduler, Habit::Jobs).is_empty());

        // Next day's window opens a fresh task.
        scheduler.tick(at(5, 9, 0, 0));
        assert_eq!(tasks_for(&scheduler, Habit::Jobs).len(), 1);
    }

    #[test]
    fn test_complete_applies_rewards_and_history() {
        let mut scheduler = TaskScheduler::new();
        let mut status = PetStatus::new(50, 50, 50);
        scheduler.tick(at(4, 13, 0, 0));
        let leetcode = tasks_for(&scheduler, Habit::Leetcode)[0].id;
        let outside = tasks_for(&scheduler, Habit::Outside)[0].id;

        scheduler.complete(leetcode, at(4, 13, 5, 0), &mut status).unwrap();
        scheduler.complete(outside, at(4, 13, 6, 0), &mut status).unwrap();

        assert_eq!(status.happiness(), 70);
        assert_eq!(status.health(), 55);
        assert_eq!(scheduler.completed()[0].habit, Habit::Outside);
        assert_eq!(scheduler.completed()[1].habit, Habit::Leetcode);
        assert_eq!(scheduler.completed_on(at(4, 20, 0, 0)), 2);
        assert_eq!(scheduler.completed_on(at(5, 8, 0, 0)), 0);
    }

    #[test]
    fn test_complete_unknown_task_fails() {
        let mut scheduler = TaskScheduler::new();
        let mut status = PetStatus::full();
        let err = scheduler
            .complete(Uuid::new_v4(), at(4, 9, 0, 0), &mut status)
            .unwrap_err();
        assert!(matches!(err, TaskError::NotFound(_)));
    }

    #[test]
    fn test_complete_twice_fails() {
        let mut scheduler = TaskScheduler::new();
        let mut status = PetStatus::full();
        scheduler.tick(at(4, 9, 0, 0));
        let jobs = tasks_for(&scheduler, Habit::Jobs)[0].id;
        scheduler.complete(jobs, at(4, 9, 1, 0), &mut status).unwrap();
        assert!(scheduler.complete(jobs, at(4, 9, 2, 0), &mut status).is_err());
    }

    #[test]
    fn test_expired_tasks_are_purged() {
        let mut scheduler = TaskScheduler::new();
        scheduler.tick(at(4, 17, 0, 0));
        assert!(!tasks_for(&scheduler, Habit::Leetcode).is_empty());
        // Next morning before any leetcode window: yesterday's task is gone.
        scheduler.tick(at(5, 7, 0, 0));
        assert!(tasks_for(&scheduler, Habit::Leetcode).is_empty());
    }

    #[test]
    fn test_missed_window_is_not_backfilled() {
        let mut scheduler = TaskScheduler::new();
        scheduler.tick(at(4, 8, 30, 0));
        // Suspended across the whole jobs window.
        scheduler.tick(at(4, 12, 30, 0));
        assert!(tasks_for(&scheduler, Habit::Jobs).is_empty());
    }
}
