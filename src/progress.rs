use std::collections::HashSet;

use thiserror::Error;

use crate::course::{CourseDay, DAY_COUNT};

#[derive(Error, Debug, PartialEq, Eq)]
#[error("task {0} is not part of this day")]
pub struct UnknownTask(pub String);

/// Completion state for one day view. Lives as long as the view does.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    day: u8,
    next_day: Option<u8>,
    tasks: Vec<String>,
    completed: HashSet<String>,
    bonus_unlocked: bool,
}

impl ProgressTracker {
    pub fn new(day: u8, next_day: Option<u8>, task_ids: impl IntoIterator<Item = String>) -> Self {
        let mut tasks: Vec<String> = Vec::new();
        for id in task_ids {
            if !tasks.contains(&id) {
                tasks.push(id);
            }
        }
        ProgressTracker {
            day,
            next_day,
            tasks,
            completed: HashSet::new(),
            bonus_unlocked: false,
        }
    }

    pub fn for_day(day: &CourseDay) -> Self {
        Self::new(day.day, day.next_day, day.tasks.iter().map(|t| t.id.clone()))
    }

    /// Flips one task. Returns whether the task is now complete.
    pub fn toggle(&mut self, task_id: &str) -> Result<bool, UnknownTask> {
        if !self.tasks.iter().any(|t| t == task_id) {
            return Err(UnknownTask(task_id.to_string()));
        }
        let done = if self.completed.remove(task_id) {
            false
        } else {
            self.completed.insert(task_id.to_string());
            true
        };
        if done && self.all_complete() && !self.bonus_unlocked {
            tracing::info!(day = self.day, "all tasks complete, bonus unlocked");
            self.bonus_unlocked = true;
        }
        Ok(done)
    }

    pub fn is_complete(&self, task_id: &str) -> bool {
        self.completed.contains(task_id)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn total(&self) -> usize {
        self.tasks.len()
    }

    pub fn fraction(&self) -> f64 {
        if self.tasks.is_empty() {
            return 1.0;
        }
        self.completed.len() as f64 / self.tasks.len() as f64
    }

    pub fn all_complete(&self) -> bool {
        self.completed.len() == self.tasks.len()
    }

    pub fn bonus_visible(&self) -> bool {
        self.bonus_unlocked
    }

    /// The next day, once this one is done.
    pub fn next_enabled(&self) -> Option<u8> {
        self.next_day.filter(|_| self.all_complete())
    }

    /// Sidebar rule: earlier days and today are always open, later ones need today finished.
    pub fn can_visit(&self, day: u8) -> bool {
        (1..=DAY_COUNT).contains(&day) && (day <= self.day || self.all_complete())
    }
}
