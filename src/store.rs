// Task store: the ordered task list and its persistence

use crate::error::ValidationError;
use crate::filter::{SortKey, StatusFilter, View};
use crate::storage::Storage;
use crate::task::{NewTask, Task, TaskEdit, generate_id, validate_date, validate_text, validate_time};
use chrono::Utc;
use eyre::{Context, Result};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Key the task list is stored under
pub const STORAGE_KEY: &str = "todoTasks";

/// Asks the user to approve a destructive action
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Task counts plus the completed share, rounded to a whole percent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub all: usize,
    pub pending: usize,
    pub completed: usize,
    pub percent: u8,
}

/// Ordered task collection persisted to a [`Storage`] after every mutation
///
/// New tasks go to the front. The store owns its tasks outright; callers get
/// shared references or views.
pub struct TaskStore<S: Storage> {
    storage: S,
    tasks: Vec<Task>,
}

impl<S: Storage> TaskStore<S> {
    /// Load the task list from `storage`
    ///
    /// A missing value, or one that is not a JSON array, yields an empty
    /// list. Records that fail to parse are skipped one by one so the rest
    /// survive the next save. A storage read failure is returned, since
    /// writing over data we could not read would lose it.
    pub fn open(storage: S) -> Result<Self> {
        let raw = storage.get_item(STORAGE_KEY).context("Failed to read task list")?;
        let tasks = match raw {
            None => {
                debug!("No saved tasks, starting empty");
                Vec::new()
            }
            Some(json) => match serde_json::from_str::<Vec<serde_json::Value>>(&json) {
                Ok(values) => dedup_ids(parse_tasks(values)),
                Err(e) => {
                    warn!(error = ?e, "Saved tasks are malformed, starting empty");
                    Vec::new()
                }
            },
        };

        info!(count = tasks.len(), "Loaded tasks");
        Ok(Self { storage, tasks })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// All tasks in store order (newest additions first)
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Resolve a full id or a unique id suffix (the short id in listings)
    pub fn resolve(&self, id_or_suffix: &str) -> Result<&Task> {
        if id_or_suffix.is_empty() {
            return Err(ValidationError::UnknownTask(String::new()).into());
        }
        if let Some(task) = self.get(id_or_suffix) {
            return Ok(task);
        }

        let mut matches = self.tasks.iter().filter(|t| t.id.ends_with(id_or_suffix));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Ok(task),
            (Some(_), _) => Err(ValidationError::AmbiguousId(id_or_suffix.to_string()).into()),
            (None, _) => Err(ValidationError::UnknownTask(id_or_suffix.to_string()).into()),
        }
    }

    /// Create a task at the front of the list, returning its id
    ///
    /// Empty text (after trimming) or a malformed date/time is rejected and
    /// leaves the store untouched.
    pub fn add(&mut self, new: NewTask) -> Result<String> {
        let text = validate_text(&new.text)?;
        let date = validate_date(new.date.as_deref())?;
        let time = validate_time(new.time.as_deref())?;

        let task = Task {
            id: generate_id(),
            text,
            completed: false,
            date,
            time,
            category: new.category,
            priority: new.priority,
            created_at: Utc::now(),
            completed_at: None,
        };
        let id = task.id.clone();

        self.tasks.insert(0, task);
        self.save()?;

        info!(id = %id, "Added task");
        Ok(id)
    }

    /// Flip a task's completion flag
    ///
    /// Returns the new flag, or `None` when no task has this id (nothing is
    /// persisted in that case).
    pub fn toggle(&mut self, id: &str) -> Result<Option<bool>> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(id, "toggle: no such task");
            return Ok(None);
        };

        task.completed = !task.completed;
        task.completed_at = task.completed.then(Utc::now);
        let completed = task.completed;

        self.save()?;
        info!(id, completed, "Toggled task");
        Ok(Some(completed))
    }

    /// Overwrite a task's editable fields
    ///
    /// Validation runs before the lookup, so bad input is reported even for
    /// an unknown id. Returns `false` when no task has this id.
    pub fn edit(&mut self, id: &str, edit: TaskEdit) -> Result<bool> {
        let text = validate_text(&edit.text)?;
        let date = validate_date(edit.date.as_deref())?;
        let time = validate_time(edit.time.as_deref())?;

        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(id, "edit: no such task");
            return Ok(false);
        };

        task.text = text;
        task.date = date;
        task.time = time;
        task.category = edit.category;
        task.priority = edit.priority;

        self.save()?;
        info!(id, "Edited task");
        Ok(true)
    }

    /// Remove the task with this id once `confirm` approves
    ///
    /// Returns whether a task was removed. Unknown ids are not prompted for.
    pub fn delete(&mut self, id: &str, confirm: &mut impl Confirm) -> Result<bool> {
        let Some(index) = self.tasks.iter().position(|t| t.id == id) else {
            debug!(id, "delete: no such task");
            return Ok(false);
        };

        if !confirm.confirm("Are you sure you want to delete this task?") {
            debug!(id, "delete: declined");
            return Ok(false);
        }

        self.tasks.remove(index);
        self.save()?;
        info!(id, "Deleted task");
        Ok(true)
    }

    /// Remove every completed task once `confirm` approves
    ///
    /// Returns the number removed; with nothing completed there is no prompt.
    pub fn clear_completed(&mut self, confirm: &mut impl Confirm) -> Result<usize> {
        let count = self.tasks.iter().filter(|t| t.completed).count();
        if count == 0 {
            return Ok(0);
        }

        if !confirm.confirm(&format!("Delete {} completed task(s)?", count)) {
            debug!(count, "clear_completed: declined");
            return Ok(0);
        }

        self.tasks.retain(|t| !t.completed);
        self.save()?;
        info!(count, "Cleared completed tasks");
        Ok(count)
    }

    pub fn view(&self, filter: StatusFilter, sort: SortKey) -> View<'_> {
        View::new(&self.tasks, filter, sort)
    }

    pub fn stats(&self) -> Stats {
        let all = self.tasks.len();
        let completed = self.tasks.iter().filter(|t| t.completed).count();
        let percent = if all == 0 {
            0
        } else {
            ((completed as f64 / all as f64) * 100.0).round() as u8
        };

        Stats {
            all,
            pending: all - completed,
            completed,
            percent,
        }
    }

    fn save(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.tasks).context("Failed to serialize tasks")?;
        self.storage
            .set_item(STORAGE_KEY, &json)
            .context("Failed to save tasks")?;
        debug!(count = self.tasks.len(), "Saved tasks");
        Ok(())
    }
}

// Parse each saved record on its own, skipping the ones that fail
fn parse_tasks(values: Vec<serde_json::Value>) -> Vec<Task> {
    let total = values.len();
    let tasks: Vec<Task> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<Task>(value) {
            Ok(task) => Some(task),
            Err(e) => {
                warn!(index, error = %e, "Skipping malformed task");
                None
            }
        })
        .collect();
    if tasks.len() != total {
        warn!(skipped = total - tasks.len(), total, "Some saved tasks could not be loaded");
    }
    tasks
}

// Keep the first occurrence of each id
fn dedup_ids(tasks: Vec<Task>) -> Vec<Task> {
    let mut seen = HashSet::new();
    let before = tasks.len();
    let tasks: Vec<Task> = tasks.into_iter().filter(|t| seen.insert(t.id.clone())).collect();
    if tasks.len() != before {
        warn!(dropped = before - tasks.len(), "Dropped tasks with duplicate ids");
    }
    tasks
}
