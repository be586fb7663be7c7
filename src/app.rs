// UI event handlers
//
// Each handler takes the store by reference, runs one operation and reports
// the outcome as a notification. Errors stop here: user mistakes and storage
// failures alike become error notifications.

use crate::error::ValidationError;
use crate::storage::Storage;
use crate::store::{Confirm, TaskStore};
use crate::task::{Category, NewTask, Priority, Task, TaskEdit};
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

/// Transient message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }
}

/// Receives notifications
pub trait Notifier {
    fn notify(&mut self, notification: Notification);
}

impl Notifier for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}

fn report(notifier: &mut impl Notifier, err: eyre::Report) {
    match err.downcast_ref::<ValidationError>() {
        Some(validation) => notifier.notify(Notification::error(validation.to_string())),
        None => {
            error!(error = ?err, "Operation failed");
            notifier.notify(Notification::error(format!("{:#}", err)));
        }
    }
}

/// Resolve a user-supplied id, reporting failure
fn resolve_id<S: Storage>(store: &TaskStore<S>, id: &str, notifier: &mut impl Notifier) -> Option<String> {
    match store.resolve(id) {
        Ok(task) => Some(task.id.clone()),
        Err(e) => {
            report(notifier, e);
            None
        }
    }
}

/// Add a task; returns its id on success
pub fn add_task<S: Storage>(store: &mut TaskStore<S>, new: NewTask, notifier: &mut impl Notifier) -> Option<String> {
    match store.add(new) {
        Ok(id) => {
            notifier.notify(Notification::success("Task added successfully!"));
            Some(id)
        }
        Err(e) => {
            report(notifier, e);
            None
        }
    }
}

/// Toggle a task; returns its new completion flag on success
pub fn toggle_task<S: Storage>(store: &mut TaskStore<S>, id: &str, notifier: &mut impl Notifier) -> Option<bool> {
    let id = resolve_id(store, id, notifier)?;
    match store.toggle(&id) {
        Ok(Some(completed)) => {
            let message = if completed { "Task completed!" } else { "Task reopened!" };
            notifier.notify(Notification::success(message));
            Some(completed)
        }
        Ok(None) => None,
        Err(e) => {
            report(notifier, e);
            None
        }
    }
}

/// Replace a task's fields; returns whether it was updated
pub fn edit_task<S: Storage>(
    store: &mut TaskStore<S>,
    id: &str,
    edit: TaskEdit,
    notifier: &mut impl Notifier,
) -> bool {
    let Some(id) = resolve_id(store, id, notifier) else {
        return false;
    };

    match store.edit(&id, edit) {
        Ok(true) => {
            notifier.notify(Notification::success("Task updated successfully!"));
            true
        }
        Ok(false) => false,
        Err(e) => {
            report(notifier, e);
            false
        }
    }
}

/// Fields a user chose to change; `None` keeps the task's current value
///
/// An empty date or time is a change: it clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialEdit {
    pub text: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
}

impl PartialEdit {
    /// Fill the unchanged fields from `current`
    pub fn merge(self, current: &Task) -> TaskEdit {
        let current = TaskEdit::from(current);
        TaskEdit {
            text: self.text.unwrap_or(current.text),
            date: self.date.or(current.date),
            time: self.time.or(current.time),
            category: self.category.unwrap_or(current.category),
            priority: self.priority.unwrap_or(current.priority),
        }
    }
}

/// Change only the given fields of a task; returns whether it was updated
pub fn edit_task_fields<S: Storage>(
    store: &mut TaskStore<S>,
    id: &str,
    changes: PartialEdit,
    notifier: &mut impl Notifier,
) -> bool {
    let edit = match store.resolve(id) {
        Ok(task) => changes.merge(task),
        Err(e) => {
            report(notifier, e);
            return false;
        }
    };
    edit_task(store, id, edit, notifier)
}

/// Delete a task after confirmation; returns whether it was removed
pub fn delete_task<S: Storage>(
    store: &mut TaskStore<S>,
    id: &str,
    confirm: &mut impl Confirm,
    notifier: &mut impl Notifier,
) -> bool {
    let Some(id) = resolve_id(store, id, notifier) else {
        return false;
    };

    match store.delete(&id, confirm) {
        Ok(true) => {
            notifier.notify(Notification::success("Task deleted!"));
            true
        }
        Ok(false) => false,
        Err(e) => {
            report(notifier, e);
            false
        }
    }
}

/// Remove all completed tasks after confirmation; returns how many went
pub fn clear_completed<S: Storage>(
    store: &mut TaskStore<S>,
    confirm: &mut impl Confirm,
    notifier: &mut impl Notifier,
) -> usize {
    if store.stats().completed == 0 {
        notifier.notify(Notification::error("No completed tasks to clear!"));
        return 0;
    }

    match store.clear_completed(confirm) {
        Ok(0) => 0,
        Ok(count) => {
            notifier.notify(Notification::success(format!("Cleared {} completed task(s)!", count)));
            count
        }
        Err(e) => {
            report(notifier, e);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use eyre::{Result, eyre};

    fn store() -> TaskStore<MemoryStorage> {
        TaskStore::open(MemoryStorage::new()).unwrap()
    }

    fn yes(_: &str) -> bool {
        true
    }

    /// Storage whose writes always fail
    struct ReadOnly;

    impl Storage for ReadOnly {
        fn get_item(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set_item(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(eyre!("quota exceeded"))
        }

        fn remove_item(&mut self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_add_notifies() {
        let mut store = store();
        let mut notes = Vec::new();

        assert!(add_task(&mut store, NewTask::new("Buy milk"), &mut notes).is_some());
        assert_eq!(notes, vec![Notification::success("Task added successfully!")]);
    }

    #[test]
    fn test_add_empty_notifies_error() {
        let mut store = store();
        let mut notes = Vec::new();

        assert!(add_task(&mut store, NewTask::new(""), &mut notes).is_none());
        assert_eq!(notes, vec![Notification::error("Please enter a task!")]);
        assert!(store.is_empty());
    }

    #[test]
    fn test_toggle_messages() {
        let mut store = store();
        let mut notes = Vec::new();
        let id = add_task(&mut store, NewTask::new("Run"), &mut notes).unwrap();
        notes.clear();

        assert_eq!(toggle_task(&mut store, &id, &mut notes), Some(true));
        assert_eq!(toggle_task(&mut store, &id, &mut notes), Some(false));
        assert_eq!(
            notes,
            vec![Notification::success("Task completed!"), Notification::success("Task reopened!")]
        );
    }

    #[test]
    fn test_unknown_id_notifies_error() {
        let mut store = store();
        let mut notes = Vec::new();

        assert_eq!(toggle_task(&mut store, "nope", &mut notes), None);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, Level::Error);
        assert!(notes[0].message.contains("nope"));
    }

    #[test]
    fn test_edit_and_delete() {
        let mut store = store();
        let mut notes = Vec::new();
        let id = add_task(&mut store, NewTask::new("Draft"), &mut notes).unwrap();

        let edit = TaskEdit {
            text: "Final".to_string(),
            ..TaskEdit::default()
        };
        assert!(edit_task(&mut store, &id, edit, &mut notes));
        assert!(delete_task(&mut store, &id, &mut yes, &mut notes));
        assert!(store.is_empty());
        assert_eq!(
            notes.last(),
            Some(&Notification::success("Task deleted!"))
        );
    }

    #[test]
    fn test_partial_edit_keeps_omitted_fields() {
        let mut store = store();
        let mut notes = Vec::new();
        let new = NewTask::new("Dentist")
            .due("2024-04-02", Some("14:30"))
            .category(Category::Health)
            .priority(Priority::High);
        let id = add_task(&mut store, new, &mut notes).unwrap();

        let changes = PartialEdit {
            text: Some("Dentist checkup".to_string()),
            ..PartialEdit::default()
        };
        assert!(edit_task_fields(&mut store, &id, changes, &mut notes));

        let task = store.get(&id).unwrap();
        assert_eq!(task.text, "Dentist checkup");
        assert_eq!(task.date.as_deref(), Some("2024-04-02"));
        assert_eq!(task.time.as_deref(), Some("14:30"));
        assert_eq!(task.category, Category::Health);
        assert_eq!(task.priority, Priority::High);
    }

    #[test]
    fn test_partial_edit_empty_date_clears_it() {
        let mut store = store();
        let mut notes = Vec::new();
        let id = add_task(&mut store, NewTask::new("Call mom").due("2024-04-02", Some("09:00")), &mut notes).unwrap();
        let short = store.get(&id).unwrap().short_id().to_string();

        let changes = PartialEdit {
            date: Some(String::new()),
            time: Some(String::new()),
            ..PartialEdit::default()
        };
        assert!(edit_task_fields(&mut store, &short, changes, &mut notes));

        let task = store.get(&id).unwrap();
        assert_eq!(task.text, "Call mom");
        assert_eq!(task.date, None);
        assert_eq!(task.time, None);
        assert_eq!(notes.last(), Some(&Notification::success("Task updated successfully!")));
    }

    #[test]
    fn test_partial_edit_unknown_id() {
        let mut store = store();
        let mut notes = Vec::new();

        assert!(!edit_task_fields(&mut store, "nope", PartialEdit::default(), &mut notes));
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, Level::Error);
    }

    #[test]
    fn test_clear_completed_messages() {
        let mut store = store();
        let mut notes = Vec::new();

        assert_eq!(clear_completed(&mut store, &mut yes, &mut notes), 0);
        assert_eq!(notes[0].level, Level::Error);

        let id = add_task(&mut store, NewTask::new("Done"), &mut notes).unwrap();
        toggle_task(&mut store, &id, &mut notes);
        assert_eq!(clear_completed(&mut store, &mut yes, &mut notes), 1);
        assert_eq!(
            notes.last(),
            Some(&Notification::success("Cleared 1 completed task(s)!"))
        );
    }

    #[test]
    fn test_storage_failure_becomes_notification() {
        let mut store = TaskStore::open(ReadOnly).unwrap();
        let mut notes = Vec::new();

        assert!(add_task(&mut store, NewTask::new("Unsaved"), &mut notes).is_none());
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, Level::Error);
        assert!(notes[0].message.contains("quota exceeded"));
    }
}
