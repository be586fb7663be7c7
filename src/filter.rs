// Filtering and sorting views over the task list

use crate::task::Task;
use clap::ValueEnum;
use std::cmp::Ordering;

/// Which tasks a view shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => !task.completed,
            StatusFilter::Completed => task.completed,
        }
    }
}

/// Ordering applied to a view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    /// Newest first
    #[default]
    Created,
    /// High priority first
    Priority,
    /// Earliest due first, undated last
    Due,
}

impl SortKey {
    pub fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            SortKey::Created => b.created_at.cmp(&a.created_at),
            SortKey::Priority => b.priority.cmp(&a.priority),
            SortKey::Due => compare_due(a, b),
        }
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusFilter::All => write!(f, "all"),
            StatusFilter::Pending => write!(f, "pending"),
            StatusFilter::Completed => write!(f, "completed"),
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortKey::Created => write!(f, "created"),
            SortKey::Priority => write!(f, "priority"),
            SortKey::Due => write!(f, "due"),
        }
    }
}

// Undated after dated; on the same date, untimed after timed
fn compare_due(a: &Task, b: &Task) -> Ordering {
    match (a.due(), b.due()) {
        (Some((da, ta)), Some((db, tb))) => da.cmp(&db).then_with(|| match (ta, tb) {
            (Some(ta), Some(tb)) => ta.cmp(&tb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// A filtered, sorted window onto the store's tasks
///
/// Borrowing the task slice keeps the view cheap to build; `iter` may be
/// called any number of times and each call starts from the beginning.
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    tasks: &'a [Task],
    filter: StatusFilter,
    sort: SortKey,
}

impl<'a> View<'a> {
    pub fn new(tasks: &'a [Task], filter: StatusFilter, sort: SortKey) -> Self {
        Self { tasks, filter, sort }
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    /// Iterate matching tasks in sort order
    ///
    /// `sort_by` is stable, so ties keep the store's order.
    pub fn iter(&self) -> std::vec::IntoIter<&'a Task> {
        let filter = self.filter;
        let mut matching: Vec<&'a Task> = self.tasks.iter().filter(|t| filter.matches(t)).collect();
        matching.sort_by(|a, b| self.sort.compare(a, b));
        matching.into_iter()
    }

    /// Number of matching tasks, without sorting
    pub fn len(&self) -> usize {
        self.tasks.iter().filter(|t| self.filter.matches(t)).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.tasks.iter().any(|t| self.filter.matches(t))
    }
}

impl<'a> IntoIterator for &View<'a> {
    type Item = &'a Task;
    type IntoIter = std::vec::IntoIter<&'a Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
