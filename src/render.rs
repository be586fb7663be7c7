// Text rendering of the task list and stats
//
// Projection (`project_*`) is pure: same store state and `today` give the
// same output. Formatting applies color on top.

use crate::filter::{StatusFilter, View};
use crate::store::Stats;
use crate::task::{Priority, Task};
use chrono::{NaiveDate, NaiveTime};
use colored::{ColoredString, Colorize};

const PROGRESS_WIDTH: usize = 20;

/// One rendered row of the list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLine {
    pub short_id: String,
    pub text: String,
    pub completed: bool,
    pub category: String,
    pub priority: Priority,
    pub due: Option<String>,
    pub overdue: bool,
}

/// Today's date as shown in the header, e.g. `Sunday, October 18, 2026`
pub fn format_header_date(today: NaiveDate) -> String {
    today.format("%A, %B %-d, %Y").to_string()
}

/// Due date for display, e.g. `Mar 1, 2024 at 9:30 AM`
pub fn format_due(task: &Task) -> Option<String> {
    let (date, time) = task.due()?;
    let date = date.format("%b %-d, %Y").to_string();
    Some(match time {
        Some(time) => format!("{} at {}", date, format_time(time)),
        None => date,
    })
}

fn format_time(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

pub fn project_task(task: &Task, today: NaiveDate) -> TaskLine {
    TaskLine {
        short_id: task.short_id().to_string(),
        text: task.text.clone(),
        completed: task.completed,
        category: task.category.to_string(),
        priority: task.priority,
        due: format_due(task),
        overdue: task.is_overdue(today),
    }
}

pub fn project_view(view: &View<'_>, today: NaiveDate) -> Vec<TaskLine> {
    view.iter().map(|task| project_task(task, today)).collect()
}

/// Message shown in place of an empty list
pub fn empty_message(view: &View<'_>) -> &'static str {
    match view.filter() {
        StatusFilter::All => "No tasks yet. Add one to get started!",
        StatusFilter::Pending => "No pending tasks. Nice work!",
        StatusFilter::Completed => "No completed tasks yet.",
    }
}

/// Filled/empty cells of a progress bar
pub fn progress_bar(percent: u8) -> String {
    let filled = (usize::from(percent.min(100)) * PROGRESS_WIDTH + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(PROGRESS_WIDTH - filled))
}

fn priority_label(priority: Priority) -> ColoredString {
    let label = priority.to_string();
    match priority {
        Priority::High => label.red().bold(),
        Priority::Medium => label.yellow(),
        Priority::Low => label.green(),
    }
}

/// Format a single row
pub fn format_line(line: &TaskLine) -> String {
    let checkbox = if line.completed { "[x]".green() } else { "[ ]".normal() };
    let text = if line.completed {
        line.text.dimmed().strikethrough()
    } else {
        line.text.normal()
    };

    let mut out = format!(
        "{} {} {}  {} {}",
        line.short_id.dimmed(),
        checkbox,
        text,
        line.category.cyan(),
        priority_label(line.priority)
    );

    if let Some(due) = &line.due {
        let due = if line.overdue {
            format!("{} (overdue)", due).red()
        } else {
            due.normal()
        };
        out.push_str(&format!("  {}", due));
    }

    out
}

/// Format the list for a view: header, rows or the empty-state message
pub fn format_list(view: &View<'_>, today: NaiveDate) -> String {
    let mut out = format!("{}\n\n", format_header_date(today).bold());

    let lines = project_view(view, today);
    if lines.is_empty() {
        out.push_str(&format!("{}\n", empty_message(view).dimmed()));
        return out;
    }

    for line in &lines {
        out.push_str(&format_line(line));
        out.push('\n');
    }
    out
}

/// Format the stats summary
pub fn format_stats(stats: &Stats) -> String {
    format!(
        "All: {}  Pending: {}  Completed: {}\n{} {}% complete\n",
        stats.all,
        stats.pending,
        stats.completed,
        progress_bar(stats.percent),
        stats.percent
    )
}
