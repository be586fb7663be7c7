// Task record and its enumerated fields

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

const SHORT_ID_LEN: usize = 8;

/// A single to-do item
///
/// Field names serialize in camelCase so data written by earlier versions of
/// the list (which used `createdAt`/`completedAt`) loads unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub time: Option<String>,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Due date and time parsed for comparison
    ///
    /// A task with a date but no time is due at the end of that day.
    pub fn due(&self) -> Option<(NaiveDate, Option<NaiveTime>)> {
        let date = NaiveDate::parse_from_str(self.date.as_deref()?, DATE_FORMAT).ok()?;
        let time = self
            .time
            .as_deref()
            .and_then(|t| NaiveTime::parse_from_str(t, TIME_FORMAT).ok());
        Some((date, time))
    }

    /// Trailing characters of the id, as shown in listings
    ///
    /// UUID v7 ids share their leading (timestamp) characters between tasks
    /// created close together, so the tail is the distinguishing part.
    pub fn short_id(&self) -> &str {
        let start = self
            .id
            .char_indices()
            .rev()
            .nth(SHORT_ID_LEN - 1)
            .map_or(0, |(i, _)| i);
        &self.id[start..]
    }

    /// Pending task whose due date is strictly before `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.due().is_some_and(|(date, _)| date < today)
    }
}

/// Task category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Personal,
    Work,
    Shopping,
    Health,
    /// Also catches categories this build does not know
    #[serde(other)]
    Other,
}

/// Task priority, ordered `Low < Medium < High`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Personal => write!(f, "personal"),
            Category::Work => write!(f, "work"),
            Category::Shopping => write!(f, "shopping"),
            Category::Health => write!(f, "health"),
            Category::Other => write!(f, "other"),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// Input for creating a task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub text: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub category: Category,
    pub priority: Priority,
}

impl NewTask {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn due(mut self, date: impl Into<String>, time: Option<&str>) -> Self {
        self.date = Some(date.into());
        self.time = time.map(str::to_string);
        self
    }
}

/// Replacement values for an existing task
///
/// Every field is overwritten, matching the edit form which always submits
/// the full set.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub text: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub category: Category,
    pub priority: Priority,
}

impl From<&Task> for TaskEdit {
    fn from(task: &Task) -> Self {
        Self {
            text: task.text.clone(),
            date: task.date.clone(),
            time: task.time.clone(),
            category: task.category,
            priority: task.priority,
        }
    }
}

/// Trim text and reject it if nothing remains
pub(crate) fn validate_text(text: &str) -> Result<String, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::EmptyText);
    }
    Ok(text.to_string())
}

/// Normalize an optional date: blank means absent, anything else must parse
pub(crate) fn validate_date(date: Option<&str>) -> Result<Option<String>, ValidationError> {
    match date.map(str::trim).filter(|d| !d.is_empty()) {
        None => Ok(None),
        Some(d) => NaiveDate::parse_from_str(d, DATE_FORMAT)
            .map(|parsed| Some(parsed.format(DATE_FORMAT).to_string()))
            .map_err(|_| ValidationError::InvalidDate(d.to_string())),
    }
}

/// Normalize an optional time: blank means absent, anything else must parse
pub(crate) fn validate_time(time: Option<&str>) -> Result<Option<String>, ValidationError> {
    match time.map(str::trim).filter(|t| !t.is_empty()) {
        None => Ok(None),
        Some(t) => NaiveTime::parse_from_str(t, TIME_FORMAT)
            .map(|parsed| Some(parsed.format(TIME_FORMAT).to_string()))
            .map_err(|_| ValidationError::InvalidTime(t.to_string())),
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Generate a fresh task id (UUID v7, so ids sort by creation time)
pub fn generate_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_legacy_record() {
        let json = r#"{
            "id": "lq2x8k0abc",
            "text": "Buy milk",
            "completed": false,
            "date": "",
            "time": "",
            "category": "shopping",
            "priority": "high",
            "createdAt": "2024-03-01T09:30:00.000Z"
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, "lq2x8k0abc");
        assert_eq!(task.date, None);
        assert_eq!(task.time, None);
        assert_eq!(task.category, Category::Shopping);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn test_serialize_uses_camel_case() {
        let task = Task {
            id: "t1".to_string(),
            text: "Write report".to_string(),
            completed: true,
            date: Some("2024-03-01".to_string()),
            time: None,
            category: Category::Work,
            priority: Priority::Low,
            created_at: Utc::now(),
            completed_at: Some(Utc::now()),
        };

        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"completedAt\""));
        assert!(json.contains("\"category\":\"work\""));
        assert!(json.contains("\"priority\":\"low\""));
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn test_validate_text() {
        assert_eq!(validate_text("  hello ").unwrap(), "hello");
        assert_eq!(validate_text("   "), Err(ValidationError::EmptyText));
        assert_eq!(validate_text(""), Err(ValidationError::EmptyText));
    }

    #[test]
    fn test_validate_date_and_time() {
        assert_eq!(validate_date(Some("2024-03-01")).unwrap(), Some("2024-03-01".to_string()));
        assert_eq!(validate_date(Some("")).unwrap(), None);
        assert_eq!(validate_date(None).unwrap(), None);
        assert!(validate_date(Some("03/01/2024")).is_err());

        assert_eq!(validate_time(Some(" 09:05 ")).unwrap(), Some("09:05".to_string()));
        assert!(validate_time(Some("25:00")).is_err());
    }

    #[test]
    fn test_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let mut task = Task {
            id: "t1".to_string(),
            text: "Old".to_string(),
            completed: false,
            date: Some("2024-03-09".to_string()),
            time: None,
            category: Category::Personal,
            priority: Priority::Medium,
            created_at: Utc::now(),
            completed_at: None,
        };
        assert!(task.is_overdue(today));

        task.date = Some("2024-03-10".to_string());
        assert!(!task.is_overdue(today));

        task.date = Some("2024-03-01".to_string());
        task.completed = true;
        assert!(!task.is_overdue(today));
    }

    #[test]
    fn test_short_id() {
        let mut task: Task = serde_json::from_str(
            r#"{"id":"0190c7a2-1111-7000-8000-abcdef123456","text":"x","createdAt":"2024-03-01T09:30:00Z"}"#,
        )
        .unwrap();
        assert_eq!(task.short_id(), "ef123456");

        task.id = "abc".to_string();
        assert_eq!(task.short_id(), "abc");
    }

    #[test]
    fn test_generate_id_unique() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
    }
}
