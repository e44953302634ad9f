use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::temporal;
use crate::error::ValidationError;

pub const TITLE_MAX_CHARS: usize = 50;
pub const DETAILS_MAX_CHARS: usize = 500;

/// Task status. The wire labels are the backend's Spanish column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "Por Hacer")]
    Todo,
    #[serde(rename = "Haciendo")]
    Doing,
    #[serde(rename = "Hecho")]
    Done,
}

impl TaskStatus {
    /// Kanban column order.
    pub const ALL: [TaskStatus; 3] = [Self::Todo, Self::Doing, Self::Done];

    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Todo => "Por Hacer",
            Self::Doing => "Haciendo",
            Self::Done => "Hecho",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim() {
            "Por Hacer" => Some(Self::Todo),
            "Haciendo" => Some(Self::Doing),
            "Hecho" => Some(Self::Done),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// The list view's checkbox flips between done and to-do; "Haciendo" counts as not done.
    pub fn toggled(&self) -> Self {
        if self.is_done() { Self::Todo } else { Self::Done }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

/// A task as the backend returns it.
///
/// Older backends used `_id`, `description` and `fechaLimite`; those names
/// are accepted here and nowhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(alias = "_id", deserialize_with = "super::id_string")]
    pub id: String,
    pub title: String,
    #[serde(default, alias = "description", skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub status: TaskStatus,
    #[serde(default, alias = "fechaLimite")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn details(&self) -> &str {
        self.details.as_deref().unwrap_or("")
    }

    /// Past its due timestamp and not done yet.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_done() && self.date.is_some_and(|due| due < now)
    }

    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(details) = &patch.details {
            self.details = Some(details.clone());
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
    }
}

/// Payload for `POST /tasks/new`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDraft {
    pub title: String,
    pub details: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            title: title.into(),
            details: String::new(),
            status,
            date: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_details(&self.details)
    }
}

/// Payload for `PUT /tasks/:id`. Absent fields are left untouched server-side;
/// `date: Some(None)` clears the due date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(details) = &self.details {
            validate_details(details)?;
        }
        Ok(())
    }
}

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::TitleRequired);
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(ValidationError::TitleTooLong {
            max: TITLE_MAX_CHARS,
        });
    }
    Ok(())
}

pub fn validate_details(details: &str) -> Result<(), ValidationError> {
    if details.chars().count() > DETAILS_MAX_CHARS {
        return Err(ValidationError::DetailsTooLong {
            max: DETAILS_MAX_CHARS,
        });
    }
    Ok(())
}

/// Raw task form fields as typed by the user. `date` is `YYYY-MM-DD`,
/// `time` is `HH:MM`; both may be blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub details: String,
    pub status: String,
    pub date: String,
    pub time: String,
}

impl TaskForm {
    /// Prefill for editing an existing task, with the due date split back
    /// into local date and time fields.
    pub fn from_task(task: &Task) -> Self {
        let (date, time) = task
            .date
            .map(temporal::split_due_date)
            .unwrap_or_default();
        Self {
            title: task.title.clone(),
            details: task.details().to_string(),
            status: task.status.as_label().to_string(),
            date,
            time,
        }
    }

    /// Required fields present; gates the submit button before any real validation.
    pub fn is_ready(&self) -> bool {
        !self.title.trim().is_empty()
            && self.title.chars().count() <= TITLE_MAX_CHARS
            && !self.date.trim().is_empty()
            && !self.time.trim().is_empty()
            && !self.status.trim().is_empty()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.title.trim().is_empty() || !self.details.trim().is_empty()
    }

    fn status(&self) -> Result<TaskStatus, ValidationError> {
        if self.status.trim().is_empty() {
            return Ok(TaskStatus::Todo);
        }
        self.status.parse()
    }

    pub fn to_draft(&self, today: NaiveDate) -> Result<TaskDraft, ValidationError> {
        let draft = TaskDraft {
            title: self.title.clone(),
            details: self.details.clone(),
            status: self.status()?,
            date: None,
        };
        draft.validate()?;
        Ok(TaskDraft {
            date: temporal::due_timestamp(&self.date, &self.time, today)?,
            ..draft
        })
    }

    /// Full replacement patch; a blank date clears the due date.
    pub fn to_patch(&self, today: NaiveDate) -> Result<TaskPatch, ValidationError> {
        let patch = TaskPatch {
            title: Some(self.title.clone()),
            details: Some(self.details.clone()),
            status: Some(self.status()?),
            date: None,
        };
        patch.validate()?;
        Ok(TaskPatch {
            date: Some(temporal::due_timestamp(&self.date, &self.time, today)?),
            ..patch
        })
    }
}
