//! Task domain model
//!
//! Pure domain types with no I/O. Tasks are only ever created by
//! [`TaskStore::add_task`](crate::store::TaskStore::add_task); the inputs
//! defined here are what callers hand to the store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, Result};

/// Opaque task identifier, unique for the whole session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generate a fresh identifier
    pub(crate) fn generate() -> Self {
        TaskId(Uuid::new_v4())
    }

    /// Short prefix used when an id has to fit on one terminal line
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task_{}", self.0.simple())
    }
}

/// Task urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Sort rank: high sorts first
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(CoreError::parse(format!(
                "Unknown priority '{}'. Expected one of: low, medium, high",
                other
            ))),
        }
    }
}

/// A single to-do item
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Local>,
    pub category: Option<String>,
    /// Display order matters, duplicates are allowed
    pub tags: Option<Vec<String>>,
    /// Manual sort position, dense only right after a reorder
    pub order: Option<usize>,
}

impl Task {
    pub(crate) fn from_input(
        input: NewTask,
        id: TaskId,
        created_at: DateTime<Local>,
        order: usize,
    ) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            completed: input.completed,
            priority: input.priority,
            due_date: input.due_date,
            created_at,
            category: input.category,
            tags: input.tags,
            order: Some(order),
        }
    }

    /// Merge a patch onto this task. `id` and `created_at` are untouchable.
    pub(crate) fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(order) = patch.order {
            self.order = order;
        }
    }

    /// Toggle completion status
    pub(crate) fn toggle_complete(&mut self) {
        self.completed = !self.completed;
    }

    /// Check if the task is past its due date and still open
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.due_date {
            Some(due) => due < today && !self.completed,
            None => false,
        }
    }

    /// Tags as a slice, empty when the task has none
    pub fn tag_list(&self) -> &[String] {
        self.tags.as_deref().unwrap_or(&[])
    }
}

/// Input for adding a task: everything except id, creation time and order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl NewTask {
    /// Create an input with the given title and defaults for everything else
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Builder method to set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Builder method to set the due date
    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Builder method to set category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Builder method to set tags
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Builder method to set completion status
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Trim text fields the way the add form does before submitting.
    ///
    /// Fails if the title is empty after trimming. Blank description or
    /// category become absent, tags lose a leading `#` and blank entries.
    pub fn normalized(self) -> Result<Self> {
        Ok(Self {
            title: normalize_title(&self.title)?,
            description: normalize_text(self.description),
            category: normalize_text(self.category),
            tags: normalize_tags(self.tags),
            ..self
        })
    }
}

/// Partial update for an existing task.
///
/// Each field is `None` to leave it alone. Optional task fields use a second
/// `Option` layer: `Some(None)` clears the field, `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub category: Option<Option<String>>,
    pub tags: Option<Option<Vec<String>>>,
    pub order: Option<Option<usize>>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn category(mut self, category: Option<String>) -> Self {
        self.category = Some(category);
        self
    }

    pub fn tags(mut self, tags: Option<Vec<String>>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn order(mut self, order: Option<usize>) -> Self {
        self.order = Some(order);
        self
    }

    /// True if the patch would not change anything
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Same trimming rules as [`NewTask::normalized`], applied to the fields
    /// this patch sets.
    pub fn normalized(self) -> Result<Self> {
        let title = match self.title {
            Some(title) => Some(normalize_title(&title)?),
            None => None,
        };

        Ok(Self {
            title,
            description: self.description.map(normalize_text),
            category: self.category.map(normalize_text),
            tags: self.tags.map(normalize_tags),
            ..self
        })
    }
}

fn normalize_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation("title", "Title cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn normalize_text(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn normalize_tags(tags: Option<Vec<String>>) -> Option<Vec<String>> {
    let tags: Vec<String> = tags?
        .iter()
        .map(|t| t.trim().trim_start_matches('#').to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if tags.is_empty() { None } else { Some(tags) }
}
