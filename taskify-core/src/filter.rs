//! View state and the derived task view
//!
//! A [`ViewState`] describes what the presentation layer wants to see:
//! completion filter, search text and sort mode. [`ViewState::apply`] turns
//! the raw collection into that view without touching the collection.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use icu_collator::{Collator, CollatorOptions};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::task::Task;
use crate::theme::Theme;

/// Completion filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    /// Check if a task passes this filter
    pub fn matches(self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !task.completed,
            StatusFilter::Completed => task.completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Active => "active",
            StatusFilter::Completed => "completed",
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "completed" => Ok(StatusFilter::Completed),
            other => Err(CoreError::parse(format!(
                "Unknown filter '{}'. Expected one of: all, active, completed",
                other
            ))),
        }
    }
}

/// Sort mode for the derived view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Newest first
    #[default]
    Date,
    Priority,
    Title,
    Manual,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::Date => "date",
            SortBy::Priority => "priority",
            SortBy::Title => "title",
            SortBy::Manual => "manual",
        }
    }

    /// Compare two tasks under this sort mode
    pub fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            SortBy::Date => b.created_at.cmp(&a.created_at),
            SortBy::Priority => a.priority.rank().cmp(&b.priority.rank()),
            SortBy::Title => compare_titles(&a.title, &b.title),
            SortBy::Manual => a.order.unwrap_or(0).cmp(&b.order.unwrap_or(0)),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(SortBy::Date),
            "priority" => Ok(SortBy::Priority),
            "title" => Ok(SortBy::Title),
            "manual" => Ok(SortBy::Manual),
            other => Err(CoreError::parse(format!(
                "Unknown sort '{}'. Expected one of: date, priority, title, manual",
                other
            ))),
        }
    }
}

thread_local! {
    // Root-locale collator, built once per thread from compiled data
    static TITLE_COLLATOR: Option<Collator> =
        Collator::try_new(&Default::default(), CollatorOptions::new()).ok();
}

/// Locale-aware title ordering using Unicode root collation.
///
/// Accents sort next to their base letter and lowercase precedes uppercase
/// on ties. Code-point order decides anything the collator treats as equal.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    TITLE_COLLATOR
        .with(|collator| match collator {
            Some(collator) => collator.compare(a, b),
            None => Ordering::Equal,
        })
        .then_with(|| a.cmp(b))
}

/// Session-scoped view settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewState {
    pub filter: StatusFilter,
    pub sort_by: SortBy,
    pub search_query: String,
    pub theme: Theme,
}

impl ViewState {
    /// Trimmed, lower-cased search needle, `None` when the query is blank
    pub fn search_needle(&self) -> Option<String> {
        let trimmed = self.search_query.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_lowercase())
        }
    }

    /// Check if a task passes the filter and search of this view
    pub fn matches(&self, task: &Task) -> bool {
        self.matches_with(task, self.search_needle().as_deref())
    }

    fn matches_with(&self, task: &Task, needle: Option<&str>) -> bool {
        self.filter.matches(task) && needle.is_none_or(|n| matches_search(task, n))
    }

    /// Filter, search and stable-sort `tasks` into a new vector of clones
    pub fn apply<'a>(&self, tasks: impl IntoIterator<Item = &'a Task>) -> Vec<Task> {
        let needle = self.search_needle();

        let mut view: Vec<Task> = tasks
            .into_iter()
            .filter(|t| self.matches_with(t, needle.as_deref()))
            .cloned()
            .collect();

        // sort_by is stable, equal keys keep raw collection order
        view.sort_by(|a, b| self.sort_by.compare(a, b));
        view
    }
}

/// Case-insensitive substring match on title, description and category.
/// `needle` must already be lower-cased.
fn matches_search(task: &Task, needle: &str) -> bool {
    let contains = |text: &str| text.to_lowercase().contains(needle);

    contains(&task.title)
        || task.description.as_deref().is_some_and(contains)
        || task.category.as_deref().is_some_and(contains)
}
