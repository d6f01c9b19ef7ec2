//! Task display formatting module
//!
//! Handles colored output and different view modes for tasks. Colors come
//! from the theme the store last applied, received through [`SharedPalette`].

use std::cell::Cell;
use std::rc::Rc;

use chrono::NaiveDate;
use clap::ValueEnum;
use colored::*;
use serde::{Deserialize, Serialize};

use taskify_core::date::{DueStatus, format_due_label};
use taskify_core::{
    Priority, ResolvedTheme, StatusFilter, Task, TaskStats, ThemeSurface, ViewState,
};

/// Display mode for task list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Minimal one-line format
    Compact,
    /// Full info with every field
    Detailed,
    /// Balanced view with clear status indicators
    #[default]
    Default,
}

/// Check if terminal supports colors
pub fn supports_color() -> bool {
    atty::is(atty::Stream::Stdout)
}

/// Theme surface shared between the store and the renderer
#[derive(Debug, Clone, Default)]
pub struct SharedPalette(Rc<Cell<ResolvedTheme>>);

impl SharedPalette {
    pub fn current(&self) -> ResolvedTheme {
        self.0.get()
    }
}

impl ThemeSurface for SharedPalette {
    fn apply(&mut self, theme: ResolvedTheme) {
        self.0.set(theme);
    }
}

/// Color choices for one resolved theme
#[derive(Debug, Clone, Copy)]
pub struct Style {
    theme: ResolvedTheme,
    enabled: bool,
}

impl Style {
    pub fn new(theme: ResolvedTheme, enabled: bool) -> Self {
        Self { theme, enabled }
    }

    #[cfg(test)]
    pub fn plain() -> Self {
        Self::new(ResolvedTheme::Light, false)
    }

    fn paint(&self, text: &str, color: impl Fn(&str) -> ColoredString) -> String {
        if self.enabled {
            color(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn accent(&self, text: &str) -> String {
        match self.theme {
            ResolvedTheme::Light => self.paint(text, |s| s.blue()),
            ResolvedTheme::Dark => self.paint(text, |s| s.bright_cyan()),
        }
    }

    fn muted(&self, text: &str) -> String {
        match self.theme {
            ResolvedTheme::Light => self.paint(text, |s| s.bright_black()),
            ResolvedTheme::Dark => self.paint(text, |s| s.white().dimmed()),
        }
    }

    fn done(&self, text: &str) -> String {
        match self.theme {
            ResolvedTheme::Light => self.paint(text, |s| s.green()),
            ResolvedTheme::Dark => self.paint(text, |s| s.bright_green()),
        }
    }

    fn priority(&self, priority: Priority) -> String {
        let label = priority.as_str();
        match priority {
            Priority::High => self.paint(label, |s| s.red().bold()),
            Priority::Medium => self.paint(label, |s| s.yellow()),
            Priority::Low => self.paint(label, |s| s.green()),
        }
    }

    fn due(&self, status: DueStatus, text: &str) -> String {
        match status {
            DueStatus::Overdue => self.paint(text, |s| s.red().bold()),
            DueStatus::Today => self.paint(text, |s| s.yellow()),
            _ => self.muted(text),
        }
    }

    fn tag(&self, text: &str) -> String {
        match self.theme {
            ResolvedTheme::Light => self.paint(text, |s| s.magenta()),
            ResolvedTheme::Dark => self.paint(text, |s| s.bright_magenta()),
        }
    }
}

/// Format a task at 1-based view `position`
pub fn format_task(
    task: &Task,
    position: usize,
    mode: DisplayMode,
    style: Style,
    today: NaiveDate,
) -> String {
    let checkbox = if task.completed { "[✓]" } else { "[ ]" };
    let title = if task.completed {
        style.done(&task.title)
    } else {
        task.title.clone()
    };

    let tags_str = if task.tag_list().is_empty() {
        String::new()
    } else {
        let tags: Vec<String> = task
            .tag_list()
            .iter()
            .map(|t| style.tag(&format!("#{}", t)))
            .collect();
        format!(" {}", tags.join(" "))
    };

    let due_str = task.due_date.map(|date| {
        let status = DueStatus::of(task, today);
        let label = match status {
            DueStatus::Overdue => format!("overdue: {}", format_due_label(date, today)),
            _ => format_due_label(date, today),
        };
        style.due(status, &format!("({})", label))
    });

    let position_str = style.accent(&format!("{:>2}.", position));

    match mode {
        DisplayMode::Compact => format!("{} {} {}", position_str, checkbox, task.title),
        DisplayMode::Default => {
            let mut line = format!(
                "{} {} {} [{}]{}",
                position_str,
                checkbox,
                title,
                style.priority(task.priority),
                tags_str
            );
            if let Some(due) = due_str {
                line.push(' ');
                line.push_str(&due);
            }
            if let Some(category) = &task.category {
                line.push(' ');
                line.push_str(&style.muted(&format!("@{}", category)));
            }
            line
        }
        DisplayMode::Detailed => {
            let mut parts = vec![
                format!("{} {} {}{}", position_str, checkbox, title, tags_str),
                format!("Id: {}", style.muted(&task.id.short())),
                format!("Priority: {}", style.priority(task.priority)),
            ];

            if let Some(description) = &task.description {
                parts.push(format!("Description: {}", description));
            }
            if let Some(category) = &task.category {
                parts.push(format!("Category: {}", category));
            }
            match (task.due_date, due_str) {
                (Some(date), Some(due)) => {
                    parts.push(format!("Due: {} {}", date.format("%Y-%m-%d"), due))
                }
                _ => parts.push("Due: (none)".to_string()),
            }
            parts.push(format!(
                "Created: {}",
                task.created_at.format("%Y-%m-%d %H:%M")
            ));
            if let Some(order) = task.order {
                parts.push(format!("Order: {}", order));
            }
            parts.join("\n      ")
        }
    }
}

/// Header line describing the active view
pub fn format_view_header(view: &ViewState, shown: usize, total: usize, style: Style) -> String {
    let mut parts = vec![
        format!("filter: {}", view.filter),
        format!("sort: {}", view.sort_by),
    ];
    if let Some(needle) = view.search_needle() {
        parts.push(format!("search: \"{}\"", needle));
    }

    format!(
        "{} {}",
        style.accent(&format!("Showing {} of {}", shown, total)),
        style.muted(&format!("({})", parts.join(", ")))
    )
}

/// Format a summary line for the whole collection
pub fn format_summary(stats: &TaskStats, style: Style) -> String {
    let mut parts = vec![
        format!("{} total", stats.total),
        format!("{} active", stats.active),
        style.done(&format!("{} done", stats.completed)),
    ];

    if stats.overdue > 0 {
        parts.push(style.due(DueStatus::Overdue, &format!("{} overdue", stats.overdue)));
    }
    parts.push(format!("{}% complete", stats.completion_rate));

    format!("[{}]", parts.join(" | "))
}

/// Message shown when the view is empty
pub fn format_empty_state(filter: StatusFilter) -> &'static str {
    match filter {
        StatusFilter::Completed => {
            "No completed tasks yet. Complete your first task to see it here."
        }
        StatusFilter::Active => "All caught up! You have no active tasks.",
        StatusFilter::All => "No tasks yet. Add a task to get started.",
    }
}
