//! Taskify Core - Pure domain logic for a single-user task list
//!
//! This crate contains no I/O operations. Theme persistence, dark-mode
//! detection and rendering are reached through the traits in [`theme`],
//! implemented by consuming crates.

pub mod date;
pub mod error;
pub mod filter;
pub mod store;
pub mod task;
pub mod theme;

pub use error::{CoreError, Result};
pub use filter::{SortBy, StatusFilter, ViewState};
pub use store::{StoreEvent, SubscriptionId, TaskStats, TaskStore, TaskStoreBuilder};
pub use task::{NewTask, Priority, Task, TaskId, TaskPatch};
pub use theme::{
    ColorSchemeProbe, PreferenceStore, ResolvedTheme, THEME_PREFERENCE_KEY, Theme, ThemeSurface,
};
