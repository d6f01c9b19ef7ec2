//! The session task store
//!
//! [`TaskStore`] owns the raw task collection and the view state for one
//! session. Every operation is total: unknown ids and out-of-range indices
//! are ignored rather than reported, and an ignored call leaves the store
//! exactly as it was.

use chrono::{Days, Local, NaiveDate};
use tracing::{debug, warn};

use crate::filter::{SortBy, StatusFilter, ViewState};
use crate::task::{NewTask, Priority, Task, TaskId, TaskPatch};
use crate::theme::{
    ColorSchemeProbe, FixedColorScheme, MemoryPreferences, NoopSurface, PreferenceStore,
    ResolvedTheme, Theme, ThemeSurface, apply_theme,
};

/// What changed in the store. Emitted after the change is fully applied.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    TaskAdded(TaskId),
    TaskUpdated(TaskId),
    TaskDeleted(TaskId),
    TaskToggled { id: TaskId, completed: bool },
    TasksReordered { from: usize, to: usize },
    FilterChanged(StatusFilter),
    SortChanged(SortBy),
    SearchChanged(String),
    ThemeChanged { theme: Theme, applied: ResolvedTheme },
}

/// Handle returned by [`TaskStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StoreEvent)>;

/// Counts over the whole collection, independent of the current view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub overdue: usize,
    /// Rounded percentage of completed tasks, 0 for an empty collection
    pub completion_rate: u8,
}

/// Builder for [`TaskStore`]
pub struct TaskStoreBuilder {
    preferences: Box<dyn PreferenceStore>,
    probe: Box<dyn ColorSchemeProbe>,
    surface: Box<dyn ThemeSurface>,
    seed_examples: bool,
}

impl Default for TaskStoreBuilder {
    fn default() -> Self {
        Self {
            preferences: Box::new(MemoryPreferences::new()),
            probe: Box::new(FixedColorScheme::light()),
            surface: Box::new(NoopSurface),
            seed_examples: false,
        }
    }
}

impl TaskStoreBuilder {
    /// Where the theme preference is read from and written to
    pub fn preferences(mut self, preferences: impl PreferenceStore + 'static) -> Self {
        self.preferences = Box::new(preferences);
        self
    }

    /// Environment dark-mode signal used for [`Theme::Auto`]
    pub fn color_scheme(mut self, probe: impl ColorSchemeProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Presentation surface that receives the resolved theme
    pub fn surface(mut self, surface: impl ThemeSurface + 'static) -> Self {
        self.surface = Box::new(surface);
        self
    }

    /// Pre-populate the collection with the example tasks
    pub fn seed_examples(mut self, seed: bool) -> Self {
        self.seed_examples = seed;
        self
    }

    /// Build the store, restoring and applying the saved theme.
    ///
    /// Without a saved theme the store starts in [`Theme::Auto`] and follows
    /// the color-scheme probe.
    pub fn build(self) -> TaskStore {
        let theme = match self.preferences.load_theme() {
            Ok(Some(theme)) => theme,
            Ok(None) => Theme::Auto,
            Err(e) => {
                warn!(error = %e, "could not read theme preference, falling back to auto");
                Theme::Auto
            }
        };

        let mut surface = self.surface;
        let applied = apply_theme(theme, self.probe.as_ref(), surface.as_mut());
        debug!(%theme, %applied, "theme restored");

        let tasks = if self.seed_examples {
            example_tasks(Local::now().date_naive())
        } else {
            Vec::new()
        };

        TaskStore {
            tasks,
            view: ViewState {
                theme,
                ..ViewState::default()
            },
            applied_theme: applied,
            preferences: self.preferences,
            probe: self.probe,
            surface,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }
}

/// In-memory task collection plus view state for one session
pub struct TaskStore {
    /// Raw storage order, most recently added first
    tasks: Vec<Task>,
    view: ViewState,
    applied_theme: ResolvedTheme,
    preferences: Box<dyn PreferenceStore>,
    probe: Box<dyn ColorSchemeProbe>,
    surface: Box<dyn ThemeSurface>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    /// Empty store with in-memory preferences and no presentation surface
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Store pre-seeded with the example tasks
    pub fn with_examples() -> Self {
        Self::builder().seed_examples(true).build()
    }

    pub fn builder() -> TaskStoreBuilder {
        TaskStoreBuilder::default()
    }

    // ========================================================================
    // Task mutations
    // ========================================================================

    /// Add a task at the front of the collection and return its id.
    ///
    /// The input is stored as given; callers validate titles beforehand
    /// (see [`NewTask::normalized`]).
    pub fn add_task(&mut self, input: NewTask) -> TaskId {
        let id = TaskId::generate();
        let order = self.tasks.len();
        let task = Task::from_input(input, id, Local::now(), order);

        debug!(%id, order, title = %task.title, "task added");
        self.tasks.insert(0, task);
        self.notify(StoreEvent::TaskAdded(id));
        id
    }

    /// Merge `patch` onto the task with `id`. Unknown ids are ignored, and a
    /// patch that leaves the task as it was emits no event.
    pub fn update_task(&mut self, id: TaskId, patch: TaskPatch) {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(%id, "update ignored, no such task");
            return;
        };

        let before = task.clone();
        task.apply(patch);
        if *task == before {
            debug!(%id, "update ignored, nothing changed");
            return;
        }
        debug!(%id, "task updated");
        self.notify(StoreEvent::TaskUpdated(id));
    }

    /// Remove the task with `id`. Other tasks keep their `order` values.
    pub fn delete_task(&mut self, id: TaskId) {
        let Some(pos) = self.position(id) else {
            debug!(%id, "delete ignored, no such task");
            return;
        };

        self.tasks.remove(pos);
        debug!(%id, "task deleted");
        self.notify(StoreEvent::TaskDeleted(id));
    }

    /// Flip completion of the task with `id`
    pub fn toggle_task(&mut self, id: TaskId) {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(%id, "toggle ignored, no such task");
            return;
        };

        task.toggle_complete();
        let completed = task.completed;
        debug!(%id, completed, "task toggled");
        self.notify(StoreEvent::TaskToggled { id, completed });
    }

    /// Move the task at raw position `source` to raw position `destination`,
    /// then renumber every task's `order` to its new position.
    ///
    /// A `source` past the end is ignored. A `destination` past the end is
    /// clamped, so the task lands last.
    pub fn reorder_tasks(&mut self, source: usize, destination: usize) {
        if source >= self.tasks.len() {
            warn!(
                source,
                destination,
                len = self.tasks.len(),
                "reorder ignored, source out of range"
            );
            return;
        }

        let task = self.tasks.remove(source);
        let destination = destination.min(self.tasks.len());
        self.tasks.insert(destination, task);

        for (index, task) in self.tasks.iter_mut().enumerate() {
            task.order = Some(index);
        }

        debug!(from = source, to = destination, "tasks reordered");
        self.notify(StoreEvent::TasksReordered {
            from: source,
            to: destination,
        });
    }

    // ========================================================================
    // View state
    // ========================================================================

    pub fn set_filter(&mut self, filter: StatusFilter) {
        if self.view.filter == filter {
            return;
        }
        self.view.filter = filter;
        debug!(%filter, "filter changed");
        self.notify(StoreEvent::FilterChanged(filter));
    }

    pub fn set_sort_by(&mut self, sort_by: SortBy) {
        if self.view.sort_by == sort_by {
            return;
        }
        self.view.sort_by = sort_by;
        debug!(%sort_by, "sort changed");
        self.notify(StoreEvent::SortChanged(sort_by));
    }

    /// Store the raw query; trimming happens when the view is derived
    pub fn set_search_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if self.view.search_query == query {
            return;
        }
        self.view.search_query = query.clone();
        debug!(query = %query, "search changed");
        self.notify(StoreEvent::SearchChanged(query));
    }

    /// Select a theme, persist it and apply it to the surface.
    ///
    /// Re-selecting the current theme still persists and re-applies it, so
    /// `auto` picks up a changed environment preference. Persistence
    /// failures are logged and do not stop the theme from applying.
    pub fn set_theme(&mut self, theme: Theme) {
        self.view.theme = theme;

        if let Err(e) = self.preferences.save_theme(theme) {
            warn!(error = %e, %theme, "could not persist theme preference");
        }

        let applied = apply_theme(theme, self.probe.as_ref(), self.surface.as_mut());
        self.applied_theme = applied;
        debug!(%theme, %applied, "theme applied");
        self.notify(StoreEvent::ThemeChanged { theme, applied });
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Derived view: filter, search, then stable sort. Returns clones and
    /// leaves the collection untouched.
    pub fn get_tasks(&self) -> Vec<Task> {
        self.view.apply(&self.tasks)
    }

    /// Raw collection in storage order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get_task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Raw position of the task with `id`
    pub fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn filter(&self) -> StatusFilter {
        self.view.filter
    }

    pub fn sort_by(&self) -> SortBy {
        self.view.sort_by
    }

    pub fn search_query(&self) -> &str {
        &self.view.search_query
    }

    pub fn theme(&self) -> Theme {
        self.view.theme
    }

    /// Value most recently handed to the theme surface
    pub fn applied_theme(&self) -> ResolvedTheme {
        self.applied_theme
    }

    /// Collection-wide counts, with overdue measured against today
    pub fn stats(&self) -> TaskStats {
        self.stats_on(Local::now().date_naive())
    }

    /// Collection-wide counts, with overdue measured against `today`
    pub fn stats_on(&self, today: NaiveDate) -> TaskStats {
        let total = self.tasks.len();
        let completed = self.tasks.iter().filter(|t| t.completed).count();
        let overdue = self.tasks.iter().filter(|t| t.is_overdue(today)).count();
        let completion_rate = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        };

        TaskStats {
            total,
            active: total - completed,
            completed,
            overdue,
            completion_rate,
        }
    }

    // ========================================================================
    // Change notification
    // ========================================================================

    /// Register a listener called after every applied change
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Drop a listener. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, event: StoreEvent) {
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }
}

/// Example tasks shown to first-time users
fn example_tasks(today: NaiveDate) -> Vec<Task> {
    let created_at = Local::now();
    let due_in = |days| today.checked_add_days(Days::new(days));

    let examples = [
        NewTask {
            due_date: due_in(1),
            ..NewTask::new("🎯 Complete project proposal")
                .with_description(
                    "Finish the Q1 project proposal and send to stakeholders for review.",
                )
                .with_priority(Priority::High)
                .with_category("work")
                .with_tags(vec!["urgent".to_string(), "client".to_string()])
        },
        NewTask {
            due_date: due_in(3),
            ..NewTask::new("📚 Review React documentation")
                .with_description("Study the new features in React 18")
                .with_priority(Priority::Medium)
                .with_category("learning")
                .with_tags(vec!["development".to_string()])
        },
        NewTask::new("🏃 Morning workout")
            .with_description("Run 5km at the park")
            .with_completed(true)
            .with_priority(Priority::Medium)
            .with_category("personal")
            .with_tags(vec!["health".to_string()]),
    ];

    examples
        .into_iter()
        .enumerate()
        .map(|(order, input)| Task::from_input(input, TaskId::generate(), created_at, order))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_add_prepends_and_assigns_order() {
        let mut store = TaskStore::new();
        let first = store.add_task(NewTask::new("first"));
        let second = store.add_task(NewTask::new("second"));

        assert_eq!(store.len(), 2);
        assert_eq!(store.tasks()[0].id, second);
        assert_eq!(store.tasks()[1].id, first);
        assert_eq!(store.get_task(first).unwrap().order, Some(0));
        assert_eq!(store.get_task(second).unwrap().order, Some(1));
    }

    #[test]
    fn test_update_merges_and_clears() {
        let mut store = TaskStore::new();
        let id = store.add_task(
            NewTask::new("Draft")
                .with_description("notes")
                .with_category("work"),
        );
        let created_at = store.get_task(id).unwrap().created_at;

        store.update_task(id, TaskPatch::new().title("Final").category(None));

        let task = store.get_task(id).unwrap();
        assert_eq!(task.title, "Final");
        assert!(task.category.is_none());
        assert_eq!(task.description.as_deref(), Some("notes"));
        assert_eq!(task.created_at, created_at);
        assert_eq!(task.id, id);
    }

    #[test]
    fn test_missing_id_is_noop() {
        let mut store = TaskStore::with_examples();
        let ghost = {
            let mut other = TaskStore::new();
            other.add_task(NewTask::new("elsewhere"))
        };
        let before = store.tasks().to_vec();

        store.update_task(ghost, TaskPatch::new().title("changed"));
        store.toggle_task(ghost);
        store.delete_task(ghost);

        assert_eq!(store.tasks(), before.as_slice());
    }

    #[test]
    fn test_delete_keeps_order_gaps() {
        let mut store = TaskStore::new();
        let a = store.add_task(NewTask::new("a"));
        let b = store.add_task(NewTask::new("b"));
        let c = store.add_task(NewTask::new("c"));

        store.delete_task(b);
        store.delete_task(b);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get_task(a).unwrap().order, Some(0));
        assert_eq!(store.get_task(c).unwrap().order, Some(2));
        assert!(store.get_tasks().iter().all(|t| t.id != b));
    }

    #[test]
    fn test_toggle_only_flips_completed() {
        let mut store = TaskStore::new();
        let id = store.add_task(NewTask::new("a").with_priority(Priority::High));
        let before = store.get_task(id).unwrap().clone();

        store.toggle_task(id);

        let after = store.get_task(id).unwrap();
        assert!(after.completed);
        assert_eq!(
            Task {
                completed: false,
                ..after.clone()
            },
            before
        );
    }

    #[test]
    fn test_reorder_moves_and_renumbers() {
        let mut store = TaskStore::new();
        store.add_task(NewTask::new("c"));
        store.add_task(NewTask::new("b"));
        store.add_task(NewTask::new("a"));
        assert_eq!(titles(store.tasks()), ["a", "b", "c"]);

        store.reorder_tasks(0, 2);

        assert_eq!(titles(store.tasks()), ["b", "c", "a"]);
        let orders: Vec<Option<usize>> = store.tasks().iter().map(|t| t.order).collect();
        assert_eq!(orders, [Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_reorder_out_of_range_source_is_noop() {
        let mut store = TaskStore::with_examples();
        store.add_task(NewTask::new("extra"));
        let before = store.tasks().to_vec();

        store.reorder_tasks(4, 0);
        store.reorder_tasks(usize::MAX, 1);

        assert_eq!(store.tasks(), before.as_slice());
    }

    #[test]
    fn test_reorder_clamps_destination() {
        let mut store = TaskStore::new();
        store.add_task(NewTask::new("c"));
        store.add_task(NewTask::new("b"));
        store.add_task(NewTask::new("a"));

        store.reorder_tasks(0, 99);

        assert_eq!(titles(store.tasks()), ["b", "c", "a"]);
        assert_eq!(store.tasks()[2].order, Some(2));
    }

    #[test]
    fn test_reorder_on_empty_store() {
        let mut store = TaskStore::new();
        store.reorder_tasks(0, 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_get_tasks_does_not_mutate() {
        let mut store = TaskStore::with_examples();
        store.set_sort_by(SortBy::Title);
        store.set_filter(StatusFilter::Active);
        let before = store.tasks().to_vec();

        let first = store.get_tasks();
        let second = store.get_tasks();

        assert_eq!(first, second);
        assert_eq!(store.tasks(), before.as_slice());
    }

    #[test]
    fn test_examples() {
        let store = TaskStore::with_examples();
        assert_eq!(store.len(), 3);
        let orders: Vec<Option<usize>> = store.tasks().iter().map(|t| t.order).collect();
        assert_eq!(orders, [Some(0), Some(1), Some(2)]);
        assert_eq!(store.stats().completed, 1);
    }

    #[test]
    fn test_stats() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let mut store = TaskStore::new();
        assert_eq!(store.stats_on(today), TaskStats::default());

        let overdue = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        store.add_task(NewTask::new("late").with_due_date(overdue));
        store.add_task(NewTask::new("done").with_completed(true));
        store.add_task(NewTask::new("open"));

        let stats = store.stats_on(today);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.completion_rate, 33);
    }

    #[test]
    fn test_listeners_see_applied_changes_only() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);

        let mut store = TaskStore::new();
        let sub = store.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        let id = store.add_task(NewTask::new("a"));
        store.toggle_task(id);
        store.set_filter(StatusFilter::All); // unchanged
        store.set_filter(StatusFilter::Completed);
        store.reorder_tasks(5, 0);
        store.delete_task(id);
        store.delete_task(id);

        assert_eq!(
            *events.borrow(),
            vec![
                StoreEvent::TaskAdded(id),
                StoreEvent::TaskToggled { id, completed: true },
                StoreEvent::FilterChanged(StatusFilter::Completed),
                StoreEvent::TaskDeleted(id),
            ]
        );

        assert!(store.unsubscribe(sub));
        assert!(!store.unsubscribe(sub));
        store.add_task(NewTask::new("b"));
        assert_eq!(events.borrow().len(), 4);
    }

    #[test]
    fn test_update_without_change_emits_nothing() {
        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);

        let mut store = TaskStore::new();
        let id = store.add_task(NewTask::new("a").with_category("home"));
        store.subscribe(move |_| *counter.borrow_mut() += 1);
        let before = store.tasks().to_vec();

        store.update_task(id, TaskPatch::new());
        store.update_task(
            id,
            TaskPatch::new()
                .title("a")
                .priority(Priority::Medium)
                .category(Some("home".to_string())),
        );

        assert_eq!(*count.borrow(), 0);
        assert_eq!(store.tasks(), before.as_slice());

        store.update_task(id, TaskPatch::new().priority(Priority::High));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_search_setter_keeps_raw_query() {
        let mut store = TaskStore::new();
        store.set_search_query("  Milk ");
        assert_eq!(store.search_query(), "  Milk ");
        assert_eq!(store.view().search_needle().as_deref(), Some("milk"));
    }
}
