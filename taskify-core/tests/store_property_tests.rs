//! Property-based tests for the task store
//!
//! Covers id uniqueness, the filter partition, priority ordering, blank
//! search and dense reorder numbering for arbitrary collections.

use std::collections::HashSet;

use proptest::prelude::*;
use taskify_core::{NewTask, Priority, SortBy, StatusFilter, TaskId, TaskStore};

fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop_oneof![Just(Priority::Low), Just(Priority::Medium), Just(Priority::High)]
}

/// (title, priority, completed) triples used to populate a store
fn tasks_strategy(max: usize) -> impl Strategy<Value = Vec<(String, Priority, bool)>> {
    prop::collection::vec(("[a-zA-Z ]{1,12}", priority_strategy(), any::<bool>()), 0..max)
}

fn store_from(entries: &[(String, Priority, bool)]) -> TaskStore {
    let mut store = TaskStore::new();
    for (title, priority, completed) in entries {
        store.add_task(
            NewTask::new(title.clone())
                .with_priority(*priority)
                .with_completed(*completed),
        );
    }
    store
}

fn view_ids(store: &TaskStore) -> Vec<TaskId> {
    store.get_tasks().into_iter().map(|t| t.id).collect()
}

proptest! {
    #[test]
    fn prop_ids_never_reused(
        entries in tasks_strategy(30),
        deletes in prop::collection::vec(any::<prop::sample::Index>(), 0..10),
    ) {
        let mut store = store_from(&entries);
        let mut seen: HashSet<TaskId> = store.tasks().iter().map(|t| t.id).collect();
        prop_assert_eq!(seen.len(), entries.len());

        for index in deletes {
            if store.is_empty() {
                break;
            }
            let id = store.tasks()[index.index(store.len())].id;
            store.delete_task(id);
            prop_assert!(store.get_tasks().iter().all(|t| t.id != id));
        }

        for _ in 0..5 {
            let id = store.add_task(NewTask::new("again"));
            prop_assert!(seen.insert(id), "id {} was handed out twice", id);
        }
    }

    #[test]
    fn prop_filters_partition_the_view(
        entries in tasks_strategy(40),
        query in "[a-z ]{0,3}",
        sort in 0usize..4,
    ) {
        let mut store = store_from(&entries);
        store.set_search_query(query);
        store.set_sort_by([SortBy::Date, SortBy::Priority, SortBy::Title, SortBy::Manual][sort]);

        let all: HashSet<TaskId> = view_ids(&store).into_iter().collect();

        store.set_filter(StatusFilter::Active);
        let active = store.get_tasks();
        prop_assert!(active.iter().all(|t| !t.completed));

        store.set_filter(StatusFilter::Completed);
        let completed = store.get_tasks();
        prop_assert!(completed.iter().all(|t| t.completed));

        let active: HashSet<TaskId> = active.into_iter().map(|t| t.id).collect();
        let completed: HashSet<TaskId> = completed.into_iter().map(|t| t.id).collect();

        prop_assert!(active.is_subset(&all));
        prop_assert!(active.is_disjoint(&completed));
        prop_assert_eq!(active.union(&completed).copied().collect::<HashSet<_>>(), all);
    }

    #[test]
    fn prop_priority_sort_groups_by_rank(entries in tasks_strategy(40)) {
        let mut store = store_from(&entries);
        store.set_sort_by(SortBy::Priority);

        let ranks: Vec<u8> = store.get_tasks().iter().map(|t| t.priority.rank()).collect();
        prop_assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn prop_blank_search_is_no_search(entries in tasks_strategy(30), blank in "[ \t]{0,5}") {
        let mut store = store_from(&entries);
        let unsearched = view_ids(&store);

        store.set_search_query(blank);
        prop_assert_eq!(view_ids(&store), unsearched);
    }

    #[test]
    fn prop_reorder_leaves_dense_order(
        entries in tasks_strategy(25),
        source in any::<prop::sample::Index>(),
        destination in any::<prop::sample::Index>(),
    ) {
        prop_assume!(!entries.is_empty());
        let mut store = store_from(&entries);
        let len = store.len();
        let before: Vec<TaskId> = store.tasks().iter().map(|t| t.id).collect();

        let source = source.index(len);
        let destination = destination.index(len);
        store.reorder_tasks(source, destination);

        let after: Vec<TaskId> = store.tasks().iter().map(|t| t.id).collect();
        for (position, task) in store.tasks().iter().enumerate() {
            prop_assert_eq!(task.order, Some(position));
        }

        let mut expected = before.clone();
        let moved = expected.remove(source);
        expected.insert(destination, moved);
        prop_assert_eq!(after, expected);
    }
}
