use std::sync::{Arc, Mutex};

use crate::data::lock_ignoring_poison;
use crate::prefs::{CategoryScope, PrefsStore};
use crate::store::client::Store;

use super::query::{self, Criteria, KindFilter, SearchItem};

#[derive(Default)]
struct SearchState {
    criteria: Criteria,
    results: Vec<SearchItem>,
}

/// Cross-collection search over tasks and schedules, all through the shared
/// query layer.
pub struct SearchView {
    store: Arc<Store>,
    prefs: Arc<PrefsStore>,
    state: Mutex<SearchState>,
}

impl SearchView {
    pub fn new(store: Arc<Store>, prefs: Arc<PrefsStore>) -> Arc<SearchView> {
        let view = Arc::new(SearchView {
            store: store.clone(),
            prefs,
            state: Mutex::new(SearchState::default()),
        });

        let weak = Arc::downgrade(&view);
        store.subscribe(move |_event| {
            if let Some(view) = weak.upgrade() {
                view.refresh();
            }
        });

        view.refresh();
        view
    }

    pub fn set_criteria(&self, criteria: Criteria) {
        lock_ignoring_poison(&self.state).criteria = criteria;
        self.refresh();
    }

    pub fn results(&self) -> Vec<SearchItem> {
        lock_ignoring_poison(&self.state).results.clone()
    }

    /// Tasks first, then schedules, each in collection order; priorities come
    /// from the category list matching the item's kind.
    pub fn refresh(&self) {
        let task_categories = self.prefs.categories(CategoryScope::Tasks);
        let schedule_categories = self.prefs.categories(CategoryScope::Schedules);

        let mut items: Vec<SearchItem> = self
            .store
            .tasks()
            .iter()
            .map(|task| query::task_item(task, &task_categories))
            .collect();
        items.extend(
            self.store
                .schedules()
                .iter()
                .map(|schedule| query::schedule_item(schedule, &schedule_categories)),
        );

        let mut state = lock_ignoring_poison(&self.state);
        let criteria = state.criteria.clone();
        state.results = query::filter_items(&items, &criteria);
    }

    /// The options for the category filter dropdown: every defined category
    /// plus any key still in use by a task or schedule, deduplicated in
    /// first-seen order.
    pub fn category_options(&self) -> Vec<String> {
        let mut options: Vec<String> = vec![];
        let mut push = |value: String| {
            if !value.is_empty() && !options.contains(&value) {
                options.push(value);
            }
        };

        for category in self.prefs.categories(CategoryScope::Tasks) {
            push(category.value);
        }
        for category in self.prefs.categories(CategoryScope::Schedules) {
            push(category.value);
        }
        for task in self.store.tasks() {
            push(task.category);
        }
        for schedule in self.store.schedules() {
            push(schedule.category);
        }

        options
    }
}
