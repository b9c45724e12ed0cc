use std::sync::{Arc, Mutex};

use crate::data::{lock_ignoring_poison, TaskID};
use crate::prefs::{CategoryScope, PrefsStore, Priority};
use crate::store::client::{ChangeEvent, Store};

use super::query::{self, Criteria, KindFilter, StatusFilter};

#[derive(Clone, Debug, PartialEq)]
pub struct TaskRow {
    pub id: TaskID,
    pub title: String,
    pub due_date: String,
    pub category: String,
    pub priority: Option<Priority>,
    pub completed: bool,
    /// Optimistic insert awaiting its authoritative snapshot.
    pub pending: bool,
}

#[derive(Clone, Debug, Default)]
pub struct TaskListFilter {
    pub status: StatusFilter,
    pub term: String,
    pub category: Option<String>,
}

#[derive(Default)]
struct TaskListState {
    filter: TaskListFilter,
    rows: Vec<TaskRow>,
}

/// Task list projection: subscribed to the store for the page lifetime,
/// rebuilt wholesale on every change event or filter interaction.
pub struct TaskListView {
    store: Arc<Store>,
    prefs: Arc<PrefsStore>,
    state: Mutex<TaskListState>,
}

impl TaskListView {
    pub fn new(store: Arc<Store>, prefs: Arc<PrefsStore>) -> Arc<TaskListView> {
        let view = Arc::new(TaskListView {
            store: store.clone(),
            prefs,
            state: Mutex::new(TaskListState::default()),
        });

        let weak = Arc::downgrade(&view);
        store.subscribe(move |event| {
            if let ChangeEvent::TasksUpdated(_) = event {
                if let Some(view) = weak.upgrade() {
                    view.refresh();
                }
            }
        });

        view.refresh();
        view
    }

    pub fn set_filter(&self, filter: TaskListFilter) {
        lock_ignoring_poison(&self.state).filter = filter;
        self.refresh();
    }

    pub fn rows(&self) -> Vec<TaskRow> {
        lock_ignoring_poison(&self.state).rows.clone()
    }

    pub fn refresh(&self) {
        let records = self.store.task_records();
        let categories = self.prefs.categories(CategoryScope::Tasks);

        let mut state = lock_ignoring_poison(&self.state);
        let criteria = Criteria {
            term: state.filter.term.clone(),
            kind: KindFilter::Tasks,
            status: state.filter.status,
            category: state.filter.category.clone(),
            priority: None,
        };

        let mut rows: Vec<TaskRow> = records
            .iter()
            .filter(|record| query::matches(&query::task_item(record.task(), &categories), &criteria))
            .map(|record| {
                let task = record.task();
                TaskRow {
                    id: task.id,
                    title: task.title.clone(),
                    due_date: task.due_date.clone(),
                    category: task.category.clone(),
                    priority: query::priority_of(&task.category, &categories),
                    completed: task.completed,
                    pending: record.is_pending(),
                }
            })
            .collect();
        rows.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.id.cmp(&b.id)));

        state.rows = rows;
    }
}
