use std::sync::{Arc, Mutex};

use crate::data::{lock_ignoring_poison, ScheduleID};
use crate::prefs::{CategoryScope, PrefsStore, Priority};
use crate::store::client::{ChangeEvent, Store};

use super::query::{self, Criteria, KindFilter, StatusFilter};

#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleRow {
    pub id: ScheduleID,
    pub title: String,
    pub date: String,
    pub time: String,
    pub category: String,
    pub priority: Option<Priority>,
    pub completed: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ScheduleListFilter {
    pub status: StatusFilter,
    pub term: String,
    pub category: Option<String>,
}

#[derive(Default)]
struct ScheduleListState {
    filter: ScheduleListFilter,
    rows: Vec<ScheduleRow>,
}

pub struct ScheduleListView {
    store: Arc<Store>,
    prefs: Arc<PrefsStore>,
    state: Mutex<ScheduleListState>,
}

impl ScheduleListView {
    pub fn new(store: Arc<Store>, prefs: Arc<PrefsStore>) -> Arc<ScheduleListView> {
        let view = Arc::new(ScheduleListView {
            store: store.clone(),
            prefs,
            state: Mutex::new(ScheduleListState::default()),
        });

        let weak = Arc::downgrade(&view);
        store.subscribe(move |event| {
            if let ChangeEvent::SchedulesUpdated(_) = event {
                if let Some(view) = weak.upgrade() {
                    view.refresh();
                }
            }
        });

        view.refresh();
        view
    }

    pub fn set_filter(&self, filter: ScheduleListFilter) {
        lock_ignoring_poison(&self.state).filter = filter;
        self.refresh();
    }

    pub fn rows(&self) -> Vec<ScheduleRow> {
        lock_ignoring_poison(&self.state).rows.clone()
    }

    pub fn refresh(&self) {
        let schedules = self.store.schedules();
        let categories = self.prefs.categories(CategoryScope::Schedules);

        let mut state = lock_ignoring_poison(&self.state);
        let criteria = Criteria {
            term: state.filter.term.clone(),
            kind: KindFilter::Schedules,
            status: state.filter.status,
            category: state.filter.category.clone(),
            priority: None,
        };

        let mut rows: Vec<ScheduleRow> = schedules
            .iter()
            .filter(|schedule| {
                query::matches(&query::schedule_item(schedule, &categories), &criteria)
            })
            .map(|schedule| ScheduleRow {
                id: schedule.id,
                title: schedule.title.clone(),
                date: schedule.date.clone(),
                time: schedule.time.clone(),
                category: schedule.category.clone(),
                priority: query::priority_of(&schedule.category, &categories),
                completed: schedule.completed,
            })
            .collect();
        rows.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then(a.time.cmp(&b.time))
                .then(a.id.cmp(&b.id))
        });

        state.rows = rows;
    }
}
