//! Dashboard aggregation. The stats are a pure function of the task array
//! and a reference day; the view memoizes on a content hash of the fields
//! that actually feed the stats, so irrelevant edits do not trigger a
//! recompute.

use chrono::{DateTime, Days, Local, NaiveDate};

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::data::lock_ignoring_poison;
use crate::store::client::{ChangeEvent, Store};
use crate::tasks::data::Task;

#[derive(Clone, Debug, PartialEq, Default)]
pub struct DashboardStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
    /// Rounded percentage; 0 when there are no tasks.
    pub completion_rate: u32,
    /// Per-category counts, descending, ties broken by name.
    pub categories: Vec<(String, usize)>,
    pub top_category: Option<String>,
    pub daily_streak: u32,
}

/// Hash of the fields the dashboard depends on.
pub fn tasks_hash(tasks: &[Task]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for task in tasks {
        (
            task.id,
            task.completed,
            &task.due_date,
            &task.category,
            &task.completed_at,
        )
            .hash(&mut hasher);
    }
    hasher.finish()
}

pub fn calculate_stats(tasks: &[Task], today: NaiveDate) -> DashboardStats {
    let mut completed = 0;
    let mut overdue = 0;
    let mut categories: HashMap<String, usize> = HashMap::new();
    let mut completion_days: HashSet<NaiveDate> = HashSet::new();

    for task in tasks {
        if task.completed {
            completed += 1;
            if let Some(at) = &task.completed_at {
                if let Ok(at) = DateTime::parse_from_rfc3339(at) {
                    completion_days.insert(at.date_naive());
                }
            }
        } else if let Ok(due) = NaiveDate::parse_from_str(&task.due_date, "%Y-%m-%d") {
            if due < today {
                overdue += 1;
            }
        }

        let key = if task.category.is_empty() {
            "Uncategorized".to_string()
        } else {
            task.category.clone()
        };
        *categories.entry(key).or_insert(0) += 1;
    }

    let total = tasks.len();
    let pending = total - completed;
    let completion_rate = if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as u32
    };

    let mut categories: Vec<(String, usize)> = categories.into_iter().collect();
    categories.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    let top_category = categories.first().map(|(name, _)| name.clone());

    DashboardStats {
        total,
        completed,
        pending,
        overdue,
        completion_rate,
        categories,
        top_category,
        daily_streak: daily_streak(&completion_days, today),
    }
}

/// Consecutive days with at least one completion, walking backward from
/// today. Today itself may be empty without breaking the streak. Capped at a
/// year.
pub fn daily_streak(completion_days: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut date = today;
    for i in 0..365 {
        if completion_days.contains(&date) {
            streak += 1;
        } else if i > 0 {
            break;
        }
        date = match date.checked_sub_days(Days::new(1)) {
            Some(previous) => previous,
            None => break,
        };
    }
    streak
}

struct DashboardState {
    last_hash: Option<u64>,
    stats: DashboardStats,
}

pub struct DashboardView {
    store: Arc<Store>,
    state: Mutex<DashboardState>,
    recomputes: AtomicUsize,
}

impl DashboardView {
    pub fn new(store: Arc<Store>) -> Arc<DashboardView> {
        let view = Arc::new(DashboardView {
            store: store.clone(),
            state: Mutex::new(DashboardState {
                last_hash: None,
                stats: DashboardStats::default(),
            }),
            recomputes: AtomicUsize::new(0),
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

    pub fn refresh(&self) {
        let tasks = self.store.tasks();
        let hash = tasks_hash(&tasks);

        let mut state = lock_ignoring_poison(&self.state);
        if state.last_hash == Some(hash) {
            return;
        }
        state.last_hash = Some(hash);
        state.stats = calculate_stats(&tasks, Local::now().date_naive());
        self.recomputes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> DashboardStats {
        lock_ignoring_poison(&self.state).stats.clone()
    }

    pub fn recomputes(&self) -> usize {
        self.recomputes.load(Ordering::Relaxed)
    }
}
