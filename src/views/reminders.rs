//! Reminder engine: recomputes the set of soon-due items on every data
//! change and on a fixed interval, publishes a badge count, and shows a
//! summary toast on data-change triggers only, debounced.

use chrono::{Days, NaiveDate, NaiveDateTime};

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::data::lock_ignoring_poison;
use crate::notify::{Notifier, ToastLevel};
use crate::schedules::data::Schedule;
use crate::store::client::Store;
use crate::tasks::data::Task;

use super::query::ItemKind;

pub const DAYS_AHEAD: u64 = 3;
const CHECK_INTERVAL: Duration = Duration::from_secs(30 * 60);
const TOAST_SUPPRESSION: Duration = Duration::from_millis(2500);

#[derive(Clone, Debug, PartialEq)]
pub struct ReminderItem {
    pub kind: ItemKind,
    pub title: String,
    pub when: String,
    pub description: Option<String>,
}

/// Non-completed tasks due in `[today, today + 3 days]`, inclusive.
pub fn expiring_tasks(tasks: &[Task], today: NaiveDate) -> Vec<ReminderItem> {
    let limit = match today.checked_add_days(Days::new(DAYS_AHEAD)) {
        Some(limit) => limit,
        None => return vec![],
    };

    tasks
        .iter()
        .filter(|task| !task.completed)
        .filter_map(|task| {
            let due = NaiveDate::parse_from_str(&task.due_date, "%Y-%m-%d").ok()?;
            (due >= today && due <= limit).then(|| ReminderItem {
                kind: ItemKind::Task,
                title: task.title.clone(),
                when: task.due_date.clone(),
                description: task.description.clone(),
            })
        })
        .collect()
}

/// Non-completed schedules whose date+time lies in `[now, now + 3 days]`.
pub fn expiring_schedules(schedules: &[Schedule], now: NaiveDateTime) -> Vec<ReminderItem> {
    let limit = now + chrono::Duration::days(DAYS_AHEAD as i64);

    schedules
        .iter()
        .filter(|schedule| !schedule.completed)
        .filter_map(|schedule| {
            let raw = format!("{}T{}", schedule.date, schedule.time);
            let at = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M").ok()?;
            (at >= now && at <= limit).then(|| ReminderItem {
                kind: ItemKind::Schedule,
                title: schedule.title.clone(),
                when: format!("{} {}", schedule.date, schedule.time),
                description: schedule.description.clone(),
            })
        })
        .collect()
}

struct EngineState {
    items: Vec<ReminderItem>,
    last_toast: Option<Instant>,
}

pub struct ReminderEngine {
    store: Arc<Store>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<EngineState>,
}

impl ReminderEngine {
    pub fn new(store: Arc<Store>, notifier: Arc<dyn Notifier>) -> Arc<ReminderEngine> {
        let engine = Arc::new(ReminderEngine {
            store: store.clone(),
            notifier,
            state: Mutex::new(EngineState {
                items: vec![],
                last_toast: None,
            }),
        });

        let weak = Arc::downgrade(&engine);
        store.subscribe(move |_event| {
            if let Some(engine) = weak.upgrade() {
                engine.check(true);
            }
        });

        engine.check(false);
        engine
    }

    /// `notify` is true for data-change triggers; the periodic timer only
    /// refreshes the badge.
    pub fn check(&self, notify: bool) {
        let now = chrono::Local::now().naive_local();
        self.run_check(&self.store.tasks(), &self.store.schedules(), now, notify);
    }

    fn run_check(
        &self,
        tasks: &[Task],
        schedules: &[Schedule],
        now: NaiveDateTime,
        notify: bool,
    ) {
        let mut items = expiring_tasks(tasks, now.date());
        items.extend(expiring_schedules(schedules, now));

        self.notifier.update_badge(items.len());

        let should_toast = {
            let mut state = lock_ignoring_poison(&self.state);
            state.items = items.clone();

            let wanted = notify && !items.is_empty();
            let suppressed = state
                .last_toast
                .map(|at| at.elapsed() < TOAST_SUPPRESSION)
                .unwrap_or(false);
            if wanted && !suppressed {
                state.last_toast = Some(Instant::now());
            }
            wanted && !suppressed
        };

        if should_toast {
            let task_count = items.iter().filter(|i| i.kind == ItemKind::Task).count();
            let schedule_count = items.len() - task_count;
            let message = format!(
                "{} task{}, {} schedule{} due within {} days",
                task_count,
                if task_count == 1 { "" } else { "s" },
                schedule_count,
                if schedule_count == 1 { "" } else { "s" },
                DAYS_AHEAD,
            );
            self.notifier
                .toast(ToastLevel::Warning, "Upcoming Deadlines", &message);
        }
    }

    /// The current badge contents, for the notification modal.
    pub fn items(&self) -> Vec<ReminderItem> {
        lock_ignoring_poison(&self.state).items.clone()
    }

    /// Spawns the periodic badge refresh; runs for the process lifetime.
    pub fn start_interval(self: &Arc<Self>) {
        let engine = self.clone();
        std::thread::spawn(move || loop {
            std::thread::sleep(CHECK_INTERVAL);
            engine.check(false);
        });
    }
}
