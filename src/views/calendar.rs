//! Month-grid calendar projection: whole weeks, Sunday first, padded with
//! the neighboring months' days, each day carrying the tasks due and the
//! schedules planned on it.

use chrono::{Datelike, Days, Local, NaiveDate};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::data::lock_ignoring_poison;
use crate::schedules::data::Schedule;
use crate::store::client::Store;
use crate::tasks::data::Task;

#[derive(Clone, Debug)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub in_month: bool,
    pub tasks: Vec<Task>,
    pub schedules: Vec<Schedule>,
}

#[derive(Clone, Debug, Default)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<Vec<CalendarDay>>,
}

fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

pub fn month_grid(year: i32, month: u32, tasks: &[Task], schedules: &[Schedule]) -> MonthGrid {
    let first = match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(first) => first,
        None => return MonthGrid { year, month, weeks: vec![] },
    };

    let mut tasks_by_day: HashMap<NaiveDate, Vec<Task>> = HashMap::new();
    for task in tasks {
        if let Some(day) = parse_day(&task.due_date) {
            tasks_by_day.entry(day).or_default().push(task.clone());
        }
    }
    let mut schedules_by_day: HashMap<NaiveDate, Vec<Schedule>> = HashMap::new();
    for schedule in schedules {
        if let Some(day) = parse_day(&schedule.date) {
            schedules_by_day.entry(day).or_default().push(schedule.clone());
        }
    }

    let next_month_first = match month {
        12 => NaiveDate::from_ymd_opt(year + 1, 1, 1),
        _ => NaiveDate::from_ymd_opt(year, month + 1, 1),
    };
    let days_in_month = match next_month_first {
        Some(next) => next.signed_duration_since(first).num_days(),
        None => return MonthGrid { year, month, weeks: vec![] },
    };

    let lead = first.weekday().num_days_from_sunday() as u64;
    let cells = (lead as i64 + days_in_month + 6) / 7 * 7;
    let start = match first.checked_sub_days(Days::new(lead)) {
        Some(start) => start,
        None => first,
    };

    let mut weeks = vec![];
    let mut week = vec![];
    let mut date = start;
    for _ in 0..cells {
        week.push(CalendarDay {
            date,
            in_month: date.month() == month && date.year() == year,
            tasks: tasks_by_day.remove(&date).unwrap_or_default(),
            schedules: schedules_by_day.remove(&date).unwrap_or_default(),
        });
        if week.len() == 7 {
            weeks.push(std::mem::take(&mut week));
        }
        date = match date.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => break,
        };
    }

    MonthGrid { year, month, weeks }
}

struct CalendarState {
    year: i32,
    month: u32,
    grid: MonthGrid,
}

pub struct CalendarView {
    store: Arc<Store>,
    state: Mutex<CalendarState>,
}

impl CalendarView {
    pub fn new(store: Arc<Store>) -> Arc<CalendarView> {
        let today = Local::now().date_naive();
        let view = Arc::new(CalendarView {
            store: store.clone(),
            state: Mutex::new(CalendarState {
                year: today.year(),
                month: today.month(),
                grid: MonthGrid::default(),
            }),
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

    pub fn refresh(&self) {
        let tasks = self.store.tasks();
        let schedules = self.store.schedules();
        let mut state = lock_ignoring_poison(&self.state);
        state.grid = month_grid(state.year, state.month, &tasks, &schedules);
    }

    pub fn next_month(&self) {
        {
            let mut state = lock_ignoring_poison(&self.state);
            if state.month == 12 {
                state.year += 1;
                state.month = 1;
            } else {
                state.month += 1;
            }
        }
        self.refresh();
    }

    pub fn prev_month(&self) {
        {
            let mut state = lock_ignoring_poison(&self.state);
            if state.month == 1 {
                state.year -= 1;
                state.month = 12;
            } else {
                state.month -= 1;
            }
        }
        self.refresh();
    }

    pub fn grid(&self) -> MonthGrid {
        lock_ignoring_poison(&self.state).grid.clone()
    }
}
