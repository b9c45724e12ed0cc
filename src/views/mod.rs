pub mod calendar;
pub mod dashboard;
pub mod query;
pub mod reminders;
pub mod schedule_list;
pub mod search;
pub mod task_list;
