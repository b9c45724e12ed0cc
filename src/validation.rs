//! Field-level validation shared by the REST endpoints and the form modules.
//! Failures are collected into a per-field error map rather than failing fast.

use chrono::{NaiveDate, NaiveTime};

use crate::api_error::FieldErrors;
use crate::schedules::data::ScheduleInput;
use crate::tasks::data::{TaskInput, PRIORITIES};

pub fn is_valid_date(raw: &str) -> bool {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
}

pub fn is_valid_time(raw: &str) -> bool {
    NaiveTime::parse_from_str(raw, "%H:%M").is_ok()
}

fn push_error(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

pub fn validate_task(input: &TaskInput) -> FieldErrors {
    let mut errors = FieldErrors::new();

    match input.title.as_deref().map(str::trim) {
        None | Some("") => push_error(&mut errors, "title", "Title is required"),
        Some(_) => {}
    }

    match input.due_date.as_deref() {
        None | Some("") => push_error(&mut errors, "dueDate", "Due date is required"),
        Some(raw) if !is_valid_date(raw) => {
            push_error(&mut errors, "dueDate", "Invalid date format")
        }
        Some(_) => {}
    }

    if let Some(priority) = input.priority.as_deref() {
        if !PRIORITIES.contains(&priority) {
            push_error(
                &mut errors,
                "priority",
                "Priority must be one of high, medium, low",
            );
        }
    }

    errors
}

/// Partial-update validation: absent fields are fine, present ones must be
/// well-formed.
pub fn validate_task_patch(patch: &crate::tasks::data::TaskPatch) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if let Some(title) = patch.title.as_deref() {
        if title.trim().is_empty() {
            push_error(&mut errors, "title", "Title is required");
        }
    }
    if let Some(raw) = patch.due_date.as_deref() {
        if !is_valid_date(raw) {
            push_error(&mut errors, "dueDate", "Invalid date format");
        }
    }
    if let Some(priority) = patch.priority.as_deref() {
        if !PRIORITIES.contains(&priority) {
            push_error(
                &mut errors,
                "priority",
                "Priority must be one of high, medium, low",
            );
        }
    }

    errors
}

pub fn validate_schedule_patch(patch: &crate::schedules::data::SchedulePatch) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if let Some(title) = patch.title.as_deref() {
        if title.trim().is_empty() {
            push_error(&mut errors, "title", "Title is required");
        }
    }
    if let Some(raw) = patch.date.as_deref() {
        if !is_valid_date(raw) {
            push_error(&mut errors, "date", "Invalid date format");
        }
    }
    if let Some(raw) = patch.time.as_deref() {
        if !is_valid_time(raw) {
            push_error(&mut errors, "time", "Time must be HH:MM (24-hour)");
        }
    }

    errors
}

pub fn validate_schedule(input: &ScheduleInput) -> FieldErrors {
    let mut errors = FieldErrors::new();

    match input.title.as_deref().map(str::trim) {
        None | Some("") => push_error(&mut errors, "title", "Title is required"),
        Some(_) => {}
    }

    match input.date.as_deref() {
        None | Some("") => push_error(&mut errors, "date", "Date is required"),
        Some(raw) if !is_valid_date(raw) => push_error(&mut errors, "date", "Invalid date format"),
        Some(_) => {}
    }

    match input.time.as_deref() {
        None | Some("") => push_error(&mut errors, "time", "Time is required"),
        Some(raw) if !is_valid_time(raw) => {
            push_error(&mut errors, "time", "Time must be HH:MM (24-hour)")
        }
        Some(_) => {}
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_missing_fields_collect_per_field() {
        let errors = validate_task(&TaskInput::default());
        assert_eq!(errors.len(), 2);
        assert!(errors.contains_key("title"));
        assert!(errors.contains_key("dueDate"));
    }

    #[test]
    fn task_with_bad_priority_and_date() {
        let input = TaskInput {
            title: Some("Buy milk".to_string()),
            due_date: Some("10/01/2024".to_string()),
            priority: Some("urgent".to_string()),
            ..TaskInput::default()
        };
        let errors = validate_task(&input);
        assert!(errors.contains_key("dueDate"));
        assert!(errors.contains_key("priority"));
        assert!(!errors.contains_key("title"));
    }

    #[test]
    fn valid_task_has_no_errors() {
        let input = TaskInput {
            title: Some("Buy milk".to_string()),
            due_date: Some("2024-01-10".to_string()),
            ..TaskInput::default()
        };
        assert!(validate_task(&input).is_empty());
    }

    #[test]
    fn schedule_patch_checks_only_present_fields() {
        use crate::schedules::data::SchedulePatch;

        assert!(validate_schedule_patch(&SchedulePatch::default()).is_empty());

        let patch = SchedulePatch {
            date: Some("not-a-date".to_string()),
            time: Some("25:99".to_string()),
            ..SchedulePatch::default()
        };
        let errors = validate_schedule_patch(&patch);
        assert!(errors.contains_key("date"));
        assert!(errors.contains_key("time"));
        assert!(!errors.contains_key("title"));
    }

    #[test]
    fn schedule_time_must_be_24_hour() {
        let input = ScheduleInput {
            title: Some("Dentist".to_string()),
            date: Some("2024-02-01".to_string()),
            time: Some("2:30 pm".to_string()),
            ..ScheduleInput::default()
        };
        let errors = validate_schedule(&input);
        assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["time"]);
    }
}
