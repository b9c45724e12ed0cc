//! Form submission: validate, report problems as toasts, and hand valid
//! records to the store. Invalid input never reaches storage.

use crate::api_error::{ApiError, ApiResult, FieldErrors};
use crate::notify::ToastLevel;
use crate::schedules::data::{Schedule, ScheduleInput};
use crate::store::client::Store;
use crate::tasks::data::{Task, TaskInput};
use crate::validation;

const MAX_TITLE_LEN: usize = 50;

/// REST rules plus the form-only title length cap.
pub fn validate_task_form(input: &TaskInput) -> FieldErrors {
    let mut errors = validation::validate_task(input);
    if let Some(title) = input.title.as_deref() {
        if title.trim().chars().count() > MAX_TITLE_LEN {
            errors
                .entry("title".to_string())
                .or_default()
                .push("Title must be less than 50 characters".to_string());
        }
    }
    errors
}

fn summarize(errors: &FieldErrors) -> String {
    errors
        .values()
        .flatten()
        .cloned()
        .collect::<Vec<String>>()
        .join("; ")
}

/// New-task form: validated, then inserted through the optimistic path.
pub fn submit_task(store: &Store, input: TaskInput) -> ApiResult<Task> {
    let errors = validate_task_form(&input);
    if !errors.is_empty() {
        store.notify(ToastLevel::Error, "Check the form", &summarize(&errors));
        return Err(ApiError::Validation(errors));
    }

    store.create_task(input.into_new_task())
}

pub fn submit_schedule(store: &Store, input: ScheduleInput) -> ApiResult<Schedule> {
    let errors = validation::validate_schedule(&input);
    if !errors.is_empty() {
        store.notify(ToastLevel::Error, "Check the form", &summarize(&errors));
        return Err(ApiError::Validation(errors));
    }

    store.create_schedule(input.into_new_schedule())
}
