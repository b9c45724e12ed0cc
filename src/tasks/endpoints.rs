use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{delete, get, patch, post, put, State};

use std::sync::Arc;

use crate::api_error::{ApiError, ApiResult};
use crate::data::TaskID;
use crate::store::adapter::SqliteStore;
use crate::validation::{validate_task, validate_task_patch};

use super::data::*;

#[get("/tasks?<search>")]
pub fn get_tasks(
    search: Option<&str>,
    store: &State<Arc<SqliteStore>>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = match search {
        Some(term) => store.search_tasks(term)?,
        None => store.tasks()?,
    };
    Ok(Json(tasks))
}

#[post("/tasks", format = "json", data = "<input>")]
pub fn add_task(
    input: Json<TaskInput>,
    store: &State<Arc<SqliteStore>>,
) -> ApiResult<status::Created<Json<Task>>> {
    let input = input.into_inner();

    let errors = validate_task(&input);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let task = store.add_task(input.into_new_task())?;
    let location = format!("/tasks/{}", task.id);
    Ok(status::Created::new(location).body(Json(task)))
}

#[put("/tasks/<id>", format = "json", data = "<patch>")]
pub fn set_task(
    id: TaskID,
    patch: Json<TaskPatch>,
    store: &State<Arc<SqliteStore>>,
) -> ApiResult<Status> {
    let patch = patch.into_inner();

    let errors = validate_task_patch(&patch);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    store.update_task(id, &patch)?;
    Ok(Status::NoContent)
}

#[delete("/tasks/<id>")]
pub fn delete_task(id: TaskID, store: &State<Arc<SqliteStore>>) -> ApiResult<Status> {
    store.delete_task(id)?;
    Ok(Status::NoContent)
}

#[patch("/tasks/<id>/complete")]
pub fn toggle_task(id: TaskID, store: &State<Arc<SqliteStore>>) -> ApiResult<Status> {
    store.toggle_task_completed(id)?;
    Ok(Status::NoContent)
}
