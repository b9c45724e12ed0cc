use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{delete, get, patch, post, put, State};

use std::sync::Arc;

use crate::api_error::{ApiError, ApiResult};
use crate::data::ScheduleID;
use crate::store::adapter::SqliteStore;
use crate::validation::{validate_schedule, validate_schedule_patch};

use super::data::*;

#[get("/schedules")]
pub fn get_schedules(store: &State<Arc<SqliteStore>>) -> ApiResult<Json<Vec<Schedule>>> {
    Ok(Json(store.schedules()?))
}

#[post("/schedules", format = "json", data = "<input>")]
pub fn add_schedule(
    input: Json<ScheduleInput>,
    store: &State<Arc<SqliteStore>>,
) -> ApiResult<status::Created<Json<Schedule>>> {
    let input = input.into_inner();

    let errors = validate_schedule(&input);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let schedule = store.add_schedule(input.into_new_schedule())?;
    let location = format!("/schedules/{}", schedule.id);
    Ok(status::Created::new(location).body(Json(schedule)))
}

#[put("/schedules/<id>", format = "json", data = "<patch>")]
pub fn set_schedule(
    id: ScheduleID,
    patch: Json<SchedulePatch>,
    store: &State<Arc<SqliteStore>>,
) -> ApiResult<Status> {
    let patch = patch.into_inner();

    let errors = validate_schedule_patch(&patch);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    store.update_schedule(id, &patch)?;
    Ok(Status::NoContent)
}

#[delete("/schedules/<id>")]
pub fn delete_schedule(id: ScheduleID, store: &State<Arc<SqliteStore>>) -> ApiResult<Status> {
    store.delete_schedule(id)?;
    Ok(Status::NoContent)
}

#[patch("/schedules/<id>/complete")]
pub fn toggle_schedule(id: ScheduleID, store: &State<Arc<SqliteStore>>) -> ApiResult<Status> {
    store.toggle_schedule_completed(id)?;
    Ok(Status::NoContent)
}
