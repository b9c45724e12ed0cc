pub mod api_error;
pub mod cors;
pub mod data;
pub mod forms;
pub mod notify;
pub mod prefs;
pub mod schedules;
pub mod store;
pub mod tasks;
pub mod validation;
pub mod views;

use rocket::{routes, Build, Rocket};

use std::sync::Arc;

use store::adapter::SqliteStore;

pub fn rocket(store: Arc<SqliteStore>) -> Rocket<Build> {
    rocket::build().manage(store).attach(cors::Cors).mount(
        "/",
        routes![
            cors::preflight,
            tasks::endpoints::get_tasks,
            tasks::endpoints::add_task,
            tasks::endpoints::set_task,
            tasks::endpoints::delete_task,
            tasks::endpoints::toggle_task,
            schedules::endpoints::get_schedules,
            schedules::endpoints::add_schedule,
            schedules::endpoints::set_schedule,
            schedules::endpoints::delete_schedule,
            schedules::endpoints::toggle_schedule,
        ],
    )
}
