use rusqlite::{params, Connection, Row};

use crate::api_error::{ApiError, ApiResult};
use crate::data::ScheduleID;

use super::data::{NewSchedule, Schedule, SchedulePatch};

fn schedule_from_row(row: &Row) -> rusqlite::Result<Schedule> {
    Ok(Schedule {
        id: row.get::<usize, ScheduleID>(0)?,
        title: row.get::<usize, String>(1)?,
        description: row.get::<usize, Option<String>>(2)?,
        date: row.get::<usize, String>(3)?,
        time: row.get::<usize, String>(4)?,
        category: row.get::<usize, String>(5)?,
        completed: row.get::<usize, bool>(6)?,
        created_at: row.get::<usize, String>(7)?,
    })
}

const SCHEDULE_COLUMNS: &str =
    "rowid, title, description, date, time, category, completed, created_at";

pub fn get_schedules(db_connection: &Connection) -> ApiResult<Vec<Schedule>> {
    let mut statement = db_connection.prepare(&format!(
        "SELECT {} FROM schedules ORDER BY rowid",
        SCHEDULE_COLUMNS
    ))?;

    let rows = statement.query_map(params![], |row| schedule_from_row(row))?;

    let mut schedules = vec![];
    for row_result in rows {
        schedules.push(row_result?);
    }

    Ok(schedules)
}

pub fn get_schedule(
    db_connection: &Connection,
    schedule_id: ScheduleID,
) -> ApiResult<Option<Schedule>> {
    let mut statement = db_connection.prepare(&format!(
        "SELECT {} FROM schedules WHERE rowid = ?1",
        SCHEDULE_COLUMNS
    ))?;

    let mut rows = statement.query_map(params![schedule_id], |row| schedule_from_row(row))?;
    match rows.next() {
        Some(row_result) => Ok(Some(row_result?)),
        None => Ok(None),
    }
}

pub fn insert_schedule(
    db_connection: &Connection,
    new_schedule: &NewSchedule,
    created_at: &str,
) -> ApiResult<Schedule> {
    db_connection.execute(
        "INSERT INTO schedules (title, description, date, time, category, completed, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
        params![
            new_schedule.title,
            new_schedule.description,
            new_schedule.date,
            new_schedule.time,
            new_schedule.category,
            created_at,
        ],
    )?;

    let schedule_id = db_connection.last_insert_rowid();
    get_schedule(db_connection, schedule_id)?.ok_or(ApiError::NotFound)
}

pub fn update_schedule(
    db_connection: &Connection,
    schedule_id: ScheduleID,
    patch: &SchedulePatch,
) -> ApiResult<Schedule> {
    let schedule = get_schedule(db_connection, schedule_id)?.ok_or(ApiError::NotFound)?;

    let title = patch.title.clone().unwrap_or(schedule.title);
    let description = patch.description.clone().or(schedule.description);
    let date = patch.date.clone().unwrap_or(schedule.date);
    let time = patch.time.clone().unwrap_or(schedule.time);
    let category = patch.category.clone().unwrap_or(schedule.category);

    db_connection.execute(
        "UPDATE schedules SET title = ?1, description = ?2, date = ?3, time = ?4, category = ?5
         WHERE rowid = ?6",
        params![title, description, date, time, category, schedule_id],
    )?;

    get_schedule(db_connection, schedule_id)?.ok_or(ApiError::NotFound)
}

pub fn delete_schedule(db_connection: &Connection, schedule_id: ScheduleID) -> ApiResult<()> {
    db_connection.execute(
        "DELETE FROM schedules WHERE rowid = ?1",
        params![schedule_id],
    )?;
    Ok(())
}

pub fn toggle_schedule_completed(
    db_connection: &Connection,
    schedule_id: ScheduleID,
) -> ApiResult<Schedule> {
    let schedule = get_schedule(db_connection, schedule_id)?.ok_or(ApiError::NotFound)?;

    db_connection.execute(
        "UPDATE schedules SET completed = ?1 WHERE rowid = ?2",
        params![!schedule.completed, schedule_id],
    )?;

    get_schedule(db_connection, schedule_id)?.ok_or(ApiError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::init_schema;

    fn connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        init_schema(&connection).unwrap();
        connection
    }

    fn new_schedule(title: &str) -> NewSchedule {
        NewSchedule {
            title: title.to_string(),
            description: None,
            date: "2024-02-01".to_string(),
            time: "14:30".to_string(),
            category: "general".to_string(),
        }
    }

    #[test]
    fn insert_then_list() {
        let connection = connection();
        let schedule =
            insert_schedule(&connection, &new_schedule("Dentist"), "2024-01-01T09:00:00Z")
                .unwrap();

        assert!(schedule.id > 0);
        assert!(!schedule.completed);
        assert_eq!(get_schedules(&connection).unwrap(), vec![schedule]);
    }

    #[test]
    fn toggle_flips_completed_both_ways() {
        let connection = connection();
        let schedule = insert_schedule(&connection, &new_schedule("Dentist"), "t").unwrap();

        assert!(toggle_schedule_completed(&connection, schedule.id)
            .unwrap()
            .completed);
        assert!(!toggle_schedule_completed(&connection, schedule.id)
            .unwrap()
            .completed);
    }

    #[test]
    fn patch_and_delete() {
        let connection = connection();
        let schedule = insert_schedule(&connection, &new_schedule("Dentist"), "t").unwrap();

        let patch = SchedulePatch {
            time: Some("16:00".to_string()),
            ..SchedulePatch::default()
        };
        let updated = update_schedule(&connection, schedule.id, &patch).unwrap();
        assert_eq!(updated.time, "16:00");
        assert_eq!(updated.date, "2024-02-01");

        delete_schedule(&connection, schedule.id).unwrap();
        assert!(get_schedules(&connection).unwrap().is_empty());
    }
}
