use rusqlite::{params, Connection, Row};

use crate::api_error::{ApiError, ApiResult};
use crate::data::TaskID;

use super::data::{NewTask, Task, TaskPatch};

fn task_from_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get::<usize, TaskID>(0)?,
        title: row.get::<usize, String>(1)?,
        description: row.get::<usize, Option<String>>(2)?,
        due_date: row.get::<usize, String>(3)?,
        priority: row.get::<usize, String>(4)?,
        category: row.get::<usize, String>(5)?,
        completed: row.get::<usize, bool>(6)?,
        completed_at: row.get::<usize, Option<String>>(7)?,
        created_at: row.get::<usize, String>(8)?,
    })
}

const TASK_COLUMNS: &str =
    "rowid, title, description, due_date, priority, category, completed, completed_at, created_at";

pub fn get_tasks(db_connection: &Connection) -> ApiResult<Vec<Task>> {
    let mut statement = db_connection.prepare(&format!(
        "SELECT {} FROM tasks ORDER BY rowid",
        TASK_COLUMNS
    ))?;

    let rows = statement.query_map(params![], |row| task_from_row(row))?;

    let mut tasks = vec![];
    for row_result in rows {
        tasks.push(row_result?);
    }

    Ok(tasks)
}

/// Case-insensitive substring search on title or description.
pub fn search_tasks(db_connection: &Connection, term: &str) -> ApiResult<Vec<Task>> {
    let term = term.to_lowercase();
    let tasks = get_tasks(db_connection)?
        .into_iter()
        .filter(|task| {
            task.title.to_lowercase().contains(&term)
                || task
                    .description
                    .as_deref()
                    .map(|d| d.to_lowercase().contains(&term))
                    .unwrap_or(false)
        })
        .collect();
    Ok(tasks)
}

pub fn get_task(db_connection: &Connection, task_id: TaskID) -> ApiResult<Option<Task>> {
    let mut statement = db_connection.prepare(&format!(
        "SELECT {} FROM tasks WHERE rowid = ?1",
        TASK_COLUMNS
    ))?;

    let mut rows = statement.query_map(params![task_id], |row| task_from_row(row))?;
    match rows.next() {
        Some(row_result) => Ok(Some(row_result?)),
        None => Ok(None),
    }
}

pub fn insert_task(
    db_connection: &Connection,
    new_task: &NewTask,
    created_at: &str,
) -> ApiResult<Task> {
    db_connection.execute(
        "INSERT INTO tasks (title, description, due_date, priority, category, completed, completed_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, NULL, ?6)",
        params![
            new_task.title,
            new_task.description,
            new_task.due_date,
            new_task.priority,
            new_task.category,
            created_at,
        ],
    )?;

    let task_id = db_connection.last_insert_rowid();
    get_task(db_connection, task_id)?.ok_or(ApiError::NotFound)
}

/// Applies a partial update; fields absent from the patch keep their stored
/// values. Returns the updated task, or `NotFound`.
pub fn update_task(
    db_connection: &Connection,
    task_id: TaskID,
    patch: &TaskPatch,
) -> ApiResult<Task> {
    let task = get_task(db_connection, task_id)?.ok_or(ApiError::NotFound)?;

    let title = patch.title.clone().unwrap_or(task.title);
    let description = patch.description.clone().or(task.description);
    let due_date = patch.due_date.clone().unwrap_or(task.due_date);
    let priority = patch.priority.clone().unwrap_or(task.priority);
    let category = patch.category.clone().unwrap_or(task.category);

    db_connection.execute(
        "UPDATE tasks SET title = ?1, description = ?2, due_date = ?3, priority = ?4, category = ?5
         WHERE rowid = ?6",
        params![title, description, due_date, priority, category, task_id],
    )?;

    get_task(db_connection, task_id)?.ok_or(ApiError::NotFound)
}

pub fn delete_task(db_connection: &Connection, task_id: TaskID) -> ApiResult<()> {
    db_connection.execute("DELETE FROM tasks WHERE rowid = ?1", params![task_id])?;
    Ok(())
}

/// Flips `completed` and keeps the `completed_at` invariant: set exactly when
/// the task becomes completed, cleared when it reverts to pending.
pub fn toggle_task_completed(
    db_connection: &Connection,
    task_id: TaskID,
    now: &str,
) -> ApiResult<Task> {
    let task = get_task(db_connection, task_id)?.ok_or(ApiError::NotFound)?;

    let completed = !task.completed;
    let completed_at = if completed { Some(now) } else { None };

    db_connection.execute(
        "UPDATE tasks SET completed = ?1, completed_at = ?2 WHERE rowid = ?3",
        params![completed, completed_at, task_id],
    )?;

    get_task(db_connection, task_id)?.ok_or(ApiError::NotFound)
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

    fn new_task(title: &str, description: Option<&str>) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: description.map(str::to_string),
            due_date: "2024-01-10".to_string(),
            priority: "medium".to_string(),
            category: "general".to_string(),
        }
    }

    #[test]
    fn insert_assigns_id_and_defaults() {
        let connection = connection();
        let task = insert_task(&connection, &new_task("Buy milk", None), "2024-01-01T09:00:00Z")
            .unwrap();

        assert!(task.id > 0);
        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
        assert_eq!(task.created_at, "2024-01-01T09:00:00Z");
        assert_eq!(get_tasks(&connection).unwrap(), vec![task]);
    }

    #[test]
    fn search_matches_title_or_description_case_insensitive() {
        let connection = connection();
        insert_task(&connection, &new_task("Buy milk", None), "t").unwrap();
        insert_task(&connection, &new_task("Laundry", Some("wash the MILK jug")), "t").unwrap();
        insert_task(&connection, &new_task("Taxes", None), "t").unwrap();

        let found = search_tasks(&connection, "Milk").unwrap();
        assert_eq!(found.len(), 2);
        assert!(search_tasks(&connection, "nothing").unwrap().is_empty());
    }

    #[test]
    fn toggle_keeps_completed_at_in_step_with_completed() {
        let connection = connection();
        let task = insert_task(&connection, &new_task("Buy milk", None), "t").unwrap();

        let toggled = toggle_task_completed(&connection, task.id, "2024-01-02T10:00:00Z").unwrap();
        assert!(toggled.completed);
        assert_eq!(toggled.completed_at.as_deref(), Some("2024-01-02T10:00:00Z"));

        let back = toggle_task_completed(&connection, task.id, "2024-01-03T10:00:00Z").unwrap();
        assert!(!back.completed);
        assert_eq!(back.completed_at, None);
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let connection = connection();
        let task = insert_task(&connection, &new_task("Buy milk", Some("2l")), "t").unwrap();

        let patch = TaskPatch {
            title: Some("Buy oat milk".to_string()),
            ..TaskPatch::default()
        };
        let updated = update_task(&connection, task.id, &patch).unwrap();

        assert_eq!(updated.title, "Buy oat milk");
        assert_eq!(updated.description.as_deref(), Some("2l"));
        assert_eq!(updated.due_date, task.due_date);
    }

    #[test]
    fn missing_ids_report_not_found() {
        let connection = connection();
        assert!(matches!(
            update_task(&connection, 42, &TaskPatch::default()),
            Err(ApiError::NotFound)
        ));
        assert!(matches!(
            toggle_task_completed(&connection, 42, "t"),
            Err(ApiError::NotFound)
        ));
    }
}
