//! Document store adapter: CRUD over the SQLite collections plus
//! full-collection snapshot subscriptions. Every mutation, whoever performs
//! it, pushes the entire updated collection to all subscribers of that
//! collection — no pagination, no partial projections.

use chrono::Utc;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::api_error::ApiResult;
use crate::data::{lock_ignoring_poison, DBConnection, ScheduleID, TaskID};
use crate::schedules::data::{NewSchedule, Schedule, SchedulePatch};
use crate::schedules::helpers as schedule_helpers;
use crate::tasks::data::{NewTask, Task, TaskPatch};
use crate::tasks::helpers as task_helpers;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SubscriptionId(u64);

type SnapshotCallback<T> = Box<dyn Fn(&[T]) + Send>;

pub struct SqliteStore {
    connection: DBConnection,
    task_subscribers: Mutex<HashMap<SubscriptionId, SnapshotCallback<Task>>>,
    schedule_subscribers: Mutex<HashMap<SubscriptionId, SnapshotCallback<Schedule>>>,
    next_subscription: AtomicU64,
}

impl SqliteStore {
    pub fn new(connection: DBConnection) -> Arc<SqliteStore> {
        Arc::new(SqliteStore {
            connection,
            task_subscribers: Mutex::new(HashMap::new()),
            schedule_subscribers: Mutex::new(HashMap::new()),
            next_subscription: AtomicU64::new(1),
        })
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed))
    }

    // --- Tasks ---

    pub fn tasks(&self) -> ApiResult<Vec<Task>> {
        let connection = self.connection.lock()?;
        task_helpers::get_tasks(&connection)
    }

    pub fn search_tasks(&self, term: &str) -> ApiResult<Vec<Task>> {
        let connection = self.connection.lock()?;
        task_helpers::search_tasks(&connection, term)
    }

    pub fn add_task(&self, new_task: NewTask) -> ApiResult<Task> {
        let task = {
            let connection = self.connection.lock()?;
            task_helpers::insert_task(&connection, &new_task, &Utc::now().to_rfc3339())?
        };
        self.notify_tasks();
        Ok(task)
    }

    pub fn update_task(&self, task_id: TaskID, patch: &TaskPatch) -> ApiResult<Task> {
        let task = {
            let connection = self.connection.lock()?;
            task_helpers::update_task(&connection, task_id, patch)?
        };
        self.notify_tasks();
        Ok(task)
    }

    pub fn delete_task(&self, task_id: TaskID) -> ApiResult<()> {
        {
            let connection = self.connection.lock()?;
            task_helpers::delete_task(&connection, task_id)?;
        }
        self.notify_tasks();
        Ok(())
    }

    pub fn toggle_task_completed(&self, task_id: TaskID) -> ApiResult<Task> {
        let task = {
            let connection = self.connection.lock()?;
            task_helpers::toggle_task_completed(&connection, task_id, &Utc::now().to_rfc3339())?
        };
        self.notify_tasks();
        Ok(task)
    }

    /// Registers a tasks snapshot subscriber. The callback fires immediately
    /// with the current collection, then again after every mutation.
    /// Callbacks must not write back into the store.
    pub fn on_tasks_snapshot(
        &self,
        callback: impl Fn(&[Task]) + Send + 'static,
    ) -> SubscriptionId {
        let id = self.next_id();
        if let Ok(snapshot) = self.tasks() {
            callback(&snapshot);
        }
        lock_ignoring_poison(&self.task_subscribers).insert(id, Box::new(callback));
        id
    }

    pub fn unsubscribe_tasks(&self, id: SubscriptionId) {
        lock_ignoring_poison(&self.task_subscribers).remove(&id);
    }

    fn notify_tasks(&self) {
        let snapshot = match self.tasks() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "tasks snapshot read failed, subscribers not notified");
                return;
            }
        };
        for callback in lock_ignoring_poison(&self.task_subscribers).values() {
            callback(&snapshot);
        }
    }

    // --- Schedules ---

    pub fn schedules(&self) -> ApiResult<Vec<Schedule>> {
        let connection = self.connection.lock()?;
        schedule_helpers::get_schedules(&connection)
    }

    pub fn add_schedule(&self, new_schedule: NewSchedule) -> ApiResult<Schedule> {
        let schedule = {
            let connection = self.connection.lock()?;
            schedule_helpers::insert_schedule(&connection, &new_schedule, &Utc::now().to_rfc3339())?
        };
        self.notify_schedules();
        Ok(schedule)
    }

    pub fn update_schedule(
        &self,
        schedule_id: ScheduleID,
        patch: &SchedulePatch,
    ) -> ApiResult<Schedule> {
        let schedule = {
            let connection = self.connection.lock()?;
            schedule_helpers::update_schedule(&connection, schedule_id, patch)?
        };
        self.notify_schedules();
        Ok(schedule)
    }

    pub fn delete_schedule(&self, schedule_id: ScheduleID) -> ApiResult<()> {
        {
            let connection = self.connection.lock()?;
            schedule_helpers::delete_schedule(&connection, schedule_id)?;
        }
        self.notify_schedules();
        Ok(())
    }

    pub fn toggle_schedule_completed(&self, schedule_id: ScheduleID) -> ApiResult<Schedule> {
        let schedule = {
            let connection = self.connection.lock()?;
            schedule_helpers::toggle_schedule_completed(&connection, schedule_id)?
        };
        self.notify_schedules();
        Ok(schedule)
    }

    pub fn on_schedules_snapshot(
        &self,
        callback: impl Fn(&[Schedule]) + Send + 'static,
    ) -> SubscriptionId {
        let id = self.next_id();
        if let Ok(snapshot) = self.schedules() {
            callback(&snapshot);
        }
        lock_ignoring_poison(&self.schedule_subscribers).insert(id, Box::new(callback));
        id
    }

    pub fn unsubscribe_schedules(&self, id: SubscriptionId) {
        lock_ignoring_poison(&self.schedule_subscribers).remove(&id);
    }

    fn notify_schedules(&self) {
        let snapshot = match self.schedules() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "schedules snapshot read failed, subscribers not notified");
                return;
            }
        };
        for callback in lock_ignoring_poison(&self.schedule_subscribers).values() {
            callback(&snapshot);
        }
    }
}
