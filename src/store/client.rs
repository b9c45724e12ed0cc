//! Client-side observable store: the single source of truth for the
//! UI-visible collections. It subscribes once to each adapter snapshot
//! stream, re-publishes every update as a typed change event, and carries the
//! optimistic-insert path for tasks.

use uuid::Uuid;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, Weak};

use crate::api_error::ApiResult;
use crate::data::{lock_ignoring_poison, ScheduleID, TaskID};
use crate::notify::{Notifier, ToastLevel};
use crate::schedules::data::{NewSchedule, Schedule, SchedulePatch};
use crate::store::adapter::SqliteStore;
use crate::tasks::data::{NewTask, Task, TaskPatch};

/// Placeholder id carried by a pending record until the server assigns one.
pub const PENDING_ID: TaskID = -1;

/// A task as the store tracks it: either confirmed by an authoritative
/// snapshot, or a local insert awaiting confirmation, keyed by a
/// client-generated correlation id.
#[derive(Clone, Debug)]
pub enum TaskRecord {
    Pending { correlation_id: String, task: Task },
    Committed(Task),
}

impl TaskRecord {
    pub fn task(&self) -> &Task {
        match self {
            TaskRecord::Pending { task, .. } => task,
            TaskRecord::Committed(task) => task,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, TaskRecord::Pending { .. })
    }
}

fn same_content(pending: &Task, committed: &Task) -> bool {
    pending.title == committed.title
        && pending.description == committed.description
        && pending.due_date == committed.due_date
        && pending.priority == committed.priority
        && pending.category == committed.category
}

#[derive(Clone, Debug)]
pub enum ChangeEvent {
    TasksUpdated(Vec<TaskRecord>),
    SchedulesUpdated(Vec<Schedule>),
}

#[derive(Default)]
struct StoreState {
    records: Vec<TaskRecord>,
    schedules: Vec<Schedule>,
    // correlation id -> server id, for pending records whose durable write
    // succeeded but whose snapshot has not arrived yet
    confirmed: HashMap<String, TaskID>,
}

type ChangeCallback = Box<dyn Fn(&ChangeEvent) + Send>;

pub struct Store {
    adapter: Arc<SqliteStore>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<StoreState>,
    subscribers: Mutex<Vec<ChangeCallback>>,
}

impl Store {
    /// One store per page lifetime; constructed explicitly and handed to the
    /// view modules, never an import-time singleton.
    pub fn new(adapter: Arc<SqliteStore>, notifier: Arc<dyn Notifier>) -> Arc<Store> {
        let store = Arc::new(Store {
            adapter: adapter.clone(),
            notifier,
            state: Mutex::new(StoreState::default()),
            subscribers: Mutex::new(vec![]),
        });

        let weak: Weak<Store> = Arc::downgrade(&store);
        adapter.on_tasks_snapshot(move |tasks| {
            if let Some(store) = weak.upgrade() {
                store.apply_tasks_snapshot(tasks);
            }
        });

        let weak: Weak<Store> = Arc::downgrade(&store);
        adapter.on_schedules_snapshot(move |schedules| {
            if let Some(store) = weak.upgrade() {
                store.apply_schedules_snapshot(schedules);
            }
        });

        store
    }

    pub fn subscribe(&self, callback: impl Fn(&ChangeEvent) + Send + 'static) {
        lock_ignoring_poison(&self.subscribers).push(Box::new(callback));
    }

    fn emit(&self, event: ChangeEvent) {
        for callback in lock_ignoring_poison(&self.subscribers).iter() {
            callback(&event);
        }
    }

    fn emit_tasks(&self) {
        let records = self.task_records();
        self.emit(ChangeEvent::TasksUpdated(records));
    }

    // --- Snapshot handling ---

    fn apply_tasks_snapshot(&self, tasks: &[Task]) {
        {
            let mut state = lock_ignoring_poison(&self.state);
            let committed_ids: HashSet<TaskID> = tasks.iter().map(|t| t.id).collect();
            let previous_ids: HashSet<TaskID> = state
                .records
                .iter()
                .filter_map(|record| match record {
                    TaskRecord::Committed(task) => Some(task.id),
                    TaskRecord::Pending { .. } => None,
                })
                .collect();
            // Committed records this snapshot introduces; each can resolve at
            // most one pending record by content.
            let mut unclaimed: Vec<&Task> = tasks
                .iter()
                .filter(|task| !previous_ids.contains(&task.id))
                .collect();

            // Reconcile: a pending record is dropped once the snapshot
            // carries the server id its write was confirmed with, or once a
            // newly arrived committed record matches its content (the
            // snapshot fired inside the write, before the confirmation was
            // recorded). Anything else stays prepended.
            let old_records = std::mem::take(&mut state.records);
            let mut records: Vec<TaskRecord> = vec![];
            for record in old_records {
                if let TaskRecord::Pending {
                    correlation_id,
                    task,
                } = record
                {
                    let arrived = state
                        .confirmed
                        .get(&correlation_id)
                        .map(|id| committed_ids.contains(id))
                        .unwrap_or(false);
                    if arrived {
                        state.confirmed.remove(&correlation_id);
                    } else if let Some(position) =
                        unclaimed.iter().position(|t| same_content(&task, t))
                    {
                        unclaimed.remove(position);
                    } else {
                        records.push(TaskRecord::Pending {
                            correlation_id,
                            task,
                        });
                    }
                }
            }
            records.extend(tasks.iter().cloned().map(TaskRecord::Committed));
            state.records = records;
        }
        self.emit_tasks();
    }

    fn apply_schedules_snapshot(&self, schedules: &[Schedule]) {
        {
            let mut state = lock_ignoring_poison(&self.state);
            state.schedules = schedules.to_vec();
        }
        self.emit(ChangeEvent::SchedulesUpdated(schedules.to_vec()));
    }

    // --- Getters (last known snapshot, empty before the first arrives) ---

    pub fn task_records(&self) -> Vec<TaskRecord> {
        lock_ignoring_poison(&self.state).records.clone()
    }

    pub fn tasks(&self) -> Vec<Task> {
        lock_ignoring_poison(&self.state)
            .records
            .iter()
            .map(|record| record.task().clone())
            .collect()
    }

    pub fn schedules(&self) -> Vec<Schedule> {
        lock_ignoring_poison(&self.state).schedules.clone()
    }

    pub fn notify(&self, level: ToastLevel, title: &str, message: &str) {
        self.notifier.toast(level, title, message);
    }

    // --- Task mutations ---

    /// Optimistic insert: the record becomes visible immediately under a
    /// correlation id, then is reconciled against the durable write. On
    /// failure the pending record is removed again and a toast is shown.
    pub fn create_task(&self, new_task: NewTask) -> ApiResult<Task> {
        let correlation_id = Uuid::new_v4().to_string();
        let placeholder = Task {
            id: PENDING_ID,
            title: new_task.title.clone(),
            description: new_task.description.clone(),
            due_date: new_task.due_date.clone(),
            priority: new_task.priority.clone(),
            category: new_task.category.clone(),
            completed: false,
            completed_at: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        {
            let mut state = lock_ignoring_poison(&self.state);
            state.records.insert(
                0,
                TaskRecord::Pending {
                    correlation_id: correlation_id.clone(),
                    task: placeholder,
                },
            );
        }
        self.emit_tasks();

        match self.adapter.add_task(new_task) {
            Ok(task) => {
                let needs_emit = {
                    let mut state = lock_ignoring_poison(&self.state);
                    let still_pending = state.records.iter().any(|r| {
                        matches!(r, TaskRecord::Pending { correlation_id: c, .. } if *c == correlation_id)
                    });
                    if !still_pending {
                        // Already resolved by content during the write's own
                        // snapshot.
                        false
                    } else if state
                        .records
                        .iter()
                        .any(|r| matches!(r, TaskRecord::Committed(t) if t.id == task.id))
                    {
                        state.records.retain(|r| {
                            !matches!(r, TaskRecord::Pending { correlation_id: c, .. } if *c == correlation_id)
                        });
                        true
                    } else {
                        state.confirmed.insert(correlation_id, task.id);
                        false
                    }
                };
                if needs_emit {
                    self.emit_tasks();
                }
                Ok(task)
            }
            Err(e) => {
                {
                    let mut state = lock_ignoring_poison(&self.state);
                    state.records.retain(|r| {
                        !matches!(r, TaskRecord::Pending { correlation_id: c, .. } if *c == correlation_id)
                    });
                }
                self.emit_tasks();
                self.notifier.toast(
                    ToastLevel::Error,
                    "Save failed",
                    "Could not save task. Please try again.",
                );
                Err(e)
            }
        }
    }

    pub fn update_task(&self, task_id: TaskID, patch: &TaskPatch) -> ApiResult<Task> {
        self.report(self.adapter.update_task(task_id, patch), "update task")
    }

    pub fn delete_task(&self, task_id: TaskID) -> ApiResult<()> {
        self.report(self.adapter.delete_task(task_id), "delete task")
    }

    pub fn toggle_task(&self, task_id: TaskID) -> ApiResult<Task> {
        self.report(self.adapter.toggle_task_completed(task_id), "update task")
    }

    // --- Schedule mutations (no optimistic path) ---

    pub fn create_schedule(&self, new_schedule: NewSchedule) -> ApiResult<Schedule> {
        self.report(self.adapter.add_schedule(new_schedule), "save schedule")
    }

    pub fn update_schedule(
        &self,
        schedule_id: ScheduleID,
        patch: &SchedulePatch,
    ) -> ApiResult<Schedule> {
        self.report(
            self.adapter.update_schedule(schedule_id, patch),
            "update schedule",
        )
    }

    pub fn delete_schedule(&self, schedule_id: ScheduleID) -> ApiResult<()> {
        self.report(self.adapter.delete_schedule(schedule_id), "delete schedule")
    }

    pub fn toggle_schedule(&self, schedule_id: ScheduleID) -> ApiResult<Schedule> {
        self.report(
            self.adapter.toggle_schedule_completed(schedule_id),
            "update schedule",
        )
    }

    fn report<T>(&self, result: ApiResult<T>, what: &str) -> ApiResult<T> {
        if result.is_err() {
            self.notifier.toast(
                ToastLevel::Error,
                "Operation failed",
                &format!("Could not {}. Please try again.", what),
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{init_schema, DBConnection};
    use crate::notify::recording::RecordingNotifier;
    use rusqlite::Connection;

    fn setup() -> (DBConnection, Arc<SqliteStore>, Arc<RecordingNotifier>, Arc<Store>) {
        let connection = Connection::open_in_memory().unwrap();
        init_schema(&connection).unwrap();
        let connection: DBConnection = Arc::new(Mutex::new(connection));
        let adapter = SqliteStore::new(connection.clone());
        let notifier = Arc::new(RecordingNotifier::default());
        let store = Store::new(adapter.clone(), notifier.clone());
        (connection, adapter, notifier, store)
    }

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: None,
            due_date: "2024-01-10".to_string(),
            priority: "medium".to_string(),
            category: "general".to_string(),
        }
    }

    #[test]
    fn getters_start_empty() {
        let (_conn, _adapter, _notifier, store) = setup();
        assert!(store.tasks().is_empty());
        assert!(store.schedules().is_empty());
    }

    #[test]
    fn rebroadcasts_adapter_snapshots_as_typed_events() {
        let (_conn, adapter, _notifier, store) = setup();

        let events: Arc<Mutex<Vec<ChangeEvent>>> = Arc::new(Mutex::new(vec![]));
        let sink = events.clone();
        store.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        adapter.add_task(new_task("Buy milk")).unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            ChangeEvent::TasksUpdated(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].task().title, "Buy milk");
                assert!(!records[0].is_pending());
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn optimistic_insert_is_reconciled_without_duplicates() {
        let (_conn, _adapter, _notifier, store) = setup();

        let events: Arc<Mutex<Vec<Vec<TaskRecord>>>> = Arc::new(Mutex::new(vec![]));
        let sink = events.clone();
        store.subscribe(move |event| {
            if let ChangeEvent::TasksUpdated(records) = event {
                sink.lock().unwrap().push(records.clone());
            }
        });

        let task = store.create_task(new_task("Buy milk")).unwrap();
        assert!(task.id > 0);

        let events = events.lock().unwrap();
        // First event: the pending record alone, before the durable write.
        assert!(events[0][0].is_pending());
        assert_eq!(events[0][0].task().id, PENDING_ID);
        // No event ever shows the task twice, not even between the write's
        // own snapshot and the confirmation.
        assert!(events.iter().all(|records| records.len() == 1));
        // Last event: exactly one committed record, pending resolved.
        let last = events.last().unwrap();
        assert!(!last[0].is_pending());
        assert_eq!(last[0].task().id, task.id);

        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn failed_optimistic_insert_is_rolled_back_with_a_toast() {
        let (connection, _adapter, notifier, store) = setup();

        // Break the durable path after construction.
        connection
            .lock()
            .unwrap()
            .execute("DROP TABLE tasks", rusqlite::params![])
            .unwrap();

        assert!(store.create_task(new_task("Buy milk")).is_err());

        assert!(store.tasks().is_empty());
        assert!(store.task_records().is_empty());
        let toasts = notifier.toasts.lock().unwrap();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].0, ToastLevel::Error);
    }

    #[test]
    fn schedule_events_carry_the_full_array() {
        let (_conn, adapter, _notifier, store) = setup();

        let events: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(vec![]));
        let sink = events.clone();
        store.subscribe(move |event| {
            if let ChangeEvent::SchedulesUpdated(schedules) = event {
                sink.lock().unwrap().push(schedules.len());
            }
        });

        adapter
            .add_schedule(NewSchedule {
                title: "Dentist".to_string(),
                description: None,
                date: "2024-02-01".to_string(),
                time: "14:30".to_string(),
                category: "general".to_string(),
            })
            .unwrap();

        assert_eq!(*events.lock().unwrap(), vec![1]);
        assert_eq!(store.schedules().len(), 1);
    }

    #[test]
    fn failed_mutation_reports_a_generic_toast() {
        let (_conn, _adapter, notifier, store) = setup();
        assert!(store.toggle_task(42).is_err());
        let toasts = notifier.toasts.lock().unwrap();
        assert_eq!(toasts[0].1, "Operation failed");
    }
}
