use serde::{Deserialize, Serialize};

use crate::data::TaskID;

pub const PRIORITIES: [&str; 3] = ["high", "medium", "low"];
pub const DEFAULT_PRIORITY: &str = "medium";
pub const DEFAULT_CATEGORY: &str = "general";

/// A task as stored and as serialized on the wire. The stored `priority` is a
/// REST compatibility field; derived views look the priority up from the
/// referenced category instead.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskID,
    pub title: String,
    pub description: Option<String>,
    pub due_date: String,
    pub priority: String,
    pub category: String,
    pub completed: bool,
    pub completed_at: Option<String>,
    pub created_at: String,
}

/// Incoming task payload, before validation. Everything is optional so that
/// missing fields surface as field errors rather than deserialization
/// failures.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
}

impl TaskInput {
    /// Applies the defaults and produces the record to insert. Only valid
    /// after `validation::validate_task` returned no errors.
    pub fn into_new_task(self) -> NewTask {
        NewTask {
            title: self.title.unwrap_or_default(),
            description: self.description,
            due_date: self.due_date.unwrap_or_default(),
            priority: self.priority.unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
            category: self.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: String,
    pub priority: String,
    pub category: String,
}

/// Partial update: only the present fields change.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
}
